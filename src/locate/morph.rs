// Binary morphology with rectangular structuring elements.
//
// Masks are byte-per-pixel GrayImages where 0 is background and any nonzero
// value is foreground. Rectangular SELs are separable, so each operation runs
// as a horizontal pass followed by a vertical pass over per-line prefix
// counts. Pixels outside the image are background for both dilation and
// erosion.

use image::GrayImage;

/// Dilate with a `kernel_w x kernel_h` rectangle anchored at its center.
pub fn dilate_rect(mask: &GrayImage, kernel_w: u32, kernel_h: u32) -> GrayImage {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut buf = mask.as_raw().clone();
    if kernel_w > 1 {
        buf = dilate_rows(&buf, w, h, kernel_w as usize);
    }
    if kernel_h > 1 {
        buf = dilate_cols(&buf, w, h, kernel_h as usize);
    }
    GrayImage::from_raw(w as u32, h as u32, buf).unwrap()
}

/// Erode with a `kernel_w x kernel_h` rectangle anchored at its center.
pub fn erode_rect(mask: &GrayImage, kernel_w: u32, kernel_h: u32) -> GrayImage {
    let (w, h) = (mask.width() as usize, mask.height() as usize);
    let mut buf = mask.as_raw().clone();
    if kernel_w > 1 {
        buf = erode_rows(&buf, w, h, kernel_w as usize);
    }
    if kernel_h > 1 {
        buf = erode_cols(&buf, w, h, kernel_h as usize);
    }
    GrayImage::from_raw(w as u32, h as u32, buf).unwrap()
}

/// Close: dilation followed by erosion. Bridges gaps narrower than the SEL.
pub fn close_rect(mask: &GrayImage, kernel_w: u32, kernel_h: u32) -> GrayImage {
    erode_rect(&dilate_rect(mask, kernel_w, kernel_h), kernel_w, kernel_h)
}

/// Open: erosion followed by dilation. Removes runs narrower than the SEL.
pub fn open_rect(mask: &GrayImage, kernel_w: u32, kernel_h: u32) -> GrayImage {
    dilate_rect(&erode_rect(mask, kernel_w, kernel_h), kernel_w, kernel_h)
}

/// OR `src` into `dst`. Panics if the shapes differ (a programming error).
pub fn union_in_place(dst: &mut GrayImage, src: &GrayImage) {
    assert_eq!(dst.dimensions(), src.dimensions(), "mask dimension mismatch");
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        if *s != 0 {
            *d = 255;
        }
    }
}

/// Count of foreground pixels.
pub fn count_foreground(mask: &GrayImage) -> u64 {
    mask.iter().filter(|&&p| p != 0).count() as u64
}

// For even kernels the anchor sits right of center: the window around x is
// [x - (k-1)/2, x + k/2].
fn extents(k: usize) -> (usize, usize) {
    ((k - 1) / 2, k / 2)
}

fn dilate_rows(src: &[u8], w: usize, h: usize, k: usize) -> Vec<u8> {
    let (left, right) = extents(k);
    let mut out = vec![0u8; w * h];
    let mut prefix = vec![0u32; w + 1];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            prefix[x + 1] = prefix[x] + u32::from(row[x] != 0);
        }
        let orow = &mut out[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = x.saturating_sub(left);
            let hi = (x + right + 1).min(w);
            orow[x] = if prefix[hi] > prefix[lo] { 255 } else { 0 };
        }
    }
    out
}

fn dilate_cols(src: &[u8], w: usize, h: usize, k: usize) -> Vec<u8> {
    let (up, down) = extents(k);
    let mut out = vec![0u8; w * h];
    let mut prefix = vec![0u32; h + 1];
    for x in 0..w {
        for y in 0..h {
            prefix[y + 1] = prefix[y] + u32::from(src[y * w + x] != 0);
        }
        for y in 0..h {
            let lo = y.saturating_sub(up);
            let hi = (y + down + 1).min(h);
            out[y * w + x] = if prefix[hi] > prefix[lo] { 255 } else { 0 };
        }
    }
    out
}

fn erode_rows(src: &[u8], w: usize, h: usize, k: usize) -> Vec<u8> {
    let (left, right) = extents(k);
    let mut out = vec![0u8; w * h];
    let mut prefix = vec![0u32; w + 1];
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        for x in 0..w {
            prefix[x + 1] = prefix[x] + u32::from(row[x] != 0);
        }
        let orow = &mut out[y * w..(y + 1) * w];
        for x in 0..w {
            // Windows reaching outside the image see background and erode away.
            if x >= left && x + right < w {
                let full = prefix[x + right + 1] - prefix[x - left];
                orow[x] = if full as usize == k { 255 } else { 0 };
            }
        }
    }
    out
}

fn erode_cols(src: &[u8], w: usize, h: usize, k: usize) -> Vec<u8> {
    let (up, down) = extents(k);
    let mut out = vec![0u8; w * h];
    let mut prefix = vec![0u32; h + 1];
    for x in 0..w {
        for y in 0..h {
            prefix[y + 1] = prefix[y] + u32::from(src[y * w + x] != 0);
        }
        for y in 0..h {
            if y >= up && y + down < h {
                let full = prefix[y + down + 1] - prefix[y - up];
                out[y * w + x] = if full as usize == k { 255 } else { 0 };
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blank(w: u32, h: u32) -> GrayImage {
        GrayImage::new(w, h)
    }

    #[test]
    fn dilate_grows_a_point() {
        let mut m = blank(9, 9);
        m.put_pixel(4, 4, Luma([255]));
        let d = dilate_rect(&m, 3, 3);
        assert_eq!(d.get_pixel(3, 3)[0], 255);
        assert_eq!(d.get_pixel(5, 5)[0], 255);
        assert_eq!(d.get_pixel(2, 4)[0], 0);
    }

    #[test]
    fn erode_removes_thin_runs() {
        let mut m = blank(10, 10);
        for x in 2..8 {
            m.put_pixel(x, 5, Luma([255]));
        }
        let e = erode_rect(&m, 1, 3);
        assert_eq!(count_foreground(&e), 0);
    }

    #[test]
    fn close_bridges_a_gap() {
        let mut m = blank(20, 5);
        m.put_pixel(4, 2, Luma([255]));
        m.put_pixel(9, 2, Luma([255]));
        let c = close_rect(&m, 7, 1);
        assert_eq!(c.get_pixel(6, 2)[0], 255, "gap should be bridged");
        assert_eq!(c.get_pixel(4, 2)[0], 255, "original pixels survive closing");
    }

    #[test]
    fn open_drops_isolated_specks() {
        let mut m = blank(20, 20);
        m.put_pixel(3, 3, Luma([255]));
        for y in 8..16 {
            for x in 8..16 {
                m.put_pixel(x, y, Luma([255]));
            }
        }
        let o = open_rect(&m, 3, 3);
        assert_eq!(o.get_pixel(3, 3)[0], 0, "speck should be opened away");
        assert_eq!(o.get_pixel(11, 11)[0], 255, "large block survives opening");
    }

    #[test]
    fn union_sets_either_side() {
        let mut a = blank(4, 4);
        let mut b = blank(4, 4);
        a.put_pixel(0, 0, Luma([255]));
        b.put_pixel(3, 3, Luma([255]));
        union_in_place(&mut a, &b);
        assert_eq!(a.get_pixel(0, 0)[0], 255);
        assert_eq!(a.get_pixel(3, 3)[0], 255);
        assert_eq!(count_foreground(&a), 2);
    }
}
