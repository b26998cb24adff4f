// Content-mask builder: grayscale page -> text / image / QR forbidden masks.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::filter::filter3x3;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use imageproc::region_labelling::{Connectivity, connected_components};

use super::integral::IntegralMask;
use super::morph::{close_rect, dilate_rect, open_rect, union_in_place};
use super::options::ScaledParams;
use super::PixelBox;
use crate::raster::PageRaster;

/// Luminance below which a pixel is an ink candidate.
const TEXT_THRESHOLD: u8 = 200;

/// Absolute Laplacian response above which a pixel counts as textured.
const LAPLACIAN_THRESHOLD: i16 = 30;

/// Minimum grayscale variance inside a candidate box for it to be a matrix
/// code; blank squares and flat stamps sit far below this.
const QR_VARIANCE_MIN: f64 = 1500.0;

/// Near-square bounding-box aspect window for matrix codes.
const QR_ASPECT_MIN: f64 = 0.85;
const QR_ASPECT_MAX: f64 = 1.15;

/// Contour-to-polygon approximation tolerance, as a fraction of perimeter.
const QR_POLY_TOLERANCE: f64 = 0.04;

const LAPLACIAN_KERNEL: [i16; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];

/// The three forbidden-region masks for one page. Nonzero = forbidden.
///
/// All three always share the dimensions of the raster they were built from.
#[derive(Debug, Clone)]
pub struct ContentMasks {
    pub text: GrayImage,
    pub image: GrayImage,
    pub qr: GrayImage,
}

impl ContentMasks {
    /// Bundle three equally-shaped masks. Panics on shape mismatch.
    pub fn new(text: GrayImage, image: GrayImage, qr: GrayImage) -> Self {
        assert_eq!(text.dimensions(), image.dimensions(), "mask dimension mismatch");
        assert_eq!(text.dimensions(), qr.dimensions(), "mask dimension mismatch");
        Self { text, image, qr }
    }

    /// Fully forbidden masks, used when the raster is too small to analyze.
    pub fn all_forbidden(width: u32, height: u32) -> Self {
        let full = GrayImage::from_pixel(width, height, Luma([255]));
        Self {
            text: full.clone(),
            image: full.clone(),
            qr: full,
        }
    }

    pub fn width(&self) -> u32 {
        self.text.width()
    }

    pub fn height(&self) -> u32 {
        self.text.height()
    }

    /// Integral image of `text ∨ image ∨ qr`, built once per page.
    pub fn union_integral(&self) -> IntegralMask {
        IntegralMask::from_union(&[&self.text, &self.image, &self.qr])
    }
}

/// Build the three masks from a raster with pre-scaled constants.
///
/// Deterministic given identical input. Rasters smaller than twice the
/// largest kernel in either axis cannot be analyzed meaningfully and come
/// back fully forbidden, forcing the locator into degraded mode.
pub(crate) fn build_masks_scaled(raster: &PageRaster, params: &ScaledParams) -> ContentMasks {
    let width = raster.width();
    let height = raster.height();
    if width < params.degenerate_dim || height < params.degenerate_dim {
        return ContentMasks::all_forbidden(width, height);
    }

    let gray = raster.to_luma();
    let ink = ink_mask(&gray);

    let text = text_mask(&ink, params);
    let image = image_mask(&gray, &ink, params);
    let qr = qr_mask(&gray, &ink, params);

    ContentMasks::new(text, image, qr)
}

/// Pre-binarization: darker pixels are ink candidates.
fn ink_mask(gray: &GrayImage) -> GrayImage {
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (o, g) in out.iter_mut().zip(gray.iter()) {
        *o = if *g < TEXT_THRESHOLD { 255 } else { 0 };
    }
    out
}

/// Directional closings merge glyphs into line/word blobs, then a wide
/// dilation forms a protective halo so the stamp never brushes up against
/// the text.
fn text_mask(ink: &GrayImage, params: &ScaledParams) -> GrayImage {
    let (hw, hh) = params.close_horizontal;
    let (vw, vh) = params.close_vertical;
    let (dw, dh) = params.close_detail;

    let mut merged = close_rect(ink, hw, hh);
    union_in_place(&mut merged, &close_rect(ink, vw, vh));
    union_in_place(&mut merged, &close_rect(ink, dw, dh));

    let (halo_w, halo_h) = params.text_halo;
    let mut mask = dilate_rect(&merged, halo_w, halo_h);

    // External refinements (typically OCR word boxes) join the text mask.
    for region in &params.extra_text_regions {
        fill_box(&mut mask, region);
    }
    mask
}

/// High local variation marks photographs, shaded figures and dense plots.
/// Small components are text noise (the text mask already owns those); long
/// thin rules are recovered separately by directional openings so tables and
/// underlines are excluded like images.
fn image_mask(gray: &GrayImage, ink: &GrayImage, params: &ScaledParams) -> GrayImage {
    let laplacian = filter3x3::<Luma<u8>, i16, i16>(gray, &LAPLACIAN_KERNEL);
    let mut textured = GrayImage::new(gray.width(), gray.height());
    for (o, l) in textured.iter_mut().zip(laplacian.iter()) {
        *o = if l.abs() > LAPLACIAN_THRESHOLD { 255 } else { 0 };
    }

    let mut mask = drop_small_components(&textured, params.min_image_area);

    let (rh_w, rh_h) = params.rule_horizontal;
    let (rv_w, rv_h) = params.rule_vertical;
    union_in_place(&mut mask, &open_rect(ink, rh_w, rh_h));
    union_in_place(&mut mask, &open_rect(ink, rv_w, rv_h));

    let (dil_w, dil_h) = params.image_dilate;
    dilate_rect(&mask, dil_w, dil_h)
}

/// Remove connected components smaller than `min_area` pixels.
fn drop_small_components(mask: &GrayImage, min_area: u64) -> GrayImage {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));

    let max_label = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut areas = vec![0u64; max_label + 1];
    for &label in labels.iter() {
        if label != 0 {
            areas[label as usize] += 1;
        }
    }

    let mut out = GrayImage::new(mask.width(), mask.height());
    for (o, &label) in out.iter_mut().zip(labels.iter()) {
        if label != 0 && areas[label as usize] >= min_area {
            *o = 255;
        }
    }
    out
}

/// Matrix-code detection: near-square convex quads with high interior
/// variance among the external contours of the ink image.
fn qr_mask(gray: &GrayImage, ink: &GrayImage, params: &ScaledParams) -> GrayImage {
    let mut canvas = GrayImage::new(gray.width(), gray.height());

    for contour in find_contours::<u32>(ink) {
        if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
            continue;
        }

        let perimeter = arc_length(&contour.points, true);
        if perimeter <= 0.0 {
            continue;
        }
        let polygon =
            approximate_polygon_dp(&contour.points, QR_POLY_TOLERANCE * perimeter, true);
        if polygon.len() != 4 || !is_convex_quad(&polygon) {
            continue;
        }

        let bbox = bounding_box(&contour.points);
        let aspect = f64::from(bbox.width) / f64::from(bbox.height.max(1));
        if !(QR_ASPECT_MIN..=QR_ASPECT_MAX).contains(&aspect) {
            continue;
        }
        if u64::from(bbox.width) * u64::from(bbox.height) < params.min_qr_bbox_area {
            continue;
        }
        if variance_in_box(gray, &bbox) <= QR_VARIANCE_MIN {
            continue;
        }

        fill_box(&mut canvas, &bbox);
    }

    let (dil_w, dil_h) = params.qr_dilate;
    dilate_rect(&canvas, dil_w, dil_h)
}

fn bounding_box(points: &[Point<u32>]) -> PixelBox {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    PixelBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// Convexity of a quad: consecutive edge cross products never change sign.
fn is_convex_quad(polygon: &[Point<u32>]) -> bool {
    let n = polygon.len();
    let mut sign = 0i64;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let c = polygon[(i + 2) % n];
        let (abx, aby) = (i64::from(b.x) - i64::from(a.x), i64::from(b.y) - i64::from(a.y));
        let (bcx, bcy) = (i64::from(c.x) - i64::from(b.x), i64::from(c.y) - i64::from(b.y));
        let cross = abx * bcy - aby * bcx;
        if cross == 0 {
            continue;
        }
        if sign == 0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Grayscale variance inside a box, clamped to the image bounds.
fn variance_in_box(gray: &GrayImage, bbox: &PixelBox) -> f64 {
    let x1 = (bbox.x + bbox.width).min(gray.width());
    let y1 = (bbox.y + bbox.height).min(gray.height());
    let mut count = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for y in bbox.y..y1 {
        for x in bbox.x..x1 {
            let v = f64::from(gray.get_pixel(x, y)[0]);
            sum += v;
            sum_sq += v * v;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    sum_sq / count as f64 - mean * mean
}

/// Mark a box as forbidden, clamped to the mask bounds.
fn fill_box(mask: &mut GrayImage, bbox: &PixelBox) {
    let x1 = (bbox.x + bbox.width).min(mask.width());
    let y1 = (bbox.y + bbox.height).min(mask.height());
    for y in bbox.y.min(mask.height())..y1 {
        for x in bbox.x.min(mask.width())..x1 {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
}
