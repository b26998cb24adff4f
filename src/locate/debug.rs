// Debug side channel: per-page mask/placement events and the overlay writer.

use std::path::PathBuf;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::masks::ContentMasks;
use super::{Placement, PixelBox};
use crate::raster::PageRaster;

/// Per-page observer for locator internals.
///
/// The locator emits exactly one event per page, after the placement is
/// chosen. Implementations must not panic; the locator does not guard
/// against sink failures.
pub trait DebugSink: Send + Sync {
    fn on_page(&self, event: &DebugEvent<'_>);
}

/// Tight bounding box of each mask's forbidden pixels, when any exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskBounds {
    pub text: Option<PixelBox>,
    pub image: Option<PixelBox>,
    pub qr: Option<PixelBox>,
}

/// Overlap of the chosen square broken down by mask. Fractions of the
/// square's area; they can overlap each other, so they need not sum to the
/// union overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskOverlap {
    pub text: f64,
    pub image: f64,
    pub qr: f64,
}

/// Everything needed to render the canonical per-page overlay.
pub struct DebugEvent<'a> {
    pub raster_width: u32,
    pub raster_height: u32,
    pub masks: &'a ContentMasks,
    pub mask_bounds: MaskBounds,
    pub overlap_by_mask: MaskOverlap,
    pub placement: Placement,
}

impl<'a> DebugEvent<'a> {
    pub(crate) fn for_page(
        raster: &PageRaster,
        masks: &'a ContentMasks,
        placement: Placement,
    ) -> Self {
        Self {
            raster_width: raster.width(),
            raster_height: raster.height(),
            masks,
            mask_bounds: MaskBounds {
                text: mask_bounds(&masks.text),
                image: mask_bounds(&masks.image),
                qr: mask_bounds(&masks.qr),
            },
            overlap_by_mask: MaskOverlap {
                text: overlap_with(&masks.text, placement),
                image: overlap_with(&masks.image, placement),
                qr: overlap_with(&masks.qr, placement),
            },
            placement,
        }
    }
}

fn mask_bounds(mask: &GrayImage) -> Option<PixelBox> {
    let mut min_x = mask.width();
    let mut min_y = mask.height();
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] != 0 {
            found = true;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    found.then(|| PixelBox::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

fn overlap_with(mask: &GrayImage, placement: Placement) -> f64 {
    let mut forbidden = 0u64;
    for y in placement.y..placement.y + placement.size {
        for x in placement.x..placement.x + placement.size {
            if mask.get_pixel(x, y)[0] != 0 {
                forbidden += 1;
            }
        }
    }
    forbidden as f64 / (f64::from(placement.size) * f64::from(placement.size))
}

/// Writes the canonical overlay PNG per page: red = text, blue = image,
/// magenta = QR, green frame = chosen stamp square.
pub struct OverlayDebugSink {
    dir: PathBuf,
    page_number: u32,
}

const TEXT_COLOR: Rgb<u8> = Rgb([220, 60, 60]);
const IMAGE_COLOR: Rgb<u8> = Rgb([60, 60, 220]);
const QR_COLOR: Rgb<u8> = Rgb([200, 40, 200]);
const STAMP_COLOR: Rgb<u8> = Rgb([40, 180, 70]);

impl OverlayDebugSink {
    pub fn new(dir: impl Into<PathBuf>, page_number: u32) -> Self {
        Self { dir: dir.into(), page_number }
    }
}

impl DebugSink for OverlayDebugSink {
    fn on_page(&self, event: &DebugEvent<'_>) {
        let mut canvas =
            RgbImage::from_pixel(event.raster_width, event.raster_height, Rgb([255, 255, 255]));

        for (layer, color) in [
            (&event.masks.text, TEXT_COLOR),
            (&event.masks.image, IMAGE_COLOR),
            (&event.masks.qr, QR_COLOR),
        ] {
            for (x, y, p) in layer.enumerate_pixels() {
                if p[0] != 0 {
                    canvas.put_pixel(x, y, color);
                }
            }
        }

        let p = event.placement;
        // A 3px frame keeps the square visible at page scale.
        for inset in 0..3u32.min(p.size / 2) {
            let rect = Rect::at((p.x + inset) as i32, (p.y + inset) as i32)
                .of_size(p.size - 2 * inset, p.size - 2 * inset);
            draw_hollow_rect_mut(&mut canvas, rect, STAMP_COLOR);
        }

        let path = self
            .dir
            .join(format!("page_{:04}_overlay.png", self.page_number));
        if let Err(e) = canvas.save(&path) {
            tracing::warn!(page = self.page_number, error = %e, "failed to write debug overlay");
        }
    }
}
