// Stamp compositing: scaled stamp PNG + numbered caption onto the page.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_text_mut;

use crate::error::{Result, StampError};
use crate::locate::StampPlan;

/// Caption height as a fraction of the stamp side.
const CAPTION_SCALE: f32 = 0.14;

/// Gap between the stamp square and its caption, as a fraction of the side.
const CAPTION_GAP: f32 = 0.05;

const CAPTION_COLOR: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// Draws a located stamp onto a page raster.
///
/// Implementations work purely in raster pixels at the locator's working
/// DPI; translating to document user-space units is the caller's concern.
pub trait Compositor: Send + Sync {
    fn apply(&self, page: &mut RgbaImage, plan: &StampPlan, caption: &str) -> Result<()>;
}

/// Compositor backed by a stamp PNG and a system sans-serif caption face.
///
/// The stamp is rescaled to `size x size` per page and alpha-composited at
/// the planned position; the caption is drawn just below it. When no usable
/// font face resolves on the host, pages are stamped without a caption and a
/// warning is logged once at construction.
pub struct StampCompositor {
    stamp: RgbaImage,
    font: Option<FontVec>,
}

impl StampCompositor {
    /// Load the stamp image and resolve the caption face.
    pub fn from_png(path: &Path) -> Result<Self> {
        let stamp = image::open(path)
            .map_err(|e| {
                StampError::composite(format!("failed to load stamp image {}: {e}", path.display()))
            })?
            .to_rgba8();
        if stamp.width() == 0 || stamp.height() == 0 {
            return Err(StampError::composite(format!(
                "stamp image {} is empty",
                path.display()
            )));
        }

        let font = resolve_caption_font();
        if font.is_none() {
            tracing::warn!("no sans-serif font face found; stamping without captions");
        }

        Ok(Self { stamp, font })
    }

    /// Build from an already-decoded stamp, without caption support.
    /// Intended for tests and embedders that bring their own overlay text.
    pub fn from_image(stamp: RgbaImage) -> Self {
        Self { stamp, font: None }
    }
}

impl Compositor for StampCompositor {
    fn apply(&self, page: &mut RgbaImage, plan: &StampPlan, caption: &str) -> Result<()> {
        if plan.x + plan.size > page.width() || plan.y + plan.size > page.height() {
            return Err(StampError::composite(format!(
                "plan {}x{}+{} exceeds page {}x{}",
                plan.x,
                plan.y,
                plan.size,
                page.width(),
                page.height()
            )));
        }

        let scaled = imageops::resize(
            &self.stamp,
            plan.size,
            plan.size,
            imageops::FilterType::Lanczos3,
        );
        imageops::overlay(page, &scaled, i64::from(plan.x), i64::from(plan.y));

        if let Some(font) = &self.font {
            let px = (plan.size as f32 * CAPTION_SCALE).max(8.0);
            let gap = (plan.size as f32 * CAPTION_GAP).max(2.0) as u32;
            let caption_y = plan.y + plan.size + gap;
            if caption_y as f32 + px < page.height() as f32 {
                draw_text_mut(
                    page,
                    CAPTION_COLOR,
                    plan.x as i32,
                    caption_y as i32,
                    PxScale::from(px),
                    font,
                    caption,
                );
            }
        }

        Ok(())
    }
}

/// Resolve a system sans-serif face through fontdb.
fn resolve_caption_font() -> Option<FontVec> {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    let query = fontdb::Query {
        families: &[fontdb::Family::SansSerif],
        weight: fontdb::Weight::NORMAL,
        stretch: fontdb::Stretch::Normal,
        style: fontdb::Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| {
        FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
    })
    .flatten()
}
