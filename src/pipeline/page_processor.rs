// Single page drive: raster -> locate -> composite -> write.

use std::path::Path;
use std::sync::Arc;

use image::{RgbaImage, buffer::ConvertBuffer};
use tracing::warn;

use super::manifest::PageRecord;
use crate::locate::{LocatorOptions, OverlayDebugSink, StampPlan, locate_stamp};
use crate::raster::PageRaster;
use crate::render::PageSource;
use crate::stamp::Compositor;

pub struct PageContext<'a> {
    /// 0-based page index within the source.
    pub page_index: u32,
    pub source: &'a dyn PageSource,
    pub compositor: &'a dyn Compositor,
    pub options: &'a LocatorOptions,
    /// Piece-number prefix, e.g. "DOC" for captions "Pièce n° DOC-7".
    pub prefix: &'a str,
    /// Piece number of the document's first page.
    pub start_index: u32,
    pub dpi: u32,
    /// False when a page-range filter excludes this page.
    pub selected: bool,
    pub output_path: &'a Path,
    pub debug_dir: Option<&'a Path>,
}

/// Process one page end to end and write the output image.
///
/// Never fails the run: every per-page problem (unreadable source, page too
/// small, compositing failure) degrades to a skipped record so the
/// remaining pages keep flowing.
pub fn process_page(ctx: &PageContext<'_>) -> PageRecord {
    let page_number = ctx.page_index + 1;

    if !ctx.selected {
        // Excluded pages still appear in the output set, unstamped.
        if let Ok(raster) = ctx.source.raster(ctx.page_index, ctx.dpi) {
            write_unstamped(&raster, ctx.output_path, page_number);
        }
        return PageRecord::skipped(page_number, "not selected by page range");
    }

    let raster = match ctx.source.raster(ctx.page_index, ctx.dpi) {
        Ok(raster) => raster,
        Err(e) => {
            warn!(page = page_number, error = %e, "failed to rasterize page");
            return PageRecord::skipped(page_number, e.to_string());
        }
    };

    let mut options = ctx.options.clone();
    if let Some(dir) = ctx.debug_dir {
        options.debug_sink = Some(Arc::new(OverlayDebugSink::new(dir, page_number)));
    }

    let placement = match locate_stamp(&raster, &options) {
        Ok(placement) => placement,
        Err(e) => {
            warn!(page = page_number, error = %e, "no stamp placement; leaving page unstamped");
            write_unstamped(&raster, ctx.output_path, page_number);
            return PageRecord::skipped(page_number, e.to_string());
        }
    };

    let plan = StampPlan {
        page_number,
        x: placement.x,
        y: placement.y,
        size: placement.size,
    };
    let caption = format!("Pièce n° {}-{}", ctx.prefix, ctx.start_index + ctx.page_index);

    let mut page: RgbaImage = raster.pixels().convert();
    if let Err(e) = ctx.compositor.apply(&mut page, &plan, &caption) {
        warn!(page = page_number, error = %e, "compositing failed; leaving page unstamped");
        write_unstamped(&raster, ctx.output_path, page_number);
        return PageRecord::skipped(page_number, e.to_string());
    }

    if let Err(e) = page.save(ctx.output_path) {
        warn!(page = page_number, error = %e, "failed to write stamped page");
        return PageRecord::skipped(page_number, e.to_string());
    }

    let record = PageRecord::stamped(page_number, placement);
    match placement.quality {
        crate::locate::PlacementQuality::Acceptable => {}
        quality => warn!(
            page = page_number,
            ?quality,
            overlap = placement.overlap_fraction,
            "stamp placed over content"
        ),
    }
    record
}

fn write_unstamped(raster: &PageRaster, path: &Path, page_number: u32) {
    if let Err(e) = raster.pixels().save(path) {
        warn!(page = page_number, error = %e, "failed to write unstamped page");
    }
}
