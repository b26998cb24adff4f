// Whitespace locator core: masks -> integral image -> placement search.
// Pure and stateless per page; the debug sink is the only side channel.

pub mod debug;
pub mod integral;
pub mod masks;
pub mod morph;
pub mod options;
pub mod scan;

use std::cmp::Ordering;

use serde::Serialize;
use thiserror::Error;

use crate::raster::PageRaster;
pub use debug::{DebugEvent, DebugSink, MaskBounds, MaskOverlap, OverlayDebugSink};
pub use masks::ContentMasks;
pub use options::LocatorOptions;

/// Reference DPI every pixel-valued constant is expressed at.
pub const REFERENCE_DPI: u32 = 200;

/// Smallest and largest stamp side, in pixels at [`REFERENCE_DPI`].
pub const SIZE_MIN: u32 = 90;
pub const SIZE_MAX: u32 = 300;

/// Page-interior margin the stamp must keep clear, at [`REFERENCE_DPI`].
pub const DEFAULT_MARGIN: u32 = 40;

/// Candidate stamp sides tried largest-first, at [`REFERENCE_DPI`].
pub const DEFAULT_SIZE_SEQUENCE: [u32; 7] = [300, 260, 220, 180, 140, 110, 90];

/// Default overlap thresholds: acceptable and fallback ceilings.
pub const DEFAULT_ACCEPTABLE_OVERLAP: f64 = 0.02;
pub const DEFAULT_FALLBACK_OVERLAP: f64 = 0.10;

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    #[error(
        "page too small: {width}x{height} cannot fit a {min_size}px stamp \
         inside {margin}px margins"
    )]
    PageTooSmall {
        width: u32,
        height: u32,
        min_size: u32,
        margin: u32,
    },

    #[error("invalid locator options: {0}")]
    InvalidOptions(String),
}

pub type LocatorResult<T> = std::result::Result<T, LocatorError>;

/// Axis-aligned pixel rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelBox {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Quality tier of a placement, worst first so that `Ord` ranks upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementQuality {
    /// Best candidate still exceeded the fallback ceiling.
    Degraded,
    /// Overlap above the acceptable threshold but within the fallback ceiling.
    Fallback,
    /// Overlap at or under the acceptable threshold.
    Acceptable,
}

/// Where and how large to draw the stamp, in raster pixels at the working DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner of the stamp square.
    pub x: u32,
    pub y: u32,
    /// Side of the stamp square.
    pub size: u32,
    /// Forbidden-pixel density inside the square, in `[0, 1]`.
    pub overlap_fraction: f64,
    pub quality: PlacementQuality,
}

impl Placement {
    /// Total order: quality tier, then larger size, then lower overlap.
    pub fn cmp_rank(&self, other: &Placement) -> Ordering {
        self.quality
            .cmp(&other.quality)
            .then(self.size.cmp(&other.size))
            .then(other.overlap_fraction.total_cmp(&self.overlap_fraction))
    }
}

/// Output boundary type handed to the compositor. Raster pixel units at the
/// locator's working DPI; unit translation is the consumer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StampPlan {
    pub page_number: u32,
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// Decide where to draw the stamp on one page.
///
/// Builds the three content masks, searches for the largest square that
/// clears the overlap thresholds, and reports one event to the debug sink
/// when configured. Deterministic: identical rasters and options yield
/// bitwise-identical placements.
///
/// # Errors
/// [`LocatorError::PageTooSmall`] when no candidate size fits inside the
/// margins, and [`LocatorError::InvalidOptions`] for malformed options.
/// Excessive overlap is never an error: the best candidate is returned with
/// [`PlacementQuality::Degraded`].
pub fn locate_stamp(raster: &PageRaster, opts: &LocatorOptions) -> LocatorResult<Placement> {
    let params = opts.scaled()?;
    let content = masks::build_masks_scaled(raster, &params);
    let placement = scan::find_placement_scaled(&content, &params)?;

    if let Some(sink) = &opts.debug_sink {
        sink.on_page(&DebugEvent::for_page(raster, &content, placement));
    }

    Ok(placement)
}

/// Build the three content masks for a raster without running the search.
///
/// Exposed so collaborators (tests, OCR refinement, debug tooling) can
/// inspect what the locator would consider forbidden.
pub fn build_masks(raster: &PageRaster, opts: &LocatorOptions) -> LocatorResult<ContentMasks> {
    let params = opts.scaled()?;
    Ok(masks::build_masks_scaled(raster, &params))
}

/// Search pre-built masks for a placement. This is the locator half of
/// [`locate_stamp`]; it does not touch the debug sink.
pub fn find_placement(content: &ContentMasks, opts: &LocatorOptions) -> LocatorResult<Placement> {
    let params = opts.scaled()?;
    scan::find_placement_scaled(content, &params)
}
