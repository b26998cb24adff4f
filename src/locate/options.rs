// Locator options and their scaled working-DPI form.

use std::fmt;
use std::sync::Arc;

use super::debug::DebugSink;
use super::{
    DEFAULT_ACCEPTABLE_OVERLAP, DEFAULT_FALLBACK_OVERLAP, DEFAULT_MARGIN, DEFAULT_SIZE_SEQUENCE,
    LocatorError, LocatorResult, PixelBox, REFERENCE_DPI, SIZE_MAX, SIZE_MIN,
};

/// Options recognized by [`locate_stamp`](super::locate_stamp).
///
/// All pixel-valued fields are expressed at [`REFERENCE_DPI`] and scaled by
/// `working_dpi / 200` before use, except `extra_text_regions`, which is
/// already in working-DPI raster coordinates (it typically comes from an OCR
/// pass over the same raster).
#[derive(Clone)]
pub struct LocatorOptions {
    /// DPI the analysis runs at; scales every pixel constant.
    pub working_dpi: u32,
    /// Candidate stamp sides, descending, within `[90, 300]` at ref DPI.
    pub size_sequence: Vec<u32>,
    /// Overlap at or under this fraction is acceptable.
    pub acceptable_overlap: f64,
    /// Overlap at or under this fraction may still be stamped as a fallback.
    pub fallback_overlap: f64,
    /// Page-interior margin at ref DPI.
    pub margin: u32,
    /// Evaluate the four page corners first, preferring top-right.
    pub prefer_corners: bool,
    /// Additional forbidden boxes unioned into the text mask, in working-DPI
    /// raster coordinates.
    pub extra_text_regions: Vec<PixelBox>,
    /// Optional per-page observer for masks and the chosen placement.
    pub debug_sink: Option<Arc<dyn DebugSink>>,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            working_dpi: REFERENCE_DPI,
            size_sequence: DEFAULT_SIZE_SEQUENCE.to_vec(),
            acceptable_overlap: DEFAULT_ACCEPTABLE_OVERLAP,
            fallback_overlap: DEFAULT_FALLBACK_OVERLAP,
            margin: DEFAULT_MARGIN,
            prefer_corners: true,
            extra_text_regions: Vec::new(),
            debug_sink: None,
        }
    }
}

impl fmt::Debug for LocatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatorOptions")
            .field("working_dpi", &self.working_dpi)
            .field("size_sequence", &self.size_sequence)
            .field("acceptable_overlap", &self.acceptable_overlap)
            .field("fallback_overlap", &self.fallback_overlap)
            .field("margin", &self.margin)
            .field("prefer_corners", &self.prefer_corners)
            .field("extra_text_regions", &self.extra_text_regions)
            .field("debug_sink", &self.debug_sink.as_ref().map(|_| ".."))
            .finish()
    }
}

impl LocatorOptions {
    /// Validate the options and scale every pixel constant to the working DPI.
    pub(crate) fn scaled(&self) -> LocatorResult<ScaledParams> {
        if self.working_dpi == 0 {
            return Err(LocatorError::InvalidOptions("working_dpi must be positive".into()));
        }
        if self.size_sequence.is_empty() {
            return Err(LocatorError::InvalidOptions("size_sequence must not be empty".into()));
        }
        for pair in self.size_sequence.windows(2) {
            if pair[1] > pair[0] {
                return Err(LocatorError::InvalidOptions(format!(
                    "size_sequence must be descending, found {} after {}",
                    pair[1], pair[0]
                )));
            }
        }
        for &s in &self.size_sequence {
            if !(SIZE_MIN..=SIZE_MAX).contains(&s) {
                return Err(LocatorError::InvalidOptions(format!(
                    "candidate size {s} outside [{SIZE_MIN}, {SIZE_MAX}] at reference DPI"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.acceptable_overlap)
            || !(0.0..=1.0).contains(&self.fallback_overlap)
            || self.fallback_overlap < self.acceptable_overlap
        {
            return Err(LocatorError::InvalidOptions(format!(
                "overlap thresholds must satisfy 0 <= acceptable ({}) <= fallback ({}) <= 1",
                self.acceptable_overlap, self.fallback_overlap
            )));
        }

        let factor = f64::from(self.working_dpi) / f64::from(REFERENCE_DPI);
        let len = |v: u32| scale_len(v, factor);
        let area = |v: u64| ((v as f64) * factor * factor).round() as u64;

        Ok(ScaledParams {
            sizes: self.size_sequence.iter().map(|&s| len(s)).collect(),
            margin: ((f64::from(self.margin) * factor).round()) as u32,
            acceptable_overlap: self.acceptable_overlap,
            fallback_overlap: self.fallback_overlap,
            prefer_corners: self.prefer_corners,
            close_horizontal: (len(50), len(3)),
            close_vertical: (len(3), len(30)),
            close_detail: (len(10), len(10)),
            text_halo: (len(50), len(30)),
            image_dilate: (len(60), len(60)),
            qr_dilate: (len(80), len(80)),
            rule_horizontal: (len(100), len(1)),
            rule_vertical: (len(1), len(100)),
            min_image_area: area(5000),
            min_qr_bbox_area: area(2000),
            step_floor: len(8),
            degenerate_dim: len(2 * 100),
            extra_text_regions: self.extra_text_regions.clone(),
        })
    }
}

fn scale_len(v: u32, factor: f64) -> u32 {
    ((f64::from(v) * factor).round() as u32).max(1)
}

/// Pipeline pixel constants pre-scaled to the working DPI.
/// Intensity thresholds live in [`masks`](super::masks) and do not scale.
#[derive(Debug, Clone)]
pub(crate) struct ScaledParams {
    pub sizes: Vec<u32>,
    pub margin: u32,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub prefer_corners: bool,
    pub close_horizontal: (u32, u32),
    pub close_vertical: (u32, u32),
    pub close_detail: (u32, u32),
    pub text_halo: (u32, u32),
    pub image_dilate: (u32, u32),
    pub qr_dilate: (u32, u32),
    pub rule_horizontal: (u32, u32),
    pub rule_vertical: (u32, u32),
    pub min_image_area: u64,
    pub min_qr_bbox_area: u64,
    pub step_floor: u32,
    /// Rasters narrower than this in either axis skip analysis entirely and
    /// are marked fully forbidden (twice the largest kernel extent).
    pub degenerate_dim: u32,
    pub extra_text_regions: Vec<PixelBox>,
}
