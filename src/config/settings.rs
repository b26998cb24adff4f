use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StampError;
use crate::locate::{DEFAULT_ACCEPTABLE_OVERLAP, DEFAULT_FALLBACK_OVERLAP, DEFAULT_MARGIN};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Working DPI for analysis and output. 0 selects the adaptive profile.
    pub dpi: u32,
    /// DPI the input page images were rasterized at.
    pub source_dpi: u32,
    /// Parallel page workers. 0 selects the adaptive profile.
    pub workers: usize,
    /// Cap on total in-flight page memory.
    pub memory_budget_mb: usize,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    /// Page-interior margin in pixels at reference DPI 200.
    pub margin: u32,
    pub prefer_corners: bool,
    /// Stamp image overlaid on every page.
    pub stamp: PathBuf,
    /// Piece-number prefix for captions ("Pièce n° {prefix}-{n}").
    pub prefix: String,
    /// Piece number assigned to the first page.
    pub start_index: u32,
    /// When set, per-page mask/placement overlays are written here.
    pub debug_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dpi: 0,
            source_dpi: 300,
            workers: 0,
            memory_budget_mb: 2048,
            acceptable_overlap: DEFAULT_ACCEPTABLE_OVERLAP,
            fallback_overlap: DEFAULT_FALLBACK_OVERLAP,
            margin: DEFAULT_MARGIN,
            prefer_corners: true,
            stamp: PathBuf::from("stamp.png"),
            prefix: String::from("DOC"),
            start_index: 1,
            debug_dir: None,
        }
    }
}

impl Settings {
    /// Settings governing a job file: the `settings.yaml` next to it when
    /// one exists, built-in defaults otherwise. Parsed settings are
    /// validated before any job runs against them.
    pub fn for_job_file(job_file_path: &Path) -> crate::error::Result<Self> {
        match job_file_path.parent().map(|dir| dir.join("settings.yaml")) {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml)
            .map_err(|e| StampError::config(format!("unreadable settings YAML: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    /// Reject settings no job could run with. The adaptive zeros (`dpi`,
    /// `workers`) are legal; a zero source DPI or an empty caption prefix
    /// is not, and the overlap thresholds must be ordered fractions.
    fn validate(&self) -> crate::error::Result<()> {
        if self.source_dpi == 0 {
            return Err(StampError::config("source_dpi must be positive"));
        }
        if self.prefix.is_empty() {
            return Err(StampError::config("prefix must not be empty"));
        }
        let ordered = (0.0..=1.0).contains(&self.acceptable_overlap)
            && (0.0..=1.0).contains(&self.fallback_overlap)
            && self.acceptable_overlap <= self.fallback_overlap;
        if !ordered {
            return Err(StampError::config(format!(
                "overlap thresholds out of order: acceptable {} / fallback {}",
                self.acceptable_overlap, self.fallback_overlap
            )));
        }
        Ok(())
    }
}
