// Run manifest: one JSON record per page, emitted in page order.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::locate::{Placement, PlacementQuality};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    /// Stamped with acceptable overlap.
    Stamped,
    /// Stamped, overlap above the acceptable threshold but within the
    /// fallback ceiling.
    Fallback,
    /// Stamped on the least-bad spot; overlap exceeds the fallback ceiling.
    Degraded,
    /// Page left unstamped; `reason` says why.
    Skipped,
}

impl From<PlacementQuality> for PageStatus {
    fn from(quality: PlacementQuality) -> Self {
        match quality {
            PlacementQuality::Acceptable => Self::Stamped,
            PlacementQuality::Fallback => Self::Fallback,
            PlacementQuality::Degraded => Self::Degraded,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlacementRecord {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub overlap_fraction: f64,
}

impl From<Placement> for PlacementRecord {
    fn from(p: Placement) -> Self {
        Self {
            x: p.x,
            y: p.y,
            size: p.size,
            overlap_fraction: p.overlap_fraction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub page_number: u32,
    pub status: PageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<PlacementRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PageRecord {
    pub fn stamped(page_number: u32, placement: Placement) -> Self {
        Self {
            page_number,
            status: placement.quality.into(),
            placement: Some(placement.into()),
            reason: None,
        }
    }

    pub fn skipped(page_number: u32, reason: impl Into<String>) -> Self {
        Self {
            page_number,
            status: PageStatus::Skipped,
            placement: None,
            reason: Some(reason.into()),
        }
    }
}

/// Summary of one job run.
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub input: String,
    pub output: String,
    pub working_dpi: u32,
    pub workers: usize,
    pub pages: Vec<PageRecord>,
}

impl RunManifest {
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn count(&self, status: PageStatus) -> usize {
        self.pages.iter().filter(|p| p.status == status).count()
    }
}
