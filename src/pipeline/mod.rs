// Page coordinator: parallel per-page drive of rasterize -> locate -> stamp.

pub mod job_runner;
pub mod manifest;
pub mod orchestrator;
pub mod page_processor;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use job_runner::{JobResult, run_job, run_job_with_source};
pub use manifest::{PageRecord, PageStatus, RunManifest};
pub use orchestrator::run_all_jobs;

/// Worker count and working DPI adapted to document length: short documents
/// get finer analysis, long ones trade resolution for throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuningProfile {
    pub workers: usize,
    pub dpi: u32,
}

impl TuningProfile {
    pub fn for_page_count(pages: u32) -> Self {
        if pages < 100 {
            Self { workers: 4, dpi: 250 }
        } else if pages <= 300 {
            Self { workers: 8, dpi: 200 }
        } else {
            Self { workers: 12, dpi: 150 }
        }
    }
}

/// Estimated peak bytes held by one in-flight page: the RGB raster, the RGBA
/// working copy, three byte masks and the integral table.
pub fn per_page_bytes(width: u32, height: u32) -> u64 {
    let wh = u64::from(width) * u64::from(height);
    3 * wh + 4 * wh + 3 * wh + 4 * (u64::from(width) + 1) * (u64::from(height) + 1)
}

/// Cooperative cancellation, observed between pages only. A cancelled
/// coordinator refuses to start further pages; in-flight pages finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
