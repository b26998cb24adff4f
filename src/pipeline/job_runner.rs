// Job drive: open source -> tune workers/DPI -> parallel pages -> manifest.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::info;

use super::manifest::{PageRecord, PageStatus, RunManifest};
use super::page_processor::{PageContext, process_page};
use super::{CancelFlag, TuningProfile, per_page_bytes};
use crate::config::merged::MergedConfig;
use crate::error::{Result, StampError};
use crate::locate::LocatorOptions;
use crate::render::{DirectoryPageSource, PageSource};
use crate::stamp::StampCompositor;

pub struct JobResult {
    pub output_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub pages_total: u32,
    pub pages_stamped: usize,
    pub pages_skipped: usize,
}

/// Run one stamping job over a directory of pre-rasterized pages.
pub fn run_job(config: &MergedConfig, cancel: &CancelFlag) -> Result<JobResult> {
    let source = DirectoryPageSource::open(&config.input, config.source_dpi)?;
    run_job_with_source(&source, config, cancel)
}

/// Run one stamping job against any page source.
pub fn run_job_with_source(
    source: &dyn PageSource,
    config: &MergedConfig,
    cancel: &CancelFlag,
) -> Result<JobResult> {
    let page_count = source.page_count();

    if let Some(selection) = &config.pages
        && selection.highest_named_page() > page_count
    {
        return Err(StampError::config(format!(
            "page selection names page {} but the source has {} pages",
            selection.highest_named_page(),
            page_count
        )));
    }

    let tuning = TuningProfile::for_page_count(page_count);
    let dpi = if config.dpi > 0 { config.dpi } else { tuning.dpi };
    let mut workers = if config.workers > 0 {
        config.workers
    } else {
        tuning.workers
    };

    // Cap in-flight pages so peak memory stays inside the budget. The first
    // page's dimensions stand in for the document's.
    if let Ok(probe) = source.raster(0, dpi) {
        let budget = config.memory_budget_mb as u64 * 1024 * 1024;
        let per_page = per_page_bytes(probe.width(), probe.height()).max(1);
        let cap = (budget / per_page).max(1) as usize;
        workers = workers.min(cap);
    }

    info!(
        input = %config.input.display(),
        pages = page_count,
        workers,
        dpi,
        "starting stamping job"
    );

    let compositor = StampCompositor::from_png(&config.stamp)?;

    let options = LocatorOptions {
        working_dpi: dpi,
        acceptable_overlap: config.acceptable_overlap,
        fallback_overlap: config.fallback_overlap,
        margin: config.margin,
        prefer_corners: config.prefer_corners,
        ..LocatorOptions::default()
    };

    std::fs::create_dir_all(&config.output)?;
    if let Some(dir) = &config.debug_dir {
        std::fs::create_dir_all(dir)?;
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| StampError::pipeline(e.to_string()))?;

    let mut records: Vec<PageRecord> = pool.install(|| {
        (0..page_count)
            .into_par_iter()
            .map(|page_index| {
                let page_number = page_index + 1;
                if cancel.is_cancelled() {
                    return PageRecord::skipped(page_number, "cancelled");
                }
                let selected = config
                    .pages
                    .as_ref()
                    .is_none_or(|selection| selection.contains(page_number));
                let output_path = config.output.join(format!("page_{page_number:04}.png"));
                process_page(&PageContext {
                    page_index,
                    source,
                    compositor: &compositor,
                    options: &options,
                    prefix: &config.prefix,
                    start_index: config.start_index,
                    dpi,
                    selected,
                    output_path: &output_path,
                    debug_dir: config.debug_dir.as_deref(),
                })
            })
            .collect()
    });

    // Placements are reported in page order regardless of completion order.
    records.sort_by_key(|r| r.page_number);

    let manifest = RunManifest {
        input: config.input.display().to_string(),
        output: config.output.display().to_string(),
        working_dpi: dpi,
        workers,
        pages: records,
    };
    let manifest_path = config.output.join("manifest.json");
    manifest.write_to(&manifest_path)?;

    let pages_skipped = manifest.count(PageStatus::Skipped);
    let pages_stamped = manifest.pages.len() - pages_skipped;
    info!(
        output = %config.output.display(),
        stamped = pages_stamped,
        skipped = pages_skipped,
        "job finished"
    );

    Ok(JobResult {
        output_dir: config.output.clone(),
        manifest_path,
        pages_total: page_count,
        pages_stamped,
        pages_skipped,
    })
}
