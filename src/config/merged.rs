use std::path::PathBuf;

use super::job::{Job, PageSelection};
use super::settings::Settings;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Pages to stamp; `None` stamps every page.
    pub pages: Option<PageSelection>,
    pub dpi: u32,
    pub source_dpi: u32,
    pub workers: usize,
    pub memory_budget_mb: usize,
    pub acceptable_overlap: f64,
    pub fallback_overlap: f64,
    pub margin: u32,
    pub prefer_corners: bool,
    pub stamp: PathBuf,
    pub prefix: String,
    pub start_index: u32,
    pub debug_dir: Option<PathBuf>,
}

impl MergedConfig {
    /// Job fields override settings where present; settings fill the rest.
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            input: PathBuf::from(&job.input),
            output: PathBuf::from(&job.output),
            pages: job.pages.clone(),
            dpi: job.dpi.unwrap_or(settings.dpi),
            source_dpi: job.source_dpi.unwrap_or(settings.source_dpi),
            workers: job.workers.unwrap_or(settings.workers),
            memory_budget_mb: settings.memory_budget_mb,
            acceptable_overlap: settings.acceptable_overlap,
            fallback_overlap: settings.fallback_overlap,
            margin: settings.margin,
            prefer_corners: settings.prefer_corners,
            stamp: job.stamp.clone().unwrap_or_else(|| settings.stamp.clone()),
            prefix: job.prefix.clone().unwrap_or_else(|| settings.prefix.clone()),
            start_index: job.start_index.unwrap_or(settings.start_index),
            debug_dir: job
                .debug_dir
                .clone()
                .or_else(|| settings.debug_dir.clone()),
        }
    }
}
