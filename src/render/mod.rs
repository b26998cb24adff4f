// Rasterizer boundary: pages enter the pipeline as RGB rasters.

use std::path::{Path, PathBuf};

use image::imageops;

use crate::error::{Result, StampError};
use crate::raster::PageRaster;

/// Supplies page rasters at a requested DPI.
///
/// The pipeline never touches document formats directly; any producer of
/// rasters (a PDF renderer, a scanner feed, a test double) plugs in here.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> u32;

    /// Render page `page_index` (0-based) at `dpi`.
    fn raster(&self, page_index: u32, dpi: u32) -> Result<PageRaster>;
}

/// Pages pre-rasterized to image files in a directory, ordered by file name.
///
/// The files' native resolution is declared by the caller; requests at any
/// other DPI are served by resampling, so adaptive-DPI tuning behaves the
/// same as with a live renderer.
pub struct DirectoryPageSource {
    pages: Vec<PathBuf>,
    native_dpi: u32,
}

const PAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

impl DirectoryPageSource {
    pub fn open(dir: &Path, native_dpi: u32) -> Result<Self> {
        if native_dpi == 0 {
            return Err(StampError::raster("source DPI must be positive"));
        }
        let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| PAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        if pages.is_empty() {
            return Err(StampError::raster(format!(
                "no page images found in {}",
                dir.display()
            )));
        }
        pages.sort();
        Ok(Self { pages, native_dpi })
    }

    pub fn native_dpi(&self) -> u32 {
        self.native_dpi
    }

    /// Path of a page file, for callers that mirror inputs to outputs.
    pub fn page_path(&self, page_index: u32) -> Option<&Path> {
        self.pages.get(page_index as usize).map(PathBuf::as_path)
    }
}

impl PageSource for DirectoryPageSource {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn raster(&self, page_index: u32, dpi: u32) -> Result<PageRaster> {
        let path = self.pages.get(page_index as usize).ok_or_else(|| {
            StampError::raster(format!(
                "page index {} out of range (source has {} pages)",
                page_index,
                self.pages.len()
            ))
        })?;
        let mut rgb = image::open(path)?.to_rgb8();

        if dpi != self.native_dpi {
            let scale = f64::from(dpi) / f64::from(self.native_dpi);
            let w = ((f64::from(rgb.width()) * scale).round() as u32).max(1);
            let h = ((f64::from(rgb.height()) * scale).round() as u32).max(1);
            rgb = imageops::resize(&rgb, w, h, imageops::FilterType::Triangle);
        }

        Ok(PageRaster::new(rgb, dpi)?)
    }
}
