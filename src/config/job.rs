use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::StampError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml)
            .map_err(|e| StampError::config(format!("unreadable jobs YAML: {e}")))
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// Directory of pre-rasterized page images.
    pub input: String,
    /// Directory stamped pages and the manifest are written to.
    pub output: String,
    /// Which pages receive a stamp, e.g. `"1, 4-6, 12-"`. Unselected pages
    /// pass through unstamped. Absent means every page.
    pub pages: Option<PageSelection>,
    pub dpi: Option<u32>,
    pub source_dpi: Option<u32>,
    pub workers: Option<usize>,
    pub stamp: Option<PathBuf>,
    pub prefix: Option<String>,
    pub start_index: Option<u32>,
    pub debug_dir: Option<PathBuf>,
}

/// Which pages of a document receive a stamp.
///
/// Comma-separated spans over 1-based page numbers: a single page (`"4"`),
/// a bounded span (`"2-6"`), or an open-ended span running to the last page
/// (`"9-"`). The document length is unknown until the page source is opened,
/// so the selection keeps its spans and answers membership queries instead
/// of materializing a page list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    spans: Vec<PageSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageSpan {
    first: u32,
    /// `None` for an open-ended span.
    last: Option<u32>,
}

impl PageSelection {
    pub fn parse(input: &str) -> crate::error::Result<Self> {
        let spans = input
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(parse_span)
            .collect::<crate::error::Result<Vec<_>>>()?;
        if spans.is_empty() {
            return Err(StampError::config(format!(
                "page selection '{input}' names no pages"
            )));
        }
        Ok(Self { spans })
    }

    /// True when the 1-based `page_number` should be stamped.
    pub fn contains(&self, page_number: u32) -> bool {
        self.spans.iter().any(|span| {
            page_number >= span.first && span.last.is_none_or(|last| page_number <= last)
        })
    }

    /// Highest page the selection names outright. Open-ended spans count
    /// only their first page; everything past it exists on any document
    /// that satisfies this bound.
    pub fn highest_named_page(&self) -> u32 {
        self.spans
            .iter()
            .map(|span| span.last.unwrap_or(span.first))
            .max()
            .unwrap_or(0)
    }
}

fn parse_span(token: &str) -> crate::error::Result<PageSpan> {
    let number = |text: &str| match text.trim().parse::<u32>() {
        Ok(0) => Err(StampError::config(format!(
            "page numbers are 1-based, got 0 in '{token}'"
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(StampError::config(format!(
            "'{token}' is not a page or span of pages"
        ))),
    };

    match token.split_once('-') {
        None => {
            let page = number(token)?;
            Ok(PageSpan { first: page, last: Some(page) })
        }
        Some((first, "")) => Ok(PageSpan {
            first: number(first)?,
            last: None,
        }),
        Some((first, last)) => {
            let (first, last) = (number(first)?, number(last)?);
            if last < first {
                return Err(StampError::config(format!("span '{token}' runs backwards")));
            }
            Ok(PageSpan { first, last: Some(last) })
        }
    }
}

impl<'de> Deserialize<'de> for PageSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
