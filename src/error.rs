use thiserror::Error;

use crate::locate::LocatorError;

#[derive(Debug, Error)]
pub enum StampError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Raster load error: {0}")]
    RasterError(String),

    #[error("Locate error: {0}")]
    LocateError(#[from] LocatorError),

    #[error("Composite error: {0}")]
    CompositeError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`StampError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl StampError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a raster load error.
    raster => RasterError,
    /// Create a composite error.
    composite => CompositeError,
    /// Create a manifest error.
    manifest => ManifestError,
    /// Create a pipeline error.
    pipeline => PipelineError,
}

impl From<serde_yml::Error> for StampError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for StampError {
    fn from(e: serde_json::Error) -> Self {
        Self::ManifestError(e.to_string())
    }
}

impl From<image::ImageError> for StampError {
    fn from(e: image::ImageError) -> Self {
        Self::RasterError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StampError>;
