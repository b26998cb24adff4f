// Page raster input type: the boundary the external rasterizer delivers.

use image::{GrayImage, RgbImage, buffer::ConvertBuffer};

use crate::locate::{LocatorError, LocatorResult};

/// An immutable RGB raster of one document page at a known DPI.
///
/// Origin is top-left. The raster is the sole input to the whitespace
/// locator; how it was produced (PDF rendering, scanning) is outside the
/// crate.
#[derive(Debug, Clone)]
pub struct PageRaster {
    pixels: RgbImage,
    dpi: u32,
}

impl PageRaster {
    /// Wrap an RGB buffer rendered at `dpi`.
    ///
    /// # Errors
    /// Returns [`LocatorError::InvalidRaster`] for zero-sized buffers or a
    /// zero DPI.
    pub fn new(pixels: RgbImage, dpi: u32) -> LocatorResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(LocatorError::InvalidRaster(format!(
                "zero-sized raster: {}x{}",
                pixels.width(),
                pixels.height()
            )));
        }
        if dpi == 0 {
            return Err(LocatorError::InvalidRaster("raster DPI must be positive".into()));
        }
        Ok(Self { pixels, dpi })
    }

    /// Wrap a decoded image, rejecting anything that is not 8-bit RGB.
    ///
    /// Callers holding RGBA or grayscale data must convert explicitly; the
    /// locator does not guess at channel semantics.
    pub fn from_dynamic(image: image::DynamicImage, dpi: u32) -> LocatorResult<Self> {
        match image {
            image::DynamicImage::ImageRgb8(rgb) => Self::new(rgb, dpi),
            other => Err(LocatorError::InvalidRaster(format!(
                "expected 8-bit RGB pixel data, got {:?}",
                other.color()
            ))),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }

    /// Grayscale view used by the mask builder.
    pub fn to_luma(&self) -> GrayImage {
        self.pixels.convert()
    }
}
