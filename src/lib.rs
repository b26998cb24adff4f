//! Stampwise overlays a numbered stamp image onto the whitespace of
//! rasterized document pages: per page it builds forbidden-content masks
//! (text, images, matrix codes), finds the largest square that stays clear
//! of them, and composites the stamp with its "Pièce n°" caption there.

pub mod config;
pub mod error;
pub mod locate;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod stamp;

pub use error::{Result, StampError};
pub use locate::{
    ContentMasks, LocatorError, LocatorOptions, Placement, PlacementQuality, StampPlan,
    build_masks, find_placement, locate_stamp,
};
pub use raster::PageRaster;
