//! Block-tiled inverse-mapping resampler for tensorcv.
//!
//! Destination pixels are mapped through a projective destination-to-source
//! transform, quantized against a precomputed fixed-point bilinear weight
//! table, and sampled with nearest or linear interpolation under a border
//! policy. Destinations are decomposed into bounded tiles exposed as a flat
//! task index space for the external dispatch seam; tiles are disjoint, so
//! tasks never synchronize.

mod interp;
mod tile;
mod warp;

pub use interp::{
    InterpTable, INTER_BITS, INTER_REMAP_COEF_BITS, INTER_REMAP_COEF_SCALE, INTER_TAB_SIZE,
};
pub use tile::{TileGrid, TileRect, BLOCK_SIZE};
pub use warp::{warp_perspective, InterpMode, WarpConfig, WarpPixel};
