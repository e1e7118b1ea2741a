//! Umbrella crate for the `tensorcv` workspace.
//!
//! Re-exports the foundational view/border/dispatch primitives, the
//! separable filter engine with Gaussian synthesis, the tiled perspective
//! warp, and the separable-convolution adapter.

pub use tcv_core::*;
pub use tcv_filter::*;
pub use tcv_sepconv::*;
pub use tcv_warp::*;
