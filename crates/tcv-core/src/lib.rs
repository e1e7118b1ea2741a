//! Foundational primitives for the tensorcv transform kernels.
//!
//! ## Views and Stride
//! Images use element stride (not byte stride): `stride` is the distance, in
//! elements, between adjacent row starts and may exceed `width * channels`.
//! Tensors are `[batch, height, width, channel]` views over contiguous
//! interleaved storage the caller owns; the kernels never allocate or free
//! pixel buffers.
//!
//! ## Border Policy
//! [`map_index`] resolves out-of-range coordinates per [`BorderMode`] with
//! closed-form modular reflection. `None` is the fill sentinel; `Isolated`
//! must be rejected by engines before any bulk work.
//!
//! ## Dispatch
//! [`Dispatcher`] is the consumed parallel-for seam. Kernels expose a flat
//! task index space over disjoint destination regions, so no implementation
//! needs locks.

mod border;
mod dispatch;
mod error;
mod image;
mod saturate;
mod tensor;
mod transform;

pub use border::{map_index, BorderMode};
pub use dispatch::{Dispatcher, DisjointWriter, SerialDispatcher};
#[cfg(feature = "rayon")]
pub use dispatch::RayonDispatcher;
pub use error::Error;
pub use image::{Image, ImageView, ImageViewMut};
pub use saturate::{saturate_u8, PixelCast};
pub use tensor::{DType, TensorRef, TensorRefMut, TensorView, TensorViewMut};
pub use transform::Mat3;
