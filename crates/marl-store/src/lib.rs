//! Type-erased generational property storage.
//!
//! The store layer owns the mapping from property names to dense IDs
//! ([`PropertyRegistry`]), the per-thread per-quadrature-point value
//! arrays with up to three generations of history ([`PropertyData`]),
//! and the shared zero-fallback storage ([`ZeroRegistry`],
//! [`FallbackMap`]).
//!
//! Setup is single-threaded: the registry assigns IDs while unsealed,
//! then [`PropertyRegistry::seal`] freezes it and it becomes read-only,
//! safe to share across worker threads. Each worker thread owns one
//! [`PropertyData`] instance and mutates only that.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod array;
pub mod data;
pub mod error;
pub mod registry;
pub mod zero;

pub use array::{ErasedArray, PropArray};
pub use data::PropertyData;
pub use error::StoreError;
pub use registry::{PropInfo, PropertyRegistry, Stage};
pub use zero::{FallbackMap, ZeroRegistry};
