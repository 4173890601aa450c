//! Producer trait, declaration front-end, and dependency resolution.
//!
//! Producers are the computational objects that supply and request
//! named properties. Setup follows a two-phase protocol: phase 1
//! ([`Producer::declare`] through a [`DeclareContext`]) only records
//! intents — declared and requested names — into an explicit
//! [`ProducerDescriptor`] per producer; phase 2
//! ([`resolver::resolve_order`]) consumes all descriptors at once to
//! build the per-region dependency graph and evaluation order, decoupled
//! from evaluation itself.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod declare;
pub mod params;
pub mod producer;
pub mod resolver;

pub use context::EvalContext;
pub use declare::{DeclareContext, Prop, ProducerDescriptor};
pub use params::ProducerParams;
pub use producer::{Producer, StatefulSeed};
pub use resolver::{resolve_all, resolve_order, ResolveError};
