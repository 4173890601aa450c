//! Marl: a property registry and dependency-resolved evaluation engine
//! for per-quadrature-point quantities in finite-element assembly.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all marl sub-crates. For most users, adding `marl` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use marl::prelude::*;
//!
//! // A producer supplying a constant conductivity.
//! struct Conductivity {
//!     prop: Option<Prop<f64>>,
//! }
//!
//! impl Producer for Conductivity {
//!     fn name(&self) -> &str { "conductivity" }
//!     fn regions(&self) -> Vec<Region> {
//!         vec![Region::Subdomain(SubdomainId(0))]
//!     }
//!     fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
//!         self.prop = Some(decl.declare_by_name::<f64>("conductivity")?);
//!         Ok(())
//!     }
//!     fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
//!         let prop = self.prop.ok_or(EvalError::PropertyUnavailable {
//!             id: marl::types::PropertyId(0),
//!         })?;
//!         ctx.set(prop, qp, 4.2)
//!     }
//! }
//!
//! let sim = SimulationConfig::new()
//!     .with_producer(Box::new(Conductivity { prop: None }), ProducerParams::new())
//!     .build()
//!     .unwrap();
//!
//! let mut data = sim.data();
//! let block = Region::Subdomain(SubdomainId(0));
//! sim.init_stateful_properties(&mut data, block, 4).unwrap();
//! sim.compute_properties(&mut data, block, 4).unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `marl-core` | IDs, regions, value traits, `Dual`, `PropSet` |
//! | [`store`] | `marl-store` | Registry, per-thread generational storage, zero fallback |
//! | [`producer`] | `marl-producer` | Producer trait, declaration front-end, resolver |
//! | [`engine`] | `marl-engine` | Setup validation and the evaluation lifecycle |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`marl-core`).
///
/// Contains property/region identifiers, the [`types::PropSet`] bitset,
/// the [`types::PropValue`] family, the forward-mode [`types::Dual`]
/// number, and shared error types.
pub use marl_core as types;

/// Registry and generational storage (`marl-store`).
///
/// The [`store::PropertyRegistry`] assigns dense IDs during setup; each
/// worker thread owns a [`store::PropertyData`] holding CURRENT/OLD/OLDER
/// value arrays. [`store::ZeroRegistry`] backs the zero-fallback
/// mechanism.
pub use marl_store as store;

/// Producer trait, declaration front-end, and dependency resolution
/// (`marl-producer`).
///
/// The [`producer::Producer`] trait is the main extension point for
/// user-defined physics objects.
pub use marl_producer as producer;

/// Setup validation and the evaluation lifecycle (`marl-engine`).
///
/// [`engine::SimulationConfig`] collects producers and validates the
/// whole configuration; [`engine::Simulation`] drives the per-element
/// loop and end-of-step rotation.
pub use marl_engine as engine;

/// Common imports for typical marl usage.
///
/// ```rust
/// use marl::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use marl_core::{
        BoundaryId, Dual, Generation, HistoryDepth, PropForm, PropSet, PropValue, PropertyId,
        QualifiedName, Region, SubdomainId,
    };

    // Errors
    pub use marl_core::EvalError;
    pub use marl_engine::{ConfigError, SanityError};
    pub use marl_producer::ResolveError;
    pub use marl_store::StoreError;

    // Storage
    pub use marl_store::{PropArray, PropertyData, PropertyRegistry, ZeroRegistry};

    // Producer surface
    pub use marl_producer::{
        DeclareContext, EvalContext, Producer, ProducerParams, Prop, StatefulSeed,
    };

    // Engine
    pub use marl_engine::{Simulation, SimulationConfig};
}
