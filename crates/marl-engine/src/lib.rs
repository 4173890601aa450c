//! Setup validation and the stateful evaluation lifecycle.
//!
//! [`SimulationConfig`] collects producers during the single-threaded
//! construction phase; [`SimulationConfig::build`] runs the declaration
//! pass, seals the registry, resolves every region's evaluation order,
//! and checks stateful sanity, producing an immutable [`Simulation`].
//! The geometry/assembly collaborator then drives the per-element loop
//! through [`Simulation::init_stateful_properties`] and
//! [`Simulation::compute_properties`], and the time-stepping
//! collaborator triggers [`Simulation::rotate_state`] once per step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifecycle;

pub use config::SimulationConfig;
pub use error::{ConfigError, SanityError};
pub use lifecycle::Simulation;
