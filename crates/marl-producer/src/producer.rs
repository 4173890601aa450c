//! The [`Producer`] trait and the [`StatefulSeed`] capability.

use marl_core::{EvalError, Region};
use marl_store::StoreError;

use crate::context::EvalContext;
use crate::declare::DeclareContext;

/// A computational object that supplies and/or requests properties
/// within its geometric regions.
///
/// # Contract
///
/// - [`declare`](Producer::declare) is called exactly once, during the
///   single-threaded construction phase, and is the only place
///   properties may be declared or requested. It records intents into
///   the producer's descriptor and hands back typed [`Prop`]
///   handles the producer stores for evaluation.
/// - [`compute_qp`](Producer::compute_qp) is invoked once per
///   quadrature point, in the dependency order resolved for the active
///   region; dependencies declared by earlier producers are already
///   computed.
/// - Producers with stateful (OLD/OLDER-carrying) properties expose a
///   [`StatefulSeed`] via [`stateful_seed`](Producer::stateful_seed);
///   a stateful producer without one fails the setup sanity check.
///
/// # Object safety
///
/// The trait is object-safe; the engine stores producers as
/// `Vec<Box<dyn Producer>>`.
///
/// [`Prop`]: crate::Prop
pub trait Producer: Send {
    /// Human-readable name for error reporting and diagnostics.
    fn name(&self) -> &str;

    /// The regions this producer is restricted to.
    fn regions(&self) -> Vec<Region>;

    /// Whether this producer computes boundary (surface) rather than
    /// volume data.
    fn is_boundary(&self) -> bool {
        false
    }

    /// Whether this producer is evaluated at all.
    ///
    /// When `false`, [`reset_qp`](Producer::reset_qp) is called in
    /// place of [`compute_qp`](Producer::compute_qp) to put the
    /// declared properties into a defined reset state.
    fn compute_enabled(&self) -> bool {
        true
    }

    /// Phase-1 setup: declare supplied and request consumed properties.
    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError>;

    /// Fill this producer's declared values at quadrature point `qp`.
    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError>;

    /// Reset declared values at point `qp` to a producer-defined reset
    /// state. Only called when [`compute_enabled`](Producer::compute_enabled)
    /// is `false`.
    fn reset_qp(&self, _qp: usize, _ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        Ok(())
    }

    /// The seeding capability for stateful properties, if this producer
    /// has one.
    fn stateful_seed(&self) -> Option<&dyn StatefulSeed> {
        None
    }
}

/// Seeds the CURRENT generation of stateful properties before the first
/// time step.
///
/// Implementations fill only CURRENT; OLD and OLDER are populated by
/// rotation, never seeded directly.
pub trait StatefulSeed {
    /// Seed declared stateful values at quadrature point `qp`.
    fn seed_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError>;
}
