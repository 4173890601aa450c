//! The sealed simulation and its per-element evaluation lifecycle.

use indexmap::IndexMap;

use marl_core::{EvalError, PropSet, QualifiedName, Region};
use marl_producer::{EvalContext, Producer, ProducerDescriptor};
use marl_store::{FallbackMap, PropertyData, PropertyRegistry, StoreError, ZeroRegistry};

use crate::error::SanityError;

/// Attribute an evaluation failure to the producer being run, unless it
/// already carries one.
fn attribute(producer: &str, err: EvalError) -> EvalError {
    match err {
        EvalError::ProducerFailed { .. } => err,
        other => EvalError::ProducerFailed {
            producer: producer.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Verify that every producer with stateful declared properties exposes
/// a seeding step.
///
/// A stateful property with no explicit initial value would enter the
/// first rotation undefined, so this is a fatal configuration error,
/// caught before any time step runs.
pub(crate) fn check_stateful_sanity(
    registry: &PropertyRegistry,
    producers: &[Box<dyn Producer>],
    descriptors: &[ProducerDescriptor],
) -> Result<(), SanityError> {
    let stateful = registry.stateful_ids();
    for (producer, descriptor) in producers.iter().zip(descriptors) {
        let own_stateful = descriptor.supplied_ids().intersection(&stateful);
        if own_stateful.is_empty() || producer.stateful_seed().is_some() {
            continue;
        }
        let properties = own_stateful
            .iter()
            .filter_map(|id| registry.info(id).ok())
            .map(|info| info.name().clone())
            .collect();
        return Err(SanityError::MissingStatefulSeed {
            producer: producer.name().to_string(),
            properties,
        });
    }
    Ok(())
}

/// A validated, immutable simulation: sealed registry, producers, and
/// per-region evaluation orders.
///
/// Shared read-only across worker threads; each thread obtains its own
/// mutable [`PropertyData`] from [`data`](Simulation::data) and drives
/// the per-element lifecycle against it.
pub struct Simulation {
    registry: PropertyRegistry,
    producers: Vec<Box<dyn Producer>>,
    descriptors: Vec<ProducerDescriptor>,
    orders: IndexMap<Region, Vec<usize>>,
    zeros: ZeroRegistry,
    fallbacks: FallbackMap,
    stateful: PropSet,
}

impl Simulation {
    pub(crate) fn assemble(
        registry: PropertyRegistry,
        producers: Vec<Box<dyn Producer>>,
        descriptors: Vec<ProducerDescriptor>,
        orders: IndexMap<Region, Vec<usize>>,
        zeros: ZeroRegistry,
        fallbacks: FallbackMap,
    ) -> Self {
        let stateful = registry.stateful_ids();
        Self {
            registry,
            producers,
            descriptors,
            orders,
            zeros,
            fallbacks,
            stateful,
        }
    }

    /// The sealed property registry.
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    /// The shared zero storage.
    pub fn zeros(&self) -> &ZeroRegistry {
        &self.zeros
    }

    /// A fresh property store for one worker thread.
    pub fn data(&self) -> PropertyData {
        PropertyData::for_registry(&self.registry)
    }

    /// Every region with registered producers, in first-appearance
    /// order.
    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.orders.keys().copied()
    }

    /// The resolved evaluation order for a region, as indices into the
    /// registration sequence.
    pub fn order(&self, region: Region) -> Option<&[usize]> {
        self.orders.get(&region).map(Vec::as_slice)
    }

    /// Producer names in the region's evaluation order.
    pub fn evaluation_order(&self, region: Region) -> Vec<&str> {
        match self.orders.get(&region) {
            Some(order) => order
                .iter()
                .map(|&i| self.producers[i].name())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Size histories for the active element and seed stateful CURRENT
    /// values.
    ///
    /// Called once per element before its first evaluation. CURRENT
    /// (and OLD/OLDER where retained) is sized to `n_points`; the
    /// seeding step fills CURRENT only, with OLD/OLDER populated by
    /// subsequent rotation.
    pub fn init_stateful_properties(
        &self,
        data: &mut PropertyData,
        region: Region,
        n_points: usize,
    ) -> Result<(), EvalError> {
        data.resize(n_points);
        self.zeros.grow_to(n_points);
        let Some(order) = self.orders.get(&region) else {
            return Ok(());
        };
        let mut ctx = EvalContext::new(data);
        for &i in order {
            let has_stateful = !self
                .descriptors[i]
                .supplied_ids()
                .intersection(&self.stateful)
                .is_empty();
            if !has_stateful {
                continue;
            }
            if let Some(seed) = self.producers[i].stateful_seed() {
                let name = self.producers[i].name();
                for qp in 0..n_points {
                    seed.seed_qp(qp, &mut ctx).map_err(|e| attribute(name, e))?;
                }
            }
        }
        Ok(())
    }

    /// Evaluate every producer of the region, in resolved order, at
    /// every quadrature point of the active element.
    ///
    /// Producers whose `compute` flag is off are reset instead of
    /// evaluated.
    pub fn compute_properties(
        &self,
        data: &mut PropertyData,
        region: Region,
        n_points: usize,
    ) -> Result<(), EvalError> {
        data.resize(n_points);
        self.zeros.grow_to(n_points);
        let Some(order) = self.orders.get(&region) else {
            return Ok(());
        };
        let mut ctx = EvalContext::new(data);
        for &i in order {
            let producer = &self.producers[i];
            let name = producer.name();
            if producer.compute_enabled() {
                for qp in 0..n_points {
                    producer
                        .compute_qp(qp, &mut ctx)
                        .map_err(|e| attribute(name, e))?;
                }
            } else {
                for qp in 0..n_points {
                    producer
                        .reset_qp(qp, &mut ctx)
                        .map_err(|e| attribute(name, e))?;
                }
            }
        }
        Ok(())
    }

    /// Re-evaluate the region's producers at a single quadrature point.
    ///
    /// The store must already be sized for the active element.
    pub fn compute_properties_at(
        &self,
        data: &mut PropertyData,
        region: Region,
        qp: usize,
    ) -> Result<(), EvalError> {
        let Some(order) = self.orders.get(&region) else {
            return Ok(());
        };
        let mut ctx = EvalContext::new(data);
        for &i in order {
            let producer = &self.producers[i];
            let name = producer.name();
            if producer.compute_enabled() {
                producer
                    .compute_qp(qp, &mut ctx)
                    .map_err(|e| attribute(name, e))?;
            } else {
                producer
                    .reset_qp(qp, &mut ctx)
                    .map_err(|e| attribute(name, e))?;
            }
        }
        Ok(())
    }

    /// End-of-step rotation: OLDER ← OLD, then OLD ← CURRENT, for every
    /// stateful property, as a bulk copy by dense ID.
    ///
    /// Triggered by the time-stepping collaborator before CURRENT is
    /// recomputed for the new step.
    pub fn rotate_state(&self, data: &mut PropertyData) -> Result<(), StoreError> {
        data.rotate(&self.stateful)
    }

    /// Re-run the stateful sanity check.
    ///
    /// [`SimulationConfig::build`](crate::SimulationConfig::build)
    /// already runs it; this entry point serves collaborators that
    /// check once more at setup end.
    pub fn check_stateful_sanity(&self) -> Result<(), SanityError> {
        check_stateful_sanity(&self.registry, &self.producers, &self.descriptors)
    }

    // ── Consistency reporting ──────────────────────────────────

    /// Names supplied in a region, in registration order.
    pub fn supplied_names(&self, region: Region) -> Vec<QualifiedName> {
        let mut names = Vec::new();
        for descriptor in self.descriptors.iter().filter(|d| d.active_in(region)) {
            for name in descriptor.supplied() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Names requested in a region, in registration order.
    pub fn requested_names(&self, region: Region) -> Vec<QualifiedName> {
        let mut names = Vec::new();
        for descriptor in self.descriptors.iter().filter(|d| d.active_in(region)) {
            for name in descriptor.requested() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Names registered as zero-backed in a region.
    pub fn fallback_names(&self, region: Region) -> Vec<QualifiedName> {
        self.fallbacks.names(region).cloned().collect()
    }
}
