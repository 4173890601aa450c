//! Simulation configuration and setup validation.

use marl_producer::{DeclareContext, Producer, ProducerDescriptor, ProducerParams};
use marl_store::{FallbackMap, PropertyRegistry, ZeroRegistry};

use crate::error::ConfigError;
use crate::lifecycle::{check_stateful_sanity, Simulation};

/// Collects producers during the construction phase.
///
/// [`build`](SimulationConfig::build) performs the whole setup
/// protocol: the phase-1 declaration pass over every producer, sealing
/// the registry, per-region dependency resolution, and the stateful
/// sanity check. Setup is single-threaded by construction: the config
/// is consumed by value and the resulting [`Simulation`] is immutable.
pub struct SimulationConfig {
    producers: Vec<(Box<dyn Producer>, ProducerParams)>,
    max_points: usize,
}

impl SimulationConfig {
    /// Start an empty configuration.
    pub fn new() -> Self {
        Self {
            producers: Vec::new(),
            max_points: 0,
        }
    }

    /// Register a producer with its input parameters.
    ///
    /// Registration order is the tie-break order of the resolved
    /// evaluation sequence.
    pub fn with_producer(
        mut self,
        producer: Box<dyn Producer>,
        params: ProducerParams,
    ) -> Self {
        self.producers.push((producer, params));
        self
    }

    /// Pre-register the maximum quadrature-point count, e.g. the
    /// largest count across cooperating sub-simulations. Zero-fallback
    /// storage is sized to at least this and only ever grows.
    pub fn with_max_points(mut self, n_points: usize) -> Self {
        self.max_points = self.max_points.max(n_points);
        self
    }

    /// Run setup and produce an immutable [`Simulation`].
    pub fn build(self) -> Result<Simulation, ConfigError> {
        if self.producers.is_empty() {
            return Err(ConfigError::NoProducers);
        }

        let mut registry = PropertyRegistry::new();
        let zeros = ZeroRegistry::new();
        zeros.grow_to(self.max_points);
        let mut fallbacks = FallbackMap::new();

        // Phase 1: record every producer's intents.
        let mut producers = Vec::with_capacity(self.producers.len());
        let mut descriptors = Vec::with_capacity(self.producers.len());
        for (mut producer, params) in self.producers {
            let mut descriptor = ProducerDescriptor::new(
                producer.name(),
                producer.regions(),
                producer.is_boundary(),
            );
            let mut decl = DeclareContext::new(
                &mut registry,
                &zeros,
                &mut fallbacks,
                &params,
                &mut descriptor,
            );
            producer.declare(&mut decl)?;
            producers.push(producer);
            descriptors.push(descriptor);
        }
        registry.seal();

        // Phase 2: consume all descriptors at once.
        let orders = marl_producer::resolve_all(&descriptors, &fallbacks)?;
        check_stateful_sanity(&registry, &producers, &descriptors)?;

        Ok(Simulation::assemble(
            registry,
            producers,
            descriptors,
            orders,
            zeros,
            fallbacks,
        ))
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}
