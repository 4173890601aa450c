//! Test fixtures and mock producers for marl development.
//!
//! Small, configurable [`Producer`] implementations covering the common
//! test shapes: constant suppliers, scaling consumers, stateful decay
//! with and without a seeding step, AD suppliers, and zero-fallback
//! consumers.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use marl_core::{Dual, EvalError, Region};
use marl_producer::{DeclareContext, EvalContext, Producer, Prop, StatefulSeed};
use marl_store::StoreError;

fn handle<V: marl_core::PropValue>(h: Option<Prop<V>>, who: &str) -> Result<Prop<V>, EvalError> {
    h.ok_or_else(|| EvalError::ProducerFailed {
        producer: who.to_string(),
        reason: "used before declare".to_string(),
    })
}

/// Supplies one constant-valued plain property.
///
/// With `compute` off, `reset_qp` writes `reset_value` instead.
pub struct FillProducer {
    name: String,
    property: String,
    regions: Vec<Region>,
    value: f64,
    reset_value: f64,
    compute: bool,
    prop: Option<Prop<f64>>,
}

impl FillProducer {
    pub fn new(name: &str, property: &str, regions: Vec<Region>, value: f64) -> Self {
        Self {
            name: name.to_string(),
            property: property.to_string(),
            regions,
            value,
            reset_value: 0.0,
            compute: true,
            prop: None,
        }
    }

    pub fn with_compute(mut self, compute: bool) -> Self {
        self.compute = compute;
        self
    }

    pub fn with_reset_value(mut self, reset_value: f64) -> Self {
        self.reset_value = reset_value;
        self
    }
}

impl Producer for FillProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn compute_enabled(&self) -> bool {
        self.compute
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.prop = Some(decl.declare::<f64>(&self.property)?);
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        ctx.set(handle(self.prop, &self.name)?, qp, self.value)
    }

    fn reset_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        ctx.set(handle(self.prop, &self.name)?, qp, self.reset_value)
    }
}

/// Requests one plain property and supplies `factor` times it.
pub struct ScaleProducer {
    name: String,
    input: String,
    output: String,
    regions: Vec<Region>,
    factor: f64,
    input_prop: Option<Prop<f64>>,
    output_prop: Option<Prop<f64>>,
}

impl ScaleProducer {
    pub fn new(name: &str, input: &str, output: &str, regions: Vec<Region>, factor: f64) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            output: output.to_string(),
            regions,
            factor,
            input_prop: None,
            output_prop: None,
        }
    }
}

impl Producer for ScaleProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.output_prop = Some(decl.declare_by_name::<f64>(&self.output)?);
        self.input_prop = Some(decl.request_by_name::<f64>(&self.input)?);
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        let input = ctx.value(handle(self.input_prop, &self.name)?, qp)?;
        ctx.set(handle(self.output_prop, &self.name)?, qp, self.factor * input)
    }
}

/// Stateful fixture: supplies `property` as `factor * old(property)`,
/// seeded with `initial`.
pub struct DecayProducer {
    name: String,
    property: String,
    regions: Vec<Region>,
    initial: f64,
    factor: f64,
    track_older: bool,
    prop: Option<Prop<f64>>,
    prop_old: Option<Prop<f64>>,
}

impl DecayProducer {
    pub fn new(name: &str, property: &str, regions: Vec<Region>, initial: f64, factor: f64) -> Self {
        Self {
            name: name.to_string(),
            property: property.to_string(),
            regions,
            initial,
            factor,
            track_older: false,
            prop: None,
            prop_old: None,
        }
    }

    /// Also request the OLDER generation, promoting the history depth.
    pub fn with_older_history(mut self) -> Self {
        self.track_older = true;
        self
    }
}

impl Producer for DecayProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.prop = Some(decl.declare::<f64>(&self.property)?);
        self.prop_old = Some(decl.request_old::<f64>(&self.property)?);
        if self.track_older {
            decl.request_older::<f64>(&self.property)?;
        }
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        let old = ctx.value_old(handle(self.prop_old, &self.name)?, qp)?;
        ctx.set(handle(self.prop, &self.name)?, qp, self.factor * old)
    }

    fn stateful_seed(&self) -> Option<&dyn StatefulSeed> {
        Some(self)
    }
}

impl StatefulSeed for DecayProducer {
    fn seed_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        ctx.set(handle(self.prop, &self.name)?, qp, self.initial)
    }
}

/// Declares a stateful property but exposes no seeding step; exists to
/// trip the sanity check.
pub struct UnseededStatefulProducer {
    name: String,
    property: String,
    regions: Vec<Region>,
    prop: Option<Prop<f64>>,
    prop_old: Option<Prop<f64>>,
}

impl UnseededStatefulProducer {
    pub fn new(name: &str, property: &str, regions: Vec<Region>) -> Self {
        Self {
            name: name.to_string(),
            property: property.to_string(),
            regions,
            prop: None,
            prop_old: None,
        }
    }
}

impl Producer for UnseededStatefulProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.prop = Some(decl.declare::<f64>(&self.property)?);
        self.prop_old = Some(decl.request_old::<f64>(&self.property)?);
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        let old = ctx.value_old(handle(self.prop_old, &self.name)?, qp)?;
        ctx.set(handle(self.prop, &self.name)?, qp, old)
    }
}

/// Supplies a derivative-carrying property seeded as an independent
/// variable.
pub struct AdFillProducer {
    name: String,
    property: String,
    regions: Vec<Region>,
    value: f64,
    prop: Option<Prop<Dual>>,
}

impl AdFillProducer {
    pub fn new(name: &str, property: &str, regions: Vec<Region>, value: f64) -> Self {
        Self {
            name: name.to_string(),
            property: property.to_string(),
            regions,
            value,
            prop: None,
        }
    }
}

impl Producer for AdFillProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.prop = Some(decl.declare_generic::<f64, true>(&self.property)?);
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        ctx.set(
            handle(self.prop, &self.name)?,
            qp,
            Dual::variable(self.value, 0),
        )
    }
}

/// Requests `input` with a zero fallback and mirrors it into `probe`.
pub struct ZeroConsumerProducer {
    name: String,
    input: String,
    probe: String,
    regions: Vec<Region>,
    input_prop: Option<Prop<f64>>,
    probe_prop: Option<Prop<f64>>,
}

impl ZeroConsumerProducer {
    pub fn new(name: &str, input: &str, probe: &str, regions: Vec<Region>) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            probe: probe.to_string(),
            regions,
            input_prop: None,
            probe_prop: None,
        }
    }
}

impl Producer for ZeroConsumerProducer {
    fn name(&self) -> &str {
        &self.name
    }

    fn regions(&self) -> Vec<Region> {
        self.regions.clone()
    }

    fn declare(&mut self, decl: &mut DeclareContext<'_>) -> Result<(), StoreError> {
        self.probe_prop = Some(decl.declare_by_name::<f64>(&self.probe)?);
        self.input_prop = Some(decl.zero_property::<f64>(&self.input)?);
        Ok(())
    }

    fn compute_qp(&self, qp: usize, ctx: &mut EvalContext<'_>) -> Result<(), EvalError> {
        let input = ctx.value(handle(self.input_prop, &self.name)?, qp)?;
        ctx.set(handle(self.probe_prop, &self.name)?, qp, input)
    }
}
