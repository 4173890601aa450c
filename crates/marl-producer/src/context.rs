//! Evaluation context passed to producers during the assembly loop.

use marl_core::{EvalError, Generation, PropValue};
use marl_store::{PropArray, PropertyData};

use crate::declare::Prop;

/// Typed access to the active thread's property store during
/// evaluation.
///
/// Reads address any retained generation; writes address CURRENT only.
/// Handles were obtained at declare time, so lookups are by dense ID
/// with a single checked downcast; no name lookups happen in the hot
/// loop.
///
/// Because a read borrow and a write borrow cannot overlap, the usual
/// pattern is to copy dependency values out first, then write:
///
/// ```ignore
/// let k = ctx.value(self.conductivity, qp)?;
/// ctx.array_mut(self.flux)?[qp] = -k * gradient;
/// ```
pub struct EvalContext<'a> {
    data: &'a mut PropertyData,
}

impl<'a> EvalContext<'a> {
    /// Wrap a thread's property store for one element's evaluation.
    pub fn new(data: &'a mut PropertyData) -> Self {
        Self { data }
    }

    /// The point count the store is sized for.
    pub fn n_points(&self) -> usize {
        self.data.n_points()
    }

    /// The CURRENT-generation array of a property.
    pub fn array<V: PropValue>(&self, prop: Prop<V>) -> Result<&PropArray<V>, EvalError> {
        self.data.get::<V>(prop.id(), Generation::Current)
    }

    /// A chosen generation's array of a property.
    pub fn array_at<V: PropValue>(
        &self,
        prop: Prop<V>,
        generation: Generation,
    ) -> Result<&PropArray<V>, EvalError> {
        self.data.get::<V>(prop.id(), generation)
    }

    /// Mutable CURRENT-generation array of a property.
    pub fn array_mut<V: PropValue>(&mut self, prop: Prop<V>) -> Result<&mut PropArray<V>, EvalError> {
        self.data.get_mut::<V>(prop.id())
    }

    /// The CURRENT value of a property at point `qp`, by clone.
    pub fn value<V: PropValue>(&self, prop: Prop<V>, qp: usize) -> Result<V, EvalError> {
        self.value_at(prop, Generation::Current, qp)
    }

    /// The OLD value of a property at point `qp`, by clone.
    pub fn value_old<V: PropValue>(&self, prop: Prop<V>, qp: usize) -> Result<V, EvalError> {
        self.value_at(prop, Generation::Old, qp)
    }

    /// The OLDER value of a property at point `qp`, by clone.
    pub fn value_older<V: PropValue>(&self, prop: Prop<V>, qp: usize) -> Result<V, EvalError> {
        self.value_at(prop, Generation::Older, qp)
    }

    /// A chosen generation's value at point `qp`, by clone.
    pub fn value_at<V: PropValue>(
        &self,
        prop: Prop<V>,
        generation: Generation,
        qp: usize,
    ) -> Result<V, EvalError> {
        let array = self.data.get::<V>(prop.id(), generation)?;
        array.get(qp).cloned().ok_or(EvalError::PointOutOfRange {
            id: prop.id(),
            point: qp,
            n_points: array.len(),
        })
    }

    /// Write the CURRENT value of a property at point `qp`.
    pub fn set<V: PropValue>(&mut self, prop: Prop<V>, qp: usize, value: V) -> Result<(), EvalError> {
        let id = prop.id();
        let array = self.data.get_mut::<V>(id)?;
        let n_points = array.len();
        match array.get_mut(qp) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(EvalError::PointOutOfRange {
                id,
                point: qp,
                n_points,
            }),
        }
    }
}
