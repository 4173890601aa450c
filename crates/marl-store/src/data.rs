//! Per-thread generational property storage.
//!
//! Each worker thread owns one [`PropertyData`]: a dense vector of
//! slots indexed by [`PropertyId`], each slot holding the CURRENT array
//! and, for stateful properties, lazily the OLD and OLDER generations.
//! No locking is involved; cross-thread state is confined to the sealed
//! registry and the shared zero storage.

use marl_core::{EvalError, Generation, PropSet, PropValue, PropertyId};

use crate::array::{ErasedArray, PropArray};
use crate::error::StoreError;
use crate::registry::PropertyRegistry;

/// One property's storage across generations.
struct Slot {
    current: Box<dyn ErasedArray>,
    old: Option<Box<dyn ErasedArray>>,
    older: Option<Box<dyn ErasedArray>>,
}

impl Slot {
    fn generation(&self, generation: Generation) -> Option<&dyn ErasedArray> {
        match generation {
            Generation::Current => Some(self.current.as_ref()),
            Generation::Old => self.old.as_deref(),
            Generation::Older => self.older.as_deref(),
        }
    }
}

/// A worker thread's property store.
///
/// Built from a sealed [`PropertyRegistry`]; slots exist for every
/// assigned ID, with history generations allocated only where the
/// registry recorded a stateful depth. Arrays start at zero points and
/// are sized by [`resize`](PropertyData::resize) as elements are
/// visited.
pub struct PropertyData {
    slots: Vec<Slot>,
    n_points: usize,
}

impl PropertyData {
    /// Create a store with one slot per registered property.
    pub fn for_registry(registry: &PropertyRegistry) -> Self {
        let slots = registry
            .iter()
            .map(|(_, info)| Slot {
                current: info.new_array(),
                old: info
                    .history()
                    .retains(Generation::Old)
                    .then(|| info.new_array()),
                older: info
                    .history()
                    .retains(Generation::Older)
                    .then(|| info.new_array()),
            })
            .collect();
        Self { slots, n_points: 0 }
    }

    /// The point count the store is currently sized for.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Number of property slots.
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    /// Size every generation of every slot to `n` quadrature points.
    ///
    /// Growth zero-fills new points and preserves existing entries;
    /// shrinking truncates. Called once per element as the active
    /// element's point count changes.
    pub fn resize(&mut self, n: usize) {
        if n == self.n_points && self.slots.iter().all(|s| s.current.len() == n) {
            return;
        }
        for slot in &mut self.slots {
            slot.current.resize(n);
            if let Some(old) = slot.old.as_mut() {
                old.resize(n);
            }
            if let Some(older) = slot.older.as_mut() {
                older.resize(n);
            }
        }
        self.n_points = n;
    }

    /// Read a generation of a property as a typed array.
    pub fn get<V: PropValue>(
        &self,
        id: PropertyId,
        generation: Generation,
    ) -> Result<&PropArray<V>, EvalError> {
        let slot = self
            .slots
            .get(id.0 as usize)
            .ok_or(EvalError::PropertyUnavailable { id })?;
        let array = slot
            .generation(generation)
            .ok_or(EvalError::GenerationUnavailable { id, generation })?;
        array
            .as_any()
            .downcast_ref::<PropArray<V>>()
            .ok_or_else(|| EvalError::TypeMismatch {
                id,
                expected: array.value_type_name(),
                found: std::any::type_name::<V>(),
            })
    }

    /// Mutable access to the CURRENT generation of a property.
    ///
    /// Only CURRENT is writable: OLD and OLDER are produced exclusively
    /// by rotation.
    pub fn get_mut<V: PropValue>(&mut self, id: PropertyId) -> Result<&mut PropArray<V>, EvalError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(EvalError::PropertyUnavailable { id })?;
        let expected = slot.current.value_type_name();
        slot.current
            .as_any_mut()
            .downcast_mut::<PropArray<V>>()
            .ok_or(EvalError::TypeMismatch {
                id,
                expected,
                found: std::any::type_name::<V>(),
            })
    }

    /// Shift generations for every stateful property: OLDER ← OLD,
    /// then OLD ← CURRENT.
    ///
    /// A pure bulk copy addressed by dense ID; values are not otherwise
    /// mutated. Called once per outer time step by the time-stepping
    /// collaborator, before CURRENT is recomputed for the new step.
    pub fn rotate(&mut self, stateful: &PropSet) -> Result<(), StoreError> {
        for id in stateful.iter() {
            let slot = self
                .slots
                .get_mut(id.0 as usize)
                .ok_or(StoreError::UnknownProperty { id })?;
            let Slot {
                current,
                old,
                older,
            } = slot;
            if let (Some(old), Some(older)) = (old.as_deref(), older.as_deref_mut()) {
                if !older.copy_from(old) {
                    return Err(StoreError::HistoryCopyFailed { id });
                }
            }
            if let Some(old) = old.as_deref_mut() {
                if !old.copy_from(current.as_ref()) {
                    return Err(StoreError::HistoryCopyFailed { id });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_core::{Dual, HistoryDepth, QualifiedName};

    fn registry_with_history() -> (PropertyRegistry, PropertyId, PropertyId) {
        let mut reg = PropertyRegistry::new();
        let plain = reg.id_for::<f64>(QualifiedName::plain("k"), true).unwrap();
        let stateful = reg.id_for::<f64>(QualifiedName::plain("u"), true).unwrap();
        reg.promote_history(stateful, HistoryDepth::Older).unwrap();
        reg.seal();
        (reg, plain, stateful)
    }

    #[test]
    fn history_generations_allocated_only_when_recorded() {
        let (reg, plain, stateful) = registry_with_history();
        let mut data = PropertyData::for_registry(&reg);
        data.resize(4);
        assert!(data.get::<f64>(plain, Generation::Current).is_ok());
        assert!(matches!(
            data.get::<f64>(plain, Generation::Old),
            Err(EvalError::GenerationUnavailable { .. })
        ));
        assert!(data.get::<f64>(stateful, Generation::Older).is_ok());
    }

    #[test]
    fn resize_upward_preserves_existing_values() {
        let (reg, _, stateful) = registry_with_history();
        let mut data = PropertyData::for_registry(&reg);
        data.resize(4);
        for qp in 0..4 {
            data.get_mut::<f64>(stateful).unwrap()[qp] = qp as f64 + 1.0;
        }
        data.rotate(&reg.stateful_ids()).unwrap();
        data.resize(8);
        let current = data.get::<f64>(stateful, Generation::Current).unwrap();
        assert_eq!(current.as_slice()[..4], [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(current.as_slice()[4..], [0.0; 4]);
        let old = data.get::<f64>(stateful, Generation::Old).unwrap();
        assert_eq!(old.len(), 8);
        assert_eq!(old.as_slice()[..4], [1.0, 2.0, 3.0, 4.0]);
        let older = data.get::<f64>(stateful, Generation::Older).unwrap();
        assert_eq!(older.len(), 8);
    }

    #[test]
    fn rotation_is_a_pure_two_level_shift() {
        let (reg, _, stateful) = registry_with_history();
        let ids = reg.stateful_ids();
        let mut data = PropertyData::for_registry(&reg);
        data.resize(2);
        // Step 1 writes 1.0, step 2 writes 2.0, step 3 writes 3.0.
        for step in 1..=3 {
            data.rotate(&ids).unwrap();
            let current = data.get_mut::<f64>(stateful).unwrap();
            for qp in 0..2 {
                current[qp] = step as f64;
            }
        }
        // After the third step's rotation-then-write: OLDER holds the
        // value CURRENT had exactly two steps prior.
        let older = data.get::<f64>(stateful, Generation::Older).unwrap();
        assert_eq!(older.as_slice(), &[1.0, 1.0]);
        let old = data.get::<f64>(stateful, Generation::Old).unwrap();
        assert_eq!(old.as_slice(), &[2.0, 2.0]);
    }

    #[test]
    fn typed_access_checks_the_value_type() {
        let (reg, plain, _) = registry_with_history();
        let mut data = PropertyData::for_registry(&reg);
        data.resize(1);
        let err = data.get::<Dual>(plain, Generation::Current).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
        let err = data.get_mut::<[f64; 3]>(plain).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let (reg, ..) = registry_with_history();
        let data = PropertyData::for_registry(&reg);
        let missing = PropertyId(99);
        assert!(matches!(
            data.get::<f64>(missing, Generation::Current),
            Err(EvalError::PropertyUnavailable { .. })
        ));
    }
}
