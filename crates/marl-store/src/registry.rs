//! Global property registry: name → dense ID assignment and per-ID
//! type and history records.
//!
//! The registry is mutated only during the single-threaded setup phase.
//! [`PropertyRegistry::seal`] freezes it; afterwards it is read-only
//! and safe to consult from every worker thread concurrently, and any
//! further declare/request is rejected as a [`StoreError::StageViolation`].

use std::any::TypeId;

use indexmap::IndexMap;

use marl_core::{HistoryDepth, PropForm, PropSet, PropValue, PropertyId, QualifiedName};

use crate::array::{ErasedArray, PropArray};
use crate::error::StoreError;

fn new_erased<V: PropValue>() -> Box<dyn ErasedArray> {
    Box::new(PropArray::<V>::new())
}

/// Execution stage of the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Construction phase: declarations and requests are legal.
    Setup,
    /// Evaluation phase: the registry is frozen.
    Locked,
}

/// Per-ID registry record.
#[derive(Debug)]
pub struct PropInfo {
    name: QualifiedName,
    type_id: TypeId,
    type_name: &'static str,
    history: HistoryDepth,
    supplied: bool,
    make_array: fn() -> Box<dyn ErasedArray>,
}

impl PropInfo {
    /// The qualified property name.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The representation form.
    pub fn form(&self) -> PropForm {
        self.name.form
    }

    /// Name of the stored value type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// How much history the property retains.
    pub fn history(&self) -> HistoryDepth {
        self.history
    }

    /// Whether any producer declared (supplies) this property.
    ///
    /// IDs that were only ever requested keep `false`; whether that is
    /// acceptable per region is the resolver's call.
    pub fn is_supplied(&self) -> bool {
        self.supplied
    }

    /// Allocate a fresh, empty array of the recorded value type.
    pub fn new_array(&self) -> Box<dyn ErasedArray> {
        (self.make_array)()
    }
}

/// Assigns dense, stable property IDs and records per-ID metadata.
///
/// IDs are handed out sequentially in first-touch order, one per
/// `(name, form)` pair, and are never reused. The same registration
/// sequence therefore always reproduces the same assignment.
#[derive(Debug)]
pub struct PropertyRegistry {
    ids: IndexMap<QualifiedName, PropertyId>,
    infos: Vec<PropInfo>,
    stage: Stage,
}

impl PropertyRegistry {
    /// Create an empty registry in the setup stage.
    pub fn new() -> Self {
        Self {
            ids: IndexMap::new(),
            infos: Vec::new(),
            stage: Stage::Setup,
        }
    }

    /// The current execution stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Freeze the registry; all later declare/request calls fail.
    pub fn seal(&mut self) {
        self.stage = Stage::Locked;
    }

    /// Whether the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.stage == Stage::Locked
    }

    /// Resolve `name` to its ID, assigning a fresh ID on first use.
    ///
    /// The value type `V` is recorded on first use and checked on every
    /// later call for the same name; a disagreement is a
    /// [`StoreError::TypeMismatch`] at the offending call site.
    /// `supplied` marks the name as declared by a producer (as opposed
    /// to merely requested).
    pub fn id_for<V: PropValue>(
        &mut self,
        name: QualifiedName,
        supplied: bool,
    ) -> Result<PropertyId, StoreError> {
        if self.stage == Stage::Locked {
            return Err(StoreError::StageViolation { name });
        }
        if let Some(&id) = self.ids.get(&name) {
            let info = &mut self.infos[id.0 as usize];
            if info.type_id != TypeId::of::<V>() {
                return Err(StoreError::TypeMismatch {
                    name,
                    expected: info.type_name,
                    found: std::any::type_name::<V>(),
                });
            }
            info.supplied |= supplied;
            return Ok(id);
        }
        let id = PropertyId(self.infos.len() as u32);
        self.infos.push(PropInfo {
            name: name.clone(),
            type_id: TypeId::of::<V>(),
            type_name: std::any::type_name::<V>(),
            history: HistoryDepth::Current,
            supplied,
            make_array: new_erased::<V>,
        });
        self.ids.insert(name, id);
        Ok(id)
    }

    /// Look up an already-assigned ID without assigning one.
    pub fn lookup(&self, name: &QualifiedName) -> Option<PropertyId> {
        self.ids.get(name).copied()
    }

    /// The registry record for an ID.
    pub fn info(&self, id: PropertyId) -> Result<&PropInfo, StoreError> {
        self.infos
            .get(id.0 as usize)
            .ok_or(StoreError::UnknownProperty { id })
    }

    /// Promote the history depth of an ID; never downgrades.
    ///
    /// Requesting OLD/OLDER for a property that was never declared
    /// stateful lands here: the state is promoted rather than the
    /// request being silently ignored, so behavior stays defined.
    pub fn promote_history(
        &mut self,
        id: PropertyId,
        depth: HistoryDepth,
    ) -> Result<(), StoreError> {
        if self.stage == Stage::Locked {
            let name = self.info(id)?.name.clone();
            return Err(StoreError::StageViolation { name });
        }
        let info = self
            .infos
            .get_mut(id.0 as usize)
            .ok_or(StoreError::UnknownProperty { id })?;
        info.history.promote(depth);
        Ok(())
    }

    /// Number of IDs assigned so far.
    pub fn n_properties(&self) -> usize {
        self.infos.len()
    }

    /// Iterate over `(id, info)` pairs in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &PropInfo)> {
        self.infos
            .iter()
            .enumerate()
            .map(|(i, info)| (PropertyId(i as u32), info))
    }

    /// The set of IDs retaining history beyond the current generation.
    pub fn stateful_ids(&self) -> PropSet {
        self.iter()
            .filter(|(_, info)| info.history.is_stateful())
            .map(|(id, _)| id)
            .collect()
    }
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
