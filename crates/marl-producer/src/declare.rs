//! Phase-1 declaration front-end: typed handles, intent descriptors,
//! and the declaration context.

use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexSet;

use marl_core::{
    AdCarrier, FormOf, Generation, HistoryDepth, PropForm, PropSet, PropValue, PropertyId,
    QualifiedName, Region,
};
use marl_store::{FallbackMap, PropArray, PropertyRegistry, StoreError, ZeroRegistry};

/// Typed handle to a declared or requested property.
///
/// Obtained from a [`DeclareContext`] during construction and stored by
/// the producer; evaluation-time access goes through the handle's dense
/// ID without repeating any name lookup.
pub struct Prop<V: PropValue> {
    id: PropertyId,
    _marker: PhantomData<fn() -> V>,
}

impl<V: PropValue> Prop<V> {
    pub(crate) fn new(id: PropertyId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The dense property ID behind this handle.
    pub fn id(&self) -> PropertyId {
        self.id
    }
}

impl<V: PropValue> Clone for Prop<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V: PropValue> Copy for Prop<V> {}

impl<V: PropValue> std::fmt::Debug for Prop<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Prop").field(&self.id).finish()
    }
}

/// Recorded intents of one producer: what it supplies, what it
/// requests, and where it is restricted to.
///
/// Filled during phase-1 declaration and consumed wholesale by the
/// resolver; nothing here changes after setup.
#[derive(Clone, Debug)]
pub struct ProducerDescriptor {
    name: String,
    regions: Vec<Region>,
    boundary: bool,
    supplied: IndexSet<QualifiedName>,
    supplied_ids: PropSet,
    requested: IndexSet<QualifiedName>,
}

impl ProducerDescriptor {
    /// Start an empty descriptor for a producer.
    pub fn new(name: impl Into<String>, regions: Vec<Region>, boundary: bool) -> Self {
        Self {
            name: name.into(),
            regions,
            boundary,
            supplied: IndexSet::new(),
            supplied_ids: PropSet::empty(),
            requested: IndexSet::new(),
        }
    }

    /// The producer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regions the producer is restricted to.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Whether the producer computes boundary data.
    pub fn is_boundary(&self) -> bool {
        self.boundary
    }

    /// Whether the producer is active in `region`.
    pub fn active_in(&self, region: Region) -> bool {
        self.regions.contains(&region)
    }

    /// Names declared by the producer, in declaration order.
    pub fn supplied(&self) -> impl Iterator<Item = &QualifiedName> {
        self.supplied.iter()
    }

    /// Dense IDs of the declared names, for bulk operations.
    pub fn supplied_ids(&self) -> &PropSet {
        &self.supplied_ids
    }

    /// Names requested by the producer, in request order.
    pub fn requested(&self) -> impl Iterator<Item = &QualifiedName> {
        self.requested.iter()
    }

    /// Whether the producer declares `name`.
    pub fn supplies(&self, name: &QualifiedName) -> bool {
        self.supplied.contains(name)
    }

    pub(crate) fn record_supplied(&mut self, name: QualifiedName, id: PropertyId) {
        self.supplied.insert(name);
        self.supplied_ids.insert(id);
    }

    pub(crate) fn record_requested(&mut self, name: QualifiedName) {
        self.requested.insert(name);
    }
}

/// Declaration context handed to [`Producer::declare`].
///
/// Every declare/request entry point resolves the name, assigns (or
/// re-finds) the dense ID in the registry with a type check, records
/// the intent into the producer's descriptor, and returns a typed
/// handle. All calls are rejected once the registry is sealed, so
/// evaluation-time code cannot accidentally re-declare storage.
///
/// [`Producer::declare`]: crate::Producer::declare
pub struct DeclareContext<'a> {
    registry: &'a mut PropertyRegistry,
    zeros: &'a ZeroRegistry,
    fallbacks: &'a mut FallbackMap,
    params: &'a crate::ProducerParams,
    descriptor: &'a mut ProducerDescriptor,
}

impl<'a> DeclareContext<'a> {
    /// Assemble a context for one producer's declaration pass.
    pub fn new(
        registry: &'a mut PropertyRegistry,
        zeros: &'a ZeroRegistry,
        fallbacks: &'a mut FallbackMap,
        params: &'a crate::ProducerParams,
        descriptor: &'a mut ProducerDescriptor,
    ) -> Self {
        Self {
            registry,
            zeros,
            fallbacks,
            params,
            descriptor,
        }
    }

    /// Declared names carry the producer suffix; requested names do not.
    fn suffixed(&self, name: &str) -> String {
        match self.params.suffix() {
            Some(suffix) => format!("{name}_{suffix}"),
            None => name.to_string(),
        }
    }

    // ── Declaration (supply) ───────────────────────────────────

    /// Declare a plain property, resolving `param` through the
    /// producer's input parameters first.
    pub fn declare<V: PropValue>(&mut self, param: &str) -> Result<Prop<V>, StoreError> {
        let name = self.params.resolve(param).to_string();
        self.declare_by_name(&name)
    }

    /// Declare a plain property under `name` directly.
    pub fn declare_by_name<V: PropValue>(&mut self, name: &str) -> Result<Prop<V>, StoreError> {
        let qualified = QualifiedName::new(self.suffixed(name), PropForm::Plain);
        self.declare_qualified::<V>(qualified)
    }

    /// Declare a derivative-carrying property, with parameter
    /// indirection.
    pub fn declare_ad<T: AdCarrier>(&mut self, param: &str) -> Result<Prop<T::Ad>, StoreError> {
        let name = self.params.resolve(param).to_string();
        self.declare_ad_by_name::<T>(&name)
    }

    /// Declare a derivative-carrying property under `name` directly.
    pub fn declare_ad_by_name<T: AdCarrier>(&mut self, name: &str) -> Result<Prop<T::Ad>, StoreError> {
        let qualified = QualifiedName::new(self.suffixed(name), PropForm::Ad);
        self.declare_qualified::<T::Ad>(qualified)
    }

    /// Declare in plain or AD form selected by the const `AD` flag,
    /// with parameter indirection. One call site covers both forms:
    ///
    /// ```ignore
    /// let k = decl.declare_generic::<f64, IS_AD>("diffusivity")?;
    /// ```
    pub fn declare_generic<T, const AD: bool>(
        &mut self,
        param: &str,
    ) -> Result<Prop<T::Stored>, StoreError>
    where
        T: FormOf<AD>,
    {
        let name = self.params.resolve(param).to_string();
        self.declare_generic_by_name::<T, AD>(&name)
    }

    /// Generic declaration under `name` directly.
    pub fn declare_generic_by_name<T, const AD: bool>(
        &mut self,
        name: &str,
    ) -> Result<Prop<T::Stored>, StoreError>
    where
        T: FormOf<AD>,
    {
        let qualified = QualifiedName::new(self.suffixed(name), T::FORM);
        self.declare_qualified::<T::Stored>(qualified)
    }

    fn declare_qualified<V: PropValue>(
        &mut self,
        name: QualifiedName,
    ) -> Result<Prop<V>, StoreError> {
        let id = self.registry.id_for::<V>(name.clone(), true)?;
        self.descriptor.record_supplied(name, id);
        Ok(Prop::new(id))
    }

    // ── Requests (consume) ─────────────────────────────────────

    /// Request a plain property, with parameter indirection.
    pub fn request<V: PropValue>(&mut self, param: &str) -> Result<Prop<V>, StoreError> {
        let name = self.params.resolve(param).to_string();
        self.request_by_name(&name)
    }

    /// Request a plain property by name.
    pub fn request_by_name<V: PropValue>(&mut self, name: &str) -> Result<Prop<V>, StoreError> {
        self.request_qualified::<V>(QualifiedName::plain(name), Generation::Current)
    }

    /// Request the OLD generation of a plain property, promoting its
    /// history depth.
    pub fn request_old<V: PropValue>(&mut self, param: &str) -> Result<Prop<V>, StoreError> {
        let name = self.params.resolve(param).to_string();
        self.request_qualified::<V>(QualifiedName::plain(name), Generation::Old)
    }

    /// Request the OLDER generation of a plain property, promoting its
    /// history depth.
    pub fn request_older<V: PropValue>(&mut self, param: &str) -> Result<Prop<V>, StoreError> {
        let name = self.params.resolve(param).to_string();
        self.request_qualified::<V>(QualifiedName::plain(name), Generation::Older)
    }

    /// Request a derivative-carrying property by name.
    pub fn request_ad_by_name<T: AdCarrier>(&mut self, name: &str) -> Result<Prop<T::Ad>, StoreError> {
        self.request_qualified::<T::Ad>(QualifiedName::ad(name), Generation::Current)
    }

    /// Request in plain or AD form selected by the const `AD` flag,
    /// with parameter indirection.
    pub fn request_generic<T, const AD: bool>(
        &mut self,
        param: &str,
    ) -> Result<Prop<T::Stored>, StoreError>
    where
        T: FormOf<AD>,
    {
        let name = self.params.resolve(param).to_string();
        self.request_qualified::<T::Stored>(QualifiedName::new(name, T::FORM), Generation::Current)
    }

    fn request_qualified<V: PropValue>(
        &mut self,
        name: QualifiedName,
        generation: Generation,
    ) -> Result<Prop<V>, StoreError> {
        let id = self.registry.id_for::<V>(name.clone(), false)?;
        self.registry
            .promote_history(id, HistoryDepth::for_generation(generation))?;
        self.descriptor.record_requested(name);
        Ok(Prop::new(id))
    }

    // ── Zero fallbacks ─────────────────────────────────────────

    /// Request a plain property that does not need a real supplier:
    /// wherever none exists in this producer's regions, it reads as
    /// zero at every point.
    ///
    /// Registers the name as zero-backed in each of the producer's
    /// regions, which relaxes the resolver's missing-supplier check
    /// there.
    pub fn zero_property<V: PropValue>(&mut self, param: &str) -> Result<Prop<V>, StoreError> {
        self.zero_generic::<V, false>(param)
    }

    /// Zero-fallback request in plain or AD form, with parameter
    /// indirection.
    pub fn zero_generic<T, const AD: bool>(
        &mut self,
        param: &str,
    ) -> Result<Prop<T::Stored>, StoreError>
    where
        T: FormOf<AD>,
    {
        let name = self.params.resolve(param).to_string();
        self.zero_generic_by_name::<T, AD>(&name)
    }

    /// Zero-fallback request by name.
    pub fn zero_generic_by_name<T, const AD: bool>(
        &mut self,
        name: &str,
    ) -> Result<Prop<T::Stored>, StoreError>
    where
        T: FormOf<AD>,
    {
        let qualified = QualifiedName::new(name, T::FORM);
        let id = self.registry.id_for::<T::Stored>(qualified.clone(), false)?;
        self.descriptor.record_requested(qualified.clone());
        for &region in self.descriptor.regions() {
            self.fallbacks.register(region, qualified.clone());
        }
        Ok(Prop::new(id))
    }

    /// The anonymous shared zero array for `V`: always zero, sized to
    /// the maximum point count across cooperating sub-simulations,
    /// growing monotonically and never reset. Safe to share because it
    /// is read-only to all consumers.
    pub fn shared_zero<V: PropValue>(&self) -> Arc<PropArray<V>> {
        self.zeros.shared_zero::<V>(self.zeros.max_points())
    }
}
