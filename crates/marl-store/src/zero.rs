//! Shared zero-valued property storage and per-region fallback
//! registration.
//!
//! Two cooperating pieces back the zero-fallback mechanism:
//!
//! - [`ZeroRegistry`] hands out process-shareable, always-zero arrays
//!   keyed by value type. Arrays grow monotonically to the largest
//!   point count ever observed across cooperating sub-simulations,
//!   never shrink, and are never reset; sharing is safe because the
//!   contents are zero by construction and read-only to all consumers.
//! - [`FallbackMap`] records, per geometric region, the property names
//!   registered as having a relaxed (zero) supplier, so the resolver
//!   does not demand a real producer there.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use indexmap::{IndexMap, IndexSet};

use marl_core::{PropValue, QualifiedName, Region};

use crate::array::PropArray;

struct ZeroInner {
    arrays: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    max_points: usize,
}

/// Lazily-populated registry of shared zero arrays, keyed by value
/// type.
///
/// Growth replaces the stored array with a larger zero array behind the
/// write lock; consumers holding an earlier `Arc` keep a smaller but
/// equally zero view. All growth is serialized by the lock, which is
/// the conservative design the evaluation phase relies on: after setup
/// first-touch, reads only clone an `Arc`.
pub struct ZeroRegistry {
    inner: RwLock<ZeroInner>,
}

impl ZeroRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ZeroInner {
                arrays: HashMap::new(),
                max_points: 0,
            }),
        }
    }

    /// Raise the global maximum point count; never lowers it.
    pub fn grow_to(&self, n_points: usize) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if n_points > inner.max_points {
            inner.max_points = n_points;
        }
    }

    /// The largest point count ever registered.
    pub fn max_points(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.max_points
    }

    /// A shared zero array for `V`, sized to at least `n_points` and to
    /// the global maximum point count.
    pub fn shared_zero<V: PropValue>(&self, n_points: usize) -> Arc<PropArray<V>> {
        let key = TypeId::of::<V>();
        {
            let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
            if n_points <= inner.max_points {
                if let Some(existing) = inner
                    .arrays
                    .get(&key)
                    .and_then(|a| Arc::clone(a).downcast::<PropArray<V>>().ok())
                {
                    if existing.len() >= n_points && existing.len() >= inner.max_points {
                        return existing;
                    }
                }
            }
        }
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if n_points > inner.max_points {
            inner.max_points = n_points;
        }
        let len = inner.max_points;
        if let Some(existing) = inner
            .arrays
            .get(&key)
            .and_then(|a| Arc::clone(a).downcast::<PropArray<V>>().ok())
        {
            if existing.len() >= len {
                return existing;
            }
        }
        let fresh: Arc<PropArray<V>> = Arc::new(PropArray::with_len(len));
        inner.arrays.insert(key, fresh.clone());
        fresh
    }
}

impl Default for ZeroRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-region registration of names with a relaxed zero supplier.
///
/// A name registered here for a region satisfies requests in that
/// region without a real producer; the same name may still have a real
/// supplier in a different region (an explicit per-region override).
#[derive(Debug, Default)]
pub struct FallbackMap {
    per_region: IndexMap<Region, IndexSet<QualifiedName>>,
}

impl FallbackMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            per_region: IndexMap::new(),
        }
    }

    /// Register `name` as zero-backed in `region`.
    pub fn register(&mut self, region: Region, name: QualifiedName) {
        self.per_region.entry(region).or_default().insert(name);
    }

    /// Whether `name` has a zero fallback registered in `region`.
    pub fn contains(&self, region: Region, name: &QualifiedName) -> bool {
        self.per_region
            .get(&region)
            .is_some_and(|names| names.contains(name))
    }

    /// The names registered for a region, in registration order.
    pub fn names(&self, region: Region) -> impl Iterator<Item = &QualifiedName> {
        self.per_region
            .get(&region)
            .into_iter()
            .flat_map(|names| names.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_core::{BoundaryId, Dual, SubdomainId};

    #[test]
    fn shared_zero_is_zero_and_sized() {
        let zeros = ZeroRegistry::new();
        let arr = zeros.shared_zero::<f64>(6);
        assert_eq!(arr.len(), 6);
        assert!(arr.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn growth_is_monotone_and_never_shrinks() {
        let zeros = ZeroRegistry::new();
        zeros.grow_to(8);
        let small = zeros.shared_zero::<f64>(2);
        assert_eq!(small.len(), 8, "sized to the global maximum");
        zeros.grow_to(4);
        assert_eq!(zeros.max_points(), 8);
        let again = zeros.shared_zero::<f64>(2);
        assert_eq!(again.len(), 8);
    }

    #[test]
    fn distinct_value_types_get_distinct_arrays() {
        let zeros = ZeroRegistry::new();
        let scalar = zeros.shared_zero::<f64>(3);
        let dual = zeros.shared_zero::<Dual>(3);
        assert_eq!(scalar.len(), 3);
        assert_eq!(dual.len(), 3);
        assert_eq!(dual[0].n_derivatives(), 0);
    }

    #[test]
    fn repeated_requests_share_storage() {
        let zeros = ZeroRegistry::new();
        let a = zeros.shared_zero::<f64>(4);
        let b = zeros.shared_zero::<f64>(4);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn fallbacks_are_per_region() {
        let mut map = FallbackMap::new();
        let block = Region::Subdomain(SubdomainId(0));
        let wall = Region::Boundary(BoundaryId(1));
        map.register(block, QualifiedName::plain("porosity"));
        assert!(map.contains(block, &QualifiedName::plain("porosity")));
        assert!(!map.contains(wall, &QualifiedName::plain("porosity")));
        assert!(!map.contains(block, &QualifiedName::ad("porosity")));
        assert_eq!(map.names(block).count(), 1);
        assert_eq!(map.names(wall).count(), 0);
    }
}
