//! Per-region dependency resolution and evaluation ordering.
//!
//! [`resolve_order`] runs once per region at setup, after every
//! producer's descriptor has been recorded. It builds the directed
//! requester→supplier graph from the descriptors' name sets and
//! computes a topological evaluation order; the order is then reused
//! read-only by every per-element assembly loop for that region.

use indexmap::IndexMap;

use marl_core::{QualifiedName, Region};
use marl_store::FallbackMap;

use crate::declare::ProducerDescriptor;

use std::error::Error;
use std::fmt;

/// Errors from dependency resolution (setup-time, never per-element).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// Two producers declare the same name in the same region.
    DuplicateSupplier {
        /// The contested property.
        name: QualifiedName,
        /// The region both declarations apply to.
        region: Region,
        /// Name of the first declaring producer (earlier registration).
        first: String,
        /// Name of the second declaring producer.
        second: String,
    },
    /// A requested name has no supplier in the region and no zero
    /// fallback registered there.
    MissingSupplier {
        /// The unsatisfied property.
        name: QualifiedName,
        /// The region the request applies to.
        region: Region,
        /// Name of the requesting producer.
        requester: String,
    },
    /// Producers in one region request each other's properties in a
    /// cycle; no evaluation order exists.
    CyclicDependency {
        /// The region containing the cycle.
        region: Region,
        /// Names of the producers still mutually blocked.
        producers: Vec<String>,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSupplier {
                name,
                region,
                first,
                second,
            } => {
                write!(
                    f,
                    "property '{name}' on {region} is supplied by both '{first}' and '{second}'"
                )
            }
            Self::MissingSupplier {
                name,
                region,
                requester,
            } => {
                write!(
                    f,
                    "property '{name}' requested by '{requester}' on {region} has no supplier \
                     and no zero fallback"
                )
            }
            Self::CyclicDependency { region, producers } => {
                write!(f, "circular property dependency on {region} among: ")?;
                for (i, p) in producers.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{p}'")?;
                }
                Ok(())
            }
        }
    }
}

impl Error for ResolveError {}

/// Compute the evaluation order of producers active in `region`.
///
/// Edges point from a requester to the producer supplying the requested
/// name within the same region; a producer requesting a name it also
/// supplies imposes no constraint on itself. The order is a Kahn-style
/// topological sort: the earliest-registered producer with no
/// unresolved dependency is emitted next, so producers unconstrained by
/// each other keep their registration order and the result is
/// deterministic for a given registration sequence.
///
/// Returns indices into `descriptors`.
pub fn resolve_order(
    descriptors: &[ProducerDescriptor],
    region: Region,
    fallbacks: &FallbackMap,
) -> Result<Vec<usize>, ResolveError> {
    let active: Vec<usize> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, d)| d.active_in(region))
        .map(|(i, _)| i)
        .collect();

    // One supplier per name per region.
    let mut suppliers: IndexMap<&QualifiedName, usize> = IndexMap::new();
    for &i in &active {
        for name in descriptors[i].supplied() {
            if let Some(&j) = suppliers.get(name) {
                return Err(ResolveError::DuplicateSupplier {
                    name: name.clone(),
                    region,
                    first: descriptors[j].name().to_string(),
                    second: descriptors[i].name().to_string(),
                });
            }
            suppliers.insert(name, i);
        }
    }

    // Requester→supplier edges, tracked as in-degrees plus the reverse
    // adjacency needed to release requesters as suppliers are emitted.
    let slot_of: IndexMap<usize, usize> = active
        .iter()
        .enumerate()
        .map(|(slot, &i)| (i, slot))
        .collect();
    let mut in_degree = vec![0usize; active.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); active.len()];
    for (slot, &i) in active.iter().enumerate() {
        for name in descriptors[i].requested() {
            match suppliers.get(name) {
                Some(&j) if j != i => {
                    dependents[slot_of[&j]].push(slot);
                    in_degree[slot] += 1;
                }
                Some(_) => {}
                None => {
                    if !fallbacks.contains(region, name) {
                        return Err(ResolveError::MissingSupplier {
                            name: name.clone(),
                            region,
                            requester: descriptors[i].name().to_string(),
                        });
                    }
                }
            }
        }
    }

    let mut emitted = vec![false; active.len()];
    let mut order = Vec::with_capacity(active.len());
    while order.len() < active.len() {
        let next = (0..active.len()).find(|&slot| !emitted[slot] && in_degree[slot] == 0);
        match next {
            Some(slot) => {
                emitted[slot] = true;
                order.push(active[slot]);
                for &dep in &dependents[slot] {
                    in_degree[dep] -= 1;
                }
            }
            None => {
                let producers = active
                    .iter()
                    .enumerate()
                    .filter(|(slot, _)| !emitted[*slot])
                    .map(|(_, &i)| descriptors[i].name().to_string())
                    .collect();
                return Err(ResolveError::CyclicDependency { region, producers });
            }
        }
    }
    Ok(order)
}

/// Resolve every region any descriptor is restricted to.
///
/// Regions are visited in first-appearance order across the
/// registration sequence; each region is resolved independently.
pub fn resolve_all(
    descriptors: &[ProducerDescriptor],
    fallbacks: &FallbackMap,
) -> Result<IndexMap<Region, Vec<usize>>, ResolveError> {
    let mut orders = IndexMap::new();
    for descriptor in descriptors {
        for &region in descriptor.regions() {
            if !orders.contains_key(&region) {
                let order = resolve_order(descriptors, region, fallbacks)?;
                orders.insert(region, order);
            }
        }
    }
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use marl_core::{BoundaryId, SubdomainId};

    fn block(id: u32) -> Region {
        Region::Subdomain(SubdomainId(id))
    }

    fn descriptor(
        name: &str,
        regions: Vec<Region>,
        supplies: &[&str],
        requests: &[&str],
    ) -> ProducerDescriptor {
        let mut d = ProducerDescriptor::new(name, regions, false);
        for (i, s) in supplies.iter().enumerate() {
            d.record_supplied(
                QualifiedName::plain(*s),
                marl_core::PropertyId(i as u32),
            );
        }
        for r in requests {
            d.record_requested(QualifiedName::plain(*r));
        }
        d
    }

    #[test]
    fn suppliers_precede_requesters() {
        // Registered consumer-first; the order must still put the
        // supplier chain ahead of its consumers.
        let descriptors = vec![
            descriptor("flux", vec![block(0)], &["flux"], &["conductivity"]),
            descriptor("conductivity", vec![block(0)], &["conductivity"], &["density"]),
            descriptor("density", vec![block(0)], &["density"], &[]),
        ];
        let order =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap();
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn unconstrained_producers_keep_registration_order() {
        let descriptors = vec![
            descriptor("a", vec![block(0)], &["pa"], &[]),
            descriptor("b", vec![block(0)], &["pb"], &[]),
            descriptor("c", vec![block(0)], &["pc"], &[]),
        ];
        let order =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn tie_break_is_deterministic_across_runs() {
        let build = || {
            vec![
                descriptor("late_supplier", vec![block(0)], &["shared"], &[]),
                descriptor("reader_one", vec![block(0)], &["r1"], &["shared"]),
                descriptor("reader_two", vec![block(0)], &["r2"], &["shared"]),
            ]
        };
        let a = resolve_order(&build(), block(0), &FallbackMap::new()).unwrap();
        let b = resolve_order(&build(), block(0), &FallbackMap::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, vec![0, 1, 2]);
    }

    #[test]
    fn two_producer_cycle_names_both() {
        let descriptors = vec![
            descriptor("alpha", vec![block(0)], &["a"], &["b"]),
            descriptor("beta", vec![block(0)], &["b"], &["a"]),
        ];
        let err =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap_err();
        match err {
            ResolveError::CyclicDependency { producers, .. } => {
                assert_eq!(producers, vec!["alpha".to_string(), "beta".to_string()]);
            }
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn self_request_is_not_a_cycle() {
        let descriptors = vec![descriptor(
            "recycler",
            vec![block(0)],
            &["u"],
            &["u"],
        )];
        let order =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn duplicate_supplier_in_one_region_rejected() {
        let descriptors = vec![
            descriptor("first", vec![block(0)], &["k"], &[]),
            descriptor("second", vec![block(0)], &["k"], &[]),
        ];
        let err =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap_err();
        match err {
            ResolveError::DuplicateSupplier { first, second, .. } => {
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            other => panic!("expected DuplicateSupplier, got {other:?}"),
        }
    }

    #[test]
    fn same_name_in_different_regions_is_fine() {
        let descriptors = vec![
            descriptor("left", vec![block(0)], &["k"], &[]),
            descriptor("right", vec![block(1)], &["k"], &[]),
        ];
        let orders = resolve_all(&descriptors, &FallbackMap::new()).unwrap();
        assert_eq!(orders[&block(0)], vec![0]);
        assert_eq!(orders[&block(1)], vec![1]);
    }

    #[test]
    fn missing_supplier_without_fallback_rejected() {
        let descriptors = vec![descriptor(
            "consumer",
            vec![block(0)],
            &[],
            &["phantom"],
        )];
        let err =
            resolve_order(&descriptors, block(0), &FallbackMap::new()).unwrap_err();
        match err {
            ResolveError::MissingSupplier { name, requester, .. } => {
                assert_eq!(name, QualifiedName::plain("phantom"));
                assert_eq!(requester, "consumer");
            }
            other => panic!("expected MissingSupplier, got {other:?}"),
        }
    }

    #[test]
    fn fallback_satisfies_the_missing_supplier() {
        let descriptors = vec![descriptor(
            "consumer",
            vec![block(0)],
            &[],
            &["phantom"],
        )];
        let mut fallbacks = FallbackMap::new();
        fallbacks.register(block(0), QualifiedName::plain("phantom"));
        let order = resolve_order(&descriptors, block(0), &fallbacks).unwrap();
        assert_eq!(order, vec![0]);
    }

    #[test]
    fn fallback_is_scoped_to_its_region() {
        // Real supplier in block 0, fallback only in block 1; a block-1
        // consumer resolves against the fallback, a block-2 consumer fails.
        let descriptors = vec![
            descriptor("supplier", vec![block(0)], &["k"], &[]),
            descriptor("reader_b1", vec![block(1)], &[], &["k"]),
            descriptor("reader_b2", vec![block(2)], &[], &["k"]),
        ];
        let mut fallbacks = FallbackMap::new();
        fallbacks.register(block(1), QualifiedName::plain("k"));
        assert!(resolve_order(&descriptors, block(1), &fallbacks).is_ok());
        assert!(matches!(
            resolve_order(&descriptors, block(2), &fallbacks),
            Err(ResolveError::MissingSupplier { .. })
        ));
    }

    #[test]
    fn boundary_regions_resolve_independently() {
        let wall = Region::Boundary(BoundaryId(0));
        let descriptors = vec![
            descriptor("volume", vec![block(0)], &["k"], &[]),
            descriptor("surface", vec![wall], &["k"], &[]),
        ];
        let orders = resolve_all(&descriptors, &FallbackMap::new()).unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[&wall], vec![1]);
    }
}
