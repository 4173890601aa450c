//! Integration test: dependency-ordered evaluation of a producer chain.
//!
//! Producers are registered consumer-first; the resolver must still
//! evaluate suppliers before requesters, and the computed values must
//! flow through the chain within one element visit.

use marl_core::{Dual, EvalError, Generation, QualifiedName, Region, SubdomainId};
use marl_engine::{ConfigError, SimulationConfig};
use marl_producer::{ProducerParams, ResolveError};
use marl_test_utils::{AdFillProducer, FillProducer, ScaleProducer};

fn block(id: u32) -> Region {
    Region::Subdomain(SubdomainId(id))
}

#[test]
fn chain_registered_backwards_still_evaluates_in_dependency_order() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(ScaleProducer::new(
                "flux",
                "conductivity",
                "flux",
                vec![block(0)],
                -2.0,
            )),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(ScaleProducer::new(
                "conductivity",
                "density",
                "conductivity",
                vec![block(0)],
                3.0,
            )),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(FillProducer::new("density", "density", vec![block(0)], 5.0)),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    assert_eq!(
        sim.evaluation_order(block(0)),
        vec!["density", "conductivity", "flux"]
    );

    let mut data = sim.data();
    sim.init_stateful_properties(&mut data, block(0), 4).unwrap();
    sim.compute_properties(&mut data, block(0), 4).unwrap();

    let registry = sim.registry();
    let flux_id = registry.lookup(&QualifiedName::plain("flux")).unwrap();
    let flux = data.get::<f64>(flux_id, Generation::Current).unwrap();
    assert_eq!(flux.as_slice(), &[-30.0; 4]);
}

#[test]
fn single_point_recompute_matches_the_full_loop() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(FillProducer::new("density", "density", vec![block(0)], 2.0)),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(ScaleProducer::new(
                "double",
                "density",
                "doubled",
                vec![block(0)],
                2.0,
            )),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    let mut data = sim.data();
    sim.init_stateful_properties(&mut data, block(0), 3).unwrap();
    sim.compute_properties_at(&mut data, block(0), 1).unwrap();

    let id = sim
        .registry()
        .lookup(&QualifiedName::plain("doubled"))
        .unwrap();
    let doubled = data.get::<f64>(id, Generation::Current).unwrap();
    assert_eq!(doubled[1], 4.0);
    assert_eq!(doubled[0], 0.0, "other points untouched");
}

#[test]
fn compute_disabled_producers_reset_instead() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(
                FillProducer::new("density", "density", vec![block(0)], 7.0)
                    .with_compute(false)
                    .with_reset_value(-1.0),
            ),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    let mut data = sim.data();
    sim.compute_properties(&mut data, block(0), 2).unwrap();
    let id = sim
        .registry()
        .lookup(&QualifiedName::plain("density"))
        .unwrap();
    let density = data.get::<f64>(id, Generation::Current).unwrap();
    assert_eq!(density.as_slice(), &[-1.0, -1.0]);
}

#[test]
fn duplicate_supplier_in_one_region_aborts_setup() {
    let result = SimulationConfig::new()
        .with_producer(
            Box::new(FillProducer::new("first", "k", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(FillProducer::new("second", "k", vec![block(0)], 2.0)),
            ProducerParams::new(),
        )
        .build();

    match result {
        Err(ConfigError::Resolve(ResolveError::DuplicateSupplier { first, second, .. })) => {
            assert_eq!(first, "first");
            assert_eq!(second, "second");
        }
        other => panic!("expected DuplicateSupplier, got {other:?}", other = other.err()),
    }
}

#[test]
fn same_supplier_name_in_two_regions_is_accepted() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(FillProducer::new("left", "k", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(FillProducer::new("right", "k", vec![block(1)], 2.0)),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    let mut data = sim.data();
    sim.compute_properties(&mut data, block(1), 2).unwrap();
    let id = sim.registry().lookup(&QualifiedName::plain("k")).unwrap();
    let k = data.get::<f64>(id, Generation::Current).unwrap();
    assert_eq!(k.as_slice(), &[2.0, 2.0]);
}

#[test]
fn producer_cycle_aborts_setup_naming_both() {
    let result = SimulationConfig::new()
        .with_producer(
            Box::new(ScaleProducer::new("alpha", "b", "a", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(ScaleProducer::new("beta", "a", "b", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .build();

    match result {
        Err(ConfigError::Resolve(ResolveError::CyclicDependency { producers, .. })) => {
            assert_eq!(producers, vec!["alpha".to_string(), "beta".to_string()]);
        }
        other => panic!("expected CyclicDependency, got {other:?}", other = other.err()),
    }
}

#[test]
fn suffixed_instances_of_one_producer_type_do_not_collide() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(FillProducer::new("left", "k", vec![block(0)], 1.0)),
            ProducerParams::new().with_suffix("left"),
        )
        .with_producer(
            Box::new(FillProducer::new("right", "k", vec![block(0)], 2.0)),
            ProducerParams::new().with_suffix("right"),
        )
        .build()
        .unwrap();

    let supplied = sim.supplied_names(block(0));
    assert!(supplied.contains(&QualifiedName::plain("k_left")));
    assert!(supplied.contains(&QualifiedName::plain("k_right")));
}

#[test]
fn ad_properties_carry_their_derivatives_through_the_store() {
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(AdFillProducer::new("ad_source", "k", vec![block(0)], 2.5)),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    let mut data = sim.data();
    sim.compute_properties(&mut data, block(0), 2).unwrap();

    let id = sim.registry().lookup(&QualifiedName::ad("k")).unwrap();
    let k = data.get::<Dual>(id, Generation::Current).unwrap();
    assert_eq!(k[0].value(), 2.5);
    assert_eq!(k[0].derivative(0), 1.0);
}

#[test]
fn plain_request_of_an_ad_supplied_name_is_a_missing_supplier() {
    // Plain and AD forms of one logical name are distinct properties;
    // a consumer must request the form the supplier declared.
    let result = SimulationConfig::new()
        .with_producer(
            Box::new(AdFillProducer::new("ad_source", "k", vec![block(0)], 2.5)),
            ProducerParams::new(),
        )
        .with_producer(
            Box::new(ScaleProducer::new("reader", "k", "probe", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .build();

    match result {
        Err(ConfigError::Resolve(ResolveError::MissingSupplier { name, .. })) => {
            assert_eq!(name, QualifiedName::plain("k"));
        }
        other => panic!(
            "expected MissingSupplier, got {err:?}",
            err = other.err()
        ),
    }
}

#[test]
fn producer_errors_are_attributed_by_name() {
    // ScaleProducer whose input is never sized: force a point-range
    // failure by computing at a point past the element size.
    let sim = SimulationConfig::new()
        .with_producer(
            Box::new(FillProducer::new("density", "density", vec![block(0)], 1.0)),
            ProducerParams::new(),
        )
        .build()
        .unwrap();

    let mut data = sim.data();
    sim.compute_properties(&mut data, block(0), 2).unwrap();
    let err = sim
        .compute_properties_at(&mut data, block(0), 9)
        .unwrap_err();
    match err {
        EvalError::ProducerFailed { producer, .. } => assert_eq!(producer, "density"),
        other => panic!("expected ProducerFailed, got {other:?}"),
    }
}
