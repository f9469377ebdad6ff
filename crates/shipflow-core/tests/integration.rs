//! End-to-end scenarios through the engine facade.

use shipflow_core::engine::ResourceEngine;
use shipflow_core::id::{PartId, VesselId};
use shipflow_core::ledger::ResourceState;
use shipflow_core::parse::{ResourceRate, parse_resource_rates};
use shipflow_core::process::ProcessRequest;
use shipflow_core::recipe::Limit;
use shipflow_core::test_utils::*;

// ---------------------------------------------------------------------------
// Test 1: Single-resource consume under scarcity
// ---------------------------------------------------------------------------
#[test]
fn consume_under_scarcity_reaches_zero() {
    let mut engine = ResourceEngine::default();
    engine.attach(seeded_vessel(VesselId(1), &[(WATER, 10.0, 100.0)]));

    engine.lookup_resource(VesselId(1), WATER).consume(15.0, "test");
    let report = engine.resolve_tick(VesselId(1), 1.0);

    assert_eq!(engine.lookup_resource(VesselId(1), WATER).amount(), 0.0);
    assert_eq!(report.discarded.len(), 1);
    assert_close(report.discarded[0].amount, -5.0);
}

// ---------------------------------------------------------------------------
// Test 2: EC-gated coolant pump
// ---------------------------------------------------------------------------
#[test]
fn ec_gated_coolant_pump() {
    let mut engine = ResourceEngine::default();
    engine.attach(seeded_vessel(
        VesselId(1),
        &[(EC, 5.0, 100.0), (COOLANT, 0.0, 1000.0)],
    ));

    engine.submit_recipe(VesselId(1), coolant_pump(10.0, 100.0));
    let report = engine.resolve_tick(VesselId(1), 1.0);

    assert_close(report.recipes[0].ratio, 0.5);
    assert_eq!(report.recipes[0].limit, Some(Limit::Input(EC.to_string())));
    assert_close(engine.lookup_resource(VesselId(1), EC).amount(), 0.0);
    assert_close(engine.lookup_resource(VesselId(1), COOLANT).amount(), 50.0);
}

// ---------------------------------------------------------------------------
// Test 3: Zero EC consumption disables EC gating
// ---------------------------------------------------------------------------
#[test]
fn zero_ec_consumption_runs_at_full_rate() {
    let mut engine = ResourceEngine::default();
    engine.attach(seeded_vessel(
        VesselId(1),
        &[(EC, 0.0, 100.0), (OXYGEN, 0.0, 100.0)],
    ));

    let request = ProcessRequest {
        ec_produced: 0.0,
        ec_consumed: 0.0,
        produced: vec![ResourceRate::new(OXYGEN, 1.5)],
        consumed: Vec::new(),
    };
    let outcome = engine.run_process_tick(VesselId(1), &request, 10.0);
    engine.resolve_tick(VesselId(1), 10.0);

    assert_eq!(outcome.rate, 1.0);
    assert_close(engine.lookup_resource(VesselId(1), OXYGEN).amount(), 15.0);
}

// ---------------------------------------------------------------------------
// Test 4: One large step equals many small steps without scarcity
// ---------------------------------------------------------------------------
#[test]
fn background_step_matches_realtime_steps() {
    let lib = library();
    let request = ProcessRequest::parse(0.0, 0.05, "Oxygen@0.01", "CarbonDioxide@0.008,Water@0.002", &lib);
    let tanks = [
        (EC, 900.0, 1000.0),
        (OXYGEN, 10.0, 500.0),
        (CARBON_DIOXIDE, 400.0, 500.0),
        (WATER, 100.0, 100.0),
    ];

    let mut engine = ResourceEngine::default();
    engine.attach(tanked_vessel(VesselId(1), &tanks));
    engine.attach(tanked_vessel(VesselId(2), &tanks));

    engine.run_process_tick(VesselId(1), &request, 3600.0);
    engine.resolve_tick(VesselId(1), 3600.0);

    for _ in 0..3600 {
        engine.run_process_tick(VesselId(2), &request, 1.0);
        engine.resolve_tick(VesselId(2), 1.0);
    }

    for (name, _, _) in tanks {
        let batch = engine.lookup_resource(VesselId(1), name).amount();
        let stepped = engine.lookup_resource(VesselId(2), name).amount();
        assert!(approx_eq(batch, stepped, 1e-6), "{name}: {batch} vs {stepped}");
    }
    assert_close(engine.lookup_resource(VesselId(1), OXYGEN).amount(), 46.0);
    assert_close(engine.lookup_resource(VesselId(1), EC).amount(), 720.0);
}

// ---------------------------------------------------------------------------
// Test 5: Lenient parse keeps only valid tokens
// ---------------------------------------------------------------------------
#[test]
fn lenient_parse_scenario() {
    let rates = parse_resource_rates("ElectricCharge@0.5,Bogus@abc,Oxygen@-1", &library());
    assert_eq!(rates, vec![ResourceRate::new(EC, 0.5)]);
}

// ---------------------------------------------------------------------------
// Test 6: Sequential recipes see earlier consumption
// ---------------------------------------------------------------------------
#[test]
fn second_recipe_sees_first_recipe_consumption() {
    let mut engine = ResourceEngine::default();
    engine.attach(seeded_vessel(
        VesselId(1),
        &[(EC, 15.0, 100.0), (COOLANT, 0.0, 1000.0)],
    ));

    engine.submit_recipe(VesselId(1), coolant_pump(10.0, 100.0));
    engine.submit_recipe(VesselId(1), coolant_pump(10.0, 100.0));
    let report = engine.resolve_tick(VesselId(1), 1.0);

    assert_close(report.recipes[0].ratio, 1.0);
    assert_close(report.recipes[1].ratio, 0.5);
    assert_close(engine.lookup_resource(VesselId(1), COOLANT).amount(), 150.0);
}

// ---------------------------------------------------------------------------
// Test 7: Container-backed resources are written back to parts
// ---------------------------------------------------------------------------
#[test]
fn container_writeback_after_resolve() {
    let mut engine = ResourceEngine::default();
    engine.attach(tanked_vessel(
        VesselId(3),
        &[(EC, 20.0, 100.0), (EC, 60.0, 100.0), (COOLANT, 0.0, 1000.0)],
    ));

    engine.submit_recipe(VesselId(3), coolant_pump(40.0, 10.0));
    engine.resolve_tick(VesselId(3), 1.0);

    let view = engine.vessel_ref(VesselId(3)).unwrap();
    let ec: Vec<f64> = view
        .containers()
        .iter()
        .filter(|c| c.resource == EC)
        .map(|c| c.amount)
        .collect();
    assert_close(ec[0], 10.0);
    assert_close(ec[1], 30.0);

    let coolant = view
        .containers()
        .iter()
        .find(|c| c.part == PartId(3))
        .unwrap();
    assert_close(coolant.amount, 10.0);
}

// ---------------------------------------------------------------------------
// Test 8: Overflowing dump outputs are discarded, not limiting
// ---------------------------------------------------------------------------
#[test]
fn dump_excess_output_overflows() {
    let mut engine = ResourceEngine::default();
    let mut view = seeded_vessel(VesselId(1), &[(EC, 100.0, 100.0)]);
    view.insert(ResourceState::new(HEAT, 95.0, 100.0));
    engine.attach(view);

    engine.submit_recipe(
        VesselId(1),
        shipflow_core::recipe::Recipe::new("heater")
            .with_input(EC, 1.0)
            .with_output(HEAT, 20.0, true),
    );
    let report = engine.resolve_tick(VesselId(1), 1.0);

    assert_close(report.recipes[0].ratio, 1.0);
    assert_close(engine.lookup_resource(VesselId(1), HEAT).amount(), 100.0);
    let heat = report.discarded.iter().find(|d| d.resource == HEAT).unwrap();
    assert_close(heat.amount, 15.0);
}
