//! Radiators sharing a scarce EC supply on a container-backed vessel.

use shipflow_core::config::SimConfig;
use shipflow_core::id::{PartId, VesselId};
use shipflow_core::recipe::Limit;
use shipflow_core::test_utils::*;
use shipflow_modules::{RadiationEmitter, Radiator, VesselSimulator};

const SHIP: VesselId = VesselId(7);

fn radiator() -> Box<Radiator> {
    Box::new(Radiator {
        surface: 2.0,
        flow_rate: 100.0,
        input_resource_rate: 5.0,
        ..Radiator::default()
    })
}

fn simulator(ec: f64) -> VesselSimulator {
    let mut sim = VesselSimulator::new(library(), SimConfig::default());
    sim.attach(tanked_vessel(
        SHIP,
        &[(EC, ec, 100.0), (COOLANT, 0.0, 500.0), (COOLANT, 0.0, 500.0)],
    ));
    sim.set_loaded(SHIP, true);
    sim
}

fn coolant_tanks(sim: &VesselSimulator) -> Vec<f64> {
    sim.engine()
        .vessel_ref(SHIP)
        .map(|view| {
            view.containers()
                .iter()
                .filter(|c| c.resource == COOLANT)
                .map(|c| c.amount)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Test 1: The first radiator takes what is left, the second starves
// ---------------------------------------------------------------------------
#[test]
fn first_submitted_radiator_wins_scarce_ec() {
    let mut sim = simulator(5.0);
    sim.install(SHIP, PartId(1), radiator()).unwrap();
    sim.install(SHIP, PartId(2), radiator()).unwrap();

    let report = sim.tick(SHIP, 1.0);

    assert_close(report.recipes[0].ratio, 0.5);
    assert!(report.recipes[0].applied);
    assert_eq!(report.recipes[0].limit, Some(Limit::Input(EC.to_string())));
    assert_eq!(report.recipes[1].ratio, 0.0);
    assert!(!report.recipes[1].applied);

    let tanks = coolant_tanks(&sim);
    assert_close(tanks[0], 25.0);
    assert_close(tanks[1], 25.0);
    assert_close(sim.engine_mut().lookup_resource(SHIP, EC).amount(), 0.0);
}

// ---------------------------------------------------------------------------
// Test 2: A full loop limits the pump by its output
// ---------------------------------------------------------------------------
#[test]
fn full_coolant_loop_limits_the_pump() {
    let mut sim = simulator(100.0);
    let slow_pump = Radiator {
        surface: 2.0,
        flow_rate: 100.0,
        input_resource_rate: 1.0,
        ..Radiator::default()
    };
    sim.install(SHIP, PartId(1), Box::new(slow_pump)).unwrap();

    for _ in 0..9 {
        sim.tick(SHIP, 1.0);
    }
    assert_close(sim.engine_mut().lookup_resource(SHIP, COOLANT).amount(), 900.0);

    let report = sim.tick(SHIP, 2.0);
    assert_close(report.recipes[0].ratio, 0.5);
    assert_eq!(report.recipes[0].limit, Some(Limit::Output(COOLANT.to_string())));
    assert!(report.discarded.is_empty(), "pump output is never dumped");
    assert_close(sim.engine_mut().lookup_resource(SHIP, COOLANT).amount(), 1000.0);
}

// ---------------------------------------------------------------------------
// Test 3: Brokers of a shared resource are reported per module
// ---------------------------------------------------------------------------
#[test]
fn ec_brokers_are_reported_per_module() {
    let mut sim = simulator(100.0);
    sim.install(SHIP, PartId(1), radiator()).unwrap();
    sim.install(SHIP, PartId(2), Box::new(RadiationEmitter::new(-0.1, 2.0))).unwrap();

    sim.tick(SHIP, 1.0);

    let ec = sim.engine_mut().lookup_resource(SHIP, EC);
    assert_close(ec.amount(), 88.0);
    assert_close(ec.rate(), -12.0);
    let brokers: Vec<&str> = ec.brokers().iter().map(|b| b.broker.as_str()).collect();
    assert_eq!(brokers, vec!["Radiation shield", "radiator pump"]);
}

// ---------------------------------------------------------------------------
// Test 4: Fuel added from outside is credited to the external broker
// ---------------------------------------------------------------------------
#[test]
fn external_refuel_is_attributed() {
    let mut sim = simulator(10.0);
    sim.install(SHIP, PartId(1), radiator()).unwrap();
    sim.tick(SHIP, 1.0);
    assert_close(sim.engine_mut().lookup_resource(SHIP, EC).amount(), 0.0);

    if let Some(tank) = sim.engine_mut().vessel(SHIP).container_mut(PartId(1), EC) {
        tank.amount = 50.0;
    }
    sim.tick(SHIP, 1.0);

    // The refuel is only seen at commit, after the pump found the tank empty.
    let ec = sim.engine_mut().lookup_resource(SHIP, EC);
    assert_close(ec.amount(), 50.0);
    assert!(ec.brokers().iter().any(|b| b.broker == "external" && b.rate > 0.0));

    sim.tick(SHIP, 1.0);
    let ec = sim.engine_mut().lookup_resource(SHIP, EC);
    assert_close(ec.amount(), 40.0);
    assert!(ec.brokers().iter().all(|b| b.broker != "external"));
}
