//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::id::{PartId, VesselId};
use crate::ledger::ResourceState;
use crate::library::{ResourceKind, ResourceLibrary, ResourceLibraryBuilder};
use crate::recipe::Recipe;
use crate::view::{PartContainer, VesselResources};

// ===========================================================================
// Resource names
// ===========================================================================

pub const EC: &str = "ElectricCharge";
pub const COOLANT: &str = "Coolant";
pub const OXYGEN: &str = "Oxygen";
pub const CARBON_DIOXIDE: &str = "CarbonDioxide";
pub const WATER: &str = "Water";
pub const HEAT: &str = "Heat";

/// Library with the stock test resources. Heat is virtual.
pub fn library() -> ResourceLibrary {
    let mut builder = ResourceLibraryBuilder::new();
    for name in [EC, COOLANT, OXYGEN, CARBON_DIOXIDE, WATER] {
        builder.register(name, ResourceKind::Stored);
    }
    builder.register(HEAT, ResourceKind::Virtual);
    match builder.build() {
        Ok(library) => library,
        Err(err) => panic!("stock test library is invalid: {err}"),
    }
}

// ===========================================================================
// Vessel constructors
// ===========================================================================

/// Vessel whose resources are defined directly as `(name, amount, capacity)`.
pub fn seeded_vessel(vessel: VesselId, resources: &[(&str, f64, f64)]) -> VesselResources {
    let mut view = VesselResources::new(vessel);
    for &(name, amount, capacity) in resources {
        view.insert(ResourceState::new(name, amount, capacity));
    }
    view
}

/// Vessel with one part container per `(name, amount, capacity)`, part ids
/// numbered from 1.
pub fn tanked_vessel(vessel: VesselId, tanks: &[(&str, f64, f64)]) -> VesselResources {
    let containers = tanks
        .iter()
        .enumerate()
        .map(|(i, &(name, amount, capacity))| {
            PartContainer::new(PartId(i as u32 + 1), name, amount, capacity)
        })
        .collect();
    VesselResources::with_containers(vessel, containers)
}

/// Radiator pump: EC in, coolant out, no dumping.
pub fn coolant_pump(ec_rate: f64, coolant_rate: f64) -> Recipe {
    Recipe::new("radiator pump")
        .with_input(EC, ec_rate)
        .with_output(COOLANT, coolant_rate, false)
}

// ===========================================================================
// Float comparison
// ===========================================================================

pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * 1.0_f64.max(a.abs()).max(b.abs())
}

#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        approx_eq(actual, expected, 1e-9),
        "expected {expected}, got {actual}"
    );
}
