//! Per-vessel resource view.
//!
//! [`VesselResources`] is the single owner of every [`ResourceState`] of one
//! vessel. Modules look resources up by name through it and submit recipes to
//! it; the host calls [`VesselResources::resolve`] once per tick after all
//! modules ran.
//!
//! # Part containers
//!
//! Stored resources are backed by [`PartContainer`]s. A ledger entry created
//! on first lookup aggregates the flow-enabled containers of its resource.
//! At commit the containers are aggregated again, any difference to the
//! known amount is credited to the external broker, and the applied delta is
//! written back:
//!
//! - consumption is taken from each container in proportion to its amount,
//! - production is added to each container in proportion to its free space.
//!
//! Resources without containers (inserted with [`VesselResources::insert`])
//! keep their own amount and capacity.

use std::collections::HashMap;

use crate::config::SimConfig;
use crate::id::{PartId, VesselId};
use crate::ledger::{CommitOutcome, ResourceState};
use crate::recipe::{Recipe, RecipeOutcome};

/// Deltas smaller than this are not written back to containers.
const MIN_DISTRIBUTED: f64 = 1e-16;

/// Storage of one resource in one part.
#[derive(Debug, Clone, PartialEq)]
pub struct PartContainer {
    pub part: PartId,
    pub resource: String,
    pub amount: f64,
    pub capacity: f64,
    /// Containers with flow disabled are invisible to the simulation.
    pub flow_enabled: bool,
}

impl PartContainer {
    /// Create a flow-enabled container. The amount is clamped into
    /// `[0, capacity]`; non-finite values count as 0.
    pub fn new(part: PartId, resource: impl Into<String>, amount: f64, capacity: f64) -> Self {
        let mut container = Self {
            part,
            resource: resource.into(),
            amount,
            capacity,
            flow_enabled: true,
        };
        container.normalize();
        container
    }

    /// Capacity floored at zero, 0 when non-finite.
    pub fn usable_capacity(&self) -> f64 {
        if self.capacity.is_finite() { self.capacity.max(0.0) } else { 0.0 }
    }

    /// Amount clamped into `[0, usable_capacity]`, 0 when non-finite.
    pub fn stored(&self) -> f64 {
        if self.amount.is_finite() {
            self.amount.clamp(0.0, self.usable_capacity())
        } else {
            0.0
        }
    }

    fn normalize(&mut self) {
        self.capacity = self.usable_capacity();
        self.amount = self.stored();
    }
}

/// Excess production or unmet consumption of one resource in one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Discarded {
    pub resource: String,
    pub amount: f64,
}

/// Everything that happened in one resolved tick of one vessel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Outcomes in submission order.
    pub recipes: Vec<RecipeOutcome>,
    /// Commits per resource, ordered by name.
    pub commits: Vec<(String, CommitOutcome)>,
    /// Resources whose requested delta did not fit, ordered by name.
    pub discarded: Vec<Discarded>,
}

/// The resources of one vessel. Not `Clone`: every holder works on the same
/// instance.
#[derive(Debug)]
pub struct VesselResources {
    vessel: VesselId,
    resources: HashMap<String, ResourceState>,
    containers: Vec<PartContainer>,
    recipes: Vec<Recipe>,
}

impl VesselResources {
    pub fn new(vessel: VesselId) -> Self {
        Self {
            vessel,
            resources: HashMap::new(),
            containers: Vec::new(),
            recipes: Vec::new(),
        }
    }

    /// View backed by `containers`, each clamped to its own capacity.
    pub fn with_containers(vessel: VesselId, mut containers: Vec<PartContainer>) -> Self {
        containers.iter_mut().for_each(PartContainer::normalize);
        Self {
            containers,
            ..Self::new(vessel)
        }
    }

    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    /// Add a container. An existing ledger entry for its resource is
    /// re-aggregated immediately.
    pub fn add_container(&mut self, mut container: PartContainer) {
        container.normalize();
        let resource = container.resource.clone();
        self.containers.push(container);
        if let Some(state) = self.resources.get_mut(&resource) {
            let (amount, capacity) = aggregate(&self.containers, &resource);
            state.refresh(amount, capacity, f64::INFINITY);
        }
    }

    pub fn containers(&self) -> &[PartContainer] {
        &self.containers
    }

    /// Mutable access to a container, e.g. for a transfer made outside the
    /// simulation. The change is picked up at the next commit, after the
    /// container is clamped to its capacity.
    pub fn container_mut(&mut self, part: PartId, resource: &str) -> Option<&mut PartContainer> {
        self.containers
            .iter_mut()
            .find(|c| c.part == part && c.resource == resource)
    }

    /// Ledger entry for `name`, created on first lookup from the containers
    /// of that resource (empty with zero capacity when there are none).
    pub fn info(&mut self, name: &str) -> &mut ResourceState {
        let containers = &self.containers;
        self.resources.entry(name.to_string()).or_insert_with(|| {
            let (amount, capacity) = aggregate(containers, name);
            ResourceState::new(name, amount, capacity)
        })
    }

    /// Ledger entry for `name` if it was already created.
    pub fn get(&self, name: &str) -> Option<&ResourceState> {
        self.resources.get(name)
    }

    /// Define a resource directly, replacing any entry with the same name.
    pub fn insert(&mut self, state: ResourceState) {
        self.resources.insert(state.name().to_string(), state);
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceState> {
        self.resources.values()
    }

    /// Queue a recipe for the end of the tick.
    pub fn submit_recipe(&mut self, recipe: Recipe) {
        self.recipes.push(recipe);
    }

    pub fn pending_recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Execute the queued recipes in submission order, then commit every
    /// resource and write container-backed deltas back to the parts.
    pub fn resolve(&mut self, elapsed_s: f64, config: &SimConfig) -> TickReport {
        let recipes = std::mem::take(&mut self.recipes);
        let outcomes = recipes
            .iter()
            .map(|recipe| recipe.execute(self, elapsed_s, config.rate_epsilon))
            .collect();

        let mut names: Vec<String> = self.resources.keys().cloned().collect();
        names.sort();

        let mut report = TickReport {
            recipes: outcomes,
            ..TickReport::default()
        };

        for name in names {
            let Some(state) = self.resources.get_mut(&name) else {
                continue;
            };
            let backed = self.containers.iter().any(|c| c.resource == name);
            if backed {
                self.containers
                    .iter_mut()
                    .filter(|c| c.resource == name)
                    .for_each(PartContainer::normalize);
                let (amount, capacity) = aggregate(&self.containers, &name);
                state.refresh(amount, capacity, config.tolerances.external_change);
            }
            let before = state.amount();
            let capacity = state.capacity();
            let outcome = state.commit(elapsed_s, &config.tolerances);

            if backed {
                distribute(&mut self.containers, &name, outcome.applied, before, capacity);
            }
            if outcome.discarded != 0.0 {
                report.discarded.push(Discarded {
                    resource: name.clone(),
                    amount: outcome.discarded,
                });
            }
            report.commits.push((name, outcome));
        }

        report
    }
}

fn aggregate(containers: &[PartContainer], resource: &str) -> (f64, f64) {
    containers
        .iter()
        .filter(|c| c.flow_enabled && c.resource == resource)
        .fold((0.0, 0.0), |(amount, capacity), c| {
            (amount + c.stored(), capacity + c.usable_capacity())
        })
}

fn distribute(containers: &mut [PartContainer], resource: &str, applied: f64, amount: f64, capacity: f64) {
    if applied.abs() <= MIN_DISTRIBUTED {
        return;
    }
    let free = capacity - amount;
    for c in containers
        .iter_mut()
        .filter(|c| c.flow_enabled && c.resource == resource)
    {
        let stored = c.stored();
        let limit = c.usable_capacity();
        let share = if applied < 0.0 {
            if amount > 0.0 { stored / amount } else { 0.0 }
        } else if free > 0.0 {
            (limit - stored) / free
        } else {
            0.0
        };
        c.amount = (stored + applied * share).clamp(0.0, limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig::default()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    fn two_tanks() -> VesselResources {
        VesselResources::with_containers(
            VesselId(1),
            vec![
                PartContainer::new(PartId(1), "ElectricCharge", 30.0, 50.0),
                PartContainer::new(PartId(2), "ElectricCharge", 10.0, 150.0),
            ],
        )
    }

    #[test]
    fn info_aggregates_containers_lazily() {
        let mut view = two_tanks();
        assert!(view.get("ElectricCharge").is_none());
        let ec = view.info("ElectricCharge");
        assert_close(ec.amount(), 40.0);
        assert_close(ec.capacity(), 200.0);
    }

    #[test]
    fn unknown_resource_is_empty() {
        let mut view = two_tanks();
        let res = view.info("Oxygen");
        assert_eq!(res.amount(), 0.0);
        assert_eq!(res.capacity(), 0.0);
    }

    #[test]
    fn disabled_containers_are_ignored() {
        let mut view = two_tanks();
        view.container_mut(PartId(2), "ElectricCharge").unwrap().flow_enabled = false;
        assert_close(view.info("ElectricCharge").amount(), 30.0);
    }

    #[test]
    fn consumption_is_taken_in_proportion_to_amount() {
        let mut view = two_tanks();
        view.info("ElectricCharge").consume(20.0, "load");
        view.resolve(1.0, &config());

        assert_close(view.containers()[0].amount, 15.0);
        assert_close(view.containers()[1].amount, 5.0);
        assert_close(view.info("ElectricCharge").amount(), 20.0);
    }

    #[test]
    fn production_fills_in_proportion_to_free_space() {
        let mut view = two_tanks();
        view.info("ElectricCharge").produce(80.0, "panel");
        view.resolve(1.0, &config());

        // free space 20 and 140 of 160
        assert_close(view.containers()[0].amount, 40.0);
        assert_close(view.containers()[1].amount, 80.0);
    }

    #[test]
    fn external_changes_are_credited_to_external_broker() {
        let mut view = two_tanks();
        view.info("ElectricCharge");
        view.container_mut(PartId(1), "ElectricCharge").unwrap().amount = 50.0;
        view.resolve(2.0, &config());

        let ec = view.info("ElectricCharge");
        assert_close(ec.amount(), 60.0);
        assert_close(ec.rate(), 10.0);
        assert!(ec.brokers().iter().any(|b| b.broker == crate::ledger::EXTERNAL_BROKER));
    }

    #[test]
    fn add_container_reaggregates_existing_entry() {
        let mut view = two_tanks();
        view.info("ElectricCharge");
        view.add_container(PartContainer::new(PartId(3), "ElectricCharge", 10.0, 10.0));
        let ec = view.info("ElectricCharge");
        assert_close(ec.amount(), 50.0);
        assert_close(ec.capacity(), 210.0);

        view.resolve(1.0, &config());
        assert!(view.info("ElectricCharge").brokers().is_empty());
    }

    #[test]
    fn virtual_resources_keep_their_own_storage() {
        let mut view = VesselResources::new(VesselId(2));
        view.insert(ResourceState::new("Heat", 0.0, 500.0));
        view.info("Heat").produce(700.0, "reactor");
        let report = view.resolve(1.0, &config());

        assert_close(view.info("Heat").amount(), 500.0);
        assert_eq!(report.discarded.len(), 1);
        assert_eq!(report.discarded[0].resource, "Heat");
        assert_close(report.discarded[0].amount, 200.0);
    }

    #[test]
    fn recipes_resolve_in_submission_order() {
        let mut view = VesselResources::new(VesselId(3));
        view.insert(ResourceState::new("ElectricCharge", 10.0, 100.0));
        view.insert(ResourceState::new("Coolant", 0.0, 1000.0));
        view.submit_recipe(
            Recipe::new("first")
                .with_input("ElectricCharge", 8.0)
                .with_output("Coolant", 1.0, false),
        );
        view.submit_recipe(
            Recipe::new("second")
                .with_input("ElectricCharge", 8.0)
                .with_output("Coolant", 1.0, false),
        );
        assert_eq!(view.pending_recipes().len(), 2);

        let report = view.resolve(1.0, &config());
        assert_eq!(report.recipes[0].name, "first");
        assert_close(report.recipes[0].ratio, 1.0);
        assert_close(report.recipes[1].ratio, 0.25);
        assert!(view.pending_recipes().is_empty());
        assert_close(view.info("ElectricCharge").amount(), 0.0);
        assert_close(view.info("Coolant").amount(), 1.25);
    }

    #[test]
    fn commits_are_reported_by_name() {
        let mut view = VesselResources::new(VesselId(4));
        view.insert(ResourceState::new("Water", 1.0, 10.0));
        view.insert(ResourceState::new("Oxygen", 1.0, 10.0));
        let report = view.resolve(1.0, &config());
        let names: Vec<&str> = report.commits.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Oxygen", "Water"]);
    }

    #[test]
    fn overfull_containers_keep_their_total() {
        let mut view = VesselResources::with_containers(
            VesselId(5),
            vec![
                PartContainer::new(PartId(1), "ElectricCharge", 3000.0, 5000.0),
                PartContainer::new(PartId(2), "ElectricCharge", 7000.0, 5000.0),
            ],
        );
        assert_close(view.containers()[1].amount, 5000.0);

        view.info("ElectricCharge").consume(1.0, "load");
        view.resolve(1.0, &config());
        view.resolve(1.0, &config());

        let stored: f64 = view.containers().iter().map(|c| c.amount).sum();
        assert_close(stored, 7999.0);
        assert_close(view.containers()[0].amount, 2999.625);
        assert_close(view.containers()[1].amount, 4999.375);
        let ec = view.info("ElectricCharge");
        assert_close(ec.amount(), 7999.0);
        assert!(ec.brokers().is_empty(), "no amount leaked to the external broker");
    }

    #[test]
    fn container_amounts_are_sanitized() {
        let negative = PartContainer::new(PartId(1), "Water", -5.0, 10.0);
        assert_eq!(negative.amount, 0.0);
        let nan = PartContainer::new(PartId(1), "Water", f64::NAN, 10.0);
        assert_eq!(nan.amount, 0.0);
        let no_capacity = PartContainer::new(PartId(1), "Water", 5.0, f64::NAN);
        assert_eq!((no_capacity.amount, no_capacity.capacity), (0.0, 0.0));
        let negative_capacity = PartContainer::new(PartId(1), "Water", 5.0, -1.0);
        assert_eq!((negative_capacity.amount, negative_capacity.capacity), (0.0, 0.0));

        let mut view = VesselResources::new(VesselId(6));
        view.add_container(PartContainer {
            part: PartId(2),
            resource: "Water".to_string(),
            amount: 30.0,
            capacity: 20.0,
            flow_enabled: true,
        });
        assert_eq!(view.containers()[0].amount, 20.0);
    }

    #[test]
    fn container_edits_are_clamped_at_commit() {
        let mut view = two_tanks();
        view.info("ElectricCharge");
        view.container_mut(PartId(1), "ElectricCharge").unwrap().amount = 90.0;
        view.resolve(1.0, &config());

        assert_close(view.containers()[0].amount, 50.0);
        assert_close(view.info("ElectricCharge").amount(), 60.0);

        view.container_mut(PartId(2), "ElectricCharge").unwrap().amount = f64::NAN;
        view.resolve(1.0, &config());
        assert_eq!(view.containers()[1].amount, 0.0);
        assert_close(view.info("ElectricCharge").amount(), 50.0);
    }

    #[test]
    fn zero_capacity_container_takes_no_production() {
        let mut view = VesselResources::with_containers(
            VesselId(7),
            vec![
                PartContainer::new(PartId(1), "Coolant", 0.0, 0.0),
                PartContainer::new(PartId(2), "Coolant", 0.0, 100.0),
            ],
        );
        view.info("Coolant").produce(50.0, "pump");
        let report = view.resolve(1.0, &config());
        assert_eq!(view.containers()[0].amount, 0.0);
        assert_close(view.containers()[1].amount, 50.0);
        assert!(report.discarded.is_empty());

        let mut empty = VesselResources::with_containers(
            VesselId(8),
            vec![PartContainer::new(PartId(1), "Coolant", 0.0, 0.0)],
        );
        empty.info("Coolant").produce(10.0, "pump");
        let report = empty.resolve(1.0, &config());
        assert_eq!(empty.containers()[0].amount, 0.0);
        assert_close(report.discarded[0].amount, 10.0);
    }
}
