//! Engine facade over every simulated vessel.
//!
//! [`ResourceEngine`] owns one [`VesselResources`] per vessel, the shared
//! [`BackgroundStepCache`] and the [`SimConfig`]. Callers address vessels by
//! id; a vessel that has never been seen gets an empty view on first use.
//!
//! Per tick and per vessel the expected call sequence is:
//!
//! 1. any number of [`ResourceEngine::submit_recipe`] and
//!    [`ResourceEngine::run_process_tick`] calls,
//! 2. exactly one [`ResourceEngine::resolve_tick`].
//!
//! [`ResourceEngine::resolve_all`] resolves every vessel at once. With the
//! `parallel` feature each vessel is resolved on a rayon worker that owns
//! that vessel's view for the duration of the call.

use std::collections::HashMap;

use crate::cache::BackgroundStepCache;
use crate::config::SimConfig;
use crate::id::VesselId;
use crate::ledger::ResourceState;
use crate::process::{PROCESS_BROKER, ProcessOutcome, ProcessRequest, ProcessRunner};
use crate::recipe::Recipe;
use crate::view::{TickReport, VesselResources};

#[derive(Debug)]
pub struct ResourceEngine {
    config: SimConfig,
    runner: ProcessRunner,
    vessels: HashMap<VesselId, VesselResources>,
    background: BackgroundStepCache,
}

impl Default for ResourceEngine {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl ResourceEngine {
    pub fn new(config: SimConfig) -> Self {
        Self {
            runner: ProcessRunner::new(&config),
            config,
            vessels: HashMap::new(),
            background: BackgroundStepCache::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn background(&self) -> &BackgroundStepCache {
        &self.background
    }

    /// View of `vessel`, created empty if unknown.
    pub fn vessel(&mut self, vessel: VesselId) -> &mut VesselResources {
        self.vessels
            .entry(vessel)
            .or_insert_with(|| VesselResources::new(vessel))
    }

    pub fn vessel_ref(&self, vessel: VesselId) -> Option<&VesselResources> {
        self.vessels.get(&vessel)
    }

    /// Install a prepared view, replacing any view of the same vessel.
    pub fn attach(&mut self, view: VesselResources) {
        self.vessels.insert(view.vessel(), view);
    }

    /// Remove a vessel from memory and drop its background cache entries.
    pub fn unload(&mut self, vessel: VesselId) -> Option<VesselResources> {
        let removed = self.vessels.remove(&vessel);
        self.background.purge_vessel(vessel);
        tracing::debug!(vessel = vessel.0, known = removed.is_some(), "vessel unloaded");
        removed
    }

    pub fn vessel_ids(&self) -> Vec<VesselId> {
        let mut ids: Vec<VesselId> = self.vessels.keys().copied().collect();
        ids.sort();
        ids
    }

    /// The view and the background cache of `vessel` at once, with the
    /// configuration.
    pub fn split_mut(
        &mut self,
        vessel: VesselId,
    ) -> (&mut VesselResources, &mut BackgroundStepCache, &SimConfig) {
        let view = self
            .vessels
            .entry(vessel)
            .or_insert_with(|| VesselResources::new(vessel));
        (view, &mut self.background, &self.config)
    }

    /// Ledger entry of `name` on `vessel`, created lazily.
    pub fn lookup_resource(&mut self, vessel: VesselId, name: &str) -> &mut ResourceState {
        self.vessel(vessel).info(name)
    }

    pub fn submit_recipe(&mut self, vessel: VesselId, recipe: Recipe) {
        self.vessel(vessel).submit_recipe(recipe);
    }

    pub fn run_process_tick(
        &mut self,
        vessel: VesselId,
        request: &ProcessRequest,
        elapsed_s: f64,
    ) -> ProcessOutcome {
        let view = self
            .vessels
            .entry(vessel)
            .or_insert_with(|| VesselResources::new(vessel));
        self.runner.run(view, request, elapsed_s, PROCESS_BROKER)
    }

    /// Resolve the pending recipes of `vessel` and commit its resources.
    pub fn resolve_tick(&mut self, vessel: VesselId, elapsed_s: f64) -> TickReport {
        let config = &self.config;
        let view = self
            .vessels
            .entry(vessel)
            .or_insert_with(|| VesselResources::new(vessel));
        let report = view.resolve(elapsed_s, config);
        trace_report(vessel, elapsed_s, &report);
        report
    }

    /// Resolve every vessel. Reports are ordered by vessel id.
    pub fn resolve_all(&mut self, elapsed_s: f64) -> Vec<(VesselId, TickReport)> {
        let config = &self.config;

        #[cfg(feature = "parallel")]
        let mut reports: Vec<(VesselId, TickReport)> = {
            use rayon::prelude::*;
            self.vessels
                .par_iter_mut()
                .map(|(id, view)| (*id, view.resolve(elapsed_s, config)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let mut reports: Vec<(VesselId, TickReport)> = self
            .vessels
            .iter_mut()
            .map(|(id, view)| (*id, view.resolve(elapsed_s, config)))
            .collect();

        reports.sort_by_key(|(id, _)| *id);
        for (id, report) in &reports {
            trace_report(*id, elapsed_s, report);
        }
        reports
    }
}

fn trace_report(vessel: VesselId, elapsed_s: f64, report: &TickReport) {
    tracing::trace!(
        vessel = vessel.0,
        elapsed_s,
        recipes = report.recipes.len(),
        resources = report.commits.len(),
        discarded = report.discarded.len(),
        "vessel tick resolved"
    );
}
