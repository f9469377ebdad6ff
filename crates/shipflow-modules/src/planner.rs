//! Pre-flight resource estimates.
//!
//! The [`Planner`] runs modules in [`SimMode::Planner`] against a synthetic
//! vessel, one second per step, and summarizes every resource after the
//! last step. The synthetic vessel never reaches the engine and its cache is
//! private to the planner.

use shipflow_core::cache::BackgroundStepCache;
use shipflow_core::config::SimConfig;
use shipflow_core::id::PartId;
use shipflow_core::ledger::BrokerRate;
use shipflow_core::library::ResourceLibrary;
use shipflow_core::view::VesselResources;

use crate::{ModuleContext, ModuleError, SimMode, VesselModule};

const STEP_S: f64 = 1.0;

/// State of one resource after the last planner step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSummary {
    pub name: String,
    pub amount: f64,
    pub capacity: f64,
    /// Change per second during the last step.
    pub rate: f64,
    /// Seconds until empty at `rate`, `None` when not draining.
    pub depletion_time: Option<f64>,
    pub brokers: Vec<BrokerRate>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerReport {
    pub steps: u32,
    /// Ordered by resource name.
    pub resources: Vec<ResourceSummary>,
}

impl PlannerReport {
    pub fn resource(&self, name: &str) -> Option<&ResourceSummary> {
        self.resources.iter().find(|r| r.name == name)
    }
}

#[derive(Debug)]
pub struct Planner {
    library: ResourceLibrary,
    config: SimConfig,
    resources: VesselResources,
    cache: BackgroundStepCache,
    modules: Vec<(PartId, Box<dyn VesselModule>)>,
}

impl Planner {
    pub fn new(library: ResourceLibrary, config: SimConfig, resources: VesselResources) -> Self {
        Self {
            library,
            config,
            resources,
            cache: BackgroundStepCache::new(),
            modules: Vec::new(),
        }
    }

    /// Start `module` and add it to the plan. A module that fails to start
    /// is not added.
    pub fn add_module(&mut self, part: PartId, mut module: Box<dyn VesselModule>) -> Result<(), ModuleError> {
        module.start(&self.library)?;
        self.modules.push((part, module));
        Ok(())
    }

    pub fn resources(&self) -> &VesselResources {
        &self.resources
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Advance the synthetic vessel by `steps` seconds.
    pub fn run(&mut self, steps: u32) -> PlannerReport {
        let vessel = self.resources.vessel();
        for _ in 0..steps {
            for (part, module) in &mut self.modules {
                let mut ctx = ModuleContext {
                    vessel,
                    part: *part,
                    mode: SimMode::Planner,
                    elapsed_s: STEP_S,
                    resources: &mut self.resources,
                    cache: &mut self.cache,
                    config: &self.config,
                    library: &self.library,
                };
                module.update(&mut ctx);
            }
            self.resources.resolve(STEP_S, &self.config);
        }
        self.report(steps)
    }

    fn report(&self, steps: u32) -> PlannerReport {
        let mut resources: Vec<ResourceSummary> = self
            .resources
            .resources()
            .map(|state| ResourceSummary {
                name: state.name().to_string(),
                amount: state.amount(),
                capacity: state.capacity(),
                rate: state.rate(),
                depletion_time: state.depletion_time(),
                brokers: state.brokers().to_vec(),
            })
            .collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        PlannerReport { steps, resources }
    }
}
