//! Runs installed part modules for loaded and unloaded vessels.
//!
//! A [`VesselSimulator`] owns the [`ResourceEngine`] and the modules
//! installed on each vessel's parts. `tick` runs every enabled module of the
//! vessel in installation order and then resolves the vessel exactly once.
//! Whether a vessel is loaded only changes the [`SimMode`] handed to the
//! modules.

use std::collections::{HashMap, HashSet};

use shipflow_core::config::SimConfig;
use shipflow_core::engine::ResourceEngine;
use shipflow_core::id::{PartId, VesselId};
use shipflow_core::library::ResourceLibrary;
use shipflow_core::view::{TickReport, VesselResources};

use crate::{ModuleContext, ModuleError, SimMode, VesselModule};

#[derive(Debug)]
struct InstalledModule {
    part: PartId,
    module: Box<dyn VesselModule>,
    enabled: bool,
}

#[derive(Debug)]
pub struct VesselSimulator {
    engine: ResourceEngine,
    library: ResourceLibrary,
    modules: HashMap<VesselId, Vec<InstalledModule>>,
    loaded: HashSet<VesselId>,
}

impl VesselSimulator {
    pub fn new(library: ResourceLibrary, config: SimConfig) -> Self {
        Self {
            engine: ResourceEngine::new(config),
            library,
            modules: HashMap::new(),
            loaded: HashSet::new(),
        }
    }

    pub fn engine(&self) -> &ResourceEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ResourceEngine {
        &mut self.engine
    }

    pub fn library(&self) -> &ResourceLibrary {
        &self.library
    }

    /// Install a prepared resource view for a vessel.
    pub fn attach(&mut self, view: VesselResources) {
        self.engine.attach(view);
    }

    /// Start `module` and install it on `part`. A module that fails to start
    /// is still installed but stays disabled; the error is logged and
    /// returned.
    pub fn install(
        &mut self,
        vessel: VesselId,
        part: PartId,
        mut module: Box<dyn VesselModule>,
    ) -> Result<(), ModuleError> {
        let started = module.start(&self.library);
        if let Err(err) = &started {
            tracing::warn!(
                vessel = vessel.0,
                part = part.0,
                module = module.name(),
                %err,
                "module misconfigured, disabled"
            );
        }
        self.modules.entry(vessel).or_default().push(InstalledModule {
            part,
            module,
            enabled: started.is_ok(),
        });
        started
    }

    pub fn set_loaded(&mut self, vessel: VesselId, loaded: bool) {
        if loaded {
            self.loaded.insert(vessel);
        } else {
            self.loaded.remove(&vessel);
        }
    }

    pub fn is_loaded(&self, vessel: VesselId) -> bool {
        self.loaded.contains(&vessel)
    }

    pub fn mode(&self, vessel: VesselId) -> SimMode {
        if self.is_loaded(vessel) {
            SimMode::Loaded
        } else {
            SimMode::Background
        }
    }

    /// Number of installed and of enabled modules on a vessel.
    pub fn module_counts(&self, vessel: VesselId) -> (usize, usize) {
        self.modules.get(&vessel).map_or((0, 0), |installed| {
            let enabled = installed.iter().filter(|m| m.enabled).count();
            (installed.len(), enabled)
        })
    }

    /// The first module of type `T` installed on `part`.
    pub fn module<T: 'static>(&self, vessel: VesselId, part: PartId) -> Option<&T> {
        self.modules.get(&vessel)?.iter().find_map(|installed| {
            (installed.part == part)
                .then(|| installed.module.as_any().downcast_ref::<T>())
                .flatten()
        })
    }

    /// Mutable variant of [`module`](Self::module).
    pub fn module_mut<T: 'static>(&mut self, vessel: VesselId, part: PartId) -> Option<&mut T> {
        self.modules.get_mut(&vessel)?.iter_mut().find_map(|installed| {
            if installed.part == part {
                installed.module.as_any_mut().downcast_mut::<T>()
            } else {
                None
            }
        })
    }

    /// Run every enabled module of `vessel` for `elapsed_s` seconds, then
    /// resolve the vessel.
    pub fn tick(&mut self, vessel: VesselId, elapsed_s: f64) -> TickReport {
        self.run_modules(vessel, elapsed_s);
        self.engine.resolve_tick(vessel, elapsed_s)
    }

    /// Tick every vessel known to the engine. Reports are ordered by
    /// vessel id.
    pub fn tick_all(&mut self, elapsed_s: f64) -> Vec<(VesselId, TickReport)> {
        for vessel in self.engine.vessel_ids() {
            self.run_modules(vessel, elapsed_s);
        }
        self.engine.resolve_all(elapsed_s)
    }

    /// Forget a vessel: its modules, its resources and its background cache.
    pub fn unload(&mut self, vessel: VesselId) -> Option<VesselResources> {
        self.modules.remove(&vessel);
        self.loaded.remove(&vessel);
        self.engine.unload(vessel)
    }

    fn run_modules(&mut self, vessel: VesselId, elapsed_s: f64) {
        let mode = self.mode(vessel);
        let Some(installed) = self.modules.get_mut(&vessel) else {
            return;
        };
        let (resources, cache, config) = self.engine.split_mut(vessel);
        for entry in installed.iter_mut().filter(|m| m.enabled) {
            let mut ctx = ModuleContext {
                vessel,
                part: entry.part,
                mode,
                elapsed_s,
                resources: &mut *resources,
                cache: &mut *cache,
                config,
                library: &self.library,
            };
            entry.module.update(&mut ctx);
        }
    }
}
