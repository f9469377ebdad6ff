//! Generic resource process: fixed EC rates plus configured resource lists.
//!
//! Loaded updates use the rates parsed at start. Background updates read the
//! rate lists from the background cache, parsing them on the first visit of
//! each part. Planner updates always run, with the rates parsed at start.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shipflow_core::cache::{CacheKey, CacheKind};
use shipflow_core::library::ResourceLibrary;
use shipflow_core::parse::{ResourceRate, parse_resource_rates_with};
use shipflow_core::process::{PROCESS_BROKER, ProcessRates, ProcessRequest, ProcessRunner};

use crate::{ModuleContext, ModuleError, SimMode, VesselModule, non_negative};

type RateList = Arc<Vec<ResourceRate>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessModule {
    /// Broker tag; the generic process tag when empty.
    pub title: String,
    pub ec_produced: f64,
    pub ec_consumed: f64,
    /// `Resource@rate` list of produced resources.
    pub resources_produced: String,
    /// `Resource@rate` list of consumed resources.
    pub resources_consumed: String,
    /// Run while the vessel is loaded.
    pub run_loaded: bool,
    /// Run while the vessel is unloaded.
    pub run_unloaded: bool,
    #[serde(skip)]
    parsed: Option<ProcessRequest>,
}

impl Default for ProcessModule {
    fn default() -> Self {
        Self {
            title: String::new(),
            ec_produced: 0.0,
            ec_consumed: 0.0,
            resources_produced: String::new(),
            resources_consumed: String::new(),
            run_loaded: false,
            run_unloaded: true,
            parsed: None,
        }
    }
}

impl ProcessModule {
    pub fn new(produced: &str, consumed: &str) -> Self {
        Self {
            resources_produced: produced.to_string(),
            resources_consumed: consumed.to_string(),
            ..Self::default()
        }
    }

    pub fn with_ec(mut self, produced: f64, consumed: f64) -> Self {
        self.ec_produced = produced;
        self.ec_consumed = consumed;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn running_when(mut self, loaded: bool, unloaded: bool) -> Self {
        self.run_loaded = loaded;
        self.run_unloaded = unloaded;
        self
    }

    /// Rates parsed at start, `None` before a successful start.
    pub fn request(&self) -> Option<&ProcessRequest> {
        self.parsed.as_ref()
    }

    fn tag(&self) -> &str {
        if self.title.is_empty() {
            PROCESS_BROKER
        } else {
            &self.title
        }
    }

    fn parse_list(&self, field: &'static str, text: &str, library: &ResourceLibrary) -> Vec<ResourceRate> {
        let module = self.tag();
        parse_resource_rates_with(text, library, &mut |err| {
            tracing::debug!(module, field, %err, "dropped rate token");
        })
    }

    fn cached_list(ctx: &mut ModuleContext<'_>, kind: CacheKind, parse: impl FnOnce() -> Vec<ResourceRate>) -> RateList {
        let key = CacheKey::new(ctx.part, kind);
        ctx.cache
            .get_or_insert_with(ctx.vessel, key, || Arc::new(parse()))
            .cloned()
            .unwrap_or_default()
    }
}

impl VesselModule for ProcessModule {
    fn name(&self) -> &str {
        self.tag()
    }

    fn start(&mut self, library: &ResourceLibrary) -> Result<(), ModuleError> {
        non_negative(self.tag(), "ec_produced", self.ec_produced)?;
        non_negative(self.tag(), "ec_consumed", self.ec_consumed)?;
        let produced = self.parse_list("resources_produced", &self.resources_produced, library);
        let consumed = self.parse_list("resources_consumed", &self.resources_consumed, library);
        self.parsed = Some(ProcessRequest {
            ec_produced: self.ec_produced,
            ec_consumed: self.ec_consumed,
            produced,
            consumed,
        });
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>) {
        let runner = ProcessRunner::new(ctx.config);
        match ctx.mode {
            SimMode::Loaded | SimMode::Planner => {
                if ctx.mode == SimMode::Loaded && !self.run_loaded {
                    return;
                }
                let Some(request) = &self.parsed else {
                    return;
                };
                runner.run(ctx.resources, request, ctx.elapsed_s, self.tag());
            }
            SimMode::Background => {
                if !self.run_unloaded {
                    return;
                }
                let library = ctx.library;
                let produced = Self::cached_list(ctx, CacheKind::ResourcesProduced, || {
                    self.parse_list("resources_produced", &self.resources_produced, library)
                });
                let consumed = Self::cached_list(ctx, CacheKind::ResourcesConsumed, || {
                    self.parse_list("resources_consumed", &self.resources_consumed, library)
                });
                let rates = ProcessRates {
                    ec_produced: self.ec_produced,
                    ec_consumed: self.ec_consumed,
                    produced: &produced,
                    consumed: &consumed,
                };
                runner.run_rates(ctx.resources, rates, ctx.elapsed_s, self.tag());
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
