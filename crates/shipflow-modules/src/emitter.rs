//! Radiation emitter or active shield drawing electric charge.
//!
//! A positive `radiation` emits, a negative one shields. Emitters that
//! cannot be toggled are always running.

use serde::{Deserialize, Serialize};
use shipflow_core::library::ResourceLibrary;

use crate::{ModuleContext, ModuleError, VesselModule, non_negative};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiationEmitter {
    /// Broker tag and display name. Derived from the sign of `radiation`
    /// when empty.
    pub title: String,
    /// rad/s, negative for a shield.
    pub radiation: f64,
    /// EC drawn per second while running.
    pub ec_rate: f64,
    pub can_toggle: bool,
    pub running: bool,
    #[serde(skip)]
    effective: f64,
}

impl Default for RadiationEmitter {
    fn default() -> Self {
        Self {
            title: String::new(),
            radiation: 0.0,
            ec_rate: 0.0,
            can_toggle: false,
            running: false,
            effective: 0.0,
        }
    }
}

impl RadiationEmitter {
    pub fn new(radiation: f64, ec_rate: f64) -> Self {
        Self {
            radiation,
            ec_rate,
            ..Self::default()
        }
    }

    pub fn toggleable(mut self) -> Self {
        self.can_toggle = true;
        self
    }

    /// Switch on or off. Ignored when the emitter cannot be toggled.
    pub fn toggle(&mut self) {
        if self.can_toggle {
            self.running = !self.running;
        }
    }

    /// Radiation actually emitted during the last update: zero when off or
    /// when the vessel had no charge left.
    pub fn effective_radiation(&self) -> f64 {
        self.effective
    }
}

impl VesselModule for RadiationEmitter {
    fn name(&self) -> &str {
        &self.title
    }

    fn start(&mut self, _library: &ResourceLibrary) -> Result<(), ModuleError> {
        if self.title.is_empty() {
            self.title = if self.radiation >= 0.0 {
                "Radiation emitter".to_string()
            } else {
                "Radiation shield".to_string()
            };
        }
        if !self.radiation.is_finite() {
            return Err(ModuleError::InvalidField {
                module: self.title.clone(),
                field: "radiation",
                reason: format!("expected a finite number, got {}", self.radiation),
            });
        }
        non_negative(&self.title, "ec_rate", self.ec_rate)?;
        if !self.can_toggle {
            self.running = true;
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>) {
        self.effective = 0.0;
        if !self.running {
            return;
        }
        if self.ec_rate > 0.0 {
            let ec = ctx.resources.info(&ctx.config.electric_charge);
            if ec.available() <= ctx.config.rate_epsilon {
                return;
            }
            ec.consume(self.ec_rate * ctx.elapsed_s, &self.title);
        }
        self.effective = self.radiation;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
