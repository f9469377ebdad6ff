//! Coolant radiator with an electrically driven pump.
//!
//! While running, the radiator submits one recipe per update: the pump
//! input (EC by default) in, coolant out. Both scale together, so an EC
//! shortage slows the coolant flow by the same ratio. Coolant production is
//! never dumped; a full coolant loop limits the pump as well.

use serde::{Deserialize, Serialize};
use shipflow_core::library::ResourceLibrary;
use shipflow_core::recipe::Recipe;

use crate::{ModuleContext, ModuleError, VesselModule, known_resource, non_negative};

const PUMP_RECIPE: &str = "radiator pump";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Radiator {
    /// Radiating surface in m².
    pub surface: f64,
    /// Coolant pump capacity per second.
    pub flow_rate: f64,
    /// Resource consumed to drive the pump.
    pub input_resource: String,
    /// Input rate per m² of surface at full flow.
    pub input_resource_rate: f64,
    pub coolant_resource: String,
    pub running: bool,
}

impl Default for Radiator {
    fn default() -> Self {
        Self {
            surface: 1.0,
            flow_rate: 0.1,
            input_resource: "ElectricCharge".to_string(),
            input_resource_rate: 0.1,
            coolant_resource: "Coolant".to_string(),
            running: true,
        }
    }
}

impl Radiator {
    /// Input drawn per second at full flow.
    pub fn input_rate(&self) -> f64 {
        self.input_resource_rate * self.surface
    }

    /// The pump recipe for one update.
    pub fn pump_recipe(&self) -> Recipe {
        Recipe::new(PUMP_RECIPE)
            .with_input(self.input_resource.as_str(), self.input_rate())
            .with_output(self.coolant_resource.as_str(), self.flow_rate, false)
    }

    pub fn toggle(&mut self) {
        self.running = !self.running;
    }
}

impl VesselModule for Radiator {
    fn name(&self) -> &str {
        "radiator"
    }

    fn start(&mut self, library: &ResourceLibrary) -> Result<(), ModuleError> {
        known_resource(self.name(), library, &self.input_resource)?;
        known_resource(self.name(), library, &self.coolant_resource)?;
        non_negative(self.name(), "surface", self.surface)?;
        non_negative(self.name(), "flow_rate", self.flow_rate)?;
        non_negative(self.name(), "input_resource_rate", self.input_resource_rate)?;
        Ok(())
    }

    fn update(&mut self, ctx: &mut ModuleContext<'_>) {
        if !self.running {
            return;
        }
        let recipe = self.pump_recipe();
        if !recipe.is_empty() {
            ctx.resources.submit_recipe(recipe);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
