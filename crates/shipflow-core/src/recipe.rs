//! Coupled resource conversions that scale by one feasibility ratio.
//!
//! A recipe lists inputs and outputs in units per second. When it is
//! executed for a tick of `dt` seconds the ratio `r` in `[0, 1]` is the
//! smallest of:
//!
//! - `available / (rate * dt)` over every input that is short,
//! - `headroom / (rate * dt)` over every output that is short, except outputs
//!   flagged `dump_excess`.
//!
//! Every input is then consumed and every output produced at `rate * dt * r`.
//! A ratio below the configured epsilon skips the recipe for the tick.

use crate::view::VesselResources;

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeInput {
    pub resource: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeOutput {
    pub resource: String,
    pub rate: f64,
    /// Excess beyond capacity is discarded instead of limiting the ratio.
    pub dump_excess: bool,
}

/// The entry that set the ratio of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    Input(String),
    Output(String),
}

/// Result of executing one recipe for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeOutcome {
    pub name: String,
    pub ratio: f64,
    /// False when the ratio fell below epsilon and nothing was requested.
    pub applied: bool,
    /// First scarcest entry, `None` when nothing was short.
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    name: String,
    inputs: Vec<RecipeInput>,
    outputs: Vec<RecipeOutput>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, resource: impl Into<String>, rate: f64) -> Self {
        self.add_input(resource, rate);
        self
    }

    pub fn with_output(mut self, resource: impl Into<String>, rate: f64, dump_excess: bool) -> Self {
        self.add_output(resource, rate, dump_excess);
        self
    }

    /// Entries with a non-finite or non-positive rate are ignored.
    pub fn add_input(&mut self, resource: impl Into<String>, rate: f64) {
        if valid_rate(rate) {
            self.inputs.push(RecipeInput {
                resource: resource.into(),
                rate,
            });
        }
    }

    /// Entries with a non-finite or non-positive rate are ignored.
    pub fn add_output(&mut self, resource: impl Into<String>, rate: f64, dump_excess: bool) {
        if valid_rate(rate) {
            self.outputs.push(RecipeOutput {
                resource: resource.into(),
                rate,
                dump_excess,
            });
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[RecipeInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[RecipeOutput] {
        &self.outputs
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }

    /// Ratio of the declared rates that can be met over `dt` seconds given
    /// the current projected amounts of the vessel.
    pub fn feasibility(&self, view: &mut VesselResources, dt: f64) -> f64 {
        self.limiting(view, dt).0
    }

    /// Compute the ratio and, unless it is below `epsilon`, request every
    /// input and output scaled by it. Requests are tagged with the recipe
    /// name.
    pub fn execute(&self, view: &mut VesselResources, dt: f64, epsilon: f64) -> RecipeOutcome {
        if !(dt > 0.0) {
            return RecipeOutcome {
                name: self.name.clone(),
                ratio: 0.0,
                applied: false,
                limit: None,
            };
        }

        let (ratio, limit) = self.limiting(view, dt);
        let applied = ratio >= epsilon;
        if applied {
            let scale = dt * ratio;
            for input in &self.inputs {
                view.info(&input.resource)
                    .consume(input.rate * scale, &self.name);
            }
            for output in &self.outputs {
                view.info(&output.resource)
                    .produce(output.rate * scale, &self.name);
            }
        }

        RecipeOutcome {
            name: self.name.clone(),
            ratio,
            applied,
            limit,
        }
    }

    fn limiting(&self, view: &mut VesselResources, dt: f64) -> (f64, Option<Limit>) {
        let mut ratio = 1.0_f64;
        let mut limit = None;

        for input in &self.inputs {
            let required = input.rate * dt;
            let available = view.info(&input.resource).available();
            if available < required {
                let r = (available / required).clamp(0.0, 1.0);
                if r < ratio {
                    ratio = r;
                    limit = Some(Limit::Input(input.resource.clone()));
                }
            }
        }

        for output in self.outputs.iter().filter(|o| !o.dump_excess) {
            let produced = output.rate * dt;
            let headroom = view.info(&output.resource).headroom();
            if headroom < produced {
                let r = (headroom / produced).clamp(0.0, 1.0);
                if r < ratio {
                    ratio = r;
                    limit = Some(Limit::Output(output.resource.clone()));
                }
            }
        }

        (ratio, limit)
    }
}

fn valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
