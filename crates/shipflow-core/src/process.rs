//! Single-multiplier processes gated by electric charge.
//!
//! A process declares one EC production rate, one EC consumption rate and
//! any number of additional produced and consumed resources. One rate
//! multiplier covers all of them:
//!
//! 1. Start at 1.
//! 2. If `ec_consumed > 0`, clamp by `available(EC) / (ec_consumed * dt)`.
//! 3. Clamp by `available / (rate * dt)` for every consumed resource.
//! 4. Clamp by `headroom / (rate * dt)` for every produced resource.
//!
//! All deltas are then requested at `rate * dt * multiplier`, or nothing at
//! all when the multiplier is below epsilon. The same call serves a one
//! second real-time step and an hour long background catch-up step.

use crate::config::SimConfig;
use crate::library::ResourceLookup;
use crate::parse::{RateTokenError, ResourceRate, parse_resource_rates_with};
use crate::view::VesselResources;

/// Default broker tag for process requests.
pub const PROCESS_BROKER: &str = "module process";

/// Rates of one process, parsed once from part configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessRequest {
    pub ec_produced: f64,
    pub ec_consumed: f64,
    pub produced: Vec<ResourceRate>,
    pub consumed: Vec<ResourceRate>,
}

impl ProcessRequest {
    /// Build a request from the configured EC rates and rate strings.
    /// Malformed tokens are dropped.
    pub fn parse(
        ec_produced: f64,
        ec_consumed: f64,
        produced: &str,
        consumed: &str,
        lookup: &impl ResourceLookup,
    ) -> Self {
        Self::parse_with(ec_produced, ec_consumed, produced, consumed, lookup, &mut |_| {})
    }

    /// Like [`parse`](Self::parse), reporting dropped tokens to `sink`.
    pub fn parse_with(
        ec_produced: f64,
        ec_consumed: f64,
        produced: &str,
        consumed: &str,
        lookup: &impl ResourceLookup,
        sink: &mut dyn FnMut(RateTokenError),
    ) -> Self {
        Self {
            ec_produced,
            ec_consumed,
            produced: parse_resource_rates_with(produced, lookup, sink),
            consumed: parse_resource_rates_with(consumed, lookup, sink),
        }
    }
}

/// Borrowed view of a process's rates.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRates<'a> {
    pub ec_produced: f64,
    pub ec_consumed: f64,
    pub produced: &'a [ResourceRate],
    pub consumed: &'a [ResourceRate],
}

/// Result of one process tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOutcome {
    /// Multiplier applied to the declared rates.
    pub rate: f64,
    /// False when nothing was requested.
    pub applied: bool,
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    electric_charge: String,
    epsilon: f64,
}

impl ProcessRunner {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            electric_charge: config.electric_charge.clone(),
            epsilon: config.rate_epsilon,
        }
    }

    /// Multiplier the request could run at for `elapsed_s` seconds.
    pub fn multiplier(&self, view: &mut VesselResources, request: &ProcessRequest, elapsed_s: f64) -> f64 {
        self.rates_multiplier(view, request.ec_consumed, &request.produced, &request.consumed, elapsed_s)
    }

    fn rates_multiplier(
        &self,
        view: &mut VesselResources,
        ec_consumed: f64,
        produced: &[ResourceRate],
        consumed: &[ResourceRate],
        elapsed_s: f64,
    ) -> f64 {
        let mut rate = 1.0_f64;

        if ec_consumed > 0.0 {
            let available = view.info(&self.electric_charge).available();
            rate = rate.min(clamp_ratio(available, ec_consumed * elapsed_s));
        }
        for input in consumed {
            let available = view.info(&input.resource).available();
            rate = rate.min(clamp_ratio(available, input.rate * elapsed_s));
        }
        for output in produced {
            let headroom = view.info(&output.resource).headroom();
            rate = rate.min(clamp_ratio(headroom, output.rate * elapsed_s));
        }

        rate
    }

    /// Run the process for `elapsed_s` seconds. Requests are tagged with
    /// `tag`. A non-positive elapsed time does nothing.
    pub fn run(
        &self,
        view: &mut VesselResources,
        request: &ProcessRequest,
        elapsed_s: f64,
        tag: &str,
    ) -> ProcessOutcome {
        self.run_rates(
            view,
            ProcessRates {
                ec_produced: request.ec_produced,
                ec_consumed: request.ec_consumed,
                produced: &request.produced,
                consumed: &request.consumed,
            },
            elapsed_s,
            tag,
        )
    }

    /// Same as [`run`](Self::run) over borrowed rate lists.
    pub fn run_rates(
        &self,
        view: &mut VesselResources,
        rates: ProcessRates<'_>,
        elapsed_s: f64,
        tag: &str,
    ) -> ProcessOutcome {
        if !(elapsed_s > 0.0) {
            return ProcessOutcome {
                rate: 0.0,
                applied: false,
            };
        }

        let rate = self.rates_multiplier(view, rates.ec_consumed, rates.produced, rates.consumed, elapsed_s);
        if rate < self.epsilon {
            return ProcessOutcome {
                rate,
                applied: false,
            };
        }

        let scale = rate * elapsed_s;
        let ec = view.info(&self.electric_charge);
        if rates.ec_consumed > 0.0 {
            ec.consume(rates.ec_consumed * scale, tag);
        }
        if rates.ec_produced > 0.0 {
            ec.produce(rates.ec_produced * scale, tag);
        }
        for input in rates.consumed {
            view.info(&input.resource).consume(input.rate * scale, tag);
        }
        for output in rates.produced {
            view.info(&output.resource).produce(output.rate * scale, tag);
        }

        ProcessOutcome {
            rate,
            applied: true,
        }
    }
}

/// `available / required` clamped to `[0, 1]`; 1 when nothing is short.
fn clamp_ratio(available: f64, required: f64) -> f64 {
    if available < required {
        (available / required).clamp(0.0, 1.0)
    } else {
        1.0
    }
}
