//! Per-vessel, per-resource ledger entry.
//!
//! # Design
//!
//! - [`ResourceState::consume`] and [`ResourceState::produce`] never touch the
//!   stored amount directly. Requests accumulate in a signed `deferred` delta
//!   and are applied once by [`ResourceState::commit`], clamped so that
//!   `0 <= amount <= capacity` holds afterwards.
//! - [`ResourceState::available`] and [`ResourceState::headroom`] project the
//!   pending delta, so a request issued earlier in the tick is visible to
//!   later feasibility checks.
//! - Every request carries a broker tag. Totals per tag are turned into
//!   per-second rates at commit for display.

use std::collections::BTreeMap;

use crate::config::Tolerances;

/// Broker tag used for amount changes made outside the simulation.
pub const EXTERNAL_BROKER: &str = "external";

/// Amounts at or below this are reported as depleted.
const DEPLETED_AMOUNT: f64 = 1e-10;

/// Rates at or above minus this are not draining.
const DRAIN_RATE: f64 = 1e-10;

/// Accumulated requests of one broker during the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BrokerTotals {
    pub produced: f64,
    pub consumed: f64,
    /// Consumption requested beyond what was projected to be available at
    /// request time.
    pub shortfall: f64,
}

/// Per-second contribution of one broker over the last committed tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerRate {
    pub broker: String,
    /// Net rate, positive when producing.
    pub rate: f64,
    /// Rate of requested consumption that could not be met.
    pub unmet: f64,
}

/// What a commit did to the stored amount.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CommitOutcome {
    /// Delta actually applied to the amount.
    pub applied: f64,
    /// Requested delta that did not fit. Positive is excess production that
    /// was dumped, negative is consumption that was not met.
    pub discarded: f64,
}

/// Amount and capacity of one resource on one vessel.
#[derive(Debug, Clone)]
pub struct ResourceState {
    name: String,
    amount: f64,
    capacity: f64,
    deferred: f64,
    level: f64,
    rate: f64,
    external: f64,
    tick_brokers: BTreeMap<String, BrokerTotals>,
    broker_rates: Vec<BrokerRate>,
}

impl ResourceState {
    /// Create a ledger entry. Capacity is floored at zero and the amount is
    /// clamped into `[0, capacity]`.
    pub fn new(name: impl Into<String>, amount: f64, capacity: f64) -> Self {
        let capacity = sanitize(capacity);
        let amount = sanitize(amount).min(capacity);
        Self {
            name: name.into(),
            amount,
            capacity,
            deferred: 0.0,
            level: level_of(amount, capacity),
            rate: 0.0,
            external: 0.0,
            tick_brokers: BTreeMap::new(),
            broker_rates: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Net delta requested so far this tick.
    pub fn deferred(&self) -> f64 {
        self.deferred
    }

    /// Fill level in `[0, 1]` as of the last commit. Zero without capacity.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Change per second over the last committed tick, external changes
    /// included.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Broker rates of the last committed tick, ordered by tag.
    pub fn brokers(&self) -> &[BrokerRate] {
        &self.broker_rates
    }

    /// Requests of the current tick, keyed by tag.
    pub fn pending_brokers(&self) -> &BTreeMap<String, BrokerTotals> {
        &self.tick_brokers
    }

    /// Amount projected after the pending delta, never negative.
    pub fn available(&self) -> f64 {
        (self.amount + self.deferred).max(0.0)
    }

    /// Free capacity projected after the pending delta, never negative.
    /// While consumption is requested beyond the stored amount the projected
    /// amount is negative, so this can exceed `capacity - amount` (and even
    /// `capacity`).
    pub fn headroom(&self) -> f64 {
        (self.capacity - (self.amount + self.deferred)).max(0.0)
    }

    /// Request removal of `quantity`. The amount never goes below zero; the
    /// part of the request beyond the projected availability is recorded as
    /// shortfall against `tag`.
    pub fn consume(&mut self, quantity: f64, tag: &str) {
        if !valid_quantity(quantity) {
            return;
        }
        let shortfall = (quantity - self.available()).max(0.0);
        self.deferred -= quantity;
        let totals = self.totals_mut(tag);
        totals.consumed += quantity;
        totals.shortfall += shortfall;
    }

    /// Request addition of `quantity`. Anything beyond capacity is discarded
    /// at commit.
    pub fn produce(&mut self, quantity: f64, tag: &str) {
        if !valid_quantity(quantity) {
            return;
        }
        self.deferred += quantity;
        self.totals_mut(tag).produced += quantity;
    }

    /// Replace amount and capacity with freshly aggregated values.
    ///
    /// Returns the difference from the known amount when it exceeds
    /// `tolerance`; that difference was made by something outside the
    /// simulation and is credited to [`EXTERNAL_BROKER`] at commit. Smaller
    /// differences are absorbed silently and 0 is returned.
    pub fn refresh(&mut self, amount: f64, capacity: f64, tolerance: f64) -> f64 {
        self.capacity = sanitize(capacity);
        let amount = sanitize(amount).min(self.capacity);
        let delta = amount - self.amount;
        self.amount = amount;
        if delta.abs() > tolerance {
            self.external += delta;
            delta
        } else {
            0.0
        }
    }

    /// Apply the pending delta, clamped to the stored range, and refresh the
    /// derived values.
    pub fn commit(&mut self, elapsed_s: f64, tolerances: &Tolerances) -> CommitOutcome {
        let applied = self
            .deferred
            .clamp(-self.amount, self.capacity - self.amount);
        let discarded = self.deferred - applied;

        self.amount += applied;
        debug_assert!(
            self.amount >= -slack(self.capacity) && self.amount <= self.capacity + slack(self.capacity),
            "{} left its stored range: {} of {}",
            self.name,
            self.amount,
            self.capacity
        );
        self.amount = self.amount.clamp(0.0, self.capacity);
        self.level = level_of(self.amount, self.capacity);

        if elapsed_s > 0.0 {
            self.rate = (applied + self.external) / elapsed_s;
            self.broker_rates = self.collect_broker_rates(elapsed_s, tolerances.broker_rate);
        } else {
            self.rate = 0.0;
            self.broker_rates.clear();
        }

        self.deferred = 0.0;
        self.external = 0.0;
        self.tick_brokers.clear();

        CommitOutcome { applied, discarded }
    }

    /// Seconds until empty at the current rate. Zero when already empty,
    /// `None` when the amount is not decreasing.
    pub fn depletion_time(&self) -> Option<f64> {
        if self.amount <= DEPLETED_AMOUNT {
            Some(0.0)
        } else if self.rate >= -DRAIN_RATE {
            None
        } else {
            Some(self.amount / -self.rate)
        }
    }

    fn totals_mut(&mut self, tag: &str) -> &mut BrokerTotals {
        self.tick_brokers.entry(tag.to_string()).or_default()
    }

    fn collect_broker_rates(&self, elapsed_s: f64, tolerance: f64) -> Vec<BrokerRate> {
        let mut rates: Vec<BrokerRate> = self
            .tick_brokers
            .iter()
            .map(|(tag, totals)| BrokerRate {
                broker: tag.clone(),
                rate: (totals.produced - totals.consumed) / elapsed_s,
                unmet: totals.shortfall / elapsed_s,
            })
            .collect();
        if self.external != 0.0 {
            rates.push(BrokerRate {
                broker: EXTERNAL_BROKER.to_string(),
                rate: self.external / elapsed_s,
                unmet: 0.0,
            });
        }
        rates.retain(|b| b.rate.abs() >= tolerance || b.unmet >= tolerance);
        rates
    }
}

fn valid_quantity(quantity: f64) -> bool {
    debug_assert!(
        quantity.is_finite() && quantity >= 0.0,
        "resource request must be finite and non-negative, got {quantity}"
    );
    quantity.is_finite() && quantity > 0.0
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

fn level_of(amount: f64, capacity: f64) -> f64 {
    if capacity > 0.0 { amount / capacity } else { 0.0 }
}

/// Rounding allowance for the range assertion.
fn slack(capacity: f64) -> f64 {
    1e-9 * capacity.max(1.0)
}
