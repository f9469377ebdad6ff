//! Shipflow Core -- resource flow reconciliation for simulated vessels.
//!
//! Many independent part modules produce and consume shared vessel resources
//! (electric charge, coolant, life support gases, heat). This crate collects
//! their per-tick requests, scales each request by what the vessel can
//! actually supply or store, and commits one consistent delta per resource.
//! The same code path serves loaded vessels stepped in real time and
//! unloaded vessels caught up with one large elapsed time.
//!
//! # Tick Pipeline
//!
//! 1. **Lookup** -- Modules fetch [`ledger::ResourceState`]s by name through
//!    the vessel's [`view::VesselResources`]; entries are created lazily.
//! 2. **Submit** -- Modules queue [`recipe::Recipe`]s and run
//!    [`process::ProcessRunner`] requests. Nothing is stored yet; requests
//!    accumulate as deferred deltas.
//! 3. **Resolve** -- Recipes execute in submission order, each scaled by one
//!    feasibility ratio.
//! 4. **Commit** -- Every resource applies its deferred delta clamped to
//!    `[0, capacity]` and writes it back to its part containers.
//!
//! # Key Types
//!
//! - [`engine::ResourceEngine`] -- Owns every vessel view, the background
//!   cache and the configuration.
//! - [`view::VesselResources`] -- The resources of one vessel.
//! - [`ledger::ResourceState`] -- Amount, capacity and pending delta of one
//!   resource.
//! - [`recipe::Recipe`] -- Coupled inputs and outputs sharing one ratio.
//! - [`process::ProcessRequest`] -- EC-gated process rates parsed from part
//!   configuration.
//! - [`cache::BackgroundStepCache`] -- Per-part memo for background ticks.
//! - [`library::ResourceLibrary`] -- Immutable resource definitions.

pub mod cache;
pub mod config;
pub mod engine;
pub mod id;
pub mod ledger;
pub mod library;
pub mod parse;
pub mod process;
pub mod recipe;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod view;
