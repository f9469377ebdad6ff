//! Part modules for the Shipflow resource engine.
//!
//! Each module attaches simulated behavior to one part and talks to the
//! vessel's resources only through the [`ModuleContext`] it is handed. The
//! same `update` runs for loaded vessels (small real-time steps), unloaded
//! vessels (one large catch-up step) and the planner (one second steps on a
//! synthetic vessel); [`SimMode`] tells the module which caller it is.
//!
//! # Design
//!
//! - Modules validate their configuration once in [`VesselModule::start`].
//!   A module whose start fails stays installed but disabled.
//! - Modules never resolve ticks. The host resolves each vessel once after
//!   every module of that vessel has run.
//! - Parsed configuration needed by background updates lives in the shared
//!   [`BackgroundStepCache`], keyed by part.

pub mod emitter;
pub mod host;
pub mod planner;
pub mod process;
pub mod radiator;

use shipflow_core::cache::BackgroundStepCache;
use shipflow_core::config::SimConfig;
use shipflow_core::id::{PartId, VesselId};
use shipflow_core::library::ResourceLibrary;
use shipflow_core::view::VesselResources;

pub use emitter::RadiationEmitter;
pub use host::VesselSimulator;
pub use planner::{Planner, PlannerReport, ResourceSummary};
pub use process::ProcessModule;
pub use radiator::Radiator;

// ---------------------------------------------------------------------------
// Module trait
// ---------------------------------------------------------------------------

/// Which caller drives the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SimMode {
    /// Vessel simulated in real time.
    Loaded,
    /// Unloaded vessel caught up in one step.
    Background,
    /// Pre-flight estimate on a synthetic vessel.
    Planner,
}

/// A part behavior that produces or consumes vessel resources.
pub trait VesselModule: std::fmt::Debug + Send {
    /// The human-readable name of this module, used for broker tags and
    /// diagnostics.
    fn name(&self) -> &str;

    /// Validate configuration against the resource library. Called once
    /// before the first update; an error keeps the module disabled.
    fn start(&mut self, library: &ResourceLibrary) -> Result<(), ModuleError> {
        let _ = library;
        Ok(())
    }

    /// Submit this tick's requests.
    fn update(&mut self, ctx: &mut ModuleContext<'_>);

    /// Downcast to `&dyn Any` for type-safe access to concrete module types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to `&mut dyn Any` for type-safe mutable access.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ---------------------------------------------------------------------------
// ModuleContext
// ---------------------------------------------------------------------------

/// Mutable context passed to modules during `update`.
pub struct ModuleContext<'a> {
    pub vessel: VesselId,
    /// The part the module is attached to.
    pub part: PartId,
    pub mode: SimMode,
    /// Seconds covered by this update.
    pub elapsed_s: f64,
    /// The vessel's resources.
    pub resources: &'a mut VesselResources,
    /// Per-part memo for background updates.
    pub cache: &'a mut BackgroundStepCache,
    pub config: &'a SimConfig,
    /// Resource definitions, for parsing configuration on a cache miss.
    pub library: &'a ResourceLibrary,
}

// ---------------------------------------------------------------------------
// ModuleError
// ---------------------------------------------------------------------------

/// Configuration problems found when a module starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModuleError {
    /// The module references a resource the library does not define.
    #[error("{module}: unknown resource '{resource}'")]
    UnknownResource { module: String, resource: String },
    /// A configured value is out of range.
    #[error("{module}: invalid {field}: {reason}")]
    InvalidField {
        module: String,
        field: &'static str,
        reason: String,
    },
}

/// Check that `value` is finite and not negative.
pub(crate) fn non_negative(module: &str, field: &'static str, value: f64) -> Result<(), ModuleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ModuleError::InvalidField {
            module: module.to_string(),
            field,
            reason: format!("expected a finite non-negative number, got {value}"),
        })
    }
}

/// Check that `resource` is defined in `library`.
pub(crate) fn known_resource(
    module: &str,
    library: &ResourceLibrary,
    resource: &str,
) -> Result<(), ModuleError> {
    use shipflow_core::library::ResourceLookup;
    if library.contains(resource) {
        Ok(())
    } else {
        Err(ModuleError::UnknownResource {
            module: module.to_string(),
            resource: resource.to_string(),
        })
    }
}
