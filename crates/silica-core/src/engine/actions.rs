use super::error::EngineError;
use crate::core::params::{ParamError, ParameterStore};
use crate::core::tree::NodeTree;
use crate::core::volume::VolumeMode;
use std::any::Any;

/// Everything a detector builder receives from its owning subsystem:
/// the resolved parameter snapshot, the chosen volume mode, and the
/// overlap-check flag copied from the subsystem configuration.
pub struct DetectorContext<'a> {
    pub subsystem_name: &'a str,
    pub params: &'a ParameterStore,
    pub volumes: &'a VolumeMode,
    pub overlap_check: bool,
}

/// Opaque geometry handle constructed at run initialization.
///
/// Owned exclusively by the subsystem that built it and consulted only by
/// that subsystem and its stepping hook.
pub trait Detector {
    fn name(&self) -> &str;

    /// Prints detector information for the requested category.
    fn print(&self, what: &str);

    /// Concrete-type access for the model that built this detector, used
    /// when binding the stepping hook to detector internals.
    fn as_any(&self) -> &dyn Any;
}

/// Per-event hook that records simulated interaction data into the
/// subsystem's hit container.
pub trait SteppingAction {
    /// Re-resolves the node-tree pointers needed for the current event.
    ///
    /// Called once per event before recording; lookups are repeated rather
    /// than cached because other subsystems may refresh tree contents between
    /// events.
    fn resolve_interfaces(&mut self, tree: &mut NodeTree) -> Result<(), EngineError>;

    /// Records this event's hits into the resolved container.
    fn record_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError>;
}

/// Display settings for a subsystem's volumes.
///
/// Owned exclusively by the subsystem and dropped with it, independent of
/// whether the subsystem is active.
pub trait DisplayAction {
    fn apply(&mut self);
}

/// Factory for the externally defined pieces of one detector type.
///
/// A model supplies the parameter schema of its subsystem and constructs the
/// detector, stepping-action, and display-action handles at run
/// initialization. Implementations carry no lifecycle state of their own.
pub trait DetectorModel {
    /// Registers the model-specific parameter defaults. Called once during
    /// subsystem construction, before the store can be sealed.
    fn register_defaults(&self, params: &mut ParameterStore) -> Result<(), ParamError>;

    fn build_detector(&self, ctx: &DetectorContext<'_>) -> Result<Box<dyn Detector>, EngineError>;

    /// Builds the per-event hook bound to an already constructed detector.
    /// Only called for active subsystems.
    fn build_stepping_action(
        &self,
        detector: &dyn Detector,
        params: &ParameterStore,
    ) -> Result<Box<dyn SteppingAction>, EngineError>;

    fn build_display_action(&self, subsystem_name: &str) -> Box<dyn DisplayAction>;
}
