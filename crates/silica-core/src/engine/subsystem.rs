use super::actions::{DetectorContext, DetectorModel, Detector, DisplayAction, SteppingAction};
use super::error::EngineError;
use crate::core::hits::{HitContainer, hit_node_name};
use crate::core::params::{ParamError, ParameterStore};
use crate::core::tree::{DST_NODE_NAME, NodeKind, NodePayload, NodeTree};
use crate::core::volume::{VolumeError, VolumeMode, VolumeSelector};
use tracing::{debug, info};

/// A named, independently configurable unit that participates in detector
/// construction and per-event processing.
///
/// The host contract: call configuration mutators zero or more times, then
/// `init_run` exactly once, then `process_event` once per simulated event,
/// strictly serialized, then drop. Any `Err` is fatal to the run; event
/// processing is not idempotent against a partially mutated tree, so the run
/// loop never retries an event.
pub trait Subsystem {
    fn name(&self) -> &str;

    /// One-time run initialization against the shared node tree.
    fn init_run(&mut self, tree: &mut NodeTree) -> Result<(), EngineError>;

    /// Per-event hook invoked by the run loop while initialized.
    fn process_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError>;
}

impl std::fmt::Debug for dyn Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subsystem")
            .field("name", &self.name())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Configured,
    Initialized,
}

/// Detector subsystem with a declared parameter schema, a mutually exclusive
/// geometry volume selection, and lazily materialized per-run state.
///
/// On `init_run` the subsystem finds or creates its subtree and hit container
/// in the shared tree (when active), constructs its detector through the
/// supplied [`DetectorModel`], and binds the stepping hook. The detector,
/// stepping-action, and display-action handles are all owned exclusively by
/// the subsystem and dropped with it.
pub struct DetectorSubsystem {
    name: String,
    params: ParameterStore,
    volumes: VolumeSelector,
    overlap_check: bool,
    model: Box<dyn DetectorModel>,
    state: LifecycleState,
    detector: Option<Box<dyn Detector>>,
    stepping: Option<Box<dyn SteppingAction>>,
    display: Option<Box<dyn DisplayAction>>,
}

impl DetectorSubsystem {
    /// Creates a subsystem with the base parameter schema plus the model's
    /// own defaults.
    ///
    /// Base defaults: `active` / `absorberactive` (int, 0), `place_x/y/z`
    /// (double, cm), `rot_x/y/z` (double, deg). Parameters carry no units;
    /// detector builders convert them.
    pub fn new(name: &str, model: Box<dyn DetectorModel>) -> Result<Self, EngineError> {
        let mut params = ParameterStore::new();
        params.set_default_int("active", 0)?;
        params.set_default_int("absorberactive", 0)?;
        params.set_default_double("place_x", 0.0)?;
        params.set_default_double("place_y", 0.0)?;
        params.set_default_double("place_z", 0.0)?;
        params.set_default_double("rot_x", 0.0)?;
        params.set_default_double("rot_y", 0.0)?;
        params.set_default_double("rot_z", 0.0)?;
        model.register_defaults(&mut params)?;

        Ok(Self {
            name: name.to_string(),
            params,
            volumes: VolumeSelector::new(),
            overlap_check: false,
            model,
            state: LifecycleState::Configured,
            detector: None,
            stepping: None,
            display: None,
        })
    }

    pub fn set_double(&mut self, name: &str, value: f64) -> Result<(), ParamError> {
        self.params.set_double(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: i64) -> Result<(), ParamError> {
        self.params.set_int(name, value)
    }

    pub fn set_string(&mut self, name: &str, value: &str) -> Result<(), ParamError> {
        self.params.set_string(name, value)
    }

    /// Convenience toggle for the `active` parameter gating hit recording.
    pub fn set_active(&mut self, active: bool) -> Result<(), ParamError> {
        self.params.set_int("active", i64::from(active))
    }

    pub fn set_overlap_check(&mut self, check: bool) {
        self.overlap_check = check;
    }

    /// Registers an assembly volume; conflicts with a selected logical volume
    /// are configuration-time fatal.
    pub fn add_assembly_volume(&mut self, name: &str) -> Result<(), VolumeError> {
        self.volumes.add_assembly_volume(name)
    }

    /// Selects a logical volume; conflicts with registered assembly volumes
    /// are configuration-time fatal.
    pub fn use_logical_volume(&mut self, name: &str) -> Result<(), VolumeError> {
        self.volumes.use_logical_volume(name)
    }

    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    pub fn volume_mode(&self) -> &VolumeMode {
        self.volumes.mode()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.params.get_int("active"), Ok(v) if v != 0)
    }

    pub fn detector(&self) -> Option<&dyn Detector> {
        self.detector.as_deref()
    }

    /// Delegates to the detector once one has been constructed.
    pub fn print(&self, what: &str) {
        if let Some(detector) = &self.detector {
            detector.print(what);
        }
    }
}

impl Subsystem for DetectorSubsystem {
    fn name(&self) -> &str {
        &self.name
    }

    fn init_run(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
        if self.state == LifecycleState::Initialized {
            return Err(EngineError::AlreadyInitialized {
                name: self.name.clone(),
            });
        }

        let dst = tree
            .find_first(NodeKind::Composite, DST_NODE_NAME, tree.root())
            .ok_or(EngineError::MissingDstNode)?;

        let active = self.is_active();
        if active {
            let subtree = tree.find_or_create_composite(dst, &self.name)?;
            let hit_name = hit_node_name(&self.name);
            if tree.find_first(NodeKind::Hits, &hit_name, subtree).is_none() {
                tree.add_node(
                    subtree,
                    &hit_name,
                    NodePayload::Hits(HitContainer::new(&hit_name)),
                )?;
                debug!(subsystem = %self.name, node = %hit_name, "published hit container");
            }
        }

        let ctx = DetectorContext {
            subsystem_name: &self.name,
            params: &self.params,
            volumes: self.volumes.mode(),
            overlap_check: self.overlap_check,
        };
        let detector = self.model.build_detector(&ctx)?;

        if active {
            self.stepping = Some(
                self.model
                    .build_stepping_action(detector.as_ref(), &self.params)?,
            );
        }
        let mut display = self.model.build_display_action(&self.name);
        display.apply();
        self.display = Some(display);
        self.detector = Some(detector);

        self.params.seal();
        self.state = LifecycleState::Initialized;
        info!(subsystem = %self.name, active, "subsystem joined the run");
        Ok(())
    }

    fn process_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
        if self.state != LifecycleState::Initialized {
            return Err(EngineError::NotInitialized {
                name: self.name.clone(),
            });
        }
        let Some(stepping) = self.stepping.as_mut() else {
            return Ok(());
        };
        stepping.resolve_interfaces(tree)?;
        stepping.record_event(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hits::Hit;
    use crate::core::tree::NodeId;
    use nalgebra::Point3;

    struct NullDetector {
        name: String,
    }

    impl Detector for NullDetector {
        fn name(&self) -> &str {
            &self.name
        }

        fn print(&self, _what: &str) {}

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct CountingStepping {
        hit_node: String,
        resolved: Option<NodeId>,
    }

    impl SteppingAction for CountingStepping {
        fn resolve_interfaces(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
            self.resolved = tree.find_first(NodeKind::Hits, &self.hit_node, tree.root());
            self.resolved
                .map(|_| ())
                .ok_or_else(|| EngineError::Stepping {
                    name: self.hit_node.clone(),
                    message: "hit container not found".to_string(),
                })
        }

        fn record_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
            let id = self.resolved.ok_or_else(|| EngineError::Stepping {
                name: self.hit_node.clone(),
                message: "interfaces not resolved".to_string(),
            })?;
            let container = tree.hits_mut(id).ok_or_else(|| EngineError::Stepping {
                name: self.hit_node.clone(),
                message: "node lost its hit payload".to_string(),
            })?;
            container.add_hit(Hit {
                hit_id: 0,
                track_id: 1,
                layer: 0,
                entry: Point3::origin(),
                exit: Point3::origin(),
                edep: 1e-4,
            });
            Ok(())
        }
    }

    struct NullDisplay;

    impl DisplayAction for NullDisplay {
        fn apply(&mut self) {}
    }

    struct TestModel;

    impl DetectorModel for TestModel {
        fn register_defaults(&self, params: &mut ParameterStore) -> Result<(), ParamError> {
            params.set_default_string("gdml_path", "DefaultParameters-InvalidPath")
        }

        fn build_detector(
            &self,
            ctx: &DetectorContext<'_>,
        ) -> Result<Box<dyn Detector>, EngineError> {
            Ok(Box::new(NullDetector {
                name: ctx.subsystem_name.to_string(),
            }))
        }

        fn build_stepping_action(
            &self,
            detector: &dyn Detector,
            _params: &ParameterStore,
        ) -> Result<Box<dyn SteppingAction>, EngineError> {
            Ok(Box::new(CountingStepping {
                hit_node: hit_node_name(detector.name()),
                resolved: None,
            }))
        }

        fn build_display_action(&self, _subsystem_name: &str) -> Box<dyn DisplayAction> {
            Box::new(NullDisplay)
        }
    }

    fn tree_with_dst() -> NodeTree {
        let mut tree = NodeTree::new();
        tree.add_node(tree.root(), DST_NODE_NAME, NodePayload::Composite)
            .unwrap();
        tree
    }

    fn subsystem(name: &str) -> DetectorSubsystem {
        DetectorSubsystem::new(name, Box::new(TestModel)).unwrap()
    }

    #[test]
    fn inactive_subsystem_builds_detector_but_no_hit_container() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("VST");

        sub.init_run(&mut tree).unwrap();

        assert!(sub.detector().is_some());
        assert!(tree.find_first(NodeKind::Hits, "G4HIT_VST", tree.root()).is_none());
        assert!(tree.find_first(NodeKind::Composite, "VST", tree.root()).is_none());

        // no stepping hook bound: events are a no-op
        sub.process_event(&mut tree).unwrap();
        assert_eq!(tree.hit_containers().count(), 0);
    }

    #[test]
    fn active_subsystem_publishes_exactly_one_hit_container() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("VST");
        sub.set_active(true).unwrap();

        sub.init_run(&mut tree).unwrap();

        let dst = tree
            .find_first(NodeKind::Composite, DST_NODE_NAME, tree.root())
            .unwrap();
        let subtree = tree.find_first(NodeKind::Composite, "VST", dst).unwrap();
        let hits = tree.find_first(NodeKind::Hits, "G4HIT_VST", subtree).unwrap();
        assert_eq!(tree.hits(hits).unwrap().name(), "G4HIT_VST");
        assert_eq!(tree.hit_containers().count(), 1);
    }

    #[test]
    fn second_init_on_same_instance_is_rejected_without_tree_changes() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("VST");
        sub.set_active(true).unwrap();
        sub.init_run(&mut tree).unwrap();
        let node_count = tree.len();

        let err = sub.init_run(&mut tree).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyInitialized { .. }));
        assert_eq!(tree.len(), node_count);
    }

    #[test]
    fn same_named_subsystem_reuses_the_existing_nodes() {
        let mut tree = tree_with_dst();
        let mut first = subsystem("VST");
        first.set_active(true).unwrap();
        first.init_run(&mut tree).unwrap();
        let node_count = tree.len();

        let mut second = subsystem("VST");
        second.set_active(true).unwrap();
        second.init_run(&mut tree).unwrap();

        assert_eq!(tree.len(), node_count);
        assert_eq!(tree.hit_containers().count(), 1);
    }

    #[test]
    fn missing_dst_node_is_fatal() {
        let mut tree = NodeTree::new();
        let mut sub = subsystem("VST");

        let err = sub.init_run(&mut tree).unwrap_err();
        assert!(matches!(err, EngineError::MissingDstNode));
    }

    #[test]
    fn event_before_initialization_is_rejected() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("VST");

        let err = sub.process_event(&mut tree).unwrap_err();
        assert!(matches!(err, EngineError::NotInitialized { .. }));
    }

    #[test]
    fn active_subsystem_records_hits_per_event() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("VST");
        sub.set_active(true).unwrap();
        sub.init_run(&mut tree).unwrap();

        sub.process_event(&mut tree).unwrap();
        sub.process_event(&mut tree).unwrap();

        let hits = tree.find_first(NodeKind::Hits, "G4HIT_VST", tree.root()).unwrap();
        assert_eq!(tree.hits(hits).unwrap().len(), 2);
    }

    #[test]
    fn lblvtx_end_to_end_configuration() {
        let mut tree = tree_with_dst();
        let mut sub = subsystem("LBLVTX");
        sub.add_assembly_volume("VST").unwrap();
        sub.add_assembly_volume("FST").unwrap();
        sub.set_active(true).unwrap();

        sub.init_run(&mut tree).unwrap();

        let dst = tree
            .find_first(NodeKind::Composite, DST_NODE_NAME, tree.root())
            .unwrap();
        let subtree = tree.find_first(NodeKind::Composite, "LBLVTX", dst).unwrap();
        assert_eq!(tree.node(subtree).unwrap().parent(), Some(dst));
        assert!(
            tree.find_first(NodeKind::Hits, "G4HIT_LBLVTX", subtree)
                .is_some()
        );

        // a conflicting selection afterwards fails and leaves the tree alone
        let node_count = tree.len();
        let err = sub.use_logical_volume("X").unwrap_err();
        assert!(matches!(err, VolumeError::AssembliesAlreadySet { .. }));
        assert_eq!(tree.len(), node_count);
        assert!(
            tree.find_first(NodeKind::Hits, "G4HIT_LBLVTX", tree.root())
                .is_some()
        );
    }

    #[test]
    fn logical_then_assembly_fails_before_any_tree_mutation() {
        let tree = tree_with_dst();
        let mut sub = subsystem("LBLVTX");
        sub.use_logical_volume("Foo").unwrap();

        let err = sub.add_assembly_volume("Bar").unwrap_err();
        assert!(matches!(err, VolumeError::LogicalAlreadySet { .. }));
        assert_eq!(tree.len(), 2); // TOP and DST only
        assert_eq!(sub.volume_mode(), &VolumeMode::Logical("Foo".to_string()));
    }
}
