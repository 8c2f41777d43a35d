use super::error::EngineError;
use super::subsystem::Subsystem;
use crate::core::tree::{DST_NODE_NAME, NodeTree};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Cumulative per-container output over a run, keyed by hit-node name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HitTotals {
    pub hits: u64,
    pub edep: f64,
}

/// Explicit run context: owns the shared node tree and the registered
/// subsystems and drives them through one run.
///
/// Replaces the process-wide run-server singleton of the source framework;
/// every component that needs shared state receives this context explicitly.
/// Execution is single-threaded and strictly serialized: `init_run` once,
/// then `process_event` per simulated event. The first subsystem error aborts
/// the run; events are never retried.
pub struct RunContext {
    tree: NodeTree,
    subsystems: Vec<Box<dyn Subsystem>>,
    initialized: bool,
    events_processed: u64,
    totals: BTreeMap<String, HitTotals>,
}

impl RunContext {
    /// Creates a context whose tree already carries the well-known `DST`
    /// node, satisfying the host contract subsystems rely on.
    pub fn new() -> Self {
        let mut tree = NodeTree::new();
        tree.find_or_create_composite(tree.root(), DST_NODE_NAME)
            .expect("fresh tree has a live root and no siblings");
        Self {
            tree,
            subsystems: Vec::new(),
            initialized: false,
            events_processed: 0,
            totals: BTreeMap::new(),
        }
    }

    /// Registers a subsystem. Registration order is initialization and
    /// per-event invocation order.
    pub fn register(&mut self, subsystem: Box<dyn Subsystem>) {
        debug!(subsystem = %subsystem.name(), "registered subsystem");
        self.subsystems.push(subsystem);
    }

    pub fn subsystem_count(&self) -> usize {
        self.subsystems.len()
    }

    /// Initializes every registered subsystem, in order, exactly once per
    /// run. Any failure aborts: a subsystem either fully joins the run or the
    /// run does not proceed.
    pub fn init_run(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            return Err(EngineError::RunAlreadyStarted);
        }
        info!(subsystems = self.subsystems.len(), "initializing run");
        for subsystem in &mut self.subsystems {
            subsystem.init_run(&mut self.tree)?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Processes one event: clears every published hit container, invokes
    /// each subsystem's hook, then folds the event's output into the run
    /// totals.
    pub fn process_event(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::RunNotStarted);
        }

        for container in self.tree.hit_containers_mut() {
            container.reset();
        }

        for subsystem in &mut self.subsystems {
            subsystem.process_event(&mut self.tree)?;
        }

        for container in self.tree.hit_containers() {
            let totals = self.totals.entry(container.name().to_string()).or_default();
            totals.hits += container.len() as u64;
            totals.edep += container.total_edep();
        }
        self.events_processed += 1;
        Ok(())
    }

    /// Runs the serialized event loop for `n_events`.
    pub fn run(&mut self, n_events: u64) -> Result<(), EngineError> {
        info!(n_events, "starting event loop");
        for _ in 0..n_events {
            self.process_event()?;
        }
        info!(events = self.events_processed, "event loop finished");
        Ok(())
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Cumulative hit totals per hit-node name.
    pub fn totals(&self) -> &BTreeMap<String, HitTotals> {
        &self.totals
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NodeTree {
        &mut self.tree
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hits::{Hit, HitContainer, hit_node_name};
    use crate::core::tree::{NodeKind, NodePayload};
    use nalgebra::Point3;

    /// Minimal subsystem that publishes its hit container and records one
    /// hit per event.
    struct OneHitSubsystem {
        name: String,
        initialized: bool,
    }

    impl OneHitSubsystem {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                initialized: false,
            }
        }
    }

    impl Subsystem for OneHitSubsystem {
        fn name(&self) -> &str {
            &self.name
        }

        fn init_run(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
            let dst = tree
                .find_first(NodeKind::Composite, DST_NODE_NAME, tree.root())
                .ok_or(EngineError::MissingDstNode)?;
            let subtree = tree.find_or_create_composite(dst, &self.name)?;
            let hit_name = hit_node_name(&self.name);
            if tree.find_first(NodeKind::Hits, &hit_name, subtree).is_none() {
                tree.add_node(
                    subtree,
                    &hit_name,
                    NodePayload::Hits(HitContainer::new(&hit_name)),
                )?;
            }
            self.initialized = true;
            Ok(())
        }

        fn process_event(&mut self, tree: &mut NodeTree) -> Result<(), EngineError> {
            let hit_name = hit_node_name(&self.name);
            let id = tree
                .find_first(NodeKind::Hits, &hit_name, tree.root())
                .ok_or_else(|| EngineError::Stepping {
                    name: self.name.clone(),
                    message: "hit container not found".to_string(),
                })?;
            let container = tree.hits_mut(id).ok_or_else(|| EngineError::Stepping {
                name: self.name.clone(),
                message: "node lost its hit payload".to_string(),
            })?;
            container.add_hit(Hit {
                hit_id: 0,
                track_id: 1,
                layer: 0,
                entry: Point3::origin(),
                exit: Point3::origin(),
                edep: 2e-4,
            });
            Ok(())
        }
    }

    #[test]
    fn context_provides_the_dst_node() {
        let ctx = RunContext::new();
        assert!(
            ctx.tree()
                .find_first(NodeKind::Composite, DST_NODE_NAME, ctx.tree().root())
                .is_some()
        );
    }

    #[test]
    fn event_before_init_is_rejected() {
        let mut ctx = RunContext::new();
        ctx.register(Box::new(OneHitSubsystem::new("VST")));

        assert!(matches!(
            ctx.process_event().unwrap_err(),
            EngineError::RunNotStarted
        ));
    }

    #[test]
    fn double_init_is_rejected() {
        let mut ctx = RunContext::new();
        ctx.init_run().unwrap();

        assert!(matches!(
            ctx.init_run().unwrap_err(),
            EngineError::RunAlreadyStarted
        ));
    }

    #[test]
    fn hit_containers_are_reset_between_events() {
        let mut ctx = RunContext::new();
        ctx.register(Box::new(OneHitSubsystem::new("VST")));
        ctx.init_run().unwrap();

        ctx.run(3).unwrap();

        // per-event content stays at one hit; totals accumulate
        let id = ctx
            .tree()
            .find_first(NodeKind::Hits, "G4HIT_VST", ctx.tree().root())
            .unwrap();
        assert_eq!(ctx.tree().hits(id).unwrap().len(), 1);

        let totals = ctx.totals().get("G4HIT_VST").unwrap();
        assert_eq!(totals.hits, 3);
        assert!((totals.edep - 6e-4).abs() < 1e-12);
        assert_eq!(ctx.events_processed(), 3);
    }

    #[test]
    fn subsystems_are_driven_in_registration_order() {
        let mut ctx = RunContext::new();
        ctx.register(Box::new(OneHitSubsystem::new("VST")));
        ctx.register(Box::new(OneHitSubsystem::new("FST")));
        ctx.init_run().unwrap();
        ctx.run(2).unwrap();

        assert_eq!(ctx.totals().len(), 2);
        assert_eq!(ctx.totals().get("G4HIT_VST").unwrap().hits, 2);
        assert_eq!(ctx.totals().get("G4HIT_FST").unwrap().hits, 2);
    }
}
