use super::hits::HitContainer;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

/// Name of the well-known root-level composite node under which subsystems
/// publish their per-run output. The run context creates it before any
/// subsystem initializes.
pub const DST_NODE_NAME: &str = "DST";

new_key_type! {
    pub struct NodeId;
}

/// Type tag used for typed lookups into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Composite,
    Hits,
}

/// The typed payload of a node: either a pure namespace node or a published
/// data object.
#[derive(Debug)]
pub enum NodePayload {
    Composite,
    Hits(HitContainer),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Composite => NodeKind::Composite,
            NodePayload::Hits(_) => NodeKind::Hits,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    name: String,
    payload: NodePayload,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TreeError {
    #[error("node '{parent}' already has a child named '{name}'")]
    DuplicateNode { parent: String, name: String },

    #[error("node id does not refer to a live node")]
    StaleNode,
}

/// Shared, named, hierarchical namespace through which subsystems publish
/// per-run output for consumption by other components.
///
/// The discipline over one run is append-only during initialization and
/// read-mostly during event processing: subsystems must not delete or rename
/// nodes owned by other subsystems, and find-or-create attaches a node only
/// if absent, never overwriting an existing one. The host loop is
/// single-threaded, so no locking is involved.
#[derive(Debug)]
pub struct NodeTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTree {
    /// Creates a tree holding only the top node.
    pub fn new() -> Self {
        let mut nodes: SlotMap<NodeId, Node> = SlotMap::with_key();
        let root = nodes.insert(Node {
            name: "TOP".to_string(),
            payload: NodePayload::Composite,
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Attaches a new child under `parent`.
    ///
    /// Sibling names are unique: inserting a second child with an existing
    /// name fails, regardless of payload kind.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: &str,
        payload: NodePayload,
    ) -> Result<NodeId, TreeError> {
        let parent_node = self.nodes.get(parent).ok_or(TreeError::StaleNode)?;
        if parent_node
            .children
            .iter()
            .any(|&child| self.nodes[child].name == name)
        {
            return Err(TreeError::DuplicateNode {
                parent: parent_node.name.clone(),
                name: name.to_string(),
            });
        }

        let child = self.nodes.insert(Node {
            name: name.to_string(),
            payload,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(child);
        Ok(child)
    }

    /// Depth-first typed lookup by name and kind, starting from (and
    /// including) `from`. Returns `None` when no such node exists.
    pub fn find_first(&self, kind: NodeKind, name: &str, from: NodeId) -> Option<NodeId> {
        let node = self.nodes.get(from)?;
        if node.kind() == kind && node.name == name {
            return Some(from);
        }
        node.children
            .iter()
            .find_map(|&child| self.find_first(kind, name, child))
    }

    /// Finds an existing composite named `name` below `parent`, or attaches a
    /// new one directly under `parent`.
    ///
    /// Idempotent within a run: a second call with the same arguments returns
    /// the prior node and never creates a duplicate.
    pub fn find_or_create_composite(
        &mut self,
        parent: NodeId,
        name: &str,
    ) -> Result<NodeId, TreeError> {
        if let Some(existing) = self.find_first(NodeKind::Composite, name, parent) {
            return Ok(existing);
        }
        self.add_node(parent, name, NodePayload::Composite)
    }

    /// Projects the hit container held by `id`, if any.
    pub fn hits(&self, id: NodeId) -> Option<&HitContainer> {
        match &self.nodes.get(id)?.payload {
            NodePayload::Hits(container) => Some(container),
            NodePayload::Composite => None,
        }
    }

    /// Mutable projection of the hit container held by `id`, if any.
    pub fn hits_mut(&mut self, id: NodeId) -> Option<&mut HitContainer> {
        match &mut self.nodes.get_mut(id)?.payload {
            NodePayload::Hits(container) => Some(container),
            NodePayload::Composite => None,
        }
    }

    /// Iterates over every hit container published in the tree.
    pub fn hit_containers(&self) -> impl Iterator<Item = &HitContainer> {
        self.nodes.values().filter_map(|node| match &node.payload {
            NodePayload::Hits(container) => Some(container),
            NodePayload::Composite => None,
        })
    }

    /// Mutable iteration over every hit container published in the tree.
    pub fn hit_containers_mut(&mut self) -> impl Iterator<Item = &mut HitContainer> {
        self.nodes
            .values_mut()
            .filter_map(|node| match &mut node.payload {
                NodePayload::Hits(container) => Some(container),
                NodePayload::Composite => None,
            })
    }

    /// Number of live nodes, including the top node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
