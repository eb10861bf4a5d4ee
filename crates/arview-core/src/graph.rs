//! Scene graph types
//!
//! [`AssetGraph`] is what an asset loader hands back: a detached tree whose
//! root children are meshes or sub-groups. [`MemoryScene`] is an arena-backed
//! scene graph the swap controller can graft those trees into. The Bevy
//! frontend uses the ECS hierarchy instead; both sit behind the same
//! [`SceneGraph`](crate::swap::SceneGraph) seam.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::swap::SceneGraph;

/// What a node holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain container (glTF node without a mesh, pivots, the marker group)
    Group,
    /// Renderable mesh with `primitives` draw calls
    Mesh { primitives: usize },
}

/// One node of a freshly loaded asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetNode {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub translation: Vec3,
    pub cast_shadow: bool,
    pub children: Vec<AssetNode>,
}

impl AssetNode {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind: NodeKind::Group,
            translation: Vec3::ZERO,
            cast_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: impl Into<String>, primitives: usize) -> Self {
        Self {
            kind: NodeKind::Mesh { primitives },
            ..Self::group(name)
        }
    }

    pub fn with_child(mut self, child: AssetNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(AssetNode::subtree_len).sum::<usize>()
    }

    /// Apply `f` to every node of the subtree, depth first
    pub fn traverse_mut(&mut self, f: &mut impl FnMut(&mut AssetNode)) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }
}

/// A loaded asset: the top-level nodes of its scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetGraph {
    pub children: Vec<AssetNode>,
}

impl AssetGraph {
    pub fn new(children: Vec<AssetNode>) -> Self {
        Self { children }
    }

    /// Mark every mesh in the graph as shadow-casting
    pub fn cast_shadows(&mut self) {
        for child in &mut self.children {
            child.traverse_mut(&mut |node| {
                if matches!(node.kind, NodeKind::Mesh { .. }) {
                    node.cast_shadow = true;
                }
            });
        }
    }

    pub fn node_count(&self) -> usize {
        self.children.iter().map(AssetNode::subtree_len).sum()
    }
}

/// Handle to a node in a [`MemoryScene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A node living in a [`MemoryScene`]
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    pub translation: Vec3,
    pub cast_shadow: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed scene graph
///
/// Removing a child drops its whole subtree from the arena, so retired pivots
/// never linger as unreachable nodes.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
    pivot_offset: Vec3,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// Create a scene holding only its root node
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SceneNode {
                name: "scene".to_string(),
                kind: NodeKind::Group,
                translation: Vec3::ZERO,
                cast_shadow: false,
                parent: None,
                children: Vec::new(),
            },
        );

        Self {
            nodes,
            root,
            next_id: 1,
            pivot_offset: Vec3::ZERO,
        }
    }

    /// Offset applied to pivots created by [`SceneGraph::graft_pivot`]
    pub fn with_pivot_offset(mut self, offset: Vec3) -> Self {
        self.pivot_offset = offset;
        self
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Children of `id`, in insertion order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Direct children of `parent` carrying `name`
    pub fn children_named(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|c| self.nodes.get(c).is_some_and(|n| n.name == name))
            .collect()
    }

    /// All nodes below `id` (not including `id`), depth first
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Create a detached group node
    pub fn create_group(&mut self, name: &str) -> NodeId {
        self.insert_node(name.to_string(), NodeKind::Group, Vec3::ZERO, false)
    }

    /// Create a group node directly under `parent`
    pub fn add_group(&mut self, parent: NodeId, name: &str) -> NodeId {
        let id = self.create_group(name);
        self.attach(parent, id);
        id
    }

    /// Copy an asset subtree into the arena under `parent`
    pub fn insert_asset(&mut self, parent: NodeId, node: AssetNode) -> NodeId {
        let name = node.name.unwrap_or_default();
        let id = self.insert_node(name, node.kind, node.translation, node.cast_shadow);
        self.attach(parent, id);
        for child in node.children {
            self.insert_asset(id, child);
        }
        id
    }

    fn insert_node(
        &mut self,
        name: String,
        kind: NodeKind,
        translation: Vec3,
        cast_shadow: bool,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            SceneNode {
                name,
                kind,
                translation,
                cast_shadow,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Reparent `child` under `parent`
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if !self.nodes.contains_key(&parent) || !self.nodes.contains_key(&child) {
            return;
        }
        self.detach(child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, child: NodeId) {
        let old_parent = self.nodes.get_mut(&child).and_then(|n| n.parent.take());
        if let Some(old) = old_parent {
            if let Some(node) = self.nodes.get_mut(&old) {
                node.children.retain(|c| *c != child);
            }
        }
    }

    /// Drop `id` and everything below it
    fn despawn(&mut self, id: NodeId) {
        self.detach(id);
        for node in std::iter::once(id).chain(self.descendants(id)) {
            self.nodes.remove(&node);
        }
    }
}

impl SceneGraph for MemoryScene {
    type Node = NodeId;
    type Asset = AssetGraph;

    fn graft_pivot(&mut self, name: &str, mut asset: AssetGraph) -> NodeId {
        asset.cast_shadows();
        let pivot = self.insert_node(name.to_string(), NodeKind::Group, self.pivot_offset, false);
        for child in asset.children {
            self.insert_asset(pivot, child);
        }
        pivot
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let is_child = self
            .nodes
            .get(&child)
            .is_some_and(|n| n.parent == Some(parent));
        if is_child {
            self.despawn(child);
        }
    }
}
