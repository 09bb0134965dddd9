//! The layered program graph
//!
//! One arena of nodes plus two auxiliary edge layers. The AST layer is a
//! strict ownership tree maintained by the construction API in
//! [`builder`](super::builder); the EOG and DFG layers are adjacency lists
//! by identity and may contain cycles.

use super::layers::{DfgProperties, EdgeLayer, EogProperties};
use super::node::{Node, NodeId, NodeKind};
use crate::errors::{PropGraphError, Result};
use crate::shared::models::PhysicalLocation;
use serde::{Deserialize, Serialize};

/// The unified code property graph for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyGraph {
    nodes: Vec<Node>,
    eog: EdgeLayer<EogProperties>,
    dfg: EdgeLayer<DfgProperties>,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Node access ────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Mutable node access, used by passes to refine nodes in place (e.g.
    /// resolving references). AST links must only be changed through the
    /// construction API.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    pub(crate) fn push_node(&mut self, kind: NodeKind, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(id, kind, name));
        self.eog.grow(self.nodes.len());
        self.dfg.grow(self.nodes.len());
        id
    }

    pub fn set_location(&mut self, id: NodeId, location: PhysicalLocation) {
        self.node_mut(id).location = Some(location);
    }

    pub fn set_code(&mut self, id: NodeId, code: impl Into<String>) {
        self.node_mut(id).code = Some(code.into());
    }

    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.node_mut(id).comment = Some(comment.into());
    }

    // ── AST layer ──────────────────────────────────────────────────

    pub fn ast_parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ast_parent
    }

    pub fn ast_children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).ast_children
    }

    /// Walks the subtree below `root` in depth-first pre-order.
    pub fn walk_subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            // push children reversed so pre-order pops left to right
            for &child in self.ast_children(id).iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    // ── EOG layer ──────────────────────────────────────────────────

    /// Adds a control-flow edge. The (branch, index) pair must be unique
    /// among the edges leaving `from`.
    pub fn add_eog_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        branch: Option<bool>,
        index: u32,
    ) -> Result<()> {
        let duplicate = self
            .eog
            .successors(from)
            .iter()
            .any(|(_, p)| p.branch == branch && p.index == index);
        if duplicate {
            return Err(PropGraphError::graph(format!(
                "duplicate EOG edge tag (branch={branch:?}, index={index}) leaving {from}"
            )));
        }
        let overlaying = self.node(from).is_overlay() || self.node(to).is_overlay();
        self.eog.add_edge(
            from,
            to,
            EogProperties {
                branch,
                index,
                overlaying,
            },
        );
        Ok(())
    }

    /// Adds an untagged control-flow edge, using the next free index.
    pub fn add_eog_next(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let index = self.eog.out_degree(from) as u32;
        self.add_eog_edge(from, to, None, index)
    }

    pub fn eog_successors(&self, id: NodeId) -> &[(NodeId, EogProperties)] {
        self.eog.successors(id)
    }

    pub fn eog_predecessors(&self, id: NodeId) -> &[NodeId] {
        self.eog.predecessors(id)
    }

    // ── DFG layer ──────────────────────────────────────────────────

    /// Adds a data-flow edge. Many-to-many; cycles are expected and
    /// meaningful. Duplicate edges are ignored.
    pub fn add_dfg_edge(&mut self, from: NodeId, to: NodeId) {
        if self.dfg.has_edge(from, to) {
            return;
        }
        let overlaying = self.node(from).is_overlay() || self.node(to).is_overlay();
        self.dfg.add_edge(from, to, DfgProperties { overlaying });
    }

    pub fn dfg_successors(&self, id: NodeId) -> &[(NodeId, DfgProperties)] {
        self.dfg.successors(id)
    }

    pub fn dfg_predecessors(&self, id: NodeId) -> &[NodeId] {
        self.dfg.predecessors(id)
    }

    pub fn dfg_edge_count(&self) -> usize {
        self.dfg.edge_count()
    }

    pub fn eog_edge_count(&self) -> usize {
        self.eog.edge_count()
    }

    // ── Merging ────────────────────────────────────────────────────

    /// Moves every node and edge of `other` into this arena and returns the
    /// id offset that was applied. Used to merge per-file graphs built by
    /// parallel frontends, in file order.
    pub fn absorb(&mut self, mut other: PropertyGraph) -> u32 {
        let delta = self.nodes.len() as u32;
        for mut node in other.nodes.drain(..) {
            node.id = node.id.offset(delta);
            node.ast_parent = node.ast_parent.map(|p| p.offset(delta));
            for child in &mut node.ast_children {
                *child = child.offset(delta);
            }
            node.kind.offset_ids(delta);
            self.nodes.push(node);
        }
        self.eog.grow(self.nodes.len());
        self.dfg.grow(self.nodes.len());
        self.eog.absorb(&other.eog, delta);
        self.dfg.absorb(&other.dfg, delta);
        delta
    }
}
