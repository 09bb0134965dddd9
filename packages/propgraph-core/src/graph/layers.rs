//! Auxiliary edge layers (EOG and DFG)
//!
//! Both layers are stored as adjacency-by-identity lists next to the node
//! arena, with a reverse index for predecessor queries. They carry no
//! ownership semantics whatsoever, so cycles here (loops in the EOG, loop
//! carried data flow in the DFG) can never corrupt the AST ownership tree.

use super::node::NodeId;
use serde::{Deserialize, Serialize};

/// Properties on a control-flow (EOG) edge.
///
/// Edges leaving a branching node carry the branch decision and an index,
/// giving deterministic, reproducible successor ordering. The (branch, index)
/// pair is unique per source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EogProperties {
    pub branch: Option<bool>,
    pub index: u32,
    /// True when either endpoint is an overlay node
    pub overlaying: bool,
}

/// Properties on a data-flow (DFG) edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DfgProperties {
    /// True when either endpoint is an overlay node
    pub overlaying: bool,
}

/// One directed edge layer: per-node successor lists plus a reverse index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeLayer<P> {
    out: Vec<Vec<(NodeId, P)>>,
    incoming: Vec<Vec<NodeId>>,
}

impl<P: Copy> EdgeLayer<P> {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            incoming: Vec::new(),
        }
    }

    /// Grow the per-node lists to cover `len` nodes.
    pub(crate) fn grow(&mut self, len: usize) {
        if self.out.len() < len {
            self.out.resize_with(len, Vec::new);
            self.incoming.resize_with(len, Vec::new);
        }
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, properties: P) {
        self.out[from.index()].push((to, properties));
        self.incoming[to.index()].push(from);
    }

    pub fn successors(&self, node: NodeId) -> &[(NodeId, P)] {
        self.out.get(node.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessors(&self, node: NodeId) -> &[NodeId] {
        self.incoming
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).iter().any(|(t, _)| *t == to)
    }

    pub fn out_degree(&self, node: NodeId) -> usize {
        self.successors(node).len()
    }

    pub fn edge_count(&self) -> usize {
        self.out.iter().map(Vec::len).sum()
    }

    /// Re-add every edge of `other`, shifted by `delta`. Used by arena merge.
    pub(crate) fn absorb(&mut self, other: &EdgeLayer<P>, delta: u32) {
        for (from, succs) in other.out.iter().enumerate() {
            let from = NodeId(from as u32).offset(delta);
            for (to, props) in succs {
                self.add_edge(from, to.offset(delta), *props);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_eog_properties_are_untagged() {
        let props = EogProperties::default();
        assert_eq!(props.branch, None);
        assert_eq!(props.index, 0);
        assert!(!props.overlaying);
    }

    #[test]
    fn test_layer_adjacency_and_reverse_index() {
        let mut layer: EdgeLayer<DfgProperties> = EdgeLayer::new();
        layer.grow(3);
        layer.add_edge(NodeId(0), NodeId(2), DfgProperties::default());
        layer.add_edge(NodeId(1), NodeId(2), DfgProperties::default());

        assert_eq!(layer.successors(NodeId(0)).len(), 1);
        assert_eq!(layer.predecessors(NodeId(2)), &[NodeId(0), NodeId(1)]);
        assert!(layer.has_edge(NodeId(1), NodeId(2)));
        assert!(!layer.has_edge(NodeId(2), NodeId(1)));
        assert_eq!(layer.edge_count(), 2);
    }

    #[test]
    fn test_cycles_are_allowed() {
        // Loop-carried data flow is expected and meaningful in the DFG.
        let mut layer: EdgeLayer<DfgProperties> = EdgeLayer::new();
        layer.grow(2);
        layer.add_edge(NodeId(0), NodeId(1), DfgProperties::default());
        layer.add_edge(NodeId(1), NodeId(0), DfgProperties::default());
        assert!(layer.has_edge(NodeId(0), NodeId(1)));
        assert!(layer.has_edge(NodeId(1), NodeId(0)));
    }

    #[test]
    fn test_absorb_offsets_edges() {
        let mut a: EdgeLayer<DfgProperties> = EdgeLayer::new();
        a.grow(2);
        a.add_edge(NodeId(0), NodeId(1), DfgProperties::default());

        let mut b: EdgeLayer<DfgProperties> = EdgeLayer::new();
        b.grow(2);
        b.add_edge(NodeId(0), NodeId(1), DfgProperties::default());

        a.grow(4);
        a.absorb(&b, 2);
        assert!(a.has_edge(NodeId(2), NodeId(3)));
        assert_eq!(a.edge_count(), 2);
    }
}
