//! Graph Model
//!
//! The layered program graph: an arena-backed AST ownership tree plus the
//! auxiliary control-flow (EOG) and data-flow (DFG) edge layers, referenced
//! by node identity.

mod builder;
mod layers;
mod node;
mod property_graph;

pub use layers::{DfgProperties, EdgeLayer, EogProperties};
pub use node::{AccessKind, AssignOperator, BinaryOp, Node, NodeId, NodeKind, UnaryOp};
pub use property_graph::PropertyGraph;
