//! In-core analysis passes
//!
//! The structural passes that produce the auxiliary graph layers: symbol
//! resolution, the control-flow (EOG) builder and the data-flow (DFG)
//! builder. Enrichment passes beyond these live outside the crate and hook
//! in through the [`PassRegistry`](super::PassRegistry).

mod data_flow;
mod evaluation_order;
mod symbol_resolution;

pub use data_flow::DataFlowPass;
pub use evaluation_order::EvaluationOrderPass;
pub use symbol_resolution::SymbolResolutionPass;
