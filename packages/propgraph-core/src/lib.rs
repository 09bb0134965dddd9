//! propgraph-core
//!
//! A layered program property graph and the machinery to build and analyze
//! it. Frontends parse source files into an arena-backed AST ownership tree
//! ([`graph::PropertyGraph`]); scheduled passes enrich it with control-flow
//! (EOG) and data-flow (DFG) edge layers; the value evaluation engine then
//! answers best-effort "what value can this node take" queries over the
//! data-flow layer.
//!
//! Typical use:
//!
//! ```no_run
//! use propgraph_core::config::TranslationConfiguration;
//! use propgraph_core::features::frontends::fixture::FixtureFrontend;
//! use propgraph_core::pipeline::TranslationManager;
//!
//! # fn main() -> propgraph_core::errors::Result<()> {
//! let config = TranslationConfiguration::builder()
//!     .source("fixtures/")
//!     .register_frontend(|| Box::new(FixtureFrontend::new()))
//!     .build();
//! let result = TranslationManager::builder()
//!     .config(config)
//!     .build()?
//!     .analyze_blocking()?;
//! println!("{} nodes", result.graph.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod features;
pub mod graph;
pub mod pipeline;
pub mod shared;

pub use config::TranslationConfiguration;
pub use errors::{PropGraphError, Result};
pub use features::value_evaluation::{
    EvalResult, MultiValueEvaluator, NumberSet, Value, ValueEvaluator,
};
pub use graph::{NodeId, NodeKind, PropertyGraph};
pub use pipeline::{
    AnalysisHandle, CancellationToken, PassId, TranslationManager, TranslationResult,
};
