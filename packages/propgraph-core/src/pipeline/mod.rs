//! Pipeline
//!
//! Everything between "here are some sources" and "here is an analyzed
//! graph": the pass contract and registry, the dependency-ordered scheduler,
//! the run-scoped context, and the orchestrator that drives a whole run.

pub mod context;
pub mod orchestrator;
pub mod pass;
pub mod passes;
pub mod registry;
pub mod result;
pub mod scheduler;

pub use context::{CancellationToken, TranslationContext, TypeState};
pub use orchestrator::{AnalysisHandle, TranslationManager, TranslationManagerBuilder};
pub use pass::{Pass, PassDescriptor, PassId};
pub use registry::{PassFactory, PassRegistry};
pub use result::{BenchmarkRecord, Component, TranslationResult, TranslationUnit};
pub use scheduler::order_passes;
