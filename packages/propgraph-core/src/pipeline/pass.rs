//! Pass contract
//!
//! An analysis pass enriches the graph in place (new edges, refined nodes)
//! and declares its scheduling constraints through a [`PassDescriptor`].
//! Passes run strictly sequentially over a fully linked graph.

use super::context::TranslationContext;
use super::result::TranslationResult;
use crate::errors::Result;
use std::fmt;

/// Pass identifier
///
/// The enum ensures exhaustive matching; registering an implementation for
/// an id happens in the [`PassRegistry`](super::PassRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    /// Resolve dangling references against declared symbols
    SymbolResolution,
    /// Build the control-flow (EOG) layer
    EvaluationOrder,
    /// Build the data-flow (DFG) layer
    DataFlow,
}

impl PassId {
    /// Human-readable pass name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SymbolResolution => "SymbolResolution",
            Self::EvaluationOrder => "EvaluationOrder",
            Self::DataFlow => "DataFlow",
        }
    }
}

impl fmt::Display for PassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scheduling constraints of one pass.
#[derive(Debug, Clone)]
pub struct PassDescriptor {
    pub id: PassId,
    /// Must run before this pass; auto-inserted into the pipeline if absent.
    pub hard_dependencies: Vec<PassId>,
    /// Ordered before this pass only if present in the pipeline.
    pub soft_dependencies: Vec<PassId>,
    /// This pass runs before the listed ones, if they are present.
    pub execute_before: Vec<PassId>,
    /// At most one pass in a pipeline may carry this marker.
    pub execute_first: bool,
    /// At most one pass in a pipeline may carry this marker.
    pub execute_last: bool,
}

impl PassDescriptor {
    pub fn new(id: PassId) -> Self {
        Self {
            id,
            hard_dependencies: Vec::new(),
            soft_dependencies: Vec::new(),
            execute_before: Vec::new(),
            execute_first: false,
            execute_last: false,
        }
    }

    pub fn depends_on(mut self, id: PassId) -> Self {
        self.hard_dependencies.push(id);
        self
    }

    pub fn soft_depends_on(mut self, id: PassId) -> Self {
        self.soft_dependencies.push(id);
        self
    }

    pub fn before(mut self, id: PassId) -> Self {
        self.execute_before.push(id);
        self
    }

    pub fn first(mut self) -> Self {
        self.execute_first = true;
        self
    }

    pub fn last(mut self) -> Self {
        self.execute_last = true;
        self
    }
}

/// One analysis pass over the translation result.
pub trait Pass: Send {
    fn descriptor(&self) -> PassDescriptor;

    /// Runs the pass over the result, mutating the graph in place.
    fn accept(&mut self, result: &mut TranslationResult, context: &TranslationContext)
        -> Result<()>;

    /// Resource teardown; always called once the pipeline finishes, whether
    /// it succeeded or not.
    fn cleanup(&mut self) {}
}
