//! Pass registry
//!
//! Explicit factory table mapping a [`PassId`] to its implementation. The
//! scheduler consults it to instantiate passes, including hard dependencies
//! the caller did not request.

use super::pass::{Pass, PassId};
use super::passes::{DataFlowPass, EvaluationOrderPass, SymbolResolutionPass};
use crate::errors::{PropGraphError, Result};
use ahash::AHashMap;
use std::sync::Arc;

/// Factory creating a fresh pass instance.
pub type PassFactory = Arc<dyn Fn() -> Box<dyn Pass> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PassRegistry {
    factories: AHashMap<PassId, PassFactory>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the in-core passes registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PassId::SymbolResolution, || {
            Box::new(SymbolResolutionPass::new())
        });
        registry.register(PassId::EvaluationOrder, || {
            Box::new(EvaluationOrderPass::new())
        });
        registry.register(PassId::DataFlow, || Box::new(DataFlowPass::new()));
        registry
    }

    /// Registers (or replaces) the factory for `id`.
    pub fn register<F>(&mut self, id: PassId, factory: F)
    where
        F: Fn() -> Box<dyn Pass> + Send + Sync + 'static,
    {
        self.factories.insert(id, Arc::new(factory));
    }

    pub fn contains(&self, id: PassId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Instantiates the pass registered for `id`.
    pub fn instantiate(&self, id: PassId) -> Result<Box<dyn Pass>> {
        self.factories
            .get(&id)
            .map(|f| f())
            .ok_or_else(|| PropGraphError::config(format!("no pass registered for {id}")))
    }
}

impl std::fmt::Debug for PassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassRegistry")
            .field("passes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
