//! Translation result
//!
//! Everything one analysis run produces: the graph arena, the merged scope
//! manager, the component/translation-unit inventory, per-pass benchmarks
//! and a concurrent scratch store passes may write into under
//! stage-qualified keys.

use super::pass::PassId;
use crate::features::scopes::ScopeManager;
use crate::graph::{NodeId, PropertyGraph};
use dashmap::DashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Timing record for one executed pass.
#[derive(Debug, Clone)]
pub struct BenchmarkRecord {
    pub pass: PassId,
    pub duration: Duration,
}

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub name: String,
    pub path: PathBuf,
    /// Root node of this unit's AST subtree
    pub root: NodeId,
    /// Type names the frontend registered while parsing this unit
    pub types: Vec<String>,
}

/// A named group of translation units (usually one per analyzed project).
#[derive(Debug, Clone, Default)]
pub struct Component {
    pub name: String,
    pub translation_units: Vec<TranslationUnit>,
}

/// The product of one analysis run.
#[derive(Debug, Default)]
pub struct TranslationResult {
    pub graph: PropertyGraph,
    pub scopes: ScopeManager,
    components: Vec<Component>,
    /// Concurrent scratch store; keys are qualified per pass
    scratch: DashMap<String, serde_json::Value>,
    pub benchmarks: Vec<BenchmarkRecord>,
}

impl TranslationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// The component named `name`, created on first use.
    pub fn component_mut(&mut self, name: &str) -> &mut Component {
        if let Some(idx) = self.components.iter().position(|c| c.name == name) {
            return &mut self.components[idx];
        }
        self.components.push(Component {
            name: name.to_string(),
            translation_units: Vec::new(),
        });
        self.components.last_mut().unwrap_or_else(|| unreachable!())
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// All translation units across components, in file order.
    pub fn translation_units(&self) -> impl Iterator<Item = &TranslationUnit> {
        self.components.iter().flat_map(|c| c.translation_units.iter())
    }

    // ── Scratch store ──────────────────────────────────────────────

    /// Writes a scratch value under a stage-qualified key.
    pub fn scratch_insert(&self, pass: PassId, key: &str, value: serde_json::Value) {
        self.scratch.insert(format!("{pass}:{key}"), value);
    }

    pub fn scratch_get(&self, pass: PassId, key: &str) -> Option<serde_json::Value> {
        self.scratch
            .get(&format!("{pass}:{key}"))
            .map(|v| v.clone())
    }

    pub fn record_benchmark(&mut self, pass: PassId, duration: Duration) {
        self.benchmarks.push(BenchmarkRecord { pass, duration });
    }
}
