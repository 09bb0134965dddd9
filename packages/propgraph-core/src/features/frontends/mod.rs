//! Frontend contract
//!
//! A language frontend maps one concrete source file onto graph nodes. The
//! core treats frontends as opaque: it selects one by file extension and
//! calls [`LanguageFrontend::parse`]. Per-language implementations live
//! outside this crate; [`fixture`] ships a small line-based frontend used by
//! the integration tests.

pub mod fixture;

use crate::errors::Result;
use crate::features::scopes::ScopeManager;
use crate::graph::{NodeId, PropertyGraph};
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Run-scoped parsing options the orchestrator derives from the
/// configuration and hands to every frontend.
#[derive(Debug, Clone, Default)]
pub struct FrontendOptions {
    /// Follow include directives into the referenced files.
    pub load_includes: bool,
    /// Search paths for resolving relative include targets.
    pub include_paths: Vec<PathBuf>,
    /// If non-empty, only includes under these paths are loaded.
    pub include_allowlist: Vec<PathBuf>,
    /// Includes under these paths are never loaded.
    pub include_blocklist: Vec<PathBuf>,
    /// Attach source comments to the closest following node.
    pub match_comments_to_nodes: bool,
}

impl FrontendOptions {
    /// Whether `path` passes the include allow/block lists.
    pub fn include_allowed(&self, path: &Path) -> bool {
        if self
            .include_blocklist
            .iter()
            .any(|blocked| path.starts_with(blocked))
        {
            return false;
        }
        if !self.include_allowlist.is_empty()
            && !self
                .include_allowlist
                .iter()
                .any(|allowed| path.starts_with(allowed))
        {
            return false;
        }
        true
    }

    /// Resolves an include target against the including file's directory,
    /// then the configured include paths.
    pub fn resolve_include(&self, from: &Path, target: &str) -> Option<PathBuf> {
        let candidates = from
            .parent()
            .into_iter()
            .map(Path::to_path_buf)
            .chain(self.include_paths.iter().cloned());
        for dir in candidates {
            let candidate = dir.join(target);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

/// Per-language parser contract.
///
/// `parse` builds the AST of one file into `graph` (via the construction
/// API) and returns the translation unit root. Implementations register
/// declarations in `scopes` as they go.
pub trait LanguageFrontend: Send {
    /// Human-readable frontend name.
    fn name(&self) -> &'static str;

    /// File extensions (without dot) this frontend handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether this frontend may run in a parallel parsing task.
    fn supports_parallel_parsing(&self) -> bool {
        true
    }

    /// Type names this frontend registered while parsing; the orchestrator
    /// reactivates them per translation unit after a parallel parse.
    fn registered_types(&self) -> Vec<String> {
        Vec::new()
    }

    fn parse(
        &mut self,
        path: &Path,
        options: &FrontendOptions,
        graph: &mut PropertyGraph,
        scopes: &mut ScopeManager,
    ) -> Result<NodeId>;

    /// Resource teardown; always called at the end of a run.
    fn cleanup(&mut self) {}
}

/// Factory creating a fresh frontend instance (one per file in parallel
/// mode, so frontends never share mutable state across tasks).
pub type FrontendFactory = Arc<dyn Fn() -> Box<dyn LanguageFrontend> + Send + Sync>;

/// Extension → frontend factory mapping.
#[derive(Clone, Default)]
pub struct FrontendRegistry {
    by_extension: AHashMap<String, FrontendFactory>,
}

impl FrontendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for every extension its frontend declares.
    pub fn register<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn LanguageFrontend> + Send + Sync + 'static,
    {
        let factory: FrontendFactory = Arc::new(factory);
        for ext in factory().extensions() {
            self.by_extension.insert(ext.to_string(), factory.clone());
        }
    }

    /// Creates a fresh frontend for `path`, if its extension is known.
    pub fn frontend_for(&self, path: &Path) -> Option<Box<dyn LanguageFrontend>> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.by_extension.get(&ext).map(|f| f())
    }

    pub fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.by_extension.contains_key(&e.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.by_extension.is_empty()
    }
}

impl std::fmt::Debug for FrontendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontendRegistry")
            .field("extensions", &self.by_extension.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::FixtureFrontend;
    use super::*;

    #[test]
    fn test_registry_dispatch_by_extension() {
        let mut registry = FrontendRegistry::new();
        registry.register(|| Box::new(FixtureFrontend::new()));

        assert!(registry.handles(Path::new("a.sim")));
        assert!(registry.handles(Path::new("A.SIM")));
        assert!(!registry.handles(Path::new("a.py")));
        assert!(registry.frontend_for(Path::new("a.sim")).is_some());
        assert!(registry.frontend_for(Path::new("noext")).is_none());
    }
}
