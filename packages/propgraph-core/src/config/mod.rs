//! Translation configuration
//!
//! Builder-pattern configuration consumed by the orchestrator. The core only
//! reads these flags; parsing and validating caller input stays with the
//! caller.

use crate::features::frontends::{FrontendOptions, FrontendRegistry, LanguageFrontend};
use crate::pipeline::{Pass, PassId, PassRegistry};
use std::path::PathBuf;

/// File extensions eligible for unity-build concatenation by default.
const UNITY_BUILD_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx"];

/// Immutable configuration of one analysis run.
#[derive(Debug, Clone)]
pub struct TranslationConfiguration {
    /// Files or directories to analyze; directories are expanded recursively.
    pub source_locations: Vec<PathBuf>,
    /// Component name the parsed translation units are grouped under.
    pub component_name: String,
    /// Abort the whole run on the first parse error instead of dropping the
    /// failing file.
    pub fail_on_error: bool,
    /// Parse files in parallel, one task per file.
    pub use_parallel_frontends: bool,
    /// Concatenate eligible files into one synthetic translation unit of
    /// `#include` lines before dispatch.
    pub use_unity_build: bool,
    /// Extensions eligible for the unity build.
    pub unity_build_extensions: Vec<String>,
    /// Follow `#include` lines into headers.
    pub load_includes: bool,
    /// If non-empty, only includes under these paths are loaded.
    pub include_allowlist: Vec<PathBuf>,
    /// Includes under these paths are never loaded.
    pub include_blocklist: Vec<PathBuf>,
    /// Additional include search paths handed to frontends.
    pub include_paths: Vec<PathBuf>,
    /// Attach source comments to their closest nodes while parsing.
    pub match_comments_to_nodes: bool,
    /// Keep the run's type cache alive at teardown (tests only).
    pub retain_type_cache: bool,
    /// Passes to run; hard dependencies are pulled in automatically. Empty
    /// means the default pipeline.
    pub requested_passes: Vec<PassId>,
    pub frontends: FrontendRegistry,
    pub pass_registry: PassRegistry,
}

impl Default for TranslationConfiguration {
    fn default() -> Self {
        Self {
            source_locations: Vec::new(),
            component_name: "application".to_string(),
            fail_on_error: false,
            use_parallel_frontends: false,
            use_unity_build: false,
            unity_build_extensions: UNITY_BUILD_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            load_includes: false,
            include_allowlist: Vec::new(),
            include_blocklist: Vec::new(),
            include_paths: Vec::new(),
            match_comments_to_nodes: false,
            retain_type_cache: false,
            requested_passes: Vec::new(),
            frontends: FrontendRegistry::new(),
            pass_registry: PassRegistry::with_defaults(),
        }
    }
}

impl TranslationConfiguration {
    pub fn builder() -> TranslationConfigurationBuilder {
        TranslationConfigurationBuilder::default()
    }

    /// The parsing options handed to every frontend.
    pub fn frontend_options(&self) -> FrontendOptions {
        FrontendOptions {
            load_includes: self.load_includes,
            include_paths: self.include_paths.clone(),
            include_allowlist: self.include_allowlist.clone(),
            include_blocklist: self.include_blocklist.clone(),
            match_comments_to_nodes: self.match_comments_to_nodes,
        }
    }

    /// The passes to schedule: the requested ones, or the default pipeline.
    pub fn effective_passes(&self) -> Vec<PassId> {
        if self.requested_passes.is_empty() {
            vec![PassId::DataFlow]
        } else {
            self.requested_passes.clone()
        }
    }
}

#[derive(Debug, Default)]
pub struct TranslationConfigurationBuilder {
    config: TranslationConfiguration,
}

impl TranslationConfigurationBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source_locations.push(path.into());
        self
    }

    pub fn source_locations(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config.source_locations.extend(paths);
        self
    }

    pub fn component_name(mut self, name: impl Into<String>) -> Self {
        self.config.component_name = name.into();
        self
    }

    pub fn fail_on_error(mut self, value: bool) -> Self {
        self.config.fail_on_error = value;
        self
    }

    pub fn use_parallel_frontends(mut self, value: bool) -> Self {
        self.config.use_parallel_frontends = value;
        self
    }

    pub fn use_unity_build(mut self, value: bool) -> Self {
        self.config.use_unity_build = value;
        self
    }

    pub fn unity_build_extensions(
        mut self,
        extensions: impl IntoIterator<Item = String>,
    ) -> Self {
        self.config.unity_build_extensions = extensions.into_iter().collect();
        self
    }

    pub fn load_includes(mut self, value: bool) -> Self {
        self.config.load_includes = value;
        self
    }

    pub fn include_allowlist(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.include_allowlist.push(path.into());
        self
    }

    pub fn include_blocklist(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.include_blocklist.push(path.into());
        self
    }

    pub fn include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.include_paths.push(path.into());
        self
    }

    pub fn match_comments_to_nodes(mut self, value: bool) -> Self {
        self.config.match_comments_to_nodes = value;
        self
    }

    pub fn retain_type_cache(mut self, value: bool) -> Self {
        self.config.retain_type_cache = value;
        self
    }

    /// Requests a pass; its hard dependencies are scheduled automatically.
    pub fn register_pass(mut self, id: PassId) -> Self {
        if !self.config.requested_passes.contains(&id) {
            self.config.requested_passes.push(id);
        }
        self
    }

    /// Registers (or replaces) a pass implementation.
    pub fn register_pass_implementation<F>(mut self, id: PassId, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Pass> + Send + Sync + 'static,
    {
        self.config.pass_registry.register(id, factory);
        self
    }

    pub fn register_frontend<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn LanguageFrontend> + Send + Sync + 'static,
    {
        self.config.frontends.register(factory);
        self
    }

    pub fn build(self) -> TranslationConfiguration {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::frontends::fixture::FixtureFrontend;

    #[test]
    fn test_builder_round_trip() {
        let config = TranslationConfiguration::builder()
            .source("src/a.sim")
            .fail_on_error(true)
            .use_parallel_frontends(true)
            .register_pass(PassId::DataFlow)
            .register_pass(PassId::DataFlow)
            .register_frontend(|| Box::new(FixtureFrontend::new()))
            .build();

        assert_eq!(config.source_locations.len(), 1);
        assert!(config.fail_on_error);
        assert!(config.use_parallel_frontends);
        assert_eq!(config.requested_passes, vec![PassId::DataFlow]);
        assert!(config.frontends.handles(std::path::Path::new("a.sim")));
    }

    #[test]
    fn test_default_pipeline_when_nothing_requested() {
        let config = TranslationConfiguration::default();
        assert_eq!(config.effective_passes(), vec![PassId::DataFlow]);
    }
}
