//! Translation orchestrator
//!
//! Drives one analysis run end to end: source expansion, optional unity
//! build, frontend dispatch (parallel or sequential), scope/type merging,
//! and the scheduled pass pipeline. Cancellation is cooperative and polled
//! at phase and pass boundaries; teardown always runs.

use super::context::{CancellationToken, TranslationContext};
use super::result::{TranslationResult, TranslationUnit};
use super::scheduler::order_passes;
use crate::config::TranslationConfiguration;
use crate::errors::{PropGraphError, Result};
use crate::features::frontends::{FrontendOptions, LanguageFrontend};
use crate::features::scopes::ScopeManager;
use crate::graph::{NodeId, PropertyGraph};
use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Entry point of the library: configure, then `analyze()`.
#[derive(Debug)]
pub struct TranslationManager {
    config: TranslationConfiguration,
}

impl TranslationManager {
    pub fn builder() -> TranslationManagerBuilder {
        TranslationManagerBuilder::default()
    }

    /// Starts the analysis on a worker thread and returns a handle to await
    /// or cancel it.
    pub fn analyze(self) -> AnalysisHandle {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let handle = thread::spawn(move || run_analysis(self.config, worker_token));
        AnalysisHandle { handle, token }
    }

    /// Runs the analysis on the calling thread.
    pub fn analyze_blocking(self) -> Result<TranslationResult> {
        run_analysis(self.config, CancellationToken::new())
    }
}

#[derive(Debug, Default)]
pub struct TranslationManagerBuilder {
    config: Option<TranslationConfiguration>,
}

impl TranslationManagerBuilder {
    pub fn config(mut self, config: TranslationConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<TranslationManager> {
        let config = self
            .config
            .ok_or_else(|| PropGraphError::config("translation manager needs a configuration"))?;
        Ok(TranslationManager { config })
    }
}

/// Handle to a running analysis.
pub struct AnalysisHandle {
    handle: thread::JoinHandle<Result<TranslationResult>>,
    token: CancellationToken,
}

impl AnalysisHandle {
    /// Requests cooperative cancellation; the run stops at the next phase or
    /// pass boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the run to finish.
    pub fn join(self) -> Result<TranslationResult> {
        self.handle
            .join()
            .map_err(|_| PropGraphError::internal("analysis thread panicked"))?
    }
}

fn run_analysis(
    config: TranslationConfiguration,
    token: CancellationToken,
) -> Result<TranslationResult> {
    let started = Instant::now();
    let context = TranslationContext::new(config, token);
    let mut result = TranslationResult::new();

    let outcome = run_phases(&context, &mut result);

    // teardown always runs, success or failure
    if !context.config.retain_type_cache {
        context.type_state.clear();
    }
    outcome?;

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        nodes = result.graph.len(),
        "analysis finished"
    );
    Ok(result)
}

fn run_phases(context: &TranslationContext, result: &mut TranslationResult) -> Result<()> {
    if context.token.is_cancelled() {
        return Err(PropGraphError::Cancelled);
    }

    let options = context.config.frontend_options();
    let files = expand_sources(context)?;
    // keep the synthetic unity file alive until parsing is done
    let (files, _unity_guard) = apply_unity_build(context, &options, files)?;
    debug!(files = files.len(), "sources resolved");

    if use_parallel(context, &files) {
        parse_parallel(context, &options, result, &files)?;
    } else {
        parse_sequential(context, &options, result, &files)?;
    }

    if context.token.is_cancelled() {
        return Err(PropGraphError::Cancelled);
    }
    run_passes(context, result)
}

// ── Source resolution ──────────────────────────────────────────────

fn expand_sources(context: &TranslationContext) -> Result<Vec<PathBuf>> {
    let config = &context.config;
    let mut files = Vec::new();
    for location in &config.source_locations {
        if location.is_dir() {
            for entry in WalkDir::new(location).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    PropGraphError::internal(format!(
                        "cannot walk {}: {e}",
                        location.display()
                    ))
                })?;
                if entry.file_type().is_file() && config.frontends.handles(entry.path()) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(location.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Replaces unity-eligible files by one synthetic translation unit made of
/// textual `#include` lines. The temp file lives as long as the returned
/// guard.
fn apply_unity_build(
    context: &TranslationContext,
    options: &FrontendOptions,
    files: Vec<PathBuf>,
) -> Result<(Vec<PathBuf>, Option<tempfile::TempPath>)> {
    let config = &context.config;
    if !config.use_unity_build {
        return Ok((files, None));
    }
    let (eligible, mut rest): (Vec<PathBuf>, Vec<PathBuf>) = files
        .into_iter()
        .partition(|f| is_unity_eligible(config, f) && options.include_allowed(f));
    if eligible.is_empty() {
        return Ok((rest, None));
    }

    let extension = eligible[0]
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("c")
        .to_string();
    let mut file = tempfile::Builder::new()
        .prefix("unity_")
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    for path in &eligible {
        writeln!(file, "#include \"{}\"", path.display())?;
    }
    file.flush()?;
    info!(merged = eligible.len(), "unity build synthesized one translation unit");

    let guard = file.into_temp_path();
    rest.push(guard.to_path_buf());
    Ok((rest, Some(guard)))
}

fn is_unity_eligible(config: &TranslationConfiguration, path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_lowercase();
            config.unity_build_extensions.iter().any(|u| *u == e)
        })
        .unwrap_or(false)
}

// ── Parsing ────────────────────────────────────────────────────────

fn use_parallel(context: &TranslationContext, files: &[PathBuf]) -> bool {
    if !context.config.use_parallel_frontends {
        return false;
    }
    // a frontend that cannot run in parallel forces the whole run back to
    // sequential parsing so file order stays deterministic
    let all_support = files.iter().all(|f| {
        context
            .config
            .frontends
            .frontend_for(f)
            .map(|frontend| frontend.supports_parallel_parsing())
            .unwrap_or(true)
    });
    if !all_support {
        info!("a frontend does not support parallel parsing, falling back to sequential");
    }
    all_support
}

struct ParsedUnit {
    graph: PropertyGraph,
    scopes: ScopeManager,
    root: NodeId,
    types: Vec<String>,
}

fn parse_sequential(
    context: &TranslationContext,
    options: &FrontendOptions,
    result: &mut TranslationResult,
    files: &[PathBuf],
) -> Result<()> {
    for file in files {
        if context.token.is_cancelled() {
            return Err(PropGraphError::Cancelled);
        }
        let Some(mut frontend) = frontend_for(context, file)? else {
            continue;
        };
        debug!(file = %file.display(), frontend = frontend.name(), "parsing");
        let parsed = frontend.parse(file, options, &mut result.graph, &mut result.scopes);
        let types = frontend.registered_types();
        frontend.cleanup();
        match parsed {
            Ok(root) => {
                for name in &types {
                    context.type_state.record_type(name);
                }
                push_unit(context, result, file, root, types);
            }
            Err(e) => handle_parse_error(context, file, e)?,
        }
    }
    Ok(())
}

fn parse_parallel(
    context: &TranslationContext,
    options: &FrontendOptions,
    result: &mut TranslationResult,
    files: &[PathBuf],
) -> Result<()> {
    // per-file tasks must not race on shared type registrations
    context.type_state.suppress();
    let parsed: Vec<(PathBuf, Result<Option<ParsedUnit>>)> = files
        .par_iter()
        .map(|file| (file.clone(), parse_one(context, options, file)))
        .collect();
    context.type_state.activate();

    if context.token.is_cancelled() {
        return Err(PropGraphError::Cancelled);
    }

    // merge in file order: node ids are offset into the shared arena, scope
    // conflicts resolve first-wins
    for (file, outcome) in parsed {
        match outcome {
            Ok(Some(unit)) => {
                let delta = result.graph.absorb(unit.graph);
                let mut scopes = unit.scopes;
                scopes.offset_ids(delta);
                result.scopes.merge_from([scopes]);
                for name in &unit.types {
                    context.type_state.record_type(name);
                }
                push_unit(context, result, &file, unit.root.offset(delta), unit.types);
            }
            Ok(None) => {}
            Err(e) => handle_parse_error(context, &file, e)?,
        }
    }
    Ok(())
}

fn parse_one(
    context: &TranslationContext,
    options: &FrontendOptions,
    file: &Path,
) -> Result<Option<ParsedUnit>> {
    let Some(mut frontend) = frontend_for(context, file)? else {
        return Ok(None);
    };
    let mut graph = PropertyGraph::new();
    let mut scopes = ScopeManager::new();
    debug!(file = %file.display(), frontend = frontend.name(), "parsing (parallel)");
    let parsed = frontend.parse(file, options, &mut graph, &mut scopes);
    let types = frontend.registered_types();
    frontend.cleanup();
    let root = parsed?;
    Ok(Some(ParsedUnit {
        graph,
        scopes,
        root,
        types,
    }))
}

fn frontend_for(
    context: &TranslationContext,
    file: &Path,
) -> Result<Option<Box<dyn LanguageFrontend>>> {
    match context.config.frontends.frontend_for(file) {
        Some(frontend) => Ok(Some(frontend)),
        None if context.config.fail_on_error => Err(PropGraphError::config(format!(
            "no frontend registered for {}",
            file.display()
        ))),
        None => {
            warn!(file = %file.display(), "no frontend registered, skipping");
            Ok(None)
        }
    }
}

fn handle_parse_error(
    context: &TranslationContext,
    file: &Path,
    error: PropGraphError,
) -> Result<()> {
    if context.config.fail_on_error {
        return Err(error);
    }
    warn!(file = %file.display(), %error, "parse failed, skipping file");
    Ok(())
}

fn push_unit(
    context: &TranslationContext,
    result: &mut TranslationResult,
    file: &Path,
    root: NodeId,
    types: Vec<String>,
) {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    result
        .component_mut(&context.config.component_name)
        .translation_units
        .push(TranslationUnit {
            name,
            path: file.to_path_buf(),
            root,
            types,
        });
}

// ── Pass execution ─────────────────────────────────────────────────

fn run_passes(context: &TranslationContext, result: &mut TranslationResult) -> Result<()> {
    let requested = context.config.effective_passes();
    let mut passes = order_passes(&requested, &context.config.pass_registry)?;

    let mut outcome = Ok(());
    for pass in &mut passes {
        if context.token.is_cancelled() {
            outcome = Err(PropGraphError::Cancelled);
            break;
        }
        let id = pass.descriptor().id;
        let pass_started = Instant::now();
        info!(pass = %id, "running pass");
        match pass.accept(result, context) {
            Ok(()) => result.record_benchmark(id, pass_started.elapsed()),
            Err(error) => {
                warn!(pass = %id, %error, "pass failed, aborting remaining passes");
                outcome = Err(error);
                break;
            }
        }
    }
    // cleanup hooks run for every instantiated pass, success or failure
    for pass in &mut passes {
        pass.cleanup();
    }
    outcome
}
