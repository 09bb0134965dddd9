//! Run-scoped analysis context
//!
//! One [`TranslationContext`] is created per analysis run and passed by
//! reference into frontends and passes. It owns what used to be process-wide
//! state: the type-activity flag with its type cache, and the cancellation
//! token. Nothing here outlives the run.

use crate::config::TranslationConfiguration;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, polled at pass boundaries.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Type registration state for one run.
///
/// The activity flag is suppressed while parallel frontends run, because
/// per-file tasks must not race on shared type registrations; the
/// orchestrator reactivates it after the merge and replays each translation
/// unit's types.
#[derive(Debug)]
pub struct TypeState {
    active: AtomicBool,
    types: DashMap<String, u32>,
}

impl Default for TypeState {
    fn default() -> Self {
        Self {
            active: AtomicBool::new(true),
            types: DashMap::new(),
        }
    }
}

impl TypeState {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn suppress(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn activate(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    /// Records a type registration; ignored while suppressed.
    pub fn record_type(&self, name: impl Into<String>) {
        if !self.is_active() {
            return;
        }
        *self.types.entry(name.into()).or_insert(0) += 1;
    }

    pub fn knows_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Drops all cached types; part of run teardown.
    pub fn clear(&self) {
        self.types.clear();
    }
}

/// Everything a pass or frontend may need besides the result itself.
#[derive(Debug)]
pub struct TranslationContext {
    pub config: TranslationConfiguration,
    pub type_state: TypeState,
    pub token: CancellationToken,
}

impl TranslationContext {
    pub fn new(config: TranslationConfiguration, token: CancellationToken) -> Self {
        Self {
            config,
            type_state: TypeState::default(),
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_type_state_suppression() {
        let state = TypeState::default();
        state.record_type("int");
        assert!(state.knows_type("int"));

        state.suppress();
        state.record_type("float");
        assert!(!state.knows_type("float"));

        state.activate();
        state.record_type("float");
        assert!(state.knows_type("float"));

        state.clear();
        assert_eq!(state.type_count(), 0);
    }
}
