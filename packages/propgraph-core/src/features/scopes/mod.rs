//! Scope & resolution service
//!
//! Tracks nested scopes during AST construction and lets frontends and
//! passes register and resolve named declarations. In parallel parsing mode
//! every file gets a private [`ScopeManager`]; the orchestrator merges them
//! into the root manager in file order afterwards.

mod scope_manager;

pub use scope_manager::{Scope, ScopeManager};
