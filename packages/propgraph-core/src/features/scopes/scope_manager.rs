//! Scope stack with named declaration tracking

use crate::graph::NodeId;
use ahash::AHashMap;
use tracing::debug;

/// One lexical scope: a name and the declarations registered in it.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub name: String,
    declarations: AHashMap<String, NodeId>,
}

impl Scope {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: AHashMap::new(),
        }
    }

    pub fn declaration(&self, name: &str) -> Option<NodeId> {
        self.declarations.get(name).copied()
    }
}

/// Scope stack for declaration registration and reference resolution.
#[derive(Debug, Clone, Default)]
pub struct ScopeManager {
    global: Scope,
    stack: Vec<Scope>,
}

impl ScopeManager {
    pub fn new() -> Self {
        Self {
            global: Scope::new("(global)"),
            stack: Vec::new(),
        }
    }

    /// Push a new scope.
    pub fn enter_scope(&mut self, name: impl Into<String>) {
        self.stack.push(Scope::new(name));
    }

    /// Pop the current scope.
    pub fn leave_scope(&mut self) -> Option<Scope> {
        self.stack.pop()
    }

    /// Name of the innermost scope, or the global scope.
    pub fn current_scope(&self) -> &Scope {
        self.stack.last().unwrap_or(&self.global)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Register a declaration in the current scope.
    pub fn add_declaration(&mut self, name: impl Into<String>, node: NodeId) {
        let name = name.into();
        let scope = self.stack.last_mut().unwrap_or(&mut self.global);
        if let Some(previous) = scope.declarations.insert(name.clone(), node) {
            debug!(
                scope = %scope.name,
                %name,
                %previous,
                "declaration shadows an earlier one in the same scope"
            );
        }
    }

    /// Resolve a name, innermost scope first, falling back to the global
    /// scope.
    pub fn resolve(&self, name: &str) -> Option<NodeId> {
        for scope in self.stack.iter().rev() {
            if let Some(id) = scope.declaration(name) {
                return Some(id);
            }
        }
        self.global.declaration(name)
    }

    /// Shifts every registered node id by `delta`. Applied before merging a
    /// per-file manager whose graph was absorbed into the shared arena.
    pub(crate) fn offset_ids(&mut self, delta: u32) {
        for scope in std::iter::once(&mut self.global).chain(self.stack.iter_mut()) {
            for id in scope.declarations.values_mut() {
                *id = id.offset(delta);
            }
        }
    }

    /// Merges the global declarations of per-file managers into this one,
    /// in the given (file) order. The first registration of a name wins;
    /// later ones are logged and dropped.
    pub fn merge_from(&mut self, others: impl IntoIterator<Item = ScopeManager>) {
        for other in others {
            for (name, id) in other.global.declarations {
                if self.global.declarations.contains_key(&name) {
                    debug!(%name, %id, "dropping conflicting declaration during scope merge");
                    continue;
                }
                self.global.declarations.insert(name, id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn id(n: u32) -> NodeId {
        NodeId(n)
    }

    #[test]
    fn test_resolution_is_innermost_first() {
        let mut scopes = ScopeManager::new();
        scopes.add_declaration("x", id(0));
        scopes.enter_scope("f");
        scopes.add_declaration("x", id(1));

        assert_eq!(scopes.resolve("x"), Some(id(1)));
        scopes.leave_scope();
        assert_eq!(scopes.resolve("x"), Some(id(0)));
        assert_eq!(scopes.resolve("y"), None);
    }

    #[test]
    fn test_current_scope() {
        let mut scopes = ScopeManager::new();
        assert_eq!(scopes.current_scope().name, "(global)");
        scopes.enter_scope("main");
        assert_eq!(scopes.current_scope().name, "main");
    }

    #[test]
    fn test_merge_preserves_file_order_first_wins() {
        let mut root = ScopeManager::new();

        let mut a = ScopeManager::new();
        a.add_declaration("shared", id(1));
        a.add_declaration("only_a", id(2));

        let mut b = ScopeManager::new();
        b.add_declaration("shared", id(10));
        b.add_declaration("only_b", id(11));

        root.merge_from([a, b]);
        assert_eq!(root.resolve("shared"), Some(id(1)));
        assert_eq!(root.resolve("only_a"), Some(id(2)));
        assert_eq!(root.resolve("only_b"), Some(id(11)));
    }

    #[test]
    fn test_offset_ids() {
        let mut scopes = ScopeManager::new();
        scopes.add_declaration("x", id(3));
        scopes.offset_ids(7);
        assert_eq!(scopes.resolve("x"), Some(id(10)));
    }
}
