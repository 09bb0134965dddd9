//! Symbol resolution pass
//!
//! Resolves references that frontends left dangling (forward references,
//! cross-file references in parallel mode) against the merged scope
//! manager.

use crate::errors::Result;
use crate::graph::NodeKind;
use crate::pipeline::context::TranslationContext;
use crate::pipeline::pass::{Pass, PassDescriptor, PassId};
use crate::pipeline::result::TranslationResult;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SymbolResolutionPass;

impl SymbolResolutionPass {
    pub fn new() -> Self {
        Self
    }
}

impl Pass for SymbolResolutionPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(PassId::SymbolResolution)
    }

    fn accept(
        &mut self,
        result: &mut TranslationResult,
        _context: &TranslationContext,
    ) -> Result<()> {
        let mut fixes = Vec::new();
        let mut unresolved = 0usize;
        for node in result.graph.nodes() {
            if let NodeKind::Reference { refers_to: None, .. } = node.kind {
                match result.scopes.resolve(&node.name) {
                    Some(declaration) => fixes.push((node.id, declaration)),
                    None => unresolved += 1,
                }
            }
        }
        let resolved = fixes.len();
        for (id, declaration) in fixes {
            if let NodeKind::Reference { refers_to, .. } = &mut result.graph.node_mut(id).kind {
                *refers_to = Some(declaration);
            }
        }
        debug!(resolved, unresolved, "symbol resolution finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::value_evaluation::Value;
    use crate::graph::AccessKind;
    use crate::pipeline::context::CancellationToken;

    #[test]
    fn test_dangling_references_are_resolved_by_name() {
        let mut result = TranslationResult::new();
        let lit = result.graph.literal(Value::Int(1));
        let decl = result.graph.variable_declaration("x", Some(lit)).unwrap();
        result.scopes.add_declaration("x", decl);

        let dangling = result.graph.reference("x", None, AccessKind::Read);
        let unknown = result.graph.reference("ghost", None, AccessKind::Read);

        let context = TranslationContext::new(Default::default(), CancellationToken::new());
        SymbolResolutionPass::new()
            .accept(&mut result, &context)
            .unwrap();

        assert!(matches!(
            result.graph.node(dangling).kind,
            NodeKind::Reference { refers_to: Some(d), .. } if d == decl
        ));
        assert!(matches!(
            result.graph.node(unknown).kind,
            NodeKind::Reference { refers_to: None, .. }
        ));
    }
}
