//! Evaluation order (EOG) pass
//!
//! Builds the control-flow layer by a structural walk over each translation
//! unit. Every node is wired as (entry, exits): expressions chain their
//! children in evaluation order before the node itself, branching statements
//! emit branch-tagged successor edges, loops close a back edge onto their
//! condition.

use crate::errors::Result;
use crate::graph::{NodeId, NodeKind, PropertyGraph};
use crate::pipeline::context::TranslationContext;
use crate::pipeline::pass::{Pass, PassDescriptor, PassId};
use crate::pipeline::result::TranslationResult;
use tracing::debug;

/// Dangling exit points of a wired subtree, with the branch tag their
/// outgoing edge must carry.
type Exits = Vec<(NodeId, Option<bool>)>;

#[derive(Debug, Default)]
pub struct EvaluationOrderPass;

impl EvaluationOrderPass {
    pub fn new() -> Self {
        Self
    }

    fn connect(&self, graph: &mut PropertyGraph, from: NodeId, branch: Option<bool>, to: NodeId) -> Result<()> {
        let index = graph.eog_successors(from).len() as u32;
        graph.add_eog_edge(from, to, branch, index)
    }

    fn connect_all(&self, graph: &mut PropertyGraph, exits: &Exits, to: NodeId) -> Result<()> {
        for &(from, branch) in exits {
            self.connect(graph, from, branch, to)?;
        }
        Ok(())
    }

    /// Wires the subtree below `node` and returns its entry node plus its
    /// dangling exits.
    fn wire(&self, graph: &mut PropertyGraph, node: NodeId) -> Result<(NodeId, Exits)> {
        let kind = graph.node(node).kind.clone();
        match kind {
            // containers enter through themselves and chain their statements
            NodeKind::TranslationUnit | NodeKind::Block => {
                let mut prev: Exits = vec![(node, None)];
                for child in graph.ast_children(node).to_vec() {
                    let (entry, exits) = self.wire(graph, child)?;
                    self.connect_all(graph, &prev, entry)?;
                    prev = exits;
                }
                Ok((node, prev))
            }
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                let (cond_entry, cond_exits) = self.wire(graph, condition)?;
                self.connect(graph, node, None, cond_entry)?;

                let (then_entry, then_exits) = self.wire(graph, then_branch)?;
                for &(from, _) in &cond_exits {
                    self.connect(graph, from, Some(true), then_entry)?;
                }

                let mut exits = then_exits;
                match else_branch {
                    Some(else_branch) => {
                        let (else_entry, else_exits) = self.wire(graph, else_branch)?;
                        for &(from, _) in &cond_exits {
                            self.connect(graph, from, Some(false), else_entry)?;
                        }
                        exits.extend(else_exits);
                    }
                    None => {
                        exits.extend(cond_exits.iter().map(|&(from, _)| (from, Some(false))));
                    }
                }
                Ok((node, exits))
            }
            NodeKind::ForStatement {
                initializer,
                condition,
                iteration,
                body,
            } => {
                let mut prev: Exits = vec![(node, None)];
                if let Some(initializer) = initializer {
                    let (entry, exits) = self.wire(graph, initializer)?;
                    self.connect_all(graph, &prev, entry)?;
                    prev = exits;
                }

                let cond = match condition {
                    Some(condition) => {
                        let (entry, exits) = self.wire(graph, condition)?;
                        self.connect_all(graph, &prev, entry)?;
                        Some((entry, exits))
                    }
                    None => None,
                };

                let (body_entry, body_exits) = self.wire(graph, body)?;
                match &cond {
                    Some((_, cond_exits)) => {
                        for &(from, _) in cond_exits {
                            self.connect(graph, from, Some(true), body_entry)?;
                        }
                    }
                    None => self.connect_all(graph, &prev, body_entry)?,
                }

                let mut back = body_exits;
                if let Some(iteration) = iteration {
                    let (entry, exits) = self.wire(graph, iteration)?;
                    self.connect_all(graph, &back, entry)?;
                    back = exits;
                }
                // close the loop onto the condition (or the body, if there
                // is none)
                let loop_head = cond.as_ref().map(|(entry, _)| *entry).unwrap_or(body_entry);
                self.connect_all(graph, &back, loop_head)?;

                // a condition-less loop never exits structurally
                let exits = match cond {
                    Some((_, cond_exits)) => cond_exits
                        .into_iter()
                        .map(|(from, _)| (from, Some(false)))
                        .collect(),
                    None => Vec::new(),
                };
                Ok((node, exits))
            }
            // returns are terminal: no dangling exits
            NodeKind::ReturnStatement { value } => {
                let mut prev: Exits = Vec::new();
                let mut entry = node;
                if let Some(value) = value {
                    let (value_entry, value_exits) = self.wire(graph, value)?;
                    entry = value_entry;
                    prev = value_exits;
                }
                self.connect_all(graph, &prev, node)?;
                Ok((entry, Vec::new()))
            }
            // everything else evaluates its children left to right, then
            // itself
            _ => {
                let mut entry = node;
                let mut prev: Exits = Vec::new();
                for child in graph.ast_children(node).to_vec() {
                    let (child_entry, child_exits) = self.wire(graph, child)?;
                    if prev.is_empty() && entry == node {
                        entry = child_entry;
                    } else {
                        self.connect_all(graph, &prev, child_entry)?;
                    }
                    prev = child_exits;
                }
                self.connect_all(graph, &prev, node)?;
                Ok((entry, vec![(node, None)]))
            }
        }
    }
}

impl Pass for EvaluationOrderPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(PassId::EvaluationOrder).depends_on(PassId::SymbolResolution)
    }

    fn accept(
        &mut self,
        result: &mut TranslationResult,
        _context: &TranslationContext,
    ) -> Result<()> {
        let roots: Vec<NodeId> = result.translation_units().map(|tu| tu.root).collect();
        for root in roots {
            let (_, exits) = self.wire(&mut result.graph, root)?;
            // close dangling exits onto the unit, so a trailing branch still
            // carries both of its tagged edges
            for &(from, branch) in &exits {
                if from != root {
                    self.connect(&mut result.graph, from, branch, root)?;
                }
            }
        }
        debug!(edges = result.graph.eog_edge_count(), "evaluation order built");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::value_evaluation::Value;
    use crate::graph::{AccessKind, BinaryOp, UnaryOp};
    use crate::pipeline::context::CancellationToken;
    use crate::pipeline::result::TranslationUnit;

    fn run(result: &mut TranslationResult) {
        let context = TranslationContext::new(Default::default(), CancellationToken::new());
        EvaluationOrderPass::new().accept(result, &context).unwrap();
    }

    fn add_unit(result: &mut TranslationResult, root: NodeId) {
        result.component_mut("application").translation_units.push(TranslationUnit {
            name: "test".into(),
            path: "test".into(),
            root,
            types: vec![],
        });
    }

    #[test]
    fn test_if_statement_gets_branch_tagged_edges() {
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let two = g.literal(Value::Int(2));
        let three = g.literal(Value::Int(3));
        let cond = g.binary_op(BinaryOp::Lt, two, three).unwrap();
        let then_branch = g.block();
        let else_branch = g.block();
        let if_stmt = g.if_statement(cond, then_branch, Some(else_branch)).unwrap();
        g.append_statement(tu, if_stmt).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        let successors = result.graph.eog_successors(cond);
        let branches: Vec<Option<bool>> = successors.iter().map(|(_, p)| p.branch).collect();
        assert!(branches.contains(&Some(true)));
        assert!(branches.contains(&Some(false)));
        // operands evaluate before the operator
        assert!(result
            .graph
            .eog_successors(two)
            .iter()
            .any(|&(to, _)| to == three));
        assert!(result
            .graph
            .eog_successors(three)
            .iter()
            .any(|&(to, _)| to == cond));
    }

    #[test]
    fn test_trailing_branch_keeps_both_tagged_edges() {
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let two = g.literal(Value::Int(2));
        let three = g.literal(Value::Int(3));
        let cond = g.binary_op(BinaryOp::Lt, two, three).unwrap();
        let then_branch = g.block();
        let if_stmt = g.if_statement(cond, then_branch, None).unwrap();
        g.append_statement(tu, if_stmt).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        // with no following statement, the false edge closes onto the unit
        let successors = result.graph.eog_successors(cond);
        assert_eq!(successors.len(), 2);
        assert!(successors
            .iter()
            .any(|&(to, p)| p.branch == Some(true) && to == then_branch));
        assert!(successors
            .iter()
            .any(|&(to, p)| p.branch == Some(false) && to == tu));
    }

    #[test]
    fn test_for_loop_closes_a_back_edge() {
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let zero = g.literal(Value::Int(0));
        let decl = g.variable_declaration("i", Some(zero)).unwrap();
        let init = g.declaration_statement(vec![decl]).unwrap();
        let cond_ref = g.reference("i", Some(decl), AccessKind::Read);
        let three = g.literal(Value::Int(3));
        let cond = g.binary_op(BinaryOp::Lt, cond_ref, three).unwrap();
        let step_ref = g.reference("i", Some(decl), AccessKind::ReadWrite);
        let step = g.unary_op(UnaryOp::Increment, step_ref).unwrap();
        let body = g.block();
        let for_stmt = g
            .for_statement(Some(init), Some(cond), Some(step), body)
            .unwrap();
        g.append_statement(tu, for_stmt).unwrap();
        let after_ref = g.reference("i", Some(decl), AccessKind::Read);
        let after = g.call("print", vec![after_ref]).unwrap();
        g.append_statement(tu, after).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        // the iteration step flows back into the condition's entry
        assert!(result
            .graph
            .eog_successors(step)
            .iter()
            .any(|&(to, _)| to == cond_ref));
        // the condition leaves the loop on false, towards the next statement
        assert!(result
            .graph
            .eog_successors(cond)
            .iter()
            .any(|&(to, p)| p.branch == Some(false) && to == after_ref));
    }
}
