//! Data flow (DFG) pass
//!
//! Builds the data-flow layer with a structural reaching-definitions walk:
//! reads are wired to the writes that may reach them, so join points end up
//! with one incoming edge per merging branch and loop bodies see both the
//! initializer's write and the iteration step's write-back. Compound
//! assignments and `++`/`--` get their self-defining edge in both directions
//! (operand into the operation, operation back onto the operand), which is
//! exactly what the evaluator's self-reference filter keys on.

use crate::errors::Result;
use crate::graph::{AssignOperator, NodeId, NodeKind, PropertyGraph, UnaryOp};
use crate::pipeline::context::TranslationContext;
use crate::pipeline::pass::{Pass, PassDescriptor, PassId};
use crate::pipeline::result::TranslationResult;
use ahash::AHashMap;
use tracing::debug;

/// Declaration → the writes that currently reach this program point.
#[derive(Debug, Clone, Default)]
struct Definitions {
    reaching: AHashMap<NodeId, Vec<NodeId>>,
}

impl Definitions {
    fn read(&self, declaration: NodeId) -> Option<&[NodeId]> {
        self.reaching.get(&declaration).map(|v| v.as_slice())
    }

    fn write(&mut self, declaration: NodeId, def: NodeId) {
        self.reaching.insert(declaration, vec![def]);
    }

    /// Union with another branch's state; a declaration defined in either
    /// branch keeps all candidate writes.
    fn merge(&mut self, other: &Definitions) {
        for (&declaration, defs) in &other.reaching {
            let slot = self.reaching.entry(declaration).or_default();
            for &def in defs {
                if !slot.contains(&def) {
                    slot.push(def);
                }
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct DataFlowPass;

impl DataFlowPass {
    pub fn new() -> Self {
        Self
    }

    fn process_statement(
        &self,
        graph: &mut PropertyGraph,
        node: NodeId,
        defs: &mut Definitions,
    ) -> Result<()> {
        let kind = graph.node(node).kind.clone();
        match kind {
            NodeKind::TranslationUnit | NodeKind::Block => {
                for child in graph.ast_children(node).to_vec() {
                    self.process_statement(graph, child, defs)?;
                }
                Ok(())
            }
            NodeKind::DeclarationStatement { declarations } => {
                for declaration in declarations {
                    if let NodeKind::VariableDeclaration {
                        initializer: Some(initializer),
                    } = graph.node(declaration).kind
                    {
                        self.process_expression(graph, initializer, defs)?;
                        graph.add_dfg_edge(initializer, declaration);
                    }
                    defs.write(declaration, declaration);
                }
                Ok(())
            }
            NodeKind::FunctionDeclaration { body: Some(body) } => {
                self.process_statement(graph, body, defs)
            }
            NodeKind::FunctionDeclaration { body: None } => Ok(()),
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                self.process_expression(graph, condition, defs)?;
                let before = defs.clone();
                self.process_statement(graph, then_branch, defs)?;
                let mut other = before;
                if let Some(else_branch) = else_branch {
                    self.process_statement(graph, else_branch, &mut other)?;
                }
                // writes of either branch may reach the join point
                defs.merge(&other);
                Ok(())
            }
            NodeKind::ForStatement {
                initializer,
                condition,
                iteration,
                body,
            } => {
                if let Some(initializer) = initializer {
                    self.process_statement(graph, initializer, defs)?;
                }
                // first round discovers the loop's own writes, the second
                // round wires reads against initializer and step together
                let mut first_round = defs.clone();
                self.process_loop_round(graph, condition, body, iteration, &mut first_round)?;
                defs.merge(&first_round);
                let mut second_round = defs.clone();
                self.process_loop_round(graph, condition, body, iteration, &mut second_round)?;
                // the loop may run zero times, so pre-loop writes survive
                defs.merge(&second_round);
                Ok(())
            }
            NodeKind::ReturnStatement { value } => {
                if let Some(value) = value {
                    self.process_expression(graph, value, defs)?;
                }
                Ok(())
            }
            // expression statements
            _ => self.process_expression(graph, node, defs),
        }
    }

    fn process_loop_round(
        &self,
        graph: &mut PropertyGraph,
        condition: Option<NodeId>,
        body: NodeId,
        iteration: Option<NodeId>,
        defs: &mut Definitions,
    ) -> Result<()> {
        if let Some(condition) = condition {
            self.process_expression(graph, condition, defs)?;
        }
        self.process_statement(graph, body, defs)?;
        if let Some(iteration) = iteration {
            self.process_expression(graph, iteration, defs)?;
        }
        Ok(())
    }

    fn process_expression(
        &self,
        graph: &mut PropertyGraph,
        node: NodeId,
        defs: &mut Definitions,
    ) -> Result<()> {
        let kind = graph.node(node).kind.clone();
        match kind {
            NodeKind::Literal { .. } => Ok(()),
            NodeKind::Reference { .. } => {
                self.wire_read(graph, node, defs);
                Ok(())
            }
            NodeKind::UnaryOperator {
                op: UnaryOp::Increment | UnaryOp::Decrement,
                operand,
            } => {
                if let Some(declaration) = resolved_reference(graph, operand) {
                    // the operand reads the prior writes, the operation
                    // writes back through the operand
                    self.wire_read(graph, operand, defs);
                    graph.add_dfg_edge(operand, node);
                    graph.add_dfg_edge(node, operand);
                    defs.write(declaration, operand);
                } else {
                    self.process_expression(graph, operand, defs)?;
                    graph.add_dfg_edge(operand, node);
                }
                Ok(())
            }
            NodeKind::UnaryOperator { operand, .. } => {
                self.process_expression(graph, operand, defs)?;
                graph.add_dfg_edge(operand, node);
                Ok(())
            }
            NodeKind::BinaryOperator { lhs, rhs, .. } => {
                self.process_expression(graph, lhs, defs)?;
                self.process_expression(graph, rhs, defs)?;
                graph.add_dfg_edge(lhs, node);
                graph.add_dfg_edge(rhs, node);
                Ok(())
            }
            NodeKind::AssignExpression {
                operator, lhs, rhs, ..
            } => {
                self.process_expression(graph, rhs, defs)?;
                let Some(declaration) = resolved_reference(graph, lhs) else {
                    // opaque target, treat it as a plain read
                    self.process_expression(graph, lhs, defs)?;
                    graph.add_dfg_edge(rhs, node);
                    return Ok(());
                };
                match operator {
                    AssignOperator::Assign => {
                        graph.add_dfg_edge(rhs, lhs);
                    }
                    AssignOperator::Compound(_) => {
                        // read side feeds the operation, which writes back
                        self.wire_read(graph, lhs, defs);
                        graph.add_dfg_edge(lhs, node);
                        graph.add_dfg_edge(rhs, node);
                        graph.add_dfg_edge(node, lhs);
                    }
                }
                defs.write(declaration, lhs);
                Ok(())
            }
            NodeKind::CastExpression { inner } => {
                self.process_expression(graph, inner, defs)?;
                graph.add_dfg_edge(inner, node);
                Ok(())
            }
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            } => {
                self.process_expression(graph, condition, defs)?;
                self.process_expression(graph, then_expr, defs)?;
                self.process_expression(graph, else_expr, defs)?;
                graph.add_dfg_edge(then_expr, node);
                graph.add_dfg_edge(else_expr, node);
                Ok(())
            }
            NodeKind::SubscriptExpression { base, index } => {
                self.process_expression(graph, base, defs)?;
                self.process_expression(graph, index, defs)
            }
            NodeKind::KeyValueExpression { key, value } => {
                self.process_expression(graph, key, defs)?;
                self.process_expression(graph, value, defs)
            }
            NodeKind::InitializerListExpression { initializers } => {
                for initializer in initializers {
                    self.process_expression(graph, initializer, defs)?;
                }
                Ok(())
            }
            NodeKind::CallExpression { arguments, .. } => {
                // argument values do not stand in for the call's own value
                for argument in arguments {
                    self.process_expression(graph, argument, defs)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Wires a reference read against the writes that reach it; falls back
    /// to the declaration itself when nothing is known yet.
    fn wire_read(&self, graph: &mut PropertyGraph, reference: NodeId, defs: &Definitions) {
        let Some(declaration) = resolved_reference(graph, reference) else {
            return;
        };
        match defs.read(declaration) {
            Some(reaching) => {
                for &def in reaching {
                    if def != reference {
                        graph.add_dfg_edge(def, reference);
                    }
                }
            }
            None => graph.add_dfg_edge(declaration, reference),
        }
    }
}

fn resolved_reference(graph: &PropertyGraph, node: NodeId) -> Option<NodeId> {
    match graph.node(node).kind {
        NodeKind::Reference {
            refers_to: Some(declaration),
            ..
        } => Some(declaration),
        _ => None,
    }
}

impl Pass for DataFlowPass {
    fn descriptor(&self) -> PassDescriptor {
        PassDescriptor::new(PassId::DataFlow).depends_on(PassId::EvaluationOrder)
    }

    fn accept(
        &mut self,
        result: &mut TranslationResult,
        _context: &TranslationContext,
    ) -> Result<()> {
        let roots: Vec<NodeId> = result.translation_units().map(|tu| tu.root).collect();
        for root in roots {
            let mut defs = Definitions::default();
            self.process_statement(&mut result.graph, root, &mut defs)?;
        }
        debug!(edges = result.graph.dfg_edge_count(), "data flow built");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::value_evaluation::{
        EvalResult, MultiValueEvaluator, NumberSet, Value, ValueEvaluator,
    };
    use crate::graph::{AccessKind, BinaryOp};
    use crate::pipeline::context::CancellationToken;
    use crate::pipeline::result::TranslationUnit;

    fn run(result: &mut TranslationResult) {
        let context = TranslationContext::new(Default::default(), CancellationToken::new());
        DataFlowPass::new().accept(result, &context).unwrap();
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
    fn test_straight_line_read_sees_the_initializer() {
        // var x = 2; print(x)
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let two = g.literal(Value::Int(2));
        let decl = g.variable_declaration("x", Some(two)).unwrap();
        let stmt = g.declaration_statement(vec![decl]).unwrap();
        g.append_statement(tu, stmt).unwrap();
        let use_ref = g.reference("x", Some(decl), AccessKind::Read);
        let call = g.call("print", vec![use_ref]).unwrap();
        g.append_statement(tu, call).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        assert_eq!(
            ValueEvaluator::new().evaluate(&result.graph, use_ref),
            EvalResult::Value(Value::Int(2))
        );
    }

    #[test]
    fn test_branch_join_yields_both_values() {
        // var x = 1; if (0 < 1) x = 2; print(x)
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let one = g.literal(Value::Int(1));
        let decl = g.variable_declaration("x", Some(one)).unwrap();
        let stmt = g.declaration_statement(vec![decl]).unwrap();
        g.append_statement(tu, stmt).unwrap();

        let zero = g.literal(Value::Int(0));
        let one_b = g.literal(Value::Int(1));
        let cond = g.binary_op(BinaryOp::Lt, zero, one_b).unwrap();
        let lhs = g.reference("x", Some(decl), AccessKind::Write);
        let two = g.literal(Value::Int(2));
        let assign = g.assign(AssignOperator::Assign, lhs, two, false).unwrap();
        let then_block = g.block();
        g.append_statement(then_block, assign).unwrap();
        let if_stmt = g.if_statement(cond, then_block, None).unwrap();
        g.append_statement(tu, if_stmt).unwrap();

        let use_ref = g.reference("x", Some(decl), AccessKind::Read);
        let call = g.call("print", vec![use_ref]).unwrap();
        g.append_statement(tu, call).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        // single-value gives up at the join, multi-value unions it
        assert!(ValueEvaluator::new()
            .evaluate(&result.graph, use_ref)
            .is_cannot_evaluate());
        assert_eq!(
            MultiValueEvaluator::new().evaluate(&result.graph, use_ref),
            EvalResult::Numbers(NumberSet::concrete([1, 2]))
        );
    }

    #[test]
    fn test_compound_assignment_wiring_evaluates_correctly() {
        // var i = 0; i += 1; print(i)
        let mut result = TranslationResult::new();
        let g = &mut result.graph;
        let tu = g.translation_unit("t");
        let zero = g.literal(Value::Int(0));
        let decl = g.variable_declaration("i", Some(zero)).unwrap();
        let stmt = g.declaration_statement(vec![decl]).unwrap();
        g.append_statement(tu, stmt).unwrap();
        let lhs = g.reference("i", Some(decl), AccessKind::ReadWrite);
        let one = g.literal(Value::Int(1));
        let assign = g
            .assign(AssignOperator::Compound(BinaryOp::Add), lhs, one, false)
            .unwrap();
        g.append_statement(tu, assign).unwrap();
        let use_ref = g.reference("i", Some(decl), AccessKind::Read);
        let call = g.call("print", vec![use_ref]).unwrap();
        g.append_statement(tu, call).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        assert_eq!(
            ValueEvaluator::new().evaluate(&result.graph, use_ref),
            EvalResult::Value(Value::Int(1))
        );
    }

    #[test]
    fn test_loop_body_read_sees_initializer_and_step() {
        // for (var i = 0; i < 3; i++) use(i)
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
        let use_ref = g.reference("i", Some(decl), AccessKind::Read);
        let call = g.call("use", vec![use_ref]).unwrap();
        g.append_statement(body, call).unwrap();
        let for_stmt = g
            .for_statement(Some(init), Some(cond), Some(step), body)
            .unwrap();
        g.append_statement(tu, for_stmt).unwrap();
        add_unit(&mut result, tu);

        run(&mut result);

        let preds = result.graph.dfg_predecessors(use_ref);
        assert_eq!(preds.len(), 2);
        assert!(preds.contains(&decl));
        assert!(preds.contains(&step_ref));

        assert_eq!(
            MultiValueEvaluator::new().evaluate(&result.graph, use_ref),
            EvalResult::Numbers(NumberSet::concrete([0, 1, 2]))
        );
    }
}
