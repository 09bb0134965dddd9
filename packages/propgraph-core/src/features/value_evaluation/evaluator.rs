//! The shared evaluation engine behind both evaluator variants
//!
//! The engine is single-threaded and recursive per call. It keeps the
//! current traversal path so references that are simultaneously read and
//! written (the operand of `i++`, the left side of `i += 1`) can tell their
//! "first" visit apart from the "downstream" one; without that distinction
//! compound assignments either recurse forever or resolve to the wrong
//! post-update value.

use super::domain::{compute_binary_op, NumberSet, Value};
use crate::graph::{AccessKind, AssignOperator, BinaryOp, Node, NodeId, NodeKind, PropertyGraph, UnaryOp};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// General recursion guard, independent of loop unrolling.
const MAX_DEPTH: usize = 20;

/// Outcome of one evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EvalResult {
    /// A single concrete value
    Value(Value),
    /// Several possible values (multi-value engine, mixed kinds)
    Set(Vec<Value>),
    /// Several possible values, all integers
    Numbers(NumberSet),
    /// The node could not be resolved; carries the caller-customizable
    /// placeholder (default: the node's name in braces)
    CannotEvaluate(String),
}

impl EvalResult {
    pub fn is_cannot_evaluate(&self) -> bool {
        matches!(self, EvalResult::CannotEvaluate(_))
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            EvalResult::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Hook producing the placeholder for a node that cannot be resolved.
pub type CannotEvaluateHook = Arc<dyn Fn(&Node) -> String + Send + Sync>;

/// Shared opt-in result cache, keyed by node identity.
pub type EvalCache = DashMap<NodeId, EvalResult>;

fn default_hook() -> CannotEvaluateHook {
    Arc::new(|node: &Node| format!("{{{}}}", node.name))
}

/// Resolves a node to at most one concrete value.
///
/// A node with more than one relevant data-flow predecessor is treated as
/// proof that the value depends on a runtime branch, and evaluation gives up.
pub struct ValueEvaluator {
    hook: CannotEvaluateHook,
    cache: Option<Arc<EvalCache>>,
}

impl Default for ValueEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueEvaluator {
    pub fn new() -> Self {
        Self {
            hook: default_hook(),
            cache: None,
        }
    }

    /// Replaces the cannot-evaluate placeholder hook.
    pub fn with_hook(mut self, hook: CannotEvaluateHook) -> Self {
        self.hook = hook;
        self
    }

    /// Enables result caching through a shared cache.
    pub fn with_cache(mut self, cache: Arc<EvalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn evaluate(&self, graph: &PropertyGraph, node: NodeId) -> EvalResult {
        evaluate_cached(Mode::Single, &self.hook, self.cache.as_deref(), graph, node)
    }

    /// Evaluates bypassing the cache, both for lookup and insertion.
    pub fn evaluate_uncached(&self, graph: &PropertyGraph, node: NodeId) -> EvalResult {
        run(Mode::Single, &self.hook, graph, node)
    }
}

/// Resolves a node to the set of its possible values.
///
/// At control-flow joins every predecessor is evaluated and the results are
/// unioned; a loop-carried counter variable is symbolically unrolled using
/// the loop's own exit condition.
pub struct MultiValueEvaluator {
    hook: CannotEvaluateHook,
    cache: Option<Arc<EvalCache>>,
}

impl Default for MultiValueEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiValueEvaluator {
    pub fn new() -> Self {
        Self {
            hook: default_hook(),
            cache: None,
        }
    }

    pub fn with_hook(mut self, hook: CannotEvaluateHook) -> Self {
        self.hook = hook;
        self
    }

    pub fn with_cache(mut self, cache: Arc<EvalCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn evaluate(&self, graph: &PropertyGraph, node: NodeId) -> EvalResult {
        evaluate_cached(Mode::Multi, &self.hook, self.cache.as_deref(), graph, node)
    }

    pub fn evaluate_uncached(&self, graph: &PropertyGraph, node: NodeId) -> EvalResult {
        run(Mode::Multi, &self.hook, graph, node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Single,
    Multi,
}

fn evaluate_cached(
    mode: Mode,
    hook: &CannotEvaluateHook,
    cache: Option<&EvalCache>,
    graph: &PropertyGraph,
    node: NodeId,
) -> EvalResult {
    let Some(cache) = cache else {
        return run(mode, hook, graph, node);
    };
    if let Some(hit) = cache.get(&node) {
        return hit.clone();
    }
    let out = run(mode, hook, graph, node);
    cache.insert(node, out.clone());
    out
}

fn run(mode: Mode, hook: &CannotEvaluateHook, graph: &PropertyGraph, node: NodeId) -> EvalResult {
    let mut engine = Engine {
        graph,
        mode,
        hook,
        path: Vec::new(),
    };
    finish(mode, engine.eval(node))
}

fn finish(mode: Mode, eval: Eval) -> EvalResult {
    match eval {
        Eval::Cannot(placeholder) => EvalResult::CannotEvaluate(placeholder),
        Eval::One(v) => match mode {
            Mode::Single => EvalResult::Value(v),
            Mode::Multi => wrap_many(vec![v]),
        },
        Eval::Many(vs) => wrap_many(vs),
    }
}

fn wrap_many(values: Vec<Value>) -> EvalResult {
    if !values.is_empty() && values.iter().all(|v| matches!(v, Value::Int(_))) {
        EvalResult::Numbers(NumberSet::concrete(values.iter().filter_map(Value::as_i64)))
    } else {
        EvalResult::Set(values)
    }
}

/// Internal evaluation outcome, before the public shaping in [`finish`].
enum Eval {
    One(Value),
    Many(Vec<Value>),
    Cannot(String),
}

fn into_values(eval: Eval) -> Vec<Value> {
    match eval {
        Eval::One(v) => vec![v],
        Eval::Many(vs) => vs,
        // the multi-value union keeps unresolved members as their placeholder
        Eval::Cannot(placeholder) => vec![Value::Str(placeholder)],
    }
}

struct Engine<'a> {
    graph: &'a PropertyGraph,
    mode: Mode,
    hook: &'a CannotEvaluateHook,
    /// Nodes on the current traversal, for self-reference disambiguation.
    path: Vec<NodeId>,
}

impl<'a> Engine<'a> {
    fn eval(&mut self, id: NodeId) -> Eval {
        if self.path.len() >= MAX_DEPTH {
            debug!(node = %id, "evaluation depth cap reached");
            return self.cannot(id);
        }
        self.path.push(id);
        let out = self.eval_inner(id);
        self.path.pop();
        out
    }

    fn cannot(&self, id: NodeId) -> Eval {
        Eval::Cannot((self.hook)(self.graph.node(id)))
    }

    fn eval_inner(&mut self, id: NodeId) -> Eval {
        let graph = self.graph;
        match &graph.node(id).kind {
            NodeKind::Literal { value } => Eval::One(value.clone()),
            // casts are value-transparent
            NodeKind::CastExpression { inner } => self.eval(*inner),
            NodeKind::UnaryOperator { op, operand } => self.eval_unary(id, *op, *operand),
            NodeKind::BinaryOperator { op, lhs, rhs } => {
                let (op, lhs, rhs) = (*op, *lhs, *rhs);
                let l = self.eval(lhs);
                let r = self.eval(rhs);
                self.combine(id, l, r, op)
            }
            NodeKind::AssignExpression {
                operator,
                lhs,
                rhs,
                used_as_expression,
                expression_value,
            } => self.eval_assign(id, *operator, *lhs, *rhs, *used_as_expression, *expression_value),
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            } => self.eval_conditional(id, *condition, *then_expr, *else_expr),
            NodeKind::SubscriptExpression { base, index } => {
                self.eval_subscript(id, *base, *index)
            }
            _ => self.eval_prev_dfg(id),
        }
    }

    fn eval_unary(&mut self, id: NodeId, op: UnaryOp, operand: NodeId) -> Eval {
        let apply = |v: &Value| match op {
            UnaryOp::Negate => v.negated(),
            UnaryOp::Increment => v.incremented(),
            UnaryOp::Decrement => v.decremented(),
        };
        match self.eval(operand) {
            Eval::One(v) => match apply(&v) {
                Some(v) => Eval::One(v),
                None => self.cannot(id),
            },
            // element-wise over a collection result
            Eval::Many(vs) => {
                let mut out = Vec::with_capacity(vs.len());
                for v in &vs {
                    match apply(v) {
                        Some(v) => out.push(v),
                        None => return self.cannot(id),
                    }
                }
                Eval::Many(out)
            }
            cannot => cannot,
        }
    }

    /// Combines two operand outcomes through the fixed operator table. The
    /// multi-value engine pairs every left value with every right value.
    fn combine(&mut self, id: NodeId, lhs: Eval, rhs: Eval, op: BinaryOp) -> Eval {
        match (lhs, rhs) {
            (Eval::One(a), Eval::One(b)) => match compute_binary_op(&a, &b, op) {
                Some(v) => Eval::One(v),
                None => self.cannot(id),
            },
            (Eval::Cannot(p), _) | (_, Eval::Cannot(p)) => Eval::Cannot(p),
            (l, r) if self.mode == Mode::Multi => {
                let left = into_values(l);
                let right = into_values(r);
                let mut out = Vec::new();
                for a in &left {
                    for b in &right {
                        match compute_binary_op(a, b, op) {
                            Some(v) => {
                                if !out.contains(&v) {
                                    out.push(v);
                                }
                            }
                            None => return self.cannot(id),
                        }
                    }
                }
                Eval::Many(out)
            }
            _ => self.cannot(id),
        }
    }

    fn eval_assign(
        &mut self,
        id: NodeId,
        operator: AssignOperator,
        lhs: NodeId,
        rhs: NodeId,
        used_as_expression: bool,
        expression_value: Option<NodeId>,
    ) -> Eval {
        match operator {
            // `x += e` used as an operator goes through the operator table
            AssignOperator::Compound(op) => {
                let l = self.eval(lhs);
                let r = self.eval(rhs);
                self.combine(id, l, r, op)
            }
            AssignOperator::Assign => {
                // when the assignment itself is consumed as an expression the
                // graph precomputed the node that carries its value
                if used_as_expression {
                    if let Some(value) = expression_value {
                        return self.eval(value);
                    }
                }
                self.eval(rhs)
            }
        }
    }

    fn eval_conditional(
        &mut self,
        id: NodeId,
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    ) -> Eval {
        match self.mode {
            // deliberate over-approximation: union both branches
            Mode::Multi => {
                let a = self.eval(then_expr);
                let b = self.eval(else_expr);
                self.union([a, b])
            }
            Mode::Single => {
                let is_comparison = matches!(
                    &self.graph.node(condition).kind,
                    NodeKind::BinaryOperator { op, .. } if op.is_comparison()
                );
                if !is_comparison {
                    return self.cannot(id);
                }
                match self.eval(condition) {
                    Eval::One(Value::Bool(true)) => self.eval(then_expr),
                    Eval::One(Value::Bool(false)) => self.eval(else_expr),
                    _ => self.cannot(id),
                }
            }
        }
    }

    fn eval_subscript(&mut self, id: NodeId, base: NodeId, index: NodeId) -> Eval {
        let Some(entries) = self.keyed_initializer(base) else {
            // not a keyed literal list, fall through to the data-flow rule
            return self.eval_prev_dfg(id);
        };
        let key = match self.eval(index) {
            Eval::One(v) => v,
            _ => return self.cannot(id),
        };
        for (entry_key, entry_value) in entries {
            if let NodeKind::Literal { value } = &self.graph.node(entry_key).kind {
                if compute_binary_op(value, &key, BinaryOp::Eq) == Some(Value::Bool(true)) {
                    return self.eval(entry_value);
                }
            }
        }
        self.cannot(id)
    }

    /// Key/value pairs of the initializer list behind `base`, if `base` is a
    /// reference to a declaration initialized entirely by key-value entries.
    fn keyed_initializer(&self, base: NodeId) -> Option<Vec<(NodeId, NodeId)>> {
        let NodeKind::Reference {
            refers_to: Some(decl),
            ..
        } = self.graph.node(base).kind
        else {
            return None;
        };
        let NodeKind::VariableDeclaration {
            initializer: Some(init),
        } = self.graph.node(decl).kind
        else {
            return None;
        };
        let NodeKind::InitializerListExpression { initializers } = &self.graph.node(init).kind
        else {
            return None;
        };
        let mut out = Vec::with_capacity(initializers.len());
        for &entry in initializers {
            let NodeKind::KeyValueExpression { key, value } = self.graph.node(entry).kind else {
                return None;
            };
            out.push((key, value));
        }
        Some(out)
    }

    /// Default rule: follow data-flow predecessors backwards.
    fn eval_prev_dfg(&mut self, id: NodeId) -> Eval {
        let mut preds: Vec<NodeId> = self.graph.dfg_predecessors(id).to_vec();
        if matches!(self.graph.node(id).kind, NodeKind::Reference { .. }) {
            preds = self.filter_self_references(id, preds);
            if self.mode == Mode::Multi && preds.len() == 2 {
                if let Some(values) = self.try_unroll_loop(id, preds[0], preds[1]) {
                    return Eval::Many(values);
                }
            }
        }
        match preds.len() {
            0 => self.cannot(id),
            1 => self.eval(preds[0]),
            n => match self.mode {
                Mode::Single => {
                    debug!(
                        node = %id,
                        predecessors = n,
                        "multiple data-flow predecessors, value likely depends on a runtime branch"
                    );
                    self.cannot(id)
                }
                Mode::Multi => {
                    let parts: Vec<Eval> = preds.into_iter().map(|p| self.eval(p)).collect();
                    self.union(parts)
                }
            },
        }
    }

    fn union(&self, parts: impl IntoIterator<Item = Eval>) -> Eval {
        let mut out: Vec<Value> = Vec::new();
        for part in parts {
            for v in into_values(part) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        Eval::Many(out)
    }

    /// Two-case filter for references that are both read and written.
    ///
    /// First visit (the reference is not yet on the path ≥2 hops back):
    /// restrict to exactly the self-defining operation, so its effect is
    /// applied. Downstream visit (it is): exclude the self-defining edge and
    /// use only the truly-prior ones, so the recursion bottoms out at the
    /// pre-update value.
    fn filter_self_references(&self, ref_id: NodeId, preds: Vec<NodeId>) -> Vec<NodeId> {
        let self_edges: Vec<NodeId> = preds
            .iter()
            .copied()
            .filter(|&p| self.is_self_defining(ref_id, p))
            .collect();
        if self_edges.is_empty() {
            return preds;
        }
        let revisit =
            self.path.len() > 2 && self.path[..self.path.len() - 2].contains(&ref_id);
        if revisit {
            preds.into_iter().filter(|p| !self_edges.contains(p)).collect()
        } else {
            self_edges
        }
    }

    /// Whether `pred` is the operation that writes back through `ref_id`
    /// while also reading it (`i += 1`, `i++`, `i--`).
    fn is_self_defining(&self, ref_id: NodeId, pred: NodeId) -> bool {
        let is_rw = matches!(
            self.graph.node(ref_id).kind,
            NodeKind::Reference {
                access: AccessKind::ReadWrite,
                ..
            }
        );
        if !is_rw {
            return false;
        }
        match &self.graph.node(pred).kind {
            NodeKind::AssignExpression {
                operator: AssignOperator::Compound(_),
                lhs,
                ..
            } => *lhs == ref_id,
            NodeKind::UnaryOperator {
                op: UnaryOp::Increment | UnaryOp::Decrement,
                operand,
            } => *operand == ref_id,
            _ => false,
        }
    }

    // ── Loop-carried variable reasoning (multi-value only) ─────────

    /// Symbolically unrolls a counted loop if `ref_id`'s two data-flow
    /// predecessors come out of the same enclosing for-statement, one
    /// through its initializer and one through its iteration step.
    ///
    /// Termination relies on the loop's own exit condition; the general
    /// depth cap does not bound the unrolling.
    fn try_unroll_loop(&mut self, ref_id: NodeId, a: NodeId, b: NodeId) -> Option<Vec<Value>> {
        let NodeKind::Reference {
            refers_to: Some(decl),
            ..
        } = self.graph.node(ref_id).kind
        else {
            return None;
        };
        let (for_a, via_a) = self.for_ancestor(a)?;
        let (for_b, via_b) = self.for_ancestor(b)?;
        if for_a != for_b {
            return None;
        }
        let NodeKind::ForStatement {
            initializer: Some(init),
            condition: Some(cond),
            iteration: Some(step),
            ..
        } = self.graph.node(for_a).kind
        else {
            return None;
        };
        let init_pred = if via_a == init && via_b == step {
            a
        } else if via_b == init && via_a == step {
            b
        } else {
            return None;
        };

        let mut current = match self.eval(init_pred) {
            Eval::One(v) if v.is_numeric() => v,
            _ => return None,
        };
        let mut recorded = Vec::new();
        while self.loop_condition_holds(cond, decl, &current)? {
            if !recorded.contains(&current) {
                recorded.push(current.clone());
            }
            current = self.advance(step, decl, &current)?;
        }
        Some(recorded)
    }

    /// Nearest for-statement ancestor of `id`, plus the direct child of that
    /// for-statement the path runs through.
    fn for_ancestor(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let mut cursor = id;
        while let Some(parent) = self.graph.ast_parent(cursor) {
            if matches!(self.graph.node(parent).kind, NodeKind::ForStatement { .. }) {
                return Some((parent, cursor));
            }
            cursor = parent;
        }
        None
    }

    /// Evaluates the loop condition with the loop variable pinned to
    /// `current`. The condition must be a binary comparison against the
    /// variable.
    fn loop_condition_holds(&mut self, cond: NodeId, decl: NodeId, current: &Value) -> Option<bool> {
        let NodeKind::BinaryOperator { op, lhs, rhs } = self.graph.node(cond).kind else {
            return None;
        };
        if !op.is_comparison() {
            return None;
        }
        let outcome = if self.refers_to_decl(lhs, decl) {
            compute_binary_op(current, &self.eval_single(rhs)?, op)
        } else if self.refers_to_decl(rhs, decl) {
            compute_binary_op(&self.eval_single(lhs)?, current, op)
        } else {
            return None;
        }?;
        match outcome {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// One application of the loop's iteration step to `current`.
    fn advance(&mut self, step: NodeId, decl: NodeId, current: &Value) -> Option<Value> {
        match &self.graph.node(step).kind {
            NodeKind::UnaryOperator {
                op: UnaryOp::Increment,
                ..
            } => current.incremented(),
            NodeKind::UnaryOperator {
                op: UnaryOp::Decrement,
                ..
            } => current.decremented(),
            NodeKind::AssignExpression {
                operator: AssignOperator::Compound(op),
                rhs,
                ..
            } => {
                let (op, rhs) = (*op, *rhs);
                let rhs = self.eval_single(rhs)?;
                compute_binary_op(current, &rhs, op)
            }
            NodeKind::AssignExpression {
                operator: AssignOperator::Assign,
                rhs,
                ..
            } => self.binary_step(*rhs, decl, current),
            NodeKind::BinaryOperator { .. } => self.binary_step(step, decl, current),
            _ => None,
        }
    }

    /// A binary-operation step, with occurrences of the loop variable
    /// substituted by `current`.
    fn binary_step(&mut self, expr: NodeId, decl: NodeId, current: &Value) -> Option<Value> {
        let NodeKind::BinaryOperator { op, lhs, rhs } = self.graph.node(expr).kind else {
            return None;
        };
        let l = if self.refers_to_decl(lhs, decl) {
            current.clone()
        } else {
            self.eval_single(lhs)?
        };
        let r = if self.refers_to_decl(rhs, decl) {
            current.clone()
        } else {
            self.eval_single(rhs)?
        };
        compute_binary_op(&l, &r, op)
    }

    fn refers_to_decl(&self, id: NodeId, decl: NodeId) -> bool {
        matches!(
            self.graph.node(id).kind,
            NodeKind::Reference {
                refers_to: Some(d),
                ..
            } if d == decl
        )
    }

    fn eval_single(&mut self, id: NodeId) -> Option<Value> {
        match self.eval(id) {
            Eval::One(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AccessKind;
    use pretty_assertions::assert_eq;

    fn int(graph: &mut PropertyGraph, v: i64) -> NodeId {
        graph.literal(Value::Int(v))
    }

    #[test]
    fn test_literal_is_terminal() {
        let mut g = PropertyGraph::new();
        let lit = int(&mut g, 5);
        assert_eq!(
            ValueEvaluator::new().evaluate(&g, lit),
            EvalResult::Value(Value::Int(5))
        );
    }

    #[test]
    fn test_binary_addition() {
        let mut g = PropertyGraph::new();
        let l = int(&mut g, 2);
        let r = int(&mut g, 3);
        let sum = g.binary_op(BinaryOp::Add, l, r).unwrap();
        assert_eq!(
            ValueEvaluator::new().evaluate(&g, sum),
            EvalResult::Value(Value::Int(5))
        );
    }

    #[test]
    fn test_division_by_zero_cannot_evaluate() {
        let mut g = PropertyGraph::new();
        let l = int(&mut g, 4);
        let r = int(&mut g, 0);
        let div = g.binary_op(BinaryOp::Div, l, r).unwrap();
        assert!(ValueEvaluator::new().evaluate(&g, div).is_cannot_evaluate());
    }

    #[test]
    fn test_cast_is_transparent() {
        let mut g = PropertyGraph::new();
        let lit = int(&mut g, 7);
        let cast = g.cast(lit).unwrap();
        assert_eq!(
            ValueEvaluator::new().evaluate(&g, cast),
            EvalResult::Value(Value::Int(7))
        );
    }

    #[test]
    fn test_single_gives_up_at_joins_multi_unions() {
        let mut g = PropertyGraph::new();
        let a = int(&mut g, 2);
        let b = int(&mut g, 3);
        let r = g.reference("x", None, AccessKind::Read);
        g.add_dfg_edge(a, r);
        g.add_dfg_edge(b, r);

        assert!(ValueEvaluator::new().evaluate(&g, r).is_cannot_evaluate());
        assert_eq!(
            MultiValueEvaluator::new().evaluate(&g, r),
            EvalResult::Numbers(NumberSet::concrete([2, 3]))
        );
    }

    #[test]
    fn test_compound_assignment_reflects_prior_value_and_terminates() {
        // var i = 0; i += 1; use(i)
        let mut g = PropertyGraph::new();
        let zero = int(&mut g, 0);
        let decl = g.variable_declaration("i", Some(zero)).unwrap();
        let lhs = g.reference("i", Some(decl), AccessKind::ReadWrite);
        let one = int(&mut g, 1);
        let assign = g
            .assign(AssignOperator::Compound(BinaryOp::Add), lhs, one, false)
            .unwrap();
        let use_ref = g.reference("i", Some(decl), AccessKind::Read);

        g.add_dfg_edge(zero, decl);
        g.add_dfg_edge(decl, lhs);
        g.add_dfg_edge(lhs, assign);
        g.add_dfg_edge(one, assign);
        g.add_dfg_edge(assign, lhs);
        g.add_dfg_edge(lhs, use_ref);

        assert_eq!(
            ValueEvaluator::new().evaluate(&g, use_ref),
            EvalResult::Value(Value::Int(1))
        );
    }

    #[test]
    fn test_counted_loop_unrolls_by_its_own_condition() {
        // for (i = 0; i < 3; i++) use(i)
        let mut g = PropertyGraph::new();
        let zero = int(&mut g, 0);
        let decl = g.variable_declaration("i", Some(zero)).unwrap();
        let init_stmt = g.declaration_statement(vec![decl]).unwrap();
        let cond_ref = g.reference("i", Some(decl), AccessKind::Read);
        let three = int(&mut g, 3);
        let cond = g.binary_op(BinaryOp::Lt, cond_ref, three).unwrap();
        let step_ref = g.reference("i", Some(decl), AccessKind::ReadWrite);
        let step = g.unary_op(UnaryOp::Increment, step_ref).unwrap();
        let body = g.block();
        let use_ref = g.reference("i", Some(decl), AccessKind::Read);
        let call = g.call("use", vec![use_ref]).unwrap();
        g.append_statement(body, call).unwrap();
        g.for_statement(Some(init_stmt), Some(cond), Some(step), body)
            .unwrap();

        g.add_dfg_edge(zero, decl);
        g.add_dfg_edge(decl, cond_ref);
        g.add_dfg_edge(decl, step_ref);
        g.add_dfg_edge(step_ref, step);
        g.add_dfg_edge(step, step_ref);
        g.add_dfg_edge(decl, use_ref);
        g.add_dfg_edge(step_ref, use_ref);

        assert_eq!(
            MultiValueEvaluator::new().evaluate(&g, use_ref),
            EvalResult::Numbers(NumberSet::concrete([0, 1, 2]))
        );
    }

    #[test]
    fn test_conditional_single_picks_multi_unions() {
        let mut g = PropertyGraph::new();
        let two = int(&mut g, 2);
        let three = int(&mut g, 3);
        let cond = g.binary_op(BinaryOp::Lt, two, three).unwrap();
        let ten = int(&mut g, 10);
        let twenty = int(&mut g, 20);
        let ternary = g.conditional(cond, ten, twenty).unwrap();

        assert_eq!(
            ValueEvaluator::new().evaluate(&g, ternary),
            EvalResult::Value(Value::Int(10))
        );
        assert_eq!(
            MultiValueEvaluator::new().evaluate(&g, ternary),
            EvalResult::Numbers(NumberSet::concrete([10, 20]))
        );
    }

    #[test]
    fn test_subscript_over_keyed_initializer() {
        let mut g = PropertyGraph::new();
        let k0 = int(&mut g, 0);
        let v0 = g.literal(Value::Str("zero".into()));
        let e0 = g.key_value(k0, v0).unwrap();
        let k1 = int(&mut g, 1);
        let v1 = g.literal(Value::Str("one".into()));
        let e1 = g.key_value(k1, v1).unwrap();
        let list = g.initializer_list(vec![e0, e1]).unwrap();
        let decl = g.variable_declaration("table", Some(list)).unwrap();
        let base = g.reference("table", Some(decl), AccessKind::Read);
        let idx = int(&mut g, 1);
        let subscript = g.subscript(base, idx).unwrap();

        assert_eq!(
            ValueEvaluator::new().evaluate(&g, subscript),
            EvalResult::Value(Value::Str("one".into()))
        );

        let base2 = g.reference("table", Some(decl), AccessKind::Read);
        let missing = int(&mut g, 9);
        let subscript2 = g.subscript(base2, missing).unwrap();
        assert!(ValueEvaluator::new()
            .evaluate(&g, subscript2)
            .is_cannot_evaluate());
    }

    #[test]
    fn test_depth_cap_stops_long_chains() {
        let mut g = PropertyGraph::new();
        let mut prev = int(&mut g, 1);
        let first = prev;
        for i in 0..30 {
            let r = g.reference(format!("r{i}"), None, AccessKind::Read);
            g.add_dfg_edge(prev, r);
            prev = r;
        }
        assert!(ValueEvaluator::new().evaluate(&g, prev).is_cannot_evaluate());
        // a short hop off the same chain still resolves
        assert_eq!(
            ValueEvaluator::new().evaluate(&g, first),
            EvalResult::Value(Value::Int(1))
        );
    }

    #[test]
    fn test_cache_hits_by_identity() {
        let mut g = PropertyGraph::new();
        let l = int(&mut g, 2);
        let r = int(&mut g, 3);
        let sum = g.binary_op(BinaryOp::Add, l, r).unwrap();

        let cache = Arc::new(EvalCache::default());
        let eval = ValueEvaluator::new().with_cache(cache.clone());
        assert_eq!(eval.evaluate(&g, sum), EvalResult::Value(Value::Int(5)));
        assert!(cache.contains_key(&sum));
        assert_eq!(eval.evaluate(&g, sum), EvalResult::Value(Value::Int(5)));

        // structurally equal literals keep distinct cache entries
        let l2 = int(&mut g, 2);
        assert!(!cache.contains_key(&l2));
    }

    #[test]
    fn test_custom_cannot_evaluate_hook() {
        let mut g = PropertyGraph::new();
        let r = g.reference("ghost", None, AccessKind::Read);
        let eval = ValueEvaluator::new()
            .with_hook(Arc::new(|node| format!("<unresolved:{}>", node.name)));
        assert_eq!(
            eval.evaluate(&g, r),
            EvalResult::CannotEvaluate("<unresolved:ghost>".into())
        );
    }
}
