//! Construction primitives
//!
//! Frontends (and tests) build the AST layer exclusively through these
//! methods. Every constructor that takes child ids adopts them, which
//! enforces the ownership invariants: a node has at most one AST parent,
//! and adoption can never create a cycle in the tree.

use super::node::{AccessKind, AssignOperator, BinaryOp, NodeId, NodeKind, UnaryOp};
use super::property_graph::PropertyGraph;
use crate::errors::{PropGraphError, Result};
use crate::features::value_evaluation::Value;

impl PropertyGraph {
    /// Makes `parent` adopt `child` in the AST tree.
    ///
    /// Fails if the child already has a parent or if the adoption would
    /// introduce a cycle.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if parent == child {
            return Err(PropGraphError::graph(format!(
                "node {parent} cannot adopt itself"
            )));
        }
        if let Some(existing) = self.ast_parent(child) {
            return Err(PropGraphError::graph(format!(
                "node {child} already has AST parent {existing}"
            )));
        }
        // reject adopting one of our own ancestors
        let mut cursor = self.ast_parent(parent);
        while let Some(ancestor) = cursor {
            if ancestor == child {
                return Err(PropGraphError::graph(format!(
                    "adopting {child} into {parent} would create an AST cycle"
                )));
            }
            cursor = self.ast_parent(ancestor);
        }
        self.node_mut(child).ast_parent = Some(parent);
        self.node_mut(parent).ast_children.push(child);
        Ok(())
    }

    fn adopt_all(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for &child in children {
            self.adopt(parent, child)?;
        }
        Ok(())
    }

    // ── Declarations ───────────────────────────────────────────────

    pub fn translation_unit(&mut self, name: impl Into<String>) -> NodeId {
        self.push_node(NodeKind::TranslationUnit, name)
    }

    pub fn variable_declaration(
        &mut self,
        name: impl Into<String>,
        initializer: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.push_node(NodeKind::VariableDeclaration { initializer }, name);
        if let Some(init) = initializer {
            self.adopt(id, init)?;
        }
        Ok(id)
    }

    pub fn function_declaration(
        &mut self,
        name: impl Into<String>,
        body: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.push_node(NodeKind::FunctionDeclaration { body }, name);
        if let Some(body) = body {
            self.adopt(id, body)?;
        }
        Ok(id)
    }

    // ── Statements ─────────────────────────────────────────────────

    pub fn block(&mut self) -> NodeId {
        self.push_node(NodeKind::Block, "")
    }

    /// Appends `statement` to a container node (translation unit or block).
    pub fn append_statement(&mut self, container: NodeId, statement: NodeId) -> Result<()> {
        self.adopt(container, statement)
    }

    pub fn declaration_statement(&mut self, declarations: Vec<NodeId>) -> Result<NodeId> {
        let id = self.push_node(
            NodeKind::DeclarationStatement {
                declarations: declarations.clone(),
            },
            "",
        );
        self.adopt_all(id, &declarations)?;
        Ok(id)
    }

    pub fn if_statement(
        &mut self,
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    ) -> Result<NodeId> {
        let id = self.push_node(
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            },
            "",
        );
        self.adopt(id, condition)?;
        self.adopt(id, then_branch)?;
        if let Some(e) = else_branch {
            self.adopt(id, e)?;
        }
        Ok(id)
    }

    pub fn for_statement(
        &mut self,
        initializer: Option<NodeId>,
        condition: Option<NodeId>,
        iteration: Option<NodeId>,
        body: NodeId,
    ) -> Result<NodeId> {
        let id = self.push_node(
            NodeKind::ForStatement {
                initializer,
                condition,
                iteration,
                body,
            },
            "",
        );
        for child in [initializer, condition, iteration, Some(body)].into_iter().flatten() {
            self.adopt(id, child)?;
        }
        Ok(id)
    }

    pub fn return_statement(&mut self, value: Option<NodeId>) -> Result<NodeId> {
        let id = self.push_node(NodeKind::ReturnStatement { value }, "");
        if let Some(v) = value {
            self.adopt(id, v)?;
        }
        Ok(id)
    }

    // ── Expressions ────────────────────────────────────────────────

    pub fn literal(&mut self, value: Value) -> NodeId {
        let name = value.to_string();
        self.push_node(NodeKind::Literal { value }, name)
    }

    pub fn reference(
        &mut self,
        name: impl Into<String>,
        refers_to: Option<NodeId>,
        access: AccessKind,
    ) -> NodeId {
        self.push_node(NodeKind::Reference { refers_to, access }, name)
    }

    pub fn unary_op(&mut self, op: UnaryOp, operand: NodeId) -> Result<NodeId> {
        let id = self.push_node(NodeKind::UnaryOperator { op, operand }, op.code());
        self.adopt(id, operand)?;
        Ok(id)
    }

    pub fn binary_op(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Result<NodeId> {
        let id = self.push_node(NodeKind::BinaryOperator { op, lhs, rhs }, op.code());
        self.adopt(id, lhs)?;
        self.adopt(id, rhs)?;
        Ok(id)
    }

    pub fn assign(
        &mut self,
        operator: AssignOperator,
        lhs: NodeId,
        rhs: NodeId,
        used_as_expression: bool,
    ) -> Result<NodeId> {
        // The graph precomputes the value an assignment yields when it is
        // itself consumed as an expression: the right-hand side.
        let id = self.push_node(
            NodeKind::AssignExpression {
                operator,
                lhs,
                rhs,
                used_as_expression,
                expression_value: used_as_expression.then_some(rhs),
            },
            match operator {
                AssignOperator::Assign => "=".to_string(),
                AssignOperator::Compound(op) => format!("{}=", op.code()),
            },
        );
        self.adopt(id, lhs)?;
        self.adopt(id, rhs)?;
        Ok(id)
    }

    pub fn cast(&mut self, inner: NodeId) -> Result<NodeId> {
        let id = self.push_node(NodeKind::CastExpression { inner }, "");
        self.adopt(id, inner)?;
        Ok(id)
    }

    pub fn conditional(
        &mut self,
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    ) -> Result<NodeId> {
        let id = self.push_node(
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            },
            "?:",
        );
        self.adopt(id, condition)?;
        self.adopt(id, then_expr)?;
        self.adopt(id, else_expr)?;
        Ok(id)
    }

    pub fn subscript(&mut self, base: NodeId, index: NodeId) -> Result<NodeId> {
        let id = self.push_node(NodeKind::SubscriptExpression { base, index }, "[]");
        self.adopt(id, base)?;
        self.adopt(id, index)?;
        Ok(id)
    }

    pub fn key_value(&mut self, key: NodeId, value: NodeId) -> Result<NodeId> {
        let id = self.push_node(NodeKind::KeyValueExpression { key, value }, "");
        self.adopt(id, key)?;
        self.adopt(id, value)?;
        Ok(id)
    }

    pub fn initializer_list(&mut self, initializers: Vec<NodeId>) -> Result<NodeId> {
        let id = self.push_node(
            NodeKind::InitializerListExpression {
                initializers: initializers.clone(),
            },
            "",
        );
        self.adopt_all(id, &initializers)?;
        Ok(id)
    }

    pub fn call(&mut self, callee: impl Into<String>, arguments: Vec<NodeId>) -> Result<NodeId> {
        let callee = callee.into();
        let id = self.push_node(
            NodeKind::CallExpression {
                callee: callee.clone(),
                arguments: arguments.clone(),
            },
            callee,
        );
        self.adopt_all(id, &arguments)?;
        Ok(id)
    }

    // ── Analysis artifacts ─────────────────────────────────────────

    /// Creates an overlay node. It is never adopted into the AST tree; it
    /// can only be connected via EOG/DFG edges, which are then flagged as
    /// overlaying.
    pub fn overlay(&mut self, label: impl Into<String>) -> NodeId {
        let label = label.into();
        self.push_node(NodeKind::Overlay { label: label.clone() }, label)
    }
}
