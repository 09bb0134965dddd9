//! Graph vertices
//!
//! Every node lives in the arena of a [`PropertyGraph`](super::PropertyGraph)
//! and is addressed by its [`NodeId`]. The AST layer is a strict ownership
//! tree (single parent, no cycles); the auxiliary EOG/DFG layers reference
//! nodes by identity only.

use crate::features::value_evaluation::Value;
use crate::shared::models::PhysicalLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena index identifying a node inside one [`PropertyGraph`](super::PropertyGraph).
///
/// Identity-based: two structurally equal nodes still have distinct ids,
/// which is what the evaluator cache keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn offset(self, delta: u32) -> NodeId {
        NodeId(self.0 + delta)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a reference accesses the value it refers to.
///
/// `ReadWrite` marks references that are simultaneously read and written
/// (the operand of `i++`, the left side of `i += 1`); the evaluator needs
/// this to filter self-defining data-flow edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessKind {
    Read,
    Write,
    ReadWrite,
}

/// Binary operator codes handled by the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl BinaryOp {
    pub fn code(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// Whether this operator yields a boolean comparison result.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

/// Unary operator codes handled by the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Arithmetic negation `-`
    Negate,
    /// `++` (prefix or postfix, the graph does not distinguish)
    Increment,
    /// `--`
    Decrement,
}

impl UnaryOp {
    pub fn code(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Increment => "++",
            UnaryOp::Decrement => "--",
        }
    }
}

/// Assignment operator: plain `=` or a compound form reusing a binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOperator {
    Assign,
    /// `+=`, `*=`, ... — the wrapped operator drives evaluation
    Compound(BinaryOp),
}

/// The closed set of node kinds.
///
/// Consumers match exhaustively; a missing kind is a compile-time error, not
/// a runtime fallthrough. Child links inside the variants are AST ownership
/// links and are kept consistent with [`Node::ast_children`] by the
/// construction API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    // ── Declarations ───────────────────────────────────────────────
    /// Root of one source file's AST
    TranslationUnit,
    VariableDeclaration {
        initializer: Option<NodeId>,
    },
    FunctionDeclaration {
        body: Option<NodeId>,
    },

    // ── Statements ─────────────────────────────────────────────────
    Block,
    DeclarationStatement {
        declarations: Vec<NodeId>,
    },
    IfStatement {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    ForStatement {
        initializer: Option<NodeId>,
        condition: Option<NodeId>,
        iteration: Option<NodeId>,
        body: NodeId,
    },
    ReturnStatement {
        value: Option<NodeId>,
    },

    // ── Expressions ────────────────────────────────────────────────
    Literal {
        value: Value,
    },
    Reference {
        refers_to: Option<NodeId>,
        access: AccessKind,
    },
    UnaryOperator {
        op: UnaryOp,
        operand: NodeId,
    },
    BinaryOperator {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    AssignExpression {
        operator: AssignOperator,
        lhs: NodeId,
        rhs: NodeId,
        /// Whether the assignment's own result is consumed elsewhere
        used_as_expression: bool,
        /// Precomputed value node for expression use (normally the rhs)
        expression_value: Option<NodeId>,
    },
    CastExpression {
        inner: NodeId,
    },
    ConditionalExpression {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    SubscriptExpression {
        base: NodeId,
        index: NodeId,
    },
    KeyValueExpression {
        key: NodeId,
        value: NodeId,
    },
    InitializerListExpression {
        initializers: Vec<NodeId>,
    },
    CallExpression {
        callee: String,
        arguments: Vec<NodeId>,
    },

    // ── Analysis artifacts ─────────────────────────────────────────
    /// A node reachable only via EOG/DFG edges, never owned by the AST tree
    Overlay {
        label: String,
    },
}

impl NodeKind {
    /// Short kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::TranslationUnit => "TranslationUnit",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            NodeKind::Block => "Block",
            NodeKind::DeclarationStatement { .. } => "DeclarationStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Reference { .. } => "Reference",
            NodeKind::UnaryOperator { .. } => "UnaryOperator",
            NodeKind::BinaryOperator { .. } => "BinaryOperator",
            NodeKind::AssignExpression { .. } => "AssignExpression",
            NodeKind::CastExpression { .. } => "CastExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::SubscriptExpression { .. } => "SubscriptExpression",
            NodeKind::KeyValueExpression { .. } => "KeyValueExpression",
            NodeKind::InitializerListExpression { .. } => "InitializerListExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::Overlay { .. } => "Overlay",
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, NodeKind::Overlay { .. })
    }

    /// Rewrites every child id by `delta`. Used when one arena is absorbed
    /// into another after parallel parsing.
    pub(crate) fn offset_ids(&mut self, delta: u32) {
        let off = |id: &mut NodeId| *id = id.offset(delta);
        let off_opt = |id: &mut Option<NodeId>| {
            if let Some(id) = id {
                *id = id.offset(delta);
            }
        };
        match self {
            NodeKind::TranslationUnit | NodeKind::Block | NodeKind::Overlay { .. } => {}
            NodeKind::VariableDeclaration { initializer } => off_opt(initializer),
            NodeKind::FunctionDeclaration { body } => off_opt(body),
            NodeKind::DeclarationStatement { declarations } => {
                declarations.iter_mut().for_each(off)
            }
            NodeKind::IfStatement {
                condition,
                then_branch,
                else_branch,
            } => {
                off(condition);
                off(then_branch);
                off_opt(else_branch);
            }
            NodeKind::ForStatement {
                initializer,
                condition,
                iteration,
                body,
            } => {
                off_opt(initializer);
                off_opt(condition);
                off_opt(iteration);
                off(body);
            }
            NodeKind::ReturnStatement { value } => off_opt(value),
            NodeKind::Literal { .. } => {}
            NodeKind::Reference { refers_to, .. } => off_opt(refers_to),
            NodeKind::UnaryOperator { operand, .. } => off(operand),
            NodeKind::BinaryOperator { lhs, rhs, .. } => {
                off(lhs);
                off(rhs);
            }
            NodeKind::AssignExpression {
                lhs,
                rhs,
                expression_value,
                ..
            } => {
                off(lhs);
                off(rhs);
                off_opt(expression_value);
            }
            NodeKind::CastExpression { inner } => off(inner),
            NodeKind::ConditionalExpression {
                condition,
                then_expr,
                else_expr,
            } => {
                off(condition);
                off(then_expr);
                off(else_expr);
            }
            NodeKind::SubscriptExpression { base, index } => {
                off(base);
                off(index);
            }
            NodeKind::KeyValueExpression { key, value } => {
                off(key);
                off(value);
            }
            NodeKind::InitializerListExpression { initializers } => {
                initializers.iter_mut().for_each(off)
            }
            NodeKind::CallExpression { arguments, .. } => arguments.iter_mut().for_each(off),
        }
    }
}

/// A graph vertex: kind, name, source location, raw code and AST links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub location: Option<PhysicalLocation>,
    /// Raw source text this node was parsed from
    pub code: Option<String>,
    /// Source comment matched to this node, when the run asks for it
    pub comment: Option<String>,
    pub ast_parent: Option<NodeId>,
    pub ast_children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            location: None,
            code: None,
            comment: None,
            ast_parent: None,
            ast_children: Vec::new(),
        }
    }

    pub fn is_overlay(&self) -> bool {
        self.kind.is_overlay()
    }
}
