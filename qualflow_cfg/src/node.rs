//! Nodes: the individual operations stored in basic blocks.
//!
//! Nodes are in three-address form. An operand is the [`NodeId`] of an
//! earlier node whose value it consumes, so an analysis can look up the
//! abstract value it computed for that node.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of the node in the graph's node table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A program entity whose abstract value can be tracked in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// A local variable or parameter
    Local(String),
    /// A field, either of an object (`owner` names the receiver) or a static
    /// field (`owner` names the declaring type)
    Field { owner: String, name: String },
    /// A side-effect-free expression identified by its canonical text
    Expr(String),
}

impl Entity {
    /// Shorthand for [`Entity::Local`].
    pub fn local(name: impl Into<String>) -> Self {
        Entity::Local(name.into())
    }

    /// Shorthand for [`Entity::Field`].
    pub fn field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Entity::Field {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, Entity::Field { .. })
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Local(name) => write!(f, "{}", name),
            Entity::Field { owner, name } => write!(f, "{}.{}", owner, name),
            Entity::Expr(text) => write!(f, "({})", text),
        }
    }
}

/// Literal values appearing in nodes and constant initializers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Text(s) => write!(f, "{:?}", s),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "null"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// String concatenation
    Concat,
}

impl BinaryOp {
    /// Returns true for operators producing a boolean from two operands
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns true for the short-circuit logical operators
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns true for operators that can fail at runtime (division by zero)
    pub fn may_throw(self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Rem)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

/// The operation a node performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A literal value
    Literal(Literal),
    /// Read of a local, field or expression
    Read(Entity),
    /// `target = value`
    Assign { target: Entity, value: NodeId },
    /// `array[index]`
    ArrayLoad { array: NodeId, index: NodeId },
    /// `array[index] = value`
    ArrayStore {
        array: NodeId,
        index: NodeId,
        value: NodeId,
    },
    /// `lhs op rhs`
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    /// `op operand`
    Unary { op: UnaryOp, operand: NodeId },
    /// Invocation of a routine by name
    Call {
        callee: String,
        #[serde(default)]
        receiver: Option<NodeId>,
        #[serde(default)]
        args: Vec<NodeId>,
    },
    /// Object or array allocation
    New {
        class: String,
        #[serde(default)]
        args: Vec<NodeId>,
    },
    /// Test of one `case` label against the switch scrutinee
    Case { scrutinee: NodeId, label: NodeId },
    /// Entry into an exception handler binding `parameter`
    Catch {
        parameter: String,
        #[serde(default)]
        exception: Option<String>,
    },
    /// Routine exit, with an optional result
    Return {
        #[serde(default)]
        value: Option<NodeId>,
    },
    /// Raise an exception
    Throw { value: NodeId },
}

impl NodeKind {
    /// Nodes whose values this node consumes, in evaluation order.
    pub fn operands(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Literal(_) | NodeKind::Read(_) | NodeKind::Catch { .. } => Vec::new(),
            NodeKind::Assign { value, .. } => vec![*value],
            NodeKind::ArrayLoad { array, index } => vec![*array, *index],
            NodeKind::ArrayStore {
                array,
                index,
                value,
            } => vec![*array, *index, *value],
            NodeKind::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Call { receiver, args, .. } => {
                receiver.iter().chain(args.iter()).copied().collect()
            }
            NodeKind::New { args, .. } => args.clone(),
            NodeKind::Case { scrutinee, label } => vec![*scrutinee, *label],
            NodeKind::Return { value } => value.iter().copied().collect(),
            NodeKind::Throw { value } => vec![*value],
        }
    }

    /// Returns true if evaluating the node can transfer control to an
    /// exception handler.
    pub fn may_throw(&self) -> bool {
        match self {
            NodeKind::Call { .. }
            | NodeKind::New { .. }
            | NodeKind::ArrayLoad { .. }
            | NodeKind::ArrayStore { .. }
            | NodeKind::Throw { .. } => true,
            NodeKind::Binary { op, .. } => op.may_throw(),
            _ => false,
        }
    }

    /// Returns true if the node can end a block with a two-way branch.
    pub fn is_conditional(&self) -> bool {
        match self {
            NodeKind::Case { .. } | NodeKind::Read(_) | NodeKind::Literal(Literal::Bool(_)) => true,
            NodeKind::Binary { op, .. } => op.is_comparison() || op.is_logical(),
            NodeKind::Unary { op, .. } => *op == UnaryOp::Not,
            NodeKind::Call { .. } => true,
            _ => false,
        }
    }
}

/// A node together with its identity and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub span: Span,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, span: Span) -> Self {
        Self { id, kind, span }
    }
}
