//! Expression AST.
//!
//! Expressions appear inside `<<if>>`, `<<set>>`, `<<print>>`, and the track
//! argument of `<<music>>`. The tree is immutable after parse; the VM walks
//! it with [`crate::vm::Vm`]'s evaluator.

use std::fmt;

use serde::Serialize;

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Integer literal.
    Int(i32),
    /// Boolean literal (`true` / `false`).
    Bool(bool),
    /// String literal, quotes already stripped.
    Str(String),
    /// Variable reference. Unknown variables read as the empty string.
    Variable(String),
    /// Builtin function call, e.g. `random(1, 6)`.
    Call { name: String, args: Vec<Expr> },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `not`
    Not,
    /// Unary `-`
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    // Logical, short-circuiting
    Or,
    And,
    // Equality (`==` / `is`, `!=` / `<>`)
    Eq,
    NotEq,
    // Ordering, ints only
    Lt,
    Gt,
    Le,
    Ge,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    /// Source spelling, used by the pretty-printer and error messages.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "or",
            BinaryOp::And => "and",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Int(n) => write!(f, "{n}"),
            Expr::Bool(b) => write!(f, "{b}"),
            Expr::Str(s) => write!(f, "{s:?}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::Unary { op: UnaryOp::Not, operand } => write!(f, "not {operand}"),
            Expr::Unary { op: UnaryOp::Neg, operand } => write!(f, "-{operand}"),
            Expr::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
        }
    }
}
