//! Core runtime for the Spindle story engine.
//!
//! This crate holds everything downstream of parsing: the compiled program
//! model ([`Story`], [`Passage`], [`Command`], [`Expr`]), the typed value
//! system, the builtin function table, and the tick-driven [`Vm`] that
//! executes a story against a [`Host`] callback surface.
//!
//! The frontend that produces a [`Story`] from Twee source lives in the
//! `spindle-twee` crate; the terminal host lives in `spindle-cli`.

pub mod builtins;
pub mod error;
pub mod expr;
pub mod host;
pub mod story;
pub mod text;
pub mod value;
pub mod vm;

pub use error::RuntimeError;
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use host::{Host, Selection};
pub use story::{Command, Passage, Story, START_PASSAGE};
pub use value::Value;
pub use vm::{Vm, VmState, CALL_STACK_LIMIT, PAGE_LINES};
