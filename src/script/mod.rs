// src/script/mod.rs

//! Sandboxed evaluation of strategy scripts.
//!
//! Strategy programs arrive as source text in the small JavaScript dialect
//! emitted by the block editor's code generator. This module lexes, parses and
//! interprets that dialect without giving the script any access to the host:
//! the only globals are the builtins in `builtins.rs`, and every evaluation is
//! bounded by the limits in [`ScriptSettings`](crate::config::ScriptSettings).

mod ast;
mod builtins;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod value;

pub use ast::Program;
pub use error::ScriptError;
pub use interpreter::Interpreter;
pub use parser::parse;
pub use value::{format_number, BoundMethod, Closure, ConsoleLevel, Native, Object, Value};

pub(crate) use ast::{BinaryOp, Expr, UnaryOp};
pub(crate) use lexer::{tokenize, TokenKind};
pub(crate) use parser::parse_expression;
pub(crate) use value::release;
