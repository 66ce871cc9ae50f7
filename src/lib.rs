//! `circ`: a continuation-passing interpreter for syntax trees of the Circ
//! scripting language.
//!
//! Programs arrive as the JSON tree emitted by the Circ front end (see
//! [`ast`]) or are built directly with [`ast::build`], and run on an
//! [`Interpreter`]. Evaluation is stack-safe: deep recursion in a program
//! never deepens the native stack past a fixed bound.

pub mod ast;
pub mod config;
pub mod convert;
pub mod diagnostic;
pub mod format;
pub mod interpreter;
pub mod value;

pub use ast::{Node, NodeKind, NodeRef};
pub use config::{InterpreterConfig, UnwindPolicy};
pub use interpreter::{run_json, run_json_with_diagnostics, Completion, Environment, HostFunction, Interpreter, InterpreterError};
pub use value::Value;
