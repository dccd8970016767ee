//! Interpreter for a small expression-oriented math language.
//!
//! The language covers scalar arithmetic over machine integers, floats,
//! arbitrary-precision decimals and big integers, plus fixed-size vectors and
//! matrices, variables, and user-defined functions. Statements are separated
//! by newlines; each expression statement prints its value.
//!
//! # Language at a glance
//!
//! ```text
//! a = 2
//! u = (1 2 1)          # vector literal; spaces separate elements
//! v = (2 2 3)
//! u * v                # cross product of 3-D vectors
//! u . v                # dot product
//! m = [1 2, 3 4]       # matrix literal; commas separate rows
//! m ^ 2                # matrix power via repeated matrix products
//! double(x) => x * 2   # user-defined function
//! double(21)
//! ```
//!
//! Parsing is interleaved with evaluation on a stack machine: outside a
//! function definition every parsed operation executes immediately, while a
//! definition body is captured as an instruction list and replayed on each
//! call. See [`parser::Parser`] and [`machine::StackMachine`] for the two
//! halves, and [`values::Value`] for the runtime data model.
//!
//! # Examples
//!
//! ```
//! use mathlang::Session;
//!
//! let mut session = Session::new();
//! let response = session.evaluate("1 + 2");
//! assert!(response.errors.is_empty());
//! assert_eq!(response.outputs, ["3"]);
//!
//! // State persists across `evaluate` calls.
//! session.evaluate("a = 20");
//! let response = session.evaluate("a * 2 + 2");
//! assert_eq!(response.outputs, ["42"]);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod algebra;
pub mod error;
pub mod fns;
pub mod machine;
pub mod parser;
pub mod symbols;
pub mod token;
pub mod values;

pub use crate::{
    error::{Error, ErrorKind, Op},
    machine::{Instruction, StackMachine},
    values::{Value, ValueKind},
};

use crate::parser::Parser;

/// Outputs and errors produced by evaluating one source chunk.
///
/// Statements are independent: a failed statement contributes an error while
/// the statements around it still contribute outputs, in source order within
/// each list.
#[derive(Debug)]
pub struct Response {
    /// Rendered value of each successful printing statement.
    pub outputs: Vec<String>,
    /// Errors of the failed statements, each carrying its source position.
    pub errors: Vec<Error>,
}

/// Evaluation session: a stack machine whose variables and functions persist
/// across [`Self::evaluate`] calls.
#[derive(Debug, Default)]
pub struct Session {
    machine: StackMachine,
}

impl Session {
    /// Creates a session with the built-in functions registered and no
    /// variables bound.
    pub fn new() -> Self {
        Self {
            machine: StackMachine::new(),
        }
    }

    /// Returns the underlying machine.
    pub fn machine(&self) -> &StackMachine {
        &self.machine
    }

    /// Parses and executes `source`, which may contain multiple
    /// newline-separated statements.
    pub fn evaluate(&mut self, source: &str) -> Response {
        let (outputs, errors) = Parser::new(source, &mut self.machine).run();
        Response { outputs, errors }
    }

    /// Removes and returns the accumulated statement values, oldest first.
    pub fn drain_results(&mut self) -> Vec<Value> {
        self.machine.drain()
    }
}
