//! # Basil - Abstract Syntax Tree
//!
//! This module defines the tokens and Abstract Syntax Tree (AST) for Basil,
//! a small dynamically-typed scripting language for backend automation.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[operators]** - Prefix and infix operator kinds
//! - **[expressions]** - Expression nodes (literals, control flow, calls)
//! - **[statements]** - Statement nodes (bindings, return/throw, import, spawn)
//! - **[program]** - A parsed program (a statement sequence)
//!
//! ## Core Concepts
//!
//! A program is a sequence of statements separated by newlines or `;`:
//!
//! ```text
//! let greet = function(name) { return "hello " + name }
//! print(greet("basil"))
//! ```
//!
//! Control flow (`if`, `while`, `for`, `foreach`, `try`/`catch`) and function
//! literals are *expressions*; `let`, assignment, `global`, `return`, `throw`,
//! `import` and `spawn` are statements.
//!
//! ### Scoping
//!
//! ```text
//! global counter = 0                  // always binds in the root scope
//! let bump = function() { counter = counter + 1 }
//! ```
//!
//! ### Background tasks
//!
//! ```text
//! spawn worker(queue)
//! wait_all()
//! ```
//!
//! All nodes are immutable after parsing. Function bodies are shared behind
//! `Arc` so closures capture them by reference.
pub mod expressions;
pub mod operators;
pub mod program;
pub mod statements;
pub mod tokens;

pub use expressions::Expr;
pub use operators::{InfixOp, PrefixOp};
pub use program::Program;
pub use statements::{Block, Statement};
pub use tokens::Token;
