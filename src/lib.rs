pub mod ast;
pub mod builtins;
pub mod cli;
pub mod env;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{Block, Expr, InfixOp, PrefixOp, Program, Statement, Token};
pub use env::Environment;
pub use evaluator::{
    apply_function, eval_program, keep_alive, set_import_handler, set_keep_alive,
};
pub use lexer::Lexer;
pub use parser::{ParseError, Parser};
pub use value::{BuiltinFn, FunctionValue, Value};
