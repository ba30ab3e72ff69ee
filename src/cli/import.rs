//! Default file-based import resolver.
//!
//! Each imported module runs in its own fresh root environment; the value
//! bound under the alias is a snapshot of the module's top-level bindings.
//! There is no caching: importing the same path twice re-executes it.

use std::fs;

use crate::env::Environment;
use crate::evaluator::{eval_program, set_import_handler};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;

/// Install an import handler that resolves paths against the filesystem.
pub fn register_file_imports() {
    set_import_handler(|path| {
        let source = fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;

        let lexer = Lexer::new(&source);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();

        if !parser.errors().is_empty() {
            return Err(format!("parse errors in {}", path));
        }

        let env = Environment::new();
        let result = eval_program(&program, &env);
        if let Value::Error(message) = result {
            return Err(message);
        }

        Ok(env.export())
    });
}
