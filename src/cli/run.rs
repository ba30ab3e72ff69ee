//! Parse and execute Basil source against a fresh root environment.

use super::CliError;
use crate::env::Environment;
use crate::evaluator::eval_program;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;

/// Options for running a program
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Basil source text
    pub source: String,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a run operation
#[derive(Debug)]
pub enum RunOutcome {
    /// Syntax validation passed
    SyntaxValid,
    /// Program ran to completion with this top-level value
    Finished(Value),
}

/// Parse and evaluate one program.
///
/// A program with parse errors is never executed. An uncaught error value
/// becomes [`CliError::Runtime`].
pub fn execute_run(options: &RunOptions) -> Result<RunOutcome, CliError> {
    let lexer = Lexer::new(&options.source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(CliError::Parse(parser.errors().to_vec()));
    }

    if options.syntax_only {
        return Ok(RunOutcome::SyntaxValid);
    }

    let env = Environment::new();
    let result = eval_program(&program, &env);

    if let Value::Error(message) = result {
        return Err(CliError::Runtime(message));
    }

    Ok(RunOutcome::Finished(result))
}
