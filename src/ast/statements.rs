use std::fmt;

use crate::ast::Expr;

/// A single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Local binding in the current scope
    ///
    /// # Example
    /// ```text
    /// let total = price * count
    /// ```
    Let { name: String, value: Expr },

    /// Update of the nearest enclosing binding; creates a local binding when
    /// none exists anywhere in the chain
    ///
    /// # Example
    /// ```text
    /// total = total + 1
    /// ```
    Assign { name: String, value: Expr },

    /// Binding in the root scope, regardless of the current scope
    ///
    /// # Example
    /// ```text
    /// global counter = 0
    /// ```
    Global { name: String, value: Expr },

    /// Function return
    Return(Expr),

    /// Raise a value as a catchable error
    ///
    /// # Example
    /// ```text
    /// throw "connection refused"
    /// ```
    Throw(Expr),

    /// Module import; resolution is delegated to the host's import handler
    ///
    /// # Example
    /// ```text
    /// import "lib/util.basil" as util
    /// ```
    Import { path: String, alias: String },

    /// Launch a call on a background task
    ///
    /// The parser guarantees the operand was a call expression; callee and
    /// arguments are stored unwrapped.
    Spawn {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// Bare expression evaluated for its value
    Expression(Expr),
}

/// A brace-delimited statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {}", name, value),
            Statement::Assign { name, value } => write!(f, "{} = {}", name, value),
            Statement::Global { name, value } => write!(f, "global {} = {}", name, value),
            Statement::Return(value) => write!(f, "return {}", value),
            Statement::Throw(value) => write!(f, "throw {}", value),
            Statement::Import { path, alias } => write!(f, "import \"{}\" as {}", path, alias),
            Statement::Spawn {
                function,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "spawn {}({})", function, args.join(", "))
            }
            Statement::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stmts: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", stmts.join("; "))
    }
}
