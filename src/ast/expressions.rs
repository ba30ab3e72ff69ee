use std::fmt;
use std::sync::Arc;

use crate::ast::{Block, InfixOp, PrefixOp, Statement};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Control flow forms (`if`, `while`, `for`, `foreach`, `try`/`catch`) are
/// expressions: they evaluate to the last value their body produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal integer
    ///
    /// # Example
    /// ```text
    /// 42
    /// ```
    Integer(i64),

    /// Literal floating point number
    ///
    /// # Example
    /// ```text
    /// 3.14
    /// ```
    Float(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Boolean literal
    Boolean(bool),

    /// Variable or builtin reference
    Identifier(String),

    // Operations
    /// Prefix operation
    ///
    /// # Examples
    /// ```text
    /// -x
    /// !done
    /// not done
    /// ~mask
    /// ```
    Prefix { op: PrefixOp, right: Box<Expr> },

    /// Infix operation (arithmetic, comparison, logical, bitwise)
    Infix {
        op: InfixOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Ternary conditional
    ///
    /// Right-associative: `a ? b : c ? d : e` nests in the alternative.
    Ternary {
        condition: Box<Expr>,
        consequence: Box<Expr>,
        alternative: Box<Expr>,
    },

    // Control flow
    /// Conditional with optional alternative
    ///
    /// `else if` chains are represented as a nested `If` inside the
    /// alternative block.
    If {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },

    /// Condition loop
    While { condition: Box<Expr>, body: Block },

    /// Three-clause loop; any clause may be empty
    ///
    /// # Example
    /// ```text
    /// for (let i = 0; i < 10; i = i + 1) { print(i) }
    /// ```
    For {
        init: Option<Box<Statement>>,
        condition: Option<Box<Expr>>,
        increment: Option<Box<Statement>>,
        body: Block,
    },

    /// Collection loop over arrays (index, element) or hashes (key, value)
    ///
    /// # Examples
    /// ```text
    /// foreach v in items { print(v) }
    /// foreach i, v in items { print(i, v) }
    /// ```
    ForEach {
        key_var: Option<String>,
        value_var: String,
        iterable: Box<Expr>,
        body: Block,
    },

    /// Protected block with error handler
    ///
    /// The handler sees the caught error as a hash bound to `catch_var`.
    TryCatch {
        try_body: Block,
        catch_var: String,
        catch_body: Block,
    },

    // Functions
    /// Anonymous function literal
    ///
    /// The body is shared behind `Arc`; closures capture it by reference.
    Function {
        parameters: Vec<String>,
        body: Arc<Block>,
    },

    /// Call expression
    Call {
        function: Box<Expr>,
        arguments: Vec<Expr>,
    },

    // Access
    /// Property access (`left.name`)
    ///
    /// Routes to qualified builtins (`http.get`) when `left` is a bare
    /// identifier, otherwise reads a hash field.
    Property { left: Box<Expr>, name: String },

    /// Index access (`left[index]`)
    Index { left: Box<Expr>, index: Box<Expr> },

    // Literals (composite)
    /// Array literal
    Array(Vec<Expr>),

    /// Hash literal; keys are expressions evaluated to strings
    Hash(Vec<(Expr, Expr)>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Float(n) => write!(f, "{}", n),
            Expr::String(s) => write!(f, "\"{}\"", s),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Ternary {
                condition,
                consequence,
                alternative,
            } => write!(f, "({} ? {} : {})", condition, consequence, alternative),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {{ {} }}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, " else {{ {} }}", alt)?;
                }
                Ok(())
            }
            Expr::While { condition, body } => write!(f, "while {} {{ {} }}", condition, body),
            Expr::For {
                init,
                condition,
                increment,
                body,
            } => {
                write!(f, "for (")?;
                if let Some(init) = init {
                    write!(f, "{}", init)?;
                }
                write!(f, "; ")?;
                if let Some(condition) = condition {
                    write!(f, "{}", condition)?;
                }
                write!(f, "; ")?;
                if let Some(increment) = increment {
                    write!(f, "{}", increment)?;
                }
                write!(f, ") {{ {} }}", body)
            }
            Expr::ForEach {
                key_var,
                value_var,
                iterable,
                body,
            } => {
                write!(f, "foreach ")?;
                if let Some(key) = key_var {
                    write!(f, "{}, ", key)?;
                }
                write!(f, "{} in {} {{ {} }}", value_var, iterable, body)
            }
            Expr::TryCatch {
                try_body,
                catch_var,
                catch_body,
            } => write!(
                f,
                "try {{ {} }} catch {} {{ {} }}",
                try_body, catch_var, catch_body
            ),
            Expr::Function { parameters, body } => {
                write!(f, "function({}) {{\n{}\n}}", parameters.join(", "), body)
            }
            Expr::Call {
                function,
                arguments,
            } => {
                let args: Vec<String> = arguments.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", function, args.join(", "))
            }
            Expr::Property { left, name } => write!(f, "{}.{}", left, name),
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            Expr::Hash(pairs) => {
                let pairs: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}
