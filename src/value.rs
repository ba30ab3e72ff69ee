use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::Block;
use crate::env::Environment;

/// Signature of a host-provided builtin.
///
/// Builtins receive the calling environment (so server and scheduler
/// builtins can invoke user callbacks in the right closure) plus the
/// positional arguments, and may return any value including an error.
pub type BuiltinFn = Arc<dyn Fn(&Arc<Environment>, Vec<Value>) -> Value + Send + Sync>;

/// A user function: captured parameters, shared body, and the environment
/// the literal was evaluated in (its closure).
pub struct FunctionValue {
    pub parameters: Vec<String>,
    pub body: Arc<Block>,
    pub env: Arc<Environment>,
}

/// A runtime value.
///
/// Two variants are control values that user code never observes directly:
/// [`Value::Return`] unwinds a block back to the enclosing function call,
/// and [`Value::Error`] propagates through every operation until a
/// `try`/`catch` consumes it or it reaches the program top.
///
/// # Truthiness
///
/// Only `null` and `false` are falsy. `0`, `""`, `[]` and `{}` are truthy.
///
/// # Examples
///
/// ```
/// use basil_lang::Value;
///
/// assert_eq!(Value::Integer(42).inspect(), "42");
/// assert_eq!(Value::String("a".into()).inspect(), "a"); // unquoted
/// assert!(Value::Integer(0).is_truthy());
/// assert!(!Value::Null.is_truthy());
/// ```
#[derive(Clone)]
pub enum Value {
    /// Absence of a value
    Null,

    /// Boolean
    Boolean(bool),

    /// 64-bit signed integer
    Integer(i64),

    /// 64-bit IEEE-754 float
    Float(f64),

    /// UTF-8 text
    String(String),

    /// Ordered value sequence
    Array(Vec<Value>),

    /// String-keyed mapping; iteration order is unspecified
    Hash(HashMap<String, Value>),

    /// User function with its closure
    Function(Arc<FunctionValue>),

    /// Host-provided callback from the builtin registry
    Builtin(BuiltinFn),

    /// Internal unwind wrapper; never survives a function call boundary
    Return(Box<Value>),

    /// Catchable failure carried as an ordinary value
    Error(String),
}

impl Value {
    /// The value's type name as surfaced by the `type` builtin and error
    /// messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(_) => "BOOLEAN",
            Value::Integer(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
        }
    }

    /// Condition truthiness: everything except `null` and `false` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Render the value as text. Total over all variants.
    ///
    /// Strings render raw (no quoting) because string concatenation and
    /// `throw` reuse this form.
    pub fn inspect(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|e| e.inspect()).collect();
                format!("[{}]", elements.join(", "))
            }
            Value::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{:?}: {}", k, v.inspect()))
                    .collect();
                format!("{{{}}}", pairs.join(", "))
            }
            Value::Function(func) => {
                format!(
                    "function({}) {{\n{}\n}}",
                    func.parameters.join(", "),
                    func.body
                )
            }
            Value::Builtin(_) => "builtin function".to_string(),
            Value::Return(inner) => inner.inspect(),
            Value::Error(message) => format!("ERROR: {}", message),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Arc::ptr_eq(a, b),
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Integer(n) => write!(f, "Integer({})", n),
            Value::Float(n) => write!(f, "Float({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(elements) => f.debug_tuple("Array").field(elements).finish(),
            Value::Hash(pairs) => f.debug_tuple("Hash").field(pairs).finish(),
            Value::Function(func) => {
                write!(f, "Function({})", func.parameters.join(", "))
            }
            Value::Builtin(_) => write!(f, "Builtin"),
            Value::Return(inner) => f.debug_tuple("Return").field(inner).finish(),
            Value::Error(message) => write!(f, "Error({:?})", message),
        }
    }
}
