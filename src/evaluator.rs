//! Tree-walking evaluator.
//!
//! One recursive walk over the AST against an environment chain. Runtime
//! failures are carried as [`Value::Error`] and short-circuit every
//! operation until a `try`/`catch` consumes them or they reach the program
//! top; `return` unwinds through blocks as [`Value::Return`] and is
//! unwrapped at the function call boundary.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use crate::ast::{Block, Expr, InfixOp, PrefixOp, Program, Statement};
use crate::builtins;
use crate::env::Environment;
use crate::value::{FunctionValue, Value};

/// Host hook resolving `import "path" as name`. The core makes no
/// assumption about the path format.
pub type ImportHandler = Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>;

static IMPORT_HANDLER: RwLock<Option<ImportHandler>> = RwLock::new(None);

static KEEP_ALIVE: AtomicBool = AtomicBool::new(false);

/// Register the import resolver used by every subsequent `import`.
pub fn set_import_handler<F>(handler: F)
where
    F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
{
    *IMPORT_HANDLER.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(handler));
}

fn import_handler() -> Option<ImportHandler> {
    IMPORT_HANDLER
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Ask the host to stay alive after the top-level program returns. Server
/// and scheduler builtins set this.
pub fn set_keep_alive(enabled: bool) {
    KEEP_ALIVE.store(enabled, Ordering::SeqCst);
}

pub fn keep_alive() -> bool {
    KEEP_ALIVE.load(Ordering::SeqCst)
}

macro_rules! new_error {
    ($($arg:tt)*) => {
        Value::Error(format!($($arg)*))
    };
}

/// Evaluate a whole program against `env`, unwrapping any top-level
/// `return` and stopping at the first uncaught error.
pub fn eval_program(program: &Program, env: &Arc<Environment>) -> Value {
    let mut result = Value::Null;

    for statement in &program.statements {
        match eval_statement(statement, env) {
            Value::Return(inner) => return *inner,
            error @ Value::Error(_) => return error,
            value => result = value,
        }
    }

    result
}

fn eval_block(block: &Block, env: &Arc<Environment>) -> Value {
    let mut result = Value::Null;

    for statement in &block.statements {
        result = eval_statement(statement, env);

        // Return/Error pass through unwrapped so unwinding continues.
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_statement(stmt: &Statement, env: &Arc<Environment>) -> Value {
    match stmt {
        Statement::Expression(expr) => eval_expression(expr, env),
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.set(name.clone(), value);
            Value::Null
        }
        Statement::Assign { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.update(name, value);
            Value::Null
        }
        Statement::Global { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.root().set(name.clone(), value);
            Value::Null
        }
        Statement::Return(expr) => {
            let value = eval_expression(expr, env);
            if value.is_error() {
                return value;
            }
            Value::Return(Box::new(value))
        }
        Statement::Throw(expr) => {
            let value = eval_expression(expr, env);
            if value.is_error() {
                return value;
            }
            // Any thrown value becomes a catchable error carrying its text.
            Value::Error(value.inspect())
        }
        Statement::Import { path, alias } => eval_import(path, alias, env),
        Statement::Spawn {
            function,
            arguments,
        } => eval_spawn(function, arguments, env),
    }
}

fn eval_expression(expr: &Expr, env: &Arc<Environment>) -> Value {
    match expr {
        Expr::Integer(n) => Value::Integer(*n),
        Expr::Float(n) => Value::Float(*n),
        Expr::String(s) => Value::String(s.clone()),
        Expr::Boolean(b) => Value::Boolean(*b),
        Expr::Identifier(name) => eval_identifier(name, env),
        Expr::Prefix { op, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(*op, right)
        }
        Expr::Infix { op, left, right } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_infix_expression(*op, left, right)
        }
        Expr::Ternary {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env);
            if condition.is_error() {
                return condition;
            }
            if condition.is_truthy() {
                eval_expression(consequence, env)
            } else {
                eval_expression(alternative, env)
            }
        }
        Expr::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_ref(), env),
        Expr::While { condition, body } => eval_while_expression(condition, body, env),
        Expr::For {
            init,
            condition,
            increment,
            body,
        } => eval_for_expression(
            init.as_deref(),
            condition.as_deref(),
            increment.as_deref(),
            body,
            env,
        ),
        Expr::ForEach {
            key_var,
            value_var,
            iterable,
            body,
        } => eval_foreach_expression(key_var.as_deref(), value_var, iterable, body, env),
        Expr::TryCatch {
            try_body,
            catch_var,
            catch_body,
        } => eval_try_catch_expression(try_body, catch_var, catch_body, env),
        Expr::Function { parameters, body } => Value::Function(Arc::new(FunctionValue {
            parameters: parameters.clone(),
            body: Arc::clone(body),
            env: Arc::clone(env),
        })),
        Expr::Call {
            function,
            arguments,
        } => {
            let function = eval_expression(function, env);
            if function.is_error() {
                return function;
            }
            let args = eval_expressions(arguments, env);
            if args.len() == 1 && args[0].is_error() {
                return args[0].clone();
            }
            apply_function(env, &function, args)
        }
        Expr::Property { left, name } => eval_property_expression(left, name, env),
        Expr::Index { left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expr::Array(elements) => {
            let elements = eval_expressions(elements, env);
            if elements.len() == 1 && elements[0].is_error() {
                return elements[0].clone();
            }
            Value::Array(elements)
        }
        Expr::Hash(pairs) => eval_hash_literal(pairs, env),
    }
}

fn eval_identifier(name: &str, env: &Arc<Environment>) -> Value {
    if let Some(value) = env.get(name) {
        return value;
    }
    if let Some(builtin) = builtins::lookup(name) {
        return builtin;
    }
    new_error!("identifier not found: {}", name)
}

fn eval_prefix_expression(op: PrefixOp, right: Value) -> Value {
    match op {
        PrefixOp::Not => match right {
            Value::Boolean(b) => Value::Boolean(!b),
            Value::Null => Value::Boolean(true),
            _ => Value::Boolean(false),
        },
        PrefixOp::Neg => match right {
            Value::Integer(n) => Value::Integer(n.wrapping_neg()),
            other => new_error!("unknown operator: -{}", other.type_name()),
        },
        PrefixOp::BitNot => match right {
            Value::Integer(n) => Value::Integer(!n),
            other => new_error!("unknown operator: ~{}", other.type_name()),
        },
    }
}

fn eval_infix_expression(op: InfixOp, left: Value, right: Value) -> Value {
    // `+` concatenates arrays; scripts grow lists with `xs = xs + [x]`.
    if op == InfixOp::Add {
        if let (Value::Array(l), Value::Array(r)) = (&left, &right) {
            let mut combined = l.clone();
            combined.extend(r.iter().cloned());
            return Value::Array(combined);
        }
    }

    match (op, &left, &right) {
        // `and`/`or` compare truthiness; both sides were already evaluated.
        (InfixOp::And, _, _) => Value::Boolean(left.is_truthy() && right.is_truthy()),
        (InfixOp::Or, _, _) => Value::Boolean(left.is_truthy() || right.is_truthy()),
        // `+` with any string operand concatenates the rendered forms.
        (InfixOp::Add, Value::String(_), _) | (InfixOp::Add, _, Value::String(_)) => {
            Value::String(left.inspect() + &right.inspect())
        }
        (_, Value::Integer(l), Value::Integer(r)) => eval_integer_infix(op, *l, *r),
        (_, Value::Float(_), _) | (_, _, Value::Float(_)) => eval_float_infix(op, &left, &right),
        (_, Value::String(l), Value::String(r)) => eval_string_infix(op, l, r),
        // Mixed-type equality falls back to the rendered forms, so
        // `"1" == 1` holds. Scripts depend on this laxity.
        (InfixOp::Eq, _, _) => Value::Boolean(left.inspect() == right.inspect()),
        (InfixOp::NotEq, _, _) => Value::Boolean(left.inspect() != right.inspect()),
        _ if left.type_name() != right.type_name() => new_error!(
            "type mismatch: {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ),
        _ => new_error!(
            "unknown operator: {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ),
    }
}

fn eval_integer_infix(op: InfixOp, left: i64, right: i64) -> Value {
    match op {
        InfixOp::Add => Value::Integer(left.wrapping_add(right)),
        InfixOp::Sub => Value::Integer(left.wrapping_sub(right)),
        InfixOp::Mul => Value::Integer(left.wrapping_mul(right)),
        InfixOp::Div => {
            if right == 0 {
                new_error!("division by zero")
            } else {
                Value::Integer(left.wrapping_div(right))
            }
        }
        InfixOp::Mod => {
            if right == 0 {
                new_error!("division by zero")
            } else {
                Value::Integer(left.wrapping_rem(right))
            }
        }
        InfixOp::BitAnd => Value::Integer(left & right),
        InfixOp::BitOr => Value::Integer(left | right),
        InfixOp::BitXor => Value::Integer(left ^ right),
        InfixOp::Shl => Value::Integer(if (0..64).contains(&right) {
            left << right
        } else {
            0
        }),
        InfixOp::Shr => Value::Integer(if (0..64).contains(&right) {
            left >> right
        } else if left < 0 {
            -1
        } else {
            0
        }),
        InfixOp::Lt => Value::Boolean(left < right),
        InfixOp::LtEq => Value::Boolean(left <= right),
        InfixOp::Gt => Value::Boolean(left > right),
        InfixOp::GtEq => Value::Boolean(left >= right),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
        _ => new_error!("unknown operator: INTEGER {} INTEGER", op),
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Float(n) => *n,
        Value::Integer(n) => *n as f64,
        _ => 0.0,
    }
}

fn eval_float_infix(op: InfixOp, left: &Value, right: &Value) -> Value {
    let l = as_f64(left);
    let r = as_f64(right);

    match op {
        InfixOp::Add => Value::Float(l + r),
        InfixOp::Sub => Value::Float(l - r),
        InfixOp::Mul => Value::Float(l * r),
        InfixOp::Div => Value::Float(l / r),
        InfixOp::Lt => Value::Boolean(l < r),
        InfixOp::LtEq => Value::Boolean(l <= r),
        InfixOp::Gt => Value::Boolean(l > r),
        InfixOp::GtEq => Value::Boolean(l >= r),
        InfixOp::Eq => Value::Boolean(l == r),
        InfixOp::NotEq => Value::Boolean(l != r),
        _ => new_error!(
            "unknown operator: {} {} {}",
            left.type_name(),
            op,
            right.type_name()
        ),
    }
}

fn eval_string_infix(op: InfixOp, left: &str, right: &str) -> Value {
    match op {
        InfixOp::Add => Value::String(format!("{}{}", left, right)),
        InfixOp::Eq => Value::Boolean(left == right),
        InfixOp::NotEq => Value::Boolean(left != right),
        _ => new_error!("unknown operator: STRING {} STRING", op),
    }
}

fn eval_if_expression(
    condition: &Expr,
    consequence: &Block,
    alternative: Option<&Block>,
    env: &Arc<Environment>,
) -> Value {
    let condition = eval_expression(condition, env);
    if condition.is_error() {
        return condition;
    }

    if condition.is_truthy() {
        eval_block(consequence, env)
    } else if let Some(alternative) = alternative {
        eval_block(alternative, env)
    } else {
        Value::Null
    }
}

fn eval_while_expression(condition: &Expr, body: &Block, env: &Arc<Environment>) -> Value {
    let mut result = Value::Null;

    loop {
        let cond = eval_expression(condition, env);
        if cond.is_error() {
            return cond;
        }
        if !cond.is_truthy() {
            break;
        }

        result = eval_block(body, env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_for_expression(
    init: Option<&Statement>,
    condition: Option<&Expr>,
    increment: Option<&Statement>,
    body: &Block,
    env: &Arc<Environment>,
) -> Value {
    // One fresh scope for the whole loop: a `let` in the initializer is
    // loop-local.
    let for_env = Environment::new_enclosed(env);
    let mut result = Value::Null;

    if let Some(init) = init {
        let value = eval_statement(init, &for_env);
        if value.is_error() {
            return value;
        }
    }

    loop {
        if let Some(condition) = condition {
            let cond = eval_expression(condition, &for_env);
            if cond.is_error() {
                return cond;
            }
            if !cond.is_truthy() {
                break;
            }
        }

        result = eval_block(body, &for_env);
        if matches!(result, Value::Return(_) | Value::Error(_)) {
            return result;
        }

        if let Some(increment) = increment {
            let value = eval_statement(increment, &for_env);
            if value.is_error() {
                return value;
            }
        }
    }

    result
}

fn eval_foreach_expression(
    key_var: Option<&str>,
    value_var: &str,
    iterable: &Expr,
    body: &Block,
    env: &Arc<Environment>,
) -> Value {
    let iterable = eval_expression(iterable, env);
    if iterable.is_error() {
        return iterable;
    }

    let mut result = Value::Null;

    match iterable {
        Value::Array(elements) => {
            for (i, element) in elements.into_iter().enumerate() {
                // Fresh scope per iteration: closures created in the body
                // capture this iteration's binding, not the loop's last one.
                let loop_env = Environment::new_enclosed(env);

                if let Some(key_var) = key_var {
                    loop_env.set(key_var.to_string(), Value::Integer(i as i64));
                }
                loop_env.set(value_var.to_string(), element);

                result = eval_block(body, &loop_env);
                if matches!(result, Value::Return(_) | Value::Error(_)) {
                    return result;
                }
            }
        }
        Value::Hash(pairs) => {
            for (key, value) in pairs {
                let loop_env = Environment::new_enclosed(env);

                if let Some(key_var) = key_var {
                    loop_env.set(key_var.to_string(), Value::String(key));
                }
                loop_env.set(value_var.to_string(), value);

                result = eval_block(body, &loop_env);
                if matches!(result, Value::Return(_) | Value::Error(_)) {
                    return result;
                }
            }
        }
        other => return new_error!("not iterable: {}", other.type_name()),
    }

    result
}

fn eval_try_catch_expression(
    try_body: &Block,
    catch_var: &str,
    catch_body: &Block,
    env: &Arc<Environment>,
) -> Value {
    let result = eval_block(try_body, env);

    if let Value::Error(message) = result {
        let mut pairs = HashMap::new();
        pairs.insert("message".to_string(), Value::String(message));

        let catch_env = Environment::new_enclosed(env);
        catch_env.set(catch_var.to_string(), Value::Hash(pairs));
        return eval_block(catch_body, &catch_env);
    }

    result
}

fn eval_property_expression(left: &Expr, name: &str, env: &Arc<Environment>) -> Value {
    // A bare identifier on the left routes to qualified builtins first, so
    // `http.get` resolves even with no `http` binding in scope.
    if let Expr::Identifier(base) = left {
        let qualified = format!("{}.{}", base, name);
        if let Some(builtin) = builtins::lookup(&qualified) {
            return builtin;
        }
    }

    let left = eval_expression(left, env);
    if left.is_error() {
        return left;
    }

    match left {
        Value::Hash(pairs) => pairs.get(name).cloned().unwrap_or(Value::Null),
        other => new_error!("property access not supported on {}", other.type_name()),
    }
}

fn eval_index_expression(left: Value, index: Value) -> Value {
    match (left, index) {
        (Value::Array(elements), Value::Integer(idx)) => {
            if idx < 0 || idx as usize >= elements.len() {
                Value::Null
            } else {
                elements[idx as usize].clone()
            }
        }
        (Value::Hash(pairs), Value::String(key)) => {
            pairs.get(&key).cloned().unwrap_or(Value::Null)
        }
        (Value::Hash(_), index) => new_error!("unusable as hash key: {}", index.type_name()),
        (left, _) => new_error!("index operator not supported: {}", left.type_name()),
    }
}

fn eval_hash_literal(pairs: &[(Expr, Expr)], env: &Arc<Environment>) -> Value {
    let mut map = HashMap::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if key.is_error() {
            return key;
        }
        let key = match key {
            Value::String(key) => key,
            other => return new_error!("unusable as hash key: {}", other.type_name()),
        };

        let value = eval_expression(value_expr, env);
        if value.is_error() {
            return value;
        }

        map.insert(key, value);
    }

    Value::Hash(map)
}

fn eval_expressions(exprs: &[Expr], env: &Arc<Environment>) -> Vec<Value> {
    let mut result = Vec::with_capacity(exprs.len());

    for expr in exprs {
        let value = eval_expression(expr, env);
        if value.is_error() {
            return vec![value];
        }
        result.push(value);
    }

    result
}

/// Apply a user function or builtin to already-evaluated arguments.
///
/// Builtins receive the calling environment; user functions run in a fresh
/// scope enclosed by their captured closure environment.
pub fn apply_function(env: &Arc<Environment>, function: &Value, args: Vec<Value>) -> Value {
    match function {
        Value::Function(func) => {
            if args.len() != func.parameters.len() {
                return new_error!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    func.parameters.len()
                );
            }

            let call_env = Environment::new_enclosed(&func.env);
            for (parameter, arg) in func.parameters.iter().zip(args) {
                call_env.set(parameter.clone(), arg);
            }

            unwrap_return(eval_block(&func.body, &call_env))
        }
        Value::Builtin(func) => (**func)(env, args),
        other => new_error!("not a function: {}", other.type_name()),
    }
}

fn unwrap_return(value: Value) -> Value {
    match value {
        Value::Return(inner) => *inner,
        other => other,
    }
}

fn eval_import(path: &str, alias: &str, env: &Arc<Environment>) -> Value {
    let handler = match import_handler() {
        Some(handler) => handler,
        None => return new_error!("import handler not registered"),
    };

    match (*handler)(path) {
        Ok(module) => {
            env.set(alias.to_string(), module);
            Value::Null
        }
        Err(message) => new_error!("import error: {}", message),
    }
}

fn eval_spawn(function: &Expr, arguments: &[Expr], env: &Arc<Environment>) -> Value {
    // Callee and arguments evaluate on the caller's thread so their errors
    // surface synchronously.
    let callee = eval_expression(function, env);
    if callee.is_error() {
        return callee;
    }
    let args = eval_expressions(arguments, env);
    if args.len() == 1 && args[0].is_error() {
        return args[0].clone();
    }

    let root = env.root();
    root.add_task();

    let task_env = Arc::clone(env);
    thread::spawn(move || {
        let result = apply_function(&task_env, &callee, args);
        if let Value::Error(message) = result {
            eprintln!("ERROR in background task: {}", message);
        }
        task_env.root().task_done();
    });

    Value::Null
}
