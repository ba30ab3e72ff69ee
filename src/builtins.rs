//! Process-wide builtin registry.
//!
//! Hosts install their function library here before running a program; the
//! evaluator consults the registry as a fallback after environment lookup.
//! Qualified names like `http.get` are stored with the literal dot and
//! reached through property access on a bare identifier.
//!
//! The core ships only `print`, `len`, `type` and the concurrency surface
//! (`wait_all`, `chan`); everything else is host-registered.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex, RwLock};

use crate::env::Environment;
use crate::value::Value;

static REGISTRY: LazyLock<RwLock<HashMap<String, Value>>> =
    LazyLock::new(|| RwLock::new(core_builtins()));

/// Install a builtin under `name`, replacing any existing entry.
///
/// # Examples
///
/// ```
/// use basil_lang::{builtins, Value};
///
/// builtins::register("http.get", |_env, args| {
///     Value::String(format!("GET {}", args[0].inspect()))
/// });
/// assert!(builtins::lookup("http.get").is_some());
/// ```
pub fn register<F>(name: &str, func: F)
where
    F: Fn(&Arc<Environment>, Vec<Value>) -> Value + Send + Sync + 'static,
{
    REGISTRY
        .write()
        .unwrap_or_else(|e| e.into_inner())
        .insert(name.to_string(), Value::Builtin(Arc::new(func)));
}

/// Look a builtin up by its exact registered name.
pub fn lookup(name: &str) -> Option<Value> {
    REGISTRY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

fn builtin<F>(func: F) -> Value
where
    F: Fn(&Arc<Environment>, Vec<Value>) -> Value + Send + Sync + 'static,
{
    Value::Builtin(Arc::new(func))
}

fn core_builtins() -> HashMap<String, Value> {
    let mut table = HashMap::new();

    table.insert(
        "print".to_string(),
        builtin(|_env, args| {
            let out: Vec<String> = args.iter().map(|arg| arg.inspect()).collect();
            println!("{}", out.join(" "));
            Value::Null
        }),
    );

    table.insert(
        "len".to_string(),
        builtin(|_env, args| {
            if args.len() != 1 {
                return Value::Error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            match &args[0] {
                Value::String(s) => Value::Integer(s.len() as i64),
                other => Value::Error(format!(
                    "argument to `len` not supported, got {}",
                    other.type_name()
                )),
            }
        }),
    );

    table.insert(
        "type".to_string(),
        builtin(|_env, args| {
            if args.len() != 1 {
                return Value::Error(format!(
                    "wrong number of arguments. got={}, want=1",
                    args.len()
                ));
            }
            Value::String(args[0].type_name().to_string())
        }),
    );

    table.insert(
        "wait_all".to_string(),
        builtin(|env, _args| {
            env.root().wait_tasks();
            Value::Null
        }),
    );

    // A channel is a hash of two builtins closed over one shared buffer:
    // an unbounded mutex-guarded Vec, not a rendezvous.
    table.insert(
        "chan".to_string(),
        builtin(|_env, _args| {
            let items: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));

            let send_items = Arc::clone(&items);
            let send = builtin(move |_env, args| {
                if args.len() != 1 {
                    return Value::Error("chan.send needs exactly 1 argument".to_string());
                }
                send_items
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(args.into_iter().next().unwrap_or(Value::Null));
                Value::Null
            });

            let read_items = Arc::clone(&items);
            let read_all = builtin(move |_env, _args| {
                let items = read_items.lock().unwrap_or_else(|e| e.into_inner());
                Value::Array(items.clone())
            });

            let mut pairs = HashMap::new();
            pairs.insert("send".to_string(), send);
            pairs.insert("read_all".to_string(), read_all);
            Value::Hash(pairs)
        }),
    );

    table
}
