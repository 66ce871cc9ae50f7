//! Functions supplied by the embedding program, reached through `require`.
//!
//! A host function is either synchronous, returning its result directly, or
//! deferred: it receives a [`Completion`] and the program stays parked until
//! the embedder passes that completion to [`Interpreter::complete`]. A host
//! failure (`Err(info)`) becomes `throw(name, info)` inside the program.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::convert::{json_to_value, value_to_json};
use crate::diagnostic::Span;
use crate::format::value_to_string;
use crate::value::{Builtin, CallArgs, Function, Value};
use super::super::error::InterpreterError;
use super::super::evaluator::Interpreter;
use super::super::trampoline::{Bounce, Cont, Step};
use super::require_args;

pub type SyncHostFn = Rc<dyn Fn(&[Value]) -> Result<Value, Value>>;
pub type DeferredHostFn = Rc<dyn Fn(Vec<Value>, Completion)>;

#[derive(Clone)]
pub enum HostFunction {
    Sync(SyncHostFn),
    Deferred(DeferredHostFn),
}

impl HostFunction {
    pub fn sync(f: impl Fn(&[Value]) -> Result<Value, Value> + 'static) -> Self {
        HostFunction::Sync(Rc::new(f))
    }

    pub fn deferred(f: impl Fn(Vec<Value>, Completion) + 'static) -> Self {
        HostFunction::Deferred(Rc::new(f))
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostFunction::Sync(_) => write!(f, "<sync host function>"),
            HostFunction::Deferred(_) => write!(f, "<deferred host function>"),
        }
    }
}

/// The parked continuation of a deferred host call. Consumed by
/// [`Interpreter::complete`], so it resumes the program at most once.
pub struct Completion {
    k: Cont,
    name: Rc<str>,
    span: Span,
}

impl Completion {
    /// Name the host function was required under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").field("name", &self.name).finish()
    }
}

impl Interpreter {
    /// Resume a program parked on a deferred host call. `Err(info)` is
    /// thrown inside the program with the host function's name as the code.
    pub fn complete(&mut self, completion: Completion, result: Result<Value, Value>) -> Result<(), InterpreterError> {
        let Completion { k, name, span } = completion;
        debug!(host = %name, ok = result.is_ok(), "host completion");
        self.drive(Box::new(move |interp| match result {
            Ok(value) => interp.resume(k, value),
            Err(info) => interp.raise(Value::String(name), None, info, span),
        }))?;
        Ok(())
    }
}

/// `require(name)`: the registered host function `name` as a callable.
pub fn builtin_require(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    require_args!(args, 1, "require");
    let name = value_to_string(&args.get(0));
    let Some(host) = interp.hosts.get(&name).cloned() else {
        let message = format!("no host function named {}", name);
        return interp.raise(Value::string("require"), Some(message), args.get(0), args.span);
    };

    let name: Rc<str> = Rc::from(name);
    let builtin_name = Rc::clone(&name);
    let builtin = Builtin::new(&builtin_name, move |interp, k, args| call_host(interp, &name, &host, k, args));
    interp.resume(k, Value::function(Function::Builtin(builtin)))
}

fn call_host(interp: &mut Interpreter, name: &Rc<str>, host: &HostFunction, k: Cont, args: CallArgs) -> Step {
    match host {
        HostFunction::Sync(func) => match func(&args.values) {
            Ok(value) => interp.resume(k, value),
            Err(info) => interp.raise(Value::String(Rc::clone(name)), None, info, args.span),
        },
        HostFunction::Deferred(func) => {
            debug!(host = %name, "parked on deferred host call");
            func(args.values, Completion { k, name: Rc::clone(name), span: args.span });
            // Nothing runs until the completion fires
            Ok(Bounce::Done(Value::Undefined))
        }
    }
}

fn expect_string<'a>(args: &'a [Value], what: &str) -> Result<&'a str, Value> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| Value::string(&format!("{} must be a string", what)))
}

fn read_file(args: &[Value]) -> Result<Value, Value> {
    let path = expect_string(args, "path")?;
    std::fs::read_to_string(path)
        .map(|text| Value::string(&text))
        .map_err(|err| Value::string(&format!("{}: {}", path, err)))
}

fn json_parse(args: &[Value]) -> Result<Value, Value> {
    let text = expect_string(args, "text")?;
    serde_json::from_str(text)
        .map(json_to_value)
        .map_err(|err| Value::string(&err.to_string()))
}

fn json_stringify(args: &[Value]) -> Result<Value, Value> {
    let value = args.first().cloned().unwrap_or(Value::Undefined);
    let json = value_to_json(&value).map_err(|err| Value::string(&err.to_string()))?;
    serde_json::to_string(&json)
        .map(|text| Value::string(&text))
        .map_err(|err| Value::string(&err.to_string()))
}

/// Host functions every interpreter starts with.
pub fn default_hosts() -> HashMap<String, HostFunction> {
    let mut hosts = HashMap::new();
    hosts.insert("fs.readFile".to_string(), HostFunction::sync(read_file));
    hosts.insert("json.parse".to_string(), HostFunction::sync(json_parse));
    hosts.insert("json.stringify".to_string(), HostFunction::sync(json_stringify));
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_hosts() {
        let parsed = json_parse(&[Value::string(r#"{"a": [1, "x"]}"#)]).unwrap();
        let a = parsed.as_object().unwrap().get("a").cloned().unwrap();
        assert_eq!(a, Value::array(vec![Value::Number(1.0), Value::string("x")]));
        assert_eq!(json_stringify(&[parsed]).unwrap(), Value::string(r#"{"a":[1,"x"]}"#));
    }

    #[test]
    fn test_host_errors_are_values() {
        assert_eq!(json_parse(&[Value::Number(1.0)]).unwrap_err(), Value::string("text must be a string"));
        assert!(read_file(&[Value::string("/definitely/not/here")]).is_err());
    }

    #[test]
    fn test_stringify_rejects_self_containing_value() {
        let arr = Value::array(vec![]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        assert_eq!(
            json_stringify(&[arr]).unwrap_err(),
            Value::string("cannot convert a circular structure to JSON")
        );
    }
}
