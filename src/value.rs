use indexmap::IndexMap;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ast::{Ident, NodeRef};
use crate::diagnostic::Span;
use crate::interpreter::{Cont, Environment, Interpreter, Step};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Callable),
    /// A scope used as a value; `this` outside of any method call.
    Scope(Environment),
    /// Produced by `discard`; dropped from `for` accumulators.
    Discard,
}

/// Structural comparison for host code and tests. The language's own `==`
/// is [`Value::strict_equals`]. Two containers that are already being
/// compared further up count as equal, so self-containing values terminate.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        structural_eq(self, other, &mut Vec::new())
    }
}

fn structural_eq(left: &Value, right: &Value, open: &mut Vec<(usize, usize)>) -> bool {
    let pair = match (left, right) {
        (Value::Array(l), Value::Array(r)) => (Rc::as_ptr(l) as *const () as usize, Rc::as_ptr(r) as *const () as usize),
        (Value::Object(l), Value::Object(r)) => (Rc::as_ptr(l) as *const () as usize, Rc::as_ptr(r) as *const () as usize),
        (Value::Null, Value::Null) => return true,
        (Value::Undefined, Value::Undefined) => return true,
        (Value::Discard, Value::Discard) => return true,
        (Value::Bool(left_bool), Value::Bool(right_bool)) => return left_bool == right_bool,
        (Value::Number(left_num), Value::Number(right_num)) => return left_num == right_num,
        (Value::String(left_str), Value::String(right_str)) => return left_str == right_str,
        (Value::Function(left_fn), Value::Function(right_fn)) => {
            return Rc::ptr_eq(&left_fn.function, &right_fn.function)
        }
        (Value::Scope(left_env), Value::Scope(right_env)) => return left_env.same_scope(right_env),
        _ => return false,
    };
    if pair.0 == pair.1 || open.contains(&pair) {
        return true;
    }

    open.push(pair);
    let equal = match (left, right) {
        (Value::Array(l), Value::Array(r)) => {
            let (l, r) = (l.borrow(), r.borrow());
            l.len() == r.len() && l.iter().zip(r.iter()).all(|(a, b)| structural_eq(a, b, open))
        }
        (Value::Object(l), Value::Object(r)) => {
            let (l, r) = (l.borrow(), r.borrow());
            l.len() == r.len()
                && l.iter().all(|(key, a)| r.get(key).is_some_and(|b| structural_eq(a, b, open)))
        }
        _ => false,
    };
    open.pop();
    equal
}

impl Value {
    pub fn string(text: &str) -> Self {
        Value::String(Rc::from(text))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(entries: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(entries)))
    }

    pub fn function(function: Function) -> Self {
        Value::Function(Callable::new(Rc::new(function)))
    }

    pub fn as_array(&self) -> Option<Ref<'_, Vec<Value>>> {
        if let Value::Array(array) = self {
            Some(array.borrow())
        } else {
            None
        }
    }

    pub fn as_object(&self) -> Option<Ref<'_, IndexMap<String, Value>>> {
        if let Value::Object(object) = self {
            Some(object.borrow())
        } else {
            None
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(numeric_value) = self {
            Some(*numeric_value)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(string_ref) = self {
            Some(string_ref.as_ref())
        } else {
            None
        }
    }

    /// `null`, `false`, `0` and `""` are falsy. Everything else, including
    /// `undefined` and the discard marker, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The language's `==`: primitives compare by value, containers and
    /// functions by identity, values of different kinds never match.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Discard, Value::Discard) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.function, &b.function),
            (Value::Scope(a), Value::Scope(b)) => a.same_scope(b),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Scope(_) => "scope",
            Value::Discard => "discard",
        }
    }
}

/// A function value together with the receiver it was read from.
///
/// Member access (`obj.method`, `obj[key]`) tags the callable with `obj`;
/// the next call consumes the tag as `this`. The function itself is shared
/// and never mutated, so the same closure can be in flight with different
/// receivers.
#[derive(Clone)]
pub struct Callable {
    pub function: Rc<Function>,
    pub receiver: Option<Box<Value>>,
}

impl Callable {
    pub fn new(function: Rc<Function>) -> Self {
        Self { function, receiver: None }
    }

    pub fn with_receiver(&self, receiver: Value) -> Self {
        Self {
            function: Rc::clone(&self.function),
            receiver: Some(Box::new(receiver)),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.receiver {
            Some(receiver) => write!(f, "{:?} bound to {}", self.function, receiver.type_name()),
            None => write!(f, "{:?}", self.function),
        }
    }
}

pub enum Function {
    Closure(Closure),
    Builtin(Builtin),
    /// Escape continuation handed out by `callCC`.
    Continuation(Cont),
}

impl Function {
    pub fn name(&self) -> Option<&str> {
        match self {
            Function::Closure(closure) => closure.name.as_deref(),
            Function::Builtin(builtin) => Some(&builtin.name),
            Function::Continuation(_) => None,
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Closure(closure) => match &closure.name {
                Some(name) => write!(f, "<function {}>", name),
                None => write!(f, "<function>"),
            },
            Function::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name),
            Function::Continuation(_) => write!(f, "<continuation>"),
        }
    }
}

/// A user function: captured defining scope, parameters and body.
pub struct Closure {
    pub name: Option<Rc<str>>,
    pub params: Rc<[Ident]>,
    pub body: NodeRef,
    pub env: Environment,
}

/// Host calling convention: the continuation comes first and must be
/// resumed exactly once on every success path, either before returning or
/// later through a deferred completion.
pub type BuiltinFn = Rc<dyn Fn(&mut Interpreter, Cont, CallArgs) -> Step>;

pub struct Builtin {
    pub name: Rc<str>,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &str, func: impl Fn(&mut Interpreter, Cont, CallArgs) -> Step + 'static) -> Self {
        Self {
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }
}

/// Arguments of one builtin invocation.
pub struct CallArgs {
    pub values: Vec<Value>,
    pub receiver: Option<Value>,
    pub span: Span,
}

impl CallArgs {
    pub fn get(&self, index: usize) -> Value {
        self.values.get(index).cloned().unwrap_or(Value::Undefined)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
