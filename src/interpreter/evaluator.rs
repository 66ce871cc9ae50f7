use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::ast::{BinaryOp, Ident, Node, NodeKind, NodeList, NodeRef, Property};
use crate::config::InterpreterConfig;
use crate::diagnostic::{Diagnostic, Span};
use crate::format::{property_key, value_to_string};
use crate::value::{Builtin, CallArgs, Callable, Closure, Function, Value};
use super::builtins::{self, host::{self, HostFunction}};
use super::control_flow::LoopStack;
use super::environment::Environment;
use super::error::InterpreterError;
use super::handlers::HandlerStack;
use super::trampoline::{cont, Bounce, Cont, Step, Trampoline};

/// Receives the values of an argument or item list once all of them are
/// evaluated.
type ListCont = Rc<dyn Fn(&mut Interpreter, Vec<Value>) -> Step>;

fn list_cont(f: impl Fn(&mut Interpreter, Vec<Value>) -> Step + 'static) -> ListCont {
    Rc::new(f)
}

pub struct Interpreter {
    pub(crate) config: InterpreterConfig,
    pub(crate) trampoline: Trampoline,
    pub(crate) handlers: HandlerStack,
    pub(crate) loops: LoopStack,
    root: Environment,
    globals: Environment,
    /// `this` for calls without a receiver: the environment the current
    /// program was started in.
    context: Environment,
    pub(crate) hosts: HashMap<String, HostFunction>,
    pub(crate) output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    /// Builtins go into a depth-0 root; programs run in its depth-1 child.
    pub fn with_config(config: InterpreterConfig) -> Self {
        let root = Environment::root();
        builtins::install(&root);
        let globals = root.extend();
        Self {
            trampoline: Trampoline::new(config.step_budget),
            config,
            handlers: HandlerStack::default(),
            loops: LoopStack::default(),
            root,
            context: globals.clone(),
            globals,
            hosts: host::default_hosts(),
            output: Box::new(io::stdout()),
        }
    }

    /// Replace the sink `println` and `time` write to.
    pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn root(&self) -> &Environment {
        &self.root
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    /// Handler frames registered by `try` calls that have not finished.
    pub fn pending_handlers(&self) -> usize {
        self.handlers.height()
    }

    /// `for` loops that have started and not finished.
    pub fn active_loops(&self) -> usize {
        self.loops.height()
    }

    /// Install an immutable builtin. `func` receives the continuation first
    /// and must resume it exactly once.
    pub fn register_builtin(
        &mut self,
        name: &str,
        func: impl Fn(&mut Interpreter, Cont, CallArgs) -> Step + 'static,
    ) {
        let builtin = Builtin::new(name, func);
        self.root.define_builtin(name, Value::function(Function::Builtin(builtin)));
    }

    /// Make a host function available to `require(name)`.
    pub fn register_host(&mut self, name: &str, host: HostFunction) {
        self.hosts.insert(name.to_string(), host);
    }

    /// Evaluate `program` in `env`, passing its value to `callback`.
    ///
    /// `Ok` without the callback having fired means the program is parked on
    /// a deferred host call; [`Interpreter::complete`] picks it up again.
    pub fn execute(
        &mut self,
        program: &NodeRef,
        env: &Environment,
        callback: impl FnOnce(Value) + 'static,
    ) -> Result<(), InterpreterError> {
        let callback = RefCell::new(Some(callback));
        let k = cont(move |_, value| {
            if let Some(callback) = callback.borrow_mut().take() {
                debug!(result = %value_to_string(&value), "program finished");
                callback(value.clone());
            }
            Ok(Bounce::Done(value))
        });

        debug!(depth = env.depth(), "program start");
        self.context = env.clone();
        let program = Rc::clone(program);
        let env = env.clone();
        self.drive(Box::new(move |interp| interp.eval(&program, &env, k)))?;
        Ok(())
    }

    /// Run `program` in the global environment. `None` if it is still
    /// waiting on a deferred host call.
    pub fn run(&mut self, program: &NodeRef) -> Result<Option<Value>, InterpreterError> {
        let result = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&result);
        let env = self.globals.clone();
        self.execute(program, &env, move |value| *slot.borrow_mut() = Some(value))?;
        let value = result.borrow_mut().take();
        Ok(value)
    }

    pub(crate) fn eval(&mut self, node: &NodeRef, env: &Environment, k: Cont) -> Step {
        if !self.trampoline.tick() {
            let node = Rc::clone(node);
            let env = env.clone();
            return Ok(Bounce::suspend(move |interp| interp.eval(&node, &env, k)));
        }

        let span = node.span();
        match &node.kind {
            NodeKind::NullLiteral => k(self, Value::Null),
            NodeKind::UndefinedLiteral => k(self, Value::Undefined),
            NodeKind::BooleanLiteral { value } => k(self, Value::Bool(*value)),
            NodeKind::StringLiteral { value } => k(self, Value::String(Rc::clone(value))),
            NodeKind::NumberLiteral { value } => k(self, Value::Number(*value)),
            NodeKind::Identifier { name } => {
                let value = env.get(name).map_err(|err| err.at(span))?;
                k(self, value)
            }
            NodeKind::Binary { op, left, right } => self.eval_binary(op, left, right, span, env, k),
            NodeKind::And { left, right } => self.eval_logical(true, left, right, env, k),
            NodeKind::Or { left, right } => self.eval_logical(false, left, right, env, k),
            NodeKind::Assign { left, right } => self.eval_assign(left, right, env, k),
            NodeKind::Condition { expr, then, otherwise } => self.eval_condition(expr, then, otherwise, env, k),
            NodeKind::Block { items }
            | NodeKind::Prog { items }
            | NodeKind::ExprSequence { items }
            | NodeKind::VarDeclarationList { items } => self.eval_sequence(Rc::clone(items), 0, env.clone(), k),
            NodeKind::VarDeclaration { name, init } => self.eval_declaration(name, init, span, env, k),
            NodeKind::FunDeclaration { name, params, body } => {
                let value = make_function(name, params, body, env, span)?;
                k(self, value)
            }
            NodeKind::FunCall { callee, args } => self.eval_call(callee, args, span, env, k),
            NodeKind::ArrayLiteral { items } => self.eval_array(items, env, k),
            NodeKind::ObjectLiteral { properties } => self.eval_object(properties, env, k),
            NodeKind::MemberIndex { target, key } => self.eval_index(target, key, span, env, k),
            NodeKind::MemberDot { target, name } => {
                let key = Value::String(Rc::clone(&name.name));
                self.eval(
                    target,
                    env,
                    cont(move |interp, target| {
                        let value = read_member(&target, &key).map_err(|err| err.at(span))?;
                        interp.resume(k.clone(), value)
                    }),
                )
            }
            NodeKind::This => {
                let this = env.receiver().unwrap_or_else(|| Value::Scope(self.context.clone()));
                k(self, this)
            }
            NodeKind::For { bindings, source, body } => self.eval_for(bindings, source, body, span, env, k),
            NodeKind::Break => self.eval_break(k),
            NodeKind::Discard => k(self, Value::Discard),
        }
    }

    /// Items left to right in `env` itself; the last value is the result.
    fn eval_sequence(&mut self, items: NodeList, index: usize, env: Environment, k: Cont) -> Step {
        let Some(item) = items.get(index).cloned() else {
            return k(self, Value::Bool(false));
        };
        if index + 1 == items.len() {
            return self.eval(&item, &env, k);
        }
        let next_env = env.clone();
        self.eval(
            &item,
            &env,
            cont(move |interp, _| interp.eval_sequence(Rc::clone(&items), index + 1, next_env.clone(), k.clone())),
        )
    }

    fn eval_list(&mut self, items: NodeList, env: Environment, done: ListCont) -> Step {
        let acc = Rc::new(RefCell::new(Vec::with_capacity(items.len())));
        self.eval_list_from(items, 0, env, acc, done)
    }

    fn eval_list_from(
        &mut self,
        items: NodeList,
        index: usize,
        env: Environment,
        acc: Rc<RefCell<Vec<Value>>>,
        done: ListCont,
    ) -> Step {
        let Some(item) = items.get(index).cloned() else {
            let values = acc.take();
            return done(self, values);
        };
        let next_env = env.clone();
        self.eval(
            &item,
            &env,
            cont(move |interp, value| {
                acc.borrow_mut().push(value);
                interp.eval_list_from(Rc::clone(&items), index + 1, next_env.clone(), Rc::clone(&acc), Rc::clone(&done))
            }),
        )
    }

    fn eval_binary(
        &mut self,
        op: &BinaryOp,
        left: &NodeRef,
        right: &NodeRef,
        span: Span,
        env: &Environment,
        k: Cont,
    ) -> Step {
        let op = op.clone();
        let right = Rc::clone(right);
        let right_env = env.clone();
        self.eval(
            left,
            env,
            cont(move |interp, lhs| {
                let op = op.clone();
                let k = k.clone();
                interp.eval(
                    &right,
                    &right_env,
                    cont(move |interp, rhs| {
                        let result = apply_binary(&op, &lhs, &rhs).map_err(|err| err.at(span))?;
                        interp.resume(k.clone(), result)
                    }),
                )
            }),
        )
    }

    /// `and` stops at the first falsy operand, `or` at the first truthy one.
    fn eval_logical(&mut self, is_and: bool, left: &NodeRef, right: &NodeRef, env: &Environment, k: Cont) -> Step {
        let right = Rc::clone(right);
        let right_env = env.clone();
        self.eval(
            left,
            env,
            cont(move |interp, lhs| {
                if lhs.is_truthy() != is_and {
                    interp.resume(k.clone(), lhs)
                } else {
                    interp.eval(&right, &right_env, k.clone())
                }
            }),
        )
    }

    fn eval_assign(&mut self, left: &NodeRef, right: &NodeRef, env: &Environment, k: Cont) -> Step {
        let left = Rc::clone(left);
        let target_env = env.clone();
        self.eval(
            right,
            env,
            cont(move |interp, value| interp.assign_to(&left, value, &target_env, k.clone())),
        )
    }

    fn assign_to(&mut self, left: &NodeRef, value: Value, env: &Environment, k: Cont) -> Step {
        let span = left.span();
        match &left.kind {
            NodeKind::Identifier { name } => {
                env.set(name, value.clone()).map_err(|err| err.at(span))?;
                self.resume(k, value)
            }
            NodeKind::MemberIndex { target, key } => {
                let key = Rc::clone(key);
                let key_env = env.clone();
                self.eval(
                    target,
                    env,
                    cont(move |interp, target| {
                        let value = value.clone();
                        let k = k.clone();
                        interp.eval(
                            &key,
                            &key_env,
                            cont(move |interp, key| {
                                write_member(&target, &key, value.clone()).map_err(|err| err.at(span))?;
                                interp.resume(k.clone(), value.clone())
                            }),
                        )
                    }),
                )
            }
            NodeKind::MemberDot { target, name } => {
                let key = Value::String(Rc::clone(&name.name));
                self.eval(
                    target,
                    env,
                    cont(move |interp, target| {
                        write_member(&target, &key, value.clone()).map_err(|err| err.at(span))?;
                        interp.resume(k.clone(), value.clone())
                    }),
                )
            }
            _ => Err(InterpreterError::invalid_operation("invalid assignment target").at(span)),
        }
    }

    fn eval_condition(
        &mut self,
        expr: &NodeRef,
        then: &Option<NodeRef>,
        otherwise: &Option<NodeRef>,
        env: &Environment,
        k: Cont,
    ) -> Step {
        let then = then.clone();
        let otherwise = otherwise.clone();
        let branch_env = env.clone();
        self.eval(
            expr,
            env,
            cont(move |interp, test| {
                // a missing branch yields the outcome of the test
                let (branch, outcome) = if test.is_truthy() { (&then, true) } else { (&otherwise, false) };
                match branch {
                    Some(node) => interp.eval(node, &branch_env, k.clone()),
                    None => interp.resume(k.clone(), Value::Bool(outcome)),
                }
            }),
        )
    }

    fn eval_declaration(&mut self, name: &Ident, init: &NodeRef, span: Span, env: &Environment, k: Cont) -> Step {
        let name = Rc::clone(&name.name);
        let target = env.clone();
        self.eval(
            init,
            env,
            cont(move |interp, value| {
                target.define(&name, value.clone()).map_err(|err| err.at(span))?;
                interp.resume(k.clone(), value)
            }),
        )
    }

    fn eval_call(&mut self, callee: &NodeRef, args: &NodeList, span: Span, env: &Environment, k: Cont) -> Step {
        let args = Rc::clone(args);
        let args_env = env.clone();
        self.eval(
            callee,
            env,
            cont(move |interp, callee| {
                let k = k.clone();
                interp.eval_list(
                    Rc::clone(&args),
                    args_env.clone(),
                    list_cont(move |interp, values| interp.apply(callee.clone(), values, span, k.clone())),
                )
            }),
        )
    }

    fn eval_array(&mut self, items: &NodeList, env: &Environment, k: Cont) -> Step {
        self.eval_list(
            Rc::clone(items),
            env.clone(),
            list_cont(move |interp, values| interp.resume(k.clone(), Value::array(values))),
        )
    }

    /// Keys and values are evaluated in source order, key first.
    fn eval_object(&mut self, properties: &Rc<[Property]>, env: &Environment, k: Cont) -> Step {
        let nodes: NodeList = properties
            .iter()
            .flat_map(|property| [Rc::clone(&property.key), Rc::clone(&property.value)])
            .collect();
        self.eval_list(
            nodes,
            env.clone(),
            list_cont(move |interp, values| {
                let mut entries = IndexMap::new();
                for pair in values.chunks(2) {
                    if let [key, value] = pair {
                        entries.insert(property_key(key), value.clone());
                    }
                }
                interp.resume(k.clone(), Value::object(entries))
            }),
        )
    }

    fn eval_index(&mut self, target: &NodeRef, key: &NodeRef, span: Span, env: &Environment, k: Cont) -> Step {
        let key = Rc::clone(key);
        let key_env = env.clone();
        self.eval(
            target,
            env,
            cont(move |interp, target| {
                let k = k.clone();
                interp.eval(
                    &key,
                    &key_env,
                    cont(move |interp, key| {
                        let value = read_member(&target, &key).map_err(|err| err.at(span))?;
                        interp.resume(k.clone(), value)
                    }),
                )
            }),
        )
    }

    /// Call `callee` with already evaluated arguments.
    pub(crate) fn apply(&mut self, callee: Value, args: Vec<Value>, span: Span, k: Cont) -> Step {
        let (function, receiver) = match callee {
            Value::Function(Callable { function, receiver }) => (function, receiver.map(|receiver| *receiver)),
            other => {
                return Err(InterpreterError::type_error(format!("{} is not a function", other.type_name())).at(span));
            }
        };

        match &*function {
            Function::Closure(closure) => {
                let scope = closure.env.extend();
                scope.bind_receiver(receiver.unwrap_or_else(|| Value::Scope(self.context.clone())));
                let mut args = args.into_iter();
                for param in closure.params.iter() {
                    scope
                        .define(&param.name, args.next().unwrap_or(Value::Undefined))
                        .map_err(|err| err.at(span))?;
                }
                self.eval(&closure.body, &scope, k)
            }
            Function::Builtin(builtin) => {
                let func = Rc::clone(&builtin.func);
                func(self, k, CallArgs { values: args, receiver, span })
            }
            Function::Continuation(escape) => {
                let value = args.into_iter().next().unwrap_or(Value::Undefined);
                self.resume(escape.clone(), value)
            }
        }
    }
}

/// Build a closure over `env`. A named function is also bound in `env`,
/// which is what lets its body call itself.
fn make_function(
    name: &Option<Ident>,
    params: &Rc<[Ident]>,
    body: &NodeRef,
    env: &Environment,
    span: Span,
) -> Result<Value, InterpreterError> {
    let closure = Closure {
        name: name.as_ref().map(|name| Rc::clone(&name.name)),
        params: Rc::clone(params),
        body: Rc::clone(body),
        env: env.clone(),
    };
    let value = Value::function(Function::Closure(closure));
    if let Some(name) = name {
        env.define(&name.name, value.clone()).map_err(|err| err.at(span))?;
    }
    Ok(value)
}

fn apply_binary(op: &BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, InterpreterError> {
    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_), _) | (_, Value::String(_)) => {
                let joined = format!("{}{}", value_to_string(lhs), value_to_string(rhs));
                Ok(Value::string(&joined))
            }
            _ => Err(InterpreterError::type_error(format!(
                "cannot add {} and {}",
                lhs.type_name(),
                rhs.type_name()
            ))),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let (Value::Number(a), Value::Number(b)) = (lhs, rhs) else {
                return Err(InterpreterError::type_error(format!(
                    "operator {} expects numbers, found {} and {}",
                    op,
                    lhs.type_name(),
                    rhs.type_name()
                )));
            };
            let result = match op {
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                _ if *b == 0.0 => return Err(InterpreterError::division_by_zero()),
                BinaryOp::Div => a / b,
                _ => a % b,
            };
            Ok(Value::Number(result))
        }
        BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEq | BinaryOp::GreaterEq => {
            let ordering = match (lhs, rhs) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(InterpreterError::type_error(format!(
                        "cannot compare {} with {}",
                        lhs.type_name(),
                        rhs.type_name()
                    )))
                }
            };
            // NaN compares false every way
            let Some(ordering) = ordering else {
                return Ok(Value::Bool(false));
            };
            let result = match op {
                BinaryOp::Less => ordering.is_lt(),
                BinaryOp::Greater => ordering.is_gt(),
                BinaryOp::LessEq => ordering.is_le(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Eq => Ok(Value::Bool(lhs.strict_equals(rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!lhs.strict_equals(rhs))),
        BinaryOp::Unsupported(op) => Err(InterpreterError::unsupported_operator(op.to_string())),
    }
}

/// A number usable as a position: non-negative and integral.
fn as_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        _ => None,
    }
}

fn is_length(key: &Value) -> bool {
    key.as_str() == Some("length")
}

/// Read `target[key]`. A function read this way remembers `target` as the
/// receiver for its next call.
fn read_member(target: &Value, key: &Value) -> Result<Value, InterpreterError> {
    let value = match target {
        Value::Array(items) => {
            let items = items.borrow();
            if is_length(key) {
                Value::Number(items.len() as f64)
            } else {
                as_index(key).and_then(|index| items.get(index).cloned()).unwrap_or(Value::Undefined)
            }
        }
        Value::String(text) => {
            if is_length(key) {
                Value::Number(text.chars().count() as f64)
            } else {
                as_index(key)
                    .and_then(|index| text.chars().nth(index))
                    .map(|ch| Value::string(ch.encode_utf8(&mut [0; 4])))
                    .unwrap_or(Value::Undefined)
            }
        }
        Value::Object(entries) => entries.borrow().get(&property_key(key)).cloned().unwrap_or(Value::Undefined),
        Value::Scope(env) => env.get(&property_key(key))?,
        other => {
            return Err(InterpreterError::type_error(format!(
                "cannot read property {} of {}",
                property_key(key),
                other.type_name()
            )))
        }
    };

    Ok(match value {
        Value::Function(callable) => Value::Function(callable.with_receiver(target.clone())),
        value => value,
    })
}

fn write_member(target: &Value, key: &Value, value: Value) -> Result<(), InterpreterError> {
    match target {
        Value::Object(entries) => {
            entries.borrow_mut().insert(property_key(key), value);
            Ok(())
        }
        Value::Array(items) => {
            let index = as_index(key).ok_or_else(|| {
                InterpreterError::type_error(format!("array index must be a non-negative integer, found {}", property_key(key)))
            })?;
            let mut items = items.borrow_mut();
            let length = items.len();
            if index < length {
                items[index] = value;
            } else if index == length {
                items.push(value);
            } else {
                return Err(InterpreterError::index_out_of_bounds(index, length));
            }
            Ok(())
        }
        Value::Scope(env) => env.set(&property_key(key), value),
        other => Err(InterpreterError::type_error(format!(
            "cannot assign property {} of {}",
            property_key(key),
            other.type_name()
        ))),
    }
}

/// Deserialize a JSON syntax tree and run it in a fresh interpreter.
pub fn run_json(json: &str) -> Result<Option<Value>, String> {
    let program = Node::from_json(json).map_err(|e| e.to_string())?;

    let mut interpreter = Interpreter::new();
    interpreter
        .run(&program)
        .map_err(|e| format!("Runtime error: {}", e))
}

pub fn run_json_with_diagnostics(json: &str) -> Result<Option<Value>, Vec<Diagnostic>> {
    let program = match Node::from_json(json) {
        Ok(program) => program,
        Err(e) => {
            return Err(vec![Diagnostic::error(e.to_string()).with_code("E0001")]);
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.run(&program) {
        Ok(val) => Ok(val),
        Err(e) => Err(vec![e.to_diagnostic()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build::*;
    use pretty_assertions::assert_eq;

    fn eval(program: NodeRef) -> Result<Value, InterpreterError> {
        Interpreter::new().run(&program).map(|value| value.unwrap_or(Value::Undefined))
    }

    #[test]
    fn test_literals_and_empty_sequence() {
        assert_eq!(eval(number(4.0)).unwrap(), Value::Number(4.0));
        assert_eq!(eval(undefined()).unwrap(), Value::Undefined);
        assert_eq!(eval(prog(vec![])).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_arithmetic_and_concat() {
        assert_eq!(eval(binary("-", number(7.0), number(2.0))).unwrap(), Value::Number(5.0));
        assert_eq!(eval(binary("%", number(7.0), number(4.0))).unwrap(), Value::Number(3.0));
        assert_eq!(eval(binary("+", string("n="), number(2.0))).unwrap(), Value::string("n=2"));
        assert_eq!(eval(binary("<", string("a"), string("b"))).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_errors_carry_node_position() {
        let division = Node::at(
            NodeKind::Binary { op: BinaryOp::Div, left: number(1.0), right: number(0.0) },
            3,
            7,
        );
        let err = eval(division).unwrap_err();
        assert_eq!(err, InterpreterError::DivisionByZero { span: Span::new(3, 7) });
    }

    #[test]
    fn test_unsupported_operator() {
        let err = eval(binary("**", number(2.0), number(3.0))).unwrap_err();
        assert!(matches!(err, InterpreterError::UnsupportedOperator { ref op, .. } if op == "**"));
    }

    #[test]
    fn test_condition_without_branches_yields_the_test() {
        assert_eq!(eval(cond(number(1.0), None, None)).unwrap(), Value::Bool(true));
        assert_eq!(eval(cond(string(""), None, None)).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_short_circuit_skips_right_operand() {
        // the right operand would fail with an undefined variable
        assert_eq!(eval(and(number(0.0), ident("missing"))).unwrap(), Value::Number(0.0));
        assert_eq!(eval(or(string("x"), ident("missing"))).unwrap(), Value::string("x"));
        assert_eq!(eval(and(number(1.0), number(2.0))).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_member_reads() {
        let program = prog(vec![
            let_("o", object(vec![(string("a"), number(1.0)), (binary("+", string("b"), number(1.0)), number(2.0))])),
            array(vec![
                dot(ident("o"), "a"),
                index(ident("o"), string("b1")),
                dot(ident("o"), "nope"),
                dot(string("héllo"), "length"),
                index(string("abc"), number(1.0)),
                index(array(vec![number(9.0)]), number(3.0)),
            ]),
        ]);
        let expected = Value::array(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Undefined,
            Value::Number(5.0),
            Value::string("b"),
            Value::Undefined,
        ]);
        assert_eq!(eval(program).unwrap(), expected);
    }

    #[test]
    fn test_array_writes_append_at_length_only() {
        let program = prog(vec![
            let_("a", array(vec![number(1.0)])),
            assign(index(ident("a"), number(1.0)), number(2.0)),
            assign(index(ident("a"), number(0.0)), number(0.0)),
            ident("a"),
        ]);
        assert_eq!(eval(program).unwrap(), Value::array(vec![Value::Number(0.0), Value::Number(2.0)]));

        let past_end = prog(vec![let_("a", array(vec![])), assign(index(ident("a"), number(2.0)), number(1.0))]);
        assert!(matches!(
            eval(past_end).unwrap_err(),
            InterpreterError::IndexOutOfBounds { index: 2, length: 0, .. }
        ));
    }

    #[test]
    fn test_calling_a_number_is_a_type_error() {
        let err = eval(call(number(1.0), vec![])).unwrap_err();
        assert!(matches!(err, InterpreterError::TypeError { .. }));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        let program = call(lambda(&["a", "b"], ident("b")), vec![number(1.0)]);
        assert_eq!(eval(program).unwrap(), Value::Undefined);
    }
}
