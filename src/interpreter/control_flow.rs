use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::ast::{Ident, NodeRef};
use crate::diagnostic::Span;
use crate::value::Value;
use super::environment::Environment;
use super::error::InterpreterError;
use super::evaluator::Interpreter;
use super::trampoline::{cont, Bounce, Cont, Step};

/// One active `for` evaluation.
pub struct LoopRun {
    id: u64,
    /// `(key, value)` pairs, captured when the loop starts.
    items: Vec<(Value, Value)>,
    bindings: Rc<[Ident]>,
    body: NodeRef,
    env: Environment,
    acc: RefCell<Vec<Value>>,
    k: Cont,
}

impl LoopRun {
    fn collected(&self) -> Value {
        Value::array(self.acc.borrow().clone())
    }
}

pub struct LoopState {
    run: Rc<LoopRun>,
    /// Handler-stack height when the loop started.
    handler_height: usize,
}

/// Active loops, innermost last. Dynamically scoped: `break` inside a
/// function called from a loop body exits that loop.
#[derive(Default)]
pub struct LoopStack {
    states: Vec<LoopState>,
    next_id: u64,
}

impl LoopStack {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn push(&mut self, state: LoopState) {
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<LoopState> {
        self.states.pop()
    }

    /// Remove the loop `id` and anything pushed after it. No-op if a
    /// `break` or a caught `throw` already removed it.
    pub fn finish(&mut self, id: u64) {
        if let Some(position) = self.states.iter().rposition(|state| state.run.id == id) {
            self.states.truncate(position);
        }
    }

    pub fn height(&self) -> usize {
        self.states.len()
    }

    pub fn truncate(&mut self, height: usize) {
        self.states.truncate(height);
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// Snapshot what a `for` iterates over: arrays by index, objects by key
/// in insertion order.
fn loop_items(source: &Value, span: Span) -> Result<Vec<(Value, Value)>, InterpreterError> {
    match source {
        Value::Array(items) => Ok(items
            .borrow()
            .iter()
            .enumerate()
            .map(|(index, item)| (Value::Number(index as f64), item.clone()))
            .collect()),
        Value::Object(entries) => Ok(entries
            .borrow()
            .iter()
            .map(|(key, value)| (Value::string(key), value.clone()))
            .collect()),
        other => Err(InterpreterError::type_error(format!("cannot iterate over {}", other.type_name())).at(span)),
    }
}

impl Interpreter {
    pub(crate) fn eval_for(
        &mut self,
        bindings: &Rc<[Ident]>,
        source: &NodeRef,
        body: &NodeRef,
        span: Span,
        env: &Environment,
        k: Cont,
    ) -> Step {
        if bindings.is_empty() || bindings.len() > 2 {
            return Err(InterpreterError::invalid_operation(format!(
                "for binds one or two names, found {}",
                bindings.len()
            ))
            .at(span));
        }
        let bindings = Rc::clone(bindings);
        let body = Rc::clone(body);
        let loop_env = env.clone();
        self.eval(
            source,
            env,
            cont(move |interp, source| {
                let items = loop_items(&source, span)?;
                let run = Rc::new(LoopRun {
                    id: interp.loops.next_id(),
                    items,
                    bindings: Rc::clone(&bindings),
                    body: Rc::clone(&body),
                    env: loop_env.clone(),
                    acc: RefCell::new(Vec::new()),
                    k: k.clone(),
                });
                let handler_height = interp.handlers.height();
                interp.loops.push(LoopState { run: Rc::clone(&run), handler_height });
                interp.for_step(run, 0)
            }),
        )
    }

    fn for_step(&mut self, run: Rc<LoopRun>, index: usize) -> Step {
        if !self.trampoline.tick() {
            return Ok(Bounce::suspend(move |interp| interp.for_step(run, index)));
        }
        let Some((key, value)) = run.items.get(index).cloned() else {
            self.loops.finish(run.id);
            return self.resume(run.k.clone(), run.collected());
        };

        let scope = run.env.extend();
        let span = run.body.span();
        match &run.bindings[..] {
            [name] => scope.define(&name.name, value).map_err(|err| err.at(span))?,
            [key_name, value_name] => {
                scope.define(&key_name.name, key).map_err(|err| err.at(span))?;
                scope.define(&value_name.name, value).map_err(|err| err.at(span))?;
            }
            _ => return Err(InterpreterError::invalid_operation("for binds one or two names").at(span)),
        }

        let next = Rc::clone(&run);
        self.eval(
            &run.body,
            &scope,
            cont(move |interp, produced| {
                if !matches!(produced, Value::Discard) {
                    next.acc.borrow_mut().push(produced);
                }
                interp.for_step(Rc::clone(&next), index + 1)
            }),
        )
    }

    /// Exit the innermost active loop with what it has collected so far.
    pub(crate) fn eval_break(&mut self, k: Cont) -> Step {
        match self.loops.pop() {
            Some(state) => {
                debug!(collected = state.run.acc.borrow().len(), "break");
                self.handlers.truncate(state.handler_height);
                self.resume(state.run.k.clone(), state.run.collected())
            }
            None => self.resume(k, Value::Undefined),
        }
    }
}
