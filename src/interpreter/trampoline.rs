//! Stack-safety for the continuation-passing evaluator.
//!
//! Every evaluation step calls the next one directly, so the native stack
//! grows with the length of the continuation chain. Each guarded step
//! spends one unit of a budget; once the budget runs out the step does not
//! run, it returns [`Bounce::Suspend`] carrying itself instead. That return
//! unwinds the native stack back to [`Interpreter::drive`], which refills
//! the budget and runs the suspended step on a fresh stack.

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::Rc;

use tracing::trace;

use crate::config::MAX_STEP_BUDGET;
use crate::value::Value;
use super::error::InterpreterError;
use super::evaluator::Interpreter;

type ContFn = dyn Fn(&mut Interpreter, Value) -> Step;

/// "What happens next": receives the value of the step that just finished.
///
/// Each continuation owns the one it resumes, so a pending chain is as long
/// as the program's recursion is deep. Dropping the last handle to a link
/// queues it instead of freeing it in place; the queue is drained in a loop,
/// which keeps abandoning a deep chain (`throw`, `break`, an escape, a fatal
/// error) off the native stack.
#[derive(Clone)]
pub struct Cont(Option<Rc<ContFn>>);

/// Build a [`Cont`] from a closure.
pub fn cont(f: impl Fn(&mut Interpreter, Value) -> Step + 'static) -> Cont {
    Cont(Some(Rc::new(f)))
}

thread_local! {
    static RELEASED: RefCell<Vec<Rc<ContFn>>> = const { RefCell::new(Vec::new()) };
    static RELEASING: Cell<bool> = const { Cell::new(false) };
}

impl Deref for Cont {
    type Target = ContFn;

    fn deref(&self) -> &ContFn {
        match &self.0 {
            Some(f) => f.as_ref(),
            // only `drop` takes the closure out
            None => &released,
        }
    }
}

fn released(_: &mut Interpreter, _: Value) -> Step {
    Err(InterpreterError::invalid_operation("continuation used after release"))
}

impl Drop for Cont {
    fn drop(&mut self) {
        let Some(f) = self.0.take() else {
            return;
        };
        if Rc::strong_count(&f) > 1 {
            return;
        }
        // Thread teardown: the queue is gone, free in place
        let Ok(draining) = RELEASING.try_with(|flag| flag.replace(true)) else {
            return;
        };
        if RELEASED.try_with(|queue| queue.borrow_mut().push(f)).is_err() || draining {
            return;
        }
        // Freeing one link may queue the links it owned
        while let Some(next) = RELEASED.with(|queue| queue.borrow_mut().pop()) {
            drop(next);
        }
        RELEASING.with(|flag| flag.set(false));
    }
}

/// A deferred step, run by the trampoline on a fresh native stack.
pub type Thunk = Box<dyn FnOnce(&mut Interpreter) -> Step>;

pub enum Bounce {
    /// The chain ran to its end. The value is whatever the last step
    /// produced; programs report their result through their callback.
    Done(Value),
    /// The budget ran out; run this to continue.
    Suspend(Thunk),
}

impl Bounce {
    pub fn suspend(thunk: impl FnOnce(&mut Interpreter) -> Step + 'static) -> Self {
        Bounce::Suspend(Box::new(thunk))
    }
}

/// Result of one evaluation step. `Err` is fatal for the current run.
pub type Step = Result<Bounce, InterpreterError>;

/// Step budget bookkeeping. One per interpreter.
#[derive(Debug)]
pub struct Trampoline {
    budget: usize,
    remaining: usize,
    bounces: u64,
}

impl Trampoline {
    /// The budget is clamped to `1..=MAX_STEP_BUDGET`.
    pub fn new(budget: usize) -> Self {
        let budget = budget.clamp(1, MAX_STEP_BUDGET);
        Self { budget, remaining: budget, bounces: 0 }
    }

    /// Spend one step. `false` means the caller must suspend instead of
    /// doing its work.
    pub fn tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn reset(&mut self) {
        self.remaining = self.budget;
    }

    /// Number of times the native stack has been unwound since creation.
    pub fn bounces(&self) -> u64 {
        self.bounces
    }
}

impl Interpreter {
    /// Run `thunk` and every step it suspends into until the chain ends.
    ///
    /// Any fatal error abandons the run. Handler frames and loop states
    /// left behind by the failed run are dropped with it.
    pub(crate) fn drive(&mut self, thunk: Thunk) -> Result<Value, InterpreterError> {
        let mut next = thunk;
        loop {
            self.trampoline.reset();
            match next(self) {
                Ok(Bounce::Done(value)) => return Ok(value),
                Ok(Bounce::Suspend(thunk)) => {
                    self.trampoline.bounces += 1;
                    trace!(bounces = self.trampoline.bounces, "trampoline bounce");
                    next = thunk;
                }
                Err(err) => {
                    self.handlers.clear();
                    self.loops.clear();
                    return Err(err);
                }
            }
        }
    }

    /// Deliver `value` to `k`, or suspend if the step budget is spent.
    /// Builtins use this to return their result.
    pub fn resume(&mut self, k: Cont, value: Value) -> Step {
        if !self.trampoline.tick() {
            return Ok(Bounce::suspend(move |interp| interp.resume(k, value)));
        }
        k(self, value)
    }
}
