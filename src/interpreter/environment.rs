use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::error::InterpreterError;

/// Depth of the builtin root scope. Bindings created here are immutable.
pub const ROOT_DEPTH: usize = 0;

/// Storage for one variable, tagged with the depth of the scope that
/// created it. Shared by every scope that inherited the binding.
#[derive(Debug)]
pub struct Binding {
    value: RefCell<Value>,
    depth: usize,
}

impl Binding {
    fn new(value: Value, depth: usize) -> Rc<Self> {
        Rc::new(Self { value: RefCell::new(value), depth })
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

struct Scope {
    depth: usize,
    /// Next depth to hand out; shared by every scope of one root.
    counter: Rc<Cell<usize>>,
    bindings: RefCell<HashMap<Rc<str>, Rc<Binding>>>,
    parent: Option<Environment>,
    receiver: RefCell<Option<Value>>,
}

/// A lexical scope.
///
/// `extend` snapshots the parent's bindings into the child, so lookups are a
/// single map lookup. The snapshot shares `Binding`s with the parent:
/// assigning an inherited name is visible on both sides, while defining
/// the name again in the child installs a fresh binding and breaks the
/// sharing. Names the parent defines after the snapshot are found through
/// the parent link and cached on first use.
#[derive(Clone)]
pub struct Environment(Rc<Scope>);

impl Environment {
    /// A new depth-0 scope: the home of builtins.
    pub fn root() -> Self {
        Environment(Rc::new(Scope {
            depth: ROOT_DEPTH,
            counter: Rc::new(Cell::new(ROOT_DEPTH + 1)),
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            receiver: RefCell::new(None),
        }))
    }

    /// Child scope with a fresh depth and a copy of this scope's bindings.
    pub fn extend(&self) -> Self {
        let depth = self.0.counter.get();
        self.0.counter.set(depth + 1);
        Environment(Rc::new(Scope {
            depth,
            counter: Rc::clone(&self.0.counter),
            bindings: RefCell::new(self.0.bindings.borrow().clone()),
            parent: Some(self.clone()),
            receiver: RefCell::new(self.0.receiver.borrow().clone()),
        }))
    }

    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn is_root(&self) -> bool {
        self.0.depth == ROOT_DEPTH
    }

    pub fn same_scope(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Create `name` in this scope. Fails if this very scope already
    /// created it; a binding inherited from an outer scope is shadowed.
    pub fn define(&self, name: &str, value: Value) -> Result<(), InterpreterError> {
        let mut bindings = self.0.bindings.borrow_mut();
        if let Some(existing) = bindings.get(name) {
            if existing.depth == self.0.depth {
                return Err(InterpreterError::duplicate_definition(name));
            }
        }
        bindings.insert(Rc::from(name), Binding::new(value, self.0.depth));
        Ok(())
    }

    /// Install or replace a binding without the redeclaration check. Meant
    /// for populating the root scope before any program runs.
    pub fn define_builtin(&self, name: &str, value: Value) {
        self.0.bindings.borrow_mut().insert(Rc::from(name), Binding::new(value, self.0.depth));
    }

    pub fn get(&self, name: &str) -> Result<Value, InterpreterError> {
        self.lookup(name)
            .map(|binding| binding.get())
            .ok_or_else(|| InterpreterError::undefined_variable(name))
    }

    /// Assign to the visible binding of `name`. Mutability is decided by the
    /// depth of the binding, not of this scope.
    pub fn set(&self, name: &str, value: Value) -> Result<(), InterpreterError> {
        let binding = self
            .lookup(name)
            .ok_or_else(|| InterpreterError::undefined_variable(name))?;
        if binding.depth == ROOT_DEPTH {
            return Err(InterpreterError::immutable_binding(name));
        }
        *binding.value.borrow_mut() = value;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Binding>> {
        if let Some(binding) = self.0.bindings.borrow().get(name) {
            return Some(Rc::clone(binding));
        }
        let mut parent = self.0.parent.as_ref();
        while let Some(scope) = parent {
            let found = scope.0.bindings.borrow().get(name).cloned();
            if let Some(binding) = found {
                self.0.bindings.borrow_mut().insert(Rc::from(name), Rc::clone(&binding));
                return Some(binding);
            }
            parent = scope.0.parent.as_ref();
        }
        None
    }

    /// The value `this` resolves to inside this scope, if a call bound one.
    pub fn receiver(&self) -> Option<Value> {
        self.0.receiver.borrow().clone()
    }

    pub fn bind_receiver(&self, receiver: Value) {
        *self.0.receiver.borrow_mut() = Some(receiver);
    }

    /// Names visible in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.bindings.borrow().keys().map(|k| k.to_string()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings may hold closures over this very scope; print the depth only
        f.debug_struct("Environment").field("depth", &self.0.depth).finish()
    }
}
