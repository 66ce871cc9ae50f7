//! Built-in functions installed into the root scope.
//!
//! Every builtin follows the same calling convention: it receives the
//! interpreter, the continuation of the call and the evaluated arguments,
//! and resumes the continuation exactly once when it succeeds.
//!
//! Functions are organized into categories:
//! - **IO**: console output and timing (println, time)
//! - **Control**: non-local control flow (try, throw, call, callCC)
//! - **Host**: access to functions provided by the embedding program (require)

pub mod control;
pub mod host;
pub mod io;

use crate::value::{Builtin, CallArgs, Function, Value};
use super::environment::Environment;
use super::evaluator::Interpreter;
use super::trampoline::{Cont, Step};

macro_rules! require_args {
    ($args:expr, $n:expr, $name:expr) => {
        if $args.len() < $n {
            return Err($crate::interpreter::InterpreterError::invalid_operation(
                format!("{} requires {} argument(s)", $name, $n)
            ).at($args.span));
        }
    };
}

pub(crate) use require_args;

type NativeFn = fn(&mut Interpreter, Cont, CallArgs) -> Step;

const BUILTINS: &[(&str, NativeFn)] = &[
    ("println", io::builtin_println),
    ("time", io::builtin_time),
    ("try", control::builtin_try),
    ("throw", control::builtin_throw),
    ("call", control::builtin_call),
    ("callCC", control::builtin_call_cc),
    ("require", host::builtin_require),
];

/// Bind every builtin in `root`, which must be the depth-0 scope.
pub fn install(root: &Environment) {
    for (name, func) in BUILTINS {
        root.define_builtin(name, Value::function(Function::Builtin(Builtin::new(name, *func))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_live_at_depth_zero() {
        let root = Environment::root();
        install(&root);
        for (name, _) in BUILTINS {
            let binding = root.lookup(name).unwrap();
            assert_eq!(binding.depth(), 0, "{} should be a root binding", name);
        }
    }
}
