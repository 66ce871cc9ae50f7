//! Console output and timing.

use std::io::Write;
use std::time::Instant;

use tracing::debug;

use crate::diagnostic::Span;
use crate::format::value_to_string;
use crate::value::{CallArgs, Value};
use super::super::error::InterpreterError;
use super::super::evaluator::Interpreter;
use super::super::trampoline::{cont, Cont, Step};
use super::require_args;

fn write_error(err: std::io::Error, span: Span) -> InterpreterError {
    InterpreterError::invalid_operation(format!("failed to write output: {}", err)).at(span)
}

/// `println(...)`: arguments separated by a space, then a newline. Yields
/// `false`.
pub fn builtin_println(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    let output: Vec<String> = args.values.iter().map(value_to_string).collect();
    writeln!(interp.output, "{}", output.join(" ")).map_err(|e| write_error(e, args.span))?;
    interp.output.flush().ok();
    interp.resume(k, Value::Bool(false))
}

/// `time(fn)`: call `fn` with no arguments and report how long it took.
pub fn builtin_time(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    require_args!(args, 1, "time");
    let started = Instant::now();
    let span = args.span;
    interp.apply(
        args.get(0),
        Vec::new(),
        span,
        cont(move |interp, value| {
            let elapsed = started.elapsed();
            debug!(?elapsed, "time");
            writeln!(interp.output, "time: {:.3}ms", elapsed.as_secs_f64() * 1000.0)
                .map_err(|e| write_error(e, span))?;
            interp.resume(k.clone(), value)
        }),
    )
}
