//! Non-local control flow: exceptions and first-class continuations.

use tracing::debug;

use crate::diagnostic::Span;
use crate::format::value_to_string;
use crate::value::{CallArgs, Function, Value};
use super::super::error::InterpreterError;
use super::super::evaluator::Interpreter;
use super::super::handlers::{HandlerArm, HandlerFrame};
use super::super::trampoline::{cont, Cont, Step};
use super::require_args;

/// `try(body, code, handler, ...)`: run `body()` with the given handlers
/// active. A `true` code catches everything.
pub fn builtin_try(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    let pairs = args.values.get(1..).unwrap_or_default();
    if pairs.is_empty() || pairs.len() % 2 != 0 {
        return Err(InterpreterError::invalid_operation(
            "try requires a body followed by (code, handler) pairs",
        )
        .at(args.span));
    }

    let arms: Vec<HandlerArm> = pairs
        .chunks(2)
        .filter_map(|pair| match pair {
            [matcher, handler] => Some(HandlerArm { matcher: matcher.clone(), handler: handler.clone() }),
            _ => None,
        })
        .collect();
    debug!(arms = arms.len(), "try");
    let loop_height = interp.loops.height();
    let height = interp.handlers.push(HandlerFrame { arms, k: k.clone(), loop_height });

    interp.apply(
        args.get(0),
        Vec::new(),
        args.span,
        cont(move |interp, value| {
            interp.handlers.truncate(height);
            interp.resume(k.clone(), value)
        }),
    )
}

/// `throw(code, info)` or `throw(code, message, info)`. The message only
/// shows up in the error when nothing catches the throw.
pub fn builtin_throw(interp: &mut Interpreter, _k: Cont, args: CallArgs) -> Step {
    require_args!(args, 1, "throw");
    let (message, info) = match args.len() {
        1 | 2 => (None, args.get(1)),
        _ => (Some(value_to_string(&args.get(1))), args.get(2)),
    };
    interp.raise(args.get(0), message, info, args.span)
}

/// `call(fn, ...args)`.
pub fn builtin_call(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    require_args!(args, 1, "call");
    let mut values = args.values.into_iter();
    let callee = values.next().unwrap_or(Value::Undefined);
    interp.apply(callee, values.collect(), args.span, k)
}

/// `callCC(fn)`: call `fn` with an escape continuation. Calling it delivers
/// its argument to the caller of `callCC`, abandoning whatever was running.
pub fn builtin_call_cc(interp: &mut Interpreter, k: Cont, args: CallArgs) -> Step {
    require_args!(args, 1, "callCC");
    let handler_height = interp.handlers.height();
    let loop_height = interp.loops.height();
    let target = k.clone();
    let escape = cont(move |interp, value| {
        interp.handlers.truncate(handler_height);
        interp.loops.truncate(loop_height);
        interp.resume(target.clone(), value)
    });
    let escape = Value::function(Function::Continuation(escape));
    interp.apply(args.get(0), vec![escape], args.span, k)
}

impl Interpreter {
    /// Hand `code` and `info` to the innermost matching handler.
    ///
    /// The handler resumes the continuation of its `try` call. Loops started
    /// inside that `try` are abandoned.
    pub(crate) fn raise(&mut self, code: Value, message: Option<String>, info: Value, span: Span) -> Step {
        match self.handlers.unwind(&code, self.config.unwind) {
            Some(caught) => {
                debug!(code = %value_to_string(&code), "throw caught");
                self.loops.truncate(caught.loop_height);
                self.apply(caught.handler, vec![code, info], span, caught.k)
            }
            None => {
                let message = message.or_else(|| match info {
                    Value::Undefined => None,
                    ref info => Some(value_to_string(info)),
                });
                Err(InterpreterError::unmatched_exception(value_to_string(&code), message).at(span))
            }
        }
    }
}
