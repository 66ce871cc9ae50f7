use tracing::debug;

use crate::config::UnwindPolicy;
use crate::value::Value;
use super::trampoline::Cont;

/// One `(code, handler)` pair of a `try` call.
#[derive(Debug, Clone)]
pub struct HandlerArm {
    /// `true` matches every code; anything else matches by `==`.
    pub matcher: Value,
    pub handler: Value,
}

impl HandlerArm {
    pub fn matches(&self, code: &Value) -> bool {
        matches!(self.matcher, Value::Bool(true)) || self.matcher.strict_equals(code)
    }
}

/// Everything one `try` call registers. All arms resume the same
/// continuation: the one that would have received the `try` body's result.
pub struct HandlerFrame {
    pub arms: Vec<HandlerArm>,
    pub k: Cont,
    /// Loop-stack height when the `try` started.
    pub loop_height: usize,
}

/// What a successful `throw` resumes into.
pub struct Caught {
    pub handler: Value,
    pub k: Cont,
    pub loop_height: usize,
}

#[derive(Default)]
pub struct HandlerStack {
    frames: Vec<HandlerFrame>,
}

impl HandlerStack {
    /// Push a frame and return the height it must be truncated back to.
    pub fn push(&mut self, frame: HandlerFrame) -> usize {
        let height = self.frames.len();
        self.frames.push(frame);
        height
    }

    pub fn height(&self) -> usize {
        self.frames.len()
    }

    pub fn truncate(&mut self, height: usize) {
        self.frames.truncate(height);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Search from the innermost frame outwards for an arm matching `code`.
    ///
    /// On a match, the matching frame and everything above it are removed.
    /// Without a match the stack is left as it was under
    /// [`UnwindPolicy::Restore`] and emptied under
    /// [`UnwindPolicy::Destructive`].
    pub fn unwind(&mut self, code: &Value, policy: UnwindPolicy) -> Option<Caught> {
        let found = self.frames.iter().enumerate().rev().find_map(|(index, frame)| {
            frame.arms.iter().find(|arm| arm.matches(code)).map(|arm| (index, arm.handler.clone()))
        });

        match found {
            Some((index, handler)) => {
                debug!(popped = self.frames.len() - index, "exception caught");
                let mut popped = self.frames.drain(index..);
                let frame = popped.next()?;
                Some(Caught { handler, k: frame.k, loop_height: frame.loop_height })
            }
            None => {
                if policy == UnwindPolicy::Destructive {
                    self.frames.clear();
                }
                None
            }
        }
    }
}
