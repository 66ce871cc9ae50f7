/// Steps a continuation chain may take on the native stack before the
/// trampoline unwinds and re-enters.
pub const DEFAULT_STEP_BUDGET: usize = 200;

/// Largest accepted budget. Every step of the budget can sit on the native
/// stack at once; this keeps a bounce within a 2 MiB thread stack.
pub const MAX_STEP_BUDGET: usize = 256;

/// What `throw` does with handler frames when no handler matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnwindPolicy {
    /// Leave the handler stack as it was before the throw.
    #[default]
    Restore,
    /// Keep every frame popped during the search, even though nothing
    /// matched.
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    pub step_budget: usize,
    pub unwind: UnwindPolicy,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            step_budget: DEFAULT_STEP_BUDGET,
            unwind: UnwindPolicy::default(),
        }
    }
}

impl InterpreterConfig {
    /// Clamped to `1..=MAX_STEP_BUDGET`; zero would never make progress.
    pub fn with_step_budget(mut self, step_budget: usize) -> Self {
        self.step_budget = step_budget.clamp(1, MAX_STEP_BUDGET);
        self
    }

    pub fn with_unwind(mut self, unwind: UnwindPolicy) -> Self {
        self.unwind = unwind;
        self
    }
}
