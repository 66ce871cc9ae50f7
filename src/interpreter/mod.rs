pub mod builtins;
pub mod control_flow;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod handlers;
pub mod trampoline;

pub use builtins::host::{Completion, HostFunction};
pub use environment::{Binding, Environment};
pub use error::InterpreterError;
pub use evaluator::{run_json, run_json_with_diagnostics, Interpreter};
pub use trampoline::{cont, Bounce, Cont, Step, Thunk};
