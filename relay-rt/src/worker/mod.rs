//! The language-runtime actor and the `Evaluator` collaborator interface
//! it depends on.

pub mod actor;
pub mod evaluator;

pub use actor::{ServerInitData, WorkerActor, DEFAULT_SEND_TIMEOUT};
pub use evaluator::{ArithmeticEvaluator, Evaluator, GlobalFn};
