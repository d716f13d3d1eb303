pub mod invocation;
pub mod parse;
pub mod runner;

pub use invocation::InvocationSpec;
pub use parse::{LineClass, OutputParser, RawLine, Stream};
pub use runner::{ExecutionResult, RunOutput, TerminationError, run};
