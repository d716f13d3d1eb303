pub mod model;
pub mod wire;

pub use model::{Finding, Severity};
pub use wire::{DecodeError, decode_line, encode, looks_structured};
