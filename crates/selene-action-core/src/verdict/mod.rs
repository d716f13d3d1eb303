pub mod policy;

pub use policy::{Verdict, decide};
