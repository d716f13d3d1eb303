pub mod annotation;
pub mod render;

pub use annotation::{Annotation, Level, Tally, map_finding};
