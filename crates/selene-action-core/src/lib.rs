pub mod config;
pub mod findings;
pub mod install;
pub mod process;
pub mod report;
pub mod util;
pub mod verdict;

mod pipeline;

pub use pipeline::{LintOutcome, lint};

pub const TOOL_NAME: &str = "selene-action";

/// Release repository the analyzer is fetched from unless overridden.
pub const DEFAULT_REPOSITORY: &str = "Kampfkarren/selene";

/// Base name of the analyzer executable and of its release assets.
pub const DEFAULT_VARIANT: &str = "selene";

/// Symbolic version that resolves to the newest published release.
pub const LATEST_VERSION: &str = "latest";
