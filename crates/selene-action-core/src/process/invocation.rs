use std::path::PathBuf;

use crate::config::ActionConfig;

const DISPLAY_STYLE_FLAG: &str = "--display-style";

/// Machine-readable display style: one JSON object per diagnostic.
pub const STRUCTURED_DISPLAY_STYLE: &str = "Json";

/// A fully specified analyzer launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
}

impl InvocationSpec {
    /// Build the argument list:
    /// `[--config <path>] [--display-style Json] <extra args...> <lint path>`.
    ///
    /// The lint path is positional and always last. The structured display
    /// style is only added when the extra arguments do not pick one.
    pub fn build(executable: impl Into<PathBuf>, config: &ActionConfig) -> Self {
        let mut arguments = Vec::new();

        if let Some(config_path) = &config.config_path {
            arguments.push("--config".to_string());
            arguments.push(config_path.display().to_string());
        }

        if !selects_display_style(&config.extra_args) {
            arguments.push(DISPLAY_STYLE_FLAG.to_string());
            arguments.push(STRUCTURED_DISPLAY_STYLE.to_string());
        }

        arguments.extend(config.extra_args.iter().cloned());
        arguments.push(config.lint_path.clone());

        Self {
            executable: executable.into(),
            arguments,
            working_directory: config.working_directory.clone(),
        }
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn selects_display_style(args: &[String]) -> bool {
    args.iter().any(|arg| {
        arg == DISPLAY_STYLE_FLAG
            || arg
                .strip_prefix(DISPLAY_STYLE_FLAG)
                .is_some_and(|rest| rest.starts_with('='))
    })
}
