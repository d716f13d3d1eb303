//! Workflow-command rendering of annotations.

use crate::report::annotation::Annotation;

/// `::<level> file=<path>,line=<line>,title=<title>::<message>`
pub fn workflow_command(annotation: &Annotation) -> String {
    format!(
        "::{level} file={file},line={line},title={title}::{message}",
        level = annotation.level,
        file = escape_property(&annotation.file),
        line = annotation.line,
        title = escape_property(&annotation.title),
        message = escape_data(&annotation.message),
    )
}

/// Escape a command's message so multi-line text stays one command.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a `key=value` property; `:` and `,` would end the value.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}
