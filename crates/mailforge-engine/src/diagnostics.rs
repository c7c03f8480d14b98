//! Recoverable compile diagnostics

use serde::Serialize;

/// A problem found in the source tree that does not stop the compile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub message: String,
    pub tag_name: String,
    pub formatted_message: String,
}

impl Diagnostic {
    pub fn new(tag_name: impl Into<String>, line: Option<usize>, message: impl Into<String>) -> Self {
        let tag_name = tag_name.into();
        let message = message.into();
        let formatted_message = match line {
            Some(line) => format!("Line {} ({}): {}", line, tag_name, message),
            None => format!("({}): {}", tag_name, message),
        };

        Self {
            line,
            message,
            tag_name,
            formatted_message,
        }
    }

    /// Unregistered tag
    pub fn unknown_element(tag_name: &str, line: Option<usize>) -> Self {
        Self::new(tag_name, line, format!("Element {} doesn't exist or is not registered", tag_name))
    }
}

/// The single message a strict compile fails with
pub fn validation_message(diagnostics: &[Diagnostic]) -> String {
    let lines: Vec<&str> = diagnostics.iter().map(|d| d.formatted_message.as_str()).collect();
    format!("ValidationError: \n {}", lines.join("\n"))
}
