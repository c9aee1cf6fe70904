use crate::store::StoreError;
use std::fmt;

/// Failure detail from an external invocation: what went wrong plus whatever
/// the tool printed before it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub output: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: output.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(message, String::new())
    }

    /// First line of the message, suitable for a one-line log entry.
    pub fn headline(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        let output = self.output.trim_end();
        if !output.is_empty() {
            write!(f, "\nOutput: {output}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

impl From<StoreError> for Diagnostic {
    fn from(err: StoreError) -> Self {
        Diagnostic::message(err.to_string())
    }
}
