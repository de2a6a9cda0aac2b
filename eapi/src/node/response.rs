//! Response type for `Node::enable` results.

/// Text output of one command run through [`Node::enable`](super::Node::enable).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableResponse {
    /// The command exactly as it was passed in.
    pub command: String,

    /// The command output, trimmed of surrounding whitespace.
    pub result: String,
}

impl EnableResponse {
    /// Create a new response.
    pub fn new(command: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
        }
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }

    /// Check if the result contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.result.contains(pattern)
    }
}

impl std::fmt::Display for EnableResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.result)
    }
}
