use crate::span::Span;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single structured diagnostic produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogMessage {
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl LogMessage {
    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.span, self.message)
    }
}

/// Collects diagnostics raised while parsing and tracks the sticky
/// "has a fatal error occurred" flag that short-circuits statement
/// production (spec.md §4.7, §7).
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<LogMessage>,
    has_fatal_error: bool,
    depth_limit_reported: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_error(&mut self, span: Span, message: impl Into<String>) {
        self.messages.push(LogMessage::error(span, message));
    }

    pub fn push_warning(&mut self, span: Span, message: impl Into<String>) {
        self.messages.push(LogMessage::warning(span, message));
    }

    /// Records a recoverable or fatal error uniformly; `fatal` sets the
    /// sticky flag that causes `tryParseStatement` to stop producing further
    /// statements (spec.md §4.7).
    pub fn push_fatal(&mut self, span: Span, message: impl Into<String>) {
        self.push_error(span, message);
        self.has_fatal_error = true;
    }

    /// Reports the depth-limit diagnostic exactly once, per spec.md §4.9.
    pub fn report_depth_limit_once(&mut self, span: Span, limit: u32) {
        if self.depth_limit_reported {
            return;
        }
        self.depth_limit_reported = true;
        self.push_fatal(span, format!("maximum nesting depth of {limit} exceeded"));
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(LogMessage::is_error)
    }

    pub fn has_fatal_error(&self) -> bool {
        self.has_fatal_error
    }

    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<LogMessage> {
        self.messages
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.has_fatal_error |= other.has_fatal_error;
        self.messages.extend(other.messages);
    }
}
