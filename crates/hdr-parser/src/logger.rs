//! Contextual diagnostics for a parse run.
//!
//! Every message is emitted through `tracing` and also kept on the logger, so
//! the caller can decide afterwards whether a run that completed should still
//! count as failed.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Source position a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Joined context stack at the time of the message, e.g. `Interface:[IFoo]/Method:[Bar]`.
    pub context: Option<String>,
    pub location: Option<Location>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}: ", self.severity)?;
        if let Some(context) = &self.context {
            write!(f, "[{context}] ")?;
        }
        f.write_str(&self.message)
    }
}

#[derive(Debug, Default)]
pub struct Logger {
    contexts: Vec<String>,
    locations: Vec<Location>,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_context(&mut self, context: impl Into<String>) {
        self.contexts.push(context.into());
    }

    pub fn pop_context(&mut self) {
        self.contexts.pop();
    }

    pub fn push_location(&mut self, location: Location) {
        self.locations.push(location);
    }

    pub fn pop_location(&mut self) {
        self.locations.pop();
    }

    #[must_use]
    pub fn current_context(&self) -> Option<String> {
        if self.contexts.is_empty() {
            None
        } else {
            Some(self.contexts.join("/"))
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Severity::Info, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(Severity::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(Severity::Error, message.into());
    }

    fn record(&mut self, severity: Severity, message: String) {
        let context = self.current_context();
        let location = self.locations.last().cloned();
        let ctx = context.as_deref().unwrap_or("-");
        let loc = location
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);

        match severity {
            Severity::Info => tracing::info!(context = ctx, location = %loc, "{message}"),
            Severity::Warning => {
                self.warnings += 1;
                tracing::warn!(context = ctx, location = %loc, "{message}");
            }
            Severity::Error => {
                self.errors += 1;
                tracing::error!(context = ctx, location = %loc, "{message}");
            }
        }

        self.diagnostics.push(Diagnostic {
            severity,
            message,
            context,
            location,
        });
    }

    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.errors > 0
    }

    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors
    }

    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn context_and_location_are_captured_per_message() {
        let mut log = Logger::new();
        log.push_context("Interface:[IFoo]");
        log.push_context("Method:[Bar]");
        log.push_location(Location::new("foo.h", 12, 3));
        log.error("bad base");
        log.pop_location();
        log.pop_context();
        log.warning("later");

        let diags = log.diagnostics();
        assert_eq!(diags[0].context.as_deref(), Some("Interface:[IFoo]/Method:[Bar]"));
        assert_eq!(diags[0].location, Some(Location::new("foo.h", 12, 3)));
        assert_eq!(diags[1].context.as_deref(), Some("Interface:[IFoo]"));
        assert_eq!(diags[1].location, None);
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.warning_count(), 1);
        assert!(log.has_errors());
    }

    #[test]
    fn info_does_not_count() {
        let mut log = Logger::new();
        log.info("parsing");
        assert!(!log.has_errors());
        assert_eq!(log.warning_count(), 0);
        assert_eq!(log.diagnostics().len(), 1);
    }

    #[test]
    fn display_includes_location_and_context() {
        let diag = Diagnostic {
            severity: Severity::Error,
            message: "boom".into(),
            context: Some("Struct:[S]".into()),
            location: Some(Location::new("a.h", 1, 2)),
        };
        assert_eq!(diag.to_string(), "a.h(1,2): error: [Struct:[S]] boom");
    }
}
