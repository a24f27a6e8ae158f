//! Diagnostics for non-fatal parse problems
//!
//! A parse reports every recoverable failure (a broken chain link, an
//! unreadable Info object, an unsupported stream filter) as a [`Diagnostic`].
//! Diagnostics are collected on the [`Extraction`](crate::Extraction) and
//! forwarded to a [`DiagnosticSink`], which is silent unless configured.

use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Severity {
    Warning,
    Error,
}

/// Parse stage that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Stage {
    Header,
    XrefChain,
    Root,
    Info,
    Metadata,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Header => "header",
            Stage::XrefChain => "xref-chain",
            Stage::Root => "root",
            Stage::Info => "info",
            Stage::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            stage,
            message: message.into(),
        }
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level} [{}]: {}", self.stage, self.message)
    }
}

/// Receiver of parse diagnostics
pub trait DiagnosticSink {
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Drops every diagnostic
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        let stage = diagnostic.stage.to_string();
        match diagnostic.severity {
            Severity::Warning => {
                tracing::warn!(stage = %stage, detail = %diagnostic.message, "pdf parse warning")
            }
            Severity::Error => {
                tracing::error!(stage = %stage, detail = %diagnostic.message, "pdf parse error")
            }
        }
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic),
{
    fn emit(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Collects diagnostics for one parse and forwards them to the sink
pub(crate) struct DiagnosticLog<'s> {
    sink: &'s dyn DiagnosticSink,
    entries: Vec<Diagnostic>,
}

impl<'s> DiagnosticLog<'s> {
    pub(crate) fn new(sink: &'s dyn DiagnosticSink) -> Self {
        Self {
            sink,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.sink.emit(&diagnostic);
        self.entries.push(diagnostic);
    }

    pub(crate) fn warn(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Diagnostic::warning(stage, message));
    }

    pub(crate) fn error(&mut self, stage: Stage, message: impl Into<String>) {
        self.push(Diagnostic::error(stage, message));
    }

    pub(crate) fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::warning(Stage::Info, "Cannot find info object");
        assert_eq!(
            diagnostic.to_string(),
            "warning [info]: Cannot find info object"
        );
        let diagnostic = Diagnostic::error(Stage::XrefChain, "bad link");
        assert_eq!(diagnostic.to_string(), "error [xref-chain]: bad link");
    }

    #[test]
    fn test_log_forwards_to_closure_sink() {
        let seen = RefCell::new(Vec::new());
        let sink = |d: &Diagnostic| seen.borrow_mut().push(d.stage);

        let mut log = DiagnosticLog::new(&sink);
        log.warn(Stage::Root, "missing");
        log.error(Stage::Metadata, "unsupported");
        let entries = log.into_entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[1].severity, Severity::Error);
        assert_eq!(*seen.borrow(), vec![Stage::Root, Stage::Metadata]);
    }

    #[test]
    fn test_stage_names() {
        let names: Vec<String> = [
            Stage::Header,
            Stage::XrefChain,
            Stage::Root,
            Stage::Info,
            Stage::Metadata,
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(names, ["header", "xref-chain", "root", "info", "metadata"]);
    }

    #[test]
    fn test_noop_and_tracing_sinks_accept_diagnostics() {
        let diagnostic = Diagnostic::warning(Stage::Header, "no version digits");
        NoopSink.emit(&diagnostic);
        TracingSink.emit(&diagnostic);
    }
}
