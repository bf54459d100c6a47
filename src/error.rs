//! Error taxonomy and recovery policy.
//!
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Fault     │ -> │  ErrorKind  │ -> │ RecoveryAction│
//! │ (tokenizer) │    │ + context   │    │ (handler)   │
//! └─────────────┘    └─────────────┘    └─────────────┘
//!
//! Every fault the scanner/tokenizer encounters is classified into one of
//! the six kind-groups below, wrapped in an [`ErrorContext`] carrying the
//! byte offset/line/column, and handed to an [`ErrorHandler`] which decides
//! how (or whether) to keep going.

use std::fmt;

/// Severity on a 1..3 scale: 1 = warning, 2 = error, 3 = fatal.
pub type Severity = u8;

pub const SEVERITY_WARNING: Severity = 1;
pub const SEVERITY_ERROR: Severity = 2;
pub const SEVERITY_FATAL: Severity = 3;

/// One entry in the error taxonomy, grouped by category:
/// Lexical, Numeric, Structural, Literal, Policy, Resource.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ErrorKind {
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unescaped control byte in string")]
    UnescapedControlByte,
    #[error("invalid unicode escape")]
    InvalidUnicodeEscape,

    #[error("malformed number")]
    MalformedNumber,

    #[error("unexpected character {found:?}")]
    UnexpectedCharacter { found: char },
    #[error("depth limit exceeded (max {max})")]
    DepthLimitExceeded { max: usize },
    #[error("unbalanced brackets")]
    UnbalancedBrackets,

    #[error("misspelled literal")]
    MisspelledLiteral,

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("allocation failure")]
    AllocationFailure,
    #[error("sink write error: {0}")]
    SinkWrite(String),
    #[error("operation timed out")]
    Timeout,

    #[error("trailing non-whitespace content after top-level value")]
    TrailingContent,
}

impl ErrorKind {
    /// Default severity for this kind, absent any handler override.
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorKind::TrailingContent => SEVERITY_WARNING,
            ErrorKind::SchemaValidation(_) => SEVERITY_ERROR,
            ErrorKind::AllocationFailure | ErrorKind::SinkWrite(_) | ErrorKind::Timeout => {
                SEVERITY_FATAL
            }
            _ => SEVERITY_ERROR,
        }
    }

    /// True for the "Resource" group, which is always fatal
    /// and must surface immediately rather than going through recovery.
    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            ErrorKind::AllocationFailure | ErrorKind::SinkWrite(_) | ErrorKind::Timeout
        )
    }
}

/// Byte offset plus derived line/column, attached to every fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }
}

/// One recorded fault, as pushed onto an [`ErrorAccumulator`].
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub kind: ErrorKind,
    pub position: Position,
    pub severity: Severity,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(kind: ErrorKind, position: Position) -> Self {
        let message = kind.to_string();
        let severity = kind.default_severity();
        Self {
            kind,
            position,
            severity,
            message,
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}: {}",
            severity_tag(self.severity),
            self.position.line,
            self.position.column,
            self.message
        )
    }
}

impl std::error::Error for ErrorContext {}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        SEVERITY_WARNING => "warning",
        SEVERITY_FATAL => "fatal",
        _ => "error",
    }
}

/// What the tokenizer should do after a fault has been classified.
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    Continue,
    Skip(usize),
    Repair(Vec<u8>),
    Abort,
}

/// Configurable default strategy, selected per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    SkipAndContinue,
    #[default]
    BestEffort,
    Abort,
    Custom,
}

/// Top-level library error. Returned by the public entry points; the CLI
/// maps this to process exit codes at the `main` boundary only.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid JSON: {0}")]
    Invalid(#[from] ErrorContext),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("resource error: {0}")]
    Resource(String),
}

/// Accumulates [`ErrorContext`]s up to a configured maximum, and renders a
/// grouped post-run report. Shared by the single-threaded modes and merged
/// across TURBO chunks (§4.8: "non-fatal errors are accumulated per chunk
/// and merged in input order").
#[derive(Debug, Default)]
pub struct ErrorAccumulator {
    entries: Vec<ErrorContext>,
    max_entries: usize,
    dropped: usize,
}

impl ErrorAccumulator {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
            dropped: 0,
        }
    }

    pub fn push(&mut self, ctx: ErrorContext) {
        if self.max_entries == 0 || self.entries.len() < self.max_entries {
            tracing::warn!(%ctx, "recovered parse fault");
            self.entries.push(ctx);
        } else {
            self.dropped += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ErrorContext] {
        &self.entries
    }

    /// Merge another accumulator's entries in, preserving relative input
    /// order by offset. Used to stitch per-chunk accumulators together.
    pub fn merge(&mut self, mut other: ErrorAccumulator) {
        self.entries.append(&mut other.entries);
        self.dropped += other.dropped;
        self.entries.sort_by_key(|e| e.position.offset);
    }

    pub fn report(&self) -> ErrorReport {
        let mut by_kind: std::collections::BTreeMap<String, usize> = Default::default();
        let mut severity_histogram = [0usize; 4];
        for entry in &self.entries {
            *by_kind.entry(kind_tag(&entry.kind).to_string()).or_default() += 1;
            severity_histogram[entry.severity as usize] += 1;
        }
        ErrorReport {
            total: self.entries.len(),
            dropped: self.dropped,
            by_kind,
            severity_histogram,
        }
    }
}

fn kind_tag(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidEscape
        | ErrorKind::UnterminatedString
        | ErrorKind::UnescapedControlByte
        | ErrorKind::InvalidUnicodeEscape => "lexical",
        ErrorKind::MalformedNumber => "numeric",
        ErrorKind::UnexpectedCharacter { .. }
        | ErrorKind::DepthLimitExceeded { .. }
        | ErrorKind::UnbalancedBrackets => "structural",
        ErrorKind::MisspelledLiteral => "literal",
        ErrorKind::SchemaValidation(_) => "policy",
        ErrorKind::AllocationFailure | ErrorKind::SinkWrite(_) | ErrorKind::Timeout => "resource",
        ErrorKind::TrailingContent => "structural",
    }
}

/// Grouped summary produced by [`ErrorAccumulator::report`].
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub total: usize,
    pub dropped: usize,
    pub by_kind: std::collections::BTreeMap<String, usize>,
    pub severity_histogram: [usize; 4],
}

/// Central error handler: picks a [`RecoveryAction`] for a given fault
/// under the configured [`Strategy`], and pushes the fault into the
/// accumulator. One handler per engine call; not shared across calls.
pub struct ErrorHandler {
    strategy: Strategy,
    severity_threshold: Severity,
    custom: Option<Box<dyn Fn(&ErrorContext) -> RecoveryAction + Send + Sync>>,
    accumulator: ErrorAccumulator,
}

impl ErrorHandler {
    pub fn new(strategy: Strategy, max_errors: usize, severity_threshold: Severity) -> Self {
        Self {
            strategy,
            severity_threshold,
            custom: None,
            accumulator: ErrorAccumulator::new(max_errors),
        }
    }

    pub fn with_custom(
        mut self,
        f: impl Fn(&ErrorContext) -> RecoveryAction + Send + Sync + 'static,
    ) -> Self {
        self.strategy = Strategy::Custom;
        self.custom = Some(Box::new(f));
        self
    }

    /// Classify a fault, record it, and return the action to apply.
    /// Resource faults bypass the strategy entirely: they are always fatal.
    pub fn handle(&mut self, kind: ErrorKind, position: Position) -> RecoveryAction {
        if kind.is_resource() {
            let ctx = ErrorContext::new(kind, position);
            tracing::error!(%ctx, "fatal resource fault");
            self.accumulator.push(ctx);
            return RecoveryAction::Abort;
        }

        let ctx = ErrorContext::new(kind.clone(), position);
        if ctx.severity < self.severity_threshold {
            return RecoveryAction::Continue;
        }
        self.accumulator.push(ctx.clone());

        match self.strategy {
            Strategy::SkipAndContinue => RecoveryAction::Skip(1),
            Strategy::BestEffort => best_effort_repair(&kind),
            Strategy::Abort => RecoveryAction::Abort,
            Strategy::Custom => self
                .custom
                .as_ref()
                .map(|f| f(&ctx))
                .unwrap_or(RecoveryAction::Abort),
        }
    }

    pub fn into_accumulator(self) -> ErrorAccumulator {
        self.accumulator
    }

    pub fn accumulator(&self) -> &ErrorAccumulator {
        &self.accumulator
    }

    pub fn accumulator_mut(&mut self) -> &mut ErrorAccumulator {
        &mut self.accumulator
    }
}

/// `BestEffort` synthesises a plausible replacement: `0` for a bad number,
/// `?` for a bad escape.
fn best_effort_repair(kind: &ErrorKind) -> RecoveryAction {
    match kind {
        ErrorKind::MalformedNumber => RecoveryAction::Repair(b"0".to_vec()),
        ErrorKind::InvalidEscape | ErrorKind::InvalidUnicodeEscape => {
            RecoveryAction::Repair(b"?".to_vec())
        }
        ErrorKind::MisspelledLiteral => RecoveryAction::Repair(b"null".to_vec()),
        ErrorKind::TrailingContent => RecoveryAction::Continue,
        _ => RecoveryAction::Skip(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_replaces_malformed_number_with_zero() {
        let mut handler = ErrorHandler::new(Strategy::BestEffort, 100, SEVERITY_WARNING);
        let action = handler.handle(ErrorKind::MalformedNumber, Position::new(10, 0, 10));
        match action {
            RecoveryAction::Repair(bytes) => assert_eq!(bytes, b"0"),
            other => panic!("expected repair, got {other:?}"),
        }
        assert_eq!(handler.accumulator().len(), 1);
    }

    #[test]
    fn abort_strategy_always_aborts() {
        let mut handler = ErrorHandler::new(Strategy::Abort, 100, SEVERITY_WARNING);
        let action = handler.handle(ErrorKind::UnbalancedBrackets, Position::new(0, 0, 0));
        assert!(matches!(action, RecoveryAction::Abort));
    }

    #[test]
    fn accumulator_drops_past_max_but_counts_them() {
        let mut acc = ErrorAccumulator::new(1);
        acc.push(ErrorContext::new(
            ErrorKind::UnbalancedBrackets,
            Position::new(0, 0, 0),
        ));
        acc.push(ErrorContext::new(
            ErrorKind::UnbalancedBrackets,
            Position::new(1, 0, 1),
        ));
        assert_eq!(acc.len(), 1);
        assert_eq!(acc.report().dropped, 1);
    }

    #[test]
    fn merge_preserves_offset_order() {
        let mut a = ErrorAccumulator::new(10);
        a.push(ErrorContext::new(
            ErrorKind::MalformedNumber,
            Position::new(50, 0, 50),
        ));
        let mut b = ErrorAccumulator::new(10);
        b.push(ErrorContext::new(
            ErrorKind::MalformedNumber,
            Position::new(5, 0, 5),
        ));
        a.merge(b);
        let offsets: Vec<_> = a.entries().iter().map(|e| e.position.offset).collect();
        assert_eq!(offsets, vec![5, 50]);
    }

    #[test]
    fn resource_faults_are_always_fatal_regardless_of_strategy() {
        let mut handler = ErrorHandler::new(Strategy::BestEffort, 10, SEVERITY_WARNING);
        let action = handler.handle(ErrorKind::Timeout, Position::new(0, 0, 0));
        assert!(matches!(action, RecoveryAction::Abort));
    }
}
