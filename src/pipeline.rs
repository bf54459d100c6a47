//! `Engine`: priority-ordered transformation pipeline over a token stream
//!. A single pass: each token is offered to every transformation
//! in priority order, threading a path stack (object keys / array indices)
//! that filter and validate consume.

use crate::error::{Error, ErrorHandler, Strategy, SEVERITY_WARNING};
use crate::sink::Sink;
use crate::stats::EngineStats;
use crate::tokenizer::{Token, TokenKind, TokenStream};
use crate::transform::{Action, PathSegment, Transformation};

pub const DEFAULT_MAX_DEPTH: usize = crate::tokenizer::DEFAULT_MAX_DEPTH;

/// The bundle of per-call knobs a caller assembles before constructing an
/// [`Engine`]. `Serialize`/`Deserialize` let a caller
/// load this from a config file or pass it across a process boundary;
/// the engine itself never serializes tokens or output.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    pub mode: crate::modes::ProcessingMode,
    #[serde(default)]
    pub thread_count: usize,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default)]
    pub error_strategy: Strategy,
    #[serde(default = "default_max_errors")]
    pub max_accumulated_errors: usize,
}

fn default_window_size() -> usize {
    crate::modes::eco::DEFAULT_WINDOW
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_errors() -> usize {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: crate::modes::ProcessingMode::default(),
            thread_count: 0,
            window_size: default_window_size(),
            max_depth: default_max_depth(),
            error_strategy: Strategy::default(),
            max_accumulated_errors: default_max_errors(),
        }
    }
}

pub struct Engine {
    transformations: Vec<Transformation>,
    max_depth: usize,
    strategy: Strategy,
    max_errors: usize,
    stats: EngineStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            transformations: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            strategy: Strategy::default(),
            max_errors: 1000,
            stats: EngineStats::default(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            transformations: Vec::new(),
            max_depth: config.max_depth,
            strategy: config.error_strategy,
            max_errors: config.max_accumulated_errors,
            stats: EngineStats::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Inserts a transformation, keeping the list sorted by priority
    /// ascending with ties broken by insertion order.
    pub fn add_transformation(&mut self, t: Transformation) {
        let insert_at = self
            .transformations
            .iter()
            .position(|existing| existing.priority > t.priority)
            .unwrap_or(self.transformations.len());
        self.transformations.insert(insert_at, t);
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Runs the configured transformations over `input` in one pass,
    /// writing surviving/rewritten token payloads (plus the whitespace
    /// gaps `Minify` drops) to `sink`.
    ///
    /// `Colon`/`Comma` are never copied verbatim from the input: they are
    /// structural glue the driver re-synthesizes around whichever Key/
    /// element tokens actually survive. A dropped object-member (or array
    /// element) would otherwise leave its neighbouring separators stranded
    /// — e.g. a trailing comma when the last member is excluded, or a bare
    /// `:` when only the key half of a member is dropped — since the
    /// original punctuation's own filter decision can't see past its own
    /// token to know whether the sibling on the far side survived. Walking
    /// the path stack's "has this scope already emitted a sibling" state
    /// instead makes separator placement correct regardless of which
    /// members are dropped or in what order.
    pub fn process(&mut self, input: &[u8], mut sink: impl Sink) -> Result<(), Error> {
        let mut handler = ErrorHandler::new(self.strategy, self.max_errors, SEVERITY_WARNING);
        let mut stream = TokenStream::new(input, self.max_depth);
        let mut tracker = PathTracker::new();

        while let Some(token) = stream.next_token(&mut handler)? {
            self.stats.add_tokens(1);
            let borrowed_path = tracker.path_for(&token, input);

            let mut action = Action::Keep;
            for t in &mut self.transformations {
                action = t.apply(&token, input, &borrowed_path, &mut handler);
                self.stats.record_transformation();
                if matches!(action, Action::Drop) {
                    break;
                }
            }

            if matches!(token.kind, TokenKind::Colon | TokenKind::Comma) {
                tracker.advance(&token, input);
                continue;
            }

            let kept = !matches!(action, Action::Drop);
            let is_sibling_start = tracker.is_sibling_start(&token);
            let needs_comma = is_sibling_start && kept && tracker.scope_has_emitted_sibling();
            if is_sibling_start && kept {
                tracker.mark_sibling_emitted();
            }

            tracker.advance(&token, input);

            if !kept {
                continue;
            }
            if needs_comma {
                sink.write(b",")?;
            }
            match action {
                Action::Keep => sink.write(token.payload(input))?,
                Action::Rewrite(bytes) => sink.write(&bytes)?,
                Action::Drop => unreachable!("filtered out above"),
            }
            if token.kind == TokenKind::Key {
                sink.write(b":")?;
            }
        }

        sink.finish()?;
        let report = handler.accumulator().report();
        self.stats.add_validation_error_count(report.total as u64);
        Ok(())
    }
}

enum OwnedSegment {
    Key(Vec<u8>),
    Index(usize),
}

enum ScopeKind {
    Object { pending_key: Option<Vec<u8>> },
    Array { index: usize },
}

struct Scope {
    own_segment: Option<OwnedSegment>,
    kind: ScopeKind,
    /// Whether some earlier member/element of this scope has already been
    /// written to the sink — gates whether the *next* surviving sibling
    /// needs a leading comma synthesized ahead of it.
    emitted_sibling: bool,
}

/// Tracks the path stack as the pipeline walks the token stream, using a
/// plain indexed `Vec` rather than linked parent pointers. Each scope on
/// the stack remembers the path segment that identifies *itself*, so a
/// child's full path is simply every ancestor's own segment in order.
struct PathTracker {
    stack: Vec<Scope>,
}

impl PathTracker {
    fn new() -> Self {
        Self { stack: Vec::new() }
    }

    fn ancestor_path<'a>(&'a self) -> Vec<PathSegment<'a>> {
        self.stack
            .iter()
            .filter_map(|s| match &s.own_segment {
                Some(OwnedSegment::Key(k)) => Some(PathSegment::Key(k.as_slice())),
                Some(OwnedSegment::Index(i)) => Some(PathSegment::Index(*i)),
                None => None,
            })
            .collect()
    }

    /// The path this token should be evaluated under, before `advance`
    /// mutates tracker state for the next token. Tied to `&'a self` (not
    /// just `&self`) because the returned segments borrow key bytes out of
    /// `self.stack` as well as out of `input` — both need the same lifetime
    /// for the `Vec<PathSegment<'a>>` return type to typecheck.
    fn path_for<'a>(&'a self, token: &'a Token, input: &'a [u8]) -> Vec<PathSegment<'a>> {
        let mut path = self.ancestor_path();
        match token.kind {
            TokenKind::Key => path.push(PathSegment::Key(token.payload(input))),
            TokenKind::String
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::ObjectStart
            | TokenKind::ArrayStart => {
                if let Some(seg) = self.own_segment_for_next_value() {
                    path.push(seg);
                }
            }
            TokenKind::ObjectEnd | TokenKind::ArrayEnd | TokenKind::Colon | TokenKind::Comma => {}
        }
        path
    }

    fn own_segment_for_next_value<'a>(&'a self) -> Option<PathSegment<'a>> {
        match self.stack.last()?.kind {
            ScopeKind::Object { ref pending_key } => pending_key.as_deref().map(PathSegment::Key),
            ScopeKind::Array { index } => Some(PathSegment::Index(index)),
        }
    }

    /// True for tokens that begin a new member/element of the innermost
    /// container: every `Key` (object member), or a value-starting token
    /// when the innermost container is an array (an array element has no
    /// `Key` of its own, so its first token plays that role instead).
    fn is_sibling_start(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Key => true,
            TokenKind::String
            | TokenKind::Number
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::ObjectStart
            | TokenKind::ArrayStart => {
                matches!(self.stack.last().map(|s| &s.kind), Some(ScopeKind::Array { .. }))
            }
            TokenKind::ObjectEnd | TokenKind::ArrayEnd | TokenKind::Colon | TokenKind::Comma => false,
        }
    }

    fn scope_has_emitted_sibling(&self) -> bool {
        self.stack.last().map(|s| s.emitted_sibling).unwrap_or(false)
    }

    fn mark_sibling_emitted(&mut self) {
        if let Some(scope) = self.stack.last_mut() {
            scope.emitted_sibling = true;
        }
    }

    /// Advance tracker state past `token`, now that it has been evaluated.
    fn advance(&mut self, token: &Token, input: &[u8]) {
        match token.kind {
            TokenKind::Key => {
                if let Some(Scope {
                    kind: ScopeKind::Object { pending_key },
                    ..
                }) = self.stack.last_mut()
                {
                    *pending_key = Some(token.payload(input).to_vec());
                }
            }
            TokenKind::ObjectStart | TokenKind::ArrayStart => {
                let own_segment = self.take_own_segment_for_value();
                self.stack.push(Scope {
                    own_segment,
                    kind: if token.kind == TokenKind::ArrayStart {
                        ScopeKind::Array { index: 0 }
                    } else {
                        ScopeKind::Object { pending_key: None }
                    },
                    emitted_sibling: false,
                });
            }
            TokenKind::ObjectEnd | TokenKind::ArrayEnd => {
                self.stack.pop();
                self.bump_parent_index();
            }
            TokenKind::String | TokenKind::Number | TokenKind::True | TokenKind::False | TokenKind::Null => {
                self.take_own_segment_for_value();
                self.bump_parent_index();
            }
            TokenKind::Colon | TokenKind::Comma => {}
        }
    }

    fn take_own_segment_for_value(&mut self) -> Option<OwnedSegment> {
        match self.stack.last_mut()?.kind {
            ScopeKind::Object { ref mut pending_key } => pending_key.take().map(OwnedSegment::Key),
            ScopeKind::Array { index } => Some(OwnedSegment::Index(index)),
        }
    }

    fn bump_parent_index(&mut self) {
        if let Some(Scope {
            kind: ScopeKind::Array { index },
            ..
        }) = self.stack.last_mut()
        {
            *index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::VecSink;
    use crate::transform::filter::FilterConfig;

    #[test]
    fn passthrough_minify_reproduces_sport_output() {
        let input = br#"{ "a" : [1, 2, 3], "b" : "x" }"#;
        let mut engine = Engine::new();
        engine.add_transformation(Transformation::minify(0));
        let mut sink = VecSink::default();
        engine.process(input, &mut sink).unwrap();
        let expected = crate::minify_core::strip_buffer(input, crate::capability::CpuCapabilities::scalar());
        assert_eq!(sink.0, expected);
    }

    #[test]
    fn engine_config_round_trips_through_json() {
        let config = EngineConfig {
            mode: crate::modes::ProcessingMode::Turbo,
            thread_count: 4,
            ..EngineConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.mode, crate::modes::ProcessingMode::Turbo);
        assert_eq!(back.thread_count, 4);
        assert_eq!(back.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn filter_exclude_drops_matched_subtree() {
        let input = br#"{"user":{"name":"x","security":{"pw":"y"}}}"#;
        let mut engine = Engine::new();
        engine.add_transformation(Transformation::filter(
            0,
            FilterConfig::exclude(["user.security".to_string()]),
        ));
        let mut sink = VecSink::default();
        engine.process(input, &mut sink).unwrap();
        let text = String::from_utf8(sink.0).unwrap();
        assert!(!text.contains("security"));
        assert!(text.contains("name"));
    }
}
