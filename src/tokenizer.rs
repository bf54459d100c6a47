//! Tokenizer: tokens on demand, not eagerly materialised.
//!
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │   Bytes     │ -> │  Tokenizer  │ -> │   Tokens    │
//! │ (buffer)    │    │ (pull-based)│    │ (Key/String/│
//! │             │    │ state machine│   │  Number/...)│
//! └─────────────┘    └─────────────┘    └─────────────┘
//!
//! This is the component the transformation pipeline consumes.
//! ECO/SPORT/TURBO do *not* go through here — ECO in particular never
//! materialises a token buffer — they run directly on the
//! structural scanner + string-state tracker in [`crate::minify_core`].
//! Modelled as an explicit state machine with a pull-based `next_token`,
//! generating tokens lazily rather than building a full parse tree up front.

use crate::error::{Error, ErrorHandler, ErrorKind, Position, RecoveryAction};

pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    ObjectStart,
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Key,
    String,
    Number,
    True,
    False,
    Null,
    Colon,
    Comma,
}

/// A half-open byte range `[start, end)` plus its kind and nesting depth.
/// `repaired`, when set, is the replacement byte sequence a `BestEffort`
/// recovery substituted for the original span (`0` for a malformed number,
/// `?` for a bad escape) — consumers should prefer it over
/// `bytes[start..end]` when present.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub nesting_depth: usize,
    pub repaired: Option<Vec<u8>>,
}

impl Token {
    /// The bytes this token contributes to output: the repair if one was
    /// applied, otherwise the verbatim input span.
    pub fn payload<'a>(&'a self, input: &'a [u8]) -> &'a [u8] {
        self.repaired.as_deref().unwrap_or(&input[self.start..self.end])
    }
}

#[derive(Debug)]
enum Context {
    Object { expecting_key: bool },
    Array,
}

/// Pull-based token stream over one byte buffer. `next_token` produces
/// tokens one at a time; previously produced tokens stay available via
/// [`TokenStream::get_token`] for as long as the stream (and its backing
/// buffer) is retained.
pub struct TokenStream<'a> {
    bytes: &'a [u8],
    pos: usize,
    produced: Vec<Token>,
    context_stack: Vec<Context>,
    max_depth: usize,
    finished: bool,
    trailing_checked: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(bytes: &'a [u8], max_depth: usize) -> Self {
        Self {
            bytes,
            pos: 0,
            produced: Vec::new(),
            context_stack: Vec::new(),
            max_depth,
            finished: false,
            trailing_checked: false,
        }
    }

    pub fn count(&self) -> usize {
        self.produced.len()
    }

    /// Precondition: `index < self.count()`. Out-of-range is a programming
    /// error, not a recoverable one.
    pub fn get_token(&self, index: usize) -> &Token {
        &self.produced[index]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.produced
    }

    fn depth(&self) -> usize {
        self.context_stack.len()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len() && is_ws(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn position_at(&self, offset: usize) -> Position {
        // Line/column are recomputed on demand rather than tracked
        // incrementally; faults are rare relative to tokens, so this
        // trades a linear scan on the fault path for a simpler hot path.
        let mut line = 1usize;
        let mut col = 1usize;
        for &b in &self.bytes[..offset.min(self.bytes.len())] {
            if b == b'\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Position::new(offset, line, col)
    }

    /// Produce the next token, or `Ok(None)` at end of stream. Faults are
    /// routed through `handler`; an `Abort` recovery surfaces as `Err`.
    ///
    /// Looping here (rather than having the unexpected-character case
    /// recurse into itself) keeps stack depth flat for inputs that are
    /// mostly garbage under a skip-and-continue policy.
    pub fn next_token(&mut self, handler: &mut ErrorHandler) -> Result<Option<Token>, Error> {
        loop {
            match self.next_token_once(handler)? {
                Some(token) => return Ok(Some(token)),
                None if self.finished => return Ok(None),
                None => continue,
            }
        }
    }

    /// One step of the state machine. `Ok(None)` with `self.finished` still
    /// false means "skipped a byte, call again" — only `next_token` loops on
    /// that; everyone else treats `next_token` as the entry point.
    fn next_token_once(&mut self, handler: &mut ErrorHandler) -> Result<Option<Token>, Error> {
        if self.finished {
            return Ok(None);
        }

        self.skip_ws();

        if self.pos >= self.bytes.len() {
            if !self.context_stack.is_empty() {
                let pos = self.position_at(self.pos);
                let action = handler.handle(ErrorKind::UnbalancedBrackets, pos);
                self.apply_nonfatal(action)?;
            }
            self.finished = true;
            return Ok(None);
        }

        // A bare top-level value is complete once depth returns to 0 and
        // at least one token has been produced; anything non-whitespace
        // after that point is trailing content.
        if self.context_stack.is_empty() && !self.produced.is_empty() && !self.trailing_checked {
            self.trailing_checked = true;
            let pos = self.position_at(self.pos);
            handler.handle(ErrorKind::TrailingContent, pos);
            self.finished = true;
            return Ok(None);
        }

        let byte = self.bytes[self.pos];
        let depth = self.depth();

        let token = match byte {
            b'{' => {
                if self.check_depth_limit(handler)? {
                    return Ok(None);
                }
                self.context_stack.push(Context::Object { expecting_key: true });
                self.emit_single(TokenKind::ObjectStart, depth)
            }
            b'}' => {
                self.pop_context(handler, false)?;
                self.emit_single(TokenKind::ObjectEnd, depth.saturating_sub(1))
            }
            b'[' => {
                if self.check_depth_limit(handler)? {
                    return Ok(None);
                }
                self.context_stack.push(Context::Array);
                self.emit_single(TokenKind::ArrayStart, depth)
            }
            b']' => {
                self.pop_context(handler, true)?;
                self.emit_single(TokenKind::ArrayEnd, depth.saturating_sub(1))
            }
            b':' => {
                if let Some(Context::Object { expecting_key }) = self.context_stack.last_mut() {
                    *expecting_key = false;
                }
                self.emit_single(TokenKind::Colon, depth)
            }
            b',' => {
                if let Some(Context::Object { expecting_key }) = self.context_stack.last_mut() {
                    *expecting_key = true;
                }
                self.emit_single(TokenKind::Comma, depth)
            }
            b'"' => self.lex_string(handler, depth)?,
            b'-' | b'0'..=b'9' => self.lex_number(handler, depth)?,
            b't' | b'f' | b'n' => self.lex_literal(handler, depth)?,
            other => {
                let pos = self.position_at(self.pos);
                let action = handler.handle(ErrorKind::UnexpectedCharacter { found: other as char }, pos);
                // Skip(n) already advances past the fault; anything else
                // (Continue, Repair) still needs the bad byte consumed so
                // the loop in `next_token` makes forward progress.
                let skip_advances = matches!(action, RecoveryAction::Skip(_));
                self.apply_nonfatal(action)?;
                if !skip_advances {
                    self.pos += 1;
                }
                return Ok(None);
            }
        };

        if let Some(token) = &token {
            self.produced.push(token.clone());
        }
        Ok(token)
    }

    /// Returns `Ok(true)` when `max_depth` was reached and the fault was
    /// handled non-fatally: the opening bracket is consumed here as a
    /// skipped byte and the caller must not push a context or emit a
    /// token for it, so nesting can never grow past `max_depth` regardless
    /// of strategy. Returns `Ok(false)` when depth is within bounds and the
    /// caller should push/emit as usual. `Abort` surfaces as `Err` via
    /// `apply_nonfatal`, same as every other fault kind.
    fn check_depth_limit(&mut self, handler: &mut ErrorHandler) -> Result<bool, Error> {
        if self.context_stack.len() >= self.max_depth {
            let pos = self.position_at(self.pos);
            let action = handler.handle(
                ErrorKind::DepthLimitExceeded { max: self.max_depth },
                pos,
            );
            let skip_advances = matches!(action, RecoveryAction::Skip(_));
            self.apply_nonfatal(action)?;
            if !skip_advances {
                self.pos += 1;
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn pop_context(&mut self, handler: &mut ErrorHandler, want_array: bool) -> Result<(), Error> {
        match self.context_stack.pop() {
            Some(Context::Array) if want_array => Ok(()),
            Some(Context::Object { .. }) if !want_array => Ok(()),
            _ => {
                let pos = self.position_at(self.pos);
                let action = handler.handle(ErrorKind::UnbalancedBrackets, pos);
                self.apply_nonfatal(action)
            }
        }
    }

    fn emit_single(&mut self, kind: TokenKind, depth: usize) -> Option<Token> {
        let start = self.pos;
        self.pos += 1;
        Some(Token {
            kind,
            start,
            end: self.pos,
            nesting_depth: depth,
            repaired: None,
        })
    }

    fn lex_string(&mut self, handler: &mut ErrorHandler, depth: usize) -> Result<Option<Token>, Error> {
        let start = self.pos;
        self.pos += 1; // opening quote
        loop {
            if self.pos >= self.bytes.len() {
                let pos = self.position_at(start);
                let action = handler.handle(ErrorKind::UnterminatedString, pos);
                self.apply_nonfatal(action)?;
                break;
            }
            let b = self.bytes[self.pos];
            match b {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    if self.pos >= self.bytes.len() {
                        let pos = self.position_at(self.pos);
                        let action = handler.handle(ErrorKind::UnterminatedString, pos);
                        self.apply_nonfatal(action)?;
                        break;
                    }
                    let esc = self.bytes[self.pos];
                    match esc {
                        b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => {
                            self.pos += 1;
                        }
                        b'u' => {
                            let digits_start = self.pos + 1;
                            let have = self.bytes.len().saturating_sub(digits_start).min(4);
                            let valid = have == 4
                                && self.bytes[digits_start..digits_start + 4]
                                    .iter()
                                    .all(|c| c.is_ascii_hexdigit());
                            if valid {
                                self.pos = digits_start + 4;
                            } else {
                                let pos = self.position_at(self.pos - 1);
                                let action = handler.handle(ErrorKind::InvalidUnicodeEscape, pos);
                                self.apply_nonfatal(action)?;
                                self.pos = digits_start + have;
                            }
                        }
                        _ => {
                            let pos = self.position_at(self.pos - 1);
                            let action = handler.handle(ErrorKind::InvalidEscape, pos);
                            self.apply_nonfatal(action)?;
                            self.pos += 1;
                        }
                    }
                }
                0x00..=0x1F => {
                    let pos = self.position_at(self.pos);
                    let action = handler.handle(ErrorKind::UnescapedControlByte, pos);
                    let skip_advances = matches!(action, RecoveryAction::Skip(_));
                    self.apply_nonfatal(action)?;
                    if !skip_advances {
                        self.pos += 1;
                    }
                }
                _ => self.pos += 1,
            }
        }
        let end = self.pos;

        let reclassify_as_key = matches!(
            self.context_stack.last(),
            Some(Context::Object { expecting_key: true })
        ) && self.peek_colon_after(end);

        let kind = if reclassify_as_key {
            TokenKind::Key
        } else {
            TokenKind::String
        };

        Ok(Some(Token {
            kind,
            start,
            end,
            nesting_depth: depth,
            repaired: None,
        }))
    }

    fn peek_colon_after(&self, from: usize) -> bool {
        let mut i = from;
        while i < self.bytes.len() && is_ws(self.bytes[i]) {
            i += 1;
        }
        i < self.bytes.len() && self.bytes[i] == b':'
    }

    fn lex_number(&mut self, handler: &mut ErrorHandler, depth: usize) -> Result<Option<Token>, Error> {
        let start = self.pos;
        let mut i = start;
        let bytes = self.bytes;

        if i < bytes.len() && bytes[i] == b'-' {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'0' {
            i += 1;
        } else if i < bytes.len() && bytes[i].is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        // ^ if neither branch consumed a digit (lone '-'), i stays at start+? —
        // handled below by detecting an empty valid number.
        let int_end = i;

        if i < bytes.len() && bytes[i] == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit() {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
        let frac_end = i;

        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j = i + 1;
            if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                j += 1;
            }
            if j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_digit() {
                    j += 1;
                }
                i = j;
            }
        }
        let valid_end = i;

        // Extend through any further number-like characters to find the
        // full extent of a malformed run, e.g. the second '.' in
        // "123.456.789".
        let mut run_end = valid_end;
        while run_end < bytes.len()
            && (bytes[run_end].is_ascii_digit()
                || matches!(bytes[run_end], b'.' | b'e' | b'E' | b'+' | b'-'))
        {
            run_end += 1;
        }

        let _ = frac_end;
        let has_int_digits = int_end > start && bytes[start..int_end].iter().any(|b| b.is_ascii_digit());
        let well_formed = has_int_digits && valid_end == run_end;

        if well_formed {
            self.pos = valid_end;
            return Ok(Some(Token {
                kind: TokenKind::Number,
                start,
                end: valid_end,
                nesting_depth: depth,
                repaired: None,
            }));
        }

        let fault_offset = if has_int_digits { valid_end } else { start };
        let pos = self.position_at(fault_offset);
        let action = handler.handle(ErrorKind::MalformedNumber, pos);
        self.pos = run_end.max(fault_offset + 1);
        let repaired = match action {
            RecoveryAction::Repair(bytes) => Some(bytes),
            RecoveryAction::Abort => return Err(Error::Invalid(crate::error::ErrorContext::new(
                ErrorKind::MalformedNumber,
                pos,
            ))),
            RecoveryAction::Skip(_) | RecoveryAction::Continue => None,
        };

        Ok(Some(Token {
            kind: TokenKind::Number,
            start,
            end: self.pos,
            nesting_depth: depth,
            repaired,
        }))
    }

    fn lex_literal(&mut self, handler: &mut ErrorHandler, depth: usize) -> Result<Option<Token>, Error> {
        const LITERALS: [(&[u8], TokenKind); 3] = [
            (b"true", TokenKind::True),
            (b"false", TokenKind::False),
            (b"null", TokenKind::Null),
        ];
        let start = self.pos;
        for (word, kind) in LITERALS {
            if self.bytes[start..].starts_with(word) {
                self.pos = start + word.len();
                return Ok(Some(Token {
                    kind,
                    start,
                    end: self.pos,
                    nesting_depth: depth,
                    repaired: None,
                }));
            }
        }

        let mut end = start;
        while end < self.bytes.len() && self.bytes[end].is_ascii_alphabetic() {
            end += 1;
        }
        let pos = self.position_at(start);
        let action = handler.handle(ErrorKind::MisspelledLiteral, pos);
        self.pos = end.max(start + 1);
        let repaired = match action {
            RecoveryAction::Repair(bytes) => Some(bytes),
            RecoveryAction::Abort => {
                return Err(Error::Invalid(crate::error::ErrorContext::new(
                    ErrorKind::MisspelledLiteral,
                    pos,
                )))
            }
            _ => None,
        };
        Ok(Some(Token {
            kind: TokenKind::Null,
            start,
            end: self.pos,
            nesting_depth: depth,
            repaired,
        }))
    }

    fn apply_nonfatal(&mut self, action: RecoveryAction) -> Result<(), Error> {
        match action {
            RecoveryAction::Abort => Err(Error::Resource("aborted by error handler".into())),
            RecoveryAction::Skip(n) => {
                self.pos += n;
                Ok(())
            }
            RecoveryAction::Continue | RecoveryAction::Repair(_) => Ok(()),
        }
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Drains a [`TokenStream`] to completion, returning every token produced.
pub fn tokenize_all(bytes: &[u8], max_depth: usize, handler: &mut ErrorHandler) -> Result<Vec<Token>, Error> {
    let mut stream = TokenStream::new(bytes, max_depth);
    while stream.next_token(handler)?.is_some() {}
    Ok(stream.produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorHandler, Strategy, SEVERITY_WARNING};

    fn tokens_of(input: &[u8]) -> Vec<Token> {
        let mut handler = ErrorHandler::new(Strategy::Abort, 100, SEVERITY_WARNING);
        tokenize_all(input, DEFAULT_MAX_DEPTH, &mut handler).expect("tokenize")
    }

    #[test]
    fn flat_object_reclassifies_keys() {
        let toks = tokens_of(br#"{"hello":"world"}"#);
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::ObjectStart,
                TokenKind::Key,
                TokenKind::Colon,
                TokenKind::String,
                TokenKind::ObjectEnd,
            ]
        );
    }

    #[test]
    fn array_elements_stay_strings_even_before_colon_shaped_content() {
        let toks = tokens_of(br#"[1,2,3]"#);
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::ArrayStart,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::Comma,
                TokenKind::Number,
                TokenKind::ArrayEnd,
            ]
        );
    }

    #[test]
    fn number_grammar_accepts_exponent_and_fraction() {
        let toks = tokens_of(br#"[1.0e2, -3, 0.5]"#);
        assert!(toks.iter().all(|t| t.repaired.is_none()));
    }

    #[test]
    fn malformed_number_repairs_to_zero_with_fault_at_second_dot() {
        let mut handler = ErrorHandler::new(crate::error::Strategy::BestEffort, 10, SEVERITY_WARNING);
        let toks = tokenize_all(br#"{"x":123.456.789}"#, DEFAULT_MAX_DEPTH, &mut handler).unwrap();
        let number = toks.iter().find(|t| t.kind == TokenKind::Number).unwrap();
        assert_eq!(number.repaired.as_deref(), Some(&b"0"[..]));
        let report = handler.accumulator().report();
        assert_eq!(report.by_kind.get("numeric").copied().unwrap_or(0), 1);
    }

    #[test]
    fn depth_tracks_nesting() {
        let toks = tokens_of(br#"{"a":[1,2]}"#);
        let array_start = toks.iter().find(|t| t.kind == TokenKind::ArrayStart).unwrap();
        assert_eq!(array_start.nesting_depth, 1);
    }

    #[test]
    fn depth_limit_is_enforced_under_best_effort_not_just_abort() {
        // Regression: the depth check used to push the context and emit a
        // token regardless of the recovery action, so under a non-Abort
        // strategy nesting kept growing past max_depth and the over-limit
        // bracket's byte got consumed twice. Capping at a tiny max_depth
        // must keep every later ArrayStart's nesting_depth at or below it.
        let max_depth = 3;
        let mut input = Vec::new();
        for _ in 0..10 {
            input.push(b'[');
        }
        for _ in 0..10 {
            input.push(b']');
        }
        let mut handler = ErrorHandler::new(Strategy::BestEffort, usize::MAX, SEVERITY_WARNING);
        let toks = tokenize_all(&input, max_depth, &mut handler).expect("tokenize");
        for t in &toks {
            assert!(
                t.nesting_depth <= max_depth,
                "nesting_depth {} exceeds max_depth {max_depth}",
                t.nesting_depth
            );
        }
        let report = handler.accumulator().report();
        assert!(report.by_kind.get("structural").copied().unwrap_or(0) > 0);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokens_of(b"").is_empty());
    }

    #[test]
    fn trailing_whitespace_is_silently_consumed() {
        let toks = tokens_of(b"true   \n\t");
        assert_eq!(toks.len(), 1);
    }

    #[test]
    fn token_round_trip_reconstructs_input_with_gaps_as_whitespace() {
        let input = br#"{ "a" : 1 }"#;
        let toks = tokens_of(input);
        let mut reconstructed = Vec::new();
        let mut cursor = 0;
        for t in &toks {
            reconstructed.extend_from_slice(&input[cursor..t.start]);
            reconstructed.extend_from_slice(t.payload(input));
            cursor = t.end;
        }
        reconstructed.extend_from_slice(&input[cursor..]);
        assert_eq!(reconstructed, input);
    }

    #[test]
    fn long_run_of_garbage_bytes_under_skip_and_continue_does_not_recurse() {
        // Regression: next_token used to recurse once per skipped byte,
        // so a long non-JSON run would blow the stack under a
        // skip-and-continue policy. It must now resolve iteratively.
        let mut input = vec![b'#'; 200_000];
        input.extend_from_slice(br#""ok""#);
        let mut handler = ErrorHandler::new(Strategy::SkipAndContinue, usize::MAX, SEVERITY_WARNING);
        let toks = tokenize_all(&input, DEFAULT_MAX_DEPTH, &mut handler).expect("tokenize");
        assert_eq!(toks.len(), 1);
        assert_eq!(toks[0].kind, TokenKind::String);
    }
}
