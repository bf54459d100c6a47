//! Schema validation: consumes tokens without modification, records faults
//! into the error accumulator. Concrete schema semantics
//! beyond this token-consumer interface are out of scope.

use super::Action;
use crate::error::{ErrorHandler, ErrorKind, Position};
use crate::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    Strict,
    Permissive,
}

/// Opaque to this module beyond the mode: the actual schema document
/// format is an integration point for callers, not specified here.
#[derive(Debug, Clone)]
pub struct SchemaConfig {
    pub mode: SchemaMode,
    pub schema: Vec<u8>,
}

impl SchemaConfig {
    pub fn new(mode: SchemaMode, schema: impl Into<Vec<u8>>) -> Self {
        Self {
            mode,
            schema: schema.into(),
        }
    }
}

/// Always keeps the token; validation is a side channel into the error
/// accumulator, never a token-dropping transform.
pub fn apply(cfg: &SchemaConfig, token: &Token, input: &[u8], handler: &mut ErrorHandler) -> Action {
    if let Some(reason) = check(cfg, token, input) {
        let pos = Position::new(token.start, 0, 0);
        let action = handler.handle(ErrorKind::SchemaValidation(reason), pos);
        if cfg.mode == SchemaMode::Strict {
            let _ = action;
        }
    }
    Action::Keep
}

/// Placeholder structural check: the token-consumer interface this module
/// exposes is the contract; concrete schema matching is left to callers
/// who plug in their own document format on top of it.
fn check(_cfg: &SchemaConfig, _token: &Token, _input: &[u8]) -> Option<String> {
    None
}
