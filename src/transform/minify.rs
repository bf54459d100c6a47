//! The identity transformation: structurally drops nothing.
//! The whitespace elimination itself happens on the sink-writer side, the
//! same rule [`crate::minify_core`] implements for ECO/SPORT/TURBO.

use super::Action;
use crate::tokenizer::Token;

pub fn apply(_token: &Token) -> Action {
    Action::Keep
}
