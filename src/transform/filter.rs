//! Field filter: include/exclude glob-style path matching.
//!
//! Patterns are `.`-separated segments; `*` matches exactly one segment,
//! `**` matches zero or more. Compiled once per pipeline, not per token.

use super::{Action, PathSegment};

#[derive(Debug, Clone)]
pub enum PatternSegment {
    Literal(String),
    Star,
    DoubleStar,
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    segments: Vec<PatternSegment>,
}

impl CompiledPattern {
    pub fn compile(pattern: &str) -> Self {
        let segments = pattern
            .split('.')
            .map(|seg| match seg {
                "*" => PatternSegment::Star,
                "**" => PatternSegment::DoubleStar,
                other => PatternSegment::Literal(other.to_string()),
            })
            .collect();
        Self { segments }
    }

    /// Does `path` match this pattern exactly (not as an ancestor prefix)?
    pub fn matches(&self, path: &[PathSegment]) -> bool {
        match_from(&self.segments, path)
    }

    /// Is `path` a strict prefix of some path this pattern could match —
    /// i.e. an ancestor that must survive an `include` filter so a
    /// matched descendant stays reachable in the output.
    pub fn is_ancestor_of_match(&self, path: &[PathSegment]) -> bool {
        if path.len() >= self.segments.len() {
            return false;
        }
        match_from(&self.segments[..path.len()], path)
    }
}

fn match_from(pattern: &[PatternSegment], path: &[PathSegment]) -> bool {
    match (pattern.first(), path.first()) {
        (None, None) => true,
        (None, Some(_)) => false,
        (Some(PatternSegment::DoubleStar), _) => {
            // ** matches zero or more segments: try consuming 0, 1, 2, ... of path.
            if match_from(&pattern[1..], path) {
                return true;
            }
            if path.is_empty() {
                return false;
            }
            match_from(pattern, &path[1..])
        }
        (Some(_), None) => false,
        (Some(PatternSegment::Star), Some(_)) => match_from(&pattern[1..], &path[1..]),
        (Some(PatternSegment::Literal(lit)), Some(seg)) => {
            let name_matches = match seg {
                PathSegment::Key(k) => k.as_ref() == lit.as_bytes(),
                PathSegment::Index(_) => false,
            };
            name_matches && match_from(&pattern[1..], &path[1..])
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    pub include: Vec<CompiledPattern>,
    pub exclude: Vec<CompiledPattern>,
}

impl FilterConfig {
    pub fn include(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            include: patterns.into_iter().map(|p| CompiledPattern::compile(&p)).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn exclude(patterns: impl IntoIterator<Item = String>) -> Self {
        Self {
            include: Vec::new(),
            exclude: patterns.into_iter().map(|p| CompiledPattern::compile(&p)).collect(),
        }
    }
}

/// Decide whether the token at `path` survives. `exclude` wins when both
/// include and exclude are configured (see DESIGN.md for the rationale).
pub fn apply(cfg: &FilterConfig, path: &[PathSegment]) -> Action {
    if cfg.exclude.iter().any(|p| p.matches(path) || path_is_descendant(p, path)) {
        return Action::Drop;
    }
    if cfg.include.is_empty() {
        return Action::Keep;
    }
    let survives = cfg
        .include
        .iter()
        .any(|p| p.matches(path) || p.is_ancestor_of_match(path) || path_is_descendant(p, path));
    if survives {
        Action::Keep
    } else {
        Action::Drop
    }
}

/// True if `path` is strictly below a pattern's own match point — excluding
/// a key also excludes every path nested under it.
fn path_is_descendant(pattern: &CompiledPattern, path: &[PathSegment]) -> bool {
    for cut in 0..path.len() {
        if pattern.matches(&path[..cut]) {
            return true;
        }
    }
    false
}
