//! Built-in transformations consumed by the pipeline.
//!
//! A closed variant set plus one custom branch carrying a function pointer
//! and opaque user data — deliberately not
//! open polymorphism (no `Box<dyn Transform>`) across the hot per-token loop.

pub mod custom;
pub mod filter;
pub mod minify;
pub mod validate;

use crate::error::ErrorHandler;
use crate::tokenizer::Token;

/// What a transformation does with one token as it passes through.
pub enum Action {
    /// Pass the token through unchanged.
    Keep,
    /// Drop the token (and whatever structural cleanup the caller applies).
    Drop,
    /// Replace the token's emitted payload.
    Rewrite(Vec<u8>),
}

/// One stage in the pipeline. `priority` determines execution order
/// (ascending, ties broken by insertion order).
pub struct Transformation {
    pub name: String,
    pub priority: i32,
    pub kind: TransformationKind,
}

pub enum TransformationKind {
    Minify,
    Filter(filter::FilterConfig),
    Validate(validate::SchemaConfig),
    Custom(custom::CustomTransform),
}

impl Transformation {
    pub fn minify(priority: i32) -> Self {
        Self {
            name: "minify".to_string(),
            priority,
            kind: TransformationKind::Minify,
        }
    }

    pub fn filter(priority: i32, config: filter::FilterConfig) -> Self {
        Self {
            name: "filter-fields".to_string(),
            priority,
            kind: TransformationKind::Filter(config),
        }
    }

    pub fn validate(priority: i32, config: validate::SchemaConfig) -> Self {
        Self {
            name: "validate-schema".to_string(),
            priority,
            kind: TransformationKind::Validate(config),
        }
    }

    pub fn custom(priority: i32, transform: custom::CustomTransform) -> Self {
        Self {
            name: transform.name.clone(),
            priority,
            kind: TransformationKind::Custom(transform),
        }
    }

    /// Apply this transformation to one token. `path` is the caller's
    /// current path stack (object keys / array indices), maintained once by
    /// the pipeline driver and shared read-only across every transformation
    /// stage rather than rebuilt per stage.
    pub fn apply(
        &mut self,
        token: &Token,
        input: &[u8],
        path: &[PathSegment],
        handler: &mut ErrorHandler,
    ) -> Action {
        match &mut self.kind {
            TransformationKind::Minify => minify::apply(token),
            TransformationKind::Filter(cfg) => filter::apply(cfg, path),
            TransformationKind::Validate(cfg) => validate::apply(cfg, token, input, handler),
            TransformationKind::Custom(t) => t.apply(token, input),
        }
    }
}

/// One element of a token's path: an object key (borrowed from the input
/// buffer) or an array index. Spec §9: "an indexed stack of segments, not
/// linked pointers; segments borrow key bytes from the input span."
#[derive(Debug, Clone, Copy)]
pub enum PathSegment<'a> {
    Key(&'a [u8]),
    Index(usize),
}
