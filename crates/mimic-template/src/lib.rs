//! Template expansion for synthetic mock data.
//!
//! A template is a JSON shape description. Object keys may carry a
//! generation rule (`"id|+1": 1`, `"tags|1-3": ["a", "b"]`) and strings
//! may embed generator placeholders (`"@name"`, `"@integer(1, 10)"`).
//! Expanding a template produces concrete JSON with the same structure
//! and fresh random values on every call.
//!
//! # Modules
//!
//! - [`engine`] -- [`MockEngine`], the default [`TemplateExpander`]
//! - [`rule`] -- Parsing of `name|rule` object keys
//! - [`placeholder`] -- Scanning of `@generator(args)` placeholders
//! - [`generators`] -- The built-in random value generators
//! - [`error`] -- [`TemplateError`]

pub mod engine;
pub mod error;
pub mod generators;
pub mod placeholder;
pub mod rule;

use serde_json::Value;

pub use engine::MockEngine;
pub use error::TemplateError;

/// How many items to produce from one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// A single expanded value.
    Once,
    /// An ordered sequence of exactly this many expanded values.
    Times(usize),
}

impl Repeat {
    /// Map a configured repeat count onto a [`Repeat`].
    ///
    /// Absent or `1` yields [`Repeat::Once`]; anything else (including
    /// `0`) yields a sequence of that length.
    pub fn from_count(count: Option<u64>) -> Self {
        match count {
            None | Some(1) => Self::Once,
            Some(n) => Self::Times(usize::try_from(n).unwrap_or(usize::MAX)),
        }
    }
}

/// Result of an expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// One expanded value.
    Single(Value),
    /// An ordered sequence of expanded values.
    Sequence(Vec<Value>),
}

impl Expansion {
    /// Collapse into a JSON value (sequences become arrays).
    pub fn into_value(self) -> Value {
        match self {
            Self::Single(value) => value,
            Self::Sequence(items) => Value::Array(items),
        }
    }
}

/// Turns a shape description into concrete data.
///
/// Implementations may be non-deterministic: two calls with the same
/// template are expected to agree on structure, not on values.
pub trait TemplateExpander: Send + Sync {
    /// Expand `template` according to `repeat`.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] when the template references an
    /// unknown generator, carries an unparsable rule, or passes invalid
    /// generator arguments.
    fn expand(&self, template: &Value, repeat: Repeat) -> Result<Expansion, TemplateError>;
}
