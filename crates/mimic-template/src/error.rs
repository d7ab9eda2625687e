//! Error types for template expansion.

/// Errors raised while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A placeholder names a generator that does not exist.
    #[error("unknown generator `@{name}`")]
    UnknownGenerator {
        /// The generator name as written.
        name: String,
    },

    /// A generator received an argument it cannot use.
    #[error("invalid argument `{argument}` for `@{generator}`: {reason}")]
    InvalidArgument {
        /// The generator name.
        generator: String,
        /// The offending argument.
        argument: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An object key carries a rule that cannot be parsed.
    #[error("invalid rule `{rule}` on key `{key}`")]
    InvalidRule {
        /// The property name.
        key: String,
        /// The rule text after `|`.
        rule: String,
    },

    /// A placeholder is missing its closing parenthesis.
    #[error("unterminated placeholder in `{0}`")]
    Unterminated(String),
}
