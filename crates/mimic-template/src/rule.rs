//! Parsing of `name|rule` object keys.
//!
//! Supported rule forms:
//!
//! | Rule | Meaning |
//! |------|---------|
//! | `+step` | increment by `step` per repetition index |
//! | `count` | exactly `count` |
//! | `min-max` | a random count in `[min, max]` |
//! | `….dcount` / `….dmin-dmax` | decimal places for numbers |

use rand::Rng;

use crate::error::TemplateError;

/// An inclusive integer interval. A fixed count is `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Lower bound.
    pub min: u64,
    /// Upper bound.
    pub max: u64,
}

impl Span {
    /// A span containing only `n`.
    pub const fn exactly(n: u64) -> Self {
        Self { min: n, max: n }
    }

    /// Draw a value from the span.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u64 {
        if self.min == self.max {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.split_once('-') {
            Some((lo, hi)) => {
                let a = lo.trim().parse::<u64>().ok()?;
                let b = hi.trim().parse::<u64>().ok()?;
                Some(Self {
                    min: a.min(b),
                    max: a.max(b),
                })
            }
            None => text.trim().parse::<u64>().ok().map(Self::exactly),
        }
    }
}

/// A parsed key rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// `+step`: offset by `step` for each repetition index.
    Increment(i64),
    /// `count`, `min-max`, optionally with decimal places.
    Count {
        /// Integer part.
        span: Span,
        /// Decimal places, when the rule carries a `.` part.
        decimals: Option<Span>,
    },
}

/// Split an object key into its property name and optional rule.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidRule`] when the text after `|` is not
/// one of the supported forms.
pub fn split_key(key: &str) -> Result<(&str, Option<Rule>), TemplateError> {
    let Some((name, raw)) = key.split_once('|') else {
        return Ok((key, None));
    };

    let invalid = || TemplateError::InvalidRule {
        key: name.to_owned(),
        rule: raw.to_owned(),
    };

    if let Some(step) = raw.strip_prefix('+') {
        let step = step.trim().parse::<i64>().ok().ok_or_else(invalid)?;
        return Ok((name, Some(Rule::Increment(step))));
    }

    let (int_part, dec_part) = match raw.split_once('.') {
        Some((int_part, dec_part)) => (int_part, Some(dec_part)),
        None => (raw, None),
    };

    let span = Span::parse(int_part).ok_or_else(invalid)?;
    let decimals = dec_part
        .map(|d| Span::parse(d).ok_or_else(invalid))
        .transpose()?;

    Ok((name, Some(Rule::Count { span, decimals })))
}
