//! Scanning of `@generator` placeholders inside template strings.
//!
//! `"@name"`, `"@integer(1, 10)"` and `"@string(8).jpg"` are all valid.
//! A backslash before `@` (`\@`) produces a literal `@`. An `@` that is
//! not followed by an identifier is kept as text.

use crate::error::TemplateError;

/// A parsed generator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Generator name as written (matching is case-insensitive).
    pub name: String,
    /// Arguments with surrounding quotes removed.
    pub args: Vec<String>,
}

/// One piece of a scanned template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Text(String),
    /// A generator invocation.
    Call(Call),
}

/// Split `input` into literal text and generator calls.
///
/// # Errors
///
/// Returns [`TemplateError::Unterminated`] when an argument list has no
/// closing parenthesis.
pub fn scan(input: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find(['@', '\\']) {
        let (before, tail) = rest.split_at(pos);
        text.push_str(before);

        if let Some(after) = tail.strip_prefix("\\@") {
            text.push('@');
            rest = after;
            continue;
        }
        if let Some(after) = tail.strip_prefix('\\') {
            text.push('\\');
            rest = after;
            continue;
        }

        let after_at = tail.strip_prefix('@').unwrap_or(tail);
        let starts_ident = after_at
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if !starts_ident {
            text.push('@');
            rest = after_at;
            continue;
        }

        let ident_len = after_at
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after_at.len());
        let (name, after_name) = after_at.split_at(ident_len);

        let (args, remaining) = match after_name.strip_prefix('(') {
            Some(inner) => {
                let close = inner
                    .find(')')
                    .ok_or_else(|| TemplateError::Unterminated(input.to_owned()))?;
                let (arg_text, after_close) = inner.split_at(close);
                (
                    split_args(arg_text),
                    after_close.strip_prefix(')').unwrap_or(after_close),
                )
            }
            None => (Vec::new(), after_name),
        };

        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        segments.push(Segment::Call(Call {
            name: name.to_owned(),
            args,
        }));
        rest = remaining;
    }

    text.push_str(rest);
    if !text.is_empty() || segments.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

/// Split a raw argument list on commas outside quotes.
fn split_args(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => quote = Some(c),
                ',' => args.push(std::mem::take(&mut current).trim().to_owned()),
                _ => current.push(c),
            },
        }
    }
    args.push(current.trim().to_owned());
    args
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> Segment {
        Segment::Call(Call {
            name: name.to_owned(),
            args: args.iter().map(|a| (*a).to_owned()).collect(),
        })
    }

    #[test]
    fn plain_text_is_one_segment() {
        assert_eq!(
            scan("hello").unwrap(),
            vec![Segment::Text("hello".to_owned())]
        );
        assert_eq!(scan("").unwrap(), vec![Segment::Text(String::new())]);
    }

    #[test]
    fn bare_placeholder() {
        assert_eq!(scan("@name").unwrap(), vec![call("name", &[])]);
    }

    #[test]
    fn placeholder_with_arguments_and_suffix() {
        assert_eq!(
            scan("@string(10).jpg").unwrap(),
            vec![call("string", &["10"]), Segment::Text(".jpg".to_owned())]
        );
        assert_eq!(
            scan("@integer(1000, 1000000)").unwrap(),
            vec![call("integer", &["1000", "1000000"])]
        );
    }

    #[test]
    fn quoted_arguments_lose_their_quotes() {
        assert_eq!(
            scan("@image('200x200', \"#fff\")").unwrap(),
            vec![call("image", &["200x200", "#fff"])]
        );
    }

    #[test]
    fn escaped_and_stray_at_signs_are_text() {
        assert_eq!(
            scan("a\\@b and @ 1").unwrap(),
            vec![Segment::Text("a@b and @ 1".to_owned())]
        );
    }

    #[test]
    fn unterminated_arguments_fail() {
        assert!(matches!(
            scan("@integer(1, 2"),
            Err(TemplateError::Unterminated(_))
        ));
    }
}
