//! Built-in random value generators invoked by `@name(args)` placeholders.
//!
//! Generator names are matched case-insensitively. Date-like generators
//! accept either `strftime` formats or the `yyyy-MM-dd HH:mm:ss` token
//! style common in mock templates.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Number, Value};

use crate::error::TemplateError;

/// Largest integer that survives a round trip through a JSON double.
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Upper bound for random timestamps (2030-01-01T00:00:00Z).
const MAX_TIMESTAMP: i64 = 1_893_456_000;

const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()[]";

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda", "William",
    "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Charles", "Karen", "Daniel", "Nancy", "Matthew", "Lisa", "Anthony", "Betty",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor",
    "Moore", "Jackson", "Martin", "Lee", "Thompson", "White", "Harris",
];

const CITIES: &[&str] = &[
    "Amsterdam", "Berlin", "Chicago", "Dublin", "Edinburgh", "Florence", "Geneva", "Helsinki",
    "Istanbul", "Jakarta", "Kyoto", "Lisbon", "Montreal", "Nairobi", "Oslo", "Prague", "Quito",
    "Seoul", "Toronto", "Vienna",
];

const TLDS: &[&str] = &["com", "net", "org", "io", "dev", "edu"];

/// A generated scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Generated {
    /// Text value.
    Text(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
}

impl Generated {
    /// Convert into a native JSON value.
    pub fn into_value(self) -> Value {
        match self {
            Self::Text(s) => Value::String(s),
            Self::Int(n) => Value::from(n),
            Self::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            Self::Bool(b) => Value::Bool(b),
        }
    }

    /// Render as text for interpolation into a larger string.
    pub fn render(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Run the generator `name` with `args`.
///
/// # Errors
///
/// Returns [`TemplateError::UnknownGenerator`] for an unrecognized name
/// and [`TemplateError::InvalidArgument`] for unusable arguments.
pub fn generate<R: Rng + ?Sized>(
    name: &str,
    args: &[String],
    rng: &mut R,
) -> Result<Generated, TemplateError> {
    let lower = name.to_ascii_lowercase();
    let a = Args {
        generator: name,
        values: args,
    };

    let out = match lower.as_str() {
        "boolean" | "bool" => Generated::Bool(rng.random_bool(0.5)),
        "natural" => {
            let min = a.int(0, 0)?.max(0);
            let max = a.int(1, MAX_SAFE_INTEGER)?.max(0);
            Generated::Int(int_between(rng, min, max))
        }
        "integer" | "int" => {
            let min = a.int(0, -MAX_SAFE_INTEGER)?;
            let max = a.int(1, MAX_SAFE_INTEGER)?;
            Generated::Int(int_between(rng, min, max))
        }
        "float" => {
            let min = a.int(0, 0)?;
            let max = a.int(1, 10_000)?;
            let dmin = a.count(2, 0)?;
            let dmax = a.count(3, 3)?;
            Generated::Float(float_between(rng, min, max, dmin, dmax))
        }
        "character" | "char" => {
            let pool = a.values.first().map_or_else(|| pool_for("lower"), |p| pool_for(p));
            Generated::Text(random_chars(rng, &pool, 1))
        }
        "string" | "str" => Generated::Text(string(rng, &a)?),
        "date" => Generated::Text(random_moment(rng, &a, "%Y-%m-%d")?),
        "time" => Generated::Text(random_moment(rng, &a, "%H:%M:%S")?),
        "datetime" => Generated::Text(random_moment(rng, &a, "%Y-%m-%d %H:%M:%S")?),
        "now" => {
            let format = a.format("%Y-%m-%d %H:%M:%S")?;
            Generated::Text(Utc::now().format(&format).to_string())
        }
        "image" | "img" => Generated::Text(image(&a)),
        "color" => Generated::Text(format!("#{:06x}", rng.random_range(0..=0x00FF_FFFF_u32))),
        "word" => {
            let len = a.span(3, 10)?.sample(rng);
            Generated::Text(random_chars(rng, &pool_for("lower"), len))
        }
        "sentence" => {
            let words = a.span(12, 18)?.sample(rng);
            Generated::Text(sentence(rng, words))
        }
        "paragraph" => {
            let count = a.span(3, 7)?.sample(rng);
            let sentences: Vec<String> = (0..count)
                .map(|_| {
                    let words = rng.random_range(12..=18);
                    sentence(rng, words)
                })
                .collect();
            Generated::Text(sentences.join(" "))
        }
        "title" => {
            let count = a.span(3, 7)?.sample(rng);
            let words: Vec<String> = (0..count).map(|_| capitalize(&word(rng))).collect();
            Generated::Text(words.join(" "))
        }
        "first" => Generated::Text(pick_str(rng, FIRST_NAMES).to_owned()),
        "last" => Generated::Text(pick_str(rng, LAST_NAMES).to_owned()),
        "name" => Generated::Text(format!(
            "{} {}",
            pick_str(rng, FIRST_NAMES),
            pick_str(rng, LAST_NAMES)
        )),
        "email" => Generated::Text(format!("{}@{}", word(rng), domain(rng))),
        "domain" => Generated::Text(domain(rng)),
        "url" => Generated::Text(format!("http://{}/{}", domain(rng), word(rng))),
        "ip" => {
            let [o1, o2, o3, o4]: [u8; 4] = rng.random();
            Generated::Text(format!("{o1}.{o2}.{o3}.{o4}"))
        }
        "guid" | "uuid" => Generated::Text(uuid::Uuid::new_v4().to_string()),
        "id" => Generated::Text(random_chars(rng, &pool_for("number"), 18)),
        "city" => Generated::Text(pick_str(rng, CITIES).to_owned()),
        "zip" => Generated::Text(random_chars(rng, &pool_for("number"), 6)),
        "pick" => {
            let choice = a.values.choose(rng).ok_or_else(|| TemplateError::InvalidArgument {
                generator: name.to_owned(),
                argument: String::new(),
                reason: "needs at least one choice".to_owned(),
            })?;
            choice.parse::<i64>().map_or_else(
                |_| Generated::Text(choice.clone()),
                Generated::Int,
            )
        }
        _ => {
            return Err(TemplateError::UnknownGenerator {
                name: name.to_owned(),
            });
        }
    };

    Ok(out)
}

// ---------------------------------------------------------------------------
// Argument access
// ---------------------------------------------------------------------------

struct Args<'a> {
    generator: &'a str,
    values: &'a [String],
}

impl Args<'_> {
    fn invalid(&self, argument: &str, reason: &str) -> TemplateError {
        TemplateError::InvalidArgument {
            generator: self.generator.to_owned(),
            argument: argument.to_owned(),
            reason: reason.to_owned(),
        }
    }

    fn int(&self, idx: usize, default: i64) -> Result<i64, TemplateError> {
        match self.values.get(idx) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .ok()
                .ok_or_else(|| self.invalid(raw, "expected an integer")),
        }
    }

    fn count(&self, idx: usize, default: usize) -> Result<usize, TemplateError> {
        match self.values.get(idx) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .ok()
                .ok_or_else(|| self.invalid(raw, "expected a non-negative integer")),
        }
    }

    /// `()` → default range, `(n)` → exactly `n`, `(min, max)` → range.
    fn span(&self, default_min: usize, default_max: usize) -> Result<Counts, TemplateError> {
        match self.values.len() {
            0 => Ok(Counts::new(default_min, default_max)),
            1 => {
                let n = self.count(0, default_min)?;
                Ok(Counts::new(n, n))
            }
            _ => Ok(Counts::new(self.count(0, default_min)?, self.count(1, default_max)?)),
        }
    }

    fn format(&self, default: &str) -> Result<String, TemplateError> {
        let format = self
            .values
            .first()
            .map_or_else(|| default.to_owned(), |f| translate_format(f));
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Err(self.invalid(&format, "not a valid date format"));
        }
        Ok(format)
    }
}

#[derive(Debug, Clone, Copy)]
struct Counts {
    min: usize,
    max: usize,
}

impl Counts {
    fn new(a: usize, b: usize) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> usize {
        rng.random_range(self.min..=self.max)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn int_between<R: Rng + ?Sized>(rng: &mut R, a: i64, b: i64) -> i64 {
    rng.random_range(a.min(b)..=a.max(b))
}

fn float_between<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64, dmin: usize, dmax: usize) -> f64 {
    let whole = int_between(rng, min, max);
    let places = rng.random_range(dmin.min(dmax)..=dmin.max(dmax)).min(10);
    if places == 0 {
        return whole.to_string().parse().unwrap_or_default();
    }
    let mut digits = random_chars(rng, &pool_for("number"), places);
    // A trailing zero would be dropped by the float round trip.
    if digits.ends_with('0') {
        digits.pop();
        digits.push(char::from(b'1'.saturating_add(rng.random_range(0..9_u8))));
    }
    format!("{whole}.{digits}").parse().unwrap_or_default()
}

fn pool_for(name: &str) -> Vec<char> {
    let pool = match name {
        "lower" => LOWER.to_owned(),
        "upper" => UPPER.to_owned(),
        "number" => DIGITS.to_owned(),
        "symbol" => SYMBOLS.to_owned(),
        "alpha" => format!("{LOWER}{UPPER}"),
        other => other.to_owned(),
    };
    pool.chars().collect()
}

fn random_chars<R: Rng + ?Sized>(rng: &mut R, pool: &[char], len: usize) -> String {
    (0..len).filter_map(|_| pool.choose(rng)).collect()
}

fn string<R: Rng + ?Sized>(rng: &mut R, a: &Args<'_>) -> Result<String, TemplateError> {
    // A leading non-numeric argument names the pool.
    let pool_given = a.values.first().is_some_and(|v| v.parse::<usize>().is_err());
    let (pool, rest) = if pool_given {
        let pool = a.values.first().map_or_else(|| pool_for("lower"), |p| pool_for(p));
        (pool, a.values.get(1..).unwrap_or_default())
    } else {
        (pool_for("lower"), a.values)
    };
    if pool.is_empty() {
        return Err(a.invalid("", "character pool is empty"));
    }
    let len = Args {
        generator: a.generator,
        values: rest,
    }
    .span(3, 7)?
    .sample(rng);
    Ok(random_chars(rng, &pool, len))
}

fn random_moment<R: Rng + ?Sized>(
    rng: &mut R,
    a: &Args<'_>,
    default: &str,
) -> Result<String, TemplateError> {
    let format = a.format(default)?;
    let secs = rng.random_range(0..=MAX_TIMESTAMP);
    let moment: DateTime<Utc> = DateTime::from_timestamp(secs, 0).unwrap_or_default();
    Ok(moment.format(&format).to_string())
}

/// Map `yyyy-MM-dd HH:mm:ss` tokens onto `strftime` specifiers.
fn translate_format(format: &str) -> String {
    if format.contains('%') {
        return format.to_owned();
    }
    [
        ("yyyy", "%Y"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
    ]
    .iter()
    .fold(format.to_owned(), |acc, (token, spec)| acc.replace(token, spec))
}

fn image(a: &Args<'_>) -> String {
    let size = a.values.first().map_or("200x200", String::as_str);
    let mut url = format!("https://dummyimage.com/{size}");
    if let Some(background) = a.values.get(1) {
        url.push('/');
        url.push_str(background.trim_start_matches('#'));
    }
    if let Some(foreground) = a.values.get(2) {
        url.push('/');
        url.push_str(foreground.trim_start_matches('#'));
    }
    if let Some(extension) = a.values.get(3) {
        url.push('.');
        url.push_str(extension);
    }
    if let Some(text) = a.values.get(4) {
        url.push_str("&text=");
        url.push_str(text);
    }
    url
}

fn pick_str<R: Rng + ?Sized>(rng: &mut R, pool: &'static [&'static str]) -> &'static str {
    pool.choose(rng).copied().unwrap_or_default()
}

fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(3..=10);
    random_chars(rng, &pool_for("lower"), len)
}

fn sentence<R: Rng + ?Sized>(rng: &mut R, words: usize) -> String {
    let body: Vec<String> = (0..words).map(|_| word(rng)).collect();
    format!("{}.", capitalize(&body.join(" ")))
}

fn domain<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}.{}", word(rng), pick_str(rng, TLDS))
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn run(name: &str, args: &[&str]) -> Result<Generated, TemplateError> {
        let args: Vec<String> = args.iter().map(|a| (*a).to_owned()).collect();
        generate(name, &args, &mut rand::rng())
    }

    #[test]
    fn integer_respects_bounds() {
        for _ in 0..100 {
            let Generated::Int(n) = run("integer", &["1000", "1000000"]).unwrap() else {
                panic!("expected an integer");
            };
            assert!((1000..=1_000_000).contains(&n));
        }
    }

    #[test]
    fn names_are_case_insensitive() {
        assert!(matches!(run("NAME", &[]).unwrap(), Generated::Text(_)));
        assert!(matches!(run("Boolean", &[]).unwrap(), Generated::Bool(_)));
    }

    #[test]
    fn full_name_has_two_parts() {
        let Generated::Text(name) = run("name", &[]).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(name.split(' ').count(), 2);
    }

    #[test]
    fn string_length_forms() {
        let Generated::Text(s) = run("string", &["10"]).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(s.chars().count(), 10);

        let Generated::Text(s) = run("string", &["number", "4"]).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(s.len(), 4);
        assert!(s.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn image_builds_placeholder_url() {
        let Generated::Text(url) = run("image", &["200x200"]).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(url, "https://dummyimage.com/200x200");
    }

    #[test]
    fn date_accepts_token_format() {
        let Generated::Text(date) = run("date", &["yyyy-MM-dd"]).unwrap() else {
            panic!("expected text");
        };
        assert_eq!(date.len(), 10);
        assert_eq!(date.chars().filter(|c| *c == '-').count(), 2);
    }

    #[test]
    fn float_has_requested_places() {
        let Generated::Float(f) = run("float", &["1", "10", "2", "2"]).unwrap() else {
            panic!("expected float");
        };
        assert!((1.0..11.0).contains(&f));
        let rendered = f.to_string();
        assert_eq!(rendered.split('.').nth(1).map(str::len), Some(2));
    }

    #[test]
    fn pick_parses_numbers() {
        assert_eq!(run("pick", &["7"]).unwrap(), Generated::Int(7));
        assert_eq!(
            run("pick", &["red"]).unwrap(),
            Generated::Text("red".to_owned())
        );
        assert!(run("pick", &[]).is_err());
    }

    #[test]
    fn guid_is_a_uuid() {
        let Generated::Text(id) = run("guid", &[]).unwrap() else {
            panic!("expected text");
        };
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn unknown_generator_is_typed_error() {
        assert_eq!(
            run("nonsense", &[]).unwrap_err(),
            TemplateError::UnknownGenerator {
                name: "nonsense".to_owned()
            }
        );
    }

    #[test]
    fn bad_argument_is_typed_error() {
        assert!(matches!(
            run("integer", &["one"]).unwrap_err(),
            TemplateError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn float_renders_into_value() {
        assert_eq!(Generated::Float(1.5).into_value(), serde_json::json!(1.5));
        assert_eq!(Generated::Float(f64::NAN).into_value(), Value::Null);
    }
}
