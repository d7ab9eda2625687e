//! The default template expander.
//!
//! [`MockEngine`] walks a JSON template and produces a fresh value of the
//! same structure. Each item of a repetition carries its position as the
//! *index* used by `+step` increment rules, so `{"id|+1": 1}` repeated
//! three times yields ids `1`, `2` and `3`.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Map, Value};

use crate::error::TemplateError;
use crate::generators::generate;
use crate::placeholder::{Segment, scan};
use crate::rule::{Rule, Span, split_key};
use crate::{Expansion, Repeat, TemplateExpander};

/// Template expander backed by the thread-local random generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockEngine;

impl MockEngine {
    /// Create a new engine.
    pub const fn new() -> Self {
        Self
    }
}

impl TemplateExpander for MockEngine {
    fn expand(&self, template: &Value, repeat: Repeat) -> Result<Expansion, TemplateError> {
        let mut rng = rand::rng();
        match repeat {
            Repeat::Once => expand_value(template, 0, &mut rng).map(Expansion::Single),
            Repeat::Times(n) => (0..n)
                .map(|index| expand_value(template, index, &mut rng))
                .collect::<Result<Vec<_>, _>>()
                .map(Expansion::Sequence),
        }
    }
}

fn expand_value<R: Rng + ?Sized>(
    value: &Value,
    index: usize,
    rng: &mut R,
) -> Result<Value, TemplateError> {
    match value {
        Value::String(s) => expand_string(s, rng),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| expand_value(item, i, rng))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => expand_object(map, index, rng).map(Value::Object),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(value.clone()),
    }
}

fn expand_object<R: Rng + ?Sized>(
    map: &Map<String, Value>,
    index: usize,
    rng: &mut R,
) -> Result<Map<String, Value>, TemplateError> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let (name, rule) = split_key(key)?;
        let produced = match rule {
            None => expand_value(value, index, rng)?,
            Some(rule) => apply_rule(rule, value, index, rng)?,
        };
        out.insert(name.to_owned(), produced);
    }
    Ok(out)
}

/// A single placeholder keeps its native type; anything else is text.
fn expand_string<R: Rng + ?Sized>(input: &str, rng: &mut R) -> Result<Value, TemplateError> {
    let segments = scan(input)?;
    if let [Segment::Call(call)] = segments.as_slice() {
        return generate(&call.name, &call.args, rng).map(|g| g.into_value());
    }

    let mut out = String::with_capacity(input.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(&text),
            Segment::Call(call) => out.push_str(&generate(&call.name, &call.args, rng)?.render()),
        }
    }
    Ok(Value::String(out))
}

fn apply_rule<R: Rng + ?Sized>(
    rule: Rule,
    value: &Value,
    index: usize,
    rng: &mut R,
) -> Result<Value, TemplateError> {
    match (rule, value) {
        (Rule::Increment(step), Value::Number(base)) => Ok(increment(base, step, index)),
        (Rule::Increment(step), Value::Array(items)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let position = index_as_i64(index).saturating_mul(step).rem_euclid(len.max(1));
            let picked = usize::try_from(position).ok().and_then(|p| items.get(p));
            picked.map_or(Ok(Value::Null), |item| expand_value(item, index, rng))
        }
        (Rule::Increment(_), other) => expand_value(other, index, rng),

        (Rule::Count { span, decimals }, Value::Number(_)) => {
            let whole = span.sample(rng);
            Ok(match decimals {
                None => Value::from(whole),
                Some(places) => decimal(whole, places, rng),
            })
        }
        (Rule::Count { span, .. }, Value::String(s)) => {
            let times = span.sample(rng);
            let mut out = String::new();
            for _ in 0..times {
                match expand_string(s, rng)? {
                    Value::String(piece) => out.push_str(&piece),
                    other => out.push_str(&other.to_string()),
                }
            }
            Ok(Value::String(out))
        }
        (Rule::Count { span, .. }, Value::Bool(keep)) => {
            let probability = if span.min == span.max || span.min.saturating_add(span.max) == 0 {
                0.5
            } else {
                ratio(span.min, span.min.saturating_add(span.max))
            };
            let flip = !rng.random_bool(probability);
            Ok(Value::Bool(*keep ^ flip))
        }
        (Rule::Count { span, .. }, Value::Array(items)) => {
            if items.is_empty() {
                return Ok(Value::Array(Vec::new()));
            }
            if span == Span::exactly(1) {
                let Some(picked) = items.choose(rng) else {
                    return Ok(Value::Null);
                };
                return expand_value(picked, index, rng);
            }
            let times = usize::try_from(span.sample(rng)).unwrap_or(usize::MAX);
            let mut out = Vec::with_capacity(items.len().saturating_mul(times));
            for round in 0..times {
                for (offset, item) in items.iter().enumerate() {
                    let position = round.saturating_mul(items.len()).saturating_add(offset);
                    out.push(expand_value(item, position, rng)?);
                }
            }
            Ok(Value::Array(out))
        }
        (Rule::Count { span, .. }, Value::Object(map)) => {
            let wanted = usize::try_from(span.sample(rng)).unwrap_or(usize::MAX);
            let keys: Vec<&String> = map.keys().collect();
            let chosen: Vec<&String> = keys
                .choose_multiple(rng, wanted.min(keys.len()))
                .copied()
                .collect();
            let subset: Map<String, Value> = map
                .iter()
                .filter(|(k, _)| chosen.contains(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            expand_object(&subset, index, rng).map(Value::Object)
        }
        (Rule::Count { .. }, Value::Null) => Ok(Value::Null),
    }
}

fn index_as_i64(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}

fn increment(base: &serde_json::Number, step: i64, index: usize) -> Value {
    let offset = step.saturating_mul(index_as_i64(index));
    if let Some(n) = base.as_i64() {
        return Value::from(n.saturating_add(offset));
    }
    base.as_f64().map_or(Value::Null, |f| {
        let stepped = offset.to_string().parse::<f64>().unwrap_or_default() + f;
        serde_json::Number::from_f64(stepped).map_or(Value::Null, Value::Number)
    })
}

fn decimal<R: Rng + ?Sized>(whole: u64, places: Span, rng: &mut R) -> Value {
    let places = usize::try_from(places.sample(rng)).unwrap_or(0).min(10);
    let mut digits: String = (0..places)
        .map(|_| char::from(b'0'.saturating_add(rng.random_range(0..10_u8))))
        .collect();
    // Keep the requested precision visible after the float round trip.
    if digits.ends_with('0') {
        digits.pop();
        digits.push('1');
    }
    let text = if digits.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{digits}")
    };
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

fn ratio(part: u64, whole: u64) -> f64 {
    let p = part.to_string().parse::<f64>().unwrap_or_default();
    let w = whole.to_string().parse::<f64>().unwrap_or(1.0);
    (p / w).clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn expand(template: &Value, repeat: Repeat) -> Value {
        MockEngine::new().expand(template, repeat).unwrap().into_value()
    }

    #[test]
    fn repeat_produces_exact_count_with_increment() {
        let template = json!({ "id|+1": 1, "name": "@name" });
        let out = expand(&template, Repeat::Times(3));

        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 3);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item["id"], json!(i + 1));
            assert!(item["name"].is_string());
            assert!(item.get("id|+1").is_none());
        }
    }

    #[test]
    fn once_yields_single_object() {
        let out = expand(&json!({ "ok": true }), Repeat::Once);
        assert_eq!(out, json!({ "ok": true }));
    }

    #[test]
    fn zero_repeat_is_empty_sequence() {
        let out = MockEngine::new()
            .expand(&json!({ "a": 1 }), Repeat::Times(0))
            .unwrap();
        assert_eq!(out, Expansion::Sequence(Vec::new()));
    }

    #[test]
    fn single_placeholder_keeps_native_type() {
        let out = expand(&json!({ "size": "@integer(1000, 1000000)" }), Repeat::Once);
        let size = out["size"].as_i64().unwrap();
        assert!((1000..=1_000_000).contains(&size));
    }

    #[test]
    fn mixed_string_interpolates() {
        let out = expand(&json!("@string(10).jpg"), Repeat::Once);
        let name = out.as_str().unwrap();
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), 14);
    }

    #[test]
    fn nested_objects_expand() {
        let template = json!({
            "success": true,
            "data": { "url": "@image('200x200')", "filename": "@string(10).jpg" }
        });
        let out = expand(&template, Repeat::Once);
        assert_eq!(out["success"], true);
        assert!(out["data"]["url"].as_str().unwrap().contains("200x200"));
        assert!(out["data"]["filename"].is_string());
    }

    #[test]
    fn array_count_rule_repeats_contents() {
        let out = expand(&json!({ "list|3": [{ "n|+1": 10 }] }), Repeat::Once);
        assert_eq!(out["list"], json!([{ "n": 10 }, { "n": 11 }, { "n": 12 }]));
    }

    #[test]
    fn array_pick_one_rule() {
        let out = expand(&json!({ "color|1": ["red", "green"] }), Repeat::Once);
        let color = out["color"].as_str().unwrap();
        assert!(color == "red" || color == "green");
    }

    #[test]
    fn array_increment_rule_cycles() {
        let out = expand(&json!({ "c|+1": ["a", "b"] }), Repeat::Times(3));
        assert_eq!(out, json!([{ "c": "a" }, { "c": "b" }, { "c": "a" }]));
    }

    #[test]
    fn number_range_rule() {
        for _ in 0..50 {
            let out = expand(&json!({ "age|18-30": 0 }), Repeat::Once);
            let age = out["age"].as_u64().unwrap();
            assert!((18..=30).contains(&age));
        }
    }

    #[test]
    fn number_decimal_rule() {
        let out = expand(&json!({ "price|1-9.2": 0 }), Repeat::Once);
        let rendered = out["price"].to_string();
        assert_eq!(rendered.split('.').nth(1).map(str::len), Some(2));
    }

    #[test]
    fn string_count_rule_repeats() {
        let out = expand(&json!({ "stars|3": "*" }), Repeat::Once);
        assert_eq!(out["stars"], "***");
    }

    #[test]
    fn object_count_rule_picks_properties() {
        let out = expand(&json!({ "o|2": { "a": 1, "b": 2, "c": 3 } }), Repeat::Once);
        assert_eq!(out["o"].as_object().unwrap().len(), 2);
    }

    #[test]
    fn boolean_rule_yields_bool() {
        let out = expand(&json!({ "flag|1": true }), Repeat::Once);
        assert!(out["flag"].is_boolean());
    }

    #[test]
    fn unknown_generator_propagates() {
        let err = MockEngine::new()
            .expand(&json!({ "x": "@doesnotexist" }), Repeat::Once)
            .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownGenerator { .. }));
    }

    #[test]
    fn bad_rule_propagates() {
        let err = MockEngine::new()
            .expand(&json!({ "x|zz": 1 }), Repeat::Once)
            .unwrap_err();
        assert!(matches!(err, TemplateError::InvalidRule { .. }));
    }
}
