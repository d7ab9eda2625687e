//! Response resolution for templated and static routes.
//!
//! [`resolve`] picks the body for one route method (an expanded mock
//! template, else the static response) and then applies pagination.
//! Template failures never surface to the client: the resolver logs
//! them and falls back to the static response.

use std::ops::Range;

use mimic_template::{Repeat, TemplateExpander};
use mimic_types::{MethodConfig, PaginationSpec};
use serde_json::Value;
use tracing::warn;

/// Pagination parameters taken from the query string.
///
/// Values that are missing, non-numeric or `0` are treated as absent so
/// the configured defaults apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: Option<usize>,
    /// Items per page.
    pub page_size: Option<usize>,
}

impl PageRequest {
    /// Parse the raw `page` and `pageSize` query values.
    pub fn from_query(page: Option<&str>, page_size: Option<&str>) -> Self {
        Self {
            page: page.and_then(positive),
            page_size: page_size.and_then(positive),
        }
    }
}

fn positive(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

/// A resolved response.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    /// Response payload. `Null` when nothing could be resolved.
    pub body: Value,
    /// Value of the `X-Total-Count` header, present only when pagination
    /// is enabled.
    pub total_count: Option<u64>,
}

/// Resolve the response for `method`.
pub fn resolve(
    method: &MethodConfig,
    request: PageRequest,
    expander: &dyn TemplateExpander,
) -> Resolved {
    let body = materialize(method, expander);
    match method.active_pagination() {
        Some(spec) => paginate(body, spec, request),
        None => Resolved {
            body,
            total_count: None,
        },
    }
}

/// Produce the unpaginated body: the expanded mock when one is active,
/// else the static response.
pub fn materialize(method: &MethodConfig, expander: &dyn TemplateExpander) -> Value {
    let fallback = || method.static_response.clone().unwrap_or(Value::Null);

    let Some(mock) = method.active_mock() else {
        return fallback();
    };
    let Some(template) = &mock.template else {
        return fallback();
    };

    match expander.expand(template, Repeat::from_count(mock.repeat_count)) {
        Ok(expansion) => expansion.into_value(),
        Err(e) => {
            warn!(error = %e, "mock template expansion failed, using static response");
            fallback()
        }
    }
}

/// Slice a list body to the requested page.
///
/// Lists report their pre-slice length as the total; any other body is
/// returned unchanged with the configured `totalCount`.
pub fn paginate(body: Value, spec: &PaginationSpec, request: PageRequest) -> Resolved {
    match body {
        Value::Array(items) => {
            let total = u64::try_from(items.len()).unwrap_or(u64::MAX);
            let page = request.page.unwrap_or(1);
            let page_size = request.page_size.unwrap_or(spec.page_size);
            let bounds = page_bounds(items.len(), page, page_size);
            let slice = items
                .into_iter()
                .skip(bounds.start)
                .take(bounds.len())
                .collect();
            Resolved {
                body: Value::Array(slice),
                total_count: Some(total),
            }
        }
        other => Resolved {
            body: other,
            total_count: Some(spec.total_count),
        },
    }
}

/// The index range of `page` (1-based) within a list of `len` items,
/// clamped to the list. Out-of-range pages are empty.
pub fn page_bounds(len: usize, page: usize, page_size: usize) -> Range<usize> {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mimic_template::{Expansion, MockEngine, TemplateError};
    use mimic_types::MockSpec;
    use serde_json::json;

    use super::*;

    struct Failing;

    impl TemplateExpander for Failing {
        fn expand(&self, _: &Value, _: Repeat) -> Result<Expansion, TemplateError> {
            Err(TemplateError::UnknownGenerator {
                name: "boom".to_owned(),
            })
        }
    }

    fn mocked(repeat: Option<u64>, static_response: Option<Value>) -> MethodConfig {
        MethodConfig {
            static_response,
            mock: Some(MockSpec {
                enabled: true,
                repeat_count: repeat,
                template: Some(json!({ "id|+1": 1, "name": "@name" })),
            }),
            ..MethodConfig::default()
        }
    }

    fn paginated(page_size: usize, total_count: u64) -> PaginationSpec {
        PaginationSpec {
            enabled: true,
            page_size,
            total_count,
        }
    }

    #[test]
    fn static_response_is_verbatim() {
        let method = MethodConfig {
            static_response: Some(json!({ "ok": true })),
            ..MethodConfig::default()
        };
        let first = resolve(&method, PageRequest::default(), &MockEngine);
        let second = resolve(&method, PageRequest::default(), &MockEngine);
        assert_eq!(first.body, json!({ "ok": true }));
        assert_eq!(first, second);
        assert_eq!(first.total_count, None);
    }

    #[test]
    fn nothing_configured_is_null() {
        let resolved = resolve(&MethodConfig::default(), PageRequest::default(), &MockEngine);
        assert_eq!(resolved.body, Value::Null);
    }

    #[test]
    fn mock_repeat_count_yields_n_items() {
        let body = materialize(&mocked(Some(4), None), &MockEngine);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i["id"].is_i64() && i["name"].is_string()));
    }

    #[test]
    fn mock_without_repeat_is_single_object() {
        let body = materialize(&mocked(None, None), &MockEngine);
        assert!(body.is_object());
    }

    #[test]
    fn disabled_mock_uses_static_response() {
        let mut method = mocked(Some(3), Some(json!([1])));
        if let Some(mock) = method.mock.as_mut() {
            mock.enabled = false;
        }
        assert_eq!(materialize(&method, &MockEngine), json!([1]));
    }

    #[test]
    fn expansion_failure_falls_back() {
        let method = mocked(Some(2), Some(json!(["fallback"])));
        assert_eq!(materialize(&method, &Failing), json!(["fallback"]));
        assert_eq!(materialize(&mocked(Some(2), None), &Failing), Value::Null);
    }

    #[test]
    fn paginates_mock_scenario() {
        let mut method = mocked(Some(2), None);
        method.pagination = Some(paginated(1, 0));
        let request = PageRequest::from_query(Some("1"), Some("1"));

        let resolved = resolve(&method, request, &MockEngine);
        assert_eq!(resolved.body.as_array().unwrap().len(), 1);
        assert_eq!(resolved.total_count, Some(2));
    }

    #[test]
    fn page_sizes_follow_formula() {
        let items: Vec<Value> = (0..7).map(Value::from).collect();
        let spec = paginated(3, 0);
        for (page, expected) in [(1, 3), (2, 3), (3, 1), (4, 0), (100, 0)] {
            let request = PageRequest {
                page: Some(page),
                page_size: None,
            };
            let resolved = paginate(Value::Array(items.clone()), &spec, request);
            assert_eq!(resolved.body.as_array().unwrap().len(), expected, "page {page}");
            assert_eq!(resolved.total_count, Some(7));
        }
    }

    #[test]
    fn second_page_has_the_right_items() {
        let body = json!([1, 2, 3, 4, 5]);
        let request = PageRequest::from_query(Some("2"), Some("2"));
        let resolved = paginate(body, &paginated(10, 0), request);
        assert_eq!(resolved.body, json!([3, 4]));
    }

    #[test]
    fn bad_query_values_use_defaults() {
        assert_eq!(
            PageRequest::from_query(Some("abc"), Some("-2")),
            PageRequest::default()
        );
        assert_eq!(PageRequest::from_query(Some("0"), Some("0")), PageRequest::default());
        assert_eq!(
            PageRequest::from_query(Some(" 3 "), None),
            PageRequest {
                page: Some(3),
                page_size: None
            }
        );
    }

    #[test]
    fn non_list_body_reports_configured_total() {
        let resolved = paginate(json!({ "a": 1 }), &paginated(5, 42), PageRequest::default());
        assert_eq!(resolved.body, json!({ "a": 1 }));
        assert_eq!(resolved.total_count, Some(42));
    }

    #[test]
    fn page_bounds_never_overflow() {
        assert_eq!(page_bounds(10, usize::MAX, usize::MAX), 10..10);
        assert_eq!(page_bounds(0, 1, 5), 0..0);
        assert_eq!(page_bounds(5, 2, 2), 2..4);
    }
}
