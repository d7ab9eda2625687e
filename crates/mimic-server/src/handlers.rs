//! HTTP handlers for configured routes.
//!
//! Handlers are not bound to fixed paths: the router attaches them to
//! whatever the route table materialized, passing the binding's route
//! index or method configuration alongside the extracted request parts.
//!
//! | Action | Success | Failure |
//! |--------|---------|---------|
//! | resolve | 200, body from the resolver | 500 (panic) |
//! | list | 200, collection (paginated when configured) | |
//! | read | 200, record | 404 |
//! | create | 201, created record | 400 body not an object |
//! | update | 200, merged record | 400, 404 |
//! | delete | 200, `{"success": true, "id": id}` | 404 |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use mimic_core::repository::Record;
use mimic_core::resolver::{self, PageRequest};
use mimic_types::{MethodConfig, PaginationSpec};
use serde_json::Value;

use crate::error::ServerError;
use crate::state::AppState;

/// Header carrying the pre-pagination item count.
pub static X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Pagination query parameters. Kept as raw strings so malformed values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<String>,
    /// Items per page.
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl PageQuery {
    /// Convert into a [`PageRequest`].
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref(), self.page_size.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Static and templated routes
// ---------------------------------------------------------------------------

/// Serve a static or templated response.
pub fn resolve(state: &AppState, method: &MethodConfig, query: &PageQuery) -> Response {
    let resolved = resolver::resolve(method, query.page_request(), state.expander.as_ref());
    respond(StatusCode::OK, resolved.body, resolved.total_count)
}

// ---------------------------------------------------------------------------
// CRUD collections
// ---------------------------------------------------------------------------

/// List a collection, paginated when the route enables it.
pub async fn list(
    state: Arc<AppState>,
    route: usize,
    pagination: Option<PaginationSpec>,
    query: PageQuery,
) -> Result<Response, ServerError> {
    let body = state.repository.lock().await.collection(route)?.to_value();
    Ok(match pagination {
        Some(spec) => {
            let page = resolver::paginate(body, &spec, query.page_request());
            respond(StatusCode::OK, page.body, page.total_count)
        }
        None => respond(StatusCode::OK, body, None),
    })
}

/// Read one record.
pub async fn read(
    state: Arc<AppState>,
    route: usize,
    params: Vec<(String, String)>,
) -> Result<Json<Record>, ServerError> {
    let id = record_id(&params)?;
    let repository = state.repository.lock().await;
    Ok(Json(repository.collection(route)?.get(id)?.clone()))
}

/// Append a record with a server-assigned id.
pub async fn create(
    state: Arc<AppState>,
    route: usize,
    body: Bytes,
) -> Result<(StatusCode, Json<Record>), ServerError> {
    let payload = object_body(&body)?;
    let record = state.repository.lock().await.create(route, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Shallow-merge the body onto an existing record.
pub async fn update(
    state: Arc<AppState>,
    route: usize,
    params: Vec<(String, String)>,
    body: Bytes,
) -> Result<Json<Record>, ServerError> {
    let id = record_id(&params)?;
    let payload = object_body(&body)?;
    let record = state
        .repository
        .lock()
        .await
        .update(route, id, payload)
        .await?;
    Ok(Json(record))
}

/// Remove a record.
pub async fn delete(
    state: Arc<AppState>,
    route: usize,
    params: Vec<(String, String)>,
) -> Result<Json<Value>, ServerError> {
    let id = record_id(&params)?;
    state.repository.lock().await.delete(route, id).await?;
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// JSON 404 for paths no binding matches.
pub async fn not_found(method: Method, uri: Uri) -> ServerError {
    ServerError::NotFound(format!("no route for {method} {}", uri.path()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn respond(status: StatusCode, body: Value, total_count: Option<u64>) -> Response {
    let mut response = (status, Json(body)).into_response();
    if let Some(total) = total_count {
        response
            .headers_mut()
            .insert(X_TOTAL_COUNT.clone(), HeaderValue::from(total));
    }
    response
}

/// The record id: the last path parameter, whatever name it was bound
/// under, as a positive decimal integer. Anything else cannot name a
/// record.
fn record_id(params: &[(String, String)]) -> Result<i64, ServerError> {
    let raw = params.last().map_or("", |(_, value)| value.as_str());
    Some(raw)
        .filter(|r| !r.is_empty() && r.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|r| r.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::NotFound(format!("record {raw} not found")))
}

fn object_body(body: &Bytes) -> Result<Record, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Record::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(ServerError::InvalidBody(
            "expected a JSON object".to_owned(),
        )),
        Err(e) => Err(ServerError::InvalidBody(e.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn record_id_requires_integer() {
        assert_eq!(record_id(&params(&[("id", "42")])).unwrap(), 42);
        assert!(matches!(
            record_id(&params(&[("id", "abc")])),
            Err(ServerError::NotFound(_))
        ));
        assert!(record_id(&[]).is_err());
    }

    #[test]
    fn record_id_must_be_positive() {
        for raw in ["0", "-3", "+3", " 3", "3.0", "99999999999999999999"] {
            assert!(
                matches!(record_id(&params(&[("id", raw)])), Err(ServerError::NotFound(_))),
                "{raw} should not name a record"
            );
        }
    }

    #[test]
    fn record_id_reads_last_parameter_by_position() {
        let pairs = params(&[("orgId", "7"), ("userId", "12")]);
        assert_eq!(record_id(&pairs).unwrap(), 12);
    }

    #[test]
    fn object_body_shapes() {
        assert!(object_body(&Bytes::from_static(b"")).unwrap().is_empty());
        assert_eq!(
            object_body(&Bytes::from_static(br#"{"a":1}"#)).unwrap()["a"],
            1
        );
        assert!(matches!(
            object_body(&Bytes::from_static(b"[1]")),
            Err(ServerError::InvalidBody(_))
        ));
        assert!(object_body(&Bytes::from_static(b"{oops")).is_err());
    }

    #[test]
    fn page_query_converts() {
        let query = PageQuery {
            page: Some("2".to_owned()),
            page_size: Some("x".to_owned()),
        };
        assert_eq!(
            query.page_request(),
            PageRequest {
                page: Some(2),
                page_size: None
            }
        );
    }
}
