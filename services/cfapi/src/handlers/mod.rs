//! HTTP request handlers for the query service.

pub mod health;
pub mod legacy;
pub mod login;
pub mod query;
pub mod root;

use axum::{response::IntoResponse, response::Response, Json};
use serde_json::Value;

use crate::error::ApiResult;
use crate::metrics::record_request;

/// Turn a handler result into a response and count it.
pub(crate) fn respond(route: &'static str, result: ApiResult<Value>) -> Response {
    let response = match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    };
    record_request(route, response.status());
    response
}
