//! Basic-auth echo endpoint.
//!
//! Credentials are decoded and returned as-is; nothing is checked.

use axum::{
    http::{header, HeaderMap},
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

use super::respond;
use crate::error::{ApiError, ApiResult};

/// GET /login
pub async fn login_handler(headers: HeaderMap) -> Response {
    respond("login", echo_credentials(&headers))
}

fn echo_credentials(headers: &HeaderMap) -> ApiResult<Value> {
    let (username, password) = basic_credentials(headers).ok_or(ApiError::Unauthorized)?;
    Ok(json!({ "username": username, "password": password }))
}

/// Decode `Authorization: Basic <base64(user:pass)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
