//! API error type and its JSON response mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cf_catalog::{DatasetTriple, ResolveError, ValidationError};
use cf_dataset::DatasetError;
use serde::Serialize;
use thiserror::Error;

/// Every failure a request can end in.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Catalog rejection (unknown axis, date rule, product).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Malformed query parameters.
    #[error("{0}")]
    InvalidQuery(String),

    /// No file matches a valid triple.
    #[error("No dataset file found for {0}")]
    DatasetNotFound(String),

    /// Missing or malformed Basic credentials.
    #[error("Missing or malformed Basic credentials")]
    Unauthorized,

    /// Engine or filesystem failure. The detail is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(e) => e.kind(),
            ApiError::InvalidQuery(_) => "InvalidQuery",
            ApiError::DatasetNotFound(_) => "DatasetNotFound",
            ApiError::Unauthorized => "Unauthorized",
            ApiError::Internal(_) => "Internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::DatasetNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a reader failure for a request on `triple`.
    ///
    /// A variable missing from the file is reported like an undeclared
    /// product, listing what the catalog declares for the triple.
    pub fn from_dataset(err: DatasetError, triple: &DatasetTriple, declared: &[String]) -> Self {
        match err {
            DatasetError::MissingVariable(product) => {
                ApiError::Validation(ValidationError::InvalidProduct {
                    collection: triple.collection.clone(),
                    group: triple.group.clone(),
                    level: triple.level.clone(),
                    product,
                    allowed: declared.to_vec(),
                })
            }
            DatasetError::InvalidSelection(detail) => ApiError::InvalidQuery(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind().to_string(),
            status: self.status_code().as_u16(),
            detail: self.to_string(),
            allowed: match self {
                ApiError::Validation(e) => e.allowed().map(<[String]>::to_vec),
                _ => None,
            },
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Catalog(e) => ApiError::Validation(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Request failed");
        }

        let mut response = (self.status_code(), Json(self.body())).into_response();
        if matches!(self, ApiError::Unauthorized) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic"),
            );
        }
        response
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn triple() -> DatasetTriple {
        DatasetTriple::new("rpl", "aqc", "v1")
    }

    #[test]
    fn test_validation_body_lists_allowed() {
        let err = ApiError::from(ValidationError::UnknownGroup {
            collection: "fcst".to_string(),
            requested: "bogus".to_string(),
            allowed: vec!["chm".to_string(), "met".to_string()],
        });
        let body = err.body();
        assert_eq!(body.kind, "UnknownGroup");
        assert_eq!(body.status, 400);
        assert_eq!(body.allowed.unwrap(), ["chm", "met"]);
    }

    #[test]
    fn test_missing_variable_maps_to_invalid_product() {
        let declared = vec!["NO2".to_string(), "O3".to_string()];
        let err = ApiError::from_dataset(
            DatasetError::MissingVariable("XYZ".to_string()),
            &triple(),
            &declared,
        );
        assert_eq!(err.kind(), "InvalidProduct");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.body().allowed.unwrap(), declared);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        let err = ApiError::from_dataset(
            DatasetError::InvalidFormat("HDF5 error at /secret/path".to_string()),
            &triple(),
            &[],
        );
        let body = err.body();
        assert_eq!(body.status, 500);
        assert!(!body.detail.contains("/secret/path"));
        assert!(body.allowed.is_none());
    }

    #[test]
    fn test_unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic"
        );
    }
}
