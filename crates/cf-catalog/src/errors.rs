//! Catalog validation and file resolution errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for catalog validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Why a request was rejected before any file was touched.
///
/// Every axis failure carries the legal alternatives at the point of failure
/// so they can be handed straight back to the client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Unknown collection '{}'. Allowed collections: {}", .requested, .allowed.join(", "))]
    UnknownCollection {
        requested: String,
        allowed: Vec<String>,
    },

    #[error("Unknown group '{}' for collection '{}'. Allowed groups: {}", .requested, .collection, .allowed.join(", "))]
    UnknownGroup {
        collection: String,
        requested: String,
        allowed: Vec<String>,
    },

    #[error("Unknown level '{}' for {}/{}. Allowed levels: {}", .requested, .collection, .group, .allowed.join(", "))]
    UnknownLevel {
        collection: String,
        group: String,
        requested: String,
        allowed: Vec<String>,
    },

    #[error("start_date/end_date are only supported for the 'rpl' collection, not '{collection}'")]
    DateRangeNotApplicable { collection: String },

    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Product '{}' is not available for {}/{}/{}. Allowed products: {}", .product, .collection, .group, .level, .allowed.join(", "))]
    InvalidProduct {
        collection: String,
        group: String,
        level: String,
        product: String,
        allowed: Vec<String>,
    },
}

impl ValidationError {
    /// Short machine-readable name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::UnknownCollection { .. } => "UnknownCollection",
            ValidationError::UnknownGroup { .. } => "UnknownGroup",
            ValidationError::UnknownLevel { .. } => "UnknownLevel",
            ValidationError::DateRangeNotApplicable { .. } => "DateRangeNotApplicable",
            ValidationError::InvalidDateRange { .. } => "InvalidDateRange",
            ValidationError::InvalidProduct { .. } => "InvalidProduct",
        }
    }

    /// Legal values at the axis that failed, if the failure is about an axis.
    pub fn allowed(&self) -> Option<&[String]> {
        match self {
            ValidationError::UnknownCollection { allowed, .. }
            | ValidationError::UnknownGroup { allowed, .. }
            | ValidationError::UnknownLevel { allowed, .. }
            | ValidationError::InvalidProduct { allowed, .. } => Some(allowed),
            ValidationError::DateRangeNotApplicable { .. }
            | ValidationError::InvalidDateRange { .. } => None,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::InvalidProduct { .. } => 404,
            _ => 400,
        }
    }
}

/// Result type for file resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised while turning a triple into a list of files.
///
/// An empty directory listing is not an error; callers decide what an
/// empty result means.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The triple could not be completed from the catalog.
    #[error(transparent)]
    Catalog(#[from] ValidationError),

    /// The generated glob pattern was rejected.
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

/// Errors raised while loading a catalog declaration.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid catalog layout: {0}")]
    Layout(String),
}
