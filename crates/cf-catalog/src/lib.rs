//! GEOS-CF dataset catalog.
//!
//! This crate holds the only domain rules of the query service:
//!
//! - [`Catalog`]: the legal collection → group → level → products table
//! - [`Validator`]: fail-fast request checks against the catalog
//! - [`FileResolver`]: deterministic filename globbing for a triple
//! - [`LevelRestriction`]: the level gate of the first-generation route
//!
//! # Example
//!
//! ```rust
//! use cf_catalog::{Catalog, CatalogRequest, Validator};
//!
//! let catalog = Catalog::geos_cf();
//! let request = CatalogRequest {
//!     collection: Some("fcst"),
//!     group: Some("bogus"),
//!     ..Default::default()
//! };
//! let err = Validator::new(catalog).validate(&request).unwrap_err();
//! assert_eq!(err.kind(), "UnknownGroup");
//! ```

pub mod catalog;
pub mod errors;
pub mod legacy;
pub mod resolver;
pub mod validate;

pub use catalog::{
    Catalog, CatalogBuilder, CollectionEntry, DatasetTriple, GroupEntry, LevelEntry,
    DEFAULT_COLLECTION, REPLAY_COLLECTION,
};
pub use errors::{CatalogLoadError, ResolveError, ResolveResult, ValidationError, ValidationResult};
pub use legacy::LevelRestriction;
pub use resolver::{FileNaming, FileResolver, FileSelection};
pub use validate::{CatalogRequest, DateRangeRule, Validator};
