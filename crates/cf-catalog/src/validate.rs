//! Request validation against the catalog.
//!
//! Checks run in a fixed order and stop at the first failure:
//! collection, group, level, date applicability, date ordering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, DatasetTriple, REPLAY_COLLECTION};
use crate::errors::{ValidationError, ValidationResult};

/// How start/end dates are gated by collection.
///
/// The historical rule was written as `start or end and collection != rpl`,
/// which groups as `start or (end and collection != rpl)`: a start date is
/// then refused for every collection. `ReplayOnly` is the reading where any
/// date requires the replay collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRangeRule {
    /// Either date requires the `rpl` collection.
    #[default]
    ReplayOnly,
    /// `start_date || (end_date && collection != "rpl")`.
    Legacy,
}

impl DateRangeRule {
    fn rejects(self, collection: &str, start: bool, end: bool) -> bool {
        let not_replay = collection != REPLAY_COLLECTION;
        match self {
            DateRangeRule::ReplayOnly => (start || end) && not_replay,
            DateRangeRule::Legacy => start || (end && not_replay),
        }
    }
}

/// The catalog-relevant fields of an incoming query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRequest<'a> {
    pub collection: Option<&'a str>,
    pub group: Option<&'a str>,
    pub level: Option<&'a str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Gatekeeper over a catalog.
#[derive(Debug, Clone, Copy)]
pub struct Validator<'c> {
    catalog: &'c Catalog,
    date_rule: DateRangeRule,
}

impl<'c> Validator<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            date_rule: DateRangeRule::default(),
        }
    }

    pub fn with_date_rule(mut self, rule: DateRangeRule) -> Self {
        self.date_rule = rule;
        self
    }

    /// Check a request without touching the filesystem.
    pub fn validate(&self, request: &CatalogRequest<'_>) -> ValidationResult<()> {
        let catalog = self.catalog;

        let collection_name = match request.collection {
            Some(name) => name,
            None => catalog
                .default_collection()
                .unwrap_or(crate::catalog::DEFAULT_COLLECTION),
        };
        let collection =
            catalog
                .collection(collection_name)
                .ok_or_else(|| ValidationError::UnknownCollection {
                    requested: collection_name.to_string(),
                    allowed: catalog.collection_names(),
                })?;

        if let Some(group) = request.group {
            if collection.group(group).is_none() {
                return Err(ValidationError::UnknownGroup {
                    collection: collection.name.clone(),
                    requested: group.to_string(),
                    allowed: collection.group_names(),
                });
            }
        }

        if let Some(level) = request.level {
            let group = request
                .group
                .and_then(|g| collection.group(g))
                .or_else(|| collection.groups.first());
            let known = group.map(|g| g.level(level).is_some()).unwrap_or(false);
            if !known {
                return Err(ValidationError::UnknownLevel {
                    collection: collection.name.clone(),
                    group: group.map(|g| g.name.clone()).unwrap_or_default(),
                    requested: level.to_string(),
                    allowed: group.map(|g| g.level_names()).unwrap_or_default(),
                });
            }
        }

        let has_start = request.start_date.is_some();
        let has_end = request.end_date.is_some();
        if self.date_rule.rejects(&collection.name, has_start, has_end) {
            return Err(ValidationError::DateRangeNotApplicable {
                collection: collection.name.clone(),
            });
        }

        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            if start > end {
                return Err(ValidationError::InvalidDateRange { start, end });
            }
        }

        Ok(())
    }

    /// Check requested products against the catalog leaf of a triple.
    ///
    /// Products are compared as given; callers normalise case first.
    pub fn check_products<S: AsRef<str>>(
        &self,
        triple: &DatasetTriple,
        products: &[S],
    ) -> ValidationResult<()> {
        let allowed = self.catalog.products(triple).ok_or_else(|| {
            ValidationError::UnknownLevel {
                collection: triple.collection.clone(),
                group: triple.group.clone(),
                requested: triple.level.clone(),
                allowed: self.catalog.level_names(&triple.collection, &triple.group),
            }
        })?;

        for product in products {
            let product = product.as_ref();
            if !allowed.iter().any(|p| p == product) {
                return Err(ValidationError::InvalidProduct {
                    collection: triple.collection.clone(),
                    group: triple.group.clone(),
                    level: triple.level.clone(),
                    product: product.to_string(),
                    allowed: allowed.to_vec(),
                });
            }
        }

        Ok(())
    }
}
