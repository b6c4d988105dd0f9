//! Catalog-validated point/area queries.
//!
//! `GET /cfapi/:mode[/:grp[/:level]]` where `mode` is the collection.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use cf_catalog::{CatalogRequest, DatasetTriple};
use cf_dataset::{AxisSelector, Subset, TimeRange};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::respond;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Latitude used when a request gives none.
pub const DEFAULT_LAT: f64 = 38.0;
/// Longitude used when a request gives none.
pub const DEFAULT_LON: f64 = -77.0;

/// Path segments of a query route.
#[derive(Debug, Deserialize)]
pub struct QueryPath {
    pub mode: String,
    pub grp: Option<String>,
    pub level: Option<String>,
}

/// Parsed query string.
///
/// `lat`, `lon` and `products` may repeat, so the raw pairs are parsed by
/// hand instead of through a derived struct.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub products: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl QueryParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> ApiResult<Self> {
        let mut lat = Vec::new();
        let mut lon = Vec::new();
        let mut products: Vec<String> = Vec::new();
        let mut start_date = None;
        let mut end_date = None;

        for (key, value) in pairs {
            match key.as_str() {
                "lat" => lat.push(parse_float("lat", value)?),
                "lon" => lon.push(parse_float("lon", value)?),
                "products" => {
                    let product = value.trim().to_uppercase();
                    if !product.is_empty() && !products.contains(&product) {
                        products.push(product);
                    }
                }
                "start_date" => start_date = Some(parse_date("start_date", value)?),
                "end_date" => end_date = Some(parse_date("end_date", value)?),
                _ => {}
            }
        }

        if lat.is_empty() {
            lat.push(DEFAULT_LAT);
        }
        if lon.is_empty() {
            lon.push(DEFAULT_LON);
        }
        if products.is_empty() {
            return Err(ApiError::InvalidQuery(
                "Missing required parameter: products".to_string(),
            ));
        }

        Ok(Self {
            lat,
            lon,
            products,
            start_date,
            end_date,
        })
    }

    /// The dataset subset this query asks for.
    pub fn subset(&self) -> ApiResult<Subset> {
        let lat = AxisSelector::from_values("lat", &self.lat)
            .map_err(|e| ApiError::InvalidQuery(e.to_string()))?;
        let lon = AxisSelector::from_values("lon", &self.lon)
            .map_err(|e| ApiError::InvalidQuery(e.to_string()))?;

        let subset = Subset {
            lat,
            lon,
            time: None,
            variables: self.products.clone(),
        };
        Ok(subset.with_time(TimeRange::new(self.start_date, self.end_date)))
    }
}

pub(crate) fn parse_float(name: &str, value: &str) -> ApiResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::InvalidQuery(format!("Invalid {} value: '{}'", name, value)))
}

fn parse_date(name: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidQuery(format!(
            "Invalid {} '{}': expected YYYY-MM-DD",
            name, value
        ))
    })
}

/// GET /cfapi/:mode/ and its group/level variants
pub async fn cfapi_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<QueryPath>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    respond("cfapi", run_query(&state, &path, &pairs).await)
}

async fn run_query(
    state: &AppState,
    path: &QueryPath,
    pairs: &[(String, String)],
) -> ApiResult<Value> {
    let params = QueryParams::from_pairs(pairs)?;
    let group = path.grp.as_deref();
    let level = path.level.as_deref();

    let validator = state.validator();
    let request = CatalogRequest {
        collection: Some(path.mode.as_str()),
        group,
        level,
        start_date: params.start_date,
        end_date: params.end_date,
    };
    validator.validate(&request).map_err(|e| {
        debug!(error = %e, "Rejected query");
        e
    })?;

    let triple = state
        .catalog
        .resolve_triple(Some(path.mode.as_str()), group, level)?;
    validator.check_products(&triple, &params.products)?;

    let file = select_file(state, &triple)?;
    let subset = params.subset()?;
    read(state, &triple, &file, &subset).await
}

/// The configured file for a triple, or `DatasetNotFound`.
pub(crate) fn select_file(state: &AppState, triple: &DatasetTriple) -> ApiResult<PathBuf> {
    let files = state.resolver.list(triple)?;
    match state.config.file_selection.select(&files) {
        Some(file) => {
            debug!(triple = %triple, file = %file.display(), candidates = files.len(), "Selected dataset file");
            Ok(file.clone())
        }
        None => {
            info!(triple = %triple, dir = %state.resolver.dataset_dir().display(), "No dataset file");
            Err(ApiError::DatasetNotFound(triple.to_string()))
        }
    }
}

/// Subset `file` and serialise it.
pub(crate) async fn read(
    state: &AppState,
    triple: &DatasetTriple,
    file: &std::path::Path,
    subset: &Subset,
) -> ApiResult<Value> {
    let dataset = state
        .reader
        .read_subset(file, subset)
        .await
        .map_err(|e| {
            let declared = state.catalog.products(triple).unwrap_or_default();
            ApiError::from_dataset(e, triple, declared)
        })?;
    Ok(dataset.to_dict())
}
