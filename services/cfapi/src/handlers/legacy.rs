//! First-generation point route.
//!
//! `GET /data/:lat/:lon?parameters=..[&grp=..][&level=..]` always reads the
//! replay collection and only gates levels through [`LevelRestriction`].
//! Products are not checked against the catalog; a parameter missing from
//! the file still fails as `InvalidProduct`.
//!
//! [`LevelRestriction`]: cf_catalog::LevelRestriction

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use cf_dataset::Subset;
use serde_json::Value;
use tracing::debug;

use super::query::{parse_float, read, select_file};
use super::respond;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyParams {
    pub parameters: Vec<String>,
    pub grp: Option<String>,
    pub level: Option<String>,
}

impl LegacyParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> ApiResult<Self> {
        let mut parameters: Vec<String> = Vec::new();
        let mut grp = None;
        let mut level = None;

        for (key, value) in pairs {
            match key.as_str() {
                "parameters" => {
                    // Comma lists and repeated keys both work
                    for p in value.split(',') {
                        let p = p.trim().to_uppercase();
                        if !p.is_empty() && !parameters.contains(&p) {
                            parameters.push(p);
                        }
                    }
                }
                "grp" => grp = Some(value.trim().to_string()).filter(|s| !s.is_empty()),
                "level" => level = Some(value.trim().to_string()).filter(|s| !s.is_empty()),
                _ => {}
            }
        }

        if parameters.is_empty() {
            return Err(ApiError::InvalidQuery(
                "Missing required parameter: parameters".to_string(),
            ));
        }
        Ok(Self {
            parameters,
            grp,
            level,
        })
    }
}

/// GET /data/:lat/:lon
pub async fn legacy_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((lat, lon)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    respond("data", run_legacy(&state, &lat, &lon, &pairs).await)
}

async fn run_legacy(
    state: &AppState,
    lat: &str,
    lon: &str,
    pairs: &[(String, String)],
) -> ApiResult<Value> {
    let lat = parse_float("lat", lat)?;
    let lon = parse_float("lon", lon)?;
    let params = LegacyParams::from_pairs(pairs)?;

    let triple = state
        .legacy_levels
        .apply(params.grp.as_deref(), params.level.as_deref())
        .map_err(|e| {
            debug!(error = %e, "Rejected legacy query");
            e
        })?;

    let file = select_file(state, &triple)?;
    let subset = Subset::point(lat, lon, params.parameters);
    read(state, &triple, &file, &subset).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parameters_repeated_and_comma_separated() {
        let params = LegacyParams::from_pairs(&pairs(&[
            ("parameters", "no2,o3"),
            ("parameters", "PM25_RH35_GCC"),
            ("parameters", "NO2"),
        ]))
        .unwrap();
        assert_eq!(params.parameters, ["NO2", "O3", "PM25_RH35_GCC"]);
        assert_eq!(params.grp, None);
        assert_eq!(params.level, None);
    }

    #[test]
    fn test_group_and_level() {
        let params = LegacyParams::from_pairs(&pairs(&[
            ("parameters", "T"),
            ("grp", "met"),
            ("level", "p23"),
        ]))
        .unwrap();
        assert_eq!(params.grp.as_deref(), Some("met"));
        assert_eq!(params.level.as_deref(), Some("p23"));
    }

    #[test]
    fn test_blank_group_is_absent() {
        let params =
            LegacyParams::from_pairs(&pairs(&[("parameters", "NO2"), ("grp", " ")])).unwrap();
        assert_eq!(params.grp, None);
    }

    #[test]
    fn test_parameters_required() {
        let err = LegacyParams::from_pairs(&pairs(&[("grp", "aqc")])).unwrap_err();
        assert_eq!(err.kind(), "InvalidQuery");
    }
}
