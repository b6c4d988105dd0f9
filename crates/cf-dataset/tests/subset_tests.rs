//! Subsetting synthetic GEOS-CF datasets through the reader trait.

use std::path::Path;

use cf_dataset::{AxisSelector, DatasetError, DatasetReader, Subset, TimeRange};
use chrono::NaiveDate;
use serde_json::json;
use test_utils::fixtures::{files, points, GridSpec};
use test_utils::{assert_approx_eq, expected_value, fixture_reader};

fn products(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Nearest point
// ============================================================================

#[tokio::test]
async fn test_nearest_point_nyc() {
    let reader = fixture_reader(&[files::RPL_AQC_0203]);
    let (lat, lon) = points::NYC;
    let subset = Subset::point(lat, lon, products(&["NO2", "O3"]));

    let ds = reader
        .read_subset(Path::new(files::RPL_AQC_0203), &subset)
        .await
        .unwrap();
    let dict = ds.to_dict();

    // 40.7128 snaps to 40.75 (index 15), -74.006 to -74.0 (index 16)
    assert_approx_eq!(dict["coords"]["lat"]["data"].as_f64().unwrap(), 40.75, 1e-9);
    assert_approx_eq!(dict["coords"]["lon"]["data"].as_f64().unwrap(), -74.0, 1e-9);
    assert_eq!(dict["coords"]["lat"]["dims"], json!([]));

    let no2 = &dict["data_vars"]["NO2"];
    assert_eq!(no2["dims"], json!(["time"]));
    assert_eq!(
        no2["data"],
        json!([
            expected_value("NO2", 0, 15, 16),
            expected_value("NO2", 1, 15, 16),
            expected_value("NO2", 2, 15, 16),
        ])
    );
    assert!(dict["data_vars"].get("O3").is_some());
    assert!(dict["data_vars"].get("CO").is_none());
    assert_eq!(dict["dims"], json!({"time": GridSpec::EAST_COAST.n_time}));
}

#[tokio::test]
async fn test_missing_variable_is_reported() {
    let reader = fixture_reader(&[files::RPL_AQC_0203]);
    let subset = Subset::point(38.0, -77.0, products(&["NO2", "XYZ"]));
    let err = reader
        .read_subset(Path::new(files::RPL_AQC_0203), &subset)
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::MissingVariable(ref v) if v == "XYZ"));
}

// ============================================================================
// Bounding box and time range
// ============================================================================

#[tokio::test]
async fn test_bbox_subset_keeps_spatial_dims() {
    let reader = fixture_reader(&[files::RPL_AQC_0203]);
    let subset = Subset {
        lat: AxisSelector::Range(38.5, 38.0),
        lon: AxisSelector::Range(-77.0, -76.5),
        time: None,
        variables: products(&["CO"]),
    };

    let ds = reader
        .read_subset(Path::new(files::RPL_AQC_0203), &subset)
        .await
        .unwrap();
    let dims = ds.dims();
    assert_eq!(dims["lat"], 3);
    assert_eq!(dims["lon"], 3);
    assert_eq!(dims["time"], 3);

    // lat 38.0 is index 4, lon -77.0 is index 4
    let co = ds.to_dict()["data_vars"]["CO"]["data"].clone();
    assert_eq!(co[0][0][0], json!(expected_value("CO", 0, 4, 4)));
    assert_eq!(co[2][2][2], json!(expected_value("CO", 2, 6, 6)));
}

#[tokio::test]
async fn test_time_range_outside_granule_is_empty() {
    let reader = fixture_reader(&[files::RPL_AQC_0203]);
    let subset = Subset::point(38.0, -77.0, products(&["NO2"]))
        .with_time(TimeRange::new(Some(date("2025-02-04")), Some(date("2025-02-05"))));

    let ds = reader
        .read_subset(Path::new(files::RPL_AQC_0203), &subset)
        .await
        .unwrap();
    assert_eq!(ds.dims()["time"], 0);
    assert_eq!(ds.to_dict()["data_vars"]["NO2"]["data"], json!([]));
}

#[tokio::test]
async fn test_time_range_covering_granule_day() {
    let reader = fixture_reader(&[files::RPL_AQC_0203]);
    let subset = Subset::point(38.0, -77.0, products(&["NO2"]))
        .with_time(TimeRange::new(Some(date("2025-02-03")), Some(date("2025-02-03"))));

    let ds = reader
        .read_subset(Path::new(files::RPL_AQC_0203), &subset)
        .await
        .unwrap();
    let dict = ds.to_dict();
    assert_eq!(
        dict["coords"]["time"]["data"],
        json!([
            "2025-02-03T00:30:00",
            "2025-02-03T01:30:00",
            "2025-02-03T02:30:00"
        ])
    );
}
