//! Synthetic GEOS-CF-like datasets.
//!
//! Every value encodes its position so tests can check which grid cell was
//! selected: `product_index * 1_000_000 + t * 10_000 + lat_idx * 100 + lon_idx`.

use cf_dataset::{Dataset, MemoryReader, Values, Variable};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::fixtures::GridSpec;

/// Products written by [`aqc_dataset`], in index order (starting at 1).
pub const AQC_PRODUCTS: [&str; 4] = ["CO", "NO2", "O3", "PM25_RH35_GCC"];

/// Value stored at a cell of a generated dataset.
///
/// # Example
///
/// ```
/// use test_utils::expected_value;
///
/// assert_eq!(expected_value("NO2", 1, 2, 3), 2_010_203.0);
/// ```
pub fn expected_value(product: &str, t: usize, y: usize, x: usize) -> f64 {
    let p = AQC_PRODUCTS
        .iter()
        .position(|&name| name == product)
        .map_or(0, |i| i + 1);
    (p * 1_000_000 + t * 10_000 + y * 100 + x) as f64
}

/// Hourly time stamps at HH:30 on `day`.
pub fn granule_times(day: NaiveDate, n: usize) -> Vec<NaiveDateTime> {
    let start = day
        .and_hms_opt(0, 30, 0)
        .expect("00:30 is always a valid time");
    (0..n)
        .map(|h| start + Duration::hours(h as i64))
        .collect()
}

/// Day embedded in a GEOS-CF file name (`...v1.20250203_0030z.nc4`).
pub fn granule_day(file_name: &str) -> Option<NaiveDate> {
    file_name
        .split('.')
        .filter(|part| part.len() >= 9 && part.as_bytes()[8] == b'_')
        .find_map(|part| NaiveDate::parse_from_str(&part[..8], "%Y%m%d").ok())
}

/// A replay aqc/v1 dataset on `spec` for `day`.
pub fn aqc_dataset(spec: &GridSpec, day: NaiveDate) -> Dataset {
    let dims = vec!["time".to_string(), "lat".to_string(), "lon".to_string()];
    let shape = vec![spec.n_time, spec.n_lat, spec.n_lon];

    let mut ds = Dataset::new()
        .with_attr("Title", "GEOS-CF synthetic aqc_tavg_1hr_g1440x721_v1")
        .with_attr("Contact", "test-utils")
        .with_coord(
            "time",
            Variable::coordinate("time", Values::Time(granule_times(day, spec.n_time)))
                .with_attr("long_name", "time"),
        )
        .with_coord(
            "lat",
            Variable::coordinate("lat", Values::Float(spec.lats()))
                .with_attr("units", "degrees_north")
                .with_attr("long_name", "latitude"),
        )
        .with_coord(
            "lon",
            Variable::coordinate("lon", Values::Float(spec.lons()))
                .with_attr("units", "degrees_east")
                .with_attr("long_name", "longitude"),
        );

    for product in AQC_PRODUCTS {
        let mut data = Vec::with_capacity(spec.n_time * spec.n_lat * spec.n_lon);
        for t in 0..spec.n_time {
            for y in 0..spec.n_lat {
                for x in 0..spec.n_lon {
                    data.push(expected_value(product, t, y, x));
                }
            }
        }
        let var = Variable::new(dims.clone(), shape.clone(), Values::Float(data))
            .expect("generated shape matches data")
            .with_attr("units", "mol mol-1")
            .with_attr("long_name", product);
        ds = ds.with_var(product, var);
    }

    ds
}

/// A reader serving an aqc dataset for each file name.
///
/// The granule day is parsed from the name; names without one use 2025-02-03.
pub fn fixture_reader<S: AsRef<str>>(file_names: &[S]) -> MemoryReader {
    let fallback = NaiveDate::from_ymd_opt(2025, 2, 3).expect("valid date");
    file_names.iter().fold(MemoryReader::new(), |reader, name| {
        let name = name.as_ref();
        let day = granule_day(name).unwrap_or(fallback);
        reader.with_dataset(name, aqc_dataset(&GridSpec::EAST_COAST, day))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::files;

    #[test]
    fn test_granule_day() {
        assert_eq!(
            granule_day(files::RPL_AQC_0203),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
        assert_eq!(granule_day("no-date.nc4"), None);
    }

    #[test]
    fn test_aqc_dataset_shape() {
        let spec = GridSpec::EAST_COAST;
        let ds = aqc_dataset(&spec, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
        let dims = ds.dims();
        assert_eq!(dims["lat"], spec.n_lat);
        assert_eq!(dims["lon"], spec.n_lon);
        assert_eq!(dims["time"], spec.n_time);
        assert_eq!(ds.data_vars.len(), AQC_PRODUCTS.len());
    }

    #[test]
    fn test_granule_times() {
        let day = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let times = granule_times(day, 2);
        assert_eq!(times[1], day.and_hms_opt(1, 30, 0).unwrap());
    }
}
