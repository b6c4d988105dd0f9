//! Common test fixtures for GEOS-CF query tests.

/// Real-looking GEOS-CF file names.
pub mod files {
    /// The replay granule the first-generation service read.
    pub const RPL_AQC_0203: &str = "GEOS-CF.v01.rpl.aqc_tavg_1hr_g1440x721_v1.20250203_0030z.nc4";

    pub const RPL_AQC_0201: &str = "GEOS-CF.v01.rpl.aqc_tavg_1hr_g1440x721_v1.20250201_0030z.nc4";

    pub const RPL_AQC_0227: &str = "GEOS-CF.v01.rpl.aqc_tavg_1hr_g1440x721_v1.20250227_0030z.nc4";

    pub const RPL_MET_X1: &str = "GEOS-CF.v01.rpl.met_tavg_1hr_g1440x721_x1.20250203_0030z.nc4";

    pub const FCST_CHM_V1: &str = "GEOS-CF.v01.fcst.chm_inst_1hr_g1440x721_v1.20250203_0000z.nc4";

    /// Three replay aqc/v1 granules, deliberately unsorted.
    pub const RPL_AQC_SERIES: [&str; 3] = [RPL_AQC_0227, RPL_AQC_0201, RPL_AQC_0203];
}

/// Query points used across tests, as (lat, lon).
pub mod points {
    /// New York City
    pub const NYC: (f64, f64) = (40.7128, -74.0060);

    /// The service's default query point
    pub const DEFAULT: (f64, f64) = (38.0, -77.0);
}

/// Grid layout for generated datasets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub lat0: f64,
    pub lon0: f64,
    /// Grid spacing in degrees (both axes).
    pub step: f64,
    pub n_lat: usize,
    pub n_lon: usize,
    /// Hourly steps starting 00:30 on the granule day.
    pub n_time: usize,
}

impl GridSpec {
    /// A 0.25° patch over the US east coast covering both query points.
    pub const EAST_COAST: GridSpec = GridSpec {
        lat0: 37.0,
        lon0: -78.0,
        step: 0.25,
        n_lat: 17,
        n_lon: 21,
        n_time: 3,
    };

    pub fn lats(&self) -> Vec<f64> {
        (0..self.n_lat).map(|i| self.lat0 + i as f64 * self.step).collect()
    }

    pub fn lons(&self) -> Vec<f64> {
        (0..self.n_lon).map(|i| self.lon0 + i as f64 * self.step).collect()
    }
}
