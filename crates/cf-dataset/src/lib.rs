//! Gridded dataset access for GEOS-CF files.
//!
//! A [`DatasetReader`] opens one file, applies a [`Subset`] (nearest point or
//! coordinate range on lat/lon, optional day range on time, variable list)
//! and returns a [`Dataset`] that serialises to the conventional dictionary
//! layout with [`Dataset::to_dict`].
//!
//! Two readers are provided:
//!
//! - [`MemoryReader`]: prebuilt datasets keyed by file name
//! - `NetCdfReader`: libnetcdf-backed, enabled with the `netcdf` feature
//!
//! ```rust
//! use cf_dataset::{AxisSelector, Subset};
//!
//! let subset = Subset::point(40.71, -74.0, vec!["NO2".to_string()]);
//! assert_eq!(subset.lat, AxisSelector::Nearest(40.71));
//! ```

pub mod error;
pub mod model;
pub mod reader;
pub mod selection;
pub mod time;

#[cfg(feature = "netcdf")]
pub mod native;

pub use error::{DatasetError, DatasetResult};
pub use model::{Attrs, Dataset, Values, Variable};
pub use reader::{DatasetReader, MemoryReader};
pub use selection::{AxisPick, AxisSelector, SelectionPlan, Subset, TimeRange, LAT, LON, TIME};
pub use time::TimeUnits;

#[cfg(feature = "netcdf")]
pub use native::{silence_hdf5_errors, NetCdfReader};
