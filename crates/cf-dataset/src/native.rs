//! Native NetCDF reader using the netcdf library.
//!
//! Only the hyperslab covering the selection is read from each variable;
//! non-contiguous picks inside that window are gathered in memory. The file
//! is opened inside a blocking task and closed before the task returns.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Once;

use async_trait::async_trait;
use serde_json::{Number, Value};
use tracing::{debug, instrument};

use crate::error::{DatasetError, DatasetResult};
use crate::model::{Attrs, Dataset, Values, Variable};
use crate::reader::DatasetReader;
use crate::selection::{AxisPick, SelectionPlan, Subset, LAT, LON, TIME};
use crate::time::{is_time_units, TimeUnits};

/// Silence HDF5's automatic error printing to stderr.
///
/// Probing for optional attributes makes the C library print diagnostics
/// even though the missing attribute is handled. Call early in `main()`,
/// before any file is opened. Safe to call more than once.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error output.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Reads GEOS-CF NetCDF-4 files from local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfReader;

impl NetCdfReader {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }
}

#[async_trait]
impl DatasetReader for NetCdfReader {
    async fn read_subset(&self, path: &Path, subset: &Subset) -> DatasetResult<Dataset> {
        let path: PathBuf = path.to_path_buf();
        let subset = subset.clone();
        tokio::task::spawn_blocking(move || read_subset_blocking(&path, &subset))
            .await
            .map_err(|e| DatasetError::Task(e.to_string()))?
    }

    fn name(&self) -> &'static str {
        "netcdf"
    }
}

/// Synchronous subset read. The file handle is dropped on every return path.
#[instrument(skip(subset), fields(vars = ?subset.variables))]
pub fn read_subset_blocking(path: &Path, subset: &Subset) -> DatasetResult<Dataset> {
    let file = netcdf::open(path).map_err(|e| {
        DatasetError::InvalidFormat(format!("Failed to open NetCDF {}: {}", path.display(), e))
    })?;

    for name in &subset.variables {
        if file.variable(name).is_none() {
            return Err(DatasetError::MissingVariable(name.clone()));
        }
    }

    let lat = read_axis(&file, LAT)?;
    let lon = read_axis(&file, LON)?;
    let time = match file.variable(TIME) {
        Some(var) => Some(decode_time_axis(&var)?),
        None => None,
    };
    let plan = subset.plan(&lat, &lon, time.as_deref())?;
    debug!(?plan, "Selection plan");

    let mut dataset = Dataset::new();
    dataset.attrs = file
        .attributes()
        .filter_map(|attr| {
            let value = attr.value().ok()?;
            Some((attr.name().to_string(), attr_to_json(value)))
        })
        .collect();

    let mut used_dims: Vec<String> = Vec::new();
    for name in &subset.variables {
        let var = file
            .variable(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.clone()))?;
        for dim in var.dimensions() {
            let dim_name = dim.name();
            if !used_dims.contains(&dim_name) {
                used_dims.push(dim_name);
            }
        }
        dataset
            .data_vars
            .insert(name.clone(), read_variable(&var, &plan)?);
    }

    for dim in &used_dims {
        if let Some(var) = file.variable(dim) {
            dataset.coords.insert(dim.clone(), read_variable(&var, &plan)?);
        }
    }

    Ok(dataset)
}

fn read_axis(file: &netcdf::File, name: &str) -> DatasetResult<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| DatasetError::MissingCoordinate(name.to_string()))?;
    var.get_values::<f64, _>(..)
        .map_err(|e| DatasetError::InvalidFormat(format!("Failed to read {}: {}", name, e)))
}

fn decode_time_axis(var: &netcdf::Variable) -> DatasetResult<Vec<chrono::NaiveDateTime>> {
    let units = get_string_attr(var, "units")
        .ok_or_else(|| DatasetError::InvalidFormat("time axis has no units".to_string()))?;
    let raw = var
        .get_values::<f64, _>(..)
        .map_err(|e| DatasetError::InvalidFormat(format!("Failed to read time: {}", e)))?;
    TimeUnits::parse(&units)?.decode_all(&raw)
}

/// Read the window covering `plan` from one variable and apply the plan.
fn read_variable(var: &netcdf::Variable, plan: &SelectionPlan) -> DatasetResult<Variable> {
    let name = var.name();
    let mut dims = Vec::new();
    let mut windows: Vec<Range<usize>> = Vec::new();
    let mut local = SelectionPlan::new();

    for dim in var.dimensions() {
        let dim_name = dim.name();
        let window = match plan.get(&dim_name) {
            Some(pick) => {
                let (start, count) = pick.window().unwrap_or((0, 0));
                local.insert(dim_name.clone(), rebase(pick, start));
                start..start + count
            }
            None => 0..dim.len(),
        };
        dims.push(dim_name);
        windows.push(window);
    }

    let shape: Vec<usize> = windows.iter().map(|w| w.len()).collect();
    let raw: Vec<f64> = if shape.iter().any(|&n| n == 0) {
        Vec::new()
    } else if windows.is_empty() {
        var.get_values::<f64, _>(..)
            .map_err(|e| DatasetError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?
    } else {
        var.get_values::<f64, _>(windows)
            .map_err(|e| DatasetError::InvalidFormat(format!("Failed to read {}: {}", name, e)))?
    };

    let mut attrs: Attrs = var
        .attributes()
        .filter_map(|attr| {
            let value = attr.value().ok()?;
            Some((attr.name().to_string(), attr_to_json(value)))
        })
        .collect();

    let values = match get_string_attr(var, "units").filter(|u| is_time_units(u)) {
        Some(units) => {
            attrs.remove("units");
            attrs.remove("calendar");
            Values::Time(TimeUnits::parse(&units)?.decode_all(&raw)?)
        }
        None => Values::Float(unpack(var, raw, &mut attrs)),
    };

    let mut out = Variable::new(dims, shape, values)?;
    out.attrs = attrs;
    Ok(out.isel(&local))
}

/// Shift picked indices so they address the read window.
fn rebase(pick: &AxisPick, start: usize) -> AxisPick {
    match pick {
        AxisPick::Index(i) => AxisPick::Index(i - start),
        AxisPick::Indices(v) => AxisPick::Indices(v.iter().map(|i| i - start).collect()),
    }
}

/// Mask fill values and apply CF packing. Packing attributes are consumed.
fn unpack(var: &netcdf::Variable, raw: Vec<f64>, attrs: &mut Attrs) -> Vec<f64> {
    let fill = get_f64_attr(var, "_FillValue");
    let missing = get_f64_attr(var, "missing_value");
    let scale = get_f64_attr(var, "scale_factor").unwrap_or(1.0);
    let offset = get_f64_attr(var, "add_offset").unwrap_or(0.0);
    for key in ["_FillValue", "missing_value", "scale_factor", "add_offset"] {
        attrs.remove(key);
    }

    raw.into_iter()
        .map(|v| {
            if Some(v) == fill || Some(v) == missing {
                f64::NAN
            } else {
                v * scale + offset
            }
        })
        .collect()
}

fn attr_to_json(value: netcdf::AttributeValue) -> Value {
    use netcdf::AttributeValue as A;

    fn num(v: f64) -> Value {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
    fn list<T: Into<Value>>(v: Vec<T>) -> Value {
        Value::Array(v.into_iter().map(Into::into).collect())
    }

    match value {
        A::Uchar(v) => v.into(),
        A::Uchars(v) => list(v),
        A::Schar(v) => v.into(),
        A::Schars(v) => list(v),
        A::Ushort(v) => v.into(),
        A::Ushorts(v) => list(v),
        A::Short(v) => v.into(),
        A::Shorts(v) => list(v),
        A::Uint(v) => v.into(),
        A::Uints(v) => list(v),
        A::Int(v) => v.into(),
        A::Ints(v) => list(v),
        A::Ulonglong(v) => v.into(),
        A::Ulonglongs(v) => list(v),
        A::Longlong(v) => v.into(),
        A::Longlongs(v) => list(v),
        A::Float(v) => num(v as f64),
        A::Floats(v) => Value::Array(v.into_iter().map(|x| num(x as f64)).collect()),
        A::Double(v) => num(v),
        A::Doubles(v) => Value::Array(v.into_iter().map(num).collect()),
        A::Str(v) => v.into(),
        A::Strs(v) => list(v),
    }
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(var, name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}
