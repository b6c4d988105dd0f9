//! In-memory gridded dataset and its dictionary serialisation.
//!
//! The JSON layout is the conventional "to dict" form of a labelled dataset:
//!
//! ```text
//! { "coords":    { name: { "dims": [..], "attrs": {..}, "data": .. } },
//!   "attrs":     { .. },
//!   "dims":      { name: length },
//!   "data_vars": { name: { "dims": [..], "attrs": {..}, "data": .. } } }
//! ```
//!
//! `data` is nested row-major by dimension; a scalar is a bare value.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::{json, Map, Number, Value};

use crate::error::{DatasetError, DatasetResult};
use crate::selection::{AxisPick, SelectionPlan, Subset, LAT, LON, TIME};
use crate::time::ISO_FORMAT;

/// Attribute map of a variable or dataset.
pub type Attrs = Map<String, Value>;

/// Flat row-major storage of a variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Float(Vec<f64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Float(v) => v.len(),
            Values::Time(v) => v.len(),
            Values::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Values::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_times(&self) -> Option<&[NaiveDateTime]> {
        match self {
            Values::Time(v) => Some(v),
            _ => None,
        }
    }

    fn gather(&self, flat: &[usize]) -> Values {
        match self {
            Values::Float(v) => Values::Float(flat.iter().map(|&i| v[i]).collect()),
            Values::Time(v) => Values::Time(flat.iter().map(|&i| v[i]).collect()),
            Values::Text(v) => Values::Text(flat.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    fn json_at(&self, i: usize) -> Value {
        match self {
            // NaN and infinities have no JSON form
            Values::Float(v) => Number::from_f64(v[i]).map_or(Value::Null, Value::Number),
            Values::Time(v) => Value::String(v[i].format(ISO_FORMAT).to_string()),
            Values::Text(v) => Value::String(v[i].clone()),
        }
    }
}

/// A named-dimension array with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    shape: Vec<usize>,
    pub attrs: Attrs,
    values: Values,
}

impl Variable {
    pub fn new(dims: Vec<String>, shape: Vec<usize>, values: Values) -> DatasetResult<Self> {
        if dims.len() != shape.len() {
            return Err(DatasetError::InvalidFormat(format!(
                "{} dimensions but shape has {} entries",
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(DatasetError::InvalidFormat(format!(
                "shape {:?} needs {} values, got {}",
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self {
            dims,
            shape,
            attrs: Attrs::new(),
            values,
        })
    }

    /// 1-D coordinate along its own dimension.
    pub fn coordinate(name: &str, values: Values) -> Self {
        let len = values.len();
        Self {
            dims: vec![name.to_string()],
            shape: vec![len],
            attrs: Attrs::new(),
            values,
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// Keep only the picked indices along each planned dimension.
    pub fn isel(&self, plan: &SelectionPlan) -> Variable {
        let axes: Vec<Vec<usize>> = self
            .dims
            .iter()
            .zip(&self.shape)
            .map(|(dim, &len)| match plan.get(dim) {
                Some(pick) => pick.indices().iter().copied().filter(|&i| i < len).collect(),
                None => (0..len).collect(),
            })
            .collect();

        let mut strides = vec![1usize; self.shape.len()];
        for d in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * self.shape[d + 1];
        }

        let total: usize = axes.iter().map(Vec::len).product();
        let mut flat = Vec::with_capacity(total);
        if total > 0 {
            let mut cursor = vec![0usize; axes.len()];
            loop {
                flat.push(
                    cursor
                        .iter()
                        .enumerate()
                        .map(|(d, &c)| axes[d][c] * strides[d])
                        .sum::<usize>(),
                );
                // odometer increment, last axis fastest
                let mut d = axes.len();
                loop {
                    if d == 0 {
                        break;
                    }
                    d -= 1;
                    cursor[d] += 1;
                    if cursor[d] < axes[d].len() {
                        break;
                    }
                    cursor[d] = 0;
                }
                if cursor.iter().all(|&c| c == 0) {
                    break;
                }
            }
        }

        let mut dims = Vec::new();
        let mut shape = Vec::new();
        for (dim, axis) in self.dims.iter().zip(&axes) {
            if plan.get(dim).map_or(true, AxisPick::keeps_dim) {
                dims.push(dim.clone());
                shape.push(axis.len());
            }
        }

        Variable {
            dims,
            shape,
            attrs: self.attrs.clone(),
            values: self.values.gather(&flat),
        }
    }

    /// Nested row-major JSON of the values.
    pub fn data_json(&self) -> Value {
        if self.shape.is_empty() {
            return if self.values.is_empty() {
                Value::Null
            } else {
                self.values.json_at(0)
            };
        }
        self.nest(0, 0)
    }

    fn nest(&self, depth: usize, offset: usize) -> Value {
        let len = self.shape[depth];
        if depth + 1 == self.shape.len() {
            return Value::Array((0..len).map(|i| self.values.json_at(offset + i)).collect());
        }
        let stride: usize = self.shape[depth + 1..].iter().product();
        Value::Array(
            (0..len)
                .map(|i| self.nest(depth + 1, offset + i * stride))
                .collect(),
        )
    }

    pub fn to_dict(&self) -> Value {
        json!({
            "dims": self.dims,
            "attrs": self.attrs,
            "data": self.data_json(),
        })
    }
}

/// Coordinates, data variables and global attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub coords: BTreeMap<String, Variable>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: Attrs,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coord(mut self, name: &str, var: Variable) -> Self {
        self.coords.insert(name.to_string(), var);
        self
    }

    pub fn with_var(mut self, name: &str, var: Variable) -> Self {
        self.data_vars.insert(name.to_string(), var);
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Length of every dimension used by a variable.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        self.coords
            .values()
            .chain(self.data_vars.values())
            .flat_map(|v| v.dims.iter().cloned().zip(v.shape.iter().copied()))
            .collect()
    }

    /// Keep only the named data variables and the coordinates they use.
    ///
    /// Scalar coordinates are always kept.
    pub fn select_vars<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Dataset> {
        let mut data_vars = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            let var = self
                .data_vars
                .get(name)
                .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))?;
            data_vars.insert(name.to_string(), var.clone());
        }

        let used: Vec<&String> = data_vars.values().flat_map(|v| &v.dims).collect();
        let coords = self
            .coords
            .iter()
            .filter(|(_, c)| c.dims.iter().all(|d| used.contains(&d)))
            .map(|(k, c)| (k.clone(), c.clone()))
            .collect();

        Ok(Dataset {
            coords,
            data_vars,
            attrs: self.attrs.clone(),
        })
    }

    pub fn isel(&self, plan: &SelectionPlan) -> Dataset {
        Dataset {
            coords: self
                .coords
                .iter()
                .map(|(k, v)| (k.clone(), v.isel(plan)))
                .collect(),
            data_vars: self
                .data_vars
                .iter()
                .map(|(k, v)| (k.clone(), v.isel(plan)))
                .collect(),
            attrs: self.attrs.clone(),
        }
    }

    /// Apply a subset: variable selection, then lat/lon/time picks.
    pub fn subset(&self, subset: &Subset) -> DatasetResult<Dataset> {
        let selected = self.select_vars(&subset.variables)?;

        let lat = self.float_coord(LAT)?;
        let lon = self.float_coord(LON)?;
        let time = self.coords.get(TIME).and_then(|c| c.values.as_times());
        let plan = subset.plan(lat, lon, time)?;

        Ok(selected.isel(&plan))
    }

    fn float_coord(&self, name: &str) -> DatasetResult<&[f64]> {
        self.coords
            .get(name)
            .and_then(|c| c.values.as_floats())
            .ok_or_else(|| DatasetError::MissingCoordinate(name.to_string()))
    }

    pub fn to_dict(&self) -> Value {
        let section = |vars: &BTreeMap<String, Variable>| -> Value {
            Value::Object(
                vars.iter()
                    .map(|(k, v)| (k.clone(), v.to_dict()))
                    .collect(),
            )
        };
        json!({
            "coords": section(&self.coords),
            "attrs": self.attrs,
            "dims": self.dims(),
            "data_vars": section(&self.data_vars),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::AxisSelector;

    fn grid() -> Dataset {
        // time x lat x lon = 2 x 3 x 4, value = t*100 + y*10 + x
        let mut data = Vec::new();
        for t in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    data.push((t * 100 + y * 10 + x) as f64);
                }
            }
        }
        let dims = vec!["time".to_string(), "lat".to_string(), "lon".to_string()];
        let no2 = Variable::new(dims, vec![2, 3, 4], Values::Float(data))
            .unwrap()
            .with_attr("units", "mol mol-1");
        let times = ["2025-02-03T00:30:00", "2025-02-04T00:30:00"]
            .iter()
            .map(|s| NaiveDateTime::parse_from_str(s, ISO_FORMAT).unwrap())
            .collect();

        Dataset::new()
            .with_coord("time", Variable::coordinate("time", Values::Time(times)))
            .with_coord("lat", Variable::coordinate("lat", Values::Float(vec![10.0, 20.0, 30.0])))
            .with_coord(
                "lon",
                Variable::coordinate("lon", Values::Float(vec![0.0, 1.0, 2.0, 3.0])),
            )
            .with_var("NO2", no2)
            .with_attr("title", "test")
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = Variable::new(vec!["x".to_string()], vec![3], Values::Float(vec![1.0]));
        assert!(matches!(err, Err(DatasetError::InvalidFormat(_))));
    }

    #[test]
    fn test_point_subset_drops_axes() {
        let ds = grid();
        let subset = Subset::point(21.0, 2.2, vec!["NO2".to_string()]);
        let out = ds.subset(&subset).unwrap();

        let no2 = &out.data_vars["NO2"];
        assert_eq!(no2.dims(), ["time"]);
        assert_eq!(no2.values(), &Values::Float(vec![12.0, 112.0]));
        assert!(out.coords["lat"].is_scalar());
        assert_eq!(out.coords["lat"].data_json(), json!(20.0));

        let dims = out.dims();
        assert_eq!(dims.get("time"), Some(&2));
        assert!(!dims.contains_key("lat"));
    }

    #[test]
    fn test_range_subset_keeps_axes() {
        let ds = grid();
        let subset = Subset {
            lat: AxisSelector::Range(30.0, 15.0),
            lon: AxisSelector::Range(1.0, 2.0),
            time: None,
            variables: vec!["NO2".to_string()],
        };
        let out = ds.subset(&subset).unwrap();
        let no2 = &out.data_vars["NO2"];
        assert_eq!(no2.shape(), [2, 2, 2]);
        assert_eq!(
            no2.data_json(),
            json!([[[11.0, 12.0], [21.0, 22.0]], [[111.0, 112.0], [121.0, 122.0]]])
        );
    }

    #[test]
    fn test_missing_variable() {
        let ds = grid();
        let err = ds
            .subset(&Subset::point(0.0, 0.0, vec!["XYZ".to_string()]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::MissingVariable(ref v) if v == "XYZ"));
    }

    #[test]
    fn test_to_dict_layout() {
        let ds = grid();
        let out = ds
            .subset(&Subset::point(10.0, 0.0, vec!["NO2".to_string()]))
            .unwrap();
        let dict = out.to_dict();

        assert_eq!(dict["attrs"]["title"], "test");
        assert_eq!(dict["dims"], json!({"time": 2}));
        assert_eq!(dict["data_vars"]["NO2"]["dims"], json!(["time"]));
        assert_eq!(dict["data_vars"]["NO2"]["attrs"]["units"], "mol mol-1");
        assert_eq!(dict["data_vars"]["NO2"]["data"], json!([0.0, 100.0]));
        assert_eq!(
            dict["coords"]["time"]["data"],
            json!(["2025-02-03T00:30:00", "2025-02-04T00:30:00"])
        );
        assert_eq!(dict["coords"]["lon"]["dims"], json!([]));
    }

    #[test]
    fn test_nan_serializes_as_null() {
        let var = Variable::coordinate("x", Values::Float(vec![1.0, f64::NAN]));
        assert_eq!(var.data_json(), json!([1.0, null]));
    }

    #[test]
    fn test_select_vars_drops_unrelated_coords() {
        let ds = grid().with_coord(
            "lev",
            Variable::coordinate("lev", Values::Float(vec![1.0, 2.0])),
        );
        let out = ds.select_vars(&["NO2"]).unwrap();
        assert!(out.coords.contains_key("lat"));
        assert!(!out.coords.contains_key("lev"));
    }
}
