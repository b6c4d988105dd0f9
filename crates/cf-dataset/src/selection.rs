//! Point/range selection on coordinate axes.
//!
//! A selector with one value picks the nearest grid cell and drops the axis;
//! two values select every cell whose coordinate lies in the closed interval
//! between them, in either order.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{DatasetError, DatasetResult};

/// Latitude dimension and coordinate name.
pub const LAT: &str = "lat";
/// Longitude dimension and coordinate name.
pub const LON: &str = "lon";
/// Time dimension and coordinate name.
pub const TIME: &str = "time";

/// Selection along one numeric axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisSelector {
    Nearest(f64),
    Range(f64, f64),
}

impl AxisSelector {
    /// Build from one or two query values.
    pub fn from_values(axis: &str, values: &[f64]) -> DatasetResult<Self> {
        if let Some(v) = values.iter().find(|v| !v.is_finite()) {
            return Err(DatasetError::InvalidSelection(format!(
                "{} value {} is not finite",
                axis, v
            )));
        }
        match values {
            [v] => Ok(AxisSelector::Nearest(*v)),
            [a, b] => Ok(AxisSelector::Range(*a, *b)),
            _ => Err(DatasetError::InvalidSelection(format!(
                "{} takes one or two values, got {}",
                axis,
                values.len()
            ))),
        }
    }

    /// Indices of `coord` chosen by this selector.
    pub fn pick(&self, axis: &str, coord: &[f64]) -> DatasetResult<AxisPick> {
        match *self {
            AxisSelector::Nearest(target) => nearest_index(coord, target)
                .map(AxisPick::Index)
                .ok_or_else(|| {
                    DatasetError::InvalidSelection(format!("{} axis has no valid values", axis))
                }),
            AxisSelector::Range(a, b) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                Ok(AxisPick::Indices(
                    coord
                        .iter()
                        .enumerate()
                        .filter(|&(_, &c)| c >= lo && c <= hi)
                        .map(|(i, _)| i)
                        .collect(),
                ))
            }
        }
    }
}

/// Index of the coordinate closest to `target`. Ties keep the first.
pub fn nearest_index(coord: &[f64], target: f64) -> Option<usize> {
    coord
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_finite())
        .fold(None, |best: Option<(usize, f64)>, (i, &c)| {
            let dist = (c - target).abs();
            match best {
                Some((_, d)) if d <= dist => best,
                _ => Some((i, dist)),
            }
        })
        .map(|(i, _)| i)
}

/// Inclusive day range on the time axis; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl TimeRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// First instant of the start day.
    pub fn lower(&self) -> Option<NaiveDateTime> {
        self.start.map(|d| d.and_time(NaiveTime::MIN))
    }

    /// Last millisecond of the end day.
    pub fn upper(&self) -> Option<NaiveDateTime> {
        self.end
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
    }

    pub fn contains(&self, t: &NaiveDateTime) -> bool {
        self.lower().map_or(true, |lo| *t >= lo) && self.upper().map_or(true, |hi| *t <= hi)
    }

    pub fn pick(&self, times: &[NaiveDateTime]) -> AxisPick {
        AxisPick::Indices(
            times
                .iter()
                .enumerate()
                .filter(|(_, t)| self.contains(t))
                .map(|(i, _)| i)
                .collect(),
        )
    }
}

/// What to keep along one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisPick {
    /// A single index; the dimension is dropped.
    Index(usize),
    /// Ascending indices; the dimension is kept with this length.
    Indices(Vec<usize>),
}

impl AxisPick {
    pub fn indices(&self) -> &[usize] {
        match self {
            AxisPick::Index(i) => std::slice::from_ref(i),
            AxisPick::Indices(v) => v,
        }
    }

    pub fn keeps_dim(&self) -> bool {
        matches!(self, AxisPick::Indices(_))
    }

    /// Contiguous `(start, count)` window covering every picked index.
    pub fn window(&self) -> Option<(usize, usize)> {
        let idx = self.indices();
        let first = *idx.first()?;
        let last = *idx.last()?;
        Some((first, last - first + 1))
    }
}

/// Picks keyed by dimension name. Dimensions not named are kept whole.
pub type SelectionPlan = BTreeMap<String, AxisPick>;

/// A request for part of a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Subset {
    pub lat: AxisSelector,
    pub lon: AxisSelector,
    pub time: Option<TimeRange>,
    pub variables: Vec<String>,
}

impl Subset {
    /// Nearest-point subset of the given variables.
    pub fn point(lat: f64, lon: f64, variables: Vec<String>) -> Self {
        Self {
            lat: AxisSelector::Nearest(lat),
            lon: AxisSelector::Nearest(lon),
            time: None,
            variables,
        }
    }

    pub fn with_time(mut self, range: TimeRange) -> Self {
        self.time = (!range.is_open()).then_some(range);
        self
    }

    /// Resolve selectors against coordinate values.
    ///
    /// The time range is ignored when the dataset has no time axis.
    pub fn plan(
        &self,
        lat: &[f64],
        lon: &[f64],
        time: Option<&[NaiveDateTime]>,
    ) -> DatasetResult<SelectionPlan> {
        let mut plan = SelectionPlan::new();
        plan.insert(LAT.to_string(), self.lat.pick(LAT, lat)?);
        plan.insert(LON.to_string(), self.lon.pick(LON, lon)?);
        if let (Some(range), Some(times)) = (&self.time, time) {
            plan.insert(TIME.to_string(), range.pick(times));
        }
        Ok(plan)
    }
}
