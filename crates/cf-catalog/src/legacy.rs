//! Level restriction used by the first-generation `/data` route.
//!
//! That scheme only constrained the level axis of selected groups and fell
//! back to a fixed baseline dataset when group or level were left out.

use crate::catalog::{DatasetTriple, REPLAY_COLLECTION};
use crate::errors::{ValidationError, ValidationResult};

/// Per-group allowed levels plus a baseline (group, level).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRestriction {
    collection: String,
    restricted: Vec<(String, Vec<String>)>,
    baseline_group: String,
    baseline_level: String,
}

impl Default for LevelRestriction {
    /// `met` may only use `x1` or `p23`; the baseline is `rpl/aqc/v1`.
    fn default() -> Self {
        Self::new(REPLAY_COLLECTION, "aqc", "v1").restrict("met", ["x1", "p23"])
    }
}

impl LevelRestriction {
    pub fn new(collection: &str, baseline_group: &str, baseline_level: &str) -> Self {
        Self {
            collection: collection.to_string(),
            restricted: Vec::new(),
            baseline_group: baseline_group.to_string(),
            baseline_level: baseline_level.to_string(),
        }
    }

    /// Limit `group` to the given levels. The first one becomes its default.
    pub fn restrict<I, S>(mut self, group: &str, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels = levels.into_iter().map(Into::into).collect();
        match self.restricted.iter_mut().find(|(g, _)| g == group) {
            Some((_, existing)) => *existing = levels,
            None => self.restricted.push((group.to_string(), levels)),
        }
        self
    }

    pub fn allowed_levels(&self, group: &str) -> Option<&[String]> {
        self.restricted
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, levels)| levels.as_slice())
    }

    /// Groups this restriction knows about: the baseline, then restricted ones.
    pub fn group_names(&self) -> Vec<String> {
        let mut names = vec![self.baseline_group.clone()];
        for (group, _) in &self.restricted {
            if !names.contains(group) {
                names.push(group.clone());
            }
        }
        names
    }

    /// Fill in defaults and enforce the restriction.
    ///
    /// Values that could name a path (separators or `..`) are refused for
    /// every group.
    pub fn apply(&self, group: Option<&str>, level: Option<&str>) -> ValidationResult<DatasetTriple> {
        let group = group.unwrap_or(self.baseline_group.as_str());
        if !is_plain_key(group) {
            return Err(ValidationError::UnknownGroup {
                collection: self.collection.clone(),
                requested: group.to_string(),
                allowed: self.group_names(),
            });
        }
        if let Some(level) = level.filter(|l| !is_plain_key(l)) {
            return Err(ValidationError::UnknownLevel {
                collection: self.collection.clone(),
                group: group.to_string(),
                requested: level.to_string(),
                allowed: self.allowed_levels(group).map(<[String]>::to_vec).unwrap_or_default(),
            });
        }

        let level = match (self.allowed_levels(group), level) {
            (Some(allowed), Some(level)) => {
                if !allowed.iter().any(|l| l == level) {
                    return Err(ValidationError::UnknownLevel {
                        collection: self.collection.clone(),
                        group: group.to_string(),
                        requested: level.to_string(),
                        allowed: allowed.to_vec(),
                    });
                }
                level
            }
            (Some(allowed), None) => allowed
                .first()
                .map(String::as_str)
                .unwrap_or(self.baseline_level.as_str()),
            (None, Some(level)) => level,
            (None, None) => self.baseline_level.as_str(),
        };

        Ok(DatasetTriple::new(&self.collection, group, level))
    }
}

fn is_plain_key(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '\\']) && !value.contains("..")
}
