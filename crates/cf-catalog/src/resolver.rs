//! Map a validated triple onto files in the dataset directory.
//!
//! Filenames follow `<vendor>.<version>.<collection>.<group>_*<level>*`,
//! e.g. `GEOS-CF.v01.rpl.aqc_tavg_1hr_g1440x721_v1.20250203_0030z.nc4`.
//! The directory is listed on every call; nothing is cached.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{Catalog, DatasetTriple};
use crate::errors::ResolveResult;

/// Vendor and version prefix of dataset filenames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNaming {
    #[serde(default = "default_vendor")]
    pub vendor: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_vendor() -> String {
    "GEOS-CF".to_string()
}

fn default_version() -> String {
    "v01".to_string()
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            vendor: default_vendor(),
            version: default_version(),
        }
    }
}

impl FileNaming {
    /// Filename glob for a triple (without directory).
    pub fn pattern(&self, triple: &DatasetTriple) -> String {
        format!(
            "{}.{}.{}.{}_*{}*",
            glob::Pattern::escape(&self.vendor),
            glob::Pattern::escape(&self.version),
            glob::Pattern::escape(&triple.collection),
            glob::Pattern::escape(&triple.group),
            glob::Pattern::escape(&triple.level),
        )
    }
}

/// Which entry of a sorted file set is canonical.
///
/// Names embed an ISO-like timestamp, so ascending order is earliest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSelection {
    #[default]
    Earliest,
    Latest,
}

impl FileSelection {
    pub fn select<'a>(&self, files: &'a [PathBuf]) -> Option<&'a PathBuf> {
        match self {
            FileSelection::Earliest => files.first(),
            FileSelection::Latest => files.last(),
        }
    }
}

const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Lists dataset files for catalog triples.
#[derive(Debug, Clone)]
pub struct FileResolver {
    dataset_dir: PathBuf,
    naming: FileNaming,
}

impl FileResolver {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            naming: FileNaming::default(),
        }
    }

    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn dataset_dir(&self) -> &Path {
        &self.dataset_dir
    }

    /// Complete missing axes from the catalog, then list matching files.
    pub fn resolve(
        &self,
        catalog: &Catalog,
        collection: Option<&str>,
        group: Option<&str>,
        level: Option<&str>,
    ) -> ResolveResult<Vec<PathBuf>> {
        let triple = catalog.resolve_triple(collection, group, level)?;
        self.list(&triple)
    }

    /// All files matching a triple, sorted ascending by name.
    ///
    /// Only direct entries of the dataset directory are considered; a
    /// triple value containing a path separator matches nothing. No match
    /// gives an empty list.
    pub fn list(&self, triple: &DatasetTriple) -> ResolveResult<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(&self.naming.pattern(triple))?;
        debug!(
            dir = %self.dataset_dir.display(),
            pattern = %pattern,
            "Listing dataset files"
        );

        let entries = match std::fs::read_dir(&self.dataset_dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(
                        "Cannot list dataset directory {}: {}",
                        self.dataset_dir.display(),
                        e
                    );
                }
                return Ok(Vec::new());
            }
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable dataset entry: {}", e);
                    continue;
                }
            };
            let matched = entry
                .file_name()
                .to_str()
                .is_some_and(|name| pattern.matches_with(name, MATCH_OPTIONS));
            let path = entry.path();
            if matched && path.is_file() {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Canonical file for a triple under the given selection, if any.
    pub fn select(
        &self,
        triple: &DatasetTriple,
        selection: FileSelection,
    ) -> ResolveResult<Option<PathBuf>> {
        let files = self.list(triple)?;
        Ok(selection.select(&files).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_layout() {
        let naming = FileNaming::default();
        let triple = DatasetTriple::new("rpl", "aqc", "v1");
        assert_eq!(naming.pattern(&triple), "GEOS-CF.v01.rpl.aqc_*v1*");
    }

    #[test]
    fn test_pattern_escapes_glob_metacharacters() {
        let naming = FileNaming {
            vendor: "GEOS[CF]".to_string(),
            version: "v01".to_string(),
        };
        let triple = DatasetTriple::new("rpl", "aqc", "v1");
        assert_eq!(naming.pattern(&triple), "GEOS[[]CF[]].v01.rpl.aqc_*v1*");
    }

    #[test]
    fn test_selection() {
        let files = vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")];
        assert_eq!(FileSelection::Earliest.select(&files), Some(&files[0]));
        assert_eq!(FileSelection::Latest.select(&files), Some(&files[2]));
        assert_eq!(FileSelection::Latest.select(&[]), None);
    }
}
