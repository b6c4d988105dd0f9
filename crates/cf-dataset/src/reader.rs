//! Dataset reader trait and the in-memory implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{DatasetError, DatasetResult};
use crate::model::Dataset;
use crate::selection::Subset;

/// Opens a dataset file and returns the requested subset.
///
/// Implementations must release the file before returning, on success and
/// on failure alike.
#[async_trait]
pub trait DatasetReader: Send + Sync {
    /// Read a subset of the file at `path`.
    ///
    /// # Errors
    /// * `MissingVariable` if any requested variable is not in the file
    /// * `MissingCoordinate` if the file has no lat/lon axes
    async fn read_subset(&self, path: &Path, subset: &Subset) -> DatasetResult<Dataset>;

    /// Short implementation name for logs.
    fn name(&self) -> &'static str;
}

/// Serves prebuilt datasets keyed by file name.
///
/// Only the final path component is used for lookup, so the same reader
/// works for any dataset directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    datasets: HashMap<String, Dataset>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, file_name: &str, dataset: Dataset) -> Self {
        self.datasets.insert(file_name.to_string(), dataset);
        self
    }

    pub fn insert(&mut self, file_name: &str, dataset: Dataset) {
        self.datasets.insert(file_name.to_string(), dataset);
    }

    fn lookup(&self, path: &Path) -> DatasetResult<&Dataset> {
        path.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| self.datasets.get(n))
            .ok_or_else(|| {
                DatasetError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no dataset registered for {}", path.display()),
                ))
            })
    }

    pub fn file_names(&self) -> Vec<PathBuf> {
        let mut names: Vec<PathBuf> = self.datasets.keys().map(PathBuf::from).collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DatasetReader for MemoryReader {
    async fn read_subset(&self, path: &Path, subset: &Subset) -> DatasetResult<Dataset> {
        let dataset = self.lookup(path)?;
        tracing::debug!(
            path = %path.display(),
            variables = ?subset.variables,
            "Subsetting in-memory dataset"
        );
        dataset.subset(subset)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Values, Variable};

    fn tiny() -> Dataset {
        let no2 = Variable::new(
            vec!["lat".to_string(), "lon".to_string()],
            vec![2, 2],
            Values::Float(vec![1.0, 2.0, 3.0, 4.0]),
        )
        .unwrap();
        Dataset::new()
            .with_coord("lat", Variable::coordinate("lat", Values::Float(vec![0.0, 1.0])))
            .with_coord("lon", Variable::coordinate("lon", Values::Float(vec![0.0, 1.0])))
            .with_var("NO2", no2)
    }

    #[tokio::test]
    async fn test_memory_reader_lookup_by_file_name() {
        let reader = MemoryReader::new().with_dataset("a.nc4", tiny());
        let subset = Subset::point(1.0, 0.0, vec!["NO2".to_string()]);

        let ds = reader
            .read_subset(Path::new("/any/dir/a.nc4"), &subset)
            .await
            .unwrap();
        assert_eq!(ds.data_vars["NO2"].values(), &Values::Float(vec![3.0]));
    }

    #[tokio::test]
    async fn test_memory_reader_unknown_file() {
        let reader = MemoryReader::new();
        let subset = Subset::point(0.0, 0.0, vec!["NO2".to_string()]);
        let err = reader
            .read_subset(Path::new("missing.nc4"), &subset)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
