//! Service configuration loading and types.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cf_catalog::{Catalog, DateRangeRule, FileNaming, FileSelection};
use serde::{Deserialize, Serialize};

/// Default location of the service configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/cfapi.yaml";

/// Service configuration loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory holding the dataset files. Not recursed.
    pub dataset_dir: PathBuf,

    /// Vendor/version prefix of dataset file names.
    pub file_naming: FileNaming,

    /// Which of several matching files is served.
    pub file_selection: FileSelection,

    /// How start/end dates are gated by collection.
    pub date_range_rule: DateRangeRule,

    /// Optional YAML catalog replacing the built-in GEOS-CF one.
    pub catalog_file: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("./dataset_files"),
            file_naming: FileNaming::default(),
            file_selection: FileSelection::default(),
            date_range_rule: DateRangeRule::default(),
            catalog_file: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file.
    ///
    /// A missing file is not an error: defaults are used and a warning logged.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} does not exist, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;

        tracing::info!(
            dataset_dir = %config.dataset_dir.display(),
            file_selection = ?config.file_selection,
            date_range_rule = ?config.date_range_rule,
            "Loaded service config from {:?}",
            path
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit rather than a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// The catalog this configuration selects.
    pub fn catalog(&self) -> Result<Catalog> {
        match &self.catalog_file {
            Some(path) => {
                let catalog = Catalog::from_yaml_file(path)
                    .with_context(|| format!("Failed to load catalog: {:?}", path))?;
                tracing::info!(
                    "Loaded catalog with {} collections from {:?}",
                    catalog.collections().len(),
                    path
                );
                Ok(catalog)
            }
            None => Ok(Catalog::geos_cf().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.dataset_dir, PathBuf::from("./dataset_files"));
        assert_eq!(config.file_naming.vendor, "GEOS-CF");
        assert_eq!(config.file_naming.version, "v01");
        assert_eq!(config.file_selection, FileSelection::Earliest);
        assert_eq!(config.date_range_rule, DateRangeRule::ReplayOnly);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
dataset_dir: /data/geos-cf
file_selection: latest
file_naming:
  version: v02
"#;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.dataset_dir, PathBuf::from("/data/geos-cf"));
        assert_eq!(config.file_selection, FileSelection::Latest);
        assert_eq!(config.file_naming.vendor, "GEOS-CF");
        assert_eq!(config.file_naming.version, "v02");
        assert_eq!(config.date_range_rule, DateRangeRule::ReplayOnly);
    }

    #[test]
    fn test_parse_date_rule() {
        let config = ServiceConfig::from_yaml_str("date_range_rule: legacy").unwrap();
        assert_eq!(config.date_range_rule, DateRangeRule::Legacy);
        assert!(ServiceConfig::from_yaml_str("date_range_rule: sometimes").is_err());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            ServiceConfig::from_yaml_str("").unwrap(),
            ServiceConfig::default()
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServiceConfig::load(Path::new("/nonexistent/cfapi.yaml")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rpl:\n  aqc:\n    v1: [NO2, O3, PM25]").unwrap();

        let config = ServiceConfig {
            catalog_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.collection_names(), ["rpl"]);
        assert_eq!(catalog.default_collection(), Some("rpl"));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let config = ServiceConfig::load(&root.join(DEFAULT_CONFIG_PATH)).unwrap();
        assert_eq!(config, ServiceConfig::default());

        let config = ServiceConfig {
            catalog_file: Some(root.join("config/catalog.yaml")),
            ..Default::default()
        };
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.default_collection(), Some("rpl"));
        assert_eq!(catalog.level_names("rpl", "met"), ["x1", "p23"]);
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = ServiceConfig::default().catalog().unwrap();
        assert_eq!(catalog.default_collection(), Some("fcst"));
    }
}
