//! Application state for the query service.

use std::sync::Arc;

use anyhow::Result;
use cf_catalog::{Catalog, FileResolver, LevelRestriction, Validator};
use cf_dataset::DatasetReader;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::config::ServiceConfig;

/// Shared, read-only application state.
pub struct AppState {
    /// Legality table for collections, groups, levels and products.
    pub catalog: Catalog,

    /// File lookup in the dataset directory.
    pub resolver: FileResolver,

    /// Dataset engine used to open and subset files.
    pub reader: Arc<dyn DatasetReader>,

    /// Level gate of the `/data` route.
    pub legacy_levels: LevelRestriction,

    pub config: ServiceConfig,

    /// Renders `/metrics` when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build state from configuration, loading the catalog it names.
    pub fn new(config: ServiceConfig, reader: Arc<dyn DatasetReader>) -> Result<Self> {
        let catalog = config.catalog()?;
        Ok(Self::with_catalog(config, catalog, reader))
    }

    pub fn with_catalog(
        config: ServiceConfig,
        catalog: Catalog,
        reader: Arc<dyn DatasetReader>,
    ) -> Self {
        let resolver =
            FileResolver::new(&config.dataset_dir).with_naming(config.file_naming.clone());
        Self {
            catalog,
            resolver,
            reader,
            legacy_levels: LevelRestriction::default(),
            config,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }

    /// Validator over the catalog using the configured date rule.
    pub fn validator(&self) -> Validator<'_> {
        Validator::new(&self.catalog).with_date_rule(self.config.date_range_rule)
    }
}
