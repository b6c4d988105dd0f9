//! The collection → group → level → products legality table.
//!
//! Entries keep their declaration order. That order decides which group and
//! level a request gets when it leaves them out, so it is exposed through
//! [`Catalog::default_group`] and [`Catalog::default_level`] rather than
//! left to iteration order.

use std::path::Path;

use once_cell::sync::Lazy;
use serde_yaml::Value;

use crate::errors::{CatalogLoadError, ValidationError, ValidationResult};

/// Collection that carries the replay archive (the only one with dates).
pub const REPLAY_COLLECTION: &str = "rpl";

/// Collection used when a request names none.
pub const DEFAULT_COLLECTION: &str = "fcst";

/// A leaf of the catalog: one level and the products it exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEntry {
    pub name: String,
    pub products: Vec<String>,
}

/// A group and its levels, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub name: String,
    pub levels: Vec<LevelEntry>,
}

impl GroupEntry {
    pub fn level(&self, name: &str) -> Option<&LevelEntry> {
        self.levels.iter().find(|l| l.name == name)
    }

    pub fn level_names(&self) -> Vec<String> {
        self.levels.iter().map(|l| l.name.clone()).collect()
    }
}

/// A collection and its groups, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionEntry {
    pub name: String,
    pub groups: Vec<GroupEntry>,
}

impl CollectionEntry {
    pub fn group(&self, name: &str) -> Option<&GroupEntry> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }
}

/// A fully named (collection, group, level) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetTriple {
    pub collection: String,
    pub group: String,
    pub level: String,
}

impl DatasetTriple {
    pub fn new(
        collection: impl Into<String>,
        group: impl Into<String>,
        level: impl Into<String>,
    ) -> Self {
        Self {
            collection: collection.into(),
            group: group.into(),
            level: level.into(),
        }
    }
}

impl std::fmt::Display for DatasetTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.collection, self.group, self.level)
    }
}

/// Immutable legality table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    collections: Vec<CollectionEntry>,
    default_collection: Option<String>,
}

static GEOS_CF: Lazy<Catalog> = Lazy::new(build_geos_cf);

impl Catalog {
    /// Start an empty declaration.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The built-in GEOS-CF catalog, shared for the life of the process.
    pub fn geos_cf() -> &'static Catalog {
        &GEOS_CF
    }

    /// Load a catalog from a YAML file of nested mappings:
    ///
    /// ```yaml
    /// rpl:
    ///   aqc:
    ///     v1: [NO2, O3, PM25]
    /// ```
    ///
    /// An optional top-level `default_collection: <name>` key picks the
    /// collection used when a request names none.
    pub fn from_yaml_file(path: &Path) -> Result<Self, CatalogLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse a catalog from YAML text. See [`Catalog::from_yaml_file`].
    pub fn from_yaml_str(content: &str) -> Result<Self, CatalogLoadError> {
        let root: Value = serde_yaml::from_str(content)?;
        let Value::Mapping(collections) = root else {
            return Err(CatalogLoadError::Layout(
                "top level must be a mapping of collections".to_string(),
            ));
        };

        let mut builder = Catalog::builder();
        for (collection, groups) in &collections {
            let collection = yaml_key(collection)?;
            if collection == "default_collection" {
                let name = groups.as_str().ok_or_else(|| {
                    CatalogLoadError::Layout("default_collection must be a string".to_string())
                })?;
                builder = builder.default_collection(name);
                continue;
            }
            let Value::Mapping(groups) = groups else {
                return Err(CatalogLoadError::Layout(format!(
                    "collection '{}' must map groups to levels",
                    collection
                )));
            };
            for (group, levels) in groups {
                let group = yaml_key(group)?;
                let Value::Mapping(levels) = levels else {
                    return Err(CatalogLoadError::Layout(format!(
                        "group '{}/{}' must map levels to products",
                        collection, group
                    )));
                };
                for (level, products) in levels {
                    let level = yaml_key(level)?;
                    let products = products
                        .as_sequence()
                        .ok_or_else(|| {
                            CatalogLoadError::Layout(format!(
                                "level '{}/{}/{}' must list its products",
                                collection, group, level
                            ))
                        })?
                        .iter()
                        .map(yaml_key)
                        .collect::<Result<Vec<_>, _>>()?;
                    builder = builder.level(&collection, &group, &level, products);
                }
            }
        }

        Ok(builder.build())
    }

    pub fn collections(&self) -> &[CollectionEntry] {
        &self.collections
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn group(&self, collection: &str, group: &str) -> Option<&GroupEntry> {
        self.collection(collection)?.group(group)
    }

    pub fn level(&self, collection: &str, group: &str, level: &str) -> Option<&LevelEntry> {
        self.group(collection, group)?.level(level)
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.iter().map(|c| c.name.clone()).collect()
    }

    pub fn group_names(&self, collection: &str) -> Vec<String> {
        self.collection(collection)
            .map(CollectionEntry::group_names)
            .unwrap_or_default()
    }

    pub fn level_names(&self, collection: &str, group: &str) -> Vec<String> {
        self.group(collection, group)
            .map(GroupEntry::level_names)
            .unwrap_or_default()
    }

    /// Products declared for a triple, if the triple is legal.
    pub fn products(&self, triple: &DatasetTriple) -> Option<&[String]> {
        self.level(&triple.collection, &triple.group, &triple.level)
            .map(|l| l.products.as_slice())
    }

    pub fn contains(&self, triple: &DatasetTriple) -> bool {
        self.products(triple).is_some()
    }

    /// Collection used when a request leaves it out: the explicitly declared
    /// default, otherwise the first collection.
    pub fn default_collection(&self) -> Option<&str> {
        self.default_collection
            .as_deref()
            .or_else(|| self.collections.first().map(|c| c.name.as_str()))
    }

    /// First group declared under a collection.
    pub fn default_group(&self, collection: &str) -> Option<&str> {
        self.collection(collection)?
            .groups
            .first()
            .map(|g| g.name.as_str())
    }

    /// First level declared under a (collection, group).
    pub fn default_level(&self, collection: &str, group: &str) -> Option<&str> {
        self.group(collection, group)?
            .levels
            .first()
            .map(|l| l.name.as_str())
    }

    /// Every legal triple, in declaration order.
    pub fn triples(&self) -> impl Iterator<Item = DatasetTriple> + '_ {
        self.collections.iter().flat_map(|c| {
            c.groups.iter().flat_map(move |g| {
                g.levels
                    .iter()
                    .map(move |l| DatasetTriple::new(&c.name, &g.name, &l.name))
            })
        })
    }

    /// Complete a partially specified request into a legal triple.
    ///
    /// Missing axes take the catalog defaults; named axes must exist.
    pub fn resolve_triple(
        &self,
        collection: Option<&str>,
        group: Option<&str>,
        level: Option<&str>,
    ) -> ValidationResult<DatasetTriple> {
        let collection_name = collection
            .or_else(|| self.default_collection())
            .unwrap_or(DEFAULT_COLLECTION);
        let entry = self
            .collection(collection_name)
            .ok_or_else(|| ValidationError::UnknownCollection {
                requested: collection_name.to_string(),
                allowed: self.collection_names(),
            })?;

        let group_entry = match group {
            Some(name) => entry.group(name),
            None => entry.groups.first(),
        }
        .ok_or_else(|| ValidationError::UnknownGroup {
            collection: entry.name.clone(),
            requested: group.unwrap_or_default().to_string(),
            allowed: entry.group_names(),
        })?;

        let level_entry = match level {
            Some(name) => group_entry.level(name),
            None => group_entry.levels.first(),
        }
        .ok_or_else(|| ValidationError::UnknownLevel {
            collection: entry.name.clone(),
            group: group_entry.name.clone(),
            requested: level.unwrap_or_default().to_string(),
            allowed: group_entry.level_names(),
        })?;

        Ok(DatasetTriple::new(
            &entry.name,
            &group_entry.name,
            &level_entry.name,
        ))
    }
}

fn yaml_key(value: &Value) -> Result<String, CatalogLoadError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(CatalogLoadError::Layout(format!(
            "expected a name, found {:?}",
            other
        ))),
    }
}

/// Order-preserving catalog declaration.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    collections: Vec<CollectionEntry>,
    default_collection: Option<String>,
}

impl CatalogBuilder {
    /// Declare the collection used when a request names none.
    pub fn default_collection(mut self, name: &str) -> Self {
        self.default_collection = Some(name.to_string());
        self
    }

    /// Declare a leaf. Parents are created on first mention; re-declaring a
    /// level replaces its products without moving it.
    pub fn level<I, S>(mut self, collection: &str, group: &str, level: &str, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let products: Vec<String> = products.into_iter().map(Into::into).collect();

        let ci = match self.collections.iter().position(|c| c.name == collection) {
            Some(i) => i,
            None => {
                self.collections.push(CollectionEntry {
                    name: collection.to_string(),
                    groups: Vec::new(),
                });
                self.collections.len() - 1
            }
        };
        let c = &mut self.collections[ci];

        let gi = match c.groups.iter().position(|g| g.name == group) {
            Some(i) => i,
            None => {
                c.groups.push(GroupEntry {
                    name: group.to_string(),
                    levels: Vec::new(),
                });
                c.groups.len() - 1
            }
        };
        let g = &mut c.groups[gi];

        match g.levels.iter_mut().find(|l| l.name == level) {
            Some(existing) => existing.products = products,
            None => g.levels.push(LevelEntry {
                name: level.to_string(),
                products,
            }),
        }

        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            collections: self.collections,
            default_collection: self.default_collection,
        }
    }
}

fn build_geos_cf() -> Catalog {
    const AQC: [&str; 6] = ["CO", "NO2", "O3", "PM25_RH35_GCC", "PM25_RH35_GOC", "SO2"];
    const CHM_V1: [&str; 8] = ["CO", "HCHO", "NO", "NO2", "O3", "PM25", "SO2", "NH3"];
    const CHM_V72: [&str; 5] = ["CO", "NO", "NO2", "O3", "SO2"];
    const CHM_P23: [&str; 4] = ["CO", "NO2", "O3", "SO2"];
    const MET_X1: [&str; 8] = ["CLDTT", "PS", "Q10M", "SLP", "T10M", "TPREC", "U10M", "V10M"];
    const MET_P23: [&str; 5] = ["H", "Q", "RH", "T", "U"];
    const XGC_V1: [&str; 4] = ["AODC_SULFATE", "AODC_DUST", "AODC_SALT", "TOTCOL_NO2"];

    Catalog::builder()
        .default_collection(DEFAULT_COLLECTION)
        .level("fcst", "chm", "v1", CHM_V1)
        .level("fcst", "chm", "v72", CHM_V72)
        .level("fcst", "chm", "p23", CHM_P23)
        .level("fcst", "met", "x1", MET_X1)
        .level("fcst", "met", "p23", MET_P23)
        .level("fcst", "aqc", "v1", AQC)
        .level("fcst", "xgc", "v1", XGC_V1)
        .level("rpl", "aqc", "v1", AQC)
        .level("rpl", "chm", "v1", CHM_V1)
        .level("rpl", "chm", "v72", CHM_V72)
        .level("rpl", "met", "x1", MET_X1)
        .level("rpl", "met", "p23", MET_P23)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Catalog {
        Catalog::builder()
            .level("rpl", "aqc", "v1", ["NO2", "O3", "PM25"])
            .level("rpl", "met", "x1", ["T10M"])
            .level("rpl", "met", "p23", ["T"])
            .build()
    }

    #[test]
    fn test_builder_preserves_declaration_order() {
        let catalog = Catalog::builder()
            .level("b", "z", "2", ["X"])
            .level("a", "y", "1", ["X"])
            .level("b", "a", "9", ["X"])
            .build();

        assert_eq!(catalog.collection_names(), ["b", "a"]);
        assert_eq!(catalog.group_names("b"), ["z", "a"]);
    }

    #[test]
    fn test_builder_redeclare_replaces_in_place() {
        let catalog = Catalog::builder()
            .level("rpl", "aqc", "v1", ["NO2"])
            .level("rpl", "aqc", "v2", ["O3"])
            .level("rpl", "aqc", "v1", ["CO"])
            .build();

        assert_eq!(catalog.level_names("rpl", "aqc"), ["v1", "v2"]);
        let triple = DatasetTriple::new("rpl", "aqc", "v1");
        assert_eq!(catalog.products(&triple).unwrap(), ["CO"]);
    }

    #[test]
    fn test_defaults_follow_first_declared() {
        let catalog = small();
        assert_eq!(catalog.default_collection(), Some("rpl"));
        assert_eq!(catalog.default_group("rpl"), Some("aqc"));
        assert_eq!(catalog.default_level("rpl", "met"), Some("x1"));
        assert_eq!(catalog.default_group("nope"), None);
    }

    #[test]
    fn test_geos_cf_defaults() {
        let catalog = Catalog::geos_cf();
        assert_eq!(catalog.default_collection(), Some("fcst"));
        assert_eq!(catalog.default_group("fcst"), Some("chm"));
        assert_eq!(catalog.default_group("rpl"), Some("aqc"));
        assert_eq!(catalog.default_level("fcst", "met"), Some("x1"));
    }

    #[test]
    fn test_resolve_triple_with_defaults() {
        let catalog = small();
        let triple = catalog.resolve_triple(Some("rpl"), None, None).unwrap();
        assert_eq!(triple, DatasetTriple::new("rpl", "aqc", "v1"));

        let triple = catalog.resolve_triple(None, Some("met"), None).unwrap();
        assert_eq!(triple, DatasetTriple::new("rpl", "met", "x1"));
    }

    #[test]
    fn test_resolve_triple_unknown_level() {
        let catalog = small();
        let err = catalog
            .resolve_triple(Some("rpl"), Some("met"), Some("v72"))
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownLevel {
                collection: "rpl".to_string(),
                group: "met".to_string(),
                requested: "v72".to_string(),
                allowed: vec!["x1".to_string(), "p23".to_string()],
            }
        );
    }

    #[test]
    fn test_triples_enumerates_every_leaf() {
        let catalog = small();
        let triples: Vec<_> = catalog.triples().map(|t| t.to_string()).collect();
        assert_eq!(triples, ["rpl/aqc/v1", "rpl/met/x1", "rpl/met/p23"]);
        assert!(catalog.triples().all(|t| catalog.contains(&t)));
    }

    #[test]
    fn test_yaml_catalog_keeps_order() {
        let yaml = r#"
default_collection: fcst
rpl:
  aqc:
    v1: [NO2, O3, PM25]
fcst:
  met:
    x1: [T10M]
    p23: [T]
  chm:
    v1: [NO2]
"#;
        let catalog = Catalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.collection_names(), ["rpl", "fcst"]);
        assert_eq!(catalog.default_collection(), Some("fcst"));
        assert_eq!(catalog.group_names("fcst"), ["met", "chm"]);
        assert_eq!(catalog.default_level("fcst", "met"), Some("x1"));
    }

    #[test]
    fn test_yaml_catalog_rejects_bad_layout() {
        let err = Catalog::from_yaml_str("rpl: [a, b]").unwrap_err();
        assert!(matches!(err, CatalogLoadError::Layout(_)));

        let err = Catalog::from_yaml_str("rpl:\n  aqc:\n    v1: NO2\n").unwrap_err();
        assert!(err.to_string().contains("rpl/aqc/v1"));
    }
}
