use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{Catalog, DatasetInfo};
use crate::error::PrepError;
use crate::export::{DEFAULT_ID_PROP_FILE, ExportOptions};
use crate::store::DEFAULT_CACHE_DIR;

pub const DEFAULT_CONFIG_FILE: &str = "atomprep.json";
pub const DEFAULT_DATASET: &str = "dft_3d";
pub const DEFAULT_PROPERTY: &str = "optb88vdw_bandgap";
pub const DEFAULT_MAX_SAMPLES: usize = 50;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub property: Option<String>,
    #[serde(default)]
    pub max_samples: Option<usize>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub id_prop_file: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetInfo>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct PrepareOverrides {
    pub dataset: Option<String>,
    pub property: Option<String>,
    pub max_samples: Option<usize>,
    pub output_dir: Option<String>,
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub dataset: String,
    pub property: String,
    pub max_samples: usize,
    pub output_dir: Utf8PathBuf,
    pub id_prop_file: String,
    pub cache_dir: Utf8PathBuf,
    pub catalog: Catalog,
}

impl ResolvedConfig {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            property: self.property.clone(),
            max_samples: self.max_samples,
            output_dir: self.output_dir.clone(),
            id_prop_file: self.id_prop_file.clone(),
        }
    }

    pub fn apply(mut self, overrides: PrepareOverrides) -> Self {
        if let Some(dataset) = overrides.dataset {
            self.dataset = dataset;
        }
        if let Some(property) = overrides.property {
            self.property = property;
        }
        if let Some(max_samples) = overrides.max_samples {
            self.max_samples = max_samples;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = Utf8PathBuf::from(output_dir);
        }
        if let Some(cache_dir) = overrides.cache_dir {
            self.cache_dir = Utf8PathBuf::from(cache_dir);
        }
        self
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads an explicit config path, or `atomprep.json` in the working directory when it
    /// exists. Without either, built-in defaults apply.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PrepError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PrepError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PrepError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PrepError> {
        let schema_version = config.schema_version.unwrap_or(1);
        if schema_version != 1 {
            return Err(PrepError::ConfigParse(format!(
                "unsupported schema_version {schema_version}"
            )));
        }

        for (name, info) in &config.datasets {
            if info.url.trim().is_empty() || info.json_tag.trim().is_empty() {
                return Err(PrepError::ConfigParse(format!(
                    "dataset {name} needs both url and json_tag"
                )));
            }
        }
        let mut catalog = Catalog::builtin();
        catalog.extend(config.datasets);

        Ok(ResolvedConfig {
            schema_version,
            dataset: config.dataset.unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            property: config
                .property
                .unwrap_or_else(|| DEFAULT_PROPERTY.to_string()),
            max_samples: config.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES),
            output_dir: Utf8PathBuf::from(config.output_dir.unwrap_or_else(|| ".".to_string())),
            id_prop_file: config
                .id_prop_file
                .unwrap_or_else(|| DEFAULT_ID_PROP_FILE.to_string()),
            cache_dir: Utf8PathBuf::from(
                config
                    .cache_dir
                    .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
            ),
            catalog,
        })
    }
}
