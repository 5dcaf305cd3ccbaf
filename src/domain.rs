use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PrepError;

/// Value of a dataset entry that marks a property as not computed.
pub const MISSING_SENTINEL: &str = "na";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub url: String,
    /// Name of the JSON entry inside the archive; the cached archive is `<json_tag>.zip`.
    pub json_tag: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl DatasetInfo {
    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.json_tag)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<String, DatasetInfo>,
}

impl Catalog {
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            "dft_3d".to_string(),
            DatasetInfo {
                url: "https://figshare.com/ndownloader/files/38521619".to_string(),
                json_tag: "jdft_3d-12-12-2022.json".to_string(),
                description: Some(
                    "3D materials properties in JARVIS-DFT computed with OptB88vdW and TBmBJ"
                        .to_string(),
                ),
            },
        );
        entries.insert(
            "dft_2d".to_string(),
            DatasetInfo {
                url: "https://figshare.com/ndownloader/files/38521736".to_string(),
                json_tag: "d2-12-12-2022.json".to_string(),
                description: Some("2D materials properties in JARVIS-DFT".to_string()),
            },
        );
        Self { entries }
    }

    pub fn insert(&mut self, name: impl Into<String>, info: DatasetInfo) {
        self.entries.insert(name.into(), info);
    }

    pub fn extend(&mut self, other: BTreeMap<String, DatasetInfo>) {
        self.entries.extend(other);
    }

    pub fn get(&self, name: &str) -> Result<&DatasetInfo, PrepError> {
        self.entries
            .get(name.trim())
            .ok_or_else(|| PrepError::UnknownDataset(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DatasetInfo)> {
        self.entries.iter().map(|(name, info)| (name.as_str(), info))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Available(f64),
    Missing,
}

impl PropertyValue {
    /// Classifies a raw property value. Returns `None` for anything that is neither a
    /// number nor the missing sentinel.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(PropertyValue::Available),
            Value::String(text) if text == MISSING_SENTINEL => Some(PropertyValue::Missing),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Available(value) => write!(f, "{value:.6}"),
            PropertyValue::Missing => write!(f, "{MISSING_SENTINEL}"),
        }
    }
}
