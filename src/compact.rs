use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::description::{CHEMICAL_INFO, Describe, DescriptionInfo, STRUCTURE_INFO};
use crate::error::PrepError;
use crate::poscar::read_poscar;
use crate::structure::Structure;

const SECTIONS: [&str; 2] = [CHEMICAL_INFO, STRUCTURE_INFO];

/// Attribute-only description. The three fields always hold the same string; consumers
/// that expect several description columns read them independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactDescription {
    pub desc_1: String,
    pub desc_2: String,
    pub desc_3: String,
}

impl CompactDescription {
    pub fn new(text: String) -> Self {
        Self {
            desc_1: text.clone(),
            desc_2: text.clone(),
            desc_3: text,
        }
    }

    pub fn text(&self) -> &str {
        &self.desc_1
    }
}

pub fn flatten<D: Describe + ?Sized>(source: &D) -> CompactDescription {
    CompactDescription::new(flatten_info(&source.describe()))
}

/// Joins the attribute values of `chemical_info` then `structure_info` with `_`.
/// Sub-mappings render as `key:value` pairs joined by `,`. Whitespace is removed from
/// every part.
pub fn flatten_info(info: &DescriptionInfo) -> String {
    let mut parts = Vec::new();
    for name in SECTIONS {
        let Some(section) = info.section(name) else {
            continue;
        };
        for value in section.values() {
            let part = match value {
                Value::Object(nested) => nested
                    .iter()
                    .map(|(key, inner)| format!("{key}:{}", render_scalar(inner)))
                    .collect::<Vec<_>>()
                    .join(","),
                other => render_scalar(other),
            };
            parts.push(strip_whitespace(&part));
        }
    }
    parts.join("_")
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// A structure whose description is the compact, attribute-only form.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactStructure {
    inner: Structure,
}

impl CompactStructure {
    pub fn new(inner: Structure) -> Self {
        Self { inner }
    }

    pub fn from_poscar(path: &Path) -> Result<Self, PrepError> {
        Ok(Self::new(read_poscar(path)?))
    }

    pub fn structure(&self) -> &Structure {
        &self.inner
    }

    pub fn into_inner(self) -> Structure {
        self.inner
    }

    pub fn describe(&self) -> CompactDescription {
        flatten(&self.inner)
    }
}

impl From<Structure> for CompactStructure {
    fn from(inner: Structure) -> Self {
        Self::new(inner)
    }
}
