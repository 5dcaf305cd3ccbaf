use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::PropertyValue;
use crate::error::PrepError;

/// Structure payload as stored in JARVIS dataset entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomsPayload {
    pub lattice_mat: [[f64; 3]; 3],
    pub coords: Vec<[f64; 3]>,
    pub elements: Vec<String>,
    #[serde(default)]
    pub cartesian: bool,
    #[serde(default)]
    pub props: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(alias = "id")]
    pub jid: String,
    pub atoms: AtomsPayload,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl DatasetRecord {
    pub fn property(&self, name: &str) -> Result<PropertyValue, PrepError> {
        let raw = self
            .properties
            .get(name)
            .ok_or_else(|| PrepError::MissingProperty {
                id: self.jid.clone(),
                property: name.to_string(),
            })?;
        PropertyValue::from_json(raw).ok_or_else(|| PrepError::InvalidPropertyValue {
            id: self.jid.clone(),
            property: name.to_string(),
            value: raw.to_string(),
        })
    }

    pub fn poscar_file_name(&self) -> String {
        format!("POSCAR-{}.vasp", self.jid)
    }
}

pub fn parse_records(content: &str) -> Result<Vec<DatasetRecord>, PrepError> {
    serde_json::from_str(content).map_err(|err| PrepError::DatasetParse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SAMPLE: &str = r#"[
        {
            "jid": "JVASP-1002",
            "atoms": {
                "lattice_mat": [[0.0, 2.7, 2.7], [2.7, 0.0, 2.7], [2.7, 2.7, 0.0]],
                "coords": [[0.0, 0.0, 0.0], [0.25, 0.25, 0.25]],
                "elements": ["Si", "Si"],
                "abc": [3.8, 3.8, 3.8],
                "angles": [60.0, 60.0, 60.0],
                "cartesian": false,
                "props": ["", ""]
            },
            "optb88vdw_bandgap": 0.731,
            "mbj_bandgap": "na",
            "formula": "Si"
        }
    ]"#;

    #[test]
    fn parse_jarvis_entry() {
        let records = parse_records(SAMPLE).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.jid, "JVASP-1002");
        assert_eq!(record.atoms.elements.len(), 2);
        assert_eq!(
            record.property("optb88vdw_bandgap").unwrap(),
            PropertyValue::Available(0.731)
        );
        assert_eq!(
            record.property("mbj_bandgap").unwrap(),
            PropertyValue::Missing
        );
        assert_eq!(record.poscar_file_name(), "POSCAR-JVASP-1002.vasp");
    }

    #[test]
    fn missing_and_invalid_properties() {
        let records = parse_records(SAMPLE).unwrap();
        assert_matches!(
            records[0].property("kpoint_length_unit"),
            Err(PrepError::MissingProperty { .. })
        );
        assert_matches!(
            records[0].property("formula"),
            Err(PrepError::InvalidPropertyValue { .. })
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert_matches!(parse_records("{\"jid\": 1"), Err(PrepError::DatasetParse(_)));
    }
}
