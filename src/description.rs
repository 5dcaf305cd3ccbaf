//! Structured, section-based descriptions of crystal structures.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::structure::Structure;

pub const CHEMICAL_INFO: &str = "chemical_info";
pub const STRUCTURE_INFO: &str = "structure_info";

/// Named sections, each an ordered mapping of attribute name to a scalar or a
/// sub-mapping. Section and attribute order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DescriptionInfo(Map<String, Value>);

impl DescriptionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    pub fn insert_section(&mut self, name: impl Into<String>, section: Map<String, Value>) {
        self.0.insert(name.into(), Value::Object(section));
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

pub trait Describe {
    fn describe(&self) -> DescriptionInfo;
}

impl Describe for Structure {
    fn describe(&self) -> DescriptionInfo {
        let mut info = DescriptionInfo::new();
        info.insert_section(CHEMICAL_INFO, chemical_info(self));
        info.insert_section(STRUCTURE_INFO, structure_info(self));
        info
    }
}

fn chemical_info(structure: &Structure) -> Map<String, Value> {
    let composition = structure.composition();
    let total = structure.num_atoms().max(1) as f64;

    let mut fractions = Map::new();
    for (element, count) in &composition {
        fractions.insert(element.clone(), json!(round(*count as f64 / total, 3)));
    }

    let mut section = Map::new();
    section.insert(
        "atomic_formula".to_string(),
        json!(reduced_formula(&composition)),
    );
    section.insert("prototype".to_string(), json!(prototype(&composition)));
    section.insert("atomic_fraction".to_string(), Value::Object(fractions));
    section.insert("nelements".to_string(), json!(composition.len()));
    section
}

fn structure_info(structure: &Structure) -> Map<String, Value> {
    let abc = structure.lattice.abc();
    let angles = structure.lattice.angles();

    let mut section = Map::new();
    section.insert(
        "lattice_parameters".to_string(),
        json!(abc.map(|x| round(x, 3))),
    );
    section.insert(
        "lattice_angles".to_string(),
        json!(angles.map(|x| round(x, 2))),
    );
    section.insert(
        "volume".to_string(),
        json!(round(structure.lattice.volume(), 3)),
    );
    section.insert("natoms".to_string(), json!(structure.num_atoms()));
    section.insert(
        "lattice_system".to_string(),
        json!(lattice_system(abc, angles)),
    );
    section
}

/// Formula reduced by the gcd of the counts; a count of one is omitted.
pub fn reduced_formula(composition: &[(String, usize)]) -> String {
    let divisor = composition
        .iter()
        .map(|(_, n)| *n)
        .fold(0, gcd)
        .max(1);
    composition
        .iter()
        .map(|(element, n)| match n / divisor {
            1 => element.clone(),
            k => format!("{element}{k}"),
        })
        .collect()
}

/// Anonymous formula such as `AB2`: letters assigned in order of increasing reduced count.
pub fn prototype(composition: &[(String, usize)]) -> String {
    let divisor = composition
        .iter()
        .map(|(_, n)| *n)
        .fold(0, gcd)
        .max(1);
    let mut counts: Vec<usize> = composition.iter().map(|(_, n)| n / divisor).collect();
    counts.sort_unstable();
    counts
        .iter()
        .zip(b'A'..=b'Z')
        .map(|(n, letter)| match n {
            1 => (letter as char).to_string(),
            k => format!("{}{k}", letter as char),
        })
        .collect()
}

/// Bravais lattice system from cell lengths and angles alone, without symmetry analysis.
pub fn lattice_system(abc: [f64; 3], angles: [f64; 3]) -> &'static str {
    let [a, b, c] = abc;
    let len_eq = |x: f64, y: f64| (x - y).abs() <= 1e-3 * x.max(y);
    let ang_eq = |x: f64, y: f64| (x - y).abs() <= 0.1;

    let right = angles.iter().filter(|&&x| ang_eq(x, 90.0)).count();
    let has_120 = angles.iter().any(|&x| ang_eq(x, 120.0));
    let all_len = len_eq(a, b) && len_eq(b, c);
    let two_len = len_eq(a, b) || len_eq(b, c) || len_eq(a, c);
    let all_ang_eq = ang_eq(angles[0], angles[1]) && ang_eq(angles[1], angles[2]);

    match right {
        3 if all_len => "cubic",
        3 if two_len => "tetragonal",
        3 => "orthorhombic",
        2 if has_120 && two_len => "hexagonal",
        2 => "monoclinic",
        _ if all_len && all_ang_eq => "rhombohedral",
        _ => "triclinic",
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
