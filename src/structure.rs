//! Crystal structure model used for export and description.
//!
//! Lattice vectors are stored as rows (`[a, b, c]`), coordinates are always fractional.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PrepError;
use crate::record::AtomsPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    pub matrix: [[f64; 3]; 3],
}

impl Lattice {
    pub fn from_vectors(matrix: [[f64; 3]; 3]) -> Self {
        Lattice { matrix }
    }

    /// Vector lengths `(a, b, c)`.
    pub fn abc(&self) -> [f64; 3] {
        self.matrix.map(norm)
    }

    /// Angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> [f64; 3] {
        let [a, b, c] = self.matrix;
        [angle(b, c), angle(a, c), angle(a, b)]
    }

    pub fn volume(&self) -> f64 {
        determinant(&self.matrix).abs()
    }

    pub fn cart_to_frac(&self, cart: [f64; 3]) -> Result<[f64; 3], PrepError> {
        let m = self.matrix;
        let det = determinant(&m);
        if det.abs() < 1e-10 {
            return Err(PrepError::InvalidStructure {
                id: "lattice".to_string(),
                reason: "singular lattice matrix".to_string(),
            });
        }

        let inv = [
            [
                (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
                (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
                (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
            ],
            [
                (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
                (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
                (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
            ],
            [
                (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
                (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
                (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
            ],
        ];

        // Row-vector convention: cart = frac * M, so frac = cart * M^-1.
        Ok([
            cart[0] * inv[0][0] + cart[1] * inv[1][0] + cart[2] * inv[2][0],
            cart[0] * inv[0][1] + cart[1] * inv[1][1] + cart[2] * inv[2][1],
            cart[0] * inv[0][2] + cart[1] * inv[1][2] + cart[2] * inv[2][2],
        ])
    }

    pub fn frac_to_cart(&self, frac: [f64; 3]) -> [f64; 3] {
        let m = self.matrix;
        [
            frac[0] * m[0][0] + frac[1] * m[1][0] + frac[2] * m[2][0],
            frac[0] * m[0][1] + frac[1] * m[1][1] + frac[2] * m[2][1],
            frac[0] * m[0][2] + frac[1] * m[1][2] + frac[2] * m[2][2],
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub comment: String,
    pub lattice: Lattice,
    pub frac_coords: Vec<[f64; 3]>,
    pub elements: Vec<String>,
    pub props: Vec<String>,
}

impl Structure {
    pub fn new(
        comment: impl Into<String>,
        lattice: Lattice,
        frac_coords: Vec<[f64; 3]>,
        elements: Vec<String>,
    ) -> Result<Self, PrepError> {
        let comment = comment.into();
        if frac_coords.len() != elements.len() {
            return Err(PrepError::InvalidStructure {
                id: comment,
                reason: format!(
                    "{} coordinates for {} elements",
                    frac_coords.len(),
                    elements.len()
                ),
            });
        }
        let props = vec![String::new(); elements.len()];
        Ok(Self {
            comment,
            lattice,
            frac_coords,
            elements,
            props,
        })
    }

    pub fn from_payload(id: &str, payload: &AtomsPayload) -> Result<Self, PrepError> {
        let lattice = Lattice::from_vectors(payload.lattice_mat);
        let frac_coords = if payload.cartesian {
            payload
                .coords
                .iter()
                .map(|cart| lattice.cart_to_frac(*cart))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| PrepError::InvalidStructure {
                    id: id.to_string(),
                    reason: err.to_string(),
                })?
        } else {
            payload.coords.clone()
        };

        let mut structure = Self::new(id, lattice, frac_coords, payload.elements.clone())?;
        if !payload.props.is_empty() {
            if payload.props.len() != structure.elements.len() {
                return Err(PrepError::InvalidStructure {
                    id: id.to_string(),
                    reason: format!(
                        "{} site props for {} elements",
                        payload.props.len(),
                        structure.elements.len()
                    ),
                });
            }
            structure.props = payload.props.iter().map(prop_to_string).collect();
        }
        Ok(structure)
    }

    pub fn num_atoms(&self) -> usize {
        self.elements.len()
    }

    /// Element counts in order of first appearance.
    pub fn composition(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for element in &self.elements {
            match counts.iter_mut().find(|(name, _)| name == element) {
                Some((_, count)) => *count += 1,
                None => counts.push((element.clone(), 1)),
            }
        }
        counts
    }

    pub fn cart_coords(&self) -> Vec<[f64; 3]> {
        self.frac_coords
            .iter()
            .map(|frac| self.lattice.frac_to_cart(*frac))
            .collect()
    }
}

fn prop_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn norm(v: [f64; 3]) -> f64 {
    dot(v, v).sqrt()
}

fn dot(u: [f64; 3], v: [f64; 3]) -> f64 {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn angle(u: [f64; 3], v: [f64; 3]) -> f64 {
    let cos = (dot(u, v) / (norm(u) * norm(v))).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn cubic_lattice_parameters() {
        let lattice = Lattice::from_vectors([[4.0, 0.0, 0.0], [0.0, 4.0, 0.0], [0.0, 0.0, 4.0]]);
        assert_eq!(lattice.abc(), [4.0, 4.0, 4.0]);
        assert!(lattice.angles().iter().all(|a| close(*a, 90.0)));
        assert!(close(lattice.volume(), 64.0));
    }

    #[test]
    fn cartesian_payload_becomes_fractional() {
        let payload = AtomsPayload {
            lattice_mat: [[0.0, 2.0, 2.0], [2.0, 0.0, 2.0], [2.0, 2.0, 0.0]],
            coords: vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]],
            elements: vec!["Si".to_string(), "Si".to_string()],
            cartesian: true,
            props: Vec::new(),
        };
        let structure = Structure::from_payload("JVASP-1", &payload).unwrap();
        let frac = structure.frac_coords[1];
        assert!(frac.iter().all(|x| close(*x, 0.25)));
        let cart = structure.cart_coords()[1];
        assert!(cart.iter().all(|x| close(*x, 1.0)));
    }

    #[test]
    fn mismatched_sites_are_rejected() {
        let payload = AtomsPayload {
            lattice_mat: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            coords: vec![[0.0, 0.0, 0.0]],
            elements: vec!["Na".to_string(), "Cl".to_string()],
            cartesian: false,
            props: Vec::new(),
        };
        assert_matches!(
            Structure::from_payload("JVASP-2", &payload),
            Err(PrepError::InvalidStructure { .. })
        );
    }

    #[test]
    fn composition_keeps_first_appearance_order() {
        let lattice = Lattice::from_vectors([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let structure = Structure::new(
            "TiO2",
            lattice,
            vec![[0.0; 3], [0.5; 3], [0.25; 3]],
            vec!["O".to_string(), "Ti".to_string(), "O".to_string()],
        )
        .unwrap();
        assert_eq!(
            structure.composition(),
            vec![("O".to_string(), 2), ("Ti".to_string(), 1)]
        );
    }
}
