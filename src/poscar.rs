//! VASP POSCAR reading and writing.
//!
//! ```text
//! comment
//! 1.0                    # scaling factor
//! a1 a2 a3               # lattice vectors
//! b1 b2 b3
//! c1 c2 c3
//! Si O                   # element symbols (VASP 5)
//! 1 2                    # atoms per element
//! Selective dynamics     # optional
//! direct                 # or cartesian
//! x y z                  # one line per atom
//! ```

use std::fs;
use std::path::Path;

use crate::error::PrepError;
use crate::structure::{Lattice, Structure};

const DEFAULT_COMMENT: &str = "System";

/// Renders a structure as VASP 5 POSCAR with direct coordinates. Sites are grouped by
/// element in order of first appearance.
pub fn to_poscar_string(structure: &Structure) -> String {
    let composition = structure.composition();
    let mut result = String::new();

    let comment = structure.comment.trim();
    if comment.is_empty() {
        result.push_str(DEFAULT_COMMENT);
    } else {
        result.push_str(comment);
    }
    result.push('\n');
    result.push_str("1.0\n");

    for row in &structure.lattice.matrix {
        result.push_str(&format!(
            "  {:16.10}  {:16.10}  {:16.10}\n",
            row[0], row[1], row[2]
        ));
    }

    let symbols: Vec<&str> = composition.iter().map(|(el, _)| el.as_str()).collect();
    let counts: Vec<String> = composition.iter().map(|(_, n)| n.to_string()).collect();
    result.push_str(&format!("  {}\n", symbols.join("  ")));
    result.push_str(&format!("  {}\n", counts.join("  ")));
    result.push_str("direct\n");

    for (symbol, _) in &composition {
        for (pos, _) in structure
            .frac_coords
            .iter()
            .zip(&structure.elements)
            .filter(|(_, el)| *el == symbol)
        {
            result.push_str(&format!(
                "  {:16.10}  {:16.10}  {:16.10} {}\n",
                pos[0], pos[1], pos[2], symbol
            ));
        }
    }

    result
}

pub fn write_poscar(structure: &Structure, path: &Path) -> Result<(), PrepError> {
    fs::write(path, to_poscar_string(structure))
        .map_err(|err| PrepError::Filesystem(format!("write {}: {err}", path.display())))
}

pub fn read_poscar(path: &Path) -> Result<Structure, PrepError> {
    let content = fs::read_to_string(path)
        .map_err(|err| PrepError::Filesystem(format!("read {}: {err}", path.display())))?;
    parse_poscar(&content, &path.display().to_string())
}

pub fn parse_poscar(content: &str, source: &str) -> Result<Structure, PrepError> {
    let fail = |reason: String| PrepError::PoscarParse {
        path: source.to_string(),
        reason,
    };

    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 8 {
        return Err(fail("file too short".to_string()));
    }

    let comment = lines[0].trim().to_string();
    let scale: f64 = lines[1]
        .split_whitespace()
        .next()
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| fail("invalid scaling factor".to_string()))?;

    let mut matrix = [[0.0; 3]; 3];
    for (i, row) in matrix.iter_mut().enumerate() {
        let parts = parse_floats(lines[2 + i], 3)
            .ok_or_else(|| fail(format!("invalid lattice vector at line {}", 3 + i)))?;
        *row = [parts[0] * scale, parts[1] * scale, parts[2] * scale];
    }
    let lattice = Lattice::from_vectors(matrix);

    let symbols: Vec<String> = lines[5].split_whitespace().map(str::to_string).collect();
    if symbols.is_empty() || symbols[0].parse::<usize>().is_ok() {
        return Err(fail("element symbol line is required".to_string()));
    }
    let counts: Vec<usize> = lines[6]
        .split_whitespace()
        .map(|value| value.parse())
        .collect::<Result<_, _>>()
        .map_err(|_| fail("invalid atom count line".to_string()))?;
    if counts.len() != symbols.len() {
        return Err(fail(format!(
            "{} element symbols but {} counts",
            symbols.len(),
            counts.len()
        )));
    }

    let mut cursor = 7;
    if lines
        .get(cursor)
        .map(|line| line.trim().to_lowercase().starts_with('s'))
        .unwrap_or(false)
    {
        cursor += 1;
    }
    let mode = lines
        .get(cursor)
        .map(|line| line.trim().to_lowercase())
        .ok_or_else(|| fail("missing coordinate mode line".to_string()))?;
    let cartesian = mode.starts_with('c') || mode.starts_with('k');
    cursor += 1;

    let mut elements = Vec::new();
    let mut frac_coords = Vec::new();
    for (symbol, count) in symbols.iter().zip(&counts) {
        for _ in 0..*count {
            let line = lines
                .get(cursor)
                .ok_or_else(|| fail("fewer coordinate lines than atoms".to_string()))?;
            let parts = parse_floats(line, 3)
                .ok_or_else(|| fail(format!("invalid coordinates at line {}", cursor + 1)))?;
            let position = if cartesian {
                let cart = [parts[0] * scale, parts[1] * scale, parts[2] * scale];
                lattice.cart_to_frac(cart)?
            } else {
                [parts[0], parts[1], parts[2]]
            };
            frac_coords.push(position);
            elements.push(symbol.clone());
            cursor += 1;
        }
    }

    Structure::new(comment, lattice, frac_coords, elements)
}

fn parse_floats(line: &str, count: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(count)
        .map(|value| value.parse().ok())
        .collect::<Option<_>>()?;
    (values.len() == count).then_some(values)
}
