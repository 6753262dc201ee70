// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cluster World Bond Simulation - Structure Source
//
// Bond list text format, one bond per line:
//   <source> <destination> <break probability> <reform probability>

use std::fmt::Write as _;

use crate::types::BondRecord;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructureError {
    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("line {line}: `{value}` is not a number")]
    InvalidNumber { line: usize, value: String },
    #[error("line {line}: probability {value} outside [0, 1]")]
    OutOfRange { line: usize, value: f64 },
    #[error("line {line}: unexpected trailing field `{value}`")]
    TrailingField { line: usize, value: String },
}

/// Parse a bond list. Blank lines are skipped; line numbers in errors are
/// 1-based.
pub fn parse_structure(text: &str) -> Result<Vec<BondRecord>, StructureError> {
    let mut records = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let mut fields = raw.split_whitespace();
        let Some(source) = fields.next() else { continue };

        let destination = fields
            .next()
            .ok_or(StructureError::MissingField { line, field: "destination" })?;
        let break_probability = parse_probability(line, "break probability", fields.next())?;
        let reform_probability = parse_probability(line, "reform probability", fields.next())?;
        if let Some(extra) = fields.next() {
            return Err(StructureError::TrailingField { line, value: extra.to_string() });
        }

        records.push(BondRecord {
            source: source.to_string(),
            destination: destination.to_string(),
            break_probability,
            reform_probability,
        });
    }
    Ok(records)
}

fn parse_probability(line: usize, field: &'static str, raw: Option<&str>) -> Result<f64, StructureError> {
    let raw = raw.ok_or(StructureError::MissingField { line, field })?;
    let value: f64 = raw
        .parse()
        .map_err(|_| StructureError::InvalidNumber { line, value: raw.to_string() })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(StructureError::OutOfRange { line, value });
    }
    Ok(value)
}

/// Render records back into the bond list format.
pub fn render_structure(records: &[BondRecord]) -> String {
    let mut out = String::new();
    for r in records {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{} {} {} {}",
            r.source, r.destination, r.break_probability, r.reform_probability
        );
    }
    out
}

/// Layered tree topology.
///
/// Cluster `1` is the root. Parents `1..=layers` each get `breadth` children,
/// numbered consecutively from `2`, so later parents are children of earlier
/// ones.
pub fn layered_structure(layers: u32, breadth: u32, break_probability: f64, reform_probability: f64) -> Vec<BondRecord> {
    let mut records = Vec::with_capacity((layers * breadth) as usize);
    let mut next_child = 2u32;
    for parent in 1..=layers {
        for _ in 0..breadth {
            records.push(BondRecord {
                source: parent.to_string(),
                destination: next_child.to_string(),
                break_probability,
                reform_probability,
            });
            next_child += 1;
        }
    }
    records
}
