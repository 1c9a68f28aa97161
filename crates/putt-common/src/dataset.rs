//! Dataset loading: whitespace/comma tables, JSON, and the reference dataset.
//!
//! A text table has one header line naming its columns followed by one row
//! per distance bin:
//!
//! ```text
//! # distance in feet
//! x   n     y
//! 2   1443  1346
//! 3   694   577
//! ```
//!
//! Accepted column names (case-insensitive): `distance`/`x`, `attempts`/`n`,
//! `successes`/`y`. Extra columns are ignored. Everything after `#` on a line
//! is a comment.

use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, Error};
use crate::observation::{Observation, PuttingData};

/// Unit of the distance column in a parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Inches,
    Feet,
}

impl DistanceUnit {
    /// Multiplier converting this unit to inches.
    pub fn to_inches(self) -> f64 {
        match self {
            DistanceUnit::Inches => 1.0,
            DistanceUnit::Feet => 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Distance,
    Attempts,
    Successes,
}

fn column_for(name: &str) -> Option<Column> {
    match name.to_ascii_lowercase().as_str() {
        "distance" | "x" | "dist" => Some(Column::Distance),
        "attempts" | "n" | "tries" => Some(Column::Attempts),
        "successes" | "y" | "made" => Some(Column::Successes),
        _ => None,
    }
}

fn tokens(line: &str) -> Vec<&str> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> DataError {
    DataError::Parse {
        line,
        message: message.into(),
    }
}

/// Parse a text table into observations, converting distances to inches.
///
/// Only the table shape is checked here; record invariants are enforced by
/// [`PuttingData::validate`].
pub fn parse_table(input: &str, unit: DistanceUnit) -> Result<Vec<Observation>, DataError> {
    let mut header: Option<[usize; 3]> = None;
    let mut width = 0;
    let mut observations = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let fields = tokens(strip_comment(raw));
        if fields.is_empty() {
            continue;
        }

        let Some(positions) = header else {
            let mut found: [Option<usize>; 3] = [None; 3];
            for (pos, name) in fields.iter().enumerate() {
                if let Some(col) = column_for(name) {
                    let slot = &mut found[col as usize];
                    if slot.is_some() {
                        return Err(parse_error(line_no, format!("duplicate column '{name}'")));
                    }
                    *slot = Some(pos);
                }
            }
            let mut positions = [0usize; 3];
            for (slot, (found, label)) in positions
                .iter_mut()
                .zip(found.iter().zip(["distance", "attempts", "successes"]))
            {
                *slot = found.ok_or_else(|| {
                    parse_error(line_no, format!("header is missing a {label} column"))
                })?;
            }
            header = Some(positions);
            width = fields.len();
            continue;
        };

        if fields.len() != width {
            return Err(parse_error(
                line_no,
                format!("expected {width} fields, found {}", fields.len()),
            ));
        }

        let distance: f64 = fields[positions[Column::Distance as usize]]
            .parse()
            .map_err(|_| parse_error(line_no, "distance is not a number"))?;
        let attempts: u64 = fields[positions[Column::Attempts as usize]]
            .parse()
            .map_err(|_| parse_error(line_no, "attempts is not a non-negative integer"))?;
        let successes: u64 = fields[positions[Column::Successes as usize]]
            .parse()
            .map_err(|_| parse_error(line_no, "successes is not a non-negative integer"))?;

        observations.push(Observation::new(
            distance * unit.to_inches(),
            attempts,
            successes,
        ));
    }

    if header.is_none() {
        return Err(DataError::Empty);
    }
    Ok(observations)
}

/// True when the input is a JSON document rather than a text table.
pub fn is_json_document(input: &str) -> bool {
    input.trim_start().starts_with('{')
}

/// Parse a dataset from text, detecting JSON by its leading `{`.
///
/// Tables get regulation ball and hole sizes; JSON documents may carry
/// their own.
pub fn parse_dataset(input: &str, unit: DistanceUnit) -> Result<PuttingData, Error> {
    if is_json_document(input) {
        let mut data = PuttingData::from_json(input)?;
        if unit != DistanceUnit::Inches {
            for obs in &mut data.observations {
                obs.distance *= unit.to_inches();
            }
        }
        return Ok(data);
    }
    Ok(PuttingData::with_standard_constants(parse_table(input, unit)?))
}

/// Read and parse a dataset file. Validation is left to the caller.
pub fn read_dataset(path: &Path, unit: DistanceUnit) -> Result<PuttingData, Error> {
    let content = std::fs::read_to_string(path)?;
    parse_dataset(&content, unit)
}

/// Professional golfer putting data (Berry, 2000): distance in feet,
/// attempts, successes.
const PUBLISHED_FEET: [(f64, u64, u64); 19] = [
    (2.0, 1443, 1346),
    (3.0, 694, 577),
    (4.0, 455, 337),
    (5.0, 353, 208),
    (6.0, 272, 149),
    (7.0, 256, 136),
    (8.0, 240, 111),
    (9.0, 217, 69),
    (10.0, 200, 67),
    (11.0, 237, 75),
    (12.0, 202, 52),
    (13.0, 192, 46),
    (14.0, 174, 54),
    (15.0, 167, 28),
    (16.0, 201, 27),
    (17.0, 195, 31),
    (18.0, 191, 33),
    (19.0, 147, 20),
    (20.0, 152, 24),
];

/// The published reference dataset with distances in inches and regulation
/// ball and hole sizes.
pub fn published_dataset() -> PuttingData {
    PuttingData::with_standard_constants(
        PUBLISHED_FEET
            .iter()
            .map(|&(feet, n, y)| Observation::new(feet * 12.0, n, y))
            .collect(),
    )
}
