//! Sequence literals used for list-valued dataset columns.
//!
//! Columns are stored as literal text such as `[0.91, None, 0.88]` for
//! confidences and `[[12.5, -3.0], [None, None]]` for eye directions.
//! Parsing also accepts `null`, `nan` and bare `None` entries; writing always
//! produces the `None` form so existing consumers keep reading the files.

use crate::core::{Direction, Reading};
use crate::dataset::DatasetError;

/// Parse a confidence column.
pub fn parse_confidences(text: &str) -> Result<Vec<Reading<f64>>, DatasetError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<Option<f64>> = serde_json::from_str(&to_json(text)).map_err(|e| {
        DatasetError::Literal {
            column: "confidences",
            message: e.to_string(),
        }
    })?;
    Ok(values.into_iter().map(Reading::from).collect())
}

/// Parse an eye-direction column.
///
/// An entry is present only if both yaw and pitch are numbers.
pub fn parse_directions(text: &str) -> Result<Vec<Reading<Direction>>, DatasetError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let values: Vec<Option<[Option<f64>; 2]>> =
        serde_json::from_str(&to_json(text)).map_err(|e| DatasetError::Literal {
            column: "eye_directions",
            message: e.to_string(),
        })?;
    Ok(values
        .into_iter()
        .map(|entry| match entry {
            Some([Some(yaw), Some(pitch)]) => Reading::Present(Direction::new(yaw, pitch)),
            _ => Reading::Missing,
        })
        .collect())
}

pub fn format_confidences(values: &[Reading<f64>]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| match v {
            Reading::Present(c) => format!("{c:?}"),
            Reading::Missing => "None".to_string(),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

pub fn format_directions(values: &[Reading<Direction>]) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|v| match v {
            Reading::Present(d) => format!("[{:?}, {:?}]", d.yaw, d.pitch),
            Reading::Missing => "[None, None]".to_string(),
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Rewrite a sequence literal as JSON.
///
/// Tuples become arrays and missing-value words become `null`. Letters that
/// continue a number (exponents) are copied through untouched.
fn to_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_number = false;

    while let Some(c) = chars.next() {
        if c.is_ascii_alphabetic() && !in_number {
            let mut word = String::from(c);
            while let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    word.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            match word.as_str() {
                "None" | "null" | "nan" | "NaN" => out.push_str("null"),
                _ => out.push_str(&word),
            }
            continue;
        }

        in_number = c.is_ascii_digit()
            || c == '.'
            || (in_number && (c == 'e' || c == 'E' || c == '-' || c == '+'));
        match c {
            '(' => out.push('['),
            ')' => out.push(']'),
            _ => out.push(c),
        }
    }

    out
}
