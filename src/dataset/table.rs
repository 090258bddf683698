//! Tabular dataset files.
//!
//! Recordings are read from a CSV file with one video per record. Output rows
//! are written as CSV (the modelling dataset) or JSON Lines.

use crate::core::{Label, OutputRow, PrepError, Recording, RecordingInfo};
use crate::dataset::literal::{
    format_confidences, format_directions, parse_confidences, parse_directions,
};
use crate::dataset::DatasetError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

/// Column order of the output CSV.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "video_key",
    "ASD",
    "child_id",
    "age",
    "gender",
    "eye_directions",
    "confidences",
    "total_confidence",
    "number_of_frames_with_face",
];

/// File format for exported rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Jsonl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Jsonl => "jsonl",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "jsonl" => Ok(ExportFormat::Jsonl),
            other => Err(format!("unknown format '{other}' (expected csv or jsonl)")),
        }
    }
}

/// Input record; columns beyond these are ignored.
#[derive(Debug, Deserialize)]
struct RecordingRecord {
    video_key: String,
    #[serde(rename = "ASD")]
    asd: String,
    child_id: String,
    age: Option<f64>,
    #[serde(default)]
    gender: String,
    eye_directions: String,
    confidences: String,
}

/// CSV form of an output row.
#[derive(Debug, Serialize, Deserialize)]
struct RowRecord {
    video_key: String,
    #[serde(rename = "ASD")]
    asd: String,
    child_id: String,
    age: Option<f64>,
    gender: String,
    eye_directions: String,
    confidences: String,
    total_confidence: f64,
    number_of_frames_with_face: usize,
}

/// JSON Lines form of an output row.
#[derive(Debug, Serialize)]
struct RowJson<'a> {
    video_key: &'a str,
    #[serde(rename = "ASD")]
    asd: u8,
    child_id: &'a str,
    age: Option<f64>,
    gender: &'a str,
    eye_directions: Vec<Option<[f64; 2]>>,
    confidences: Vec<Option<f64>>,
    total_confidence: f64,
    number_of_frames_with_face: usize,
}

/// Parse the `ASD` column, accepting `0`/`1` as well as `0.0`/`1.0`.
pub fn parse_label(text: &str) -> Result<Label, PrepError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| PrepError::InvalidLabel(text.to_string()))?;
    if value == 0.0 {
        Ok(Label::Neurotypical)
    } else if value == 1.0 {
        Ok(Label::Asd)
    } else {
        Err(PrepError::InvalidLabel(text.to_string()))
    }
}

/// Read recordings from a CSV file, failing on the first malformed record.
pub fn read_recordings(path: &Path) -> Result<Vec<Recording>, DatasetError> {
    let recordings = read_recordings_from(File::open(path)?)?;
    tracing::info!(
        path = %path.display(),
        recordings = recordings.len(),
        "Loaded recordings"
    );
    Ok(recordings)
}

/// Read recordings from any CSV source, failing on the first malformed record.
pub fn read_recordings_from<R: Read>(reader: R) -> Result<Vec<Recording>, DatasetError> {
    read_recording_results_from(reader).into_iter().collect()
}

/// Read recordings from a CSV file, keeping one result per record.
///
/// Only failing to open the file is an error of the whole read; malformed
/// records come back as `Err` entries in file order.
pub fn read_recording_results(
    path: &Path,
) -> Result<Vec<Result<Recording, DatasetError>>, DatasetError> {
    let results = read_recording_results_from(File::open(path)?);
    tracing::info!(
        path = %path.display(),
        records = results.len(),
        malformed = results.iter().filter(|r| r.is_err()).count(),
        "Loaded recordings"
    );
    Ok(results)
}

/// Read recordings from any CSV source, keeping one result per record.
pub fn read_recording_results_from<R: Read>(reader: R) -> Vec<Result<Recording, DatasetError>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<RecordingRecord>()
        .enumerate()
        .map(|(record, result)| -> Result<Recording, DatasetError> {
            let raw = result?;
            let video_key = raw.video_key.clone();
            recording_from_record(raw).map_err(|e| e.in_record(record, video_key))
        })
        .collect()
}

fn recording_from_record(raw: RecordingRecord) -> Result<Recording, DatasetError> {
    let label = parse_label(&raw.asd)?;
    let directions = parse_directions(&raw.eye_directions)?;
    let confidences = parse_confidences(&raw.confidences)?;
    let info = RecordingInfo {
        video_key: raw.video_key,
        child_id: raw.child_id,
        label,
        age: raw.age,
        gender: raw.gender,
    };
    Ok(Recording::from_columns(info, directions, confidences)?)
}

/// Write output rows as CSV.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<(), DatasetError> {
    ensure_parent(path)?;
    write_rows_to(File::create(path)?, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote rows");
    Ok(())
}

/// Write output rows as CSV to any sink.
pub fn write_rows_to<W: Write>(writer: W, rows: &[OutputRow]) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        csv_writer.write_record(OUTPUT_COLUMNS)?;
    }
    for row in rows {
        csv_writer.serialize(RowRecord {
            video_key: row.video_key.clone(),
            asd: row.label.as_u8().to_string(),
            child_id: row.child_id.clone(),
            age: row.age,
            gender: row.gender.clone(),
            eye_directions: format_directions(&row.eye_directions),
            confidences: format_confidences(&row.confidences),
            total_confidence: row.total_confidence,
            number_of_frames_with_face: row.number_of_frames_with_face,
        })?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write output rows as JSON Lines.
pub fn write_rows_jsonl(path: &Path, rows: &[OutputRow]) -> Result<(), DatasetError> {
    ensure_parent(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    for row in rows {
        let json = RowJson {
            video_key: &row.video_key,
            asd: row.label.as_u8(),
            child_id: &row.child_id,
            age: row.age,
            gender: &row.gender,
            eye_directions: row
                .eye_directions
                .iter()
                .map(|d| d.value().map(|d| [d.yaw, d.pitch]))
                .collect(),
            confidences: row.confidences.iter().map(|c| c.value().copied()).collect(),
            total_confidence: row.total_confidence,
            number_of_frames_with_face: row.number_of_frames_with_face,
        };
        serde_json::to_writer(&mut writer, &json)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote rows");
    Ok(())
}

/// Read output rows back from a CSV file written by [`write_rows`].
pub fn read_rows(path: &Path) -> Result<Vec<OutputRow>, DatasetError> {
    read_rows_from(File::open(path)?)
}

/// Read output rows from any CSV source.
pub fn read_rows_from<R: Read>(reader: R) -> Result<Vec<OutputRow>, DatasetError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (record, result) in csv_reader.deserialize::<RowRecord>().enumerate() {
        let raw = result?;
        let video_key = raw.video_key.clone();
        rows.push(row_from_record(raw).map_err(|e| e.in_record(record, video_key))?);
    }

    Ok(rows)
}

fn row_from_record(raw: RowRecord) -> Result<OutputRow, DatasetError> {
    Ok(OutputRow {
        label: parse_label(&raw.asd)?,
        eye_directions: parse_directions(&raw.eye_directions)?,
        confidences: parse_confidences(&raw.confidences)?,
        video_key: raw.video_key,
        child_id: raw.child_id,
        age: raw.age,
        gender: raw.gender,
        total_confidence: raw.total_confidence,
        number_of_frames_with_face: raw.number_of_frames_with_face,
    })
}

fn ensure_parent(path: &Path) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
