use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::domain::{CourseId, MarkRecord};

const LEADING_COLUMNS: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum MarksImportError {
    #[error("failed to read marks sheet: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid marks CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("marks sheet has no score columns after USN and Name")]
    NoScoreColumns,
}

/// Reads a marks-entry sheet from disk. See [`read_marks_csv`].
pub fn read_marks_csv_path(
    path: impl AsRef<Path>,
    course_id: &CourseId,
    assessment_name: &str,
    improvement_target: Option<&str>,
) -> Result<Vec<MarkRecord>, MarksImportError> {
    let file = std::fs::File::open(path)?;
    read_marks_csv(file, course_id, assessment_name, improvement_target)
}

/// Parses a `USN, Name, <key> (<max>), ...` sheet into one record per student row.
///
/// Cells are kept verbatim so absence markers such as `AB` reach the scoring policy untouched.
/// Empty cells are left out of the record and rows without a USN are skipped.
pub fn read_marks_csv<R: Read>(
    reader: R,
    course_id: &CourseId,
    assessment_name: &str,
    improvement_target: Option<&str>,
) -> Result<Vec<MarkRecord>, MarksImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let keys: Vec<String> = csv_reader
        .headers()?
        .iter()
        .skip(LEADING_COLUMNS)
        .map(score_key)
        .collect();
    if keys.is_empty() {
        return Err(MarksImportError::NoScoreColumns);
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        if row.len() <= LEADING_COLUMNS {
            continue;
        }
        let student_id = match row.get(0) {
            Some(usn) if !usn.is_empty() => usn.to_string(),
            _ => continue,
        };

        let scores: BTreeMap<String, Value> = keys
            .iter()
            .zip(row.iter().skip(LEADING_COLUMNS))
            .filter(|(key, cell)| !key.is_empty() && !cell.is_empty())
            .map(|(key, cell)| (key.clone(), Value::String(cell.to_string())))
            .collect();

        records.push(MarkRecord {
            id: None,
            student_id,
            course_id: course_id.clone(),
            assessment_name: assessment_name.to_string(),
            scores,
            improvement_target_name: improvement_target.map(str::to_string),
        });
    }

    debug!(%course_id, assessment = assessment_name, rows = records.len(), "marks sheet parsed");
    Ok(records)
}

/// `"CO1 (15)"` becomes `"CO1"`; headers without a parenthesised maximum pass through.
fn score_key(header: &str) -> String {
    let header = header.trim_start_matches('\u{feff}').trim();
    match header.rfind('(') {
        Some(open) if header.ends_with(')') => header[..open].trim_end().to_string(),
        _ => header.to_string(),
    }
}
