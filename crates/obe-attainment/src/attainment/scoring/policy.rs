//! Standalone rules used by the aggregator. Each one is small enough to test on its own.

use std::collections::BTreeMap;

use serde_json::Value;

use super::value::ScoreValue;
use crate::attainment::domain::{AssessmentTool, CourseType, MarkRecord, ToolKind};

pub(crate) const LAB_TEST_MARKS_KEY: &str = "Test Marks";
pub(crate) const LAB_CONTINUOUS_EVAL_KEY: &str = "Continuous Eval";
pub(crate) const SINGLE_SCORE_KEY: &str = "Score";

/// Normalized score cells for one tool, keyed like the raw record.
pub type WorkingScores = BTreeMap<String, ScoreValue>;

/// Per-CO mark ceilings for a tool. Without an explicit distribution every course CO gets the
/// tool's full `maxMarks`; the marks are not divided between outcomes.
pub fn resolve_distribution(tool: &AssessmentTool, course_cos: &[String]) -> BTreeMap<String, f64> {
    if !tool.co_distribution.is_empty() {
        return tool.co_distribution.clone();
    }
    match tool.max_marks {
        Some(max_marks) => course_cos
            .iter()
            .map(|co| (co.clone(), max_marks))
            .collect(),
        None => BTreeMap::new(),
    }
}

/// The CO-keyed cell, else the only non-underscore cell when exactly one exists.
pub fn resolve_score_value(scores: &WorkingScores, co: &str) -> Option<ScoreValue> {
    if let Some(value) = scores.get(co) {
        return Some(*value);
    }
    let mut visible = scores.iter().filter(|(key, _)| !is_private_key(key));
    match (visible.next(), visible.next()) {
        (Some((_, value)), None) => Some(*value),
        _ => None,
    }
}

/// Converts a raw record into per-CO cells according to the tool and course type.
pub fn normalize_tool_scores(
    raw: &BTreeMap<String, Value>,
    tool: &AssessmentTool,
    course_type: CourseType,
    course_cos: &[String],
    distribution: &BTreeMap<String, f64>,
) -> WorkingScores {
    if course_type == CourseType::Lab && tool.kind == ToolKind::InternalAssessment {
        return rescale_lab_internal(raw, tool, distribution);
    }

    if tool.kind.broadcasts_single_score() {
        return match raw.get(SINGLE_SCORE_KEY) {
            Some(score) => {
                let value = ScoreValue::from_json(score);
                course_cos.iter().map(|co| (co.clone(), value)).collect()
            }
            None => WorkingScores::new(),
        };
    }

    raw.iter()
        .map(|(key, value)| (key.clone(), ScoreValue::from_json(value)))
        .collect()
}

/// Combined "Test Marks" + "Continuous Eval" rescaled into each CO's ceiling.
fn rescale_lab_internal(
    raw: &BTreeMap<String, Value>,
    tool: &AssessmentTool,
    distribution: &BTreeMap<String, f64>,
) -> WorkingScores {
    let test = raw.get(LAB_TEST_MARKS_KEY).map(ScoreValue::from_json);
    let continuous = raw.get(LAB_CONTINUOUS_EVAL_KEY).map(ScoreValue::from_json);

    let all_absent = |distribution: &BTreeMap<String, f64>| {
        distribution
            .keys()
            .map(|co| (co.clone(), ScoreValue::Absent))
            .collect::<WorkingScores>()
    };

    if test.is_some_and(ScoreValue::is_absent) && continuous.is_some_and(ScoreValue::is_absent) {
        return all_absent(distribution);
    }

    let parts = [test.and_then(ScoreValue::as_number), continuous.and_then(ScoreValue::as_number)];
    if parts.iter().all(Option::is_none) {
        return WorkingScores::new();
    }
    let tool_total: f64 = parts.iter().flatten().sum();

    let Some(tool_max) = tool.max_marks.filter(|max| *max > 0.0) else {
        return all_absent(distribution);
    };

    distribution
        .iter()
        .map(|(co, co_max)| {
            let value = (tool_total / tool_max) * co_max;
            (co.clone(), ScoreValue::Numeric(value))
        })
        .collect()
}

/// Sum of numeric cells for the tool's outcomes, ignoring underscore-prefixed keys.
pub fn relevant_total(scores: &WorkingScores, distribution: &BTreeMap<String, f64>) -> f64 {
    scores
        .iter()
        .filter(|(key, _)| !is_private_key(key) && distribution.contains_key(key.as_str()))
        .filter_map(|(_, value)| value.as_number())
        .sum()
}

/// Lowercased alphanumerics only, so "Internal Assessment-1" matches "internalassessment1".
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First record of the student that retakes `tool_name`.
pub fn find_improvement<'a>(records: &[&'a MarkRecord], tool_name: &str) -> Option<&'a MarkRecord> {
    let wanted = normalize_name(tool_name);
    if wanted.is_empty() {
        return None;
    }
    records.iter().copied().find(|record| {
        record
            .improvement_targets()
            .any(|target| normalize_name(target) == wanted)
    })
}

fn is_private_key(key: &str) -> bool {
    key.starts_with('_')
}
