use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::scheme::SchemeSettings;
use super::scoring::value::numeric;

/// Identifier wrapper for courses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub String);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CourseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Course definition as supplied by the course catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_outcome_ids")]
    pub cos: Vec<String>,
    #[serde(default, rename = "assessmentTools", alias = "assessment_tools")]
    pub assessment_tools: Vec<AssessmentTool>,
    #[serde(default)]
    pub settings: CourseSettings,
    #[serde(default)]
    pub scheme: Option<SchemeRef>,
}

impl Course {
    pub fn course_type(&self) -> CourseType {
        self.settings.course_type
    }

    /// First tool classified as the semester end exam.
    pub fn end_of_term_tool(&self) -> Option<&AssessmentTool> {
        self.assessment_tools
            .iter()
            .find(|tool| tool.kind == ToolKind::EndOfTerm)
    }

    /// Tools feeding the internal channel; improvement tests only act as overrides.
    pub fn internal_tools(&self) -> impl Iterator<Item = &AssessmentTool> {
        self.assessment_tools
            .iter()
            .filter(|tool| !matches!(tool.kind, ToolKind::EndOfTerm | ToolKind::ImprovementTest))
    }

    /// Survey-derived level for an outcome, zero when the course has none recorded.
    pub fn indirect_attainment(&self, co: &str) -> f64 {
        self.settings
            .indirect_attainment
            .get(co)
            .and_then(numeric)
            .unwrap_or(0.0)
    }
}

/// Per-course settings bag. Unknown keys are retained for round-tripping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseSettings {
    #[serde(default, rename = "courseType", alias = "course_type")]
    pub course_type: CourseType,
    #[serde(default)]
    pub indirect_attainment: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Theory courses score tools as entered; lab courses rescale combined internal marks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>")]
pub enum CourseType {
    #[default]
    Theory,
    Lab,
}

impl From<String> for CourseType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "lab" | "laboratory" => Self::Lab,
            _ => Self::Theory,
        }
    }
}

impl From<Option<String>> for CourseType {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

/// Scheme attached to a course. Empty settings defer to the global configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRef {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub settings: Option<SchemeSettings>,
}

/// Assessment instrument declared on a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentTool {
    #[serde(rename = "type", default)]
    pub kind: ToolKind,
    pub name: String,
    #[serde(
        default,
        rename = "maxMarks",
        alias = "max_marks",
        deserialize_with = "deserialize_loose_number"
    )]
    pub max_marks: Option<f64>,
    #[serde(
        default,
        rename = "coDistribution",
        alias = "co_distribution",
        deserialize_with = "deserialize_distribution"
    )]
    pub co_distribution: BTreeMap<String, f64>,
}

/// Classification of an assessment tool by its declared type label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ToolKind {
    EndOfTerm,
    InternalAssessment,
    Activity,
    LabPractical,
    ImprovementTest,
    #[default]
    Unspecified,
    Other(String),
}

impl ToolKind {
    pub fn label(&self) -> &str {
        match self {
            ToolKind::EndOfTerm => "Semester End Exam",
            ToolKind::InternalAssessment => "Internal Assessment",
            ToolKind::Activity => "Activity",
            ToolKind::LabPractical => "Lab Practical",
            ToolKind::ImprovementTest => "Improvement Test",
            ToolKind::Unspecified => "",
            ToolKind::Other(label) => label,
        }
    }

    /// Activity and practical tools carry one "Score" shared by every outcome.
    pub fn broadcasts_single_score(&self) -> bool {
        matches!(self, ToolKind::Activity | ToolKind::LabPractical)
    }
}

impl From<String> for ToolKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "semester end exam" | "see" => Self::EndOfTerm,
            "internal assessment" => Self::InternalAssessment,
            "activity" => Self::Activity,
            "lab practical" | "laboratory practical" => Self::LabPractical,
            "improvement test" => Self::ImprovementTest,
            "" => Self::Unspecified,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for ToolKind {
    fn from(value: Option<String>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<ToolKind> for String {
    fn from(value: ToolKind) -> Self {
        value.label().to_string()
    }
}

/// Raw marks for one student on one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(alias = "student", alias = "studentId")]
    pub student_id: String,
    #[serde(alias = "course", alias = "courseId")]
    pub course_id: CourseId,
    #[serde(alias = "assessmentName")]
    pub assessment_name: String,
    #[serde(default)]
    pub scores: BTreeMap<String, Value>,
    #[serde(
        default,
        alias = "improvementTargetName",
        alias = "improvement_test_for",
        skip_serializing_if = "Option::is_none"
    )]
    pub improvement_target_name: Option<String>,
}

pub(crate) const IMPROVEMENT_TARGET_KEY: &str = "_improvementTarget";

impl MarkRecord {
    /// Names of the assessments this record retakes: the dedicated field and the
    /// `_improvementTarget` score entry, whichever are set.
    pub fn improvement_targets(&self) -> impl Iterator<Item = &str> {
        let embedded = self
            .scores
            .get(IMPROVEMENT_TARGET_KEY)
            .and_then(Value::as_str);
        self.improvement_target_name.as_deref().into_iter().chain(embedded)
    }
}

/// CO → PO weight matrix for a course. Rows keep the PO order they were written in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticulationMatrix(pub BTreeMap<String, Map<String, Value>>);

/// Interpreted matrix cell. A zero weight carries no mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixWeight {
    Mapped(f64),
    Unmapped,
    Invalid,
}

impl ArticulationMatrix {
    pub fn row(&self, co: &str) -> Option<&Map<String, Value>> {
        self.0.get(co)
    }

    pub fn weight(cell: &Value) -> MatrixWeight {
        match cell {
            Value::Null => MatrixWeight::Unmapped,
            Value::String(text) if text.trim().is_empty() || text.trim() == "-" => {
                MatrixWeight::Unmapped
            }
            other => match numeric(other) {
                Some(weight) if weight == 0.0 => MatrixWeight::Unmapped,
                Some(weight) => MatrixWeight::Mapped(weight),
                None => MatrixWeight::Invalid,
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OutcomeEntry {
    Id(String),
    Detailed { id: String },
}

fn deserialize_outcome_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<OutcomeEntry>>::deserialize(deserializer)?;
    Ok(entries
        .unwrap_or_default()
        .into_iter()
        .map(|entry| match entry {
            OutcomeEntry::Id(id) | OutcomeEntry::Detailed { id } => id,
        })
        .collect())
}

pub(crate) fn deserialize_loose_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(numeric))
}

/// Distribution ceilings accept numbers or numeric strings; anything else counts as zero.
fn deserialize_distribution<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(co, value)| {
            let ceiling = numeric(&value).unwrap_or(0.0);
            (co, ceiling)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn course_accepts_loose_shapes() {
        let course: Course = serde_json::from_value(json!({
            "id": "C101",
            "cos": [{"id": "CO1", "description": "Model"}, "CO2"],
            "assessment_tools": [
                {"type": "Internal Assessment", "name": "IA 1", "maxMarks": "30",
                 "coDistribution": {"CO1": "15", "CO2": 15}},
                {"type": "SEE", "name": "Semester End Exam", "maxMarks": 100}
            ],
            "settings": {"courseType": "Lab", "indirect_attainment": {"CO1": "2.5"}, "targetThreshold": 60}
        }))
        .expect("course parses");

        assert_eq!(course.cos, vec!["CO1".to_string(), "CO2".to_string()]);
        assert_eq!(course.course_type(), CourseType::Lab);
        assert_eq!(course.assessment_tools[0].max_marks, Some(30.0));
        assert_eq!(course.assessment_tools[0].co_distribution.get("CO1"), Some(&15.0));
        assert_eq!(
            course.end_of_term_tool().map(|tool| tool.name.as_str()),
            Some("Semester End Exam")
        );
        assert_eq!(course.indirect_attainment("CO1"), 2.5);
        assert_eq!(course.indirect_attainment("CO2"), 0.0);
        assert!(course.settings.extra.contains_key("targetThreshold"));
    }

    #[test]
    fn tool_kind_matching_ignores_case_and_padding() {
        assert_eq!(ToolKind::from(" see ".to_string()), ToolKind::EndOfTerm);
        assert_eq!(
            ToolKind::from("laboratory PRACTICAL".to_string()),
            ToolKind::LabPractical
        );
        assert_eq!(
            ToolKind::from("Quiz".to_string()),
            ToolKind::Other("Quiz".to_string())
        );
    }

    #[test]
    fn null_type_labels_fall_back_to_defaults() {
        let course: Course = serde_json::from_value(json!({
            "id": "C1",
            "assessmentTools": [{"type": null, "name": "Quiz 1"}],
            "settings": {"courseType": null}
        }))
        .expect("course with null labels parses");

        assert_eq!(course.course_type(), CourseType::Theory);
        assert_eq!(course.assessment_tools[0].kind, ToolKind::Unspecified);
    }

    #[test]
    fn matrix_rows_keep_written_outcome_order() {
        let matrix: ArticulationMatrix =
            serde_json::from_str(r#"{"CO1": {"PO1": 3, "PO2": 2, "PO10": 1, "PSO1": 2}}"#)
                .expect("matrix parses");

        let row: Vec<&str> = matrix
            .row("CO1")
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default();
        assert_eq!(row, vec!["PO1", "PO2", "PO10", "PSO1"]);
    }

    #[test]
    fn internal_tools_skip_exam_and_improvement() {
        let course: Course = serde_json::from_value(json!({
            "id": "C1",
            "assessmentTools": [
                {"type": "Semester End Exam", "name": "SEE"},
                {"type": "Improvement Test", "name": "Improvement"},
                {"type": "Activity", "name": "Activity 1"},
                {"type": "Quiz", "name": "Quiz 1"}
            ]
        }))
        .expect("course parses");

        let names: Vec<&str> = course.internal_tools().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec!["Activity 1", "Quiz 1"]);
    }

    #[test]
    fn mark_record_exposes_both_improvement_targets() {
        let record: MarkRecord = serde_json::from_value(json!({
            "student": "S1",
            "course": "C1",
            "assessment_name": "Improvement",
            "improvement_test_for": "IA 1",
            "scores": {"_improvementTarget": "IA-2", "CO1": 4}
        }))
        .expect("record parses");

        let targets: Vec<&str> = record.improvement_targets().collect();
        assert_eq!(targets, vec!["IA 1", "IA-2"]);
    }

    #[test]
    fn matrix_cells_distinguish_unmapped_and_invalid() {
        assert_eq!(ArticulationMatrix::weight(&json!(3)), MatrixWeight::Mapped(3.0));
        assert_eq!(ArticulationMatrix::weight(&json!("2")), MatrixWeight::Mapped(2.0));
        assert_eq!(ArticulationMatrix::weight(&json!("-")), MatrixWeight::Unmapped);
        assert_eq!(ArticulationMatrix::weight(&json!(" ")), MatrixWeight::Unmapped);
        assert_eq!(ArticulationMatrix::weight(&Value::Null), MatrixWeight::Unmapped);
        assert_eq!(ArticulationMatrix::weight(&json!(0)), MatrixWeight::Unmapped);
        assert_eq!(ArticulationMatrix::weight(&json!("high")), MatrixWeight::Invalid);
    }
}
