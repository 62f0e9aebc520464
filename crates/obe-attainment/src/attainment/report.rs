use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::composer::CoScoreIndex;
use super::domain::CourseId;
use super::propagation::PoAttainment;

/// Per-CO row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoAttainmentRecord {
    pub co: String,
    pub cie_level: u32,
    pub see_level: u32,
    pub direct_attainment: f64,
    pub indirect_attainment: f64,
    pub score_index: f64,
}

impl From<&CoScoreIndex> for CoAttainmentRecord {
    fn from(index: &CoScoreIndex) -> Self {
        Self {
            co: index.co.clone(),
            cie_level: index.cie_level,
            see_level: index.see_level,
            direct_attainment: round2(index.direct),
            indirect_attainment: round2(index.indirect),
            score_index: round2(index.score_index),
        }
    }
}

/// Per-PO row of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoAttainmentRecord {
    pub po: String,
    pub attained: f64,
    pub percentage: f64,
    /// Attainment before rounding. Absent on records read back from JSON.
    #[serde(skip)]
    pub(crate) unrounded: Option<f64>,
}

impl PoAttainmentRecord {
    /// Value the program rollup averages.
    pub fn exact_attained(&self) -> f64 {
        self.unrounded.unwrap_or(self.attained)
    }
}

impl From<&PoAttainment> for PoAttainmentRecord {
    fn from(value: &PoAttainment) -> Self {
        Self {
            po: value.po.clone(),
            attained: round2(value.attained),
            percentage: round2(value.percentage),
            unrounded: Some(value.attained),
        }
    }
}

/// Course attainment result handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttainmentReport {
    pub course_id: CourseId,
    pub scheme_used: String,
    pub co_attainment: Vec<CoAttainmentRecord>,
    pub po_attainment: Vec<PoAttainmentRecord>,
}

impl AttainmentReport {
    pub fn co(&self, co: &str) -> Option<&CoAttainmentRecord> {
        self.co_attainment.iter().find(|record| record.co == co)
    }

    pub fn po(&self, po: &str) -> Option<&PoAttainmentRecord> {
        self.po_attainment.iter().find(|record| record.po == po)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Outcome Attainment: {}", self.course_id);
        let _ = writeln!(output);
        let _ = writeln!(output, "Scheme: {}", self.scheme_used);
        let _ = writeln!(output);
        let _ = writeln!(output, "## Course Outcomes");
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "| CO | CIE level | SEE level | Direct | Indirect | Score index |"
        );
        let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- |");
        for record in &self.co_attainment {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {:.2} | {:.2} | {:.2} |",
                record.co,
                record.cie_level,
                record.see_level,
                record.direct_attainment,
                record.indirect_attainment,
                record.score_index
            );
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "## Program Outcomes");
        let _ = writeln!(output);
        if self.po_attainment.is_empty() {
            let _ = writeln!(output, "No articulation matrix mapped for this course.");
            return output;
        }
        let _ = writeln!(output, "| PO | Attained | Percentage |");
        let _ = writeln!(output, "| --- | --- | --- |");
        for record in &self.po_attainment {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2}% |",
                record.po, record.attained, record.percentage
            );
        }
        output
    }
}

/// Half-away-from-zero rounding to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
