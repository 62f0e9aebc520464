use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::CourseId;
use super::report::{round2, AttainmentReport};
use super::scheme::Weightage;
use super::scoring::value::numeric;

/// Program-level survey results, PO → value, one map per survey.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSurveys {
    #[serde(default)]
    pub exit_survey: BTreeMap<String, Value>,
    #[serde(default)]
    pub employer_survey: BTreeMap<String, Value>,
    #[serde(default)]
    pub alumni_survey: BTreeMap<String, Value>,
}

impl ProgramSurveys {
    fn outcomes(&self) -> impl Iterator<Item = &String> {
        self.exit_survey
            .keys()
            .chain(self.employer_survey.keys())
            .chain(self.alumni_survey.keys())
    }

    /// Mean of the surveys that reported a non-zero value for the outcome.
    pub fn indirect_attainment(&self, po: &str) -> f64 {
        let values: Vec<f64> = [&self.exit_survey, &self.employer_survey, &self.alumni_survey]
            .into_iter()
            .filter_map(|survey| survey.get(po).and_then(numeric))
            .filter(|value| *value != 0.0)
            .collect();
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// PO attainment of one course as it enters the program rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOutcomeRow {
    pub course_id: CourseId,
    pub po_attainment: BTreeMap<String, f64>,
}

/// Program-level summary for one PO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramOutcomeSummary {
    pub po: String,
    pub direct: f64,
    pub indirect: f64,
    pub weighted_direct: f64,
    pub weighted_indirect: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramAttainment {
    pub weightage: Weightage,
    pub courses: Vec<CourseOutcomeRow>,
    pub outcomes: Vec<ProgramOutcomeSummary>,
}

impl ProgramAttainment {
    pub fn outcome(&self, po: &str) -> Option<&ProgramOutcomeSummary> {
        self.outcomes.iter().find(|summary| summary.po == po)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "# Program Outcome Attainment");
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "Weightage: direct {:.0}% / indirect {:.0}%",
            self.weightage.direct, self.weightage.indirect
        );
        let _ = writeln!(output, "Courses: {}", self.courses.len());
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "| PO | Direct | Indirect | Weighted direct | Weighted indirect | Total |"
        );
        let _ = writeln!(output, "| --- | --- | --- | --- | --- | --- |");
        for summary in &self.outcomes {
            let _ = writeln!(
                output,
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |",
                summary.po,
                summary.direct,
                summary.indirect,
                summary.weighted_direct,
                summary.weighted_indirect,
                summary.total
            );
        }
        output
    }
}

/// PSO ids sort after every PO; within a group the embedded number decides.
fn outcome_order(left: &str, right: &str) -> Ordering {
    fn key(id: &str) -> (u8, u64) {
        let upper = id.trim().to_ascii_uppercase();
        let group = if upper.starts_with("PSO") {
            1
        } else if upper.starts_with("PO") {
            0
        } else {
            2
        };
        let number = upper
            .split(|c: char| !c.is_ascii_digit())
            .find(|digits| !digits.is_empty())
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0);
        (group, number)
    }
    key(left).cmp(&key(right)).then_with(|| left.cmp(right))
}

/// Averages course PO attainment and blends it with survey evidence. Course values enter the
/// average unrounded; only the summaries are rounded.
pub fn rollup(
    reports: &[AttainmentReport],
    surveys: &ProgramSurveys,
    weightage: Weightage,
) -> ProgramAttainment {
    let courses: Vec<CourseOutcomeRow> = reports
        .iter()
        .map(|report| CourseOutcomeRow {
            course_id: report.course_id.clone(),
            po_attainment: report
                .po_attainment
                .iter()
                .map(|record| (record.po.clone(), record.attained))
                .collect(),
        })
        .collect();

    let mut outcomes: Vec<&String> = reports
        .iter()
        .flat_map(|report| report.po_attainment.iter().map(|record| &record.po))
        .chain(surveys.outcomes())
        .collect();
    outcomes.sort_by(|left, right| outcome_order(left, right));
    outcomes.dedup();

    let outcomes = outcomes
        .into_iter()
        .map(|po| {
            let attained: Vec<f64> = reports
                .iter()
                .filter_map(|report| report.po(po).map(|record| record.exact_attained()))
                .collect();
            let direct = if attained.is_empty() {
                0.0
            } else {
                attained.iter().sum::<f64>() / attained.len() as f64
            };
            let indirect = surveys.indirect_attainment(po);
            let weighted_direct = direct * weightage.direct / 100.0;
            let weighted_indirect = indirect * weightage.indirect / 100.0;
            ProgramOutcomeSummary {
                po: po.clone(),
                direct: round2(direct),
                indirect: round2(indirect),
                weighted_direct: round2(weighted_direct),
                weighted_indirect: round2(weighted_indirect),
                total: round2(weighted_direct + weighted_indirect),
            }
        })
        .collect();

    ProgramAttainment {
        weightage,
        courses,
        outcomes,
    }
}
