use std::collections::BTreeMap;

use serde::Serialize;

use super::policy::{
    find_improvement, normalize_tool_scores, relevant_total, resolve_distribution,
    resolve_score_value,
};
use super::value::ScoreValue;
use crate::attainment::domain::{AssessmentTool, Course, MarkRecord};
use crate::attainment::levels::AttainmentLevelTable;

const END_OF_TERM_ALIASES: [&str; 2] = ["SEE", "Semester End Exam"];
const DEFAULT_END_OF_TERM_MAX: f64 = 100.0;

/// Attempt and pass counters for one outcome across both channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoTally {
    pub cie_attempts: u32,
    pub cie_passed: u32,
    pub see_attempts: u32,
    pub see_passed: u32,
}

impl CoTally {
    pub fn cie_percentage(&self) -> f64 {
        pass_percentage(self.cie_passed, self.cie_attempts)
    }

    pub fn see_percentage(&self) -> f64 {
        pass_percentage(self.see_passed, self.see_attempts)
    }
}

fn pass_percentage(passed: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    f64::from(passed) / f64::from(attempts) * 100.0
}

/// Tallies in outcome order: course COs first, then outcomes only a tool mentions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoTallies {
    order: Vec<String>,
    tallies: BTreeMap<String, CoTally>,
}

impl CoTallies {
    fn with_outcomes(cos: &[String]) -> Self {
        let mut tallies = Self::default();
        for co in cos {
            tallies.register(co);
        }
        tallies
    }

    fn register(&mut self, co: &str) -> &mut CoTally {
        if !self.tallies.contains_key(co) {
            self.order.push(co.to_string());
        }
        self.tallies.entry(co.to_string()).or_default()
    }

    fn tracked_mut(&mut self, co: &str) -> Option<&mut CoTally> {
        self.tallies.get_mut(co)
    }

    pub fn get(&self, co: &str) -> Option<&CoTally> {
        self.tallies.get(co)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CoTally)> {
        self.order
            .iter()
            .filter_map(|co| self.tallies.get(co).map(|tally| (co.as_str(), tally)))
    }

    /// Converts pass rates into levels; zero attempts always gives level 0.
    pub fn levels(&self, table: &AttainmentLevelTable) -> Vec<CoLevels> {
        self.iter()
            .map(|(co, tally)| CoLevels {
                co: co.to_string(),
                cie_level: table.level_for(tally.cie_percentage()),
                see_level: table.level_for(tally.see_percentage()),
            })
            .collect()
    }
}

/// Channel levels for one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoLevels {
    pub co: String,
    pub cie_level: u32,
    pub see_level: u32,
}

/// Counts substantive attempts and passes per outcome for a course.
pub struct ScoreAggregator<'a> {
    course: &'a Course,
    pass_criteria: f64,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(course: &'a Course, pass_criteria: f64) -> Self {
        Self {
            course,
            pass_criteria,
        }
    }

    pub fn tally(&self, marks: &[MarkRecord]) -> CoTallies {
        let mut tallies = CoTallies::with_outcomes(&self.course.cos);

        let mut by_student: BTreeMap<&str, Vec<&MarkRecord>> = BTreeMap::new();
        for record in marks {
            by_student
                .entry(record.student_id.as_str())
                .or_default()
                .push(record);
        }

        let end_of_term = self.course.end_of_term_tool();
        for records in by_student.values() {
            if let Some(tool) = end_of_term {
                self.tally_end_of_term(tool, records, &mut tallies);
            }
            for tool in self.course.internal_tools() {
                self.tally_internal(tool, records, &mut tallies);
            }
        }

        tallies
    }

    /// The exam is marked as one total, so every mapped outcome shares the same verdict.
    fn tally_end_of_term(
        &self,
        tool: &AssessmentTool,
        records: &[&MarkRecord],
        tallies: &mut CoTallies,
    ) {
        let Some(record) = records.iter().find(|record| {
            record.assessment_name == tool.name
                || END_OF_TERM_ALIASES.contains(&record.assessment_name.as_str())
        }) else {
            return;
        };
        if record.scores.is_empty() {
            return;
        }

        let values: Vec<ScoreValue> = record.scores.values().map(ScoreValue::from_json).collect();
        if values.iter().any(|value| value.is_absent()) {
            return;
        }

        let obtained: f64 = values.iter().filter_map(|value| value.as_number()).sum();
        let target = tool.max_marks.unwrap_or(DEFAULT_END_OF_TERM_MAX) * self.pass_criteria / 100.0;
        let passed = obtained >= target;

        let mapped: Vec<&String> = if tool.co_distribution.is_empty() {
            self.course.cos.iter().collect()
        } else {
            tool.co_distribution.keys().collect()
        };

        for co in mapped {
            if let Some(tally) = tallies.tracked_mut(co) {
                tally.see_attempts += 1;
                if passed {
                    tally.see_passed += 1;
                }
            }
        }
    }

    fn tally_internal(&self, tool: &AssessmentTool, records: &[&MarkRecord], tallies: &mut CoTallies) {
        let course_type = self.course.course_type();
        let distribution = resolve_distribution(tool, &self.course.cos);

        let empty = BTreeMap::new();
        let raw = records
            .iter()
            .find(|record| record.assessment_name == tool.name)
            .map_or(&empty, |record| &record.scores);
        let mut scores =
            normalize_tool_scores(raw, tool, course_type, &self.course.cos, &distribution);

        if let Some(retake) = find_improvement(records, &tool.name).filter(|r| !r.scores.is_empty()) {
            let improved = normalize_tool_scores(
                &retake.scores,
                tool,
                course_type,
                &self.course.cos,
                &distribution,
            );
            if relevant_total(&improved, &distribution) > relevant_total(&scores, &distribution) {
                scores = improved;
            }
        }

        for (co, co_max) in &distribution {
            let tally = tallies.register(co);
            let Some(ScoreValue::Numeric(value)) = resolve_score_value(&scores, co) else {
                continue;
            };
            tally.cie_attempts += 1;
            if value >= co_max * self.pass_criteria / 100.0 {
                tally.cie_passed += 1;
            }
        }
    }
}
