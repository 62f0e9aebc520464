use tracing::debug;

use super::composer::compose_score_indices;
use super::domain::{ArticulationMatrix, Course, MarkRecord};
use super::levels::AttainmentLevelTable;
use super::propagation::propagate;
use super::report::{AttainmentReport, CoAttainmentRecord, PoAttainmentRecord};
use super::scheme::ResolvedScheme;
use super::scoring::ScoreAggregator;

/// Stateless evaluator that runs aggregation, composition and propagation for one scheme.
pub struct AttainmentEngine {
    scheme: ResolvedScheme,
    levels: AttainmentLevelTable,
}

impl AttainmentEngine {
    pub fn new(scheme: ResolvedScheme) -> Self {
        let levels = scheme.config.level_table();
        Self { scheme, levels }
    }

    pub fn evaluate(
        &self,
        course: &Course,
        marks: &[MarkRecord],
        matrix: Option<&ArticulationMatrix>,
    ) -> AttainmentReport {
        let config = &self.scheme.config;

        let tallies = ScoreAggregator::new(course, config.pass_criteria).tally(marks);
        let levels = tallies.levels(&self.levels);
        debug!(course_id = %course.id, outcomes = levels.len(), marks = marks.len(), "co levels computed");

        let indices = compose_score_indices(&levels, course, config.weightage);

        let po_attainment = match matrix {
            Some(matrix) => propagate(&indices, matrix, config.normalization_factor)
                .iter()
                .map(PoAttainmentRecord::from)
                .collect(),
            None => Vec::new(),
        };
        debug!(course_id = %course.id, program_outcomes = po_attainment.len(), "po attainment computed");

        AttainmentReport {
            course_id: course.id.clone(),
            scheme_used: self.scheme.label().to_string(),
            co_attainment: indices.iter().map(CoAttainmentRecord::from).collect(),
            po_attainment,
        }
    }
}
