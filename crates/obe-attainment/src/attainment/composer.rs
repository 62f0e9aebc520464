use serde::Serialize;

use super::domain::Course;
use super::scheme::Weightage;
use super::scoring::CoLevels;

/// Direct, indirect and blended attainment for one outcome, unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoScoreIndex {
    pub co: String,
    pub cie_level: u32,
    pub see_level: u32,
    pub direct: f64,
    pub indirect: f64,
    pub score_index: f64,
}

/// Blends channel levels with survey evidence using the scheme weightage.
pub fn compose_score_indices(
    levels: &[CoLevels],
    course: &Course,
    weightage: Weightage,
) -> Vec<CoScoreIndex> {
    let direct_weight = weightage.direct / 100.0;
    let indirect_weight = weightage.indirect / 100.0;

    levels
        .iter()
        .map(|level| {
            let direct = f64::from(level.cie_level + level.see_level) / 2.0;
            let indirect = course.indirect_attainment(&level.co);
            CoScoreIndex {
                co: level.co.clone(),
                cie_level: level.cie_level,
                see_level: level.see_level,
                direct,
                indirect,
                score_index: direct * direct_weight + indirect * indirect_weight,
            }
        })
        .collect()
}
