use std::collections::BTreeMap;

use serde::Serialize;

use super::composer::CoScoreIndex;
use super::domain::{ArticulationMatrix, MatrixWeight};

/// Averaged PO attainment, unrounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoAttainment {
    pub po: String,
    pub attained: f64,
    pub percentage: f64,
}

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: u32,
}

/// Pushes CO score indices through the matrix. The average divides by the number of mapped
/// COs that contributed, not by the number of course COs.
pub fn propagate(
    indices: &[CoScoreIndex],
    matrix: &ArticulationMatrix,
    normalization_factor: f64,
) -> Vec<PoAttainment> {
    let mut order: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, Accumulator> = BTreeMap::new();

    for index in indices {
        let Some(row) = matrix.row(&index.co) else {
            continue;
        };
        for (po, cell) in row {
            let MatrixWeight::Mapped(weight) = ArticulationMatrix::weight(cell) else {
                continue;
            };
            if !totals.contains_key(po) {
                order.push(po.clone());
            }
            let entry = totals.entry(po.clone()).or_default();
            entry.sum += weight * index.score_index / normalization_factor;
            entry.count += 1;
        }
    }

    order
        .into_iter()
        .filter_map(|po| {
            let total = totals.get(&po)?;
            let attained = total.sum / f64::from(total.count);
            Some(PoAttainment {
                percentage: attained / normalization_factor * 100.0,
                attained,
                po,
            })
        })
        .collect()
}
