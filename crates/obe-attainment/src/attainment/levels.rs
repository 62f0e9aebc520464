use serde::Serialize;

/// One row of the level table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelThreshold {
    pub level: u32,
    pub threshold: f64,
}

/// Maps a pass percentage onto a discrete attainment level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttainmentLevelTable {
    entries: Vec<LevelThreshold>,
}

impl AttainmentLevelTable {
    /// Builds the table from `(name, threshold)` pairs. The level is the number formed by the
    /// digits in the name ("level_3" → 3); names without digits are level 0.
    pub fn from_thresholds<'a, I>(thresholds: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut entries: Vec<LevelThreshold> = thresholds
            .into_iter()
            .map(|(name, threshold)| LevelThreshold {
                level: level_number(name),
                threshold,
            })
            .collect();
        // stable: equal thresholds keep encounter order
        entries.sort_by(|a, b| b.threshold.total_cmp(&a.threshold));
        Self { entries }
    }

    /// Highest-threshold-first scan; 0 when nothing matches.
    pub fn level_for(&self, percentage: f64) -> u32 {
        self.entries
            .iter()
            .find(|entry| percentage >= entry.threshold)
            .map_or(0, |entry| entry.level)
    }

    pub fn entries(&self) -> &[LevelThreshold] {
        &self.entries
    }
}

fn level_number(name: &str) -> u32 {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
