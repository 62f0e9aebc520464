mod aggregator;
pub mod policy;
pub mod value;

pub use aggregator::{CoLevels, CoTallies, CoTally, ScoreAggregator};
pub use value::ScoreValue;
