//! Course and program outcome attainment.
//!
//! Marks are tallied per course outcome, turned into discrete attainment levels, blended with
//! survey evidence and pushed through the articulation matrix onto program outcomes. All
//! computation is synchronous over an immutable snapshot of course, marks and matrix data.

pub mod cache;
pub mod composer;
pub mod domain;
pub mod engine;
pub mod import;
pub mod levels;
pub mod program;
pub mod propagation;
pub mod report;
pub mod repository;
pub mod router;
pub mod scheme;
pub mod scoring;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use cache::ReportCache;
pub use domain::{
    ArticulationMatrix, AssessmentTool, Course, CourseId, CourseSettings, CourseType, MarkRecord,
    MatrixWeight, SchemeRef, ToolKind,
};
pub use engine::AttainmentEngine;
pub use import::{read_marks_csv, read_marks_csv_path, MarksImportError};
pub use levels::{AttainmentLevelTable, LevelThreshold};
pub use program::{
    rollup, CourseOutcomeRow, ProgramAttainment, ProgramOutcomeSummary, ProgramSurveys,
};
pub use report::{AttainmentReport, CoAttainmentRecord, PoAttainmentRecord};
pub use repository::{AttainmentRepository, RepositoryError};
pub use router::attainment_router;
pub use scheme::{
    resolve_scheme, ResolvedScheme, SchemeConfig, SchemeSettings, SchemeSource, Weightage,
    WeightageSettings,
};
pub use scoring::{ScoreAggregator, ScoreValue};
pub use service::{AttainmentService, AttainmentServiceError, ProgramAttainmentRequest};
pub use snapshot::{Snapshot, SnapshotError, SnapshotRepository};
