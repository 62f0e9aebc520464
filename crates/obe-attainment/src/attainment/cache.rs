use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::domain::{ArticulationMatrix, Course, CourseId, MarkRecord};
use super::report::AttainmentReport;
use super::scheme::ResolvedScheme;

/// Everything a report is derived from, hashed as one canonical JSON document.
#[derive(Serialize)]
struct FingerprintInput<'a> {
    course: &'a Course,
    marks: &'a [MarkRecord],
    matrix: Option<&'a ArticulationMatrix>,
    scheme: &'a ResolvedScheme,
}

/// Hex SHA-256 over the inputs of one calculation.
pub fn snapshot_fingerprint(
    course: &Course,
    marks: &[MarkRecord],
    matrix: Option<&ArticulationMatrix>,
    scheme: &ResolvedScheme,
) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(&FingerprintInput {
        course,
        marks,
        matrix,
        scheme,
    })?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

struct CachedReport {
    fingerprint: String,
    report: AttainmentReport,
}

/// Latest report per course, reused only while the input fingerprint is unchanged.
#[derive(Default)]
pub struct ReportCache {
    entries: Mutex<HashMap<CourseId, CachedReport>>,
}

impl ReportCache {
    pub fn get(&self, course_id: &CourseId, fingerprint: &str) -> Option<AttainmentReport> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(course_id)
            .filter(|cached| cached.fingerprint == fingerprint)
            .map(|cached| cached.report.clone())
    }

    pub fn insert(&self, fingerprint: String, report: AttainmentReport) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(
            report.course_id.clone(),
            CachedReport {
                fingerprint,
                report,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
