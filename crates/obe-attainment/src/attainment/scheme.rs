use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{deserialize_loose_number, Course};
use super::levels::AttainmentLevelTable;
use super::scoring::value::numeric;

pub const DEFAULT_PASS_CRITERIA: f64 = 50.0;
pub const DEFAULT_DIRECT_WEIGHT: f64 = 80.0;
pub const DEFAULT_INDIRECT_WEIGHT: f64 = 20.0;
pub const DEFAULT_NORMALIZATION_FACTOR: f64 = 3.0;

const GLOBAL_DEFAULT_LABEL: &str = "Global Default";
const FAILSAFE_DEFAULT_LABEL: &str = "Failsafe Default";

/// Scheme settings exactly as stored; every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeSettings {
    #[serde(
        default,
        deserialize_with = "deserialize_loose_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pass_criteria: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attainment_levels: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weightage: Option<WeightageSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_calculation: Option<PoCalculationSettings>,
}

impl SchemeSettings {
    /// An empty settings object does not select its tier.
    pub fn is_empty(&self) -> bool {
        self.pass_criteria.is_none()
            && self.attainment_levels.is_none()
            && self.weightage.is_none()
            && self.po_calculation.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightageSettings {
    #[serde(
        default,
        deserialize_with = "deserialize_loose_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub direct: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_loose_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub indirect: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoCalculationSettings {
    #[serde(
        default,
        deserialize_with = "deserialize_loose_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub normalization_factor: Option<f64>,
}

/// Direct/indirect blend, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weightage {
    pub direct: f64,
    pub indirect: f64,
}

impl Default for Weightage {
    fn default() -> Self {
        Self {
            direct: DEFAULT_DIRECT_WEIGHT,
            indirect: DEFAULT_INDIRECT_WEIGHT,
        }
    }
}

impl From<&WeightageSettings> for Weightage {
    fn from(settings: &WeightageSettings) -> Self {
        Self {
            direct: settings.direct.unwrap_or(DEFAULT_DIRECT_WEIGHT),
            indirect: settings.indirect.unwrap_or(DEFAULT_INDIRECT_WEIGHT),
        }
    }
}

/// Fully populated configuration for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemeConfig {
    pub pass_criteria: f64,
    pub attainment_levels: BTreeMap<String, f64>,
    pub weightage: Weightage,
    pub normalization_factor: f64,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            pass_criteria: DEFAULT_PASS_CRITERIA,
            attainment_levels: default_levels(),
            weightage: Weightage::default(),
            normalization_factor: DEFAULT_NORMALIZATION_FACTOR,
        }
    }
}

fn default_levels() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("level_3".to_string(), 70.0),
        ("level_2".to_string(), 60.0),
        ("level_1".to_string(), 50.0),
    ])
}

impl SchemeConfig {
    /// Keys missing from the selected tier take the built-in defaults.
    pub fn from_settings(settings: &SchemeSettings) -> Self {
        let attainment_levels = settings
            .attainment_levels
            .as_ref()
            .map(|levels| {
                levels
                    .iter()
                    .map(|(name, threshold)| (name.clone(), numeric(threshold).unwrap_or(0.0)))
                    .collect()
            })
            .unwrap_or_else(default_levels);

        let normalization_factor = settings
            .po_calculation
            .as_ref()
            .and_then(|po| po.normalization_factor)
            .filter(|factor| *factor > 0.0)
            .unwrap_or(DEFAULT_NORMALIZATION_FACTOR);

        Self {
            pass_criteria: settings.pass_criteria.unwrap_or(DEFAULT_PASS_CRITERIA),
            attainment_levels,
            weightage: settings
                .weightage
                .as_ref()
                .map(Weightage::from)
                .unwrap_or_default(),
            normalization_factor,
        }
    }

    pub fn level_table(&self) -> AttainmentLevelTable {
        AttainmentLevelTable::from_thresholds(
            self.attainment_levels
                .iter()
                .map(|(name, threshold)| (name.as_str(), *threshold)),
        )
    }
}

/// Which configuration tier supplied the active scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tier", content = "name", rename_all = "snake_case")]
pub enum SchemeSource {
    Course(String),
    Global,
    Failsafe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedScheme {
    pub source: SchemeSource,
    pub config: SchemeConfig,
}

impl ResolvedScheme {
    pub fn failsafe() -> Self {
        Self {
            source: SchemeSource::Failsafe,
            config: SchemeConfig::default(),
        }
    }

    /// Name reported in `scheme_used`.
    pub fn label(&self) -> &str {
        match &self.source {
            SchemeSource::Course(name) => name,
            SchemeSource::Global => GLOBAL_DEFAULT_LABEL,
            SchemeSource::Failsafe => FAILSAFE_DEFAULT_LABEL,
        }
    }
}

/// Course scheme settings, else the global record, else the failsafe defaults. Tiers are never
/// merged.
pub fn resolve_scheme(course: &Course, global: Option<&SchemeSettings>) -> ResolvedScheme {
    if let Some(scheme) = &course.scheme {
        if let Some(settings) = scheme.settings.as_ref().filter(|s| !s.is_empty()) {
            return ResolvedScheme {
                source: SchemeSource::Course(scheme.name.clone()),
                config: SchemeConfig::from_settings(settings),
            };
        }
    }

    match global.filter(|settings| !settings.is_empty()) {
        Some(settings) => ResolvedScheme {
            source: SchemeSource::Global,
            config: SchemeConfig::from_settings(settings),
        },
        None => ResolvedScheme::failsafe(),
    }
}

/// Whether `resolve_scheme` needs the global record at all.
pub(crate) fn course_scheme_applies(course: &Course) -> bool {
    course
        .scheme
        .as_ref()
        .and_then(|scheme| scheme.settings.as_ref())
        .is_some_and(|settings| !settings.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course(scheme: Value) -> Course {
        serde_json::from_value(json!({
            "id": "C101",
            "cos": ["CO1"],
            "scheme": scheme,
        }))
        .expect("course parses")
    }

    fn global() -> SchemeSettings {
        serde_json::from_value(json!({
            "pass_criteria": 40,
            "attainment_levels": {"level_3": 80, "level_2": 65, "level_1": 40},
            "weightage": {"direct": 90, "indirect": 10},
            "po_calculation": {"normalization_factor": 3}
        }))
        .expect("settings parse")
    }

    #[test]
    fn course_scheme_takes_priority() {
        let course = course(json!({
            "id": "S2022",
            "name": "2022 Scheme",
            "settings": {"pass_criteria": "60", "weightage": {"direct": 70, "indirect": 30}}
        }));
        let resolved = resolve_scheme(&course, Some(&global()));

        assert_eq!(resolved.label(), "2022 Scheme");
        assert_eq!(resolved.config.pass_criteria, 60.0);
        assert_eq!(resolved.config.weightage.direct, 70.0);
        // absent keys come from the defaults, not from the global record
        assert_eq!(resolved.config.attainment_levels, default_levels());
    }

    #[test]
    fn empty_course_settings_defer_to_global() {
        let course = course(json!({"name": "2018 Scheme", "settings": {}}));
        let resolved = resolve_scheme(&course, Some(&global()));

        assert_eq!(resolved.source, SchemeSource::Global);
        assert_eq!(resolved.label(), "Global Default");
        assert_eq!(resolved.config.pass_criteria, 40.0);
        assert!(!course_scheme_applies(&course));
    }

    #[test]
    fn falls_back_to_failsafe_defaults() {
        let course = course(Value::Null);
        let resolved = resolve_scheme(&course, None);

        assert_eq!(resolved, ResolvedScheme::failsafe());
        assert_eq!(resolved.config.pass_criteria, 50.0);
        assert_eq!(resolved.config.weightage, Weightage::default());
        assert_eq!(resolved.config.normalization_factor, 3.0);
        assert_eq!(resolved.config.attainment_levels.get("level_3"), Some(&70.0));
    }

    #[test]
    fn non_positive_normalization_factor_uses_default() {
        let settings: SchemeSettings =
            serde_json::from_value(json!({"po_calculation": {"normalization_factor": 0}}))
                .expect("settings parse");
        assert_eq!(SchemeConfig::from_settings(&settings).normalization_factor, 3.0);
    }
}
