use serde_json::Value;

const ABSENCE_SENTINELS: [&str; 5] = ["AB", "ABSENT", "A", "NA", "-"];

/// A raw score cell after normalization. Every threshold comparison goes through this.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreValue {
    Numeric(f64),
    Absent,
    Unparsable,
}

impl ScoreValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(number) => number
                .as_f64()
                .filter(|n| n.is_finite())
                .map_or(Self::Unparsable, Self::Numeric),
            Value::String(text) => Self::from_text(text),
            _ => Self::Unparsable,
        }
    }

    pub fn from_text(text: &str) -> Self {
        if is_absence_sentinel(text) {
            return Self::Absent;
        }
        match text.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Self::Numeric(number),
            _ => Self::Unparsable,
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Numeric(number) => Some(number),
            Self::Absent | Self::Unparsable => None,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Trimmed, case-insensitive match against the absence markers.
pub fn is_absence_sentinel(text: &str) -> bool {
    let trimmed = text.trim();
    ABSENCE_SENTINELS
        .iter()
        .any(|sentinel| sentinel.eq_ignore_ascii_case(trimmed))
}

/// Numbers or numeric strings; anything else is `None`.
pub fn numeric(value: &Value) -> Option<f64> {
    ScoreValue::from_json(value).as_number()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinels_ignore_case_and_whitespace() {
        for raw in ["ab", " AB ", "Absent", "a", "na", " - "] {
            assert_eq!(ScoreValue::from_json(&json!(raw)), ScoreValue::Absent, "{raw:?}");
        }
    }

    #[test]
    fn numeric_strings_and_numbers_parse() {
        assert_eq!(ScoreValue::from_json(&json!(12)), ScoreValue::Numeric(12.0));
        assert_eq!(ScoreValue::from_json(&json!(" 7.5 ")), ScoreValue::Numeric(7.5));
        assert_eq!(numeric(&json!("3")), Some(3.0));
    }

    #[test]
    fn everything_else_is_unparsable() {
        for raw in [json!("twelve"), json!(""), json!(null), json!(true), json!([1]), json!("NaN")] {
            assert_eq!(ScoreValue::from_json(&raw), ScoreValue::Unparsable, "{raw}");
        }
    }
}
