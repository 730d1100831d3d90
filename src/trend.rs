//! Trend normalization.
//!
//! CGM uploaders report the glucose trend either as a numeric code or as a
//! Dexcom-style direction label. Both are folded into one numeric scale
//! where 1 is rising fastest and 7 is falling fastest:
//!
//! | label           | code |
//! |-----------------|------|
//! | `DoubleUp`      | 1    |
//! | `FortyFiveUp`   | 2    |
//! | `SingleUp`      | 3    |
//! | `Flat`          | 4    |
//! | `SingleDown`    | 5    |
//! | `FortyFiveDown` | 6    |
//! | `DoubleDown`    | 7    |
//!
//! Unknown labels land on `Flat`; a missing trend is 0.

use crate::value::AnyValue;

/// Code used for labels outside the table.
pub const FLAT_TREND: f32 = 4.0;

/// Code used when no trend was reported at all.
pub const MISSING_TREND: f32 = 0.0;

/// Map a direction label to its trend code, `None` for unknown labels.
pub fn trend_code(label: &str) -> Option<f32> {
    let code = match label {
        "DoubleDown" => 7.0,
        "FortyFiveDown" => 6.0,
        "SingleDown" => 5.0,
        "Flat" => 4.0,
        "SingleUp" => 3.0,
        "FortyFiveUp" => 2.0,
        "DoubleUp" => 1.0,
        _ => return None,
    };
    Some(code)
}

/// Normalize a raw trend value to its canonical code.
///
/// Numbers (including numeric strings) pass through unchanged, labels go
/// through [`trend_code`] with unknown labels mapped to [`FLAT_TREND`], and
/// absent, null or boolean values yield [`MISSING_TREND`].
pub fn normalize_trend(value: Option<&AnyValue>) -> f32 {
    let Some(value) = value else {
        return MISSING_TREND;
    };

    if let Some(number) = value.as_number() {
        return number as f32;
    }

    match value {
        AnyValue::Text(label) => trend_code(label.trim()).unwrap_or(FLAT_TREND),
        _ => MISSING_TREND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> AnyValue {
        AnyValue::Text(s.to_string())
    }

    #[test]
    fn test_labels_map_to_codes() {
        let table = [
            ("DoubleDown", 7.0),
            ("FortyFiveDown", 6.0),
            ("SingleDown", 5.0),
            ("Flat", 4.0),
            ("SingleUp", 3.0),
            ("FortyFiveUp", 2.0),
            ("DoubleUp", 1.0),
        ];
        for (label, code) in table {
            assert_eq!(normalize_trend(Some(&text(label))), code, "label {label}");
        }
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(normalize_trend(Some(&AnyValue::Integer(3))), 3.0);
        assert_eq!(normalize_trend(Some(&AnyValue::Float(2.5))), 2.5);
        assert_eq!(normalize_trend(Some(&AnyValue::Double(6.0))), 6.0);
        assert_eq!(normalize_trend(Some(&text("5"))), 5.0);
    }

    #[test]
    fn test_unknown_and_missing() {
        assert_eq!(normalize_trend(Some(&text("NOT COMPUTABLE"))), FLAT_TREND);
        assert_eq!(normalize_trend(Some(&text(""))), FLAT_TREND);
        assert_eq!(normalize_trend(None), MISSING_TREND);
        assert_eq!(normalize_trend(Some(&AnyValue::Null)), MISSING_TREND);
        assert_eq!(normalize_trend(Some(&AnyValue::Boolean(true))), MISSING_TREND);
    }
}
