//! Field value validation.
//!
//! Rules are evaluated in a fixed order and the first failure wins:
//! required, min length, max length, pattern, min age. Only the required
//! rule looks at an empty value; the others apply to provided values.

use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Unit};
use regex::Regex;

use acutis_core::models::field::{FieldDefinition, FieldValue};

/// Validate `value` against `field`, using today's UTC date for age rules.
///
/// Returns the first error message, or `None` when the value is acceptable.
pub fn validate_field(field: &FieldDefinition, value: Option<&FieldValue>) -> Option<String> {
    validate_field_on(field, value, today_utc())
}

/// Validate `value` against `field` as of `today`.
pub fn validate_field_on(
    field: &FieldDefinition,
    value: Option<&FieldValue>,
    today: Date,
) -> Option<String> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => {
            return field
                .is_required()
                .then(|| format!("{} is required", field.label));
        }
    };

    let Some(rules) = &field.validation else {
        return None;
    };

    if let Some(text) = value.as_str() {
        let len = text.chars().count();

        if let Some(min) = rules.min_length
            && len < min
        {
            return Some(format!("{} must be at least {min} characters", field.label));
        }

        if let Some(max) = rules.max_length
            && len > max
        {
            return Some(format!("{} must be no more than {max} characters", field.label));
        }

        if let Some(pattern) = &rules.pattern {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(text) => {
                    return Some(format!("{} format is invalid", field.label));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        field_id = %field.id,
                        pattern = %pattern,
                        error = %e,
                        "skipping uncompilable validation pattern"
                    );
                }
            }
        }

        if let Some(min_age) = rules.min_age
            && let Some(born) = parse_date(text)
            && age_in_years(born, today) < i64::from(min_age)
        {
            return Some(format!("Must be at least {min_age} years old"));
        }
    }

    None
}

/// Whole calendar years elapsed between `born` and `today`. Negative for
/// dates in the future.
pub fn age_in_years(born: Date, today: Date) -> i64 {
    match born.until((Unit::Year, today)) {
        Ok(span) => i64::from(span.get_years()),
        Err(_) => 0,
    }
}

/// Parse a date-ish answer: `2001-04-30`, `2001-04-30T09:00:00`, or an
/// RFC 3339 timestamp (taken in UTC).
pub fn parse_date(text: &str) -> Option<Date> {
    if let Ok(date) = text.parse::<Date>() {
        return Some(date);
    }
    if let Ok(ts) = text.parse::<Timestamp>() {
        return Some(ts.to_zoned(TimeZone::UTC).date());
    }
    text.parse::<DateTime>().ok().map(|dt| dt.date())
}

fn today_utc() -> Date {
    Timestamp::now().to_zoned(TimeZone::UTC).date()
}

#[cfg(test)]
mod tests {
    use super::*;
    use acutis_core::models::field::{FieldType, FieldValidation};
    use jiff::civil::date;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    fn with_rules(rules: FieldValidation) -> FieldDefinition {
        FieldDefinition::new("f", FieldType::Text, "Code", false).with_validation(rules)
    }

    #[test]
    fn required_rejects_empty_and_absent() {
        let field = FieldDefinition::new("name", FieldType::Text, "Name", true);
        assert_eq!(
            validate_field(&field, Some(&text(""))),
            Some("Name is required".to_string())
        );
        assert_eq!(
            validate_field(&field, None),
            Some("Name is required".to_string())
        );
        assert_eq!(validate_field(&field, Some(&text("Sam"))), None);
    }

    #[test]
    fn false_and_zero_count_as_provided() {
        let field = FieldDefinition::new("n", FieldType::Number, "Count", true);
        assert_eq!(validate_field(&field, Some(&FieldValue::Number(0.0))), None);
        assert_eq!(validate_field(&field, Some(&FieldValue::Bool(false))), None);
    }

    #[test]
    fn optional_empty_value_skips_length_rules() {
        let field = with_rules(FieldValidation {
            min_length: Some(3),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&text(""))), None);
        assert_eq!(validate_field(&field, None), None);
    }

    #[test]
    fn length_bounds() {
        let field = with_rules(FieldValidation {
            min_length: Some(2),
            max_length: Some(4),
            ..Default::default()
        });
        assert_eq!(
            validate_field(&field, Some(&text("a"))),
            Some("Code must be at least 2 characters".to_string())
        );
        assert_eq!(
            validate_field(&field, Some(&text("abcde"))),
            Some("Code must be no more than 4 characters".to_string())
        );
        assert_eq!(validate_field(&field, Some(&text("abc"))), None);
    }

    #[test]
    fn pattern_rule() {
        let field = with_rules(FieldValidation {
            pattern: Some("^[0-9]{5}$".to_string()),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&text("12345"))), None);
        assert_eq!(
            validate_field(&field, Some(&text("1234"))),
            Some("Code format is invalid".to_string())
        );
        assert!(validate_field(&field, Some(&text("abcde"))).is_some());
    }

    #[test]
    fn bad_pattern_is_skipped() {
        let field = with_rules(FieldValidation {
            pattern: Some("([unclosed".to_string()),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&text("anything"))), None);
    }

    #[test]
    fn rules_short_circuit_in_order() {
        let field = with_rules(FieldValidation {
            min_length: Some(10),
            pattern: Some("^x+$".to_string()),
            ..Default::default()
        });
        assert_eq!(
            validate_field(&field, Some(&text("abc"))),
            Some("Code must be at least 10 characters".to_string())
        );
    }

    #[test]
    fn min_age_boundary() {
        let field = FieldDefinition::new("dob", FieldType::Date, "Date of Birth", true)
            .with_validation(FieldValidation {
                min_age: Some(18),
                ..Default::default()
            });
        let today = date(2026, 10, 17);

        assert_eq!(validate_field_on(&field, Some(&text("2008-10-17")), today), None);
        assert_eq!(
            validate_field_on(&field, Some(&text("2008-10-18")), today),
            Some("Must be at least 18 years old".to_string())
        );
    }

    #[test]
    fn min_age_ignores_unparseable_dates() {
        let field = with_rules(FieldValidation {
            min_age: Some(18),
            ..Default::default()
        });
        assert_eq!(
            validate_field_on(&field, Some(&text("not a date")), date(2026, 1, 1)),
            None
        );
    }

    #[test]
    fn parse_date_accepts_timestamps() {
        assert_eq!(parse_date("1990-02-03"), Some(date(1990, 2, 3)));
        assert_eq!(parse_date("1990-02-03T10:00:00Z"), Some(date(1990, 2, 3)));
        assert_eq!(parse_date("1990-02-03T10:00:00"), Some(date(1990, 2, 3)));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn leap_day_birthdays() {
        assert_eq!(age_in_years(date(2008, 2, 29), date(2026, 2, 27)), 17);
        assert_eq!(age_in_years(date(2008, 2, 29), date(2026, 3, 1)), 18);
    }
}
