//! Reusable field predicates.
//!
//! A predicate inspects one field value and returns the error to record, if
//! any. Predicates return `None` for values of a type they do not understand,
//! with the exception of [`required`], which treats absence as a failure.
//! Format checks (`email`, `url`, `uuid`, `phone_number`, `zip_code`) accept
//! the empty string; pair them with [`required`] for mandatory fields.
//!
//! ```rust
//! use rulegate_core::predicates::{self, FieldValue};
//!
//! let max = predicates::max_length(5);
//! let error = max("code", &FieldValue::from("ABCDEFG")).unwrap();
//! assert_eq!(error.message, "code must be at most 5 characters");
//!
//! assert!(predicates::email("email", &FieldValue::from("")).is_none());
//! ```

use crate::error::{ErrorCode, FieldError};
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use regex::Regex;
use std::sync::OnceLock;

pub use crate::value::FieldValue;

/// A boxed field check: `(field, value) -> error?`.
pub type Predicate = Box<dyn Fn(&str, &FieldValue) -> Option<FieldError> + Send + Sync>;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn fail(field: &str, code: ErrorCode, message: String) -> Option<FieldError> {
    Some(FieldError::new(field, code, message))
}

// ============================================================================
// Presence and length
// ============================================================================

/// Fails on null, the empty string and numeric zero.
pub fn required(field: &str, value: &FieldValue) -> Option<FieldError> {
    let missing = match value {
        FieldValue::Null => true,
        FieldValue::Str(s) => s.is_empty(),
        FieldValue::Int(i) => *i == 0,
        FieldValue::Float(f) => *f == 0.0,
        FieldValue::Bool(_) | FieldValue::DateTime(_) => false,
    };
    if missing {
        fail(field, ErrorCode::Required, format!("{field} is required"))
    } else {
        None
    }
}

pub fn min_length(min: usize) -> Predicate {
    Box::new(move |field, value| {
        let len = value.as_str()?.chars().count();
        if len < min {
            fail(
                field,
                ErrorCode::InvalidLength,
                format!("{field} must be at least {min} characters"),
            )
        } else {
            None
        }
    })
}

pub fn max_length(max: usize) -> Predicate {
    Box::new(move |field, value| {
        let len = value.as_str()?.chars().count();
        if len > max {
            fail(
                field,
                ErrorCode::InvalidLength,
                format!("{field} must be at most {max} characters"),
            )
        } else {
            None
        }
    })
}

pub fn length_between(min: usize, max: usize) -> Predicate {
    Box::new(move |field, value| {
        let len = value.as_str()?.chars().count();
        if len < min || len > max {
            fail(
                field,
                ErrorCode::InvalidLength,
                format!("{field} must be between {min} and {max} characters"),
            )
        } else {
            None
        }
    })
}

// ============================================================================
// Formats
// ============================================================================

/// Accepts an RFC 5322 address with an optional display name
/// (`Jane <jane@example.com>`) or trailing comment (`jane@example.com (Jane)`).
/// Quoted local parts and UTF-8 addresses are allowed.
pub fn email(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.is_empty() || addr_spec(s).is_some_and(EmailAddress::is_valid) {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must be a valid email address"),
        )
    }
}

/// The bare `local@domain` part of a mailbox.
fn addr_spec(s: &str) -> Option<&str> {
    let mut s = s.trim();
    if let Some(before) = s.strip_suffix(')') {
        let open = before.rfind('(')?;
        s = before[..open].trim_end();
    }
    match (s.rfind('<'), s.strip_suffix('>')) {
        (Some(open), Some(inner)) => inner.get(open + 1..),
        (None, None) => Some(s),
        _ => None,
    }
}

/// Requires a scheme and a non-empty host.
pub fn url(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.is_empty() {
        return None;
    }
    let valid = url::Url::parse(s)
        .map(|u| !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false);
    if valid {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must be a valid URL"),
        )
    }
}

/// Hyphenated UUID in either case.
pub fn uuid(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.is_empty() || (s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()) {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must be a valid UUID"),
        )
    }
}

/// North American number: 10 digits, or 11 with a leading `1`, after
/// stripping `-`, `(`, `)`, `+` and spaces.
pub fn phone_number(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.is_empty() {
        return None;
    }
    let digits: String = s
        .chars()
        .filter(|c| !matches!(c, '-' | '(' | ')' | ' ' | '+'))
        .collect();
    let valid = digits.chars().all(|c| c.is_ascii_digit())
        && (digits.len() == 10 || (digits.len() == 11 && digits.starts_with('1')));
    if valid {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must be a valid phone number"),
        )
    }
}

// ASCII digits only; ZIP+4 is optional.
static ZIP_CODE_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn zip_code_regex() -> Option<&'static Regex> {
    ZIP_CODE_REGEX
        .get_or_init(|| Regex::new(r"^[0-9]{5}(-[0-9]{4})?$").ok())
        .as_ref()
}

/// US ZIP code: `12345` or `12345-6789`.
pub fn zip_code(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.is_empty() || zip_code_regex().is_some_and(|re| re.is_match(s)) {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must be a valid ZIP code"),
        )
    }
}

/// Match against `pattern`, compiled once here.
///
/// `message` replaces the default "does not match required format" text.
pub fn regex(pattern: &str, message: Option<&str>) -> Result<Predicate, regex::Error> {
    let re = Regex::new(pattern)?;
    let message = message.map(str::to_string);
    Ok(Box::new(move |field, value| {
        let s = value.as_str()?;
        if re.is_match(s) {
            return None;
        }
        let message = message
            .clone()
            .unwrap_or_else(|| format!("{field} does not match required format"));
        fail(field, ErrorCode::InvalidFormat, message)
    }))
}

pub fn alpha_numeric(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.chars().all(|c| c.is_ascii_alphanumeric()) {
        None
    } else {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must contain only alphanumeric characters"),
        )
    }
}

pub fn no_whitespace(field: &str, value: &FieldValue) -> Option<FieldError> {
    let s = value.as_str()?;
    if s.contains([' ', '\t', '\n', '\r']) {
        fail(
            field,
            ErrorCode::InvalidFormat,
            format!("{field} must not contain whitespace"),
        )
    } else {
        None
    }
}

/// Value must equal one of `allowed`. Values of another kind are ignored.
pub fn one_of<I, V>(allowed: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<FieldValue>,
{
    let allowed: Vec<FieldValue> = allowed.into_iter().map(Into::into).collect();
    let listing = allowed
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Box::new(move |field, value| {
        if !allowed.iter().any(|a| a.same_kind(value)) || allowed.contains(value) {
            None
        } else {
            fail(
                field,
                ErrorCode::Invalid,
                format!("{field} must be one of: {listing}"),
            )
        }
    })
}

// ============================================================================
// Numbers
// ============================================================================

pub fn min_value(min: impl Into<f64>) -> Predicate {
    let min = min.into();
    Box::new(move |field, value| {
        if value.as_f64()? < min {
            fail(field, ErrorCode::Invalid, format!("{field} must be at least {min}"))
        } else {
            None
        }
    })
}

pub fn max_value(max: impl Into<f64>) -> Predicate {
    let max = max.into();
    Box::new(move |field, value| {
        if value.as_f64()? > max {
            fail(field, ErrorCode::Invalid, format!("{field} must be at most {max}"))
        } else {
            None
        }
    })
}

pub fn between(min: impl Into<f64>, max: impl Into<f64>) -> Predicate {
    let (min, max) = (min.into(), max.into());
    Box::new(move |field, value| {
        let v = value.as_f64()?;
        if v < min || v > max {
            fail(
                field,
                ErrorCode::Invalid,
                format!("{field} must be between {min} and {max}"),
            )
        } else {
            None
        }
    })
}

pub fn positive(field: &str, value: &FieldValue) -> Option<FieldError> {
    if value.as_f64()? <= 0.0 {
        fail(field, ErrorCode::Invalid, format!("{field} must be positive"))
    } else {
        None
    }
}

pub fn non_negative(field: &str, value: &FieldValue) -> Option<FieldError> {
    if value.as_f64()? < 0.0 {
        fail(field, ErrorCode::Invalid, format!("{field} must be non-negative"))
    } else {
        None
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Strictly after `after`.
pub fn date_after(after: DateTime<Utc>) -> Predicate {
    Box::new(move |field, value| {
        if value.as_datetime()? > after {
            None
        } else {
            fail(
                field,
                ErrorCode::Invalid,
                format!("{field} must be after {}", after.format(DATE_FORMAT)),
            )
        }
    })
}

/// Strictly before `before`.
pub fn date_before(before: DateTime<Utc>) -> Predicate {
    Box::new(move |field, value| {
        if value.as_datetime()? < before {
            None
        } else {
            fail(
                field,
                ErrorCode::Invalid,
                format!("{field} must be before {}", before.format(DATE_FORMAT)),
            )
        }
    })
}

/// Within `[start, end]`, bounds inclusive.
pub fn date_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Predicate {
    Box::new(move |field, value| {
        let date = value.as_datetime()?;
        if date < start || date > end {
            fail(
                field,
                ErrorCode::Invalid,
                format!(
                    "{field} must be between {} and {}",
                    start.format(DATE_FORMAT),
                    end.format(DATE_FORMAT)
                ),
            )
        } else {
            None
        }
    })
}

pub fn future(field: &str, value: &FieldValue) -> Option<FieldError> {
    if value.as_datetime()? > Utc::now() {
        None
    } else {
        fail(field, ErrorCode::Invalid, format!("{field} must be in the future"))
    }
}

pub fn past(field: &str, value: &FieldValue) -> Option<FieldError> {
    if value.as_datetime()? < Utc::now() {
        None
    } else {
        fail(field, ErrorCode::Invalid, format!("{field} must be in the past"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn s(v: &str) -> FieldValue {
        FieldValue::from(v)
    }

    #[test]
    fn required_cases() {
        assert!(required("name", &FieldValue::Null).is_some());
        assert!(required("name", &s("")).is_some());
        assert!(required("count", &FieldValue::Int(0)).is_some());
        assert!(required("name", &s("x")).is_none());
        assert!(required("flag", &FieldValue::Bool(false)).is_none());

        let error = required("name", &s("")).unwrap();
        assert_eq!(error.code, ErrorCode::Required);
        assert_eq!(error.message, "name is required");
    }

    #[test]
    fn length_counts_characters() {
        let min = min_length(3);
        assert!(min("code", &s("äöü")).is_none());
        assert!(min("code", &s("ab")).is_some());

        let range = length_between(2, 4);
        let error = range("code", &s("abcde")).unwrap();
        assert_eq!(error.code, ErrorCode::InvalidLength);
        assert_eq!(error.message, "code must be between 2 and 4 characters");
    }

    #[test]
    fn wrong_type_is_ignored() {
        assert!(min_length(3)("code", &FieldValue::Int(1)).is_none());
        assert!(email("email", &FieldValue::Int(1)).is_none());
        assert!(positive("amount", &s("abc")).is_none());
        assert!(future("when", &s("tomorrow")).is_none());
    }

    #[test]
    fn email_formats() {
        assert!(email("email", &s("user@example.com")).is_none());
        assert!(email("email", &s("Jane Doe <jane@example.com>")).is_none());
        assert!(email("email", &s("")).is_none());
        assert!(email("email", &s("not-an-email")).is_some());
        assert!(email("email", &s("a..b@example.com")).is_some());
        assert!(email("email", &s("user@-example.com")).is_some());
        assert!(email("email", &s("Jane <jane@example.com")).is_some());
        assert!(email("email", &s("jane@example.com (Jane")).is_some());
        assert_eq!(
            email("email", &s("nope")).unwrap().code,
            ErrorCode::InvalidFormat
        );
    }

    #[test]
    fn email_mailbox_forms() {
        for addr in [
            "\"john doe\"@example.com",
            "josé@example.com",
            "user@bücher.de",
            "jane@example.com (Jane)",
            "Jane Doe <jane@example.com> (work)",
            "  user+tag@example.co.uk  ",
        ] {
            assert!(email("email", &s(addr)).is_none(), "{addr}");
        }
    }

    #[test]
    fn url_requires_scheme_and_host() {
        assert!(url("site", &s("https://example.com/path")).is_none());
        assert!(url("site", &s("example.com")).is_some());
        assert!(url("site", &s("mailto:user@example.com")).is_some());
    }

    #[test]
    fn uuid_format() {
        assert!(uuid("id", &s("550e8400-e29b-41d4-a716-446655440000")).is_none());
        assert!(uuid("id", &s("550E8400-E29B-41D4-A716-446655440000")).is_none());
        assert!(uuid("id", &s("550e8400e29b41d4a716446655440000")).is_some());
        assert!(uuid("id", &s("not-a-uuid")).is_some());
    }

    #[test]
    fn phone_numbers() {
        assert!(phone_number("phone", &s("(555) 123-4567")).is_none());
        assert!(phone_number("phone", &s("+1 555 123 4567")).is_none());
        assert!(phone_number("phone", &s("2555123456")).is_none());
        assert!(phone_number("phone", &s("25551234567")).is_some());
        assert!(phone_number("phone", &s("555-123-456a")).is_some());
    }

    #[test]
    fn zip_codes() {
        assert!(zip_code("zip", &s("12345")).is_none());
        assert!(zip_code("zip", &s("12345-6789")).is_none());
        assert!(zip_code("zip", &s("1234")).is_some());
        assert!(zip_code("zip", &s("12345-678")).is_some());
        assert!(zip_code("zip", &s("123456")).is_some());
        assert!(zip_code("zip", &s("12345-")).is_some());
        assert!(zip_code("zip", &s("1234a")).is_some());
        assert!(zip_code("zip", &s("١٢٣٤٥")).is_some());
        assert!(zip_code("zip", &FieldValue::Int(12345)).is_none());
    }

    #[test]
    fn regex_with_custom_message() {
        let upper = regex("^[A-Z]+$", Some("code must be uppercase")).unwrap();
        assert!(upper("code", &s("ABC")).is_none());
        assert_eq!(upper("code", &s("abc")).unwrap().message, "code must be uppercase");

        let plain = regex("^[0-9]+$", None).unwrap();
        assert_eq!(
            plain("code", &s("x")).unwrap().message,
            "code does not match required format"
        );

        assert!(regex("(", None).is_err());
    }

    #[test]
    fn one_of_values() {
        let status = one_of(["active", "inactive"]);
        assert!(status("status", &s("active")).is_none());
        let error = status("status", &s("deleted")).unwrap();
        assert_eq!(error.message, "status must be one of: active, inactive");
        assert!(status("status", &FieldValue::Int(1)).is_none());
    }

    #[test]
    fn character_classes() {
        assert!(alpha_numeric("code", &s("abc123")).is_none());
        assert!(alpha_numeric("code", &s("abc-123")).is_some());
        assert!(no_whitespace("code", &s("abc\t1")).is_some());
        assert!(no_whitespace("code", &s("abc")).is_none());
    }

    #[test]
    fn numeric_bounds() {
        assert!(min_value(10)("qty", &FieldValue::Int(9)).is_some());
        assert!(max_value(10)("qty", &FieldValue::Float(10.0)).is_none());
        assert_eq!(
            between(1, 5)("qty", &FieldValue::Int(6)).unwrap().message,
            "qty must be between 1 and 5"
        );
        assert!(positive("qty", &FieldValue::Int(0)).is_some());
        assert!(non_negative("qty", &FieldValue::Int(0)).is_none());
        assert!(non_negative("qty", &FieldValue::Float(-0.5)).is_some());
    }

    #[test]
    fn date_bounds() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();

        assert!(date_after(start)("at", &FieldValue::from(start)).is_some());
        assert!(date_before(end)("at", &FieldValue::from(start)).is_none());
        assert!(date_between(start, end)("at", &FieldValue::from(end)).is_none());
        assert_eq!(
            date_between(start, end)("at", &FieldValue::from(end + Duration::days(1)))
                .unwrap()
                .message,
            "at must be between 2024-01-01 and 2024-12-31"
        );

        let tomorrow = Utc::now() + Duration::days(1);
        assert!(future("at", &FieldValue::from(tomorrow)).is_none());
        assert!(past("at", &FieldValue::from(tomorrow)).is_some());
    }

    proptest! {
        #[test]
        fn prop_ten_digit_numbers_are_valid(n in 2_000_000_000u64..9_999_999_999u64) {
            let value = FieldValue::from(n.to_string());
            prop_assert!(phone_number("phone", &value).is_none());
        }

        #[test]
        fn prop_max_length(text in "[a-z]{0,20}", max in 0usize..20) {
            let error = max_length(max)("name", &FieldValue::from(text.as_str()));
            prop_assert_eq!(error.is_some(), text.chars().count() > max);
        }
    }
}
