//! Field rule table for raw appointment input.
//!
//! # Responsibility
//! - Map each raw field kind to one pure format predicate.
//! - Evaluate the table in a fixed order and report the first failing field.
//!
//! # Invariants
//! - Evaluation order is `date`, `time`, `duration`, `place`, `person`.
//! - Date and time checks resolve strictly against the real calendar: no
//!   day 30 of February, no hour 24.
//! - Predicates are pure and never allocate owned state.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})-(\d{2})-(\d{4})$").expect("valid date regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})-(\d{2})$").expect("valid time regex"));
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0*[1-9][0-9]{0,3}$").expect("valid duration regex"));
static PLACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{1,20}(?: [A-Za-z]{1,20})?(?: [0-9]{1,4})?$")
        .expect("valid place regex")
});
static PERSON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]{1,20}(?: [A-Za-z0-9]{1,20})?$").expect("valid person regex")
});

/// One of the five raw inputs an appointment is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Date,
    Time,
    Duration,
    Place,
    Person,
}

impl FieldKind {
    /// Fixed evaluation order used by [`validate_all`].
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Date,
        FieldKind::Time,
        FieldKind::Duration,
        FieldKind::Place,
        FieldKind::Person,
    ];

    /// Stable machine name of the field.
    pub fn name(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Duration => "duration",
            Self::Place => "place",
            Self::Person => "person",
        }
    }

    /// Resolves a caller-supplied field label.
    ///
    /// Matching ignores case and surrounding whitespace. The Italian labels
    /// written by older snapshot tooling (`data`, `orario`, `durata`,
    /// `luogo`, `persona`) are accepted as aliases.
    pub fn from_label(label: &str) -> Option<FieldKind> {
        match label.trim().to_lowercase().as_str() {
            "date" | "data" => Some(Self::Date),
            "time" | "orario" => Some(Self::Time),
            "duration" | "durata" => Some(Self::Duration),
            "place" | "luogo" => Some(Self::Place),
            "person" | "persona" => Some(Self::Person),
            _ => None,
        }
    }

    fn rule(self) -> &'static str {
        match self {
            Self::Date => "expected dd-MM-yyyy on a real calendar day",
            Self::Time => "expected HH-mm between 00-00 and 23-59",
            Self::Duration => "expected 1 to 9999 minutes, digits only",
            Self::Place => "expected 1-2 words of up to 20 letters, optional street number",
            Self::Person => "expected 1-2 alphanumeric words of up to 20 chars, not only digits",
        }
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw input rejected by its field rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Which of the five inputs failed.
    pub field: FieldKind,
    /// The rejected raw value, verbatim.
    pub value: String,
}

impl ValidationError {
    pub fn new(field: FieldKind, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Human-readable rule the value violated.
    pub fn reason(&self) -> &'static str {
        self.field.rule()
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {}: `{}` ({})",
            self.field,
            self.value,
            self.reason()
        )
    }
}

impl Error for ValidationError {}

struct FieldRule {
    kind: FieldKind,
    check: fn(&str) -> bool,
}

// Kept in `FieldKind::ALL` order; `validate_all` walks it front to back.
static RULES: [FieldRule; 5] = [
    FieldRule {
        kind: FieldKind::Date,
        check: is_valid_date,
    },
    FieldRule {
        kind: FieldKind::Time,
        check: is_valid_time,
    },
    FieldRule {
        kind: FieldKind::Duration,
        check: is_valid_duration,
    },
    FieldRule {
        kind: FieldKind::Place,
        check: is_valid_place,
    },
    FieldRule {
        kind: FieldKind::Person,
        check: is_valid_person,
    },
];

fn rule_for(kind: FieldKind) -> &'static FieldRule {
    match kind {
        FieldKind::Date => &RULES[0],
        FieldKind::Time => &RULES[1],
        FieldKind::Duration => &RULES[2],
        FieldKind::Place => &RULES[3],
        FieldKind::Person => &RULES[4],
    }
}

/// Returns whether `value` satisfies the rule for `kind`.
pub fn check(kind: FieldKind, value: &str) -> bool {
    (rule_for(kind).check)(value)
}

/// Validates one field.
pub fn validate(kind: FieldKind, value: &str) -> Result<(), ValidationError> {
    if check(kind, value) {
        Ok(())
    } else {
        Err(ValidationError::new(kind, value))
    }
}

/// Validates all five raw fields, failing fast on the first rejected one.
///
/// # Errors
/// - Returns the [`ValidationError`] of the first field, in
///   [`FieldKind::ALL`] order, whose rule is not satisfied.
pub fn validate_all(
    date: &str,
    time: &str,
    duration: &str,
    place: &str,
    person: &str,
) -> Result<(), ValidationError> {
    let values = [date, time, duration, place, person];
    for (rule, value) in RULES.iter().zip(values) {
        if !(rule.check)(value) {
            return Err(ValidationError::new(rule.kind, value));
        }
    }
    Ok(())
}

/// Strictly parses a `dd-MM-yyyy` date.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let caps = DATE_RE.captures(value)?;
    let day = caps[1].parse::<u32>().ok()?;
    let month = caps[2].parse::<u32>().ok()?;
    let year = caps[3].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Strictly parses a `HH-mm` time of day.
pub(crate) fn parse_time(value: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(value)?;
    let hour = caps[1].parse::<u32>().ok()?;
    let minute = caps[2].parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

fn is_valid_time(value: &str) -> bool {
    parse_time(value).is_some()
}

fn is_valid_duration(value: &str) -> bool {
    DURATION_RE.is_match(value)
}

fn is_valid_place(value: &str) -> bool {
    PLACE_RE.is_match(value)
}

fn is_valid_person(value: &str) -> bool {
    PERSON_RE.is_match(value) && value.chars().any(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::{check, validate_all, FieldKind, RULES};

    #[test]
    fn rule_table_follows_declared_order() {
        let kinds: Vec<FieldKind> = RULES.iter().map(|rule| rule.kind).collect();
        assert_eq!(kinds, FieldKind::ALL.to_vec());
    }

    #[test]
    fn date_rule_is_strict_about_the_calendar() {
        assert!(check(FieldKind::Date, "10-12-2024"));
        assert!(check(FieldKind::Date, "29-02-2024"));
        assert!(check(FieldKind::Date, "27-07-1998"));
        assert!(!check(FieldKind::Date, "29-02-2023"));
        assert!(!check(FieldKind::Date, "31-04-2023"));
        assert!(!check(FieldKind::Date, "00-00-0000"));
        assert!(!check(FieldKind::Date, "1-02-2023"));
        assert!(!check(FieldKind::Date, "01-02-23"));
        assert!(!check(FieldKind::Date, "01/02/2023"));
    }

    #[test]
    fn time_rule_rejects_out_of_range_and_wrong_separator() {
        for bad in [
            "4567", "", "%&(3", "111-21", "13-255", "12-60", "24-00", "orario", "12:30",
        ] {
            assert!(!check(FieldKind::Time, bad), "`{bad}` should be rejected");
        }
        for good in ["12-30", "00-00", "03-45", "02-12", "09-59", "07-23", "23-59"] {
            assert!(check(FieldKind::Time, good), "`{good}` should be accepted");
        }
    }

    #[test]
    fn duration_rule_allows_leading_zeros_up_to_four_significant_digits() {
        for good in ["01", "0000001111", "1", "1000", "01000", "02361", "9999", "09999"] {
            assert!(check(FieldKind::Duration, good), "`{good}` should be accepted");
        }
        for bad in ["10000", "0000018532", "099999", "000000000", "0", "15.30", "-5", ""] {
            assert!(!check(FieldKind::Duration, bad), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn place_rule_accepts_words_and_street_number() {
        for good in [
            "A",
            "Ufficio",
            "Via Roma 36",
            "Avenue Street 487",
            "Sala 2",
            "Palazzo Chigi",
            "casa paolo",
        ] {
            assert!(check(FieldKind::Place, good), "`{good}` should be accepted");
        }
        for bad in [
            "",
            " ",
            "1245",
            "!($(%",
            "Aereo123",
            "Aereo!!!",
            "DescrizioneLuogo DecisamenteTroppoLunga",
            "Via Roma 12345",
        ] {
            assert!(!check(FieldKind::Place, bad), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn person_rule_rejects_digit_only_names() {
        for good in [
            "A",
            "Luca",
            "Paolo Bonolis",
            "Luca98 Bianchi",
            "MARCO",
            "Giovanni1234",
        ] {
            assert!(check(FieldKind::Person, good), "`{good}` should be accepted");
        }
        for bad in [
            "  ",
            " ",
            "",
            "$(!$)!",
            "NomeTroppoLungoLungoooo CognomeTroppoLungoLungo",
            "1234",
            "12 34",
        ] {
            assert!(!check(FieldKind::Person, bad), "`{bad}` should be rejected");
        }
    }

    #[test]
    fn validate_all_reports_first_failing_field() {
        let err = validate_all("31-04-2023", "24-00", "0", "!", "1").unwrap_err();
        assert_eq!(err.field, FieldKind::Date);

        let err = validate_all("30-04-2023", "23-00", "0", "!", "1").unwrap_err();
        assert_eq!(err.field, FieldKind::Duration);
        assert_eq!(err.value, "0");

        let err = validate_all("30-04-2023", "23-00", "10", "Casa", "1").unwrap_err();
        assert_eq!(err.field, FieldKind::Person);

        assert!(validate_all("30-04-2023", "23-00", "10", "Casa", "Luca").is_ok());
    }

    #[test]
    fn field_labels_are_trimmed_and_case_insensitive() {
        assert_eq!(FieldKind::from_label(" Orario "), Some(FieldKind::Time));
        assert_eq!(FieldKind::from_label("DURATA"), Some(FieldKind::Duration));
        assert_eq!(FieldKind::from_label("place"), Some(FieldKind::Place));
        assert_eq!(FieldKind::from_label("ora"), None);
        assert_eq!(FieldKind::from_label(""), None);
    }
}
