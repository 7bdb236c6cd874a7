//! Recurrence rules: how often an item repeats and on which calendar pattern.

use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `day_of_month` sentinel meaning "last day of whatever month is being resolved".
pub const LAST_DAY_OF_MONTH: u8 = 32;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("custom interval must be at least 1 day, got {0}")]
    InvalidInterval(u32),
    #[error("day of month must be 1-31 or 32 for the last day, got {0}")]
    InvalidDayOfMonth(u8),
    #[error("weekday must be 1 (Monday) to 7 (Sunday), got {0}")]
    InvalidWeekday(u8),
    #[error("unrecognised recurrence rule `{0}`")]
    Unrecognised(String),
}

/// Calendar pattern of a recurring item.
///
/// Parameters only exist on the variants that use them, so a daily rule cannot carry a
/// stray `day_of_month`. Weekdays are ISO numbers (1 = Monday .. 7 = Sunday) and
/// `day_of_month` keeps [`LAST_DAY_OF_MONTH`] symbolic; both are resolved only when a
/// date is calculated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum RecurrenceRule {
    Daily,
    Weekly {
        #[serde(default)]
        weekdays: BTreeSet<u8>,
    },
    Monthly {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day_of_month: Option<u8>,
    },
    Yearly,
    Custom {
        #[serde(default = "RecurrenceRule::default_interval_days")]
        interval_days: u32,
    },
}

impl RecurrenceRule {
    pub fn default_interval_days() -> u32 {
        1
    }

    pub fn weekly() -> Self {
        RecurrenceRule::Weekly {
            weekdays: BTreeSet::new(),
        }
    }

    pub fn weekly_on(days: &[Weekday]) -> Self {
        RecurrenceRule::Weekly {
            weekdays: days
                .iter()
                .map(|day| day.number_from_monday() as u8)
                .collect(),
        }
    }

    pub fn monthly() -> Self {
        RecurrenceRule::Monthly { day_of_month: None }
    }

    pub fn monthly_on(day: u8) -> Self {
        RecurrenceRule::Monthly {
            day_of_month: Some(day),
        }
    }

    pub fn month_end() -> Self {
        Self::monthly_on(LAST_DAY_OF_MONTH)
    }

    pub fn every_days(interval_days: u32) -> Self {
        RecurrenceRule::Custom { interval_days }
    }

    /// Checks the parameter ranges. Rules are validated on create/update, never by the
    /// date calculator.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            RecurrenceRule::Custom { interval_days } if *interval_days < 1 => {
                Err(RuleError::InvalidInterval(*interval_days))
            }
            RecurrenceRule::Monthly {
                day_of_month: Some(day),
            } if !(1..=LAST_DAY_OF_MONTH).contains(day) => Err(RuleError::InvalidDayOfMonth(*day)),
            RecurrenceRule::Weekly { weekdays } => {
                match weekdays.iter().find(|day| !(1..=7).contains(*day)) {
                    Some(day) => Err(RuleError::InvalidWeekday(*day)),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Human readable description, e.g. "Monthly on the last day".
    pub fn label(&self) -> String {
        match self {
            RecurrenceRule::Daily => "Daily".into(),
            RecurrenceRule::Weekly { weekdays } if weekdays.is_empty() => "Weekly".into(),
            RecurrenceRule::Weekly { weekdays } => {
                let names: Vec<_> = weekdays
                    .iter()
                    .filter_map(|day| weekday_from_number(*day))
                    .map(|day| day.to_string())
                    .collect();
                format!("Weekly on {}", names.join(", "))
            }
            RecurrenceRule::Monthly { day_of_month: None } => "Monthly".into(),
            RecurrenceRule::Monthly {
                day_of_month: Some(LAST_DAY_OF_MONTH),
            } => "Monthly on the last day".into(),
            RecurrenceRule::Monthly {
                day_of_month: Some(day),
            } => format!("Monthly on day {day}"),
            RecurrenceRule::Yearly => "Yearly".into(),
            RecurrenceRule::Custom { interval_days: 1 } => "Every day".into(),
            RecurrenceRule::Custom { interval_days } => format!("Every {interval_days} days"),
        }
    }
}

pub(crate) fn weekday_from_number(number: u8) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

fn parse_weekday(token: &str) -> Option<u8> {
    let token = token.trim();
    if let Ok(number) = token.parse::<u8>() {
        return Some(number);
    }
    token
        .parse::<Weekday>()
        .ok()
        .map(|day| day.number_from_monday() as u8)
}

/// Compact text form used by the CLI: `daily`, `weekly`, `weekly:mon,wed,fri`,
/// `monthly`, `monthly:15`, `monthly:last`, `yearly`, `every:10`.
impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_ascii_lowercase();
        let unrecognised = || RuleError::Unrecognised(input.trim().to_string());
        let (head, tail) = match normalized.split_once(':') {
            Some((head, tail)) => (head, Some(tail.trim())),
            None => (normalized.as_str(), None),
        };

        let rule = match (head, tail) {
            ("daily", None) => RecurrenceRule::Daily,
            ("yearly", None) => RecurrenceRule::Yearly,
            ("weekly", None) => RecurrenceRule::weekly(),
            ("weekly", Some(days)) => {
                let weekdays = days
                    .split(',')
                    .map(|token| parse_weekday(token).ok_or_else(unrecognised))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                RecurrenceRule::Weekly { weekdays }
            }
            ("monthly", None) => RecurrenceRule::monthly(),
            ("monthly", Some("last")) => RecurrenceRule::month_end(),
            ("monthly", Some(day)) => {
                RecurrenceRule::monthly_on(day.parse().map_err(|_| unrecognised())?)
            }
            ("every" | "custom", Some(days)) => {
                RecurrenceRule::every_days(days.parse().map_err(|_| unrecognised())?)
            }
            _ => return Err(unrecognised()),
        };
        rule.validate()?;
        Ok(rule)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceRule::Daily => f.write_str("daily"),
            RecurrenceRule::Weekly { weekdays } if weekdays.is_empty() => f.write_str("weekly"),
            RecurrenceRule::Weekly { weekdays } => {
                let days: Vec<_> = weekdays.iter().map(|day| day.to_string()).collect();
                write!(f, "weekly:{}", days.join(","))
            }
            RecurrenceRule::Monthly { day_of_month: None } => f.write_str("monthly"),
            RecurrenceRule::Monthly {
                day_of_month: Some(LAST_DAY_OF_MONTH),
            } => f.write_str("monthly:last"),
            RecurrenceRule::Monthly {
                day_of_month: Some(day),
            } => write!(f, "monthly:{day}"),
            RecurrenceRule::Yearly => f.write_str("yearly"),
            RecurrenceRule::Custom { interval_days } => write!(f, "every:{interval_days}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_parameters() {
        assert_eq!(
            RecurrenceRule::every_days(0).validate(),
            Err(RuleError::InvalidInterval(0))
        );
        assert_eq!(
            RecurrenceRule::monthly_on(0).validate(),
            Err(RuleError::InvalidDayOfMonth(0))
        );
        assert_eq!(
            RecurrenceRule::monthly_on(33).validate(),
            Err(RuleError::InvalidDayOfMonth(33))
        );
        let weekly = RecurrenceRule::Weekly {
            weekdays: [1, 8].into_iter().collect(),
        };
        assert_eq!(weekly.validate(), Err(RuleError::InvalidWeekday(8)));
        assert!(RecurrenceRule::month_end().validate().is_ok());
        assert!(RecurrenceRule::weekly().validate().is_ok());
    }

    #[test]
    fn parses_text_forms() {
        assert_eq!("daily".parse::<RecurrenceRule>(), Ok(RecurrenceRule::Daily));
        assert_eq!(
            "weekly:mon,wed,fri".parse::<RecurrenceRule>(),
            Ok(RecurrenceRule::weekly_on(&[
                Weekday::Mon,
                Weekday::Wed,
                Weekday::Fri
            ]))
        );
        assert_eq!(
            "Weekly:1,3,5".parse::<RecurrenceRule>(),
            "weekly:mon,wed,fri".parse::<RecurrenceRule>()
        );
        assert_eq!("monthly:last".parse::<RecurrenceRule>(), Ok(RecurrenceRule::month_end()));
        assert_eq!("monthly:15".parse::<RecurrenceRule>(), Ok(RecurrenceRule::monthly_on(15)));
        assert_eq!("every:10".parse::<RecurrenceRule>(), Ok(RecurrenceRule::every_days(10)));
        assert_eq!(
            "monthly:40".parse::<RecurrenceRule>(),
            Err(RuleError::InvalidDayOfMonth(40))
        );
        assert!(matches!(
            "fortnightly".parse::<RecurrenceRule>(),
            Err(RuleError::Unrecognised(_))
        ));
    }

    #[test]
    fn display_matches_parse_syntax() {
        let samples = [
            "daily",
            "weekly",
            "weekly:1,3,5",
            "monthly",
            "monthly:last",
            "monthly:9",
            "yearly",
            "every:14",
        ];
        for text in samples {
            let rule: RecurrenceRule = text.parse().expect("valid rule");
            assert_eq!(rule.to_string(), text);
        }
    }

    #[test]
    fn month_end_sentinel_is_serialized_symbolically() {
        let json = serde_json::to_value(RecurrenceRule::month_end()).expect("serialize");
        assert_eq!(json["frequency"], "monthly");
        assert_eq!(json["day_of_month"], 32);

        let custom: RecurrenceRule =
            serde_json::from_str(r#"{"frequency":"custom"}"#).expect("deserialize");
        assert_eq!(custom, RecurrenceRule::every_days(1));
    }

    #[test]
    fn labels_describe_rules() {
        assert_eq!(RecurrenceRule::month_end().label(), "Monthly on the last day");
        assert_eq!(RecurrenceRule::every_days(10).label(), "Every 10 days");
        assert_eq!(
            RecurrenceRule::weekly_on(&[Weekday::Mon, Weekday::Fri]).label(),
            "Weekly on Mon, Fri"
        );
    }
}
