//! Recurrence rules and the dates of one occurrence of a recurring task.

use chrono::{Days, Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error("Unsupported recurrence rule: '{0}'")]
    Unsupported(String),
    #[error("Recurrence interval must be at least 1: '{0}'")]
    ZeroInterval(String),
}

static RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^every\s+(?:(\d+|other)\s+)?(day|week|month|year)s?(\s+when\s+done)?$")
        .expect("recurrence rule regex is valid")
});

/// How far apart occurrences are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Day,
    Week,
    Month,
    Year,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Day => "day",
            Frequency::Week => "week",
            Frequency::Month => "month",
            Frequency::Year => "year",
        }
    }

    fn from_unit(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "day" => Some(Frequency::Day),
            "week" => Some(Frequency::Week),
            "month" => Some(Frequency::Month),
            "year" => Some(Frequency::Year),
            _ => None,
        }
    }
}

/// A parsed recurrence rule such as `every 2 weeks when done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    interval: u32,
    frequency: Frequency,
    base_on_today: bool,
}

impl Recurrence {
    pub fn new(interval: u32, frequency: Frequency, base_on_today: bool) -> Self {
        Self {
            interval: interval.max(1),
            frequency,
            base_on_today,
        }
    }

    /// Parse rule text: `every [N|other] day|week|month|year[s] [when done]`.
    pub fn from_text(text: &str) -> Result<Self, RecurrenceError> {
        let trimmed = text.trim();
        let caps = RULE_REGEX
            .captures(trimmed)
            .ok_or_else(|| RecurrenceError::Unsupported(trimmed.to_string()))?;

        let interval = match caps.get(1).map(|m| m.as_str()) {
            None => 1,
            Some(n) if n.eq_ignore_ascii_case("other") => 2,
            Some(n) => n
                .parse::<u32>()
                .map_err(|_| RecurrenceError::Unsupported(trimmed.to_string()))?,
        };
        if interval == 0 {
            return Err(RecurrenceError::ZeroInterval(trimmed.to_string()));
        }

        let frequency = caps
            .get(2)
            .and_then(|m| Frequency::from_unit(m.as_str()))
            .ok_or_else(|| RecurrenceError::Unsupported(trimmed.to_string()))?;

        Ok(Self {
            interval,
            frequency,
            base_on_today: caps.get(3).is_some(),
        })
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// True for `when done` rules, which advance from the completion date.
    pub fn base_on_today(&self) -> bool {
        self.base_on_today
    }

    /// Normalized rule text, e.g. `every day`, `every 3 weeks when done`.
    pub fn to_text(&self) -> String {
        let mut text = if self.interval == 1 {
            format!("every {}", self.frequency.as_str())
        } else {
            format!("every {} {}s", self.interval, self.frequency.as_str())
        };
        if self.base_on_today {
            text.push_str(" when done");
        }
        text
    }

    /// The date one interval after `date`. Month and year steps clamp to the
    /// last day of the target month. `None` if the result is out of range.
    pub fn advance(&self, date: NaiveDate) -> Option<NaiveDate> {
        match self.frequency {
            Frequency::Day => date.checked_add_days(Days::new(u64::from(self.interval))),
            Frequency::Week => date.checked_add_days(Days::new(u64::from(self.interval) * 7)),
            Frequency::Month => date.checked_add_months(Months::new(self.interval)),
            Frequency::Year => date.checked_add_months(Months::new(self.interval.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// The start, scheduled and due dates of one instance of a recurring task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Occurrence {
    pub start: Option<NaiveDate>,
    pub scheduled: Option<NaiveDate>,
    pub due: Option<NaiveDate>,
}

impl Occurrence {
    pub fn new(start: Option<NaiveDate>, scheduled: Option<NaiveDate>, due: Option<NaiveDate>) -> Self {
        Self {
            start,
            scheduled,
            due,
        }
    }

    /// The date the others are kept relative to: due, else scheduled, else start.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.due.or(self.scheduled).or(self.start)
    }

    /// Move every date so the reference lands on `next_reference`, keeping
    /// the day offsets between fields. A field that would overflow is dropped.
    pub fn next(&self, next_reference: NaiveDate) -> Occurrence {
        let Some(reference) = self.reference_date() else {
            return *self;
        };
        let shift = |date: Option<NaiveDate>| -> Option<NaiveDate> {
            let offset = date?.signed_duration_since(reference);
            next_reference.checked_add_signed(offset)
        };
        Occurrence {
            start: shift(self.start),
            scheduled: shift(self.scheduled),
            due: shift(self.due),
        }
    }
}

/// Computes the dates of the next instance of a recurring task.
pub trait RecurrenceCalculator {
    /// `None` means there is no next occurrence, so no new instance is created.
    fn next_occurrence(
        &self,
        recurrence: &Recurrence,
        occurrence: &Occurrence,
        today: NaiveDate,
    ) -> Option<Occurrence>;
}

/// Steps the reference date by the rule's interval.
///
/// `when done` rules step from `today`; others step from the occurrence's
/// reference date, or from `today` if the task has no dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCalculator;

impl RecurrenceCalculator for RuleCalculator {
    fn next_occurrence(
        &self,
        recurrence: &Recurrence,
        occurrence: &Occurrence,
        today: NaiveDate,
    ) -> Option<Occurrence> {
        let base = if recurrence.base_on_today() {
            today
        } else {
            occurrence.reference_date().unwrap_or(today)
        };
        let next_reference = recurrence.advance(base)?;
        Some(occurrence.next(next_reference))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_rules() {
        let r = Recurrence::from_text("every day").unwrap();
        assert_eq!(r.interval(), 1);
        assert_eq!(r.frequency(), Frequency::Day);
        assert!(!r.base_on_today());

        let r = Recurrence::from_text("  Every 3 Weeks when done ").unwrap();
        assert_eq!(r.interval(), 3);
        assert_eq!(r.frequency(), Frequency::Week);
        assert!(r.base_on_today());
        assert_eq!(r.to_text(), "every 3 weeks when done");

        let r = Recurrence::from_text("every other month").unwrap();
        assert_eq!(r.to_text(), "every 2 months");

        assert_eq!(Recurrence::from_text("every year").unwrap().to_text(), "every year");
        assert_eq!(Recurrence::from_text("every 1 days").unwrap().to_text(), "every day");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Recurrence::from_text("every fortnight"),
            Err(RecurrenceError::Unsupported("every fortnight".to_string()))
        );
        assert_eq!(
            Recurrence::from_text("every 0 days"),
            Err(RecurrenceError::ZeroInterval("every 0 days".to_string()))
        );
        assert!(Recurrence::from_text("").is_err());
        assert!(Recurrence::from_text("every 99999999999 days").is_err());
    }

    #[test]
    fn test_advance_clamps_to_month_end() {
        let monthly = Recurrence::new(1, Frequency::Month, false);
        assert_eq!(monthly.advance(date("2022-01-31")), Some(date("2022-02-28")));
        let yearly = Recurrence::new(1, Frequency::Year, false);
        assert_eq!(yearly.advance(date("2024-02-29")), Some(date("2025-02-28")));
        let weekly = Recurrence::new(2, Frequency::Week, false);
        assert_eq!(weekly.advance(date("2024-02-10")), Some(date("2024-02-24")));
    }

    #[test]
    fn test_reference_date_priority() {
        let occurrence = Occurrence::new(Some(date("2024-01-01")), Some(date("2024-01-02")), None);
        assert_eq!(occurrence.reference_date(), Some(date("2024-01-02")));
        let occurrence = Occurrence::new(Some(date("2024-01-01")), None, Some(date("2024-01-05")));
        assert_eq!(occurrence.reference_date(), Some(date("2024-01-05")));
        assert_eq!(Occurrence::default().reference_date(), None);
    }

    #[test]
    fn test_next_keeps_offsets() {
        let occurrence = Occurrence::new(
            Some(date("2024-01-01")),
            Some(date("2024-01-03")),
            Some(date("2024-01-05")),
        );
        let next = occurrence.next(date("2024-01-12"));
        assert_eq!(next.start, Some(date("2024-01-08")));
        assert_eq!(next.scheduled, Some(date("2024-01-10")));
        assert_eq!(next.due, Some(date("2024-01-12")));
    }

    #[test]
    fn test_calculator_from_reference_date() {
        let rule = Recurrence::from_text("every week").unwrap();
        let occurrence = Occurrence::new(None, None, Some(date("2024-02-10")));
        let next = RuleCalculator
            .next_occurrence(&rule, &occurrence, date("2024-03-01"))
            .unwrap();
        assert_eq!(next.due, Some(date("2024-02-17")));
    }

    #[test]
    fn test_calculator_when_done_uses_today() {
        let rule = Recurrence::from_text("every week when done").unwrap();
        let occurrence = Occurrence::new(Some(date("2024-02-08")), None, Some(date("2024-02-10")));
        let next = RuleCalculator
            .next_occurrence(&rule, &occurrence, date("2024-03-01"))
            .unwrap();
        assert_eq!(next.due, Some(date("2024-03-08")));
        assert_eq!(next.start, Some(date("2024-03-06")));
    }

    #[test]
    fn test_calculator_without_dates() {
        let rule = Recurrence::from_text("every day").unwrap();
        let next = RuleCalculator
            .next_occurrence(&rule, &Occurrence::default(), date("2024-03-01"))
            .unwrap();
        assert_eq!(next, Occurrence::default());
    }

    #[test]
    fn test_calculator_out_of_range() {
        let rule = Recurrence::from_text("every year").unwrap();
        let occurrence = Occurrence::new(None, None, Some(NaiveDate::MAX));
        assert_eq!(
            RuleCalculator.next_occurrence(&rule, &occurrence, date("2024-03-01")),
            None
        );
    }
}
