use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

use super::error::WorkflowError;

/// The period a request covers. Shift swaps exchange one off-day for
/// another, so their two dates carry no ordering constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Days { start: NaiveDate, end: NaiveDate },
    Hours { start: NaiveDateTime, end: NaiveDateTime },
    Swap { original_off: NaiveDate, new_off: NaiveDate },
}

impl Schedule {
    /// Derived once at submission; never recomputed for stored requests.
    pub fn duration(&self) -> Result<DurationValue, WorkflowError> {
        match *self {
            Schedule::Days { start, end } => {
                if end < start {
                    return Err(WorkflowError::InvalidRange);
                }
                Ok(DurationValue::Days(day_span(start, end)))
            }
            Schedule::Hours { start, end } => {
                if end < start {
                    return Err(WorkflowError::InvalidRange);
                }
                Ok(DurationValue::Hours(hour_span(start, end)))
            }
            Schedule::Swap { .. } => Ok(DurationValue::Swap),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationValue {
    Days(u32),
    Hours(f64),
    Swap,
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationValue::Days(d) => write!(f, "{} days", d),
            DurationValue::Hours(h) => write!(f, "{} hours", h),
            DurationValue::Swap => write!(f, "Swap"),
        }
    }
}

/// Calendar days covered, inclusive of both endpoints.
pub fn day_span(start: NaiveDate, end: NaiveDate) -> u32 {
    (end - start).num_days().unsigned_abs() as u32 + 1
}

/// Elapsed hours rounded to two decimal places.
pub fn hour_span(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let hours = (end - start).num_seconds().abs() as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn leave_span_is_inclusive_of_both_endpoints() {
        assert_eq!(day_span(d("2024-01-10"), d("2024-01-12")), 3);
    }

    #[test]
    fn single_day_leave_counts_one_day() {
        assert_eq!(day_span(d("2024-03-05"), d("2024-03-05")), 1);
    }

    #[test]
    fn overtime_span_in_hours() {
        assert_eq!(hour_span(dt("2024-01-10T09:00:00"), dt("2024-01-10T17:30:00")), 8.5);
    }

    #[test]
    fn overtime_span_rounds_to_two_decimals() {
        // 1h20m = 1.3333... hours
        assert_eq!(hour_span(dt("2024-01-10T10:00:00"), dt("2024-01-10T11:20:00")), 1.33);
    }

    #[test]
    fn reversed_leave_range_is_rejected() {
        let schedule = Schedule::Days {
            start: d("2024-01-12"),
            end: d("2024-01-10"),
        };
        assert_eq!(schedule.duration(), Err(WorkflowError::InvalidRange));
    }

    #[test]
    fn reversed_overtime_range_is_rejected() {
        let schedule = Schedule::Hours {
            start: dt("2024-01-10T17:00:00"),
            end: dt("2024-01-10T09:00:00"),
        };
        assert_eq!(schedule.duration(), Err(WorkflowError::InvalidRange));
    }

    #[test]
    fn swap_ignores_date_order() {
        let schedule = Schedule::Swap {
            original_off: d("2024-02-01"),
            new_off: d("2024-01-20"),
        };
        assert_eq!(schedule.duration(), Ok(DurationValue::Swap));
    }

    #[test]
    fn duration_display() {
        assert_eq!(DurationValue::Days(3).to_string(), "3 days");
        assert_eq!(DurationValue::Hours(8.5).to_string(), "8.5 hours");
        assert_eq!(DurationValue::Swap.to_string(), "Swap");
    }
}
