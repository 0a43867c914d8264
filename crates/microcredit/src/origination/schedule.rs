use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days between consecutive due dates. Not a calendar month.
pub const CADENCE_DAYS: u64 = 30;

/// Ordered due dates, the first one cadence after the anchor date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallmentSchedule(Vec<NaiveDate>);

impl InstallmentSchedule {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(installment number, due date)` pairs, numbered from one.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, NaiveDate)> + '_ {
        self.0.iter().enumerate().map(|(idx, date)| (idx + 1, *date))
    }

    pub fn final_due_date(&self) -> Option<NaiveDate> {
        self.0.last().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("due date for installment {installment} after {anchor} is out of calendar range")]
    OutOfRange { anchor: NaiveDate, installment: u8 },
}

/// Due dates at `anchor + 30 * i` days for `i` in `1..=count`.
pub fn generate_schedule(anchor: NaiveDate, count: u8) -> Result<InstallmentSchedule, ScheduleError> {
    (1..=count)
        .map(|installment| {
            anchor
                .checked_add_days(Days::new(CADENCE_DAYS * u64::from(installment)))
                .ok_or(ScheduleError::OutOfRange {
                    anchor,
                    installment,
                })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(InstallmentSchedule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn dates_step_thirty_days_from_anchor() {
        let schedule = generate_schedule(date(2024, 1, 1), 3).expect("schedule builds");
        assert_eq!(
            schedule.dates(),
            &[date(2024, 1, 31), date(2024, 3, 1), date(2024, 3, 31)]
        );

        let mut previous = date(2024, 1, 1);
        for (_, due) in schedule.numbered() {
            assert_eq!((due - previous).num_days(), 30);
            previous = due;
        }
    }

    #[test]
    fn cadence_drifts_off_the_day_of_month() {
        let schedule = generate_schedule(date(2025, 1, 15), 5).expect("schedule builds");
        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule.final_due_date(), Some(date(2025, 6, 14)));
    }

    #[test]
    fn zero_count_yields_empty_schedule() {
        let schedule = generate_schedule(date(2024, 6, 1), 0).expect("schedule builds");
        assert!(schedule.is_empty());
    }

    #[test]
    fn reports_calendar_overflow() {
        assert!(generate_schedule(NaiveDate::MAX, 1).is_err());
    }

    #[test]
    fn serializes_as_iso_date_list() {
        let schedule = generate_schedule(date(2024, 1, 1), 2).expect("schedule builds");
        let json = serde_json::to_value(&schedule).expect("serializes");
        assert_eq!(json, serde_json::json!(["2024-01-31", "2024-03-01"]));
    }
}
