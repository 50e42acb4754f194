use crate::completions::CompletionStore;
use crate::date_key::DateKey;
use crate::error::AppError;
use crate::model::TaskId;
use time::{Date, Month};

/// The month a calendar grid is showing. Moving it persists nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    year: i32,
    month: Month,
}

impl MonthCursor {
    pub fn new(year: i32, month: Month) -> Result<Self, AppError> {
        Date::from_calendar_date(year, month, 1)
            .map_err(|err| AppError::validation(err.to_string()))?;
        Ok(Self { year, month })
    }

    pub fn containing(date: DateKey) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> Month {
        self.month
    }

    /// Moves by `months`, crossing year boundaries as needed.
    pub fn offset(self, months: i32) -> Result<Self, AppError> {
        let index = i64::from(self.year) * 12 + i64::from(u8::from(self.month)) - 1 + i64::from(months);
        let year = i32::try_from(index.div_euclid(12))
            .map_err(|_| AppError::validation("month offset out of range"))?;
        let month = Month::try_from((index.rem_euclid(12) + 1) as u8)
            .map_err(|err| AppError::validation(err.to_string()))?;
        Self::new(year, month)
    }

    pub fn first_day(self) -> DateKey {
        // `new` and `containing` only build cursors whose first day exists.
        DateKey::from(
            Date::from_calendar_date(self.year, self.month, 1).unwrap_or(Date::MIN),
        )
    }

    pub fn days_in_month(self) -> u8 {
        self.month.length(self.year)
    }

    pub fn days(self) -> Vec<DateKey> {
        (1..=self.days_in_month())
            .filter_map(|day| Date::from_calendar_date(self.year, self.month, day).ok())
            .map(DateKey::from)
            .collect()
    }

    /// Blank cells before the 1st in a Sunday-first week grid.
    pub fn leading_blanks(self) -> u8 {
        self.first_day().date().weekday().number_days_from_sunday()
    }

    /// "July 2025".
    pub fn title(self) -> String {
        format!("{} {}", self.month, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: DateKey,
    pub completed: Vec<TaskId>,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub cursor: MonthCursor,
    pub days: Vec<DayCell>,
}

impl MonthView {
    pub fn build(cursor: MonthCursor, store: &CompletionStore, today: DateKey) -> Self {
        let days = cursor
            .days()
            .into_iter()
            .map(|date| DayCell {
                date,
                completed: store
                    .completed_on(date)
                    .map(|ids| ids.iter().copied().collect())
                    .unwrap_or_default(),
                is_today: date == today,
            })
            .collect();
        Self { cursor, days }
    }

    pub fn completed_days(&self) -> usize {
        self.days
            .iter()
            .filter(|cell| !cell.completed.is_empty())
            .count()
    }
}
