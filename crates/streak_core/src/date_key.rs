//! Calendar-day keys in canonical `yyyy-MM-dd` form.
//!
//! A [`DateKey`] carries no time of day. Day arithmetic goes through
//! calendar components, so daylight-saving shifts never skip or repeat a day.

use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, UtcOffset};

const DATE_KEY_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(Date);

impl DateKey {
    /// Key of the local calendar day containing `datetime`.
    pub fn of(datetime: OffsetDateTime) -> Self {
        Self(datetime.to_offset(local_offset()).date())
    }

    pub fn today() -> Self {
        Self::of(OffsetDateTime::now_utc())
    }

    pub fn from_calendar(year: i32, month: u8, day: u8) -> Result<Self, AppError> {
        let month = Month::try_from(month)
            .map_err(|_| AppError::validation(format!("month {month} is out of range")))?;
        Date::from_calendar_date(year, month, day)
            .map(Self)
            .map_err(|err| AppError::validation(err.to_string()))
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Date::parse(raw.trim(), DATE_KEY_FORMAT)
            .map(Self)
            .map_err(|_| AppError::validation(format!("date must be yyyy-MM-dd, got '{raw}'")))
    }

    /// The calendar day before this one, or `None` at the earliest
    /// representable date.
    pub fn previous(self) -> Option<Self> {
        self.0.previous_day().map(Self)
    }

    pub fn date(self) -> Date {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> Month {
        self.0.month()
    }

    pub fn day(self) -> u8 {
        self.0.day()
    }
}

impl From<Date> for DateKey {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.0.format(DATE_KEY_FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl FromStr for DateKey {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Source of "today" for everything that anchors on the current day.
pub trait Clock {
    fn today(&self) -> DateKey;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> DateKey {
        DateKey::today()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateKey);

impl Clock for FixedClock {
    fn today(&self) -> DateKey {
        self.0
    }
}

pub const TODAY_ENV_VAR: &str = "STREAK_TODAY";

/// System clock unless `STREAK_TODAY` pins the day.
pub fn clock_from_env() -> Result<Box<dyn Clock>, AppError> {
    match std::env::var(TODAY_ENV_VAR) {
        Ok(raw) if !raw.trim().is_empty() => Ok(Box::new(FixedClock(DateKey::parse(&raw)?))),
        _ => Ok(Box::new(SystemClock)),
    }
}
