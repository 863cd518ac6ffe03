use crate::error::OxPointsError;
use std::fmt;
use std::str::FromStr;
use time::{Date, Month};

/// A point on the time axis with year, month or day precision, e.g. `2009`, `2009-03` or `2009-03-21`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeInstant {
    year: i32,
    month: Option<u8>,
    day: Option<u8>,
}

impl TimeInstant {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Option<u8> {
        self.month
    }

    pub fn day(&self) -> Option<u8> {
        self.day
    }

    /// The instant corresponding to a calendar date.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: Some(u8::from(date.month())),
            day: Some(date.day()),
        }
    }
}

impl FromStr for TimeInstant {
    type Err = OxPointsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OxPointsError::bad_request(format!("Invalid date {s}"));
        let mut parts = s.trim().split('-');
        let year = parts
            .next()
            .filter(|y| y.len() == 4 && y.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(invalid)?;
        let two_digits = |part: Option<&str>| -> Result<Option<u8>, OxPointsError> {
            match part {
                None => Ok(None),
                Some(p) if p.len() == 2 && p.bytes().all(|b| b.is_ascii_digit()) => {
                    p.parse().map(Some).map_err(|_| invalid())
                }
                Some(_) => Err(invalid()),
            }
        };
        let month = two_digits(parts.next())?;
        let day = two_digits(parts.next())?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        if let Some(month) = month {
            let month = Month::try_from(month).map_err(|_| invalid())?;
            Date::from_calendar_date(year, month, day.unwrap_or(1)).map_err(|_| invalid())?;
        }
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for TimeInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
            if let Some(day) = self.day {
                write!(f, "-{day:02}")?;
            }
        }
        Ok(())
    }
}
