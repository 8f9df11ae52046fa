// src/calendar.rs
//! Leap-year-stable calendar indices.
//!
//! Every year is folded onto 365 day slots (0..=364): in a leap year Feb 28 and
//! Feb 29 share slot 58 and every later day moves down by one. Weeks are 7-slot
//! runs of that axis, with Dec 31 absorbed into week 51.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Slot shared by Feb 28 and Feb 29.
const LEAP_SLOT: u32 = 58;
const LAST_DAY: u32 = 364;
const LAST_WEEK: u32 = 51;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
            Granularity::Year => "year",
        }
    }

    pub fn index(self, date: NaiveDate) -> i32 {
        match self {
            Granularity::Day => day_index(date) as i32,
            Granularity::Week => week_index(date) as i32,
            Granularity::Month => month_index(date) as i32,
            Granularity::Year => date.year(),
        }
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Day-of-year in `0..=364` regardless of leap status.
pub fn day_index(date: NaiveDate) -> u32 {
    let ordinal = date.ordinal0();
    if is_leap_year(date.year()) && ordinal > LEAP_SLOT {
        ordinal - 1
    } else {
        ordinal
    }
}

/// Week-of-year in `0..=51`; the final week is eight days long.
pub fn week_index(date: NaiveDate) -> u32 {
    day_index(date).min(LAST_DAY - 1) / 7
}

/// Calendar month in `0..=11`.
pub fn month_index(date: NaiveDate) -> u32 {
    date.month0()
}

/// Inclusive calendar span covered by one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Real calendar boundaries for `index` at `granularity`, laid out in `year`.
///
/// For `Granularity::Year` the index already is the year and `year` is ignored.
/// Returns `None` for an index outside the granularity's range.
pub fn period_bounds(granularity: Granularity, index: i32, year: i32) -> Option<Period> {
    match granularity {
        Granularity::Day => {
            let slot = u32::try_from(index).ok().filter(|&s| s <= LAST_DAY)?;
            day_slot_period(slot, year)
        }
        Granularity::Week => {
            let week = u32::try_from(index).ok().filter(|&w| w <= LAST_WEEK)?;
            let first = week * 7;
            let last = if week == LAST_WEEK { LAST_DAY } else { first + 6 };
            Some(Period {
                start: day_slot_period(first, year)?.start,
                end: day_slot_period(last, year)?.end,
            })
        }
        Granularity::Month => {
            let month = u32::try_from(index).ok().filter(|&m| m < 12)? + 1;
            let start = NaiveDate::from_ymd_opt(year, month, 1)?;
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)?
            };
            Some(Period {
                start,
                end: next - Duration::days(1),
            })
        }
        Granularity::Year => Some(Period {
            start: NaiveDate::from_ymd_opt(index, 1, 1)?,
            end: NaiveDate::from_ymd_opt(index, 12, 31)?,
        }),
    }
}

fn day_slot_period(slot: u32, year: i32) -> Option<Period> {
    let leap = is_leap_year(year);
    let (first, last) = match (leap, slot) {
        (true, LEAP_SLOT) => (LEAP_SLOT, LEAP_SLOT + 1),
        (true, s) if s > LEAP_SLOT => (s + 1, s + 1),
        (_, s) => (s, s),
    };
    Some(Period {
        start: NaiveDate::from_yo_opt(year, first + 1)?,
        end: NaiveDate::from_yo_opt(year, last + 1)?,
    })
}
