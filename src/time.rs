//! ZIP file timestamp handling
//!
//! Every entry carries its last modification time as a packed MS-DOS date and
//! time pair ([`DosDateTime`]). The DOS format has no time zone, covers only
//! 1980 through 2107, and stores seconds at 2-second resolution.
//!
//! Timestamps are supplied to the writer as a [`UtcDateTime`], which is
//! converted to DOS form on write.
//!
//! ```
//! use zipstream::time::{DosDateTime, UtcDateTime};
//!
//! let modified = UtcDateTime::from_components(2021, 6, 15, 13, 45, 30, 0).unwrap();
//! let dos = DosDateTime::from(&modified);
//! assert_eq!(dos.into_parts(), (0x6daf, 0x52cf));
//! assert_eq!(dos.to_datetime(), modified);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// A calendar timestamp in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtcDateTime {
    year: u16,
    month: u8,       // 1-12
    day: u8,         // 1-31
    hour: u8,        // 0-23
    minute: u8,      // 0-59
    second: u8,      // 0-59
    nanosecond: u32, // 0-999,999,999
}

impl std::fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.nanosecond != 0 {
            write!(f, ".{:09}", self.nanosecond)?;
        }
        write!(f, "Z")
    }
}

impl UtcDateTime {
    /// Creates a timestamp from date/time components with validation.
    ///
    /// Returns `None` if any component is out of range or the date doesn't
    /// exist (e.g. February 30th).
    ///
    /// ```
    /// # use zipstream::time::UtcDateTime;
    /// let dt = UtcDateTime::from_components(2023, 6, 15, 14, 30, 45, 500_000_000).unwrap();
    /// assert_eq!(dt.year(), 2023);
    /// assert!(UtcDateTime::from_components(2023, 2, 30, 0, 0, 0, 0).is_none());
    /// ```
    pub fn from_components(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        nanosecond: u32,
    ) -> Option<Self> {
        if year == 0
            || month == 0
            || month > 12
            || day == 0
            || hour > 23
            || minute > 59
            || second > 59
            || nanosecond > 999_999_999
        {
            return None;
        }

        if day > last_day_of_month(year, month) {
            return None;
        }

        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond,
        })
    }

    /// Creates a timestamp from a Unix timestamp (seconds since epoch).
    pub fn from_unix(seconds: i64) -> UtcDateTime {
        let (year, month, day, hour, minute, second) = unix_timestamp_to_components(seconds);
        UtcDateTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
            nanosecond: 0,
        }
    }

    /// The current system time.
    pub fn now() -> UtcDateTime {
        UtcDateTime::from(SystemTime::now())
    }

    #[must_use]
    pub const fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    pub const fn day(&self) -> u8 {
        self.day
    }

    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    pub const fn second(&self) -> u8 {
        self.second
    }

    #[must_use]
    pub const fn nanosecond(&self) -> u32 {
        self.nanosecond
    }

    /// Convert to Unix timestamp (seconds since epoch).
    ///
    /// Negative values represent dates before 1970.
    #[must_use]
    pub fn to_unix(&self) -> i64 {
        let days_since_epoch = self.days_from_civil();

        (i64::from(days_since_epoch)) * 86400
            + (i64::from(self.hour)) * 3600
            + (i64::from(self.minute)) * 60
            + (i64::from(self.second))
    }

    /// Days since 1970-01-01, negative before it.
    ///
    /// Based on Howard Hinnant's `days_from_civil` algorithm:
    /// <https://howardhinnant.github.io/date_algorithms.html#days_from_civil>
    const fn days_from_civil(&self) -> i32 {
        let (y, m) = if self.month <= 2 {
            (self.year as i32 - 1, self.month as i32 + 9)
        } else {
            (self.year as i32, self.month as i32 - 3)
        };

        let era = y / 400;
        let yoe = y - era * 400; // [0, 399]
        let doy = (153 * m + 2) / 5 + self.day as i32 - 1; // [0, 365]
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]

        era * 146097 + doe - 719468
    }
}

impl From<SystemTime> for UtcDateTime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => {
                let mut dt = UtcDateTime::from_unix(elapsed.as_secs() as i64);
                dt.nanosecond = elapsed.subsec_nanos();
                dt
            }
            Err(before) => {
                let elapsed = before.duration();
                let mut seconds = -(elapsed.as_secs() as i64);
                let mut nanosecond = elapsed.subsec_nanos();
                if nanosecond != 0 {
                    seconds -= 1;
                    nanosecond = 1_000_000_000 - nanosecond;
                }
                let mut dt = UtcDateTime::from_unix(seconds);
                dt.nanosecond = nanosecond;
                dt
            }
        }
    }
}

/// An MS-DOS timestamp with 2-second precision.
///
/// Stored as two packed 16-bit values:
///
/// - date: bits 15-9 year since 1980, bits 8-5 month, bits 4-0 day
/// - time: bits 15-11 hour, bits 10-5 minute, bits 4-0 second / 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    time: u16,
    date: u16,
}

impl DosDateTime {
    /// Creates a DOS datetime from packed time and date values.
    #[must_use]
    pub const fn new(time: u16, date: u16) -> Self {
        Self { time, date }
    }

    /// Returns the year (1980-2107).
    #[must_use]
    pub fn year(&self) -> u16 {
        ((self.date >> 9) & 0x7f) + 1980
    }

    /// Returns the month (1-12).
    #[must_use]
    pub fn month(&self) -> u8 {
        let raw_month = ((self.date >> 5) & 0x0f) as u8;
        raw_month.clamp(1, 12)
    }

    /// Returns the day of the month (1-31).
    #[must_use]
    pub fn day(&self) -> u8 {
        let raw_day = (self.date & 0x1f) as u8;
        raw_day.clamp(1, last_day_of_month(self.year(), self.month()))
    }

    /// Returns the hour (0-23).
    #[must_use]
    pub fn hour(&self) -> u8 {
        let raw_hour = ((self.time >> 11) & 0x1f) as u8;
        raw_hour.min(23)
    }

    /// Returns the minute (0-59).
    #[must_use]
    pub fn minute(&self) -> u8 {
        let raw_minute = ((self.time >> 5) & 0x3f) as u8;
        raw_minute.min(59)
    }

    /// Returns the second (0-58, always even).
    #[must_use]
    pub fn second(&self) -> u8 {
        let raw_second = ((self.time & 0x1f) * 2) as u8;
        raw_second.min(58)
    }

    /// Returns the packed components as (time, date).
    #[must_use]
    pub const fn into_parts(self) -> (u16, u16) {
        (self.time, self.date)
    }

    /// Decodes into a calendar timestamp. Out of range fields are clamped.
    #[must_use]
    pub fn to_datetime(&self) -> UtcDateTime {
        UtcDateTime {
            year: self.year(),
            month: self.month(),
            day: self.day(),
            hour: self.hour(),
            minute: self.minute(),
            second: self.second(),
            nanosecond: 0,
        }
    }
}

impl From<&UtcDateTime> for DosDateTime {
    fn from(dt: &UtcDateTime) -> Self {
        // Saturate year to DOS range (1980-2107)
        let dos_year = dt.year.clamp(1980, 2107);

        let packed_date = ((dos_year - 1980) << 9) | ((dt.month as u16) << 5) | (dt.day as u16);

        let packed_time =
            ((dt.hour as u16) << 11) | ((dt.minute as u16) << 5) | ((dt.second as u16) / 2);

        Self {
            time: packed_time,
            date: packed_date,
        }
    }
}

/// Convert a Unix timestamp to (year, month, day, hour, minute, second).
///
/// Based on Howard Hinnant's `civil_from_days` algorithm:
/// <https://howardhinnant.github.io/date_algorithms.html#civil_from_days>
fn unix_timestamp_to_components(timestamp: i64) -> (u16, u8, u8, u8, u8, u8) {
    const SECONDS_PER_DAY: i64 = 86400;

    let total_days = timestamp.div_euclid(SECONDS_PER_DAY);
    let seconds_in_day = timestamp.rem_euclid(SECONDS_PER_DAY);

    let hour = (seconds_in_day / 3600) as u8;
    let minute = ((seconds_in_day % 3600) / 60) as u8;
    let second = (seconds_in_day % 60) as u8;

    // Shift the epoch to 0000-03-01 so leap days fall at the end of a year
    let days = total_days + 719468;
    let era = days.div_euclid(146097);
    let days_of_era = days.rem_euclid(146097);

    let year_of_era =
        (days_of_era - days_of_era / 1460 + days_of_era / 36524 - days_of_era / 146096) / 365;
    let year = era * 400 + year_of_era;

    let day_of_year = days_of_era - (year_of_era * 365 + year_of_era / 4 - year_of_era / 100);

    // Mar=0, Apr=1, ..., Jan=10, Feb=11
    let month_shifted = (5 * day_of_year + 2) / 153;
    let day_of_month = day_of_year - (153 * month_shifted + 2) / 5 + 1;

    let (final_year, final_month) = if month_shifted < 10 {
        (year, month_shifted + 3)
    } else {
        (year + 1, month_shifted - 9)
    };

    (
        final_year as u16,
        final_month as u8,
        day_of_month as u8,
        hour,
        minute,
        second,
    )
}

const fn is_leap(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

const fn last_day_of_month(year: u16, month: u8) -> u8 {
    if month != 2 || !is_leap(year) {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31][month as usize - 1]
    } else {
        29
    }
}
