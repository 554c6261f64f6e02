use std::{
    fmt::{Debug, Display},
    time::{Duration, SystemTime},
};

use chrono::TimeZone;

/// A point in time, stored as a duration since `SystemTime::UNIX_EPOCH`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    time: Duration,
}

impl Time {
    /// The current system time. Panics if the system clock is set to before
    /// the unix epoch.
    #[must_use]
    pub fn now() -> Self {
        Self {
            time: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .expect("Time went backwards"),
        }
    }

    #[must_use]
    pub const fn from_duration_since_epoch(duration: Duration) -> Self {
        Self { time: duration }
    }

    #[must_use]
    pub const fn from_secs_since_epoch(seconds: u64) -> Self {
        Self {
            time: Duration::from_secs(seconds),
        }
    }

    #[must_use]
    pub const fn as_duration_since_epoch(&self) -> Duration {
        self.time
    }

    #[must_use]
    pub const fn as_secs_since_epoch(&self) -> u64 {
        self.time.as_secs()
    }

    #[must_use]
    pub fn as_absolute_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        TryInto::<i64>::try_into(self.time.as_secs())
            .ok()
            .and_then(|secs| {
                // Note: chrono::DateTime supports time values up to about 262,000 years away
                // from the common era, which is still way below i64::MAX; i.e. timestamp_opt
                // may still return None here.
                chrono::Utc
                    .timestamp_opt(secs, self.time.subsec_nanos())
                    .single()
            })
    }

    /// The calendar date at this time, in the local timezone.
    #[must_use]
    pub fn as_local_date(&self) -> chrono::NaiveDate {
        self.as_local_datetime().date_naive()
    }

    /// Local wall-clock timestamp with microseconds, e.g.
    /// `2024-03-15 14:05:06.789012`.
    #[must_use]
    pub fn as_local_timestamp(&self) -> String {
        self.as_local_datetime()
            .format("%Y-%m-%d %H:%M:%S%.6f")
            .to_string()
    }

    fn as_local_datetime(&self) -> chrono::DateTime<chrono::Local> {
        #[allow(clippy::cast_possible_wrap)]
        let seconds = self.time.as_secs() as i64;
        chrono::Local
            .timestamp_opt(seconds, self.time.subsec_nanos())
            .earliest()
            .expect("Must be valid, since it's from valid time")
    }
}

impl Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let utc_time = self.as_absolute_time();

        if let Some(time) = utc_time {
            write!(f, "{time:?}")
        } else {
            write!(f, "Time({:?})", self.time)
        }
    }
}

impl Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let utc_time = self.as_absolute_time();

        if let Some(time) = utc_time {
            write!(f, "{time}")
        } else {
            write!(f, "{:?} since Unix epoch", self.time)
        }
    }
}
