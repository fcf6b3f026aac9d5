use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Number of 100-nanosecond ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

const NANOS_PER_TICK: u128 = 100;

/// A point in time, counted in 100-nanosecond ticks since `0001-01-01T00:00:00`.
///
/// This matches the `Ticks` property of .NET's `System.DateTime`. The wire form is the tick
/// count as a little-endian `i64`. The zero tick (`DateTime::MIN`) is the null sentinel for
/// nullable date/time values.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DateTime {
    ticks: i64,
}

impl DateTime {
    /// `0001-01-01T00:00:00`
    pub const MIN: DateTime = DateTime { ticks: 0 };

    /// `9999-12-31T23:59:59.9999999`
    pub const MAX: DateTime = DateTime {
        ticks: 3_155_378_975_999_999_999,
    };

    /// `1970-01-01T00:00:00`
    pub const UNIX_EPOCH: DateTime = DateTime {
        ticks: 621_355_968_000_000_000,
    };

    /// Returns `None` if `ticks` is outside `MIN..=MAX`.
    pub const fn from_ticks(ticks: i64) -> Option<Self> {
        if ticks >= Self::MIN.ticks && ticks <= Self::MAX.ticks {
            Some(Self { ticks })
        } else {
            None
        }
    }

    /// The tick count.
    pub const fn ticks(self) -> i64 {
        self.ticks
    }

    /// Converts a `SystemTime`, truncating to tick precision. Returns `None` if the time is
    /// outside `MIN..=MAX`.
    pub fn from_system_time(t: SystemTime) -> Option<Self> {
        let ticks = match t.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::UNIX_EPOCH
                .ticks
                .checked_add(duration_to_ticks(after)?)?,
            Err(before) => Self::UNIX_EPOCH
                .ticks
                .checked_sub(duration_to_ticks(before.duration())?)?,
        };
        Self::from_ticks(ticks)
    }

    /// Converts to a `SystemTime`. Returns `None` if the platform cannot represent it.
    pub fn to_system_time(self) -> Option<SystemTime> {
        let delta = self.ticks - Self::UNIX_EPOCH.ticks;
        let magnitude = ticks_to_duration(delta.unsigned_abs());
        if delta >= 0 {
            UNIX_EPOCH.checked_add(magnitude)
        } else {
            UNIX_EPOCH.checked_sub(magnitude)
        }
    }
}

fn duration_to_ticks(d: Duration) -> Option<i64> {
    i64::try_from(d.as_nanos() / NANOS_PER_TICK).ok()
}

fn ticks_to_duration(ticks: u64) -> Duration {
    let secs = ticks / TICKS_PER_SECOND as u64;
    let sub = ticks % TICKS_PER_SECOND as u64;
    Duration::new(secs, (sub * NANOS_PER_TICK as u64) as u32)
}

impl TryFrom<SystemTime> for DateTime {
    type Error = crate::Error;

    fn try_from(t: SystemTime) -> crate::Result<Self> {
        Self::from_system_time(t).ok_or(crate::Error::CannotEncode(
            "time is outside the DateTime range",
        ))
    }
}
