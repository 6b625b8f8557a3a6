use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

/// Default epoch: Thursday, August 8, 2019 00:00:00 UTC+8
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_565_193_600_000);

/// A trait for time sources that return the current wall-clock time.
///
/// The unit is **milliseconds since the Unix epoch**. Generators subtract their
/// own epoch from it. Implementations should read the clock on every call with
/// no caching or retries; a clock that steps backwards is detected by the
/// generator and reported as [`Error::ClockRegression`].
///
/// This abstraction allows you to plug in the system clock or a mocked time
/// source in tests.
///
/// # Example
///
/// ```
/// use snowfall::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1234);
/// ```
///
/// [`Error::ClockRegression`]: crate::Error::ClockRegression
pub trait TimeSource {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn current_millis(&self) -> u64;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }
}

/// Reads [`SystemTime::now`] on every call.
///
/// The system clock can be stepped backwards (manual changes, NTP
/// corrections). Generators detect that and refuse to issue IDs until the
/// clock catches up. A system time before 1970 reads as `0`.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, duration_to_millis)
    }
}

/// Whole milliseconds in `dur`, saturating at `u64::MAX`.
pub(crate) fn duration_to_millis(dur: Duration) -> u64 {
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_default_epoch() {
        let now = SystemClock.current_millis();
        assert!(now > duration_to_millis(DEFAULT_EPOCH));
    }

    #[test]
    fn system_clock_tracks_wall_time() {
        let before = duration_to_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap());
        let read = SystemClock.current_millis();
        let after = duration_to_millis(SystemTime::now().duration_since(UNIX_EPOCH).unwrap());
        assert!(before <= read && read <= after);
    }

    #[test]
    fn smart_pointers_delegate() {
        struct Fixed;
        impl TimeSource for Fixed {
            fn current_millis(&self) -> u64 {
                42
            }
        }

        assert_eq!((&Fixed).current_millis(), 42);
        assert_eq!(Arc::new(Fixed).current_millis(), 42);
        let boxed: Box<dyn TimeSource> = Box::new(Fixed);
        assert_eq!(boxed.current_millis(), 42);
    }

    #[test]
    fn duration_to_millis_saturates() {
        assert_eq!(duration_to_millis(Duration::from_millis(7)), 7);
        assert_eq!(duration_to_millis(Duration::MAX), u64::MAX);
    }
}
