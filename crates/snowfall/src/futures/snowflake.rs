use core::{future::Future, time::Duration};

use super::SleepProvider;
use crate::{Poll, Result, SnowflakeGenerator, SnowflakeId, TimeSource};

/// Extension trait for asynchronously generating Snowflake IDs.
///
/// Instead of spinning while the sequence is exhausted, the returned future
/// sleeps through the given [`SleepProvider`] and polls again. It never
/// resolves before the clock has moved to the next millisecond, so the
/// guarantees of [`SnowflakeGenerator::try_next_id`] still hold.
pub trait SnowflakeGeneratorAsyncExt {
    /// Returns a future that resolves to the next available Snowflake ID.
    ///
    /// # Errors
    ///
    /// Resolves to an error if the generator reports one, e.g.
    /// [`Error::ClockRegression`](crate::Error::ClockRegression). Errors are
    /// returned immediately, not retried.
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<SnowflakeId>> + Send
    where
        S: SleepProvider;
}

impl<T> SnowflakeGeneratorAsyncExt for SnowflakeGenerator<T>
where
    T: TimeSource + Sync,
{
    fn try_next_id_async<S>(&self) -> impl Future<Output = Result<SnowflakeId>> + Send
    where
        S: SleepProvider,
    {
        async {
            loop {
                let dur = match self.try_poll_id()? {
                    Poll::Ready { id } => return Ok(id),
                    Poll::Pending { yield_for } => Duration::from_millis(yield_for),
                };
                S::sleep_for(dur).await;
            }
        }
    }
}
