use core::{future::Future, time::Duration};

use super::{SleepProvider, SnowflakeGeneratorAsyncExt};
use crate::{Result, SnowflakeGenerator, SnowflakeId, TimeSource};

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on Tokio.
pub struct TokioSleep;

impl SleepProvider for TokioSleep {
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(dur)
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// This strategy avoids timer-based delays by yielding to the scheduler
/// immediately, which can improve responsiveness in low-concurrency scenarios.
///
/// However, it comes at the cost of more frequent rescheduling, which can
/// result in tighter polling loops and increased CPU usage under load. In
/// highly concurrent cases, a timer-based sleep (e.g., [`TokioSleep`]) is often
/// more efficient due to reduced scheduler churn.
pub struct TokioYield;

impl SleepProvider for TokioYield {
    fn sleep_for(_dur: Duration) -> impl Future<Output = ()> + Send {
        tokio::task::yield_now()
    }
}

/// Extension trait for asynchronously generating Snowflake IDs using the
/// [`tokio`](https://docs.rs/tokio) async runtime.
///
/// This is [`SnowflakeGeneratorAsyncExt`] with [`TokioSleep`] filled in.
pub trait SnowflakeGeneratorAsyncTokioExt {
    /// Returns a future that resolves to the next available Snowflake ID,
    /// sleeping on Tokio's timer while the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Resolves to an error if the generator reports one.
    fn try_next_id_tokio(&self) -> impl Future<Output = Result<SnowflakeId>> + Send;
}

impl<T> SnowflakeGeneratorAsyncTokioExt for SnowflakeGenerator<T>
where
    T: TimeSource + Sync,
{
    fn try_next_id_tokio(&self) -> impl Future<Output = Result<SnowflakeId>> + Send {
        <Self as SnowflakeGeneratorAsyncExt>::try_next_id_async::<TokioSleep>(self)
    }
}
