use crate::SnowflakeId;

/// The outcome of a non-blocking generation attempt.
///
/// Returned by [`SnowflakeGenerator::try_poll_id`]:
///
/// - [`Poll::Ready`] means a new ID was issued.
/// - [`Poll::Pending`] means all 4096 sequence values of the current
///   millisecond are used up. Nothing was issued and the generator state is
///   unchanged; try again once the clock has advanced.
///
/// This allows non-blocking generation loops and clean backoff strategies.
///
/// # Example
///
/// ```
/// use snowfall::{NodeId, Poll, SnowflakeGenerator, SystemClock};
///
/// let generator = SnowflakeGenerator::new(NodeId::new(1, 1)?, SystemClock);
/// let id = loop {
///     match generator.try_poll_id()? {
///         Poll::Ready { id } => break id,
///         Poll::Pending { .. } => std::thread::yield_now(),
///     }
/// };
/// assert_eq!(id.worker_id(), 1);
/// # Ok::<(), snowfall::Error>(())
/// ```
///
/// [`SnowflakeGenerator::try_poll_id`]: crate::SnowflakeGenerator::try_poll_id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SnowflakeId,
    },
    /// The sequence is exhausted for the current millisecond.
    Pending {
        /// Milliseconds to wait before trying again.
        yield_for: u64,
    },
}
