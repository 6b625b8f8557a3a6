use core::{cmp::Ordering, time::Duration};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    Poll,
    mutex::{Mutex, MutexGuard},
};
use crate::{
    DEFAULT_EPOCH, Error, NodeId, Result, SnowflakeId, SystemClock, TimeSource,
    time::duration_to_millis,
};

/// Mutable generator state. Only ever read or written while the lock is held.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct State {
    /// Timestamp (ms since epoch) of the last issued ID, `None` before the
    /// first one.
    last_timestamp: Option<u64>,
    /// Sequence of the last issued ID.
    sequence: u64,
}

/// A lock-based Snowflake ID generator safe to share across threads.
///
/// The last issued timestamp and sequence live behind a single mutex. Every
/// call reads the clock, checks for regression, advances the sequence and
/// writes the new state inside one critical section, so concurrent callers
/// never observe the same `(timestamp, sequence)` pair.
///
/// Share it with an [`Arc`](std::sync::Arc); the generator itself is `Sync`
/// whenever its [`TimeSource`] is.
///
/// ## Guarantees
/// - IDs from one generator are unique.
/// - For two calls that complete one after the other, the second ID is
///   greater.
/// - A backwards clock step fails the call with [`Error::ClockRegression`]
///   instead of breaking either guarantee.
///
/// ## See Also
/// - [`NodeId`]
/// - [`Poll`]
pub struct SnowflakeGenerator<T>
where
    T: TimeSource,
{
    node: NodeId,
    epoch_millis: u64,
    state: Mutex<State>,
    time: T,
}

impl<T> SnowflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new generator for `node` using [`DEFAULT_EPOCH`].
    ///
    /// # Example
    /// ```
    /// use snowfall::{NodeId, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = SnowflakeGenerator::new(NodeId::new(5, 3)?, SystemClock);
    /// let id = generator.try_next_id()?;
    /// assert_eq!((id.datacenter_id(), id.worker_id()), (3, 5));
    /// # Ok::<(), snowfall::Error>(())
    /// ```
    pub fn new(node: NodeId, time: T) -> Self {
        Self::with_epoch(node, DEFAULT_EPOCH, time)
    }

    /// Creates a new generator for `node` whose timestamps count from
    /// `epoch`, given as a [`Duration`] since 1970-01-01 UTC.
    ///
    /// The epoch must stay fixed for the lifetime of a deployment. Moving it
    /// breaks ordering between old and new IDs and can produce duplicates.
    pub fn with_epoch(node: NodeId, epoch: Duration, time: T) -> Self {
        Self {
            node,
            epoch_millis: duration_to_millis(epoch),
            state: Mutex::new(State::default()),
            time,
        }
    }

    /// Creates a generator preloaded with the state of a previously issued
    /// ID.
    ///
    /// This constructor is primarily useful for tests or for resuming after a
    /// known last ID. `last_timestamp` is in milliseconds since `epoch`.
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`Self::new`].
    pub fn from_components(
        node: NodeId,
        epoch: Duration,
        last_timestamp: u64,
        sequence: u64,
        time: T,
    ) -> Self {
        debug_assert!(
            last_timestamp <= SnowflakeId::max_timestamp(),
            "timestamp overflow"
        );
        debug_assert!(sequence <= SnowflakeId::max_sequence(), "sequence overflow");
        Self {
            node,
            epoch_millis: duration_to_millis(epoch),
            state: Mutex::new(State {
                last_timestamp: Some(last_timestamp),
                sequence,
            }),
            time,
        }
    }

    /// Creates a generator with the `(0, 0)` [`NodeId::SINGLE_NODE`]
    /// identity.
    ///
    /// # ⚠️ Note
    /// Only safe when this is the only generator in the whole system. A second
    /// generator built this way issues colliding IDs, and nothing detects it.
    /// Prefer [`Self::new`] with a provisioned [`NodeId`].
    pub fn single_node(time: T) -> Self {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            "snowflake generator uses the single-node (0, 0) identity; ids collide if another generator shares it"
        );
        Self::new(NodeId::SINGLE_NODE, time)
    }

    /// Returns the node identity encoded into every ID.
    pub const fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the epoch that timestamps are counted from.
    pub const fn epoch(&self) -> Duration {
        Duration::from_millis(self.epoch_millis)
    }

    /// Generates the next ID, waiting out sequence exhaustion.
    ///
    /// If all 4096 sequence values of the current millisecond are used, this
    /// spins on the clock (holding the lock) until the next millisecond and
    /// issues sequence `0` there. The wait is bounded by wall-clock time,
    /// normally well under a millisecond.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   timestamp.
    /// - [`Error::TimestampOutOfRange`] if the clock is before the epoch or
    ///   beyond the 41-bit timestamp range.
    /// - `Error::LockPoisoned` if another thread panicked while holding the
    ///   lock (not with `parking-lot`).
    ///
    /// On any error no ID is issued and the state is left unchanged, so the
    /// call can be retried.
    ///
    /// # Example
    /// ```
    /// use snowfall::{Error, NodeId, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = SnowflakeGenerator::new(NodeId::new(0, 1)?, SystemClock);
    ///
    /// let id = match generator.try_next_id() {
    ///     Ok(id) => id,
    ///     Err(Error::ClockRegression { behind_ms }) => {
    ///         panic!("clock moved back {behind_ms} ms, retry later")
    ///     }
    ///     Err(e) => return Err(e),
    /// };
    /// assert_eq!(id.datacenter_id(), 1);
    /// # Ok::<(), Error>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.lock()?;
        let now = self.current_offset()?;

        let (timestamp, sequence) = match Self::advance(&state, now)? {
            Some(next) => next,
            None => (self.wait_past(now)?, 0),
        };

        Ok(self.commit(&mut state, timestamp, sequence))
    }

    /// Attempts to generate the next ID without blocking.
    ///
    /// Returns [`Poll::Ready`] with a new ID, or [`Poll::Pending`] if the
    /// sequence is exhausted for the current millisecond. Pending leaves the
    /// state unchanged.
    ///
    /// # Errors
    ///
    /// The same as [`Self::try_next_id`].
    ///
    /// # Example
    /// ```
    /// use snowfall::{NodeId, Poll, SnowflakeGenerator, SystemClock};
    ///
    /// let generator = SnowflakeGenerator::new(NodeId::new(2, 2)?, SystemClock);
    ///
    /// let id = loop {
    ///     match generator.try_poll_id()? {
    ///         Poll::Ready { id } => break id,
    ///         Poll::Pending { yield_for } => {
    ///             std::thread::sleep(std::time::Duration::from_millis(yield_for));
    ///         }
    ///     }
    /// };
    /// assert_eq!(id.worker_id(), 2);
    /// # Ok::<(), snowfall::Error>(())
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let mut state = self.lock()?;
        let now = self.current_offset()?;

        match Self::advance(&state, now)? {
            Some((timestamp, sequence)) => Ok(Poll::Ready {
                id: self.commit(&mut state, timestamp, sequence),
            }),
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(timestamp = now, "sequence exhausted");
                Ok(Poll::Pending { yield_for: 1 })
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        #[cfg(feature = "parking-lot")]
        {
            Ok(self.state.lock())
        }
        #[cfg(not(feature = "parking-lot"))]
        {
            Ok(self.state.lock()?)
        }
    }

    /// Reads the clock as milliseconds since the epoch.
    fn current_offset(&self) -> Result<u64> {
        let millis = self.time.current_millis();
        match millis.checked_sub(self.epoch_millis) {
            Some(offset) if offset <= SnowflakeId::max_timestamp() => Ok(offset),
            _ => Err(Self::cold_out_of_range(millis)),
        }
    }

    /// Computes the `(timestamp, sequence)` for the next ID at `now`, or
    /// `None` when the sequence for `now` is used up.
    fn advance(state: &State, now: u64) -> Result<Option<(u64, u64)>> {
        let Some(last) = state.last_timestamp else {
            return Ok(Some((now, 0)));
        };

        match now.cmp(&last) {
            Ordering::Equal => {
                if state.sequence < SnowflakeId::max_sequence() {
                    Ok(Some((now, state.sequence + 1)))
                } else {
                    Ok(None)
                }
            }
            Ordering::Greater => Ok(Some((now, 0))),
            Ordering::Less => Err(Self::cold_clock_behind(now, last)),
        }
    }

    /// Spins until the clock moves past `last`.
    #[cold]
    fn wait_past(&self, last: u64) -> Result<u64> {
        #[cfg(feature = "tracing")]
        tracing::trace!(timestamp = last, "sequence exhausted, waiting for next millisecond");
        loop {
            let now = self.current_offset()?;
            match now.cmp(&last) {
                Ordering::Greater => break Ok(now),
                Ordering::Equal => core::hint::spin_loop(),
                Ordering::Less => break Err(Self::cold_clock_behind(now, last)),
            }
        }
    }

    fn commit(&self, state: &mut State, timestamp: u64, sequence: u64) -> SnowflakeId {
        *state = State {
            last_timestamp: Some(timestamp),
            sequence,
        };
        SnowflakeId::from_components(
            timestamp,
            self.node.datacenter_id(),
            self.node.worker_id(),
            sequence,
        )
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        let behind_ms = last - now;
        #[cfg(feature = "tracing")]
        tracing::warn!(behind_ms, "clock moved backwards, refusing to generate id");
        Error::ClockRegression { behind_ms }
    }

    #[cold]
    #[inline(never)]
    fn cold_out_of_range(millis: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::error!(millis, "clock reading outside the encodable timestamp range");
        Error::TimestampOutOfRange { millis }
    }
}

impl SnowflakeGenerator<SystemClock> {
    /// Validates `(worker_id, datacenter_id)` and builds a generator on the
    /// system clock with [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentity`] if either ID is outside
    /// `0..=31`.
    ///
    /// # Example
    /// ```
    /// use snowfall::SnowflakeGenerator;
    ///
    /// let generator = SnowflakeGenerator::try_new(5, 3)?;
    /// assert!(SnowflakeGenerator::try_new(32, 0).is_err());
    /// # Ok::<(), snowfall::Error>(())
    /// ```
    pub fn try_new(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        Ok(Self::new(NodeId::new(worker_id, datacenter_id)?, SystemClock))
    }
}

impl<T> core::fmt::Debug for SnowflakeGenerator<T>
where
    T: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnowflakeGenerator")
            .field("node", &self.node)
            .field("epoch_millis", &self.epoch_millis)
            .finish_non_exhaustive()
    }
}
