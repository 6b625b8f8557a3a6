use crate::NodeField;

/// A result type whose error defaults to [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `snowfall` can produce.
///
/// Only [`Error::InvalidNodeIdentity`] is raised while building a generator.
/// Every other variant is scoped to a single call: the generator state is left
/// untouched, so the same generator can be called again once the condition
/// clears.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A worker or datacenter id was negative or larger than
    /// [`NodeId::MAX_ID`](crate::NodeId::MAX_ID).
    #[error("{field} id can't be greater than {max} or less than 0 (got {value})", max = crate::NodeId::MAX_ID)]
    InvalidNodeIdentity {
        /// Which half of the node identity was rejected.
        field: NodeField,
        /// The rejected value.
        value: i64,
    },

    /// The clock reported a time earlier than the last issued ID.
    ///
    /// No ID was produced. Retry once the clock has caught up again.
    #[error("clock moved backwards, refusing to generate id for {behind_ms} milliseconds")]
    ClockRegression {
        /// How far the clock is behind the last issued timestamp.
        behind_ms: u64,
    },

    /// The clock reading cannot be encoded: it is either earlier than the
    /// generator's epoch or more than 2^41 - 1 milliseconds after it.
    #[error("clock reading {millis} ms is outside the encodable timestamp range")]
    TimestampOutOfRange {
        /// The raw clock reading, in milliseconds since the Unix epoch.
        millis: u64,
    },

    /// A string could not be parsed as a [`SnowflakeId`](crate::SnowflakeId).
    #[error("invalid snowflake id: {input:?}")]
    ParseId {
        /// The rejected input.
        input: String,
    },

    /// The generator lock was poisoned by a panicking thread.
    ///
    /// Not available with the `parking-lot` feature, whose mutex does not
    /// poison.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

#[cfg(not(feature = "parking-lot"))]
use std::sync::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
