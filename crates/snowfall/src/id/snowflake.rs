use core::{fmt, str::FromStr, time::Duration};

use crate::{Error, Result};

/// A 64-bit Snowflake ID with a split node identity.
///
/// - 1 bit reserved (always zero, so the value is also a valid `i64`)
/// - 41 bits timestamp (ms since the generator's epoch, ~69 years)
/// - 5 bits datacenter ID
/// - 5 bits worker ID
/// - 12 bits sequence
///
/// ```text
///  Bit Index:  63           63 62            22 21            17 16          12 11             0
///              +--------------+----------------+----------------+--------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter (5) |  worker (5)  | sequence (12) |
///              +--------------+----------------+----------------+--------------+---------------+
///              |<------------------- MSB ------------- 64 bits ------------- LSB ------------->|
/// ```
///
/// # Example
///
/// ```
/// use snowfall::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 3, 5, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.datacenter_id(), 3);
/// assert_eq!(id.worker_id(), 5);
/// assert_eq!(id.sequence(), 1);
/// ```
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for the reserved sign bit (bit 63).
    pub const RESERVED_MASK: u64 = 1 << 63;

    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 22
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << 41) - 1;

    /// Bitmask for extracting the 5-bit datacenter ID field. Occupies bits 17
    /// through 21.
    pub const DATACENTER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 5-bit worker ID field. Occupies bits 12
    /// through 16.
    pub const WORKER_ID_MASK: u64 = (1 << 5) - 1;

    /// Bitmask for extracting the 12-bit sequence field. Occupies bits 0
    /// through 11.
    pub const SEQUENCE_MASK: u64 = (1 << 12) - 1;

    /// Number of bits to shift the timestamp to its correct position (bit 22).
    pub const TIMESTAMP_SHIFT: u64 = 22;

    /// Number of bits to shift the datacenter ID to its correct position (bit
    /// 17).
    pub const DATACENTER_ID_SHIFT: u64 = 17;

    /// Number of bits to shift the worker ID to its correct position (bit 12).
    pub const WORKER_ID_SHIFT: u64 = 12;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u64 = 0;

    /// Packs the four fields into an ID, masking each to its width.
    pub const fn from(timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let datacenter_id = (datacenter_id & Self::DATACENTER_ID_MASK) << Self::DATACENTER_ID_SHIFT;
        let worker_id = (worker_id & Self::WORKER_ID_MASK) << Self::WORKER_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | datacenter_id | worker_id | sequence,
        }
    }

    /// Constructs a new ID from its components.
    ///
    /// Debug builds panic if any component overflows its field.
    pub fn from_components(timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(
            datacenter_id <= Self::DATACENTER_ID_MASK,
            "datacenter_id overflow"
        );
        debug_assert!(worker_id <= Self::WORKER_ID_MASK, "worker_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from(timestamp, datacenter_id, worker_id, sequence)
    }

    /// Extracts the timestamp (ms since epoch) from the packed ID.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the datacenter ID from the packed ID.
    pub const fn datacenter_id(&self) -> u64 {
        (self.id >> Self::DATACENTER_ID_SHIFT) & Self::DATACENTER_ID_MASK
    }

    /// Extracts the worker ID from the packed ID.
    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_ID_SHIFT) & Self::WORKER_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns the maximum possible value for the timestamp field.
    pub const fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the maximum possible value for the sequence field.
    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns the raw packed value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Wraps a raw packed value without validation. See [`Self::is_valid`].
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a signed integer.
    ///
    /// The reserved bit is never set by a generator, so the result is
    /// non-negative for every generated ID.
    pub const fn to_i64(&self) -> i64 {
        self.id as i64
    }

    /// Returns `true` if the reserved sign bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Returns the wall-clock time of this ID in milliseconds since the Unix
    /// epoch, given the epoch it was generated against.
    pub fn unix_millis(&self, epoch: Duration) -> u64 {
        crate::time::duration_to_millis(epoch).saturating_add(self.timestamp())
    }

    /// Returns the ID as a zero-padded 19-digit string, the width of
    /// `i64::MAX`. Padded strings sort the same way the IDs do.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &format_args!("0x{:016x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("datacenter_id", &self.datacenter_id())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    /// Parses the decimal form produced by [`fmt::Display`].
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::ParseId {
            input: s.to_owned(),
        };
        let id = Self::from_raw(s.parse::<u64>().map_err(|_| invalid())?);
        if !id.is_valid() {
            return Err(invalid());
        }
        Ok(id)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_i64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_bounds() {
        let ts = SnowflakeId::max_timestamp();
        let dc = SnowflakeId::DATACENTER_ID_MASK;
        let worker = SnowflakeId::WORKER_ID_MASK;
        let seq = SnowflakeId::max_sequence();

        let id = SnowflakeId::from(ts, dc, worker, seq);
        assert_eq!(id.timestamp(), ts);
        assert_eq!(id.datacenter_id(), dc);
        assert_eq!(id.worker_id(), worker);
        assert_eq!(id.sequence(), seq);
        assert_eq!(SnowflakeId::from_components(ts, dc, worker, seq), id);

        // every field at its max still leaves the sign bit clear
        assert!(id.is_valid());
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert_eq!(id.to_i64(), i64::MAX);
    }

    #[test]
    fn matches_shift_formula() {
        let id = SnowflakeId::from_components(1000, 3, 5, 7);
        let expected = (1000_u64 << 22) | (3 << 17) | (5 << 12) | 7;
        assert_eq!(id.to_raw(), expected);
    }

    #[test]
    fn decoding_recovers_every_field() {
        let samples = [
            (0, 0, 0, 0),
            (1, 31, 0, 4095),
            (1000, 3, 5, 1),
            (SnowflakeId::max_timestamp(), 0, 31, 0),
            (1 << 40, 16, 16, 2048),
        ];
        for (ts, dc, worker, seq) in samples {
            let id = SnowflakeId::from_raw(SnowflakeId::from_components(ts, dc, worker, seq).to_raw());
            assert_eq!(
                (id.timestamp(), id.datacenter_id(), id.worker_id(), id.sequence()),
                (ts, dc, worker, seq)
            );
        }
    }

    #[test]
    fn ordering_follows_timestamp_then_sequence() {
        let a = SnowflakeId::from_components(10, 31, 31, 4095);
        let b = SnowflakeId::from_components(11, 0, 0, 0);
        let c = SnowflakeId::from_components(11, 0, 0, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn unix_millis_adds_epoch() {
        let epoch = Duration::from_millis(1_565_193_600_000);
        let id = SnowflakeId::from_components(1000, 0, 0, 0);
        assert_eq!(id.unix_millis(epoch), 1_565_193_601_000);
    }

    #[test]
    fn parses_decimal_form() {
        let id = SnowflakeId::from_components(1000, 3, 5, 1);
        assert_eq!(id.to_string().parse::<SnowflakeId>(), Ok(id));
        assert_eq!(id.to_padded_string().len(), 19);
        assert_eq!(id.to_padded_string().parse::<SnowflakeId>(), Ok(id));
    }

    #[test]
    fn rejects_malformed_or_signed_strings() {
        assert!(matches!(
            "abc".parse::<SnowflakeId>(),
            Err(Error::ParseId { .. })
        ));
        assert!(matches!(
            "-1".parse::<SnowflakeId>(),
            Err(Error::ParseId { .. })
        ));
        let signed = (1_u64 << 63).to_string();
        assert!(matches!(
            signed.parse::<SnowflakeId>(),
            Err(Error::ParseId { .. })
        ));
    }

    #[test]
    fn debug_shows_fields() {
        let id = SnowflakeId::from_components(1000, 3, 5, 1);
        let debug = format!("{id:?}");
        assert!(debug.contains("timestamp: 1000"));
        assert!(debug.contains("datacenter_id: 3"));
        assert!(debug.contains("worker_id: 5"));
        assert!(debug.contains("sequence: 1"));
    }

    #[test]
    #[should_panic(expected = "timestamp overflow")]
    fn timestamp_overflow_panics() {
        let ts = SnowflakeId::max_timestamp() + 1;
        SnowflakeId::from_components(ts, 0, 0, 0);
    }

    #[test]
    #[should_panic(expected = "datacenter_id overflow")]
    fn datacenter_id_overflow_panics() {
        SnowflakeId::from_components(0, 32, 0, 0);
    }

    #[test]
    #[should_panic(expected = "worker_id overflow")]
    fn worker_id_overflow_panics() {
        SnowflakeId::from_components(0, 0, 32, 0);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        SnowflakeId::from_components(0, 0, 0, 4096);
    }
}
