use core::fmt;

use crate::{Error, Result, SnowflakeId};

/// Names one half of a [`NodeId`]. Used to report which value failed
/// validation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeField {
    /// The worker ID, unique within a datacenter.
    Worker,
    /// The datacenter ID.
    Datacenter,
}

impl fmt::Display for NodeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Worker => "worker",
            Self::Datacenter => "datacenter",
        })
    }
}

/// The `(datacenter_id, worker_id)` pair that makes a generator's IDs
/// distinct from every other generator's.
///
/// Both halves are validated on construction. Keeping the pair unique across
/// every generator running at the same time is up to whoever provisions the
/// fleet: `snowfall` cannot detect a duplicate.
///
/// # Example
///
/// ```
/// use snowfall::{Error, NodeField, NodeId};
///
/// let node = NodeId::new(5, 3)?;
/// assert_eq!(node.worker_id(), 5);
/// assert_eq!(node.datacenter_id(), 3);
///
/// assert!(matches!(
///     NodeId::new(32, 0),
///     Err(Error::InvalidNodeIdentity { field: NodeField::Worker, value: 32 })
/// ));
/// # Ok::<(), Error>(())
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    datacenter_id: u8,
    worker_id: u8,
}

impl NodeId {
    /// Largest value accepted for either the worker or the datacenter ID.
    pub const MAX_ID: i64 = SnowflakeId::WORKER_ID_MASK as i64;

    /// The `(0, 0)` identity.
    ///
    /// Only safe when exactly one generator exists across the whole system.
    /// Two generators that both use it will hand out colliding IDs.
    pub const SINGLE_NODE: Self = Self {
        datacenter_id: 0,
        worker_id: 0,
    };

    /// Validates and builds a node identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNodeIdentity`] if either value is negative or
    /// greater than [`Self::MAX_ID`]. The worker ID is checked first.
    pub fn new(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        let worker_id = Self::validate(NodeField::Worker, worker_id)?;
        let datacenter_id = Self::validate(NodeField::Datacenter, datacenter_id)?;
        Ok(Self {
            datacenter_id,
            worker_id,
        })
    }

    fn validate(field: NodeField, value: i64) -> Result<u8> {
        if (0..=Self::MAX_ID).contains(&value) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Ok(value as u8)
        } else {
            Err(Error::InvalidNodeIdentity { field, value })
        }
    }

    /// Returns the worker ID.
    pub const fn worker_id(&self) -> u64 {
        self.worker_id as u64
    }

    /// Returns the datacenter ID.
    pub const fn datacenter_id(&self) -> u64 {
        self.datacenter_id as u64
    }

    /// Returns `true` for the [`Self::SINGLE_NODE`] identity.
    pub const fn is_single_node(&self) -> bool {
        self.datacenter_id == 0 && self.worker_id == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "datacenter {} / worker {}",
            self.datacenter_id, self.worker_id
        )
    }
}
