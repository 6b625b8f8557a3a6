//! Coordination-free, time-ordered 64-bit identifiers.
//!
//! Every [`SnowflakeId`] packs a millisecond offset from a fixed epoch, a
//! datacenter id, a worker id and a per-millisecond sequence:
//!
//! ```text
//!  Bit Index:  63           63 62            22 21            17 16          12 11             0
//!              +--------------+----------------+----------------+--------------+---------------+
//!  Field:      | reserved (1) | timestamp (41) | datacenter (5) |  worker (5)  | sequence (12) |
//!              +--------------+----------------+----------------+--------------+---------------+
//! ```
//!
//! IDs from one [`SnowflakeGenerator`] are unique and non-decreasing. IDs from
//! different generators never collide as long as every running generator has
//! its own [`NodeId`].
//!
//! ```
//! use snowfall::{NodeId, SnowflakeGenerator, SystemClock};
//!
//! let node = NodeId::new(5, 3)?;
//! let generator = SnowflakeGenerator::new(node, SystemClock);
//!
//! let a = generator.try_next_id()?;
//! let b = generator.try_next_id()?;
//! assert!(a < b);
//! assert_eq!(a.worker_id(), 5);
//! assert_eq!(a.datacenter_id(), 3);
//! # Ok::<(), snowfall::Error>(())
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
#[cfg(feature = "futures")]
mod futures;
mod generator;
mod id;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
#[cfg(feature = "futures")]
pub use crate::futures::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
