//! Coordination-free ID allocation.
//!
//! [`Flake`] packs a coarse timestamp, a per-tick sequence and a node id into
//! 41 bits, which keeps every id inside the 7 character base62 keyspace.

mod clock;
mod flake;
mod flake_id;
pub mod seq;

pub use clock::{Clock, SystemClock};
pub use flake::{Flake, FlakeSettings};
pub use flake_id::FlakeId;
pub use linkshard_core::AllocatorError as Error;
pub use seq::SequenceAllocator;
