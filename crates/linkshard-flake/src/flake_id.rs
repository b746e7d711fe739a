use modular_bitfield::prelude::*;
use std::fmt;

pub(crate) const NODE_ID_BITS: u32 = 3;
pub(crate) const SEQUENCE_BITS: u32 = 8;
pub(crate) const TICK_BITS: u32 = 30;

/// A packed allocator id, least significant field first.
#[bitfield]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlakeId {
    /// 3 bits for node ID (allows up to 8 nodes).
    pub node_id: B3,
    /// 8 bits for sequence number (resets every tick).
    pub sequence: B8,
    /// 30 bits for ticks elapsed since the custom epoch.
    pub ticks: B30,
    #[skip]
    __: B7,
}

impl FlakeId {
    /// Rebuilds the fields from a numeric id.
    pub fn from_u64(value: u64) -> Self {
        let node_id = value & ((1 << NODE_ID_BITS) - 1);
        let sequence = (value >> NODE_ID_BITS) & ((1 << SEQUENCE_BITS) - 1);
        let ticks = (value >> (NODE_ID_BITS + SEQUENCE_BITS)) & ((1 << TICK_BITS) - 1);
        FlakeId::new()
            .with_node_id(node_id as u8)
            .with_sequence(sequence as u8)
            .with_ticks(ticks as u32)
    }

    /// The numeric id: `ticks << 11 | sequence << 3 | node_id`.
    pub fn as_u64(&self) -> u64 {
        (u64::from(self.ticks()) << (NODE_ID_BITS + SEQUENCE_BITS))
            | (u64::from(self.sequence()) << NODE_ID_BITS)
            | u64::from(self.node_id())
    }
}

impl From<FlakeId> for u64 {
    fn from(id: FlakeId) -> Self {
        id.as_u64()
    }
}

impl fmt::Debug for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlakeId")
            .field("ticks", &self.ticks())
            .field("sequence", &self.sequence())
            .field("node_id", &self.node_id())
            .finish()
    }
}
