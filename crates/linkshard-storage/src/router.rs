use linkshard_core::ShortCode;

/// FNV-1a hash (32-bit).
pub fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Maps a short code to a shard index: `fnv1a(code) mod shard_count`.
///
/// Routing is a pure function of the code bytes and the shard count. Nothing
/// records where a code lives, so changing the shard count re-routes every
/// existing code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    /// A count of zero routes everything to index 0, which no store can
    /// serve; [`PartitionedStore`](crate::PartitionedStore) rejects it.
    pub fn new(shard_count: usize) -> Self {
        Self { shard_count }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn route(&self, code: &ShortCode) -> usize {
        if self.shard_count <= 1 {
            return 0;
        }
        fnv1a(code.as_bytes()) as usize % self.shard_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn single_shard_always_zero() {
        let router = ShardRouter::new(1);
        assert_eq!(router.route(&ShortCode::from_id(1)), 0);
        assert_eq!(router.route(&ShortCode::from_id(12345)), 0);
    }

    #[test]
    fn deterministic() {
        let router = ShardRouter::new(3);
        let code = ShortCode::from_id(42);
        assert_eq!(router.route(&code), router.route(&code));
        assert_eq!(router.route(&code), ShardRouter::new(3).route(&code));
    }

    #[test]
    fn matches_hash_mod_count() {
        let router = ShardRouter::new(2);
        let code = ShortCode::from_id(1);
        assert_eq!(router.route(&code), fnv1a(b"0000001") as usize % 2);
    }

    #[test]
    fn distributes() {
        let router = ShardRouter::new(4);
        let mut counts = [0u32; 4];
        for id in 0..1000u64 {
            counts[router.route(&ShortCode::from_id(id))] += 1;
        }
        for count in &counts {
            assert!(*count > 100, "poor distribution: {counts:?}");
        }
    }
}
