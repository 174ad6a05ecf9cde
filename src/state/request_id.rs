use std::sync::atomic::{AtomicU64, Ordering};

/// Multiplier that spreads sequence bits across all 128 bits.
const SEQ_MIX: u128 = 0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C835;

/// Cheap unique ids: a random 128-bit seed mixed with a sequence number,
/// stamped as RFC 4122 version 4.
pub(crate) struct RequestIdGenerator {
    seed: u128,
    counter: AtomicU64,
}

impl RequestIdGenerator {
    #[must_use]
    pub(crate) fn new() -> Self {
        let seed_hi = u128::from(fastrand::u64(..));
        let seed_lo = u128::from(fastrand::u64(..));
        Self {
            seed: (seed_hi << 64) | seed_lo,
            counter: AtomicU64::new(1),
        }
    }

    #[must_use]
    pub(crate) fn next_uuid(&self) -> uuid::Uuid {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let mixed = self.seed ^ u128::from(seq).wrapping_mul(SEQ_MIX);
        uuid::Builder::from_random_bytes(mixed.to_le_bytes()).into_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let ids = RequestIdGenerator::new();
        let a = ids.next_uuid();
        let b = ids.next_uuid();
        assert_ne!(a, b);
        assert_eq!(a.hyphenated().to_string().len(), 36);
    }

    #[test]
    fn test_ids_are_version_4() {
        let ids = RequestIdGenerator::new();
        for _ in 0..64 {
            let id = ids.next_uuid();
            assert_eq!(id.get_version(), Some(uuid::Version::Random));
            assert_eq!(id.get_variant(), uuid::Variant::RFC4122);
        }
    }

    #[test]
    fn test_consecutive_ids_differ_in_high_bits() {
        let ids = RequestIdGenerator::new();
        let a = ids.next_uuid().as_u128();
        let b = ids.next_uuid().as_u128();
        assert_ne!(a >> 64, b >> 64);
    }
}
