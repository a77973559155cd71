//! 64-bit ID generation and the payload checksum hash.
//!
//! The hash here is *not* a general-purpose hash function — its exact bit
//! pattern is part of the wire contract with the reference implementation
//! (see the golden vectors in `tests/`). Do not "improve" it.

use rand::Rng;

/// Multiplicative constant used by the payload checksum (golden, see module docs).
const P1: u64 = 11_400_714_785_074_694_791;
/// Multiplicative constant used by the payload checksum (golden, see module docs).
const P2: u64 = 14_029_467_366_897_019_727;

/// Generate a fresh 64-bit identifier from the thread-local CSPRNG.
///
/// Used for `message_id`, `trace_id` (when no cause frame exists), and
/// `context_id`/`message_id` on freshly constructed A2A entities. Process-
/// local collisions are tolerated but astronomically unlikely.
pub fn random_id() -> u64 {
    rand::thread_rng().gen::<u64>()
}

/// Compute the 64-bit payload checksum.
///
/// `h` starts at zero; each payload byte XORs in `b * P1`, then the
/// accumulator is rotated left by 31 bits and multiplied by `P2`, all
/// wrapping in 64-bit arithmetic.
pub fn checksum(payload: &[u8]) -> u64 {
    let mut h: u64 = 0;
    for &b in payload {
        h ^= (b as u64).wrapping_mul(P1);
        h = h.rotate_left(31).wrapping_mul(P2);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_hashes_to_zero() {
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn checksum_is_deterministic() {
        let payload = b"Hello, world!";
        assert_eq!(checksum(payload), checksum(payload));
    }

    #[test]
    fn checksum_changes_with_any_byte() {
        let mut payload = b"Hello, world!".to_vec();
        let original = checksum(&payload);
        *payload.last_mut().unwrap() ^= 0x01;
        assert_ne!(checksum(&payload), original);
    }

    /// Golden vector pinned for the exact byte sequence `b"Hello, world!"`.
    /// Any change to the algorithm above must keep this constant, or the
    /// frame codec stops interoperating with the reference implementation.
    #[test]
    fn golden_vector_hello_world() {
        assert_eq!(checksum(b"Hello, world!"), 5_302_487_261_585_490_398);
    }

    #[test]
    fn random_id_is_not_trivially_constant() {
        let a = random_id();
        let b = random_id();
        assert_ne!(a, b, "two consecutive random ids collided — suspicious");
    }
}
