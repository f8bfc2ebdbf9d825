//! Affiliate referral code generation.

use rand::Rng;

/// Code alphabet. Excludes `0/O` and `1/I` to keep codes transcribable.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of generated referral codes.
pub const CODE_LENGTH: usize = 8;

/// Generate a random referral code (e.g. `K7MPX2RA`).
///
/// Uniqueness is enforced by the `uq_affiliates_referral_code` constraint;
/// callers retry on conflict.
pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_expected_length_and_alphabet() {
        let code = generate_referral_code();
        assert_eq!(code.len(), CODE_LENGTH);
        assert!(code.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn codes_are_not_constant() {
        // Collision over 50 draws from a 32^8 space would indicate a broken RNG.
        let codes: std::collections::HashSet<_> =
            (0..50).map(|_| generate_referral_code()).collect();
        assert!(codes.len() > 1);
    }
}
