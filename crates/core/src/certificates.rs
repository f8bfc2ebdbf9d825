//! Certificate serial number generation.

use rand::Rng;

/// Serial alphabet, matching the referral code alphabet.
const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random segment length in a serial.
const SEGMENT_LENGTH: usize = 10;

/// Generate a certificate serial, e.g. `VDX-2026-M3K7XPQ2RA`.
///
/// Serials are public (printed on certificates and used for verification
/// lookups), so they carry no user-identifying information.
pub fn generate_serial(year: i32) -> String {
    let mut rng = rand::rng();
    let segment: String = (0..SEGMENT_LENGTH)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("VDX-{year}-{segment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_has_expected_shape() {
        let serial = generate_serial(2026);
        let parts: Vec<&str> = serial.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "VDX");
        assert_eq!(parts[1], "2026");
        assert_eq!(parts[2].len(), SEGMENT_LENGTH);
    }

    #[test]
    fn serials_differ_between_draws() {
        assert_ne!(generate_serial(2026), generate_serial(2026));
    }
}
