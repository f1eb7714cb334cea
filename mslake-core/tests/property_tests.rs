//! Property tests for the MBF float conversion.
//!
//! Uses proptest to verify:
//! 1. Round-trip — every value the legacy layout can hold survives
//!    encode/decode bit-for-bit
//! 2. Overflow guard — inputs whose rebiased exponent flips its high
//!    bit decode to exactly 0.0, never a garbage float

use mslake_core::mbf::{ieee_to_msbin, msbin_to_ieee};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Floats whose MBF exponent byte clears the overflow guard: magnitude
/// at least 2.0 or below 0.5 (the guard rejects the two exponent values
/// in between, which is part of the contract).
fn arb_encodable() -> impl Strategy<Value = f32> {
    prop_oneof![
        2.0f32..1.0e7,
        1.0e-4f32..0.4999,
        (2.0f32..1.0e7).prop_map(|v| -v),
        (1.0e-4f32..0.4999).prop_map(|v| -v),
    ]
}

proptest! {
    /// Encoding an IEEE float into the legacy layout and decoding it
    /// back reproduces the value exactly.
    #[test]
    fn mbf_roundtrip(value in arb_encodable()) {
        let encoded = ieee_to_msbin(value);
        prop_assert_ne!(encoded, 0);
        prop_assert_eq!(msbin_to_ieee(encoded), value);
    }

    /// Inputs with MBF exponent byte 0x80 or 0x81 trip the overflow
    /// guard and decode to exactly zero regardless of their mantissa.
    #[test]
    fn overflow_guard_boundary(low in any::<u16>(), mantissa in 0u32..0x100) {
        for exponent in [0x80u32, 0x81] {
            let msbin = (exponent << 24) | (mantissa << 16) | u32::from(low);
            prop_assert_eq!(msbin_to_ieee(msbin), 0.0);
        }
    }

    /// Underflowing exponents (0x00 with a payload, 0x01) wrap the
    /// subtraction and are caught by the same guard.
    #[test]
    fn underflow_guard_boundary(low in any::<u16>(), mantissa in 0u32..0x100) {
        let msbin = (0x01u32 << 24) | (mantissa << 16) | u32::from(low);
        prop_assert_eq!(msbin_to_ieee(msbin), 0.0);
    }

    /// Zero and near-boundary values just outside the guarded band stay
    /// decodable.
    #[test]
    fn values_outside_guard_band_decode_nonzero(low in any::<u16>()) {
        // Exponent 0x82 is the smallest that survives the rebias with
        // its high bit intact.
        let msbin = (0x82u32 << 24) | u32::from(low);
        let decoded = msbin_to_ieee(msbin);
        prop_assert!(decoded != 0.0);
    }
}

#[test]
fn zero_is_identity_both_ways() {
    assert_eq!(msbin_to_ieee(0), 0.0);
    assert_eq!(ieee_to_msbin(0.0), 0);
}
