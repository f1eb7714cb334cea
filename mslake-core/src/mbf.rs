//! Microsoft Basic floating-point (MBF) conversion.
//!
//! Metastock files store every numeric field as a 32-bit MBF single.
//! The layout differs from IEEE-754: the top byte is the exponent
//! (biased two higher than IEEE), followed by the sign bit and the high
//! mantissa bits. Conversion is pure bit manipulation on the 32-bit
//! pattern; the low 16 bits carry over unchanged.

/// Convert a 32-bit MBF single into an IEEE-754 `f32`.
///
/// A zero input maps to `0.0` without any bit manipulation. If
/// rebiasing the exponent flips its high bit, the value is not
/// representable and the conversion yields exactly `0.0`. That overflow
/// guard is part of the legacy on-disk contract and is kept as-is.
/// Any other input produces some float; record lengths are validated
/// upstream, so garbage in yields garbage out here.
pub fn msbin_to_ieee(msbin: u32) -> f32 {
    if msbin == 0 {
        return 0.0;
    }
    let mut mantissa = msbin >> 16;
    let exponent = (mantissa & 0xff00).wrapping_sub(0x0200);
    if (exponent & 0x8000) != (mantissa & 0x8000) {
        // exponent overflow
        return 0.0;
    }
    // move sign from bit 7 to bit 15
    mantissa = (mantissa & 0x7f) | ((mantissa << 8) & 0x8000);
    mantissa |= exponent >> 1;
    f32::from_bits((msbin & 0xffff) | (mantissa << 16))
}

/// Convert an IEEE-754 `f32` into the 32-bit MBF single layout.
///
/// Inverse of [`msbin_to_ieee`] for every value the legacy format can
/// hold. IEEE exponents too large for the 8-bit MBF exponent encode as
/// zero. Used to build test fixtures and synthetic data files.
pub fn ieee_to_msbin(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits == 0 {
        return 0;
    }
    let high = bits >> 16;
    let exponent = ((high >> 7) & 0xff) + 2;
    if exponent > 0xff {
        return 0;
    }
    let mantissa = (exponent << 8) | ((high >> 8) & 0x80) | (high & 0x7f);
    (bits & 0xffff) | (mantissa << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_decodes_to_zero() {
        assert_eq!(msbin_to_ieee(0), 0.0);
    }

    #[test]
    fn known_values_roundtrip() {
        // Values representative of what the price files hold: packed
        // YYMMDD dates, prices, volumes.
        for v in [2.0f32, 3.5, 123.45, 5000.0, 1_010_101.0, 0.25, -42.5] {
            let encoded = ieee_to_msbin(v);
            assert_eq!(msbin_to_ieee(encoded), v, "round-trip failed for {v}");
        }
    }

    #[test]
    fn overflow_guard_yields_exact_zero() {
        // MBF exponent bytes 0x80 and 0x81 flip the high bit when the
        // bias is removed, so the guard must kick in.
        assert_eq!(msbin_to_ieee(0x8100_0000), 0.0);
        assert_eq!(msbin_to_ieee(0x8000_0001), 0.0);
        // Underflow wraps the same way.
        assert_eq!(msbin_to_ieee(0x0100_0000), 0.0);
    }

    #[test]
    fn sign_bit_is_preserved() {
        let encoded = ieee_to_msbin(-123.45);
        assert_eq!(msbin_to_ieee(encoded), -123.45);
    }

    #[test]
    fn low_word_carries_over_unchanged() {
        let encoded = ieee_to_msbin(123.456);
        assert_eq!(encoded & 0xffff, 123.456f32.to_bits() & 0xffff);
    }
}
