//! Fixed-point helpers for 24.8 levels and 8.8 sensor gains.
//!
//! Levels, heights and percentages are `i32` values with 8 fractional bits;
//! per-slot gains are `u16` with 8 fractional bits (`0x0100` == 1.0). No
//! floating point is used anywhere in the level pipeline so thresholds behave
//! identically on every run.

/// Fractional bits of every 24.8 quantity.
pub const FRAC_BITS: u8 = 8;

/// 1.0 in 8.8 gain format.
pub const UNITY_GAIN: u16 = 0x0100;

/// Widest fixed-point shift accepted by the renderers.
pub const MAX_SHIFT: u8 = 31;

/// Most fractional digits a renderer will produce.
pub const MAX_FRAC_DIGITS: u8 = 9;

/// Most forced leading zeros `render_decimal` will emit.
pub const MAX_LEADING_ZEROS: u8 = 10;

/// Integer part of a 24.8 value (arithmetic shift, rounds toward -inf).
#[inline]
pub fn to_whole(v: i32) -> i32 {
    v >> FRAC_BITS
}

/// First `digits` decimal digits of the fractional part of a fixed-point
/// value with `shift` fractional bits.
///
/// `shift` is clamped to [0, 31] and `digits` to [0, 9]. The fraction is
/// truncated, never rounded.
#[inline]
pub fn to_frac_digits(v: i32, shift: u8, digits: u8) -> i64 {
    let shift = shift.min(MAX_SHIFT);
    let digits = digits.min(MAX_FRAC_DIGITS);
    let mask = (1i64 << shift) - 1;
    let frac = i64::from(v) & mask;
    (frac * 10i64.pow(u32::from(digits))) >> shift
}

/// Decimal digits of `value`, sign first when negative.
///
/// At least `min_leading_zeros` digits are produced (clamped to 10) and the
/// ones digit is always present, so `render_decimal(0, 0) == "0"`.
pub fn render_decimal(value: i64, min_leading_zeros: u8) -> String {
    let width = usize::from(min_leading_zeros.min(MAX_LEADING_ZEROS)).max(1);
    let magnitude = value.unsigned_abs();
    if value < 0 {
        format!("-{magnitude:0width$}")
    } else {
        format!("{magnitude:0width$}")
    }
}

/// Whole part, then `.` and `digits` fractional digits when `digits > 0`.
pub fn render_fixed(value: i32, shift: u8, digits: u8) -> String {
    let shift = shift.min(MAX_SHIFT);
    let digits = digits.min(MAX_FRAC_DIGITS);
    let whole = render_decimal(i64::from(value >> shift), 0);
    if digits == 0 {
        return whole;
    }
    let frac = render_decimal(to_frac_digits(value, shift, digits), digits);
    format!("{whole}.{frac}")
}

/// Whole millimetres to 24.8, saturating at `i32::MAX`.
#[inline]
pub fn mm_to_fixed(mm: u32) -> i32 {
    i32::try_from(mm)
        .ok()
        .and_then(|m| m.checked_mul(1 << FRAC_BITS))
        .unwrap_or(i32::MAX)
}

/// Height covered by one interior slot, 24.8: `(max_mm * 256) / (n - 1)`.
#[inline]
pub fn sensor_height(max_mm: u32, count: usize) -> i32 {
    let spans = i32::try_from(count.saturating_sub(1).max(1)).unwrap_or(i32::MAX);
    mm_to_fixed(max_mm) / spans
}

/// Apply an 8.8 gain to an integer count: `(count * gain) >> 8`.
///
/// 64-bit intermediate; saturates at `u32::MAX`.
#[inline]
pub fn apply_gain(count: u32, gain: u16) -> u32 {
    let scaled = (u64::from(count) * u64::from(gain)) >> FRAC_BITS;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
