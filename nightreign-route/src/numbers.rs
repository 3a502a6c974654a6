//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Widen a signed count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Ratio of `part` over `whole` as f64.
///
/// Mirrors IEEE division: a zero `whole` yields infinity for a positive
/// `part` and NaN when both are zero. Callers decide how to treat those.
#[must_use]
pub fn ratio(part: i64, whole: u32) -> f64 {
    i64_to_f64(part) / f64::from(whole)
}

/// Clamp a signed value into the u32 range, returning 0 for negatives.
#[must_use]
pub fn clamp_i64_to_u32(value: i64) -> u32 {
    cast::<i64, u32>(value.clamp(0, i64::from(u32::MAX))).unwrap_or(0)
}

/// Clamp a signed value into the u64 range, returning 0 for negatives.
#[must_use]
pub fn clamp_i64_to_u64(value: i64) -> u64 {
    cast::<i64, u64>(value.max(0)).unwrap_or(0)
}

/// Straight-line distance between two map points, 0.0 when either is non-finite.
#[must_use]
pub fn euclidean(from: (f64, f64), to: (f64, f64)) -> f64 {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let distance = dx.hypot(dy);
    if distance.is_finite() { distance } else { 0.0 }
}
