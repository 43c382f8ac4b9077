//! Numeric coercion helpers
//!
//! Stage indices, counts and thresholds arrive as untyped JSON numbers.
//! Every helper here degrades to a safe value instead of failing.

/// Floor a finite value into `u32`, saturating at both ends.
fn floor_u32(value: f64) -> u32 {
    // `as` saturates for out-of-range floats
    value.floor() as u32
}

/// Normalize a stage index: non-finite → `fallback`, otherwise floor and clamp to ≥ 1.
pub fn stage_index(value: f64, fallback: u32) -> u32 {
    if !value.is_finite() {
        return fallback.max(1);
    }
    floor_u32(value).max(1)
}

/// Like [`stage_index`], but non-positive values also take the fallback.
pub fn positive_stage_index(value: f64, fallback: u32) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return fallback.max(1);
    }
    floor_u32(value).max(1)
}

/// Floored non-negative integer, or `None` if non-finite or negative.
pub fn non_negative(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let floored = value.floor();
    if floored < 0.0 {
        None
    } else {
        Some(floor_u32(floored))
    }
}

/// Floored action count, or `None` if it would be below 1.
pub fn count(value: f64) -> Option<u32> {
    non_negative(value).filter(|c| *c >= 1)
}

/// Parse a stage key such as `"3"` or `" 2.0 "` into a stage index ≥ 1.
pub fn stage_key(key: &str) -> Option<u32> {
    let parsed: f64 = key.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    count(parsed)
}
