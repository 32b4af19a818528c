//! Numeric helpers shared by the visibility and control functions

/// Map scale denominators of the standard Web Mercator zoom levels 0..=18
pub const WEB_MERCATOR_SCALES: [f64; 19] = [
    554_678_932.0,
    277_339_466.0,
    138_669_733.0,
    69_334_866.0,
    34_667_433.0,
    17_333_716.0,
    8_666_858.0,
    4_333_429.0,
    2_166_714.0,
    1_083_357.0,
    541_678.0,
    270_839.0,
    135_419.0,
    67_709.0,
    33_854.0,
    16_927.0,
    8_463.0,
    4_231.0,
    2_115.0,
];

/// Clamp `value` into `[min, max]`.
///
/// Unlike [`f64::clamp`] this never panics: if `min > max` the result is `min`.
#[inline]
pub fn bound_value(value: f64, min: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

/// Map `value` linearly from `[min_source, max_source]` onto `[min_target, max_target]`.
///
/// A degenerate source range maps everything to `min_target`.
#[inline]
pub fn normalize_min_max(value: f64, min_source: f64, max_source: f64, min_target: f64, max_target: f64) -> f64 {
    let span = max_source - min_source;
    if span == 0.0 || !span.is_finite() {
        return min_target;
    }
    min_target + (value - min_source) / span * (max_target - min_target)
}

/// `q`-th percentile (0..=100) of ascending `sorted` values with linear interpolation
/// between closest ranks. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = bound_value(q, 0.0, 100.0) / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Index of the scale in `scales` closest to `scale` (first one on ties)
pub fn scale_to_zoom_level(scales: &[f64], scale: f64) -> Option<usize> {
    scales
        .iter()
        .enumerate()
        .min_by(|(ia, a), (ib, b)| {
            (*a - scale)
                .abs()
                .total_cmp(&(*b - scale).abs())
                .then(ia.cmp(ib))
        })
        .map(|(index, _)| index)
}
