//! Median and quantile computation for timing samples.
//!
//! The median is the attack's only aggregate: it ignores the occasional
//! scheduler hiccup that would drag a mean upwards.

/// Compute a single quantile from a mutable slice.
///
/// Uses `select_nth_unstable()` for O(n) expected time and the "R-7"
/// definition (linear interpolation between closest ranks). The slice is
/// partially reordered as a side effect.
///
/// Returns 0.0 for an empty slice.
///
/// # Panics
///
/// Panics if `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );

    let n = data.len();
    match n {
        0 => return 0.0,
        1 => return data[0],
        _ => {}
    }

    let h = (n - 1) as f64 * p;
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return max;
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));

    if h_frac == 0.0 {
        return lower;
    }

    // Next order statistic is the minimum of the upper partition
    let upper_min = upper
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(lower);

    lower + h_frac * (upper_min - lower)
}

/// Median of `data`, reordering it in place.
///
/// Odd length gives the middle element, even length the mean of the two
/// middle elements, empty gives 0.0.
pub fn median_in_place(data: &mut [f64]) -> f64 {
    compute_quantile(data, 0.5)
}

/// Median of `data` without modifying it.
pub fn median(data: &[f64]) -> f64 {
    let mut working = data.to_vec();
    median_in_place(&mut working)
}
