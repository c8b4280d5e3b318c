use crate::Float;

/// Computes the `q`-th **percentile** of `values` with linear interpolation.
///
/// The values are sorted and the percentile is read at fractional position
/// `q / 100 · (n − 1)`, interpolating between the two closest ranks. For
/// `q = 50` this is the usual median: the middle value for odd `n`, the mean
/// of the two middle values for even `n`.
///
/// # Parameters
///
/// - `values`: Sample values, in any order.
/// - `q`: Percentile in `[0, 100]`. Values outside the range are clamped.
///
/// # Returns
///
/// - The interpolated percentile.
/// - `None` if `values` is empty.
///
/// # Examples
///
/// ```rust
/// use spendcat_core::stats::percentile;
///
/// assert_eq!(percentile(&[3.0, 1.0, 2.0], 50.0), Some(2.0));
/// assert_eq!(percentile(&[0.0, 1.0], 50.0), Some(0.5));
/// ```
pub fn percentile(values: &[Float], q: Float) -> Option<Float> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(Float::total_cmp);

    let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as Float;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as Float;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Computes the **weighted mean** `Σ vᵢ wᵢ / Σ wᵢ`.
///
/// # Returns
///
/// - `None` if the slices differ in length or the weights sum to zero.
///
/// # Examples
///
/// ```rust
/// use spendcat_core::stats::weighted_mean;
///
/// let mean = weighted_mean(&[1.0, 0.0], &[3.0, 1.0]).unwrap();
/// assert!((mean - 0.75).abs() < 1e-12);
/// ```
pub fn weighted_mean(values: &[Float], weights: &[Float]) -> Option<Float> {
    if values.len() != weights.len() {
        return None;
    }

    let total: Float = weights.iter().sum();
    if total == 0.0 {
        return None;
    }

    let sum: Float = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(sum / total)
}
