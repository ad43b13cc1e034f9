//! Buffer lengths that hold a whole number of carrier cycles.
//!
//! A BRAM image played back in a loop is seamless only if it ends exactly
//! where a carrier cycle ends. Nothing here is applied automatically.

const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Largest `n <= num_vals` such that `n * fc / fs` is a whole, nonzero
/// number of carrier cycles.
///
/// Returns `None` for degenerate inputs or when no such `n` exists.
pub fn suggest_aligned_length(fs: f64, fc: f64, num_vals: usize) -> Option<usize> {
    if fs == 0.0 || !fs.is_finite() || !fc.is_finite() || fc == 0.0 {
        return None;
    }
    let cycles_per_sample = (fc / fs).abs();
    (1..=num_vals).rev().find(|&n| {
        let cycles = n as f64 * cycles_per_sample;
        let whole = cycles.round();
        whole >= 1.0 && (cycles - whole).abs() <= RELATIVE_TOLERANCE * cycles
    })
}
