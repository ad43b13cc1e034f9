//! Spectral sanity check of a generated image.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::generate_waveform::Waveform;

pub fn fft_of(buffer: &[f64]) -> Vec<Complex<f64>> {
    let mut spectrum = buffer
        .iter()
        .map(|&v| Complex { re: v, im: 0.0 })
        .collect::<Vec<_>>();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(spectrum.len());
    fft.process(&mut spectrum);
    spectrum
}

/// Index of the strongest bin in `0..=len/2`, ignoring DC.
fn peak_bin(spectrum: &[Complex<f64>]) -> Option<usize> {
    spectrum[..=spectrum.len() / 2]
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
        .map(|(bin, _)| bin)
}

/// Frequency in Hz of the strongest non-DC component of the DAC codes.
///
/// Resolution is one bin, `fs / num_vals`. Returns `None` for buffers too
/// short to carry a non-DC bin.
pub fn dominant_frequency(waveform: &Waveform) -> Option<f64> {
    let n = waveform.codes.len();
    if n < 2 {
        return None;
    }
    let mean = waveform.codes.iter().map(|&c| c as f64).sum::<f64>() / n as f64;
    let centered: Vec<f64> = waveform.codes.iter().map(|&c| c as f64 - mean).collect();
    let bin = peak_bin(&fft_of(&centered))?;
    Some(bin as f64 * waveform.fs() / n as f64)
}
