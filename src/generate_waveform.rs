//! Cosine synthesis, quantization and register alignment.
//!
//! One BRAM image is computed in a single pass:
//!
//! ```text
//! t_i    = i * dt                                  i in 0..num_vals
//! x_i    = 0.5 * (1 + cos(2π * effective_fc * t_i)) * max_val
//! code_i = round(x_i)           (or trunc, see Rounding)
//! word_i = (code_i << shift_amount) as i16
//! ```
//!
//! and the words are packed big-endian by [`crate::pack`].

use std::f64::consts::PI;

use rayon::prelude::*;
use tracing::debug;

use crate::config::{OverflowPolicy, Rounding, WaveformConfig};
use crate::error::{WaveformError, WaveformResult};
use crate::pack::pack_words;

/// A generated BRAM image together with the parameters it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub config: WaveformConfig,
    pub num_vals: usize,
    pub dt: f64,
    pub tau: f64,
    pub effective_fc: f64,
    pub max_val: u16,
    /// Quantized DAC codes before the shift.
    pub codes: Vec<u16>,
    /// Codes aligned into the 16-bit register, as written to BRAM.
    pub words: Vec<i16>,
    /// Big-endian packing of `words`.
    pub bytes: Vec<u8>,
}

impl Waveform {
    pub fn fs(&self) -> f64 {
        self.config.fs
    }
}

/// Exactly `num_vals` points spaced by `dt`, starting at zero.
///
/// Each point is `i * dt` rather than a running sum, so the length never
/// depends on floating-point step accumulation.
pub fn time_axis(num_vals: usize, dt: f64) -> Vec<f64> {
    (0..num_vals).map(|i| i as f64 * dt).collect()
}

#[inline]
pub fn normalized_cosine(freq: f64, t: f64) -> f64 {
    0.5 * (1.0 + (2.0 * PI * freq * t).cos())
}

/// Unquantized samples scaled to `0..=max_val`.
pub fn scaled_samples(config: &WaveformConfig) -> Vec<f64> {
    let dt = config.dt();
    let freq = config.effective_fc();
    let max_val = config.max_val() as f64;
    time_axis(config.num_vals(), dt)
        .into_par_iter()
        .map(|t| normalized_cosine(freq, t) * max_val)
        .collect()
}

fn quantize(index: usize, value: f64, rounding: Rounding) -> WaveformResult<i64> {
    if !value.is_finite() {
        return Err(WaveformError::NonFiniteSample { index });
    }
    Ok(match rounding {
        Rounding::Nearest => value.round() as i64,
        Rounding::Truncate => value.trunc() as i64,
    })
}

/// Applies the overflow policy to one quantized code.
fn fit_field(index: usize, code: i64, config: &WaveformConfig) -> WaveformResult<u16> {
    let max = config.field_max();
    if (0..=max as i64).contains(&code) {
        return Ok(code as u16);
    }
    match config.overflow {
        OverflowPolicy::Fail => Err(WaveformError::Overflow {
            index,
            value: code,
            max,
        }),
        OverflowPolicy::Saturate => Ok(code.clamp(0, max as i64) as u16),
    }
}

/// Shifts a code into the register and reinterprets the bit pattern as `i16`.
///
/// `code` must already fit `field_max`, so no high bits are lost.
#[inline]
pub fn register_word(code: u16, shift_amount: u8) -> i16 {
    (code << shift_amount) as i16
}

/// Computes the full BRAM image for `config`.
///
/// Fails before any computation if the configuration is invalid, and on the
/// first sample that does not fit the DAC field under
/// [`OverflowPolicy::Fail`].
pub fn generate(config: &WaveformConfig) -> WaveformResult<Waveform> {
    config.validate()?;

    let num_vals = config.num_vals();
    let scaled = scaled_samples(config);
    debug_assert_eq!(scaled.len(), num_vals);

    let codes = scaled
        .iter()
        .enumerate()
        .map(|(index, &x)| fit_field(index, quantize(index, x, config.rounding)?, config))
        .collect::<WaveformResult<Vec<u16>>>()?;
    let words: Vec<i16> = codes
        .iter()
        .map(|&code| register_word(code, config.shift_amount))
        .collect();
    let bytes = pack_words(&words);
    debug!(num_vals, bytes = bytes.len(), "waveform packed");

    Ok(Waveform {
        config: *config,
        num_vals,
        dt: config.dt(),
        tau: config.tau(),
        effective_fc: config.effective_fc(),
        max_val: config.max_val(),
        codes,
        words,
        bytes,
    })
}
