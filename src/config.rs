//! Waveform configuration: memory geometry, timing and DAC encoding.
//!
//! Every value the generator needs is carried by [`WaveformConfig`]. Derived
//! quantities (`num_vals`, `dt`, `tau`, ...) are computed from it on demand,
//! so there is no module-level state.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WaveformError, WaveformResult};

/// Scale factor applied to `fc / fs` in [`FrequencyMode::RatioScaled`].
pub const RATIO_SCALE_HZ: f64 = 2e9;

/// Width of the DAC input register in bits.
pub const REGISTER_BITS: u8 = 16;

/// Largest image `generate` will build: 2^24 words, 32 MiB packed.
pub const MAX_SAMPLES: usize = 1 << 24;

/// Which frequency drives the cosine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FrequencyMode {
    /// `cos(2π · fc · t)`
    #[default]
    Direct,
    /// `cos(2π · (fc / fs · 2e9) · t)`
    RatioScaled,
}

/// How scaled samples become integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Rounding {
    /// Round half away from zero.
    #[default]
    Nearest,
    /// Truncate toward zero, as a plain integer cast does.
    Truncate,
}

/// What to do with a code that does not fit the DAC field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Abort generation with [`WaveformError::Overflow`].
    #[default]
    Fail,
    /// Clamp to the field's range.
    Saturate,
}

/// Named parameter sets for known targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    /// 128-bit BRAM words, 16-bit samples, 14-bit DAC, raw carrier frequency.
    #[default]
    #[value(name = "rfsoc4x2")]
    Rfsoc4x2,
    /// Same geometry and timing, 13-bit DAC, ratio-scaled carrier frequency.
    #[value(name = "ratio-scaled-13bit")]
    RatioScaled13bit,
}

impl Preset {
    pub fn config(self) -> WaveformConfig {
        match self {
            Preset::Rfsoc4x2 => WaveformConfig::rfsoc4x2(),
            Preset::RatioScaled13bit => WaveformConfig::ratio_scaled_13bit(),
        }
    }
}

/// Full parameter set of one waveform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformConfig {
    /// BRAM data width in bits.
    pub block_size: u32,
    /// Bits per DAC sample.
    pub bits_per_val: u32,
    /// Number of BRAM words (2^address_width).
    pub blocks: u32,
    /// Sample rate in Hz.
    pub fs: f64,
    /// Carrier frequency in Hz.
    pub fc: f64,
    /// Active DAC width, 13 or 14.
    pub full_scale_bits: u8,
    /// Left shift into the 16-bit register.
    pub shift_amount: u8,
    pub frequency_mode: FrequencyMode,
    pub rounding: Rounding,
    pub overflow: OverflowPolicy,
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self::rfsoc4x2()
    }
}

impl WaveformConfig {
    /// RFSoC 4x2 target: 128-bit words, 2^13 of them, 14-bit DAC.
    pub fn rfsoc4x2() -> Self {
        Self {
            block_size: 128,
            bits_per_val: 16,
            blocks: 1 << 13,
            fs: 1966.08e6,
            fc: 393.216e6,
            full_scale_bits: 14,
            shift_amount: 2,
            frequency_mode: FrequencyMode::Direct,
            rounding: Rounding::Nearest,
            overflow: OverflowPolicy::Fail,
        }
    }

    pub fn ratio_scaled_13bit() -> Self {
        Self {
            full_scale_bits: 13,
            frequency_mode: FrequencyMode::RatioScaled,
            ..Self::rfsoc4x2()
        }
    }

    /// Reads a JSON config. Fields not present keep their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> WaveformResult<Self> {
        Self::default().overlay_json_file(path)
    }

    /// Replaces the fields present in a JSON object file, keeping the rest of `self`.
    pub fn overlay_json_file<P: AsRef<Path>>(&self, path: P) -> WaveformResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let overlay: Value = serde_json::from_reader(reader)?;
        self.overlay_json(overlay)
    }

    fn overlay_json(&self, overlay: Value) -> WaveformResult<Self> {
        let Value::Object(fields) = overlay else {
            return Err(WaveformError::config("config", "expected a JSON object"));
        };
        let mut merged = serde_json::to_value(self)?;
        if let Value::Object(base) = &mut merged {
            base.extend(fields);
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// `floor(block_size / bits_per_val * blocks)`
    pub fn num_vals(&self) -> usize {
        if self.bits_per_val == 0 {
            return 0;
        }
        (self.block_size as f64 / self.bits_per_val as f64 * self.blocks as f64).floor() as usize
    }

    pub fn dt(&self) -> f64 {
        1.0 / self.fs
    }

    pub fn tau(&self) -> f64 {
        self.dt() * self.num_vals() as f64
    }

    pub fn effective_fc(&self) -> f64 {
        match self.frequency_mode {
            FrequencyMode::Direct => self.fc,
            FrequencyMode::RatioScaled => self.fc / self.fs * RATIO_SCALE_HZ,
        }
    }

    /// Full-scale code, `2^full_scale_bits - 1`.
    pub fn max_val(&self) -> u16 {
        ((1u32 << self.full_scale_bits) - 1) as u16
    }

    /// Largest code that survives the shift without losing high bits.
    pub fn field_max(&self) -> u16 {
        u16::MAX >> self.shift_amount
    }

    /// Checks everything [`generate`](crate::generate_waveform::generate) relies on.
    pub fn validate(&self) -> WaveformResult<()> {
        if self.bits_per_val == 0 {
            return Err(WaveformError::config("bits_per_val", "must be nonzero"));
        }
        if self.num_vals() == 0 {
            return Err(WaveformError::config(
                "blocks",
                format!(
                    "geometry {} / {} * {} yields no samples",
                    self.block_size, self.bits_per_val, self.blocks
                ),
            ));
        }
        if self.fs == 0.0 || !self.fs.is_finite() {
            return Err(WaveformError::config(
                "fs",
                format!("sample rate must be finite and nonzero, got {}", self.fs),
            ));
        }
        if !self.fc.is_finite() {
            return Err(WaveformError::config(
                "fc",
                format!("carrier frequency must be finite, got {}", self.fc),
            ));
        }
        if self.num_vals() > MAX_SAMPLES {
            return Err(WaveformError::config(
                "blocks",
                format!(
                    "geometry yields {} samples, more than the {} supported",
                    self.num_vals(),
                    MAX_SAMPLES
                ),
            ));
        }
        if !self.dt().is_finite() {
            return Err(WaveformError::config(
                "fs",
                format!("sample period 1 / {} is not finite", self.fs),
            ));
        }
        let freq = self.effective_fc();
        if !freq.is_finite() {
            return Err(WaveformError::config(
                "fc",
                format!("effective carrier frequency {} is not finite", freq),
            ));
        }
        // Largest phase the cosine sees.
        let phase_span = 2.0 * std::f64::consts::PI * freq * self.tau();
        if !phase_span.is_finite() {
            return Err(WaveformError::config(
                "fc",
                format!("phase 2π · {} · {} s overflows", freq, self.tau()),
            ));
        }
        if !matches!(self.full_scale_bits, 13 | 14) {
            return Err(WaveformError::config(
                "full_scale_bits",
                format!("expected 13 or 14, got {}", self.full_scale_bits),
            ));
        }
        if self.shift_amount >= REGISTER_BITS {
            return Err(WaveformError::config(
                "shift_amount",
                format!(
                    "must be below the {}-bit register width, got {}",
                    REGISTER_BITS, self.shift_amount
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let config = WaveformConfig::default();
        assert_eq!(config.num_vals(), 65536);
        assert_eq!(config.max_val(), 16383);
        assert_eq!(config.field_max(), 16383);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timing() {
        let config = WaveformConfig::rfsoc4x2();
        assert!((config.dt() - 1.0 / 1966.08e6).abs() < 1e-24);
        assert!((config.tau() - 65536.0 / 1966.08e6).abs() < 1e-15);
    }

    #[test]
    fn test_fractional_geometry_floors() {
        let config = WaveformConfig {
            block_size: 100,
            bits_per_val: 16,
            blocks: 3,
            ..WaveformConfig::default()
        };
        // 100 / 16 * 3 = 18.75
        assert_eq!(config.num_vals(), 18);
    }

    #[test]
    fn test_effective_fc() {
        let direct = WaveformConfig::rfsoc4x2();
        assert_eq!(direct.effective_fc(), 393.216e6);

        let scaled = WaveformConfig::ratio_scaled_13bit();
        assert!((scaled.effective_fc() - 0.2 * 2e9).abs() < 1e-3);
        assert_eq!(scaled.max_val(), 8191);
    }

    #[test]
    fn test_zero_fs_rejected() {
        let config = WaveformConfig {
            fs: 0.0,
            ..WaveformConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, WaveformError::Configuration { field: "fs", .. }));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        for config in [
            WaveformConfig {
                blocks: 0,
                ..WaveformConfig::default()
            },
            WaveformConfig {
                block_size: 8,
                bits_per_val: 16,
                blocks: 1,
                ..WaveformConfig::default()
            },
            WaveformConfig {
                bits_per_val: 0,
                ..WaveformConfig::default()
            },
        ] {
            assert!(config.validate().unwrap_err().is_configuration());
        }
    }

    #[test]
    fn test_oversized_geometry_rejected() {
        let config = WaveformConfig {
            block_size: u32::MAX,
            bits_per_val: 1,
            blocks: u32::MAX,
            ..WaveformConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WaveformError::Configuration { field: "blocks", .. })
        ));

        let at_limit = WaveformConfig {
            block_size: 16,
            bits_per_val: 16,
            blocks: MAX_SAMPLES as u32,
            ..WaveformConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_huge_carrier_rejected() {
        // 2π · 1e308 overflows to infinity.
        let config = WaveformConfig {
            blocks: 1,
            fc: 1e308,
            ..WaveformConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WaveformError::Configuration { field: "fc", .. })
        ));
    }

    #[test]
    fn test_subnormal_fs_rejected() {
        let config = WaveformConfig {
            blocks: 1,
            fs: 1e-320,
            frequency_mode: FrequencyMode::RatioScaled,
            ..WaveformConfig::default()
        };
        assert!(config.dt().is_infinite());
        assert!(matches!(
            config.validate(),
            Err(WaveformError::Configuration { field: "fs", .. })
        ));
    }

    #[test]
    fn test_ratio_overflow_rejected() {
        // fc / fs is finite but the 2e9 scale pushes it to infinity.
        let config = WaveformConfig {
            blocks: 1,
            fs: 1.0,
            fc: 1e300,
            frequency_mode: FrequencyMode::RatioScaled,
            ..WaveformConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(WaveformError::Configuration { field: "fc", .. })
        ));
    }

    #[test]
    fn test_bad_widths_rejected() {
        let config = WaveformConfig {
            full_scale_bits: 12,
            ..WaveformConfig::default()
        };
        assert!(config.validate().is_err());

        let config = WaveformConfig {
            shift_amount: 16,
            ..WaveformConfig::default()
        };
        assert!(config.validate().is_err());

        // Narrow field is legal; the overflow policy deals with it.
        let config = WaveformConfig {
            shift_amount: 3,
            ..WaveformConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.field_max(), 8191);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WaveformConfig =
            serde_json::from_str(r#"{ "fc": 100e6, "frequency_mode": "ratio-scaled" }"#).unwrap();
        assert_eq!(config.fc, 100e6);
        assert_eq!(config.frequency_mode, FrequencyMode::RatioScaled);
        assert_eq!(config.blocks, 8192);
        assert_eq!(config.overflow, OverflowPolicy::Fail);
    }

    #[test]
    fn test_overlay_keeps_base() {
        let base = WaveformConfig::ratio_scaled_13bit();
        let merged = base
            .overlay_json(serde_json::json!({ "shift_amount": 1, "rounding": "truncate" }))
            .unwrap();
        assert_eq!(merged.full_scale_bits, 13);
        assert_eq!(merged.frequency_mode, FrequencyMode::RatioScaled);
        assert_eq!(merged.shift_amount, 1);
        assert_eq!(merged.rounding, Rounding::Truncate);
    }

    #[test]
    fn test_overlay_rejects_non_object() {
        let err = WaveformConfig::default()
            .overlay_json(serde_json::json!([1, 2]))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bram.json");
        std::fs::write(&path, r#"{ "blocks": 1024, "fs": 1e9 }"#).unwrap();
        let config = WaveformConfig::from_json_file(&path).unwrap();
        assert_eq!(config.num_vals(), 8192);
        assert_eq!(config.fs, 1e9);
        assert_eq!(config.fc, 393.216e6);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            WaveformConfig::from_json_file(&path),
            Err(WaveformError::Json(_))
        ));
    }

    #[test]
    fn test_presets() {
        assert_eq!(Preset::Rfsoc4x2.config(), WaveformConfig::rfsoc4x2());
        assert_eq!(
            Preset::RatioScaled13bit.config(),
            WaveformConfig::ratio_scaled_13bit()
        );
    }
}
