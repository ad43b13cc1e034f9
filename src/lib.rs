//! Quantized cosine images for BRAM-fed DACs.
//!
//! A cosine at the carrier frequency is sampled over the whole BRAM, scaled
//! to the DAC's full-scale code, shifted into the 16-bit register field and
//! packed big-endian.
//!
//! ```no_run
//! use bram_waveform::{generate, write_raw, WaveformConfig};
//!
//! let waveform = generate(&WaveformConfig::rfsoc4x2())?;
//! assert_eq!(&waveform.bytes[..2], &[0xFF, 0xFC]);
//! write_raw("sine.txt", &waveform.bytes)?;
//! # Ok::<(), bram_waveform::WaveformError>(())
//! ```

pub mod alignment;
pub mod config;
pub mod error;
pub mod generate_waveform;
pub mod output;
pub mod pack;
pub mod spectrum;

pub use alignment::suggest_aligned_length;
pub use config::{FrequencyMode, OverflowPolicy, Preset, Rounding, WaveformConfig};
pub use error::{WaveformError, WaveformResult};
pub use generate_waveform::{generate, Waveform};
pub use output::{write_raw, write_wav_preview, DEFAULT_OUTPUT_FILE};
pub use pack::unpack;
pub use spectrum::dominant_frequency;
