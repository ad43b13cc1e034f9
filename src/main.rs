use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::{Itertools, MinMaxResult};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bram_waveform::pack::hex_prefix;
use bram_waveform::{
    dominant_frequency, generate, suggest_aligned_length, write_raw, write_wav_preview,
    FrequencyMode, OverflowPolicy, Preset, Rounding, Waveform, WaveformConfig,
    DEFAULT_OUTPUT_FILE,
};

/// Generate a quantized cosine BRAM image for a DAC
#[derive(Parser, Debug)]
#[command(name = "bram-waveform")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Starting parameter set
    #[arg(long, value_enum, default_value_t = Preset::Rfsoc4x2)]
    preset: Preset,

    /// JSON file overriding preset fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Raw big-endian output file
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Sample rate in Hz
    #[arg(long)]
    fs: Option<f64>,

    /// Carrier frequency in Hz
    #[arg(long)]
    fc: Option<f64>,

    /// BRAM data width in bits
    #[arg(long)]
    block_size: Option<u32>,

    /// Bits per DAC sample
    #[arg(long)]
    bits_per_val: Option<u32>,

    /// Number of BRAM words
    #[arg(long)]
    blocks: Option<u32>,

    /// Active DAC width (13 or 14)
    #[arg(long)]
    full_scale_bits: Option<u8>,

    /// Left shift into the 16-bit register
    #[arg(long = "shift")]
    shift_amount: Option<u8>,

    #[arg(long, value_enum)]
    frequency_mode: Option<FrequencyMode>,

    #[arg(long, value_enum)]
    rounding: Option<Rounding>,

    /// What to do with codes that do not fit the register field
    #[arg(long, value_enum)]
    overflow: Option<OverflowPolicy>,

    /// Also write a mono 16-bit WAV preview
    #[arg(long)]
    wav: Option<PathBuf>,

    /// Report the longest buffer holding a whole number of carrier cycles
    #[arg(long)]
    suggest_aligned_length: bool,

    /// Report the dominant frequency of the generated codes
    #[arg(long)]
    check_spectrum: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<WaveformConfig> {
        let mut config = self.preset.config();
        if let Some(path) = &self.config {
            config = config
                .overlay_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
        }
        set(&mut config.fs, self.fs);
        set(&mut config.fc, self.fc);
        set(&mut config.block_size, self.block_size);
        set(&mut config.bits_per_val, self.bits_per_val);
        set(&mut config.blocks, self.blocks);
        set(&mut config.full_scale_bits, self.full_scale_bits);
        set(&mut config.shift_amount, self.shift_amount);
        set(&mut config.frequency_mode, self.frequency_mode);
        set(&mut config.rounding, self.rounding);
        set(&mut config.overflow, self.overflow);
        Ok(config)
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn log_diagnostics(waveform: &Waveform) {
    info!(fs = waveform.fs(), fc = waveform.config.fc, "timing");
    info!(dt = waveform.dt, tau = waveform.tau, "buffer duration");
    info!(
        expected = waveform.config.num_vals(),
        actual = waveform.codes.len(),
        "sample count"
    );
    info!(
        len = waveform.bytes.len(),
        head = %hex_prefix(&waveform.bytes, 8),
        "packed buffer"
    );
    let (min, max) = match waveform.codes.iter().minmax() {
        MinMaxResult::MinMax(min, max) => (*min, *max),
        MinMaxResult::OneElement(code) => (*code, *code),
        MinMaxResult::NoElements => return,
    };
    info!(min, max, full_scale = waveform.max_val, "code range");
}

fn main() -> Result<()> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    info!("generating waveform");
    let waveform = generate(&config).context("generating waveform")?;
    log_diagnostics(&waveform);

    write_raw(&cli.output, &waveform.bytes)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    if let Some(path) = &cli.wav {
        write_wav_preview(path, &waveform)
            .with_context(|| format!("writing WAV preview {}", path.display()))?;
    }

    if cli.suggest_aligned_length {
        match suggest_aligned_length(config.fs, waveform.effective_fc, waveform.num_vals) {
            Some(n) if n == waveform.num_vals => info!(n, "buffer already cycle-aligned"),
            Some(n) => info!(n, current = waveform.num_vals, "cycle-aligned length"),
            None => warn!("no cycle-aligned length fits the buffer"),
        }
    }

    if cli.check_spectrum {
        match dominant_frequency(&waveform) {
            Some(peak) => info!(
                peak,
                expected = waveform.effective_fc,
                resolution = config.fs / waveform.num_vals as f64,
                "dominant frequency"
            ),
            None => warn!("buffer too short for a spectrum"),
        }
    }

    Ok(())
}
