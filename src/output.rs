//! Writing BRAM images to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::info;

use crate::error::{WaveformError, WaveformResult};
use crate::generate_waveform::Waveform;

pub const DEFAULT_OUTPUT_FILE: &str = "sine.txt";

/// Writes `bytes` verbatim to `path`, replacing any existing file.
///
/// The data goes to a temporary file next to `path` first and is renamed
/// over it only once fully written, so a failed write never leaves a
/// truncated image behind. The result keeps the mode a plain truncating
/// `File::create` would give it: an existing file's permissions, otherwise
/// `0o666` less the umask. A symlinked `path` is written through to its
/// target.
pub fn write_raw<P: AsRef<Path>>(path: P, bytes: &[u8]) -> WaveformResult<()> {
    let path = resolve_symlink(path.as_ref());
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = temp_builder().tempfile_in(dir)?;
    if let Ok(existing) = fs::metadata(&path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote raw image");
    Ok(())
}

fn resolve_symlink(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    // tempfile masks this with the process umask.
    builder.permissions(fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    Builder::new()
}

/// Writes the register words as a mono 16-bit WAV for inspection in audio tools.
pub fn write_wav_preview<P: AsRef<Path>>(path: P, waveform: &Waveform) -> WaveformResult<()> {
    let rate = waveform.fs().round();
    if !(1.0..=u32::MAX as f64).contains(&rate) {
        return Err(WaveformError::config(
            "fs",
            format!("{} Hz cannot be stored as a WAV sample rate", waveform.fs()),
        ));
    }
    let spec = hound::WavSpec {
        channels: 1, // mono
        sample_rate: rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &word in &waveform.words {
        writer.write_sample(word)?;
    }
    writer.finalize()?;
    info!(path = %path.as_ref().display(), "wrote WAV preview");
    Ok(())
}
