//! Big-endian 16-bit word packing.
//!
//! The buffer has no header: `n` register words become `2 * n` bytes, most
//! significant byte first, in time order.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use itertools::Itertools;

use crate::error::{WaveformError, WaveformResult};

pub fn pack_words(words: &[i16]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(words.len() * 2);
    for &word in words {
        buf.write_i16::<BigEndian>(word)
            .expect("writing to Vec should not fail");
    }
    buf
}

pub fn unpack_words(bytes: &[u8]) -> WaveformResult<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(WaveformError::OddLength { len: bytes.len() });
    }
    let mut words = vec![0i16; bytes.len() / 2];
    BigEndian::read_i16_into(bytes, &mut words);
    Ok(words)
}

/// Recovers the pre-shift DAC codes from a packed buffer.
///
/// The shift is undone on the unsigned bit pattern, so a word such as
/// `0xFFFC` (`-4` as `i16`) yields `16383` for a shift of 2.
pub fn unpack(bytes: &[u8], shift_amount: u8) -> WaveformResult<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(WaveformError::OddLength { len: bytes.len() });
    }
    let mut reader = bytes;
    let mut codes = Vec::with_capacity(bytes.len() / 2);
    while !reader.is_empty() {
        codes.push(reader.read_u16::<BigEndian>()? >> shift_amount);
    }
    Ok(codes)
}

/// Hex dump of the first `n` bytes, for diagnostics.
pub fn hex_prefix(bytes: &[u8], n: usize) -> String {
    bytes
        .iter()
        .take(n)
        .map(|b| format!("{:02X}", b))
        .join(" ")
}
