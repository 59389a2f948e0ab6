//! Test payloads

#![allow(dead_code)]

use super::constants::FAKE_MP3_SIZE_BYTES;

/// Deterministic bytes that no tag reader understands.
pub fn fake_mp3_bytes() -> Vec<u8> {
    (0..FAKE_MP3_SIZE_BYTES).map(|i| (i % 251) as u8).collect()
}

/// A valid 16-bit mono PCM WAV of `millis` milliseconds at 8 kHz.
pub fn wav_bytes(millis: u32) -> Vec<u8> {
    let sample_rate: u32 = 8000;
    let data_len = sample_rate * 2 * millis / 1000;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(bytes.len() + data_len as usize, 0);
    bytes
}
