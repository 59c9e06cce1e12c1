//! Game-image identity hashing.
//!
//! A 32-bit FNV-1a hash streamed over the whole image file, then mixed
//! with the byte length so two images with identical leading content
//! but different sizes still hash differently. Both peers must produce
//! the same value for the handshake to succeed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Hash an in-memory game image.
pub fn hash_bytes(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    mix_length(hash, data.len() as u64)
}

/// Hash a game image from any reader without loading it whole.
pub fn hash_reader<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut hash = FNV_OFFSET_BASIS;
    let mut len: u64 = 0;
    let mut chunk = [0u8; 8 * 1024];

    loop {
        let read = reader.read(&mut chunk)?;
        if read == 0 {
            break;
        }
        for &byte in &chunk[..read] {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        len += read as u64;
    }

    Ok(mix_length(hash, len))
}

/// Hash a game image file on disk.
pub fn hash_file(path: impl AsRef<Path>) -> std::io::Result<u32> {
    let mut reader = BufReader::new(File::open(path)?);
    hash_reader(&mut reader)
}

fn mix_length(hash: u32, len: u64) -> u32 {
    let mut hash = hash ^ (len as u32);
    hash = hash.wrapping_mul(FNV_PRIME);
    hash
}
