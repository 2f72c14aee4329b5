// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gzip framing around serialized [`crate::packed::Packed`] bytes.
//!
//! Encoding is pinned to produce the exact 10-byte gzip header the reference
//! codec emits (no FNAME/FEXTRA, MTIME=0, OS=0); decoding tolerates any
//! gzip-conformant stream, including ones with those extras set.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::errors::SpzError;

/// A fresh inflate buffer starts at this size and grows as needed.
const INITIAL_DECOMPRESS_CAPACITY: usize = 16 * 1024 * 1024;

pub fn compress(data: &[u8]) -> Result<Vec<u8>, SpzError> {
	let mut builder = flate2::GzBuilder::new();

	builder = builder.mtime(0);
	builder = builder.operating_system(0);

	let mut encoder = builder.write(Vec::new(), Compression::default());

	encoder
		.write_all(data)
		.map_err(|e| SpzError::CompressionError(e.to_string()))?;

	encoder.finish().map_err(|e| SpzError::CompressionError(e.to_string()))
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, SpzError> {
	let mut decoder = GzDecoder::new(data);
	let mut out = Vec::with_capacity(INITIAL_DECOMPRESS_CAPACITY.min(data.len().saturating_mul(8).max(1024)));

	decoder
		.read_to_end(&mut out)
		.map_err(|e| SpzError::DecompressionError(e.to_string()))?;

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_roundtrip() {
		let data = b"the quick brown fox jumps over the lazy dog".repeat(10);
		let compressed = compress(&data).unwrap();
		let decompressed = decompress(&compressed).unwrap();

		assert_eq!(decompressed, data);
	}

	#[test]
	fn test_header_bytes_are_exact() {
		let compressed = compress(b"hello").unwrap();

		assert_eq!(&compressed[0..4], &[0x1f, 0x8b, 0x08, 0x00]);
		assert_eq!(&compressed[4..8], &[0x00, 0x00, 0x00, 0x00], "mtime must be zero");
		assert_eq!(compressed[9], 0x00, "OS byte must be zero");
	}

	#[test]
	fn test_empty_input_roundtrip() {
		let compressed = compress(&[]).unwrap();
		let decompressed = decompress(&compressed).unwrap();

		assert!(decompressed.is_empty());
	}

	#[test]
	fn test_decompress_rejects_garbage() {
		assert!(decompress(&[0, 1, 2, 3]).is_err());
	}
}
