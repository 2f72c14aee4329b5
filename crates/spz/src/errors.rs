// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;

/// Errors produced by the SPZ/PLY codec.
///
/// Every stage of the codec checks its own preconditions and fails fast with
/// one of these kinds; there is no retry or partial-result recovery.
#[derive(Error, Debug)]
pub enum SpzError {
	#[error("invalid header: {0}")]
	InvalidHeader(String),

	#[error("unsupported version: {0}")]
	UnsupportedVersion(u32),

	#[error("too many points: {0} (max {1})")]
	TooManyPoints(u32, u32),

	#[error("unsupported spherical harmonics degree: {0}")]
	UnsupportedShDegree(u8),

	#[error("invalid data: {0}")]
	InvalidData(String),

	#[error("decompression error: {0}")]
	DecompressionError(String),

	#[error("compression error: {0}")]
	CompressionError(String),

	#[error("invalid PLY format: {0}")]
	InvalidFormat(String),

	#[error("read error: {0}")]
	ReadError(#[from] std::io::Error),

	#[error("write error: {0}")]
	WriteError(String),
}
