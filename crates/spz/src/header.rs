// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed 16-byte header that prefixes every SPZ container.
//!
//! Bytes are parsed explicitly with `from_le_bytes` rather than reinterpreted
//! in place; the header is small enough that this costs nothing and it avoids
//! depending on the host's struct layout matching the wire format.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[cfg(feature = "fuzzing")]
use arbitrary::Arbitrary;

use crate::consts::HEADER_MAGIC;
use crate::errors::SpzError;

pub const HEADER_SIZE: usize = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub struct Flags(pub u8);

bitflags! {
	impl Flags: u8 {
		/// Set iff the splat was trained with antialiasing.
		const ANTIALIASED = 0x1;
	}
}

impl Flags {
	#[inline]
	pub fn none() -> Self {
		Self(0)
	}

	#[inline]
	pub fn is_antialiased(&self) -> bool {
		self.contains(Flags::ANTIALIASED)
	}
}

/// Container version. `V1` and `V2` are read-only legacy formats; `V3` is
/// what this crate writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub enum Version {
	V1 = 1,
	V2 = 2,
	V3 = 3,
}

impl Version {
	fn from_u32(v: u32) -> Result<Self, SpzError> {
		match v {
			1 => Ok(Version::V1),
			2 => Ok(Version::V2),
			3 => Ok(Version::V3),
			other => Err(SpzError::UnsupportedVersion(other)),
		}
	}

	#[inline]
	pub fn as_u32(self) -> u32 {
		self as u32
	}

	/// Whether positions are stored as float16 instead of fixed-point.
	#[inline]
	pub fn uses_float16(self) -> bool {
		matches!(self, Version::V1)
	}

	/// Whether rotations use the smallest-three encoding (vs. legacy
	/// first-three).
	#[inline]
	pub fn uses_smallest_three(self) -> bool {
		matches!(self, Version::V3)
	}
}

impl std::fmt::Display for Version {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_u32())
	}
}

/// The 16-byte header: magic, version, point count, and per-splat shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub struct Header {
	pub version: Version,
	pub num_points: u32,
	pub sh_degree: u8,
	pub fractional_bits: u8,
	pub flags: Flags,
}

impl Header {
	pub fn new(version: Version, num_points: u32, sh_degree: u8, fractional_bits: u8, flags: Flags) -> Self {
		Self {
			version,
			num_points,
			sh_degree,
			fractional_bits,
			flags,
		}
	}

	/// Parses a 16-byte header, validating magic, version, point count, and
	/// SH degree.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SpzError> {
		if bytes.len() < HEADER_SIZE {
			return Err(SpzError::InvalidHeader(format!(
				"expected at least {HEADER_SIZE} bytes, got {}",
				bytes.len()
			)));
		}

		let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());

		if magic != HEADER_MAGIC {
			return Err(SpzError::InvalidHeader(format!("bad magic: {magic:#010x}")));
		}

		let version_raw = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
		let version = Version::from_u32(version_raw)?;

		let num_points = u32::from_le_bytes(bytes[8..12].try_into().unwrap());

		if num_points > crate::consts::MAX_POINTS {
			return Err(SpzError::TooManyPoints(num_points, crate::consts::MAX_POINTS));
		}

		let sh_degree = bytes[12];

		if sh_degree > 3 {
			return Err(SpzError::UnsupportedShDegree(sh_degree));
		}

		let fractional_bits = bytes[13];
		let flags = Flags(bytes[14]);
		// bytes[15] is reserved and ignored on read.

		Ok(Self {
			version,
			num_points,
			sh_degree,
			fractional_bits,
			flags,
		})
	}

	/// Serializes the header to its 16-byte wire form.
	pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
		let mut out = [0_u8; HEADER_SIZE];

		out[0..4].copy_from_slice(&HEADER_MAGIC.to_le_bytes());
		out[4..8].copy_from_slice(&self.version.as_u32().to_le_bytes());
		out[8..12].copy_from_slice(&self.num_points.to_le_bytes());
		out[12] = self.sh_degree;
		out[13] = self.fractional_bits;
		out[14] = self.flags.0;
		out[15] = 0;

		out
	}

	/// Reads just the 16-byte header of a gzip-framed SPZ file, without
	/// inflating the (potentially much larger) section payload that
	/// follows it. The file is memory-mapped so the unread tail is never
	/// paged in.
	pub fn probe_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, SpzError> {
		use std::io::Read;

		let mapped = crate::mmap::mmap(path).map_err(|e| SpzError::ReadError(to_io_error(e)))?;
		let mut decoder = flate2::read::GzDecoder::new(&mapped[..]);
		let mut buf = [0_u8; HEADER_SIZE];

		decoder
			.read_exact(&mut buf)
			.map_err(|e| SpzError::DecompressionError(e.to_string()))?;

		Self::from_bytes(&buf)
	}
}

fn to_io_error(e: anyhow::Error) -> std::io::Error {
	std::io::Error::other(e.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_roundtrip() {
		let header = Header::new(Version::V3, 1234, 2, 12, Flags::ANTIALIASED);
		let bytes = header.to_bytes();

		assert_eq!(bytes.len(), HEADER_SIZE);
		assert_eq!(Header::from_bytes(&bytes).unwrap(), header);
	}

	#[test]
	fn test_rejects_bad_magic() {
		let mut bytes = Header::new(Version::V3, 0, 0, 12, Flags::none()).to_bytes();

		bytes[0] = 0;
		assert!(matches!(Header::from_bytes(&bytes), Err(SpzError::InvalidHeader(_))));
	}

	#[test]
	fn test_rejects_bad_version() {
		let mut bytes = Header::new(Version::V3, 0, 0, 12, Flags::none()).to_bytes();

		bytes[4..8].copy_from_slice(&9_u32.to_le_bytes());
		assert!(matches!(Header::from_bytes(&bytes), Err(SpzError::UnsupportedVersion(9))));
	}

	#[test]
	fn test_rejects_too_many_points() {
		let mut bytes = Header::new(Version::V3, 0, 0, 12, Flags::none()).to_bytes();

		bytes[8..12].copy_from_slice(&(crate::consts::MAX_POINTS + 1).to_le_bytes());
		assert!(matches!(Header::from_bytes(&bytes), Err(SpzError::TooManyPoints(_, _))));
	}

	#[test]
	fn test_rejects_too_large_sh_degree() {
		let mut bytes = Header::new(Version::V3, 0, 0, 12, Flags::none()).to_bytes();

		bytes[12] = 4;
		assert!(matches!(Header::from_bytes(&bytes), Err(SpzError::UnsupportedShDegree(4))));
	}

	#[test]
	fn test_too_short_is_rejected() {
		assert!(matches!(Header::from_bytes(&[0; 8]), Err(SpzError::InvalidHeader(_))));
	}

	#[test]
	fn test_version_capabilities() {
		assert!(Version::V1.uses_float16());
		assert!(!Version::V2.uses_float16());
		assert!(!Version::V3.uses_float16());
		assert!(!Version::V1.uses_smallest_three());
		assert!(!Version::V2.uses_smallest_three());
		assert!(Version::V3.uses_smallest_three());
	}
}
