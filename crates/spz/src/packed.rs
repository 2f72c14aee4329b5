// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The byte-level container: header plus six fixed-order sections. This is
//! the in-memory mirror of what [`crate::compression::gzip`] wraps on disk.

use serde::{Deserialize, Serialize};

#[cfg(feature = "fuzzing")]
use arbitrary::Arbitrary;

use crate::errors::SpzError;
use crate::header::{Flags, Header, HEADER_SIZE, Version};
use crate::math::dim_for_degree;

/// Byte-level mirror of the on-disk SPZ layout (see `§4.5` of the container
/// codec). Section order on the wire is always positions, alphas, colors,
/// scales, rotations, sh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub struct Packed {
	pub num_points: u32,
	pub sh_degree: u8,
	pub fractional_bits: u8,
	pub antialiased: bool,
	pub uses_float16: bool,
	pub uses_smallest_three: bool,

	pub positions: Vec<u8>,
	pub alphas: Vec<u8>,
	pub colors: Vec<u8>,
	pub scales: Vec<u8>,
	pub rotations: Vec<u8>,
	pub sh: Vec<u8>,
}

impl Packed {
	#[inline]
	pub fn sh_dim(&self) -> usize {
		dim_for_degree(self.sh_degree) as usize
	}

	#[inline]
	pub fn position_component_size(&self) -> usize {
		if self.uses_float16 { 2 } else { 3 }
	}

	#[inline]
	pub fn rotation_size(&self) -> usize {
		if self.uses_smallest_three { 4 } else { 3 }
	}

	fn expected_sizes(&self) -> [(&'static str, usize); 6] {
		let n = self.num_points as usize;

		[
			("positions", n * 3 * self.position_component_size()),
			("alphas", n),
			("colors", n * 3),
			("scales", n * 3),
			("rotations", n * self.rotation_size()),
			("sh", n * self.sh_dim() * 3),
		]
	}

	/// Validates the nine array-length equalities from the data model; the
	/// six section lengths here plus the three implied by `sh_dim`/
	/// `rotation_size`/`position_component_size` already baked into the
	/// expected sizes above.
	pub fn check_sizes(&self) -> Result<(), SpzError> {
		if self.sh_degree > 3 {
			return Err(SpzError::UnsupportedShDegree(self.sh_degree));
		}

		let actual = [
			self.positions.len(),
			self.alphas.len(),
			self.colors.len(),
			self.scales.len(),
			self.rotations.len(),
			self.sh.len(),
		];

		for ((name, expected), got) in self.expected_sizes().iter().zip(actual.iter()) {
			if *expected != *got {
				return Err(SpzError::InvalidData(format!(
					"{name}: expected {expected} bytes, got {got}"
				)));
			}
		}

		Ok(())
	}

	/// The version whose on-disk shape (`uses_float16`, `uses_smallest_three`)
	/// matches this `Packed`'s own flags.
	fn version(&self) -> Version {
		if self.uses_float16 {
			Version::V1
		} else if !self.uses_smallest_three {
			Version::V2
		} else {
			Version::V3
		}
	}

	fn header(&self) -> Header {
		let mut flags = Flags::none();

		if self.antialiased {
			flags |= Flags::ANTIALIASED;
		}

		Header::new(self.version(), self.num_points, self.sh_degree, self.fractional_bits, flags)
	}
}

/// Concatenates the header and the six sections in their fixed order. The
/// quantizer ([`crate::cloud::pack`]) always produces a `Packed` shaped for
/// version 3 (fixed-point positions, smallest-three rotations), so the
/// top-level `encode_spz` path always writes version 3; this function
/// itself writes whatever version matches the `Packed`'s own shape, so a
/// `Packed` obtained from a legacy file round-trips through `serialize`.
pub fn serialize(packed: &Packed) -> Vec<u8> {
	let header = packed.header();
	let mut out = Vec::with_capacity(
		HEADER_SIZE
			+ packed.positions.len()
			+ packed.alphas.len()
			+ packed.colors.len()
			+ packed.scales.len()
			+ packed.rotations.len()
			+ packed.sh.len(),
	);

	out.extend_from_slice(&header.to_bytes());
	out.extend_from_slice(&packed.positions);
	out.extend_from_slice(&packed.alphas);
	out.extend_from_slice(&packed.colors);
	out.extend_from_slice(&packed.scales);
	out.extend_from_slice(&packed.rotations);
	out.extend_from_slice(&packed.sh);

	out
}

/// Parses a header followed by the six fixed-order sections, trusting
/// remaining bytes beyond the computed total (trailing data is ignored).
pub fn deserialize(bytes: &[u8]) -> Result<Packed, SpzError> {
	let header = Header::from_bytes(bytes)?;

	let uses_float16 = header.version.uses_float16();
	let uses_smallest_three = header.version.uses_smallest_three();
	let sh_dim = dim_for_degree(header.sh_degree) as usize;
	let n = header.num_points as usize;

	let position_component_size = if uses_float16 { 2 } else { 3 };
	let rotation_size = if uses_smallest_three { 4 } else { 3 };

	let sizes = [
		n * 3 * position_component_size,
		n,
		n * 3,
		n * 3,
		n * rotation_size,
		n * sh_dim * 3,
	];
	let total: usize = sizes.iter().sum();
	let body = &bytes[HEADER_SIZE..];

	if body.len() < total {
		return Err(SpzError::InvalidData(format!(
			"expected at least {total} body bytes, got {}",
			body.len()
		)));
	}

	let mut offset = 0;
	let mut take = |len: usize| {
		let slice = &body[offset..offset + len];

		offset += len;
		slice.to_vec()
	};

	let positions = take(sizes[0]);
	let alphas = take(sizes[1]);
	let colors = take(sizes[2]);
	let scales = take(sizes[3]);
	let rotations = take(sizes[4]);
	let sh = take(sizes[5]);

	let packed = Packed {
		num_points: header.num_points,
		sh_degree: header.sh_degree,
		fractional_bits: header.fractional_bits,
		antialiased: header.flags.is_antialiased(),
		uses_float16,
		uses_smallest_three,
		positions,
		alphas,
		colors,
		scales,
		rotations,
		sh,
	};

	packed.check_sizes()?;

	Ok(packed)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn empty_packed() -> Packed {
		Packed {
			num_points: 0,
			sh_degree: 0,
			fractional_bits: 12,
			antialiased: false,
			uses_float16: false,
			uses_smallest_three: true,
			positions: vec![],
			alphas: vec![],
			colors: vec![],
			scales: vec![],
			rotations: vec![],
			sh: vec![],
		}
	}

	fn single_point_packed(sh_degree: u8) -> Packed {
		let sh_dim = dim_for_degree(sh_degree) as usize;

		Packed {
			num_points: 1,
			sh_degree,
			fractional_bits: 12,
			antialiased: true,
			uses_float16: false,
			uses_smallest_three: true,
			positions: vec![0; 9],
			alphas: vec![200],
			colors: vec![128, 128, 128],
			scales: vec![160, 160, 160],
			rotations: vec![0, 0, 0, 0xc0],
			sh: vec![128; sh_dim * 3],
		}
	}

	#[test]
	fn test_empty_roundtrip() {
		let packed = empty_packed();
		let bytes = serialize(&packed);

		assert_eq!(bytes.len(), HEADER_SIZE);
		assert_eq!(deserialize(&bytes).unwrap(), packed);
	}

	#[test]
	fn test_e2_empty_header_bytes() {
		let bytes: [u8; 16] = [0x4e, 0x47, 0x53, 0x50, 0x03, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
		let packed = deserialize(&bytes).unwrap();

		assert_eq!(packed.num_points, 0);
	}

	#[test]
	fn test_single_point_roundtrip() {
		let packed = single_point_packed(1);
		let bytes = serialize(&packed);

		assert_eq!(deserialize(&bytes).unwrap(), packed);
	}

	#[test]
	fn test_trailing_bytes_are_ignored() {
		let packed = single_point_packed(0);
		let mut bytes = serialize(&packed);

		bytes.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(deserialize(&bytes).unwrap(), packed);
	}

	#[test]
	fn test_rejects_truncated_sections() {
		let packed = single_point_packed(2);
		let bytes = serialize(&packed);
		let truncated = &bytes[..bytes.len() - 1];

		assert!(matches!(deserialize(truncated), Err(SpzError::InvalidData(_))));
	}

	#[test]
	fn test_check_sizes_rejects_mismatched_section() {
		let mut packed = single_point_packed(0);

		packed.alphas.push(0);
		assert!(matches!(packed.check_sizes(), Err(SpzError::InvalidData(_))));
	}

	#[test]
	fn test_v4_header_is_rejected_before_sections() {
		let mut bytes = [0_u8; HEADER_SIZE].to_vec();

		bytes[0..4].copy_from_slice(&crate::consts::HEADER_MAGIC.to_le_bytes());
		bytes[4..8].copy_from_slice(&4_u32.to_le_bytes());
		assert!(matches!(deserialize(&bytes), Err(SpzError::UnsupportedVersion(4))));
	}
}
