// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Codec for the SPZ container format: a compact, gzip-framed binary
//! representation of a 3D Gaussian-splat point cloud. Encodes clouds at
//! roughly a tenth the size of the PLY interchange form used by training
//! pipelines while staying bit-compatible with the reference codec.
//!
//! The pure in-memory API is [`decode_spz`]/[`encode_spz`] and
//! [`decode_ply`]/[`encode_ply`]; [`pack`]/[`unpack`] and
//! [`serialize`]/[`deserialize`] expose the [`Packed`] intermediate for
//! callers who want it. Everything here is synchronous and operates on
//! owned buffers; there is no global state and no I/O beyond what callers
//! hand in.

pub mod cloud;
pub mod compression;
pub mod consts;
pub mod coord;
pub mod errors;
pub mod header;
pub mod math;
pub mod mmap;
pub mod packed;
pub mod ply;

pub use cloud::Cloud;
pub use coord::{AxisFlips, CoordinateSystem};
pub use errors::SpzError;
pub use header::{Flags, Header, Version};
pub use packed::Packed;

/// Decodes a gzip-framed SPZ buffer into a [`Cloud`]. If `target` is not
/// [`CoordinateSystem::Unspecified`], converts from the canonical RUB frame
/// to `target`.
pub fn decode_spz(bytes: &[u8], target: CoordinateSystem) -> Result<Cloud, SpzError> {
	let inflated = compression::decompress(bytes)?;
	let packed = packed::deserialize(&inflated)?;
	let mut decoded = cloud::unpack(&packed)?;

	if !matches!(target, CoordinateSystem::Unspecified) {
		decoded.convert_coordinates(CoordinateSystem::RightUpBack, target);
	}

	Ok(decoded)
}

/// Encodes a [`Cloud`] to a gzip-framed SPZ buffer. If `source` is not
/// [`CoordinateSystem::Unspecified`], converts from `source` to the
/// canonical RUB frame before quantizing.
pub fn encode_spz(cloud: &Cloud, source: CoordinateSystem) -> Result<Vec<u8>, SpzError> {
	let mut cloud = cloud.clone();

	if !matches!(source, CoordinateSystem::Unspecified) {
		cloud.convert_coordinates(source, CoordinateSystem::RightUpBack);
	}

	let packed = cloud::pack(&cloud)?;
	let bytes = packed::serialize(&packed);

	compression::compress(&bytes)
}

/// Parses a `binary_little_endian 1.0` PLY buffer into a [`Cloud`].
pub fn decode_ply(bytes: &[u8], target: CoordinateSystem) -> Result<Cloud, SpzError> {
	ply::decode_ply(bytes, target)
}

/// Serializes a [`Cloud`] to `binary_little_endian 1.0` PLY.
pub fn encode_ply(cloud: &Cloud, source: CoordinateSystem) -> Result<Vec<u8>, SpzError> {
	ply::encode_ply(cloud, source)
}

/// Quantizes a [`Cloud`] into its byte-level [`Packed`] form.
pub fn pack(cloud: &Cloud) -> Result<Packed, SpzError> {
	cloud::pack(cloud)
}

/// Dequantizes a [`Packed`] into a [`Cloud`].
pub fn unpack(packed: &Packed) -> Result<Cloud, SpzError> {
	cloud::unpack(packed)
}

/// Concatenates a header and the six fixed-order sections of a [`Packed`].
pub fn serialize(packed: &Packed) -> Vec<u8> {
	packed::serialize(packed)
}

/// Parses a header and its six fixed-order sections into a [`Packed`].
pub fn deserialize(bytes: &[u8]) -> Result<Packed, SpzError> {
	packed::deserialize(bytes)
}

pub mod prelude {
	pub use super::{
		decode_ply, decode_spz, deserialize, encode_ply, encode_spz, pack, serialize, unpack, AxisFlips, Cloud,
		CoordinateSystem, Flags, Header, Packed, SpzError, Version,
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	fn e1_cloud() -> Cloud {
		Cloud {
			num_points: 1,
			sh_degree: 1,
			antialiased: false,
			positions: vec![0.0, 0.0, 0.0],
			scales: vec![0.1, 0.1, 0.1],
			rotations: vec![0.0, 0.0, 0.0, 1.0],
			alphas: vec![1.0],
			colors: vec![0.5, 0.5, 0.5],
			sh: vec![0.0; 9],
		}
	}

	#[test]
	fn test_e1_encode_starts_with_gzip_magic() {
		let cloud = e1_cloud();
		let bytes = encode_spz(&cloud, CoordinateSystem::Unspecified).unwrap();

		assert_eq!(&bytes[0..4], &[0x1f, 0x8b, 0x08, 0x00]);
	}

	#[test]
	fn test_e1_full_roundtrip() {
		let cloud = e1_cloud();
		let bytes = encode_spz(&cloud, CoordinateSystem::Unspecified).unwrap();
		let decoded = decode_spz(&bytes, CoordinateSystem::Unspecified).unwrap();

		for (a, b) in cloud.positions.iter().zip(decoded.positions.iter()) {
			assert!((a - b).abs() <= 2.0_f32.powi(-13));
		}
	}

	#[test]
	fn test_e3_rejects_version_4() {
		let mut header_bytes = Header::new(Version::V3, 0, 0, 12, Flags::none()).to_bytes();

		header_bytes[4..8].copy_from_slice(&4_u32.to_le_bytes());
		let gz = compression::compress(&header_bytes).unwrap();

		assert!(matches!(
			decode_spz(&gz, CoordinateSystem::Unspecified),
			Err(SpzError::UnsupportedVersion(4))
		));
	}

	#[test]
	fn test_ply_through_spz_preserves_topology() {
		let ply_bytes = ply::encode_ply(&e1_cloud(), CoordinateSystem::Unspecified).unwrap();
		let cloud = decode_ply(&ply_bytes, CoordinateSystem::Unspecified).unwrap();
		let spz_bytes = encode_spz(&cloud, CoordinateSystem::Unspecified).unwrap();
		let back = decode_spz(&spz_bytes, CoordinateSystem::Unspecified).unwrap();

		assert_eq!(back.num_points, cloud.num_points);
		assert_eq!(back.sh_degree, cloud.sh_degree);
		assert_eq!(back.antialiased, cloud.antialiased);
	}
}
