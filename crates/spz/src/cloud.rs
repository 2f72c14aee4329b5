// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The decoded, floating-point Gaussian-splat cloud, and the quantizer that
//! converts it to and from the byte-level [`Packed`] form.

use serde::{Deserialize, Serialize};

#[cfg(feature = "fuzzing")]
use arbitrary::Arbitrary;

use crate::consts::{COLOR_SCALE, FRACTIONAL_BITS, SH1_BITS, SH_REST_BITS};
use crate::coord::{AxisFlips, CoordinateSystem};
use crate::errors::SpzError;
use crate::math::{
	dim_for_degree, half_to_float, inv_sigmoid, normalize_quaternion, pack_quaternion_first_three,
	pack_quaternion_smallest_three, quantize_sh, sigmoid, to_u8, unpack_quaternion_first_three,
	unpack_quaternion_smallest_three, unquantize_sh,
};
use crate::packed::Packed;

/// The decoded form of a Gaussian-splat point cloud: flat per-field float
/// arrays, `N` splats wide. See the module docs for the per-field layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub struct Cloud {
	pub num_points: u32,
	pub sh_degree: u8,
	pub antialiased: bool,

	/// length `3*N`, (x, y, z) per splat.
	pub positions: Vec<f32>,
	/// length `3*N`, per-axis log-scale.
	pub scales: Vec<f32>,
	/// length `4*N`, (x, y, z, w) per splat.
	pub rotations: Vec<f32>,
	/// length `N`, pre-sigmoid opacity.
	pub alphas: Vec<f32>,
	/// length `3*N`, SH DC term.
	pub colors: Vec<f32>,
	/// length `N * sh_dim * 3`, coefficient-major, channel-minor.
	pub sh: Vec<f32>,
}

impl Cloud {
	pub fn sh_dim(&self) -> usize {
		dim_for_degree(self.sh_degree) as usize
	}

	/// Validates the nine array-length equalities from the data model.
	pub fn check_sizes(&self) -> Result<(), SpzError> {
		if self.sh_degree > 3 {
			return Err(SpzError::UnsupportedShDegree(self.sh_degree));
		}

		let n = self.num_points as usize;
		let sh_dim = self.sh_dim();

		let checks: [(&str, usize, usize); 6] = [
			("positions", self.positions.len(), n * 3),
			("scales", self.scales.len(), n * 3),
			("rotations", self.rotations.len(), n * 4),
			("alphas", self.alphas.len(), n),
			("colors", self.colors.len(), n * 3),
			("sh", self.sh.len(), n * sh_dim * 3),
		];

		for (name, got, expected) in checks {
			if got != expected {
				return Err(SpzError::InvalidData(format!(
					"{name}: expected length {expected}, got {got}"
				)));
			}
		}

		Ok(())
	}

	/// Converts this cloud's data in place from `source` to `target`. A
	/// no-op if either side is [`CoordinateSystem::Unspecified`] or the
	/// cloud is empty.
	pub fn convert_coordinates(&mut self, source: CoordinateSystem, target: CoordinateSystem) {
		if self.num_points == 0 {
			return;
		}
		self.apply_flips(source.axis_flips_to(target));
	}

	fn apply_flips(&mut self, flip: AxisFlips) {
		for p in self.positions.chunks_exact_mut(3) {
			p[0] *= flip.position[0];
			p[1] *= flip.position[1];
			p[2] *= flip.position[2];
		}
		for r in self.rotations.chunks_exact_mut(4) {
			r[0] *= flip.rotation[0];
			r[1] *= flip.rotation[1];
			r[2] *= flip.rotation[2];
			// w unchanged
		}

		let sh_dim = self.sh_dim();

		if sh_dim == 0 {
			return;
		}
		for splat in self.sh.chunks_exact_mut(sh_dim * 3) {
			for (j, triple) in splat.chunks_exact_mut(3).enumerate() {
				let f = flip.spherical_harmonics[j];

				triple[0] *= f;
				triple[1] *= f;
				triple[2] *= f;
			}
		}
	}

	/// The specific case `convert(RUB -> RDF)`: flips the y and z axes.
	/// Equivalent to, and implemented as, a call into the general
	/// coordinate converter.
	pub fn rotate_180_deg_about_x(&mut self) {
		self.convert_coordinates(CoordinateSystem::RightUpBack, CoordinateSystem::RightDownFront);
	}

	/// `0.01` for an empty cloud; otherwise `(4*pi/3) * exp(v)` where `v` is
	/// the lower-median of `scales[3i] + scales[3i+1] + scales[3i+2]`.
	pub fn median_volume(&self) -> f32 {
		if self.num_points == 0 {
			return 0.01;
		}

		let mut sums: Vec<f32> = self.scales.chunks_exact(3).map(|c| c[0] + c[1] + c[2]).collect();

		if sums.is_empty() {
			return 0.01;
		}

		let mid = sums.len() / 2;

		sums.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

		let median = sums[mid];

		(4.0 / 3.0) * std::f32::consts::PI * median.exp()
	}
}

/// Quantizes a decoded cloud into its byte-level form. Always writes the
/// smallest-three rotation encoding and 12 fractional bits, matching what
/// `serialize` emits.
pub fn pack(cloud: &Cloud) -> Result<Packed, SpzError> {
	cloud.check_sizes()?;

	let n = cloud.num_points as usize;
	let sh_dim = cloud.sh_dim();
	let scale = (1_i32 << FRACTIONAL_BITS) as f32;

	let mut positions = vec![0_u8; n * 3 * 3];

	for (i, chunk) in positions.chunks_exact_mut(3).enumerate() {
		let p = cloud.positions[i];
		let p = if p.is_finite() { p } else { 0.0 };
		let fixed = (p * scale).round() as i32;

		chunk[0] = (fixed & 0xff) as u8;
		chunk[1] = ((fixed >> 8) & 0xff) as u8;
		chunk[2] = ((fixed >> 16) & 0xff) as u8;
	}

	let scales: Vec<u8> = cloud
		.scales
		.iter()
		.map(|&s| {
			let s = if s.is_finite() { s } else { 0.0 };

			to_u8((s + 10.0) * 16.0)
		})
		.collect();

	let mut rotations = vec![0_u8; n * 4];

	for (i, chunk) in rotations.chunks_exact_mut(4).enumerate() {
		let raw = [
			cloud.rotations[4 * i],
			cloud.rotations[4 * i + 1],
			cloud.rotations[4 * i + 2],
			cloud.rotations[4 * i + 3],
		];
		let safe = if raw.iter().all(|c| c.is_finite()) {
			raw
		} else {
			[0.0, 0.0, 0.0, 1.0]
		};
		let packed = pack_quaternion_smallest_three(normalize_quaternion(safe));

		chunk.copy_from_slice(&packed);
	}

	let alphas: Vec<u8> = cloud.alphas.iter().map(|&a| to_u8(sigmoid(a) * 255.0)).collect();

	let colors: Vec<u8> = cloud
		.colors
		.iter()
		.map(|&c| to_u8(c * (COLOR_SCALE * 255.0) + 0.5 * 255.0))
		.collect();

	let mut sh = vec![0_u8; n * sh_dim * 3];

	if sh_dim > 0 {
		let per_splat = sh_dim * 3;

		for (splat_idx, out_splat) in sh.chunks_exact_mut(per_splat).enumerate() {
			let in_splat = &cloud.sh[splat_idx * per_splat..(splat_idx + 1) * per_splat];

			for (j, &v) in in_splat.iter().enumerate() {
				let bits = if j < 9 { SH1_BITS } else { SH_REST_BITS };
				let bucket = 1_i32 << (8 - bits);

				out_splat[j] = quantize_sh(v, bucket);
			}
		}
	}

	Ok(Packed {
		num_points: cloud.num_points,
		sh_degree: cloud.sh_degree,
		fractional_bits: FRACTIONAL_BITS,
		antialiased: cloud.antialiased,
		uses_float16: false,
		uses_smallest_three: true,
		positions,
		alphas,
		colors,
		scales,
		rotations,
		sh,
	})
}

/// Dequantizes a byte-level cloud into float arrays.
pub fn unpack(packed: &Packed) -> Result<Cloud, SpzError> {
	packed.check_sizes()?;

	let n = packed.num_points as usize;

	let mut positions = vec![0_f32; n * 3];

	if packed.uses_float16 {
		for (i, dst) in positions.iter_mut().enumerate() {
			let lo = packed.positions[i * 2] as u16;
			let hi = packed.positions[i * 2 + 1] as u16;
			let half = lo | (hi << 8);

			*dst = half_to_float(half);
		}
	} else {
		let scale = 1.0_f32 / (1_u32 << packed.fractional_bits) as f32;

		for (i, dst) in positions.iter_mut().enumerate() {
			let b0 = packed.positions[i * 3] as i32;
			let b1 = packed.positions[i * 3 + 1] as i32;
			let b2 = packed.positions[i * 3 + 2] as i32;
			let mut fixed = b0 | (b1 << 8) | (b2 << 16);

			if fixed & 0x800000 != 0 {
				fixed |= -0x1000000_i32;
			}
			*dst = fixed as f32 * scale;
		}
	}

	let scales: Vec<f32> = packed.scales.iter().map(|&b| b as f32 / 16.0 - 10.0).collect();

	let mut rotations = vec![0_f32; n * 4];

	if packed.uses_smallest_three {
		for (i, dst) in rotations.chunks_exact_mut(4).enumerate() {
			let r: [u8; 4] = packed.rotations[4 * i..4 * i + 4].try_into().unwrap();

			dst.copy_from_slice(&unpack_quaternion_smallest_three(r));
		}
	} else {
		for (i, dst) in rotations.chunks_exact_mut(4).enumerate() {
			let r: [u8; 3] = packed.rotations[3 * i..3 * i + 3].try_into().unwrap();

			dst.copy_from_slice(&unpack_quaternion_first_three(r));
		}
	}

	let alphas: Vec<f32> = packed.alphas.iter().map(|&b| inv_sigmoid(b as f32 / 255.0)).collect();

	let colors: Vec<f32> = packed
		.colors
		.iter()
		.map(|&b| (b as f32 / 255.0 - 0.5) / COLOR_SCALE)
		.collect();

	let sh: Vec<f32> = packed.sh.iter().map(|&b| unquantize_sh(b)).collect();

	Ok(Cloud {
		num_points: packed.num_points,
		sh_degree: packed.sh_degree,
		antialiased: packed.antialiased,
		positions,
		scales,
		rotations,
		alphas,
		colors,
		sh,
	})
}

/// Packs a quaternion using the legacy first-three encoding; used only by
/// test fixtures for versions 1/2, since [`pack`] always writes version 3.
pub fn pack_legacy_rotation(q: [f32; 4]) -> [u8; 3] {
	pack_quaternion_first_three(normalize_quaternion(q))
}
