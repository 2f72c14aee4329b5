// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "fuzzing")]
use arbitrary::Arbitrary;

/// One of the 8 axis-handedness combinations, labeled by three bits
/// (x: Left/Right, y: Down/Up, z: Back/Front), plus an `Unspecified`
/// sentinel that disables conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub enum CoordinateSystem {
	#[default]
	Unspecified = 0,

	LeftDownBack = 1,
	RightDownBack = 2,
	LeftUpBack = 3,
	RightUpBack = 4, // canonical RUB
	LeftDownFront = 5,
	RightDownFront = 6, // PLY convention
	LeftUpFront = 7,    // GLB convention
	RightUpFront = 8,   // Unity convention
}

impl std::fmt::Display for CoordinateSystem {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CoordinateSystem::LeftDownBack => write!(f, "Left-Down-Back"),
			CoordinateSystem::RightDownBack => write!(f, "Right-Down-Back"),
			CoordinateSystem::LeftUpBack => write!(f, "Left-Up-Back"),
			CoordinateSystem::RightUpBack => write!(f, "Right-Up-Back"),
			CoordinateSystem::LeftDownFront => write!(f, "Left-Down-Front"),
			CoordinateSystem::RightDownFront => write!(f, "Right-Down-Front"),
			CoordinateSystem::LeftUpFront => write!(f, "Left-Up-Front"),
			CoordinateSystem::RightUpFront => write!(f, "Right-Up-Front"),
			CoordinateSystem::Unspecified => write!(f, "Unspecified"),
		}
	}
}

impl FromStr for CoordinateSystem {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_uppercase().as_str() {
			"LDB" | "LEFTDOWNBACK" | "LEFT-DOWN-BACK" | "LEFT_DOWN_BACK" => Ok(CoordinateSystem::LeftDownBack),
			"RDB" | "RIGHTDOWNBACK" | "RIGHT-DOWN-BACK" | "RIGHT_DOWN_BACK" => Ok(CoordinateSystem::RightDownBack),
			"LUB" | "LEFTUPBACK" | "LEFT-UP-BACK" | "LEFT_UP_BACK" => Ok(CoordinateSystem::LeftUpBack),
			"RUB" | "RIGHTUPBACK" | "RIGHT-UP-BACK" | "RIGHT_UP_BACK" => Ok(CoordinateSystem::RightUpBack),
			"LDF" | "LEFTDOWNFRONT" | "LEFT-DOWN-FRONT" | "LEFT_DOWN_FRONT" => Ok(CoordinateSystem::LeftDownFront),
			"RDF" | "RIGHTDOWNFRONT" | "RIGHT-DOWN-FRONT" | "RIGHT_DOWN_FRONT" => Ok(CoordinateSystem::RightDownFront),
			"LUF" | "LEFTUPFRONT" | "LEFT-UP-FRONT" | "LEFT_UP_FRONT" => Ok(CoordinateSystem::LeftUpFront),
			"RUF" | "RIGHTUPFRONT" | "RIGHT-UP-FRONT" | "RIGHT_UP_FRONT" => Ok(CoordinateSystem::RightUpFront),
			_ => Ok(CoordinateSystem::Unspecified),
		}
	}
}

impl From<&str> for CoordinateSystem {
	fn from(s: &str) -> Self {
		s.parse().unwrap_or(CoordinateSystem::Unspecified)
	}
}

impl CoordinateSystem {
	pub fn iter() -> impl Iterator<Item = CoordinateSystem> {
		[
			CoordinateSystem::Unspecified,
			CoordinateSystem::LeftDownBack,
			CoordinateSystem::RightDownBack,
			CoordinateSystem::LeftUpBack,
			CoordinateSystem::RightUpBack,
			CoordinateSystem::LeftDownFront,
			CoordinateSystem::RightDownFront,
			CoordinateSystem::LeftUpFront,
			CoordinateSystem::RightUpFront,
		]
		.into_iter()
	}

	pub fn as_short_str(&self) -> &'static str {
		match self {
			CoordinateSystem::LeftDownBack => "LDB",
			CoordinateSystem::RightDownBack => "RDB",
			CoordinateSystem::LeftUpBack => "LUB",
			CoordinateSystem::RightUpBack => "RUB",
			CoordinateSystem::LeftDownFront => "LDF",
			CoordinateSystem::RightDownFront => "RDF",
			CoordinateSystem::LeftUpFront => "LUF",
			CoordinateSystem::RightUpFront => "RUF",
			CoordinateSystem::Unspecified => "UNSPECIFIED",
		}
	}

	/// Computes the per-axis sign flips needed to convert data from `self`
	/// into `target`. Identity if either side is `Unspecified`.
	pub fn axis_flips_to(self, target: CoordinateSystem) -> AxisFlips {
		let (x_match, y_match, z_match) = self.axes_align(target);

		let x = if x_match { 1.0_f32 } else { -1.0_f32 };
		let y = if y_match { 1.0_f32 } else { -1.0_f32 };
		let z = if z_match { 1.0_f32 } else { -1.0_f32 };

		AxisFlips {
			position: [x, y, z],
			rotation: [y * z, x * z, x * y],
			spherical_harmonics: [
				y,
				z,
				x,
				x * y,
				y * z,
				1.0,
				x * z,
				1.0,
				y,
				x * y * z,
				y,
				z,
				x,
				z,
				x,
			],
		}
	}

	/// `(x, y, z)`: whether each axis points the same way in both systems.
	/// `true` when either system is `Unspecified`.
	pub fn axes_align(self, other: CoordinateSystem) -> (bool, bool, bool) {
		let self_num = self as i8 - 1;
		let other_num = other as i8 - 1;

		if self_num < 0 || other_num < 0 {
			return (true, true, true);
		}
		let xm = (self_num & 1) == (other_num & 1);
		let ym = ((self_num >> 1) & 1) == ((other_num >> 1) & 1);
		let zm = ((self_num >> 2) & 1) == ((other_num >> 2) & 1);

		(xm, ym, zm)
	}
}

/// Per-axis sign multipliers (`+1.0` / `-1.0`) for converting a [`crate::Cloud`]
/// between coordinate systems.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzzing", derive(Arbitrary))]
pub struct AxisFlips {
	/// Sign multipliers for XYZ position coordinates.
	pub position: [f32; 3],
	/// Sign multipliers for quaternion X, Y, Z; W is never flipped.
	pub rotation: [f32; 3],
	/// Sign multipliers for the 15 stored spherical-harmonics coefficients,
	/// applied per-triple (R, G, B share a multiplier).
	pub spherical_harmonics: [f32; 15],
}

impl Default for AxisFlips {
	fn default() -> Self {
		Self {
			position: [1.0, 1.0, 1.0],
			rotation: [1.0, 1.0, 1.0],
			spherical_harmonics: [1.0; 15],
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[test]
	fn test_from_str_short_codes() {
		assert_eq!("RDF".parse(), Ok(CoordinateSystem::RightDownFront));
		assert_eq!("luf".parse(), Ok(CoordinateSystem::LeftUpFront));
		assert_eq!("bogus".parse(), Ok(CoordinateSystem::Unspecified));
	}

	#[test]
	fn test_identity_conversion_has_no_flips() {
		let flips = CoordinateSystem::RightUpBack.axis_flips_to(CoordinateSystem::RightUpBack);

		assert_eq!(flips, AxisFlips::default());
	}

	#[test]
	fn test_unspecified_is_identity_either_side() {
		let flips = CoordinateSystem::Unspecified.axis_flips_to(CoordinateSystem::RightDownFront);

		assert_eq!(flips, AxisFlips::default());

		let flips = CoordinateSystem::RightDownFront.axis_flips_to(CoordinateSystem::Unspecified);

		assert_eq!(flips, AxisFlips::default());
	}

	#[rstest]
	#[case(CoordinateSystem::RightUpBack, CoordinateSystem::RightDownFront, (true, false, false))]
	#[case(CoordinateSystem::RightUpBack, CoordinateSystem::LeftUpFront, (false, true, false))]
	fn test_axes_align(
		#[case] a: CoordinateSystem,
		#[case] b: CoordinateSystem,
		#[case] expected: (bool, bool, bool),
	) {
		assert_eq!(a.axes_align(b), expected);
	}

	#[test]
	fn test_ply_to_glb_flips_x_and_y() {
		// PLY is RightDownFront, GLB is LeftUpFront: x and y differ, z matches.
		let flips = CoordinateSystem::RightDownFront.axis_flips_to(CoordinateSystem::LeftUpFront);

		assert_eq!(flips.position, [-1.0, -1.0, 1.0]);
	}

	#[test]
	fn test_round_trip_conversion_is_involution() {
		for a in CoordinateSystem::iter() {
			for b in CoordinateSystem::iter() {
				let there = a.axis_flips_to(b);
				let back = b.axis_flips_to(a);

				for i in 0..3 {
					assert_eq!(there.position[i] * back.position[i], 1.0);
				}
			}
		}
	}
}
