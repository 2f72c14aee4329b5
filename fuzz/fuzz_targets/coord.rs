// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fuzz target for coordinate conversion: arbitrary (source, target) frame
//! pairs must never panic, and converting there and back must return every
//! position to its original value bit-for-bit.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use spz::CoordinateSystem;

#[derive(Debug, Arbitrary)]
struct Input {
	from: CoordinateSystem,
	to: CoordinateSystem,
	positions: Vec<[f32; 3]>,
}

fuzz_target!(|input: Input| {
	let there = input.from.axis_flips_to(input.to);
	let back = input.to.axis_flips_to(input.from);

	for p in &input.positions {
		if p.iter().any(|c| !c.is_finite()) {
			continue;
		}

		let mut roundtripped = *p;

		for i in 0..3 {
			roundtripped[i] *= there.position[i];
			roundtripped[i] *= back.position[i];
		}

		assert_eq!(roundtripped, *p);
	}
});
