// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fuzz target for the container codec: arbitrary bytes must either
//! deserialize into a size-consistent `Packed`, or fail, never panic or
//! produce a `Packed` that fails its own invariant check.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spz::packed;

fuzz_target!(|data: &[u8]| {
	if let Ok(p) = packed::deserialize(data) {
		assert!(p.check_sizes().is_ok());

		let bytes = packed::serialize(&p);
		let reparsed = packed::deserialize(&bytes).expect("serialized Packed must deserialize");

		assert_eq!(p, reparsed);
	}
});
