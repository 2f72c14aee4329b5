// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fuzz target for the quantizer: packing and unpacking an arbitrary (but
//! size-consistent) `Cloud` must never panic, regardless of how extreme or
//! non-finite its float fields are.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spz::Cloud;

fuzz_target!(|cloud: Cloud| {
	if cloud.check_sizes().is_err() {
		return;
	}

	if let Ok(packed) = spz::pack(&cloud) {
		let _ = spz::unpack(&packed);

		let bytes = spz::serialize(&packed);

		if let Ok(reparsed) = spz::deserialize(&bytes) {
			assert_eq!(packed, reparsed);
		}
	}
});
