// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fuzz target for gzip decompression: malformed input must be rejected
//! with an error, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spz::compression;

fuzz_target!(|data: &[u8]| {
	let _ = compression::decompress(data);
});
