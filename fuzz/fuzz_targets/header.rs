// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fuzz target for header parsing: any 16-byte buffer must either parse or
//! fail cleanly, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spz::header::Header;

fuzz_target!(|data: &[u8]| {
	let _ = Header::from_bytes(data);
});
