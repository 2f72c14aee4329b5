// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Memory-mapped file access, used only for cheap header-only probes; the
//! rest of the codec works on owned in-memory buffers.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

/// Memory-maps a file for read-only access.
pub fn mmap<P: AsRef<Path>>(path: P) -> Result<Mmap> {
	let file = File::open(&path).with_context(|| format!("opening {}", path.as_ref().display()))?;

	unsafe { Mmap::map(&file).with_context(|| format!("mmap of {}", path.as_ref().display())) }
}

/// Memory-maps a byte range of a file for read-only access.
pub fn mmap_range<P: AsRef<Path>>(path: P, offset: usize, len: usize) -> Result<Mmap> {
	let file = File::open(&path).with_context(|| format!("opening {}", path.as_ref().display()))?;

	unsafe {
		memmap2::MmapOptions::new()
			.offset(offset as u64)
			.len(len)
			.map(&file)
			.with_context(|| format!("mmap range {offset}..{} of {}", offset + len, path.as_ref().display()))
	}
}
