// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Scale factor for DC color components.
///
/// To convert to RGB, we should multiply by `0.282`, but it can
/// be useful to represent base colors that are out of range if the higher
/// spherical harmonics bands bring them back into range so we multiply by a
/// smaller value.
pub const COLOR_SCALE: f32 = 0.15;

/// Header magic value. "NGSP" in little-endian (LE).
pub const HEADER_MAGIC: u32 = 0x5053474e;

/// Number of fractional bits the writer always uses for fixed-point
/// positions.
pub const FRACTIONAL_BITS: u8 = 12;

/// Upper bound on the number of splats a single cloud may hold.
pub const MAX_POINTS: u32 = 10_000_000;

/// Bits of precision used for the first 9 spherical-harmonics scalars of a
/// splat (the degree-1 band).
pub const SH1_BITS: i32 = 5;

/// Bits of precision used for the remaining spherical-harmonics scalars
/// (degree 2 and 3).
pub const SH_REST_BITS: i32 = 4;

/// Conventional file extension for the container this crate reads/writes.
pub const EXTENSION: &str = "spz";

/// Conventional file extension for the PLY interchange format.
pub const PLY_EXTENSION: &str = "ply";

/// Maximum number of vertices the PLY bridge will accept (`10 * 2^20`).
pub const MAX_PLY_VERTICES: u32 = 10 * (1 << 20);
