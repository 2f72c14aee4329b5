// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The PLY interchange bridge: ASCII header, `binary_little_endian 1.0`
//! body, `float` properties only. This is the format training pipelines
//! exchange; it is roughly 10x larger on disk than SPZ for the same cloud.

use std::io::Write;

use crate::consts::MAX_PLY_VERTICES;
use crate::coord::CoordinateSystem;
use crate::errors::SpzError;
use crate::math::{degree_for_dim, dim_for_degree};
use crate::cloud::Cloud;

const REQUIRED_NAMES: &[&str] = &[
	"x", "y", "z", "scale_0", "scale_1", "scale_2", "rot_1", "rot_2", "rot_3", "rot_0", "opacity", "f_dc_0",
	"f_dc_1", "f_dc_2",
];

struct Header {
	num_vertices: u32,
	/// `property float <name>` lines in declaration order.
	names: Vec<String>,
}

fn parse_header(bytes: &[u8]) -> Result<(Header, usize), SpzError> {
	const MARKER: &[u8] = b"end_header\n";

	let marker_pos = bytes
		.windows(MARKER.len())
		.position(|w| w == MARKER)
		.ok_or_else(|| SpzError::InvalidFormat("missing end_header".to_string()))?;

	let header_text = std::str::from_utf8(&bytes[..marker_pos])
		.map_err(|e| SpzError::InvalidFormat(format!("header is not valid UTF-8: {e}")))?;
	let body_offset = marker_pos + MARKER.len();

	let mut lines = header_text.lines();

	match lines.next() {
		Some("ply") => {},
		other => return Err(SpzError::InvalidFormat(format!("expected 'ply' magic, got {other:?}"))),
	}

	let mut num_vertices = None;
	let mut names = Vec::new();
	let mut saw_format = false;

	for line in lines {
		let line = line.trim();

		if line.is_empty() || line.starts_with("comment") {
			continue;
		}
		if let Some(rest) = line.strip_prefix("format ") {
			if rest.trim() != "binary_little_endian 1.0" {
				return Err(SpzError::InvalidFormat(format!("unsupported format line: {rest}")));
			}
			saw_format = true;
			continue;
		}
		if let Some(rest) = line.strip_prefix("element vertex ") {
			let n: u32 = rest
				.trim()
				.parse()
				.map_err(|_| SpzError::InvalidFormat(format!("bad vertex count: {rest}")))?;

			if n == 0 || n > MAX_PLY_VERTICES {
				return Err(SpzError::InvalidFormat(format!(
					"vertex count {n} outside (0, {MAX_PLY_VERTICES}]"
				)));
			}
			num_vertices = Some(n);
			continue;
		}
		if line.starts_with("element ") {
			// Non-vertex elements (e.g. face) are tolerated but not parsed further.
			continue;
		}
		if let Some(rest) = line.strip_prefix("property float ") {
			names.push(rest.trim().to_string());
			continue;
		}
		if line.starts_with("property ") {
			// Non-float properties on non-vertex elements: ignore.
			continue;
		}
	}

	if !saw_format {
		return Err(SpzError::InvalidFormat("missing format line".to_string()));
	}
	let num_vertices = num_vertices.ok_or_else(|| SpzError::InvalidFormat("missing element vertex".to_string()))?;

	Ok((Header { num_vertices, names }, body_offset))
}

fn sh_rest_count(names: &[String]) -> usize {
	let mut k = 0;

	while names.iter().any(|n| n == &format!("f_rest_{k}")) {
		k += 1;
	}
	k
}

/// Parses a `binary_little_endian 1.0` PLY buffer into a [`Cloud`], mapping
/// properties by name. If `target` is not [`CoordinateSystem::Unspecified`],
/// converts from the PLY convention (RDF) to `target` after decoding.
pub fn decode_ply(bytes: &[u8], target: CoordinateSystem) -> Result<Cloud, SpzError> {
	let (header, body_offset) = parse_header(bytes)?;

	for required in REQUIRED_NAMES {
		if !header.names.iter().any(|n| n == required) {
			return Err(SpzError::InvalidFormat(format!("missing required property {required}")));
		}
	}

	let field_index: std::collections::HashMap<&str, usize> =
		header.names.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

	let k = sh_rest_count(&header.names);
	let sh_dim = k / 3;
	let sh_degree = if sh_dim == 0 { 0 } else { degree_for_dim(sh_dim as u8) };

	let floats_per_vertex = header.names.len();
	let n = header.num_vertices as usize;
	let body = &bytes[body_offset..];
	let needed = n * floats_per_vertex * 4;

	if body.len() < needed {
		return Err(SpzError::InvalidData(format!(
			"expected at least {needed} body bytes, got {}",
			body.len()
		)));
	}

	let mut positions = vec![0_f32; n * 3];
	let mut scales = vec![0_f32; n * 3];
	let mut rotations = vec![0_f32; n * 4];
	let mut alphas = vec![0_f32; n];
	let mut colors = vec![0_f32; n * 3];
	let mut sh = vec![0_f32; n * sh_dim * 3];

	let idx = |name: &str| field_index[name];
	let rest_indices: Vec<usize> = (0..k).map(|i| field_index[&format!("f_rest_{i}")[..]]).collect();

	for v in 0..n {
		let base = body[v * floats_per_vertex * 4..(v + 1) * floats_per_vertex * 4].as_ref();
		let read = |field: usize| -> f32 {
			let off = field * 4;

			f32::from_le_bytes(base[off..off + 4].try_into().unwrap())
		};

		positions[v * 3] = read(idx("x"));
		positions[v * 3 + 1] = read(idx("y"));
		positions[v * 3 + 2] = read(idx("z"));

		scales[v * 3] = read(idx("scale_0"));
		scales[v * 3 + 1] = read(idx("scale_1"));
		scales[v * 3 + 2] = read(idx("scale_2"));

		rotations[v * 4] = read(idx("rot_1"));
		rotations[v * 4 + 1] = read(idx("rot_2"));
		rotations[v * 4 + 2] = read(idx("rot_3"));
		rotations[v * 4 + 3] = read(idx("rot_0"));

		alphas[v] = read(idx("opacity"));

		colors[v * 3] = read(idx("f_dc_0"));
		colors[v * 3 + 1] = read(idx("f_dc_1"));
		colors[v * 3 + 2] = read(idx("f_dc_2"));

		// PLY stores SH channel-major (R block, then G, then B); the
		// internal layout is coefficient-major with channel inner.
		if sh_dim > 0 {
			let out_base = v * sh_dim * 3;

			for c in 0..sh_dim {
				for channel in 0..3 {
					let rest_idx = channel * sh_dim + c;
					let value = read(rest_indices[rest_idx]);

					sh[out_base + c * 3 + channel] = value;
				}
			}
		}
	}

	let mut cloud = Cloud {
		num_points: header.num_vertices,
		sh_degree,
		antialiased: false,
		positions,
		scales,
		rotations,
		alphas,
		colors,
		sh,
	};

	if !matches!(target, CoordinateSystem::Unspecified) {
		cloud.convert_coordinates(CoordinateSystem::RightDownFront, target);
	}

	Ok(cloud)
}

/// Serializes a cloud to `binary_little_endian 1.0` PLY, converting from
/// `source` to the PLY convention (RDF) first if `source` is specified.
pub fn encode_ply(cloud: &Cloud, source: CoordinateSystem) -> Result<Vec<u8>, SpzError> {
	cloud.check_sizes()?;

	let mut cloud = cloud.clone();

	if !matches!(source, CoordinateSystem::Unspecified) {
		cloud.convert_coordinates(source, CoordinateSystem::RightDownFront);
	}

	let sh_dim = dim_for_degree(cloud.sh_degree) as usize;
	let n = cloud.num_points as usize;

	let mut out = Vec::with_capacity(256 + n * (17 + 3 * sh_dim) * 4);

	writeln!(out, "ply").unwrap();
	writeln!(out, "format binary_little_endian 1.0").unwrap();
	writeln!(out, "element vertex {n}").unwrap();
	writeln!(out, "property float x").unwrap();
	writeln!(out, "property float y").unwrap();
	writeln!(out, "property float z").unwrap();
	writeln!(out, "property float nx").unwrap();
	writeln!(out, "property float ny").unwrap();
	writeln!(out, "property float nz").unwrap();
	writeln!(out, "property float f_dc_0").unwrap();
	writeln!(out, "property float f_dc_1").unwrap();
	writeln!(out, "property float f_dc_2").unwrap();
	for channel in 0..3 {
		for c in 0..sh_dim {
			writeln!(out, "property float f_rest_{}", channel * sh_dim + c).unwrap();
		}
	}
	writeln!(out, "property float opacity").unwrap();
	writeln!(out, "property float scale_0").unwrap();
	writeln!(out, "property float scale_1").unwrap();
	writeln!(out, "property float scale_2").unwrap();
	writeln!(out, "property float rot_0").unwrap();
	writeln!(out, "property float rot_1").unwrap();
	writeln!(out, "property float rot_2").unwrap();
	writeln!(out, "property float rot_3").unwrap();
	writeln!(out, "end_header").unwrap();

	for v in 0..n {
		out.extend_from_slice(&cloud.positions[v * 3].to_le_bytes());
		out.extend_from_slice(&cloud.positions[v * 3 + 1].to_le_bytes());
		out.extend_from_slice(&cloud.positions[v * 3 + 2].to_le_bytes());
		out.extend_from_slice(&0.0_f32.to_le_bytes());
		out.extend_from_slice(&0.0_f32.to_le_bytes());
		out.extend_from_slice(&0.0_f32.to_le_bytes());
		out.extend_from_slice(&cloud.colors[v * 3].to_le_bytes());
		out.extend_from_slice(&cloud.colors[v * 3 + 1].to_le_bytes());
		out.extend_from_slice(&cloud.colors[v * 3 + 2].to_le_bytes());

		for channel in 0..3 {
			for c in 0..sh_dim {
				let value = cloud.sh[v * sh_dim * 3 + c * 3 + channel];

				out.extend_from_slice(&value.to_le_bytes());
			}
		}

		out.extend_from_slice(&cloud.alphas[v].to_le_bytes());
		out.extend_from_slice(&cloud.scales[v * 3].to_le_bytes());
		out.extend_from_slice(&cloud.scales[v * 3 + 1].to_le_bytes());
		out.extend_from_slice(&cloud.scales[v * 3 + 2].to_le_bytes());
		out.extend_from_slice(&cloud.rotations[v * 4 + 3].to_le_bytes()); // rot_0 = w
		out.extend_from_slice(&cloud.rotations[v * 4].to_le_bytes()); // rot_1 = x
		out.extend_from_slice(&cloud.rotations[v * 4 + 1].to_le_bytes()); // rot_2 = y
		out.extend_from_slice(&cloud.rotations[v * 4 + 2].to_le_bytes()); // rot_3 = z
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn header_with(extra_props: &str, n: u32) -> Vec<u8> {
		format!(
			"ply\nformat binary_little_endian 1.0\nelement vertex {n}\nproperty float x\nproperty float y\nproperty float z\nproperty float nx\nproperty float ny\nproperty float nz\nproperty float f_dc_0\nproperty float f_dc_1\nproperty float f_dc_2\n{extra_props}property float opacity\nproperty float scale_0\nproperty float scale_1\nproperty float scale_2\nproperty float rot_0\nproperty float rot_1\nproperty float rot_2\nproperty float rot_3\nend_header\n"
		)
		.into_bytes()
	}

	fn push_f32s(buf: &mut Vec<u8>, values: &[f32]) {
		for v in values {
			buf.extend_from_slice(&v.to_le_bytes());
		}
	}

	#[test]
	fn test_e4_no_sh_roundtrip() {
		let mut bytes = header_with("", 1);

		push_f32s(&mut bytes, &[1.0, 2.0, 3.0]); // xyz
		push_f32s(&mut bytes, &[0.0, 0.0, 0.0]); // normal
		push_f32s(&mut bytes, &[0.4, 0.5, 0.6]); // f_dc
		push_f32s(&mut bytes, &[0.9]); // opacity
		push_f32s(&mut bytes, &[0.1, 0.1, 0.1]); // scale
		push_f32s(&mut bytes, &[1.0, 0.1, 0.2, 0.3]); // rot_0..3 = w,x,y,z

		let cloud = decode_ply(&bytes, CoordinateSystem::Unspecified).unwrap();

		assert_eq!(cloud.sh_degree, 0);
		assert!(cloud.sh.is_empty());
		assert_eq!(&cloud.rotations[0..4], &[0.1, 0.2, 0.3, 1.0]);
	}

	#[test]
	fn test_missing_required_property_is_invalid_format() {
		let header = "ply\nformat binary_little_endian 1.0\nelement vertex 1\nproperty float x\nend_header\n";

		assert!(matches!(
			decode_ply(header.as_bytes(), CoordinateSystem::Unspecified),
			Err(SpzError::InvalidFormat(_))
		));
	}

	#[test]
	fn test_rejects_ascii_format() {
		let header = "ply\nformat ascii 1.0\nelement vertex 1\nend_header\n";

		assert!(matches!(
			decode_ply(header.as_bytes(), CoordinateSystem::Unspecified),
			Err(SpzError::InvalidFormat(_))
		));
	}

	#[test]
	fn test_rejects_out_of_range_vertex_count() {
		let header = header_with("", 0);

		assert!(matches!(
			decode_ply(&header, CoordinateSystem::Unspecified),
			Err(SpzError::InvalidFormat(_))
		));
	}

	#[test]
	fn test_encode_decode_roundtrip_with_sh() {
		let cloud = Cloud {
			num_points: 2,
			sh_degree: 1,
			antialiased: false,
			positions: vec![1.0, 2.0, 3.0, -1.0, -2.0, -3.0],
			scales: vec![0.1; 6],
			rotations: vec![0.0, 0.0, 0.0, 1.0, 0.1, 0.2, 0.3, 0.9],
			alphas: vec![0.5, -0.5],
			colors: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
			sh: (0..18).map(|i| i as f32 * 0.01).collect(),
		};

		let bytes = encode_ply(&cloud, CoordinateSystem::Unspecified).unwrap();
		let back = decode_ply(&bytes, CoordinateSystem::Unspecified).unwrap();

		assert_eq!(back.num_points, cloud.num_points);
		assert_eq!(back.sh_degree, cloud.sh_degree);
		assert_eq!(back.positions, cloud.positions);
		assert_eq!(back.sh, cloud.sh);
		assert_eq!(back.rotations, cloud.rotations);
	}
}
