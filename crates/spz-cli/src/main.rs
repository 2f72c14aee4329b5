// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use spz::prelude::*;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// CLI for SPZ (Gaussian Splat) files.
#[derive(Parser, Debug)]
#[command(name = "spz")]
#[command(author, version, about, long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Print metadata about a cloud: point count, SH degree, antialiasing,
	/// and median splat volume.
	Info {
		/// Path to an .spz or .ply file.
		path: PathBuf,
	},
	/// Convert between .spz and .ply, picking each side's codec from its
	/// file extension.
	Convert {
		/// Input file.
		input: PathBuf,
		/// Output file.
		output: PathBuf,
	},
}

fn main() -> ExitCode {
	match run() {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("error: {err:#}");

			ExitCode::FAILURE
		},
	}
}

fn run() -> Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Info { path } => cmd_info(&path),
		Commands::Convert { input, output } => cmd_convert(&input, &output),
	}
}

fn is_ply(path: &Path) -> bool {
	path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case(spz::consts::PLY_EXTENSION)) == Some(true)
}

fn load_cloud(path: &Path) -> Result<Cloud> {
	let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

	if is_ply(path) {
		decode_ply(&bytes, CoordinateSystem::Unspecified).with_context(|| format!("decoding PLY {}", path.display()))
	} else {
		decode_spz(&bytes, CoordinateSystem::Unspecified).with_context(|| format!("decoding SPZ {}", path.display()))
	}
}

fn cmd_info(path: &Path) -> Result<()> {
	let cloud = load_cloud(path)?;

	println!("num_points:   {}", cloud.num_points);
	println!("sh_degree:    {}", cloud.sh_degree);
	println!("antialiased:  {}", cloud.antialiased);
	println!("median_volume: {}", cloud.median_volume());

	Ok(())
}

fn cmd_convert(input: &Path, output: &Path) -> Result<()> {
	let cloud = load_cloud(input)?;

	let bytes = if is_ply(output) {
		encode_ply(&cloud, CoordinateSystem::Unspecified).context("encoding PLY")?
	} else {
		encode_spz(&cloud, CoordinateSystem::Unspecified).context("encoding SPZ")?
	};

	std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;

	Ok(())
}
