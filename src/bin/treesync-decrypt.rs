use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use treesync::decrypt::{check_output_outside, prompt_secret, DecryptPipeline, GpgDecryptor};
use treesync::logging::*;
use treesync::validation::{resolve_path, Validator};
use treesync::{Config, TreeWalker};

fn cli() -> Command {
	Command::new("treesync-decrypt")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Recursively decrypt GPG files and unpack archives into an output tree")
		.arg(
			Arg::new("base_dir")
				.required(true)
				.value_parser(value_parser!(PathBuf))
				.help("Directory holding the encrypted tree"),
		)
		.arg(
			Arg::new("output")
				.short('o')
				.long("output")
				.value_name("DIR")
				.default_value("decrypted")
				.value_parser(value_parser!(PathBuf))
				.help("Output directory"),
		)
		.arg(
			Arg::new("jobs")
				.short('j')
				.long("jobs")
				.value_name("N")
				.value_parser(value_parser!(usize))
				.help("Worker pool size"),
		)
		.arg(Arg::new("verbose").short('v').long("verbose").action(ArgAction::SetTrue))
}

#[tokio::main]
async fn main() -> ExitCode {
	let matches = cli().get_matches();
	init_tracing(matches.get_flag("verbose"));

	let base_dir = match matches.get_one::<PathBuf>("base_dir").map(|p| resolve_path(p)) {
		Some(Ok(dir)) if dir.is_dir() => dir,
		_ => {
			let shown = matches.get_one::<PathBuf>("base_dir").map(|p| p.display().to_string());
			eprintln!("Error: '{}' is not a valid directory.", shown.unwrap_or_default());
			return ExitCode::from(1);
		}
	};
	let output = matches.get_one::<PathBuf>("output").cloned().unwrap_or_else(|| PathBuf::from("decrypted"));

	let mut config = match Config::load(None) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::from(1);
		}
	};
	if let Some(jobs) = matches.get_one::<usize>("jobs") {
		config.jobs = Some(*jobs);
	}
	if let Err(e) = config.validate() {
		eprintln!("{}", e);
		return ExitCode::from(1);
	}

	if let Err(e) = check_output_outside(&base_dir, &output) {
		eprintln!("Error: {}", e);
		return ExitCode::from(1);
	}

	let passphrase = match prompt_secret("GPG password: ") {
		Ok(passphrase) => passphrase,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::from(1);
		}
	};

	if let Err(e) = fs::create_dir_all(&output) {
		eprintln!("Cannot create {}: {}", output.display(), e);
		return ExitCode::from(1);
	}

	let started = Instant::now();
	let pipeline = DecryptPipeline::new(GpgDecryptor::new(passphrase), TreeWalker::from_config(&config));
	match pipeline.run(&base_dir, &output).await {
		Ok(summary) => {
			println!(
				"Processed {} files in {:.2} seconds",
				summary.copied,
				started.elapsed().as_secs_f64()
			);
			ExitCode::SUCCESS
		}
		Err(e) => {
			eprintln!("Error: {}", e);
			ExitCode::from(1)
		}
	}
}

// vim: ts=4
