use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use treesync::logging::*;
use treesync::{Config, ExecutionMode, Orchestrator, StdoutSink, SyncOptions};

fn cli() -> Command {
	Command::new("treesync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("One-way content-addressed directory sync (dry-run unless --force)")
		.arg(Arg::new("start").required(true).value_parser(value_parser!(PathBuf)).help("Source tree"))
		.arg(
			Arg::new("target")
				.required(true)
				.value_parser(value_parser!(PathBuf))
				.help("Destination; the source lands in target/<basename(start)>"),
		)
		.arg(
			Arg::new("copy")
				.short('c')
				.long("copy")
				.action(ArgAction::SetTrue)
				.help("Copy new and changed files"),
		)
		.arg(
			Arg::new("delete")
				.short('D')
				.long("delete")
				.action(ArgAction::SetTrue)
				.help("Delete destination files missing from the source"),
		)
		.arg(
			Arg::new("force")
				.short('f')
				.long("force")
				.action(ArgAction::SetTrue)
				.help("Really modify the filesystem"),
		)
		.arg(
			Arg::new("dryrun")
				.long("dryrun")
				.action(ArgAction::SetTrue)
				.conflicts_with("force")
				.help("Only report what would be done (default)"),
		)
		.arg(
			Arg::new("jobs")
				.short('j')
				.long("jobs")
				.value_name("N")
				.value_parser(value_parser!(usize))
				.help("Worker pool size"),
		)
		.arg(
			Arg::new("config")
				.long("config")
				.value_name("PATH")
				.value_parser(value_parser!(PathBuf))
				.help("Config file (.toml, .json or .json5)"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Debug diagnostics on stderr"),
		)
}

fn options(matches: &ArgMatches) -> Option<SyncOptions> {
	let start = matches.get_one::<PathBuf>("start")?;
	let target = matches.get_one::<PathBuf>("target")?;
	Some(
		SyncOptions::new(start, target)
			.copy(matches.get_flag("copy"))
			.delete(matches.get_flag("delete"))
			.mode(ExecutionMode::from_force(matches.get_flag("force"))),
	)
}

#[tokio::main]
async fn main() -> ExitCode {
	let matches = cli().get_matches();
	init_tracing(matches.get_flag("verbose"));

	let mut config = match Config::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path)) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("{}", e);
			return ExitCode::from(1);
		}
	};
	if let Some(jobs) = matches.get_one::<usize>("jobs") {
		config.jobs = Some(*jobs);
	}

	let options = match options(&matches) {
		Some(options) => options,
		None => {
			eprintln!("Needs start and target locations");
			return ExitCode::from(2);
		}
	};

	let orchestrator = Orchestrator::new(config, Arc::new(StdoutSink));
	match orchestrator.run(&options).await {
		Ok(report) => {
			debug!("{:?}", report);
			ExitCode::SUCCESS
		}
		Err(e) => {
			// Validation and worker failures alike; tracing may be filtered off
			eprintln!("{}", e);
			ExitCode::from(1)
		}
	}
}


// vim: ts=4
