mod config;
mod domain;
mod error;
mod logging;
mod session;
mod temporal;
mod tracker;
mod ui;
mod view;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::warn;

use crate::config::{load_settings, resolve_config_path, Settings};
use crate::logging::{default_log_level, init_logging};
use crate::tracker::Tracker;
use crate::ui::run_dashboard;
use crate::view::FilterMode;

#[derive(Debug, Parser)]
#[command(name = "event-tracker", about = "Terminal calendar for personal single-day events")]
struct Cli {
	#[arg(long)]
	config: Option<PathBuf>,
	#[arg(long)]
	log_level: Option<String>,
	/// Initial filter; overrides `default_filter` from the settings file.
	#[arg(long, value_enum)]
	filter: Option<FilterMode>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	/// Print the effective settings.
	Config {
		#[arg(long)]
		json: bool,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let config_path = resolve_config_path(cli.config);
	let settings = load_settings(&config_path)?;

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Config { json } => {
			print_settings(&settings, json)?;
		}
		Command::Dashboard => {
			let level = cli
				.log_level
				.or_else(|| settings.log.level.clone())
				.unwrap_or_else(|| default_log_level().to_string());
			if let Err(err) = init_logging(&level, &settings.log_dir()) {
				eprintln!("warning: file logging disabled: {err}");
			}
			if !config_path.exists() {
				warn!("event=settings_missing path={} using=defaults", config_path.display());
			}

			let filter = cli.filter.unwrap_or(settings.default_filter);
			let mut tracker = Tracker::new(filter, settings.palette.clone(), settings.slot_time()?);
			run_dashboard(&mut tracker)?;
		}
	}

	Ok(())
}

fn print_settings(settings: &Settings, json: bool) -> Result<(), Box<dyn Error>> {
	if json {
		println!("{}", settings.to_json()?);
	} else {
		print!("{}", settings.to_toml()?);
	}
	Ok(())
}
