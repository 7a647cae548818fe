use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::view::{FilterMode, Palette};

const APP_DIR: &str = "event_tracker";
const CONFIG_FILE: &str = "config.toml";
const SLOT_TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub default_filter: FilterMode,
	/// Time-of-day given to events created from a day slot.
	pub slot_time: String,
	pub palette: Palette,
	pub log: LogSettings,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			default_filter: FilterMode::All,
			slot_time: "00:00".to_string(),
			palette: Palette::default(),
			log: LogSettings::default(),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub level: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dir: Option<PathBuf>,
}

impl Settings {
	pub fn slot_time(&self) -> Result<NaiveTime, ConfigError> {
		NaiveTime::parse_from_str(self.slot_time.trim(), SLOT_TIME_FORMAT)
			.map_err(|_| ConfigError::InvalidSlotTime(self.slot_time.clone()))
	}

	pub fn log_dir(&self) -> PathBuf {
		self.log
			.dir
			.clone()
			.unwrap_or_else(|| state_dir().join("logs"))
	}

	pub fn to_toml(&self) -> Result<String, ConfigError> {
		Ok(toml::to_string_pretty(self)?)
	}

	pub fn to_json(&self) -> Result<String, ConfigError> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}

/// Loads settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
		Err(err) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source: err,
			});
		}
	};

	let settings: Settings = toml::from_str(&raw)?;
	settings.slot_time()?;
	Ok(settings)
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> PathBuf {
	if let Some(path) = cli_path {
		return path;
	}

	if let Some(path) = env::var_os("EVENT_TRACKER_CONFIG") {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return path;
		}
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join(APP_DIR).join(CONFIG_FILE);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join(APP_DIR).join(CONFIG_FILE);
	}

	PathBuf::from(CONFIG_FILE)
}

fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os("EVENT_TRACKER_STATE_DIR") {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".local").join("state").join(APP_DIR);
	}

	env::temp_dir().join(APP_DIR)
}

#[cfg(test)]
mod tests {
	use std::fs;
	use std::path::PathBuf;

	use chrono::NaiveTime;

	use super::{Settings, load_settings, resolve_config_path};
	use crate::error::ConfigError;
	use crate::view::{FilterMode, Rgb};

	fn temp_file(name: &str) -> PathBuf {
		let mut path = std::env::temp_dir();
		path.push(format!("{}_{}", name, std::process::id()));
		path
	}

	#[test]
	fn missing_file_yields_defaults() {
		let path = temp_file("event_tracker_missing.toml");
		let _ = fs::remove_file(&path);
		let settings = load_settings(&path).expect("defaults should load");
		assert_eq!(settings, Settings::default());
		assert_eq!(
			settings.slot_time().expect("default slot time"),
			NaiveTime::from_hms_opt(0, 0, 0).expect("midnight")
		);
	}

	#[test]
	fn reads_partial_settings() {
		let path = temp_file("event_tracker_partial.toml");
		fs::write(
			&path,
			"default_filter = \"upcoming\"\nslot_time = \"09:30\"\n\n[palette]\npast = [10, 20, 30]\n",
		)
		.expect("write settings");

		let settings = load_settings(&path).expect("settings should load");
		assert_eq!(settings.default_filter, FilterMode::Upcoming);
		assert_eq!(
			settings.slot_time().expect("slot time"),
			NaiveTime::from_hms_opt(9, 30, 0).expect("valid time")
		);
		assert_eq!(settings.palette.past, Rgb(10, 20, 30));
		assert_eq!(settings.palette.upcoming, Rgb(140, 189, 76));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn rejects_malformed_slot_time() {
		let path = temp_file("event_tracker_bad_slot.toml");
		fs::write(&path, "slot_time = \"noon\"\n").expect("write settings");

		let result = load_settings(&path);
		assert!(matches!(result, Err(ConfigError::InvalidSlotTime(value)) if value == "noon"));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn rejects_unknown_filter_mode() {
		let path = temp_file("event_tracker_bad_filter.toml");
		fs::write(&path, "default_filter = \"someday\"\n").expect("write settings");

		assert!(matches!(load_settings(&path), Err(ConfigError::TomlDecode(_))));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn encoded_settings_load_back() {
		let settings = Settings {
			default_filter: FilterMode::Past,
			..Settings::default()
		};
		let path = temp_file("event_tracker_encoded.toml");
		fs::write(&path, settings.to_toml().expect("encode")).expect("write settings");

		assert_eq!(load_settings(&path).expect("settings should load"), settings);
		assert!(settings.to_json().expect("encode json").contains("\"default_filter\": \"past\""));
		let _ = fs::remove_file(path);
	}

	#[test]
	fn cli_path_wins() {
		let path = PathBuf::from("/tmp/custom.toml");
		assert_eq!(resolve_config_path(Some(path.clone())), path);
	}
}
