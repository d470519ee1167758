//! Daemon configuration resolved from environment variables and flags.
//!
//! All of it lands in one [`DaemonConfig`] value that is threaded through
//! daemon startup explicitly; nothing reads the environment after init.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default control API port.
pub const DEFAULT_PORT: u16 = 4724;
/// Default idle shutdown timeout.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);
/// Navigation deadline.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Deadline for interactive operations (click/fill/type).
pub const INTERACTION_TIMEOUT: Duration = Duration::from_secs(10);
/// Soft deadline `login` races against its navigation wait.
pub const LOGIN_NAVIGATION_WAIT: Duration = Duration::from_secs(10);
/// Settle delay after a navigation reports complete.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);
/// Grace delay between a `/stop` response and process shutdown.
pub const STOP_GRACE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct DaemonConfig {
	/// Loopback port the control API listens on.
	pub port: u16,
	/// Whether the browser runs headless.
	pub headless: bool,
	/// Idle window after which the daemon shuts itself down.
	pub idle_timeout: Duration,
	/// Root directory for the descriptor, auth states, and screenshots.
	pub state_dir: PathBuf,
}

impl DaemonConfig {
	/// Resolves configuration from `ROOST_*` environment variables, with an
	/// optional port override from the command line.
	pub fn from_env(port_override: Option<u16>) -> Result<Self> {
		let port = match port_override {
			Some(p) => p,
			None => match std::env::var("ROOST_PORT") {
				Ok(raw) => raw.parse::<u16>().map_err(|_| {
					Error::Configuration(format!("ROOST_PORT is not a valid port: {raw}"))
				})?,
				Err(_) => DEFAULT_PORT,
			},
		};

		let headless = std::env::var("ROOST_HEADLESS")
			.map(|raw| parse_bool(&raw))
			.unwrap_or(true);

		let idle_timeout = match std::env::var("ROOST_IDLE_TIMEOUT_SECS") {
			Ok(raw) => {
				let secs = raw.parse::<u64>().map_err(|_| {
					Error::Configuration(format!(
						"ROOST_IDLE_TIMEOUT_SECS is not a valid duration: {raw}"
					))
				})?;
				Duration::from_secs(secs)
			}
			Err(_) => DEFAULT_IDLE_TIMEOUT,
		};

		let state_dir = match std::env::var("ROOST_STATE_DIR") {
			Ok(raw) => PathBuf::from(raw),
			Err(_) => default_state_dir(),
		};

		Ok(Self {
			port,
			headless,
			idle_timeout,
			state_dir,
		})
	}

	/// Path of the session descriptor file.
	pub fn descriptor_path(&self) -> PathBuf {
		self.state_dir.join("session.json")
	}

	/// Directory holding named auth-state files.
	pub fn auth_dir(&self) -> PathBuf {
		self.state_dir.join("auth")
	}

	/// Directory screenshots default into.
	pub fn screenshots_dir(&self) -> PathBuf {
		self.state_dir.join("screenshots")
	}
}

/// State directory used when `ROOST_STATE_DIR` is unset.
pub fn default_state_dir() -> PathBuf {
	dirs::data_local_dir()
		.unwrap_or_else(std::env::temp_dir)
		.join("roost")
}

fn parse_bool(raw: &str) -> bool {
	!matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_bool_accepts_common_spellings() {
		assert!(parse_bool("1"));
		assert!(parse_bool("true"));
		assert!(parse_bool("TRUE"));
		assert!(!parse_bool("0"));
		assert!(!parse_bool("false"));
		assert!(!parse_bool("off"));
	}

	#[test]
	fn derived_paths_hang_off_state_dir() {
		let config = DaemonConfig {
			port: DEFAULT_PORT,
			headless: true,
			idle_timeout: DEFAULT_IDLE_TIMEOUT,
			state_dir: PathBuf::from("/tmp/roost-test"),
		};
		assert_eq!(config.descriptor_path(), PathBuf::from("/tmp/roost-test/session.json"));
		assert_eq!(config.auth_dir(), PathBuf::from("/tmp/roost-test/auth"));
	}
}
