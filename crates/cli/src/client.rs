//! The control client: health probing, daemon spawning, request plumbing.
//!
//! A persisted descriptor is never trusted on its own — only a live
//! `/health` probe against the recorded port proves a daemon is there. A
//! descriptor whose port does not answer is stale (daemon killed
//! externally) and is removed before a replacement is spawned, so a dead
//! file can never deadlock new clients.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use roost_core::persist;
use roost_protocol::{Envelope, ErrorBody, ErrorCode};

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const SPAWN_POLL_INTERVAL: Duration = Duration::from_millis(300);
const SPAWN_POLL_ATTEMPTS: u32 = 40;

#[derive(Debug, Error)]
pub enum ClientError {
	/// The daemon answered with a failure envelope; the message is
	/// surfaced verbatim.
	#[error("{message}")]
	Daemon { code: ErrorCode, message: String },

	#[error("failed to spawn daemon: {0}")]
	SpawnFailed(String),

	#[error("daemon exited during startup ({0}); check `roost -v daemon run` for details")]
	StartupExit(String),

	#[error("daemon did not become healthy after {attempts} probes; it may be slow to start")]
	StartupTimeout { attempts: u32 },

	#[error("request failed: {0}")]
	Http(#[from] reqwest::Error),

	#[error("malformed daemon response: {0}")]
	Protocol(String),
}

impl ClientError {
	pub fn code(&self) -> ErrorCode {
		match self {
			ClientError::Daemon { code, .. } => *code,
			_ => ErrorCode::InternalError,
		}
	}
}

/// State directory shared with the daemon (`ROOST_STATE_DIR` override).
pub fn state_dir() -> PathBuf {
	std::env::var("ROOST_STATE_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|_| roost_core::config::default_state_dir())
}

pub fn descriptor_path() -> PathBuf {
	state_dir().join("session.json")
}

/// Port resolution order: explicit flag, `ROOST_PORT`, a persisted
/// descriptor, then the default.
pub fn resolve_port(flag: Option<u16>) -> u16 {
	if let Some(port) = flag {
		return port;
	}
	if let Ok(raw) = std::env::var("ROOST_PORT") {
		if let Ok(port) = raw.parse() {
			return port;
		}
	}
	if let Some(descriptor) = persist::read_descriptor(&descriptor_path()) {
		return descriptor.port;
	}
	roost_core::config::DEFAULT_PORT
}

pub struct ControlClient {
	port: u16,
	http: reqwest::Client,
}

impl ControlClient {
	pub fn new(port: u16) -> Result<Self, ClientError> {
		let http = reqwest::Client::builder()
			.no_proxy()
			.timeout(REQUEST_TIMEOUT)
			.build()?;
		Ok(Self { port, http })
	}

	fn url(&self, path: &str) -> String {
		format!("http://127.0.0.1:{}{}", self.port, path)
	}

	/// `true` only when a daemon answers `/health` on the resolved port.
	pub async fn probe_health(&self) -> bool {
		self.http
			.get(self.url("/health"))
			.timeout(PROBE_TIMEOUT)
			.send()
			.await
			.map(|response| response.status().is_success())
			.unwrap_or(false)
	}

	/// Ensures a live daemon: probe, clear any stale descriptor, spawn a
	/// detached daemon process, then poll health under a bounded budget.
	pub async fn ensure_server(&self) -> Result<(), ClientError> {
		if self.probe_health().await {
			return Ok(());
		}

		let path = descriptor_path();
		if persist::read_descriptor(&path).is_some() {
			info!(
				target = "roost.client",
				path = %path.display(),
				"descriptor did not answer health probe; removing stale descriptor"
			);
			persist::remove_descriptor(&path);
		}

		let exe = std::env::current_exe()
			.map_err(|err| ClientError::SpawnFailed(format!("cannot locate executable: {err}")))?;
		debug!(target = "roost.client", exe = %exe.display(), port = self.port, "spawning daemon");
		let mut child = std::process::Command::new(&exe)
			.arg("--port")
			.arg(self.port.to_string())
			.arg("daemon")
			.arg("run")
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.spawn()
			.map_err(|err| ClientError::SpawnFailed(err.to_string()))?;

		for _ in 0..SPAWN_POLL_ATTEMPTS {
			tokio::time::sleep(SPAWN_POLL_INTERVAL).await;
			if self.probe_health().await {
				return Ok(());
			}
			// A dead child is a spawn failure, not a slow start.
			if let Ok(Some(status)) = child.try_wait() {
				return Err(ClientError::StartupExit(status.to_string()));
			}
		}
		Err(ClientError::StartupTimeout {
			attempts: SPAWN_POLL_ATTEMPTS,
		})
	}

	pub async fn get(
		&self,
		path: &str,
		query: &[(&str, &str)],
	) -> Result<serde_json::Value, ClientError> {
		self.request(self.http.get(self.url(path)).query(query)).await
	}

	pub async fn post(
		&self,
		path: &str,
		body: &impl Serialize,
	) -> Result<serde_json::Value, ClientError> {
		self.request(self.http.post(self.url(path)).json(body)).await
	}

	async fn request(
		&self,
		builder: reqwest::RequestBuilder,
	) -> Result<serde_json::Value, ClientError> {
		let response = builder.send().await?;
		let envelope: Envelope<serde_json::Value> = response
			.json()
			.await
			.map_err(|err| ClientError::Protocol(err.to_string()))?;
		if envelope.success {
			Ok(envelope.data.unwrap_or(serde_json::Value::Null))
		} else {
			let ErrorBody { code, message } = envelope.error.unwrap_or(ErrorBody {
				code: ErrorCode::InternalError,
				message: "daemon returned a failure with no error body".into(),
			});
			Err(ClientError::Daemon { code, message })
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn explicit_port_flag_wins() {
		assert_eq!(resolve_port(Some(9123)), 9123);
	}

	#[test]
	fn daemon_error_displays_message_verbatim() {
		let err = ClientError::Daemon {
			code: ErrorCode::NavigationError,
			message: "navigation to https://x failed: timed out".into(),
		};
		assert_eq!(err.to_string(), "navigation to https://x failed: timed out");
		assert_eq!(err.code(), ErrorCode::NavigationError);
	}
}
