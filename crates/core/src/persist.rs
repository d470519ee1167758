//! Session descriptor persistence.
//!
//! The descriptor makes a running daemon discoverable without a registry
//! service. It is written on startup, overwritten after every successful
//! navigation, and removed on clean shutdown. Consumers must health-probe
//! the recorded port before trusting it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use roost_protocol::SessionDescriptor;

use crate::error::Result;

/// Reads a descriptor, returning `None` when the file is absent or no
/// longer parseable (a corrupt descriptor is as good as none).
pub fn read_descriptor(path: &Path) -> Option<SessionDescriptor> {
	let content = fs::read_to_string(path).ok()?;
	match serde_json::from_str(&content) {
		Ok(descriptor) => Some(descriptor),
		Err(err) => {
			debug!(target = "roost.session", path = %path.display(), error = %err, "discarding unparseable session descriptor");
			None
		}
	}
}

/// Removes a descriptor file. Missing files are not an error.
pub fn remove_descriptor(path: &Path) -> bool {
	fs::remove_file(path).is_ok()
}

/// Writer handle owned by the daemon.
#[derive(Debug, Clone)]
pub struct SessionPersister {
	path: PathBuf,
}

impl SessionPersister {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes the descriptor, creating parent directories as needed.
	pub fn write(&self, descriptor: &SessionDescriptor) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		let content = serde_json::to_string_pretty(descriptor)?;
		fs::write(&self.path, content)?;
		debug!(
			target = "roost.session",
			path = %self.path.display(),
			port = descriptor.port,
			url = ?descriptor.current_url,
			"session descriptor written"
		);
		Ok(())
	}

	/// Removes the descriptor on clean shutdown.
	pub fn remove(&self) {
		if remove_descriptor(&self.path) {
			debug!(target = "roost.session", path = %self.path.display(), "session descriptor removed");
		}
	}
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use super::*;

	fn descriptor(port: u16) -> SessionDescriptor {
		SessionDescriptor {
			pid: std::process::id(),
			port,
			started_at: 1700000000,
			current_url: None,
		}
	}

	#[test]
	fn write_read_remove_roundtrip() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("state").join("session.json");
		let persister = SessionPersister::new(path.clone());

		persister.write(&descriptor(4724)).unwrap();
		let loaded = read_descriptor(&path).unwrap();
		assert_eq!(loaded.port, 4724);

		persister.remove();
		assert!(read_descriptor(&path).is_none());
		assert!(!path.exists());
	}

	#[test]
	fn unparseable_descriptor_reads_as_none() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("session.json");
		fs::write(&path, "{not json").unwrap();
		assert!(read_descriptor(&path).is_none());
	}

	#[test]
	fn overwrite_updates_current_url() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("session.json");
		let persister = SessionPersister::new(path.clone());

		persister.write(&descriptor(1)).unwrap();
		let mut updated = descriptor(1);
		updated.current_url = Some("https://example.com".into());
		persister.write(&updated).unwrap();

		assert_eq!(
			read_descriptor(&path).unwrap().current_url.as_deref(),
			Some("https://example.com")
		);
	}
}
