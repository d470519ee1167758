//! Named auth-state persistence.
//!
//! One JSON file per name under the auth directory, holding a
//! [`StorageState`] (cookies plus per-origin localStorage). The browser
//! side of save/restore lives in [`crate::session`]; this module only owns
//! the files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use roost_protocol::StorageState;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct AuthStateManager {
	dir: PathBuf,
}

impl AuthStateManager {
	pub fn new(dir: PathBuf) -> Self {
		Self { dir }
	}

	/// Path for a named state file.
	pub fn state_path(&self, name: &str) -> Result<PathBuf> {
		validate_name(name)?;
		Ok(self.dir.join(format!("{name}.json")))
	}

	/// Persists a storage state under `name`, overwriting any previous one.
	pub fn save(&self, name: &str, state: &StorageState) -> Result<PathBuf> {
		let path = self.state_path(name)?;
		fs::create_dir_all(&self.dir)?;
		let content = serde_json::to_string_pretty(state)?;
		fs::write(&path, content)?;
		info!(
			target = "roost.auth",
			name,
			cookies = state.cookies.len(),
			origins = state.origins.len(),
			"auth state saved"
		);
		Ok(path)
	}

	/// Loads a named storage state; unknown names are a `NotFound`.
	pub fn load(&self, name: &str) -> Result<StorageState> {
		let path = self.state_path(name)?;
		let content = match fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				return Err(Error::NotFound(format!("no auth state named {name:?}")));
			}
			Err(err) => return Err(Error::Io(err)),
		};
		Ok(serde_json::from_str(&content)?)
	}
}

/// Names become file names; keep them to a safe alphabet.
fn validate_name(name: &str) -> Result<()> {
	let ok = !name.is_empty()
		&& name
			.chars()
			.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
	if ok && !name.starts_with('.') {
		Ok(())
	} else {
		Err(Error::InvalidRequest(format!(
			"auth state name must be alphanumeric/dash/underscore, got {name:?}"
		)))
	}
}

#[cfg(test)]
mod tests {
	use tempfile::tempdir;

	use roost_protocol::Cookie;

	use super::*;

	#[test]
	fn save_load_roundtrip_preserves_cookies() {
		let dir = tempdir().unwrap();
		let manager = AuthStateManager::new(dir.path().join("auth"));

		let state = StorageState::with_cookies(vec![
			Cookie::new("session", "abc123", ".example.com").http_only(true),
			Cookie::new("theme", "dark", "example.com"),
		]);
		manager.save("staging", &state).unwrap();

		let loaded = manager.load("staging").unwrap();
		assert_eq!(loaded.cookies.len(), 2);
		assert_eq!(loaded.cookies[0].name, "session");
		assert_eq!(loaded.cookies[0].http_only, Some(true));
	}

	#[test]
	fn unknown_name_is_not_found() {
		let dir = tempdir().unwrap();
		let manager = AuthStateManager::new(dir.path().to_path_buf());
		let err = manager.load("missing").unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[test]
	fn path_traversal_names_are_rejected() {
		let dir = tempdir().unwrap();
		let manager = AuthStateManager::new(dir.path().to_path_buf());
		assert!(manager.state_path("../escape").is_err());
		assert!(manager.state_path("a/b").is_err());
		assert!(manager.state_path("").is_err());
		assert!(manager.state_path(".hidden").is_err());
	}
}
