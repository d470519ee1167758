//! Cookie and storage state types for persisted auth sessions.
//!
//! These represent browser cookies and localStorage data that can be saved
//! under a name and restored into a fresh browsing context, persisting
//! authentication across daemon restarts.

use serde::{Deserialize, Serialize};

/// SameSite cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SameSite {
	/// Cookie is sent with same-site and cross-site requests
	#[serde(rename = "None")]
	None,
	/// Cookie is sent with same-site requests and cross-site top-level navigations
	#[default]
	#[serde(rename = "Lax")]
	Lax,
	/// Cookie is only sent with same-site requests
	#[serde(rename = "Strict")]
	Strict,
}

/// A browser cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	/// Cookie name
	pub name: String,

	/// Cookie value
	pub value: String,

	/// Domain for the cookie
	#[serde(skip_serializing_if = "Option::is_none")]
	pub domain: Option<String>,

	/// Path for the cookie
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,

	/// Unix timestamp in seconds (-1 means session cookie)
	#[serde(skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,

	/// Whether the cookie is HTTP-only
	#[serde(skip_serializing_if = "Option::is_none")]
	pub http_only: Option<bool>,

	/// Whether the cookie requires HTTPS
	#[serde(skip_serializing_if = "Option::is_none")]
	pub secure: Option<bool>,

	/// SameSite attribute
	#[serde(skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

impl Cookie {
	/// Creates a new cookie with required fields.
	pub fn new(
		name: impl Into<String>,
		value: impl Into<String>,
		domain: impl Into<String>,
	) -> Self {
		Self {
			name: name.into(),
			value: value.into(),
			domain: Some(domain.into()),
			path: None,
			expires: None,
			http_only: None,
			secure: None,
			same_site: None,
		}
	}

	/// Sets the path for the cookie.
	pub fn path(mut self, path: impl Into<String>) -> Self {
		self.path = Some(path.into());
		self
	}

	/// Sets the expiration timestamp.
	pub fn expires(mut self, expires: f64) -> Self {
		self.expires = Some(expires);
		self
	}

	/// Sets whether the cookie is HTTP-only.
	pub fn http_only(mut self, http_only: bool) -> Self {
		self.http_only = Some(http_only);
		self
	}

	/// Sets whether the cookie requires HTTPS.
	pub fn secure(mut self, secure: bool) -> Self {
		self.secure = Some(secure);
		self
	}

	/// Sets the SameSite attribute.
	pub fn same_site(mut self, same_site: SameSite) -> Self {
		self.same_site = Some(same_site);
		self
	}
}

/// A localStorage entry within an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStorageEntry {
	/// Storage key
	pub name: String,
	/// Storage value
	pub value: String,
}

/// Storage state for a single origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	/// The origin URL
	pub origin: String,
	/// localStorage entries for this origin
	pub local_storage: Vec<LocalStorageEntry>,
}

/// Complete browsing-context storage state.
///
/// Contains all cookies and localStorage data that can be saved under a
/// name and restored into a fresh browsing context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageState {
	/// All cookies in the browsing context
	pub cookies: Vec<Cookie>,
	/// localStorage data per origin
	pub origins: Vec<OriginState>,
}

impl StorageState {
	/// Creates an empty storage state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a storage state with cookies only.
	pub fn with_cookies(cookies: Vec<Cookie>) -> Self {
		Self {
			cookies,
			origins: Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cookie_serialization() {
		let cookie = Cookie::new("session", "abc", ".example.com")
			.http_only(true)
			.same_site(SameSite::Lax);

		let json = serde_json::to_string(&cookie).unwrap();
		assert!(json.contains("\"name\":\"session\""));
		assert!(json.contains("\"httpOnly\":true"));
	}

	#[test]
	fn test_storage_state_roundtrip() {
		let state = StorageState {
			cookies: vec![Cookie::new("auth", "token", ".example.com")],
			origins: vec![OriginState {
				origin: "https://example.com".into(),
				local_storage: vec![LocalStorageEntry {
					name: "theme".into(),
					value: "dark".into(),
				}],
			}],
		};

		let json = serde_json::to_string(&state).unwrap();
		let restored: StorageState = serde_json::from_str(&json).unwrap();
		assert_eq!(restored.cookies.len(), 1);
		assert_eq!(restored.origins[0].local_storage.len(), 1);
	}
}
