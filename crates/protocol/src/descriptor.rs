//! The session descriptor file advertising a running daemon.
//!
//! A small JSON file at a well-known path makes "is a daemon already
//! running, and where" discoverable without a registry service. The file is
//! advisory: a descriptor is trustworthy only after a live health probe
//! against its port succeeds.

use serde::{Deserialize, Serialize};

/// On-disk descriptor for a running daemon instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
	/// PID of the daemon process that wrote this descriptor.
	pub pid: u32,
	/// Control API listen port.
	pub port: u16,
	/// Unix epoch seconds when the daemon started.
	pub started_at: u64,
	/// URL of the most recent successful navigation, if any.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub current_url: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn descriptor_round_trips() {
		let descriptor = SessionDescriptor {
			pid: 4242,
			port: 4724,
			started_at: 1700000000,
			current_url: Some("https://example.com".into()),
		};
		let json = serde_json::to_string(&descriptor).unwrap();
		assert!(json.contains("\"startedAt\":1700000000"));
		assert!(json.contains("\"currentUrl\""));

		let parsed: SessionDescriptor = serde_json::from_str(&json).unwrap();
		assert_eq!(parsed.port, 4724);
	}

	#[test]
	fn current_url_is_optional() {
		let parsed: SessionDescriptor =
			serde_json::from_str(r#"{"pid":1,"port":2,"startedAt":3}"#).unwrap();
		assert!(parsed.current_url.is_none());
	}
}
