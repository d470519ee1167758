//! Telemetry entry types accumulated per navigation epoch.

use serde::{Deserialize, Serialize};

/// Console message severity, mirroring the browser's console API levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleKind {
	Log,
	Debug,
	Info,
	Warning,
	Error,
	/// Anything else the console API emits (table, trace, group, ...).
	Other,
}

/// One console message captured from the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEntry {
	#[serde(rename = "type")]
	pub kind: ConsoleKind,
	pub text: String,
	/// Unix epoch milliseconds.
	pub timestamp: u64,
}

/// One outgoing request observed on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRequestEntry {
	pub id: String,
	pub url: String,
	pub method: String,
	pub timestamp: u64,
}

/// One response observed on the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponseEntry {
	pub id: String,
	pub url: String,
	pub status: u16,
	/// Milliseconds since the matching request was dispatched; `0` when the
	/// dispatch was never observed (e.g. a cached response).
	pub timing_ms: u64,
	pub size_bytes: u64,
	pub timestamp: u64,
}

/// Kind of page-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageErrorKind {
	UncaughtException,
	UnhandledRejection,
}

/// An uncaught exception or unhandled rejection surfaced by the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageErrorEntry {
	pub kind: PageErrorKind,
	pub message: String,
	pub timestamp: u64,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn console_entry_uses_wire_field_names() {
		let entry = ConsoleEntry {
			kind: ConsoleKind::Warning,
			text: "deprecated API".into(),
			timestamp: 1700000000000,
		};
		let json = serde_json::to_string(&entry).unwrap();
		assert!(json.contains("\"type\":\"warning\""));
		assert!(json.contains("\"timestamp\""));
	}

	#[test]
	fn page_error_kind_is_camel_case() {
		let entry = PageErrorEntry {
			kind: PageErrorKind::UnhandledRejection,
			message: "boom".into(),
			timestamp: 0,
		};
		let json = serde_json::to_string(&entry).unwrap();
		assert!(json.contains("\"unhandledRejection\""));
	}
}
