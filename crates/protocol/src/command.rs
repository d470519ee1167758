//! Request and response payloads for each control endpoint.

use serde::{Deserialize, Serialize};

use crate::telemetry::{ConsoleEntry, NetworkRequestEntry, NetworkResponseEntry, PageErrorEntry};

/// `POST /navigate` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateRequest {
	pub url: String,
}

/// `POST /navigate` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateData {
	pub url: String,
	pub title: String,
}

/// `POST /screenshot` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRequest {
	#[serde(default)]
	pub path: Option<String>,
	#[serde(default)]
	pub full_page: bool,
}

/// `POST /screenshot` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotData {
	pub path: String,
	pub size_bytes: u64,
}

/// `POST /click` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRequest {
	pub selector: String,
}

/// `POST /fill` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRequest {
	pub selector: String,
	pub value: String,
}

/// `POST /type` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeTextRequest {
	pub selector: String,
	pub text: String,
	/// Per-keystroke delay in milliseconds.
	#[serde(default)]
	pub delay: Option<u64>,
}

/// Ack for interaction endpoints (click/fill/type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionData {
	pub selector: String,
}

/// `POST /eval` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRequest {
	pub script: String,
}

/// `POST /eval` result: whatever the script produced, as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalData {
	pub result: serde_json::Value,
}

/// `POST /resize` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResizeRequest {
	pub width: u32,
	pub height: u32,
}

/// `POST /login` body.
///
/// Selector fields override the built-in cross-framework defaults. The
/// whole flow is best-effort; see the login module for the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	#[serde(default)]
	pub url: Option<String>,
	pub username: String,
	pub password: String,
	#[serde(default)]
	pub username_selector: Option<String>,
	#[serde(default)]
	pub password_selector: Option<String>,
	#[serde(default)]
	pub submit_selector: Option<String>,
}

/// `POST /login` result, reported whether or not navigation completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
	pub url: Option<String>,
	pub title: Option<String>,
	pub screenshot: String,
	/// `false` usually means an SPA that never hard-navigated.
	pub navigation_completed: bool,
}

/// `POST /save-auth` and `POST /load-auth` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthNameRequest {
	pub name: String,
}

/// `POST /save-auth` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveAuthData {
	pub name: String,
	pub path: String,
	pub cookies: usize,
	pub origins: usize,
}

/// `POST /load-auth` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAuthData {
	pub name: String,
	pub cookies: usize,
	pub origins: usize,
}

/// Snapshot returned by `/wait-for-user` and `/continue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
	pub url: Option<String>,
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub screenshot: Option<String>,
	pub page_errors: Vec<PageErrorEntry>,
	pub waiting_for_user: bool,
}

/// `POST /stop` ack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopData {
	pub stopping: bool,
}

/// `GET /health` report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
	pub status: String,
	pub pid: u32,
	pub port: u16,
	pub headless: bool,
	pub current_url: Option<String>,
	pub console_count: usize,
	pub request_count: usize,
	pub response_count: usize,
	pub page_error_count: usize,
	pub waiting_for_user: bool,
	pub uptime_secs: u64,
}

/// `GET /console` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleLog {
	pub total: usize,
	pub entries: Vec<ConsoleEntry>,
}

/// `GET /network` result. Either side may be omitted by the `type` filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkLog {
	pub total: usize,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub requests: Vec<NetworkRequestEntry>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub responses: Vec<NetworkResponseEntry>,
}

/// Console slice of `GET /diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleSummary {
	pub total: usize,
	pub errors: Vec<ConsoleEntry>,
	pub warnings: Vec<ConsoleEntry>,
}

/// Network slice of `GET /diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSummary {
	pub request_count: usize,
	pub response_count: usize,
	/// Responses with status >= 400.
	pub failed: Vec<NetworkResponseEntry>,
	pub total_bytes: u64,
	pub average_response_ms: u64,
}

/// `GET /diagnostics`: an on-demand derived view; never mutates the logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsReport {
	pub url: Option<String>,
	pub title: Option<String>,
	pub screenshot: Option<String>,
	pub console: ConsoleSummary,
	pub network: NetworkSummary,
	pub page_errors: Vec<PageErrorEntry>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn login_request_defaults_optional_selectors() {
		let req: LoginRequest =
			serde_json::from_str(r#"{"username":"u","password":"p"}"#).unwrap();
		assert!(req.url.is_none());
		assert!(req.username_selector.is_none());
	}

	#[test]
	fn screenshot_request_accepts_empty_body() {
		let req: ScreenshotRequest = serde_json::from_str("{}").unwrap();
		assert!(req.path.is_none());
		assert!(!req.full_page);
	}

	#[test]
	fn network_log_omits_empty_sides() {
		let log = NetworkLog {
			total: 0,
			requests: vec![],
			responses: vec![],
		};
		let json = serde_json::to_string(&log).unwrap();
		assert!(!json.contains("requests"));
		assert!(!json.contains("responses"));
	}
}
