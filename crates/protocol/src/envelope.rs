//! Uniform response envelope for every control endpoint.
//!
//! Every response body, success or failure, 200 or 500, has the same shape:
//!
//! ```json
//! { "success": true,  "data": { ... } }
//! { "success": false, "error": { "code": "NAVIGATION_ERROR", "message": "..." } }
//! ```

use serde::{Deserialize, Serialize};

/// Stable error codes for programmatic handling by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// Automation dependency missing or unusable at startup.
	ConfigurationError,
	/// Browser process failed to start.
	LaunchError,
	/// Navigation failed or timed out.
	NavigationError,
	/// Script threw inside the page.
	EvalError,
	/// Click/fill/type failed (missing selector, detached element).
	InteractionError,
	/// Operation exceeded its deadline.
	TimeoutError,
	/// Unknown auth-state name or no active page.
	NotFoundError,
	/// The operation raced a `load-auth` page replacement; retry.
	PageReplacedError,
	/// Malformed request body or parameters.
	InvalidRequest,
	/// No route matches the request.
	UnknownRoute,
	/// Anything else; the daemon stays up.
	InternalError,
}

/// Structured error payload inside a failed envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
	pub code: ErrorCode,
	pub message: String,
}

/// The `{success, data|error}` envelope wrapping every response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
	pub fn ok(data: T) -> Self {
		Self {
			success: true,
			data: Some(data),
			error: None,
		}
	}

	pub fn err(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			success: false,
			data: None,
			error: Some(ErrorBody {
				code,
				message: message.into(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ok_envelope_omits_error() {
		let env = Envelope::ok(serde_json::json!({"url": "https://example.com"}));
		let json = serde_json::to_string(&env).unwrap();
		assert!(json.contains("\"success\":true"));
		assert!(!json.contains("\"error\""));
	}

	#[test]
	fn err_envelope_round_trips_code() {
		let env: Envelope<()> = Envelope::err(ErrorCode::NavigationError, "timed out");
		let json = serde_json::to_string(&env).unwrap();
		assert!(json.contains("\"NAVIGATION_ERROR\""));

		let parsed: Envelope<serde_json::Value> = serde_json::from_str(&json).unwrap();
		assert!(!parsed.success);
		assert_eq!(parsed.error.unwrap().code, ErrorCode::NavigationError);
	}
}
