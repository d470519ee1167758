use thiserror::Error;

use roost_protocol::ErrorCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Startup configuration is unusable (bad env var, missing state dir).
	#[error("configuration error: {0}")]
	Configuration(String),

	/// The browser process failed to start. Fatal at startup.
	#[error("browser launch failed: {0}")]
	Launch(String),

	#[error("navigation to {url} failed: {message}")]
	Navigation { url: String, message: String },

	#[error("script evaluation failed: {0}")]
	Eval(String),

	#[error("interaction with {selector} failed: {message}")]
	Interaction { selector: String, message: String },

	#[error("timeout after {ms}ms waiting for {what}")]
	Timeout { ms: u64, what: String },

	#[error("not found: {0}")]
	NotFound(String),

	/// The operation raced a `load-auth` page replacement.
	#[error("page was replaced while the operation was in flight; retry")]
	PageReplaced,

	#[error("invalid request: {0}")]
	InvalidRequest(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error("browser protocol error: {0}")]
	Cdp(#[from] chromiumoxide::error::CdpError),
}

impl Error {
	/// The stable wire code this error maps to in the response envelope.
	pub fn code(&self) -> ErrorCode {
		match self {
			Error::Configuration(_) => ErrorCode::ConfigurationError,
			Error::Launch(_) => ErrorCode::LaunchError,
			Error::Navigation { .. } => ErrorCode::NavigationError,
			Error::Eval(_) => ErrorCode::EvalError,
			Error::Interaction { .. } => ErrorCode::InteractionError,
			Error::Timeout { .. } => ErrorCode::TimeoutError,
			Error::NotFound(_) => ErrorCode::NotFoundError,
			Error::PageReplaced => ErrorCode::PageReplacedError,
			Error::InvalidRequest(_) => ErrorCode::InvalidRequest,
			Error::Io(_) | Error::Json(_) | Error::Cdp(_) => ErrorCode::InternalError,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn navigation_error_carries_url() {
		let err = Error::Navigation {
			url: "https://example.com".into(),
			message: "timed out".into(),
		};
		assert!(err.to_string().contains("https://example.com"));
		assert_eq!(err.code(), ErrorCode::NavigationError);
	}

	#[test]
	fn io_errors_map_to_internal() {
		let err = Error::from(std::io::Error::other("disk gone"));
		assert_eq!(err.code(), ErrorCode::InternalError);
	}
}
