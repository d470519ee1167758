//! The control API server.
//!
//! A single loopback-only listener with a fixed, closed routing table.
//! Every inbound request touches the idle supervisor before routing —
//! liveness means "a control request arrived recently", independent of
//! browser activity. Downstream errors are caught at this boundary and
//! mapped into the uniform envelope; a bad request never takes the
//! process down.

pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use roost_protocol::{Envelope, ErrorCode, SessionDescriptor};

use crate::auth::AuthStateManager;
use crate::config::DaemonConfig;
use crate::error::Error;
use crate::handoff::WaitGate;
use crate::persist::SessionPersister;
use crate::session::BrowserSession;
use crate::supervisor::IdleSupervisor;
use crate::telemetry::Telemetry;

/// Everything the server needs, threaded explicitly instead of living in
/// module-level globals. Init and teardown both happen in daemon
/// startup/shutdown.
pub struct SessionContext {
	pub config: DaemonConfig,
	pub session: BrowserSession,
	pub telemetry: Telemetry,
	pub gate: WaitGate,
	pub supervisor: IdleSupervisor,
	pub persister: SessionPersister,
	pub auth: AuthStateManager,
	pub started_at: Instant,
	pub started_at_epoch: u64,
	pub shutdown: watch::Sender<bool>,
}

pub type SharedContext = Arc<SessionContext>;

impl SessionContext {
	/// The descriptor advertising this daemon, with the latest known URL.
	pub fn descriptor(&self) -> SessionDescriptor {
		SessionDescriptor {
			pid: std::process::id(),
			port: self.config.port,
			started_at: self.started_at_epoch,
			current_url: self.session.current_url(),
		}
	}
}

/// The fixed routing table. Unmatched requests land in the fallback and
/// get a 404 envelope.
pub fn router(ctx: SharedContext) -> Router {
	Router::new()
		.route("/health", get(handlers::health))
		.route("/diagnostics", get(handlers::diagnostics))
		.route("/console", get(handlers::console_log))
		.route("/network", get(handlers::network_log))
		.route("/navigate", post(handlers::navigate))
		.route("/screenshot", post(handlers::screenshot))
		.route("/click", post(handlers::click))
		.route("/fill", post(handlers::fill))
		.route("/type", post(handlers::type_text))
		.route("/eval", post(handlers::eval))
		.route("/resize", post(handlers::resize))
		.route("/reload", post(handlers::reload))
		.route("/login", post(handlers::login))
		.route("/save-auth", post(handlers::save_auth))
		.route("/load-auth", post(handlers::load_auth))
		.route("/wait-for-user", post(handlers::wait_for_user))
		.route("/continue", post(handlers::continue_session))
		.route("/stop", post(handlers::stop))
		.fallback(handlers::unknown_route)
		.layer(middleware::from_fn_with_state(ctx.clone(), touch_idle))
		.with_state(ctx)
}

/// Every control request reschedules the idle timer.
async fn touch_idle(
	State(ctx): State<SharedContext>,
	request: Request,
	next: Next,
) -> Response {
	ctx.supervisor.touch();
	next.run(request).await
}

/// Handler result: success envelopes out, [`ApiError`] in the error arm.
pub type ApiResult<T> = std::result::Result<Json<Envelope<T>>, ApiError>;

/// A structured error response: HTTP status plus the envelope error body.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	code: ErrorCode,
	message: String,
}

impl ApiError {
	pub fn invalid(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::BAD_REQUEST,
			code: ErrorCode::InvalidRequest,
			message: message.into(),
		}
	}

	pub fn unknown_route(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::NOT_FOUND,
			code: ErrorCode::UnknownRoute,
			message: message.into(),
		}
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let status = match &err {
			Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::PageReplaced => StatusCode::CONFLICT,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		};
		Self {
			status,
			code: err.code(),
			message: err.to_string(),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let envelope: Envelope<serde_json::Value> = Envelope::err(self.code, self.message);
		(self.status, Json(envelope)).into_response()
	}
}

/// JSON body extractor whose rejection is an envelope, not plain text.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
	T: DeserializeOwned,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
		match Json::<T>::from_request(req, state).await {
			Ok(Json(value)) => Ok(ApiJson(value)),
			Err(rejection) => Err(ApiError::invalid(rejection.body_text())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn downstream_errors_map_to_500_with_taxonomy_code() {
		let api_err = ApiError::from(Error::Eval("ReferenceError: x".into()));
		assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(api_err.code, ErrorCode::EvalError);
	}

	#[test]
	fn not_found_and_page_replaced_get_caller_statuses() {
		assert_eq!(
			ApiError::from(Error::NotFound("state".into())).status,
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			ApiError::from(Error::PageReplaced).status,
			StatusCode::CONFLICT
		);
		assert_eq!(
			ApiError::from(Error::InvalidRequest("bad".into())).status,
			StatusCode::BAD_REQUEST
		);
	}
}
