//! Endpoint handlers. Thin: decode, call into the session/telemetry/gate,
//! wrap the result in the envelope.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::Uri;
use serde::Deserialize;
use tracing::{info, warn};

use roost_protocol::{
	AuthNameRequest, ClickRequest, ConsoleKind, ConsoleLog, DiagnosticsReport, Envelope,
	EvalData, EvalRequest, FillRequest, HealthReport, InteractionData, LoadAuthData, LoginData,
	LoginRequest, NavigateData, NavigateRequest, NetworkLog, PageSnapshot, ResizeRequest,
	SaveAuthData, ScreenshotData, ScreenshotRequest, StopData, TypeTextRequest,
};

use crate::config::STOP_GRACE_DELAY;

use super::{ApiError, ApiJson, ApiResult, SharedContext};

pub async fn health(State(ctx): State<SharedContext>) -> Json<Envelope<HealthReport>> {
	let counts = ctx.telemetry.counts();
	let waiting = ctx.gate.is_waiting();
	Json(Envelope::ok(HealthReport {
		status: if waiting { "waiting" } else { "ok" }.into(),
		pid: std::process::id(),
		port: ctx.config.port,
		headless: ctx.session.headless(),
		current_url: ctx.session.current_url(),
		console_count: counts.console,
		request_count: counts.requests,
		response_count: counts.responses,
		page_error_count: counts.page_errors,
		waiting_for_user: waiting,
		uptime_secs: ctx.started_at.elapsed().as_secs(),
	}))
}

pub async fn diagnostics(State(ctx): State<SharedContext>) -> ApiResult<DiagnosticsReport> {
	let (url, title) = ctx.session.page_info().await;
	let screenshot = match ctx.session.screenshot(None, false).await {
		Ok((path, _)) => Some(path),
		Err(err) => {
			warn!(target = "roost.server", error = %err, "diagnostics screenshot failed");
			None
		}
	};
	Ok(Json(Envelope::ok(DiagnosticsReport {
		url,
		title,
		screenshot,
		console: ctx.telemetry.console_summary(),
		network: ctx.telemetry.network_summary(),
		page_errors: ctx.telemetry.page_errors(),
	})))
}

#[derive(Debug, Deserialize)]
pub struct TypeFilter {
	#[serde(rename = "type")]
	kind: Option<String>,
}

pub async fn console_log(
	State(ctx): State<SharedContext>,
	Query(filter): Query<TypeFilter>,
) -> ApiResult<ConsoleLog> {
	let kind = parse_console_filter(filter.kind.as_deref())?;
	let entries = ctx.telemetry.console_entries(kind);
	Ok(Json(Envelope::ok(ConsoleLog {
		total: entries.len(),
		entries,
	})))
}

pub async fn network_log(
	State(ctx): State<SharedContext>,
	Query(filter): Query<TypeFilter>,
) -> ApiResult<NetworkLog> {
	let log = match filter.kind.as_deref() {
		None => {
			let requests = ctx.telemetry.request_entries();
			let responses = ctx.telemetry.response_entries();
			NetworkLog {
				total: requests.len() + responses.len(),
				requests,
				responses,
			}
		}
		Some("request") => {
			let requests = ctx.telemetry.request_entries();
			NetworkLog {
				total: requests.len(),
				requests,
				..Default::default()
			}
		}
		Some("response") => {
			let responses = ctx.telemetry.response_entries();
			NetworkLog {
				total: responses.len(),
				responses,
				..Default::default()
			}
		}
		Some(other) => {
			return Err(ApiError::invalid(format!(
				"unknown network filter {other:?}; expected request or response"
			)));
		}
	};
	Ok(Json(Envelope::ok(log)))
}

pub async fn navigate(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<NavigateRequest>,
) -> ApiResult<NavigateData> {
	let (url, title) = ctx.session.navigate(&request.url).await?;
	// Keep the advertised descriptor current for discovery.
	if let Err(err) = ctx.persister.write(&ctx.descriptor()) {
		warn!(target = "roost.server", error = %err, "descriptor update failed");
	}
	Ok(Json(Envelope::ok(NavigateData { url, title })))
}

pub async fn screenshot(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<ScreenshotRequest>,
) -> ApiResult<ScreenshotData> {
	let (path, size_bytes) = ctx
		.session
		.screenshot(request.path, request.full_page)
		.await?;
	Ok(Json(Envelope::ok(ScreenshotData { path, size_bytes })))
}

pub async fn click(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<ClickRequest>,
) -> ApiResult<InteractionData> {
	ctx.session.click(&request.selector).await?;
	Ok(Json(Envelope::ok(InteractionData {
		selector: request.selector,
	})))
}

pub async fn fill(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<FillRequest>,
) -> ApiResult<InteractionData> {
	ctx.session.fill(&request.selector, &request.value).await?;
	Ok(Json(Envelope::ok(InteractionData {
		selector: request.selector,
	})))
}

pub async fn type_text(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<TypeTextRequest>,
) -> ApiResult<InteractionData> {
	ctx.session
		.type_text(&request.selector, &request.text, request.delay)
		.await?;
	Ok(Json(Envelope::ok(InteractionData {
		selector: request.selector,
	})))
}

pub async fn eval(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<EvalRequest>,
) -> ApiResult<EvalData> {
	let result = ctx.session.evaluate(&request.script).await?;
	Ok(Json(Envelope::ok(EvalData { result })))
}

pub async fn resize(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<ResizeRequest>,
) -> ApiResult<serde_json::Value> {
	ctx.session.resize(request.width, request.height).await?;
	Ok(Json(Envelope::ok(serde_json::json!({
		"width": request.width,
		"height": request.height,
	}))))
}

pub async fn reload(State(ctx): State<SharedContext>) -> ApiResult<NavigateData> {
	let (url, title) = ctx.session.reload().await?;
	Ok(Json(Envelope::ok(NavigateData { url, title })))
}

pub async fn login(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<LoginData> {
	let data = ctx.session.login(&request).await?;
	if let Err(err) = ctx.persister.write(&ctx.descriptor()) {
		warn!(target = "roost.server", error = %err, "descriptor update failed");
	}
	Ok(Json(Envelope::ok(data)))
}

pub async fn save_auth(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<AuthNameRequest>,
) -> ApiResult<SaveAuthData> {
	let state = ctx.session.storage_state().await?;
	let path = ctx.auth.save(&request.name, &state)?;
	Ok(Json(Envelope::ok(SaveAuthData {
		name: request.name,
		path: path.display().to_string(),
		cookies: state.cookies.len(),
		origins: state.origins.len(),
	})))
}

pub async fn load_auth(
	State(ctx): State<SharedContext>,
	ApiJson(request): ApiJson<AuthNameRequest>,
) -> ApiResult<LoadAuthData> {
	let state = ctx.auth.load(&request.name)?;
	ctx.session.restore_storage_state(&state).await?;
	Ok(Json(Envelope::ok(LoadAuthData {
		name: request.name,
		cookies: state.cookies.len(),
		origins: state.origins.len(),
	})))
}

pub async fn wait_for_user(State(ctx): State<SharedContext>) -> ApiResult<PageSnapshot> {
	let screenshot = match ctx.session.screenshot(None, false).await {
		Ok((path, _)) => Some(path),
		Err(err) => {
			warn!(target = "roost.server", error = %err, "handoff screenshot failed");
			None
		}
	};
	ctx.gate.begin_wait(screenshot.clone());
	info!(target = "roost.server", "session flagged as waiting for user");
	let (url, title) = ctx.session.page_info().await;
	Ok(Json(Envelope::ok(PageSnapshot {
		url,
		title,
		screenshot,
		page_errors: ctx.telemetry.page_errors(),
		waiting_for_user: true,
	})))
}

pub async fn continue_session(State(ctx): State<SharedContext>) -> ApiResult<PageSnapshot> {
	let was_waiting = ctx.gate.continue_session();
	info!(target = "roost.server", was_waiting, "session continued");
	let (url, title) = ctx.session.page_info().await;
	let screenshot = ctx
		.session
		.screenshot(None, false)
		.await
		.ok()
		.map(|(path, _)| path);
	Ok(Json(Envelope::ok(PageSnapshot {
		url,
		title,
		screenshot,
		page_errors: ctx.telemetry.page_errors(),
		waiting_for_user: false,
	})))
}

pub async fn stop(State(ctx): State<SharedContext>) -> Json<Envelope<StopData>> {
	info!(target = "roost.server", "stop requested");
	let shutdown = ctx.shutdown.clone();
	// Grace delay lets this response flush before the listener goes away.
	tokio::spawn(async move {
		tokio::time::sleep(STOP_GRACE_DELAY).await;
		let _ = shutdown.send(true);
	});
	Json(Envelope::ok(StopData { stopping: true }))
}

pub async fn unknown_route(uri: Uri) -> ApiError {
	ApiError::unknown_route(format!("no route for {uri}"))
}

fn parse_console_filter(raw: Option<&str>) -> Result<Option<ConsoleKind>, ApiError> {
	match raw {
		None => Ok(None),
		Some("error") => Ok(Some(ConsoleKind::Error)),
		Some("warning") => Ok(Some(ConsoleKind::Warning)),
		Some("log") => Ok(Some(ConsoleKind::Log)),
		Some("info") => Ok(Some(ConsoleKind::Info)),
		Some("debug") => Ok(Some(ConsoleKind::Debug)),
		Some(other) => Err(ApiError::invalid(format!(
			"unknown console filter {other:?}; expected error, warning, log, info, or debug"
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn console_filter_accepts_known_kinds() {
		assert_eq!(parse_console_filter(None).unwrap(), None);
		assert_eq!(
			parse_console_filter(Some("error")).unwrap(),
			Some(ConsoleKind::Error)
		);
		assert_eq!(
			parse_console_filter(Some("warning")).unwrap(),
			Some(ConsoleKind::Warning)
		);
	}

	#[test]
	fn console_filter_rejects_unknown_kinds() {
		assert!(parse_console_filter(Some("shout")).is_err());
	}
}
