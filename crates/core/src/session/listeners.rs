//! CDP event listeners feeding the telemetry collector.
//!
//! One task per page generation consumes the console, exception, and
//! network event streams and pushes immutable records into [`Telemetry`].
//! The task is aborted and re-attached when the page is replaced.

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::network::{
	EnableParams as NetworkEnableParams, EventRequestWillBeSent, EventResponseReceived,
};
use chromiumoxide::cdp::js_protocol::runtime::{
	ConsoleApiCalledType, EnableParams as RuntimeEnableParams, EventConsoleApiCalled,
	EventExceptionThrown, RemoteObject,
};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use roost_protocol::{ConsoleKind, PageErrorKind};

use crate::error::Result;
use crate::telemetry::Telemetry;

/// Enables the Network and Runtime domains on `page` and spawns the event
/// pump pushing into `telemetry`.
pub(super) async fn attach_telemetry(page: &Page, telemetry: Telemetry) -> Result<JoinHandle<()>> {
	page.execute(NetworkEnableParams::default()).await?;
	page.execute(RuntimeEnableParams::default()).await?;

	let mut console_events = page.event_listener::<EventConsoleApiCalled>().await?;
	let mut exception_events = page.event_listener::<EventExceptionThrown>().await?;
	let mut request_events = page.event_listener::<EventRequestWillBeSent>().await?;
	let mut response_events = page.event_listener::<EventResponseReceived>().await?;

	let handle = tokio::spawn(async move {
		loop {
			tokio::select! {
				Some(event) = console_events.next() => {
					telemetry.push_console(console_kind(&event.r#type), format_console_args(&event.args));
				}
				Some(event) = exception_events.next() => {
					let details = &event.exception_details;
					let message = details
						.exception
						.as_ref()
						.and_then(|exception| exception.description.clone())
						.unwrap_or_else(|| details.text.clone());
					telemetry.push_page_error(classify_exception(&details.text), message);
				}
				Some(event) = request_events.next() => {
					telemetry.record_request(
						event.request_id.inner().clone(),
						event.request.url.clone(),
						event.request.method.clone(),
					);
				}
				Some(event) = response_events.next() => {
					telemetry.record_response(
						event.request_id.inner().clone(),
						event.response.url.clone(),
						event.response.status as u16,
						event.response.encoded_data_length.max(0.0) as u64,
					);
				}
				else => break,
			}
		}
		debug!(target = "roost.telemetry", "event pump stopped");
	});

	Ok(handle)
}

fn console_kind(api_type: &ConsoleApiCalledType) -> ConsoleKind {
	match api_type {
		ConsoleApiCalledType::Log => ConsoleKind::Log,
		ConsoleApiCalledType::Debug => ConsoleKind::Debug,
		ConsoleApiCalledType::Info => ConsoleKind::Info,
		ConsoleApiCalledType::Error => ConsoleKind::Error,
		ConsoleApiCalledType::Warning => ConsoleKind::Warning,
		_ => ConsoleKind::Other,
	}
}

fn format_console_args(args: &[RemoteObject]) -> String {
	args.iter()
		.map(|arg| render_arg(arg.value.as_ref(), arg.description.as_deref()))
		.collect::<Vec<_>>()
		.join(" ")
}

/// One console argument as display text: plain strings stay bare, other
/// values render as JSON, and value-less remotes fall back to the protocol
/// description.
fn render_arg(value: Option<&serde_json::Value>, description: Option<&str>) -> String {
	match value {
		Some(serde_json::Value::String(text)) => text.clone(),
		Some(other) => other.to_string(),
		None => description.unwrap_or("undefined").to_string(),
	}
}

/// CDP reports unhandled rejections through `exceptionThrown` with a
/// "(in promise)" marker in the summary text.
fn classify_exception(text: &str) -> PageErrorKind {
	if text.to_ascii_lowercase().contains("promise") {
		PageErrorKind::UnhandledRejection
	} else {
		PageErrorKind::UncaughtException
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn string_args_render_bare() {
		let value = serde_json::Value::String("hello".into());
		assert_eq!(render_arg(Some(&value), None), "hello");
	}

	#[test]
	fn structured_args_render_as_json() {
		let value = serde_json::json!({"count": 3});
		assert_eq!(render_arg(Some(&value), None), r#"{"count":3}"#);
	}

	#[test]
	fn valueless_args_use_description() {
		assert_eq!(render_arg(None, Some("HTMLDivElement")), "HTMLDivElement");
		assert_eq!(render_arg(None, None), "undefined");
	}

	#[test]
	fn promise_exceptions_classify_as_rejections() {
		assert_eq!(
			classify_exception("Uncaught (in promise) Error: nope"),
			PageErrorKind::UnhandledRejection
		);
		assert_eq!(
			classify_exception("Uncaught TypeError: x is not a function"),
			PageErrorKind::UncaughtException
		);
	}
}
