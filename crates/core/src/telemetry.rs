//! Per-navigation-epoch telemetry.
//!
//! Four bounded in-memory logs (console, requests, responses, page errors)
//! plus the URL-to-dispatch-time map used to derive response timings. All
//! five are owned by one store behind one lock so an epoch reset is atomic:
//! [`Telemetry::begin_epoch`] runs *before* the navigation is issued, and a
//! diagnostics read never observes entries from two navigations at once.
//!
//! Event listener tasks push immutable records in; they never touch daemon
//! control state. Reads are on-demand derived views and never mutate.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use roost_protocol::{
	ConsoleEntry, ConsoleKind, ConsoleSummary, NetworkRequestEntry, NetworkResponseEntry,
	NetworkSummary, PageErrorEntry, PageErrorKind,
};

/// Cap per log; oldest entries are dropped once it is reached.
const LOG_CAPACITY: usize = 1000;

/// Counts snapshot used by `/health`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryCounts {
	pub console: usize,
	pub requests: usize,
	pub responses: usize,
	pub page_errors: usize,
}

#[derive(Default)]
struct TelemetryStore {
	console: VecDeque<ConsoleEntry>,
	requests: VecDeque<NetworkRequestEntry>,
	responses: VecDeque<NetworkResponseEntry>,
	page_errors: VecDeque<PageErrorEntry>,
	/// URL -> dispatch instant for timing correlation. Keyed by URL, not by
	/// request id: when the same URL is fetched twice before the first
	/// response returns, the later dispatch wins and the first response's
	/// timing is misattributed. Known limitation, kept deliberately.
	dispatch_times: HashMap<String, Instant>,
}

/// Shared handle to the telemetry store.
#[derive(Clone, Default)]
pub struct Telemetry {
	store: Arc<Mutex<TelemetryStore>>,
}

impl Telemetry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Clears all logs and the dispatch map atomically. Call before issuing
	/// the navigation that starts the new epoch.
	pub fn begin_epoch(&self) {
		let mut store = self.store.lock();
		store.console.clear();
		store.requests.clear();
		store.responses.clear();
		store.page_errors.clear();
		store.dispatch_times.clear();
	}

	pub fn push_console(&self, kind: ConsoleKind, text: String) {
		let entry = ConsoleEntry {
			kind,
			text,
			timestamp: now_ms(),
		};
		let mut store = self.store.lock();
		push_bounded(&mut store.console, entry);
	}

	/// Records a request and its dispatch time for later timing correlation.
	pub fn record_request(&self, id: String, url: String, method: String) {
		let mut store = self.store.lock();
		store.dispatch_times.insert(url.clone(), Instant::now());
		push_bounded(
			&mut store.requests,
			NetworkRequestEntry {
				id,
				url,
				method,
				timestamp: now_ms(),
			},
		);
	}

	/// Records a response; timing is derived from the recorded dispatch time
	/// for the same URL, `0` when no dispatch was observed.
	pub fn record_response(&self, id: String, url: String, status: u16, size_bytes: u64) {
		let mut store = self.store.lock();
		let timing_ms = store
			.dispatch_times
			.get(&url)
			.map(|dispatched| dispatched.elapsed().as_millis() as u64)
			.unwrap_or(0);
		push_bounded(
			&mut store.responses,
			NetworkResponseEntry {
				id,
				url,
				status,
				timing_ms,
				size_bytes,
				timestamp: now_ms(),
			},
		);
	}

	pub fn push_page_error(&self, kind: PageErrorKind, message: String) {
		let entry = PageErrorEntry {
			kind,
			message,
			timestamp: now_ms(),
		};
		let mut store = self.store.lock();
		push_bounded(&mut store.page_errors, entry);
	}

	pub fn counts(&self) -> TelemetryCounts {
		let store = self.store.lock();
		TelemetryCounts {
			console: store.console.len(),
			requests: store.requests.len(),
			responses: store.responses.len(),
			page_errors: store.page_errors.len(),
		}
	}

	/// Console entries, optionally filtered to one kind.
	pub fn console_entries(&self, kind: Option<ConsoleKind>) -> Vec<ConsoleEntry> {
		let store = self.store.lock();
		store
			.console
			.iter()
			.filter(|entry| kind.is_none_or(|k| entry.kind == k))
			.cloned()
			.collect()
	}

	pub fn request_entries(&self) -> Vec<NetworkRequestEntry> {
		self.store.lock().requests.iter().cloned().collect()
	}

	pub fn response_entries(&self) -> Vec<NetworkResponseEntry> {
		self.store.lock().responses.iter().cloned().collect()
	}

	pub fn page_errors(&self) -> Vec<PageErrorEntry> {
		self.store.lock().page_errors.iter().cloned().collect()
	}

	/// Derived console view for diagnostics: errors and warnings split out.
	pub fn console_summary(&self) -> ConsoleSummary {
		let store = self.store.lock();
		let errors = store
			.console
			.iter()
			.filter(|e| e.kind == ConsoleKind::Error)
			.cloned()
			.collect();
		let warnings = store
			.console
			.iter()
			.filter(|e| e.kind == ConsoleKind::Warning)
			.cloned()
			.collect();
		ConsoleSummary {
			total: store.console.len(),
			errors,
			warnings,
		}
	}

	/// Derived network view for diagnostics: failures (status >= 400), total
	/// bytes, and average response timing over the current epoch.
	pub fn network_summary(&self) -> NetworkSummary {
		let store = self.store.lock();
		let failed: Vec<NetworkResponseEntry> = store
			.responses
			.iter()
			.filter(|r| r.status >= 400)
			.cloned()
			.collect();
		let total_bytes = store.responses.iter().map(|r| r.size_bytes).sum();
		let average_response_ms = if store.responses.is_empty() {
			0
		} else {
			store.responses.iter().map(|r| r.timing_ms).sum::<u64>()
				/ store.responses.len() as u64
		};
		NetworkSummary {
			request_count: store.requests.len(),
			response_count: store.responses.len(),
			failed,
			total_bytes,
			average_response_ms,
		}
	}
}

fn push_bounded<T>(log: &mut VecDeque<T>, entry: T) {
	if log.len() == LOG_CAPACITY {
		log.pop_front();
	}
	log.push_back(entry);
}

/// Current Unix timestamp in milliseconds.
pub fn now_ms() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn begin_epoch_clears_every_log() {
		let telemetry = Telemetry::new();
		telemetry.push_console(ConsoleKind::Error, "boom".into());
		telemetry.record_request("1".into(), "https://a.test/x".into(), "GET".into());
		telemetry.record_response("1".into(), "https://a.test/x".into(), 200, 10);
		telemetry.push_page_error(PageErrorKind::UncaughtException, "bad".into());

		telemetry.begin_epoch();

		let counts = telemetry.counts();
		assert_eq!(counts.console, 0);
		assert_eq!(counts.requests, 0);
		assert_eq!(counts.responses, 0);
		assert_eq!(counts.page_errors, 0);
	}

	#[test]
	fn epoch_reset_also_drops_dispatch_times() {
		let telemetry = Telemetry::new();
		telemetry.record_request("1".into(), "https://a.test/x".into(), "GET".into());
		telemetry.begin_epoch();

		// Response for a request dispatched in the previous epoch: unmatched.
		telemetry.record_response("1".into(), "https://a.test/x".into(), 200, 10);
		assert_eq!(telemetry.response_entries()[0].timing_ms, 0);
	}

	#[test]
	fn unmatched_response_has_zero_timing() {
		let telemetry = Telemetry::new();
		telemetry.record_response("9".into(), "https://cache.test/hit".into(), 200, 512);
		assert_eq!(telemetry.response_entries()[0].timing_ms, 0);
	}

	#[test]
	fn failed_responses_are_those_at_or_above_400() {
		let telemetry = Telemetry::new();
		telemetry.record_response("1".into(), "https://a.test/ok".into(), 200, 100);
		telemetry.record_response("2".into(), "https://a.test/missing".into(), 404, 20);
		telemetry.record_response("3".into(), "https://a.test/oops".into(), 500, 30);

		let summary = telemetry.network_summary();
		assert_eq!(summary.failed.len(), 2);
		assert!(summary.failed.iter().any(|r| r.status == 404));
		assert!(!summary.failed.iter().any(|r| r.status == 200));
		assert_eq!(summary.total_bytes, 150);
	}

	#[test]
	fn console_summary_splits_errors_and_warnings() {
		let telemetry = Telemetry::new();
		telemetry.push_console(ConsoleKind::Log, "hello".into());
		telemetry.push_console(ConsoleKind::Warning, "deprecated".into());
		telemetry.push_console(ConsoleKind::Error, "broken".into());

		let summary = telemetry.console_summary();
		assert_eq!(summary.total, 3);
		assert_eq!(summary.errors.len(), 1);
		assert_eq!(summary.warnings.len(), 1);
	}

	#[test]
	fn console_filter_by_kind() {
		let telemetry = Telemetry::new();
		telemetry.push_console(ConsoleKind::Log, "a".into());
		telemetry.push_console(ConsoleKind::Error, "b".into());

		assert_eq!(telemetry.console_entries(None).len(), 2);
		assert_eq!(telemetry.console_entries(Some(ConsoleKind::Error)).len(), 1);
	}

	#[test]
	fn logs_are_bounded_drop_oldest() {
		let telemetry = Telemetry::new();
		for i in 0..(LOG_CAPACITY + 10) {
			telemetry.push_console(ConsoleKind::Log, format!("line {i}"));
		}
		let entries = telemetry.console_entries(None);
		assert_eq!(entries.len(), LOG_CAPACITY);
		assert_eq!(entries[0].text, "line 10");
	}
}
