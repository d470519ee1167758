//! Human-handoff gate.
//!
//! Some flows (CAPTCHA, 2FA, manual consent) cannot be scripted. The gate
//! is a flag plus a screenshot taken at the moment of waiting — never a
//! blocking call, so the daemon stays responsive to other commands while a
//! human works the page.

use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Default)]
struct GateState {
	waiting: bool,
	screenshot: Option<String>,
}

/// The wait/continue flag pair. Both transitions are idempotent.
#[derive(Clone, Default)]
pub struct WaitGate {
	state: Arc<Mutex<GateState>>,
}

impl WaitGate {
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks the session as waiting for a human, recording the screenshot
	/// captured at this moment.
	pub fn begin_wait(&self, screenshot: Option<String>) {
		let mut state = self.state.lock();
		state.waiting = true;
		state.screenshot = screenshot;
	}

	/// Clears the waiting flag. Returns `true` when the gate was actually
	/// waiting; continuing an idle gate is a no-op, not an error.
	pub fn continue_session(&self) -> bool {
		let mut state = self.state.lock();
		let was_waiting = state.waiting;
		state.waiting = false;
		state.screenshot = None;
		was_waiting
	}

	pub fn is_waiting(&self) -> bool {
		self.state.lock().waiting
	}

	pub fn screenshot(&self) -> Option<String> {
		self.state.lock().screenshot.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wait_then_continue() {
		let gate = WaitGate::new();
		assert!(!gate.is_waiting());

		gate.begin_wait(Some("/tmp/wait.png".into()));
		assert!(gate.is_waiting());
		assert_eq!(gate.screenshot().as_deref(), Some("/tmp/wait.png"));

		assert!(gate.continue_session());
		assert!(!gate.is_waiting());
		assert!(gate.screenshot().is_none());
	}

	#[test]
	fn continue_when_not_waiting_is_idempotent() {
		let gate = WaitGate::new();
		assert!(!gate.continue_session());
		assert!(!gate.continue_session());
	}

	#[test]
	fn repeated_wait_replaces_screenshot() {
		let gate = WaitGate::new();
		gate.begin_wait(Some("first.png".into()));
		gate.begin_wait(Some("second.png".into()));
		assert_eq!(gate.screenshot().as_deref(), Some("second.png"));
	}
}
