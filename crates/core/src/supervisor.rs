//! Idle supervisor: timer-driven shutdown after control-plane inactivity.
//!
//! Liveness is defined by "a control request arrived recently", independent
//! of browser activity. Every inbound request calls [`IdleSupervisor::touch`];
//! the daemon's run loop awaits [`IdleSupervisor::idle_expired`] and tears
//! everything down when it resolves.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

#[derive(Clone)]
pub struct IdleSupervisor {
	period: Duration,
	deadline: Arc<Mutex<Instant>>,
	touched: Arc<Notify>,
}

impl IdleSupervisor {
	pub fn new(period: Duration) -> Self {
		Self {
			period,
			deadline: Arc::new(Mutex::new(Instant::now() + period)),
			touched: Arc::new(Notify::new()),
		}
	}

	/// Pushes the idle deadline out by one full period.
	pub fn touch(&self) {
		*self.deadline.lock() = Instant::now() + self.period;
		self.touched.notify_waiters();
	}

	/// Resolves once the idle window elapses with no intervening `touch`.
	pub async fn idle_expired(&self) {
		loop {
			let deadline = *self.deadline.lock();
			tokio::select! {
				_ = tokio::time::sleep_until(deadline) => {
					// A touch may have landed between the sleep firing and
					// this check; only expire if the deadline still stands.
					if Instant::now() >= *self.deadline.lock() {
						return;
					}
				}
				_ = self.touched.notified() => {}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn expires_after_quiet_period() {
		let supervisor = IdleSupervisor::new(Duration::from_secs(60));
		tokio::time::timeout(Duration::from_secs(61), supervisor.idle_expired())
			.await
			.expect("should expire inside the window");
	}

	#[tokio::test(start_paused = true)]
	async fn touch_extends_the_deadline() {
		let supervisor = IdleSupervisor::new(Duration::from_secs(60));
		let waiter = {
			let supervisor = supervisor.clone();
			tokio::spawn(async move { supervisor.idle_expired().await })
		};

		// Touch at t+30: the deadline moves to t+90, so nothing fires at t+60.
		tokio::time::sleep(Duration::from_secs(30)).await;
		supervisor.touch();
		tokio::time::sleep(Duration::from_secs(45)).await;
		assert!(!waiter.is_finished());

		// No further touches: expiry lands at t+90.
		tokio::time::sleep(Duration::from_secs(20)).await;
		tokio::time::timeout(Duration::from_secs(1), waiter)
			.await
			.expect("should have expired")
			.unwrap();
	}
}
