//! Probe behavior against ports with no daemon behind them.

use std::time::{Duration, Instant};

use roost_cli::client::ControlClient;

/// Picks a loopback port that nothing is listening on.
fn dead_port() -> u16 {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let port = listener.local_addr().unwrap().port();
	drop(listener);
	port
}

#[tokio::test]
async fn probe_against_dead_port_fails_without_hanging() {
	let control = ControlClient::new(dead_port()).unwrap();
	let started = Instant::now();
	assert!(!control.probe_health().await);
	// Connection refused should resolve well inside the probe timeout.
	assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn repeated_probes_are_deterministic() {
	let control = ControlClient::new(dead_port()).unwrap();
	for _ in 0..3 {
		assert!(!control.probe_health().await);
	}
}
