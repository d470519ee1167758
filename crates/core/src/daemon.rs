//! Daemon assembly and the run loop.
//!
//! Startup order: state dir, browser session, listener bind, descriptor
//! write. The run loop serves the control API until one of the shutdown
//! sources fires — idle expiry, an explicit `/stop`, or an OS termination
//! signal — then removes the descriptor and closes the browser. A panic
//! that escapes the run loop is fatal by design: post-panic automation
//! state is not trusted, and the process is never respawned from within.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::info;

use crate::auth::AuthStateManager;
use crate::config::DaemonConfig;
use crate::error::{Error, Result};
use crate::handoff::WaitGate;
use crate::persist::SessionPersister;
use crate::server::{self, SessionContext, SharedContext};
use crate::session::BrowserSession;
use crate::supervisor::IdleSupervisor;
use crate::telemetry::Telemetry;

pub struct Daemon {
	ctx: SharedContext,
	listener: tokio::net::TcpListener,
	shutdown_rx: watch::Receiver<bool>,
}

impl Daemon {
	/// Launches the browser, binds the loopback listener, and writes the
	/// session descriptor.
	pub async fn start(config: DaemonConfig) -> Result<Self> {
		std::fs::create_dir_all(&config.state_dir).map_err(|err| {
			Error::Configuration(format!(
				"cannot create state dir {}: {err}",
				config.state_dir.display()
			))
		})?;

		let telemetry = Telemetry::new();
		let session = BrowserSession::launch(&config, telemetry.clone()).await?;

		let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
		let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
			Error::Configuration(format!(
				"cannot bind {addr}: {err} (is another daemon already running?)"
			))
		})?;

		let (shutdown_tx, shutdown_rx) = watch::channel(false);
		let ctx = Arc::new(SessionContext {
			persister: SessionPersister::new(config.descriptor_path()),
			auth: AuthStateManager::new(config.auth_dir()),
			supervisor: IdleSupervisor::new(config.idle_timeout),
			gate: WaitGate::new(),
			started_at: Instant::now(),
			started_at_epoch: unix_now(),
			shutdown: shutdown_tx,
			telemetry,
			session,
			config,
		});
		ctx.persister.write(&ctx.descriptor())?;

		info!(
			target = "roost.daemon",
			port = ctx.config.port,
			pid = std::process::id(),
			idle_timeout_secs = ctx.config.idle_timeout.as_secs(),
			"daemon listening"
		);
		Ok(Self {
			ctx,
			listener,
			shutdown_rx,
		})
	}

	/// Serves the control API until a shutdown source fires, then tears
	/// down: descriptor removed, browser closed.
	pub async fn run(self) -> Result<()> {
		let app = server::router(self.ctx.clone());
		let ctx = self.ctx.clone();
		let mut shutdown_rx = self.shutdown_rx;
		let shutdown = async move {
			let reason = shutdown_reason(&ctx.supervisor, &mut shutdown_rx).await;
			info!(target = "roost.daemon", reason, "shutting down");
		};

		axum::serve(self.listener, app)
			.with_graceful_shutdown(shutdown)
			.await?;

		self.ctx.persister.remove();
		self.ctx.session.close().await;
		info!(target = "roost.daemon", "shutdown complete");
		Ok(())
	}
}

#[cfg(unix)]
async fn shutdown_reason(
	supervisor: &IdleSupervisor,
	stop_rx: &mut watch::Receiver<bool>,
) -> &'static str {
	use tokio::signal::unix::{SignalKind, signal};

	let mut sigterm = signal(SignalKind::terminate()).ok();
	let mut sigint = signal(SignalKind::interrupt()).ok();
	loop {
		tokio::select! {
			_ = supervisor.idle_expired() => return "idle timeout",
			result = stop_rx.changed() => {
				if result.is_err() || *stop_rx.borrow() {
					return "stop requested";
				}
			}
			_ = recv_signal(&mut sigterm) => return "SIGTERM",
			_ = recv_signal(&mut sigint) => return "SIGINT",
		}
	}
}

#[cfg(unix)]
async fn recv_signal(slot: &mut Option<tokio::signal::unix::Signal>) {
	match slot {
		Some(signal) => {
			signal.recv().await;
		}
		None => std::future::pending().await,
	}
}

#[cfg(not(unix))]
async fn shutdown_reason(
	supervisor: &IdleSupervisor,
	stop_rx: &mut watch::Receiver<bool>,
) -> &'static str {
	loop {
		tokio::select! {
			_ = supervisor.idle_expired() => return "idle timeout",
			result = stop_rx.changed() => {
				if result.is_err() || *stop_rx.borrow() {
					return "stop requested";
				}
			}
			_ = tokio::signal::ctrl_c() => return "Ctrl+C",
		}
	}
}

fn unix_now() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}
