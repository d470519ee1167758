//! Command dispatch: one subcommand, one control request, one rendered
//! result. The daemon subcommands and the no-spawn `status`/`stop` paths
//! are handled before the generic ensure-then-send arm.

use anyhow::Result;
use serde_json::json;

use roost_core::{Daemon, DaemonConfig, persist};
use roost_protocol::{
	AuthNameRequest, ClickRequest, EvalRequest, FillRequest, LoginRequest, NavigateRequest,
	ResizeRequest, ScreenshotRequest, TypeTextRequest,
};

use crate::cli::{Cli, Commands, DaemonAction};
use crate::client::{self, ControlClient};
use crate::output::{self, OutputFormat};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let port = client::resolve_port(cli.port);
	let format = cli.format;

	match cli.command {
		Commands::Daemon(args) => match args.action {
			DaemonAction::Run => run_daemon(port).await,
		},
		Commands::Status => status(port, format).await,
		Commands::Stop => stop(port, format).await,
		command => {
			let control = ControlClient::new(port)?;
			control.ensure_server().await?;
			let (name, data) = send(&control, command).await?;
			output::render(name, &data, format);
			Ok(())
		}
	}
}

/// Maps one subcommand onto its endpoint and returns `(name, data)`.
async fn send(
	control: &ControlClient,
	command: Commands,
) -> Result<(&'static str, serde_json::Value)> {
	let result = match command {
		Commands::Navigate { url } => (
			"navigate",
			control.post("/navigate", &NavigateRequest { url }).await?,
		),
		Commands::Screenshot { path, full_page } => (
			"screenshot",
			control
				.post("/screenshot", &ScreenshotRequest { path, full_page })
				.await?,
		),
		Commands::Click { selector } => (
			"click",
			control.post("/click", &ClickRequest { selector }).await?,
		),
		Commands::Fill { selector, value } => (
			"fill",
			control.post("/fill", &FillRequest { selector, value }).await?,
		),
		Commands::Type {
			selector,
			text,
			delay,
		} => (
			"type",
			control
				.post(
					"/type",
					&TypeTextRequest {
						selector,
						text,
						delay,
					},
				)
				.await?,
		),
		Commands::Eval { script } => (
			"eval",
			control.post("/eval", &EvalRequest { script }).await?,
		),
		Commands::Resize { width, height } => (
			"resize",
			control.post("/resize", &ResizeRequest { width, height }).await?,
		),
		Commands::Reload => ("reload", control.post("/reload", &json!({})).await?),
		Commands::Login {
			url,
			username,
			password,
			username_selector,
			password_selector,
			submit_selector,
		} => (
			"login",
			control
				.post(
					"/login",
					&LoginRequest {
						url,
						username,
						password,
						username_selector,
						password_selector,
						submit_selector,
					},
				)
				.await?,
		),
		Commands::SaveAuth { name } => (
			"save-auth",
			control.post("/save-auth", &AuthNameRequest { name }).await?,
		),
		Commands::LoadAuth { name } => (
			"load-auth",
			control.post("/load-auth", &AuthNameRequest { name }).await?,
		),
		Commands::WaitForUser => (
			"wait-for-user",
			control.post("/wait-for-user", &json!({})).await?,
		),
		Commands::Continue => ("continue", control.post("/continue", &json!({})).await?),
		Commands::Console { kind } => {
			let query: Vec<(&str, &str)> = kind
				.as_deref()
				.map(|kind| vec![("type", kind)])
				.unwrap_or_default();
			("console", control.get("/console", &query).await?)
		}
		Commands::Network { kind } => {
			let query: Vec<(&str, &str)> = kind
				.as_deref()
				.map(|kind| vec![("type", kind)])
				.unwrap_or_default();
			("network", control.get("/network", &query).await?)
		}
		Commands::Diagnostics => ("diagnostics", control.get("/diagnostics", &[]).await?),
		Commands::Health => ("health", control.get("/health", &[]).await?),
		Commands::Status | Commands::Stop | Commands::Daemon(_) => {
			unreachable!("handled before the ensure-then-send arm")
		}
	};
	Ok(result)
}

/// Runs the daemon in the foreground. The client spawns this detached.
async fn run_daemon(port: u16) -> Result<()> {
	let config = DaemonConfig::from_env(Some(port))?;
	let daemon = Daemon::start(config).await?;
	daemon.run().await?;
	Ok(())
}

/// Reports daemon liveness without ever spawning one.
async fn status(port: u16, format: OutputFormat) -> Result<()> {
	let control = ControlClient::new(port)?;
	if control.probe_health().await {
		let data = control.get("/health", &[]).await?;
		output::render("status", &data, format);
	} else {
		let stale = persist::read_descriptor(&client::descriptor_path()).is_some();
		output::render(
			"status",
			&json!({ "running": false, "staleDescriptor": stale }),
			format,
		);
	}
	Ok(())
}

/// Stops a running daemon; stopping an absent daemon is not an error.
async fn stop(port: u16, format: OutputFormat) -> Result<()> {
	let control = ControlClient::new(port)?;
	if !control.probe_health().await {
		output::render(
			"stop",
			&json!({ "stopped": false, "message": "daemon not running" }),
			format,
		);
		return Ok(());
	}
	let data = control.post("/stop", &json!({})).await?;
	output::render("stop", &data, format);
	Ok(())
}
