//! Command-line surface. Each subcommand maps 1:1 onto a control endpoint.

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

/// Root CLI for roost.
#[derive(Parser, Debug)]
#[command(name = "roost")]
#[command(about = "One shared browser session, many short-lived commands")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format: text (default) or json
	#[arg(short = 'f', long, global = true, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Control port (overrides ROOST_PORT and the session descriptor)
	#[arg(long, global = true, value_name = "PORT")]
	pub port: Option<u16>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Navigate the shared page to a URL.
	Navigate {
		#[arg(value_name = "URL")]
		url: String,
	},
	/// Capture a screenshot of the current page.
	Screenshot {
		/// Output path (defaults into the state screenshots dir)
		#[arg(long, value_name = "PATH")]
		path: Option<String>,
		/// Capture the full scrollable page
		#[arg(long)]
		full_page: bool,
	},
	/// Click the first element matching a selector.
	Click {
		#[arg(value_name = "SELECTOR")]
		selector: String,
	},
	/// Set an input's value and fire input/change events.
	Fill {
		#[arg(value_name = "SELECTOR")]
		selector: String,
		#[arg(value_name = "VALUE")]
		value: String,
	},
	/// Type into an element keystroke by keystroke.
	Type {
		#[arg(value_name = "SELECTOR")]
		selector: String,
		#[arg(value_name = "TEXT")]
		text: String,
		/// Per-keystroke delay in milliseconds
		#[arg(long, value_name = "MS")]
		delay: Option<u64>,
	},
	/// Evaluate a script in page context and print its result.
	Eval {
		#[arg(value_name = "SCRIPT")]
		script: String,
	},
	/// Resize the viewport.
	Resize {
		#[arg(value_name = "WIDTH")]
		width: u32,
		#[arg(value_name = "HEIGHT")]
		height: u32,
	},
	/// Reload the current page.
	Reload,
	/// Best-effort login: heuristic selectors, soft navigation wait.
	Login {
		/// Login page URL (defaults to the current page)
		#[arg(long, value_name = "URL")]
		url: Option<String>,
		#[arg(short, long, value_name = "USER")]
		username: String,
		#[arg(short, long, value_name = "PASS")]
		password: String,
		#[arg(long, value_name = "SELECTOR")]
		username_selector: Option<String>,
		#[arg(long, value_name = "SELECTOR")]
		password_selector: Option<String>,
		#[arg(long, value_name = "SELECTOR")]
		submit_selector: Option<String>,
	},
	/// Save the browsing context's storage state under a name.
	SaveAuth {
		#[arg(value_name = "NAME")]
		name: String,
	},
	/// Replace the browsing context from a saved storage state.
	LoadAuth {
		#[arg(value_name = "NAME")]
		name: String,
	},
	/// Flag the session as waiting for manual user action.
	WaitForUser,
	/// Clear the waiting flag and report the current page.
	Continue,
	/// Console entries for the current navigation epoch.
	Console {
		/// Filter: error, warning, log, info, or debug
		#[arg(long = "type", value_name = "KIND")]
		kind: Option<String>,
	},
	/// Network entries for the current navigation epoch.
	Network {
		/// Filter: request or response
		#[arg(long = "type", value_name = "KIND")]
		kind: Option<String>,
	},
	/// On-demand diagnostics summary (console, network, page errors).
	Diagnostics,
	/// Daemon health report (spawns a daemon when none is running).
	Health,
	/// Report whether a daemon is running, without spawning one.
	Status,
	/// Stop the daemon.
	Stop,
	/// Daemon lifecycle.
	Daemon(DaemonArgs),
}

#[derive(Args, Debug)]
pub struct DaemonArgs {
	#[command(subcommand)]
	pub action: DaemonAction,
}

#[derive(Subcommand, Debug)]
pub enum DaemonAction {
	/// Run the daemon in the foreground. The client spawns this detached;
	/// running it by hand is useful for debugging.
	Run,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn navigate_parses_positional_url() {
		let cli = Cli::try_parse_from(["roost", "navigate", "https://example.com"]).unwrap();
		match cli.command {
			Commands::Navigate { url } => assert_eq!(url, "https://example.com"),
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn login_requires_credentials() {
		assert!(Cli::try_parse_from(["roost", "login"]).is_err());
		let cli = Cli::try_parse_from([
			"roost", "login", "-u", "me", "-p", "secret", "--url", "https://x.test",
		])
		.unwrap();
		match cli.command {
			Commands::Login { username, url, .. } => {
				assert_eq!(username, "me");
				assert_eq!(url.as_deref(), Some("https://x.test"));
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn global_port_flag_parses_anywhere() {
		let cli = Cli::try_parse_from(["roost", "--port", "5001", "daemon", "run"]).unwrap();
		assert_eq!(cli.port, Some(5001));
		let cli = Cli::try_parse_from(["roost", "reload", "--port", "5002"]).unwrap();
		assert_eq!(cli.port, Some(5002));
	}

	#[test]
	fn console_type_filter_parses() {
		let cli = Cli::try_parse_from(["roost", "console", "--type", "error"]).unwrap();
		match cli.command {
			Commands::Console { kind } => assert_eq!(kind.as_deref(), Some("error")),
			other => panic!("unexpected command: {other:?}"),
		}
	}
}
