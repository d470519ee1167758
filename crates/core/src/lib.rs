//! The roost daemon library.
//!
//! One process, one browser, one page. The daemon owns the browsing session
//! and exposes it over a loopback HTTP control API so that many short-lived
//! client invocations can share the same expensive, stateful session. This
//! crate holds everything daemon-side:
//!
//! - [`session`] — the browser session owner (navigate/click/fill/eval/...)
//! - [`telemetry`] — per-navigation-epoch console/network/error logs
//! - [`auth`] — named storage-state save/restore
//! - [`handoff`] — the wait/continue gate for manual user action
//! - [`server`] — the axum control API
//! - [`supervisor`] — timer-driven idle shutdown
//! - [`persist`] — the session descriptor file
//! - [`daemon`] — assembly and the run loop

pub mod auth;
pub mod config;
pub mod daemon;
pub mod error;
pub mod handoff;
pub mod persist;
pub mod server;
pub mod session;
pub mod supervisor;
pub mod telemetry;

pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::{Error, Result};
