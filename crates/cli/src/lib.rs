//! The roost control client.
//!
//! A short-lived process: ensure a daemon is running (spawning one if
//! needed), send exactly one command, render the result, exit. All state
//! lives in the daemon; the client holds none between invocations.

pub mod cli;
pub mod client;
pub mod commands;
pub mod logging;
pub mod output;
