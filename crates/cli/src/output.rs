//! Result rendering: human text by default, the raw envelope for `--format
//! json` so agents and scripts can consume output unchanged.

use colored::Colorize;
use serde_json::Value;

use crate::client::ClientError;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// The daemon's JSON envelope, verbatim
	Json,
}

/// Prints a successful command result.
pub fn render(command: &str, data: &Value, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			let envelope = serde_json::json!({ "success": true, "data": data });
			println!("{}", pretty(&envelope));
		}
		OutputFormat::Text => render_text(command, data),
	}
}

/// Prints a failure. Error messages pass through verbatim; the exit code
/// is the caller's job.
pub fn print_error(err: &anyhow::Error, format: OutputFormat) {
	eprintln!("{} {err}", "error:".red().bold());
	if format == OutputFormat::Json {
		let code = err
			.downcast_ref::<ClientError>()
			.map(ClientError::code)
			.unwrap_or(roost_protocol::ErrorCode::InternalError);
		let envelope: roost_protocol::Envelope<Value> =
			roost_protocol::Envelope::err(code, err.to_string());
		println!("{}", pretty(&serde_json::to_value(&envelope).unwrap_or(Value::Null)));
	}
}

fn render_text(command: &str, data: &Value) {
	match data {
		Value::Object(map) if !map.is_empty() => {
			println!("{} {}", command.bold(), "ok".green());
			for (key, value) in map {
				println!("  {}: {}", key.dimmed(), flat_value(value));
			}
		}
		Value::Null => println!("{} {}", command.bold(), "ok".green()),
		other => {
			println!("{} {}", command.bold(), "ok".green());
			println!("{}", flat_value(other));
		}
	}
}

/// One-line rendering for a field value; nested structures stay JSON.
fn flat_value(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		Value::Null => "-".into(),
		other => other.to_string(),
	}
}

fn pretty(value: &Value) -> String {
	serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strings_render_bare() {
		assert_eq!(flat_value(&Value::String("hello".into())), "hello");
	}

	#[test]
	fn nested_values_render_as_json() {
		let value = serde_json::json!({"a": 1});
		assert_eq!(flat_value(&value), r#"{"a":1}"#);
		assert_eq!(flat_value(&serde_json::json!([1, 2])), "[1,2]");
	}

	#[test]
	fn null_renders_as_dash() {
		assert_eq!(flat_value(&Value::Null), "-");
	}
}
