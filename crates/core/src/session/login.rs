//! Cross-framework login selector heuristics.
//!
//! The defaults are a best-effort guess over common login form markup, not
//! a correctness guarantee for arbitrary forms. Callers can override any of
//! the three selector roles per request.

/// Candidate selectors tried in order for the username field.
pub const USERNAME_SELECTORS: &[&str] = &[
	"input[name='username']",
	"input[name='email']",
	"input[type='email']",
	"input[id*='user' i]",
	"input[id*='email' i]",
	"input[autocomplete='username']",
	"input[type='text']",
];

/// Candidate selectors tried in order for the password field.
pub const PASSWORD_SELECTORS: &[&str] = &[
	"input[type='password']",
	"input[name='password']",
	"input[autocomplete='current-password']",
];

/// Candidate selectors tried in order for the submit control.
pub const SUBMIT_SELECTORS: &[&str] = &[
	"button[type='submit']",
	"input[type='submit']",
	"button[id*='login' i]",
	"button[class*='login' i]",
	"button[id*='signin' i]",
	"form button",
];

/// Resolved selector candidates for one login attempt: an override collapses
/// the role to exactly that selector.
pub fn candidates<'a>(override_selector: Option<&'a str>, defaults: &'a [&'a str]) -> Vec<&'a str> {
	match override_selector {
		Some(selector) => vec![selector],
		None => defaults.to_vec(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn override_replaces_the_default_list() {
		let list = candidates(Some("#my-user"), USERNAME_SELECTORS);
		assert_eq!(list, vec!["#my-user"]);
	}

	#[test]
	fn no_override_keeps_defaults_in_order() {
		let list = candidates(None, PASSWORD_SELECTORS);
		assert_eq!(list.first(), Some(&"input[type='password']"));
		assert_eq!(list.len(), PASSWORD_SELECTORS.len());
	}
}
