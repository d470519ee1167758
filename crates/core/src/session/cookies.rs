//! Conversions between wire storage-state cookies and CDP cookie types.

use chromiumoxide::cdp::browser_protocol::network::{
	Cookie as CdpCookie, CookieParam, CookieSameSite, TimeSinceEpoch,
};

use roost_protocol::{Cookie, SameSite};

use crate::error::{Error, Result};

/// Builds the CDP cookie parameter used to install a persisted cookie.
pub fn to_cookie_param(cookie: &Cookie) -> Result<CookieParam> {
	let mut builder = CookieParam::builder()
		.name(cookie.name.clone())
		.value(cookie.value.clone());
	if let Some(domain) = &cookie.domain {
		builder = builder.domain(domain.clone());
	}
	if let Some(path) = &cookie.path {
		builder = builder.path(path.clone());
	}
	if let Some(secure) = cookie.secure {
		builder = builder.secure(secure);
	}
	if let Some(http_only) = cookie.http_only {
		builder = builder.http_only(http_only);
	}
	if let Some(same_site) = cookie.same_site {
		builder = builder.same_site(same_site_to_cdp(same_site));
	}
	if let Some(expires) = cookie.expires {
		if expires >= 0.0 {
			builder = builder.expires(TimeSinceEpoch::new(expires));
		}
	}
	builder
		.build()
		.map_err(|err| Error::InvalidRequest(format!("invalid cookie: {err}")))
}

/// Converts a CDP cookie into the persisted wire shape.
pub fn from_cdp_cookie(cookie: &CdpCookie) -> Cookie {
	Cookie {
		name: cookie.name.clone(),
		value: cookie.value.clone(),
		domain: Some(cookie.domain.clone()),
		path: Some(cookie.path.clone()),
		expires: expires_from_cdp(cookie.expires),
		http_only: Some(cookie.http_only),
		secure: Some(cookie.secure),
		same_site: cookie.same_site.as_ref().map(same_site_from_cdp),
	}
}

fn same_site_to_cdp(same_site: SameSite) -> CookieSameSite {
	match same_site {
		SameSite::Strict => CookieSameSite::Strict,
		SameSite::Lax => CookieSameSite::Lax,
		SameSite::None => CookieSameSite::None,
	}
}

fn same_site_from_cdp(same_site: &CookieSameSite) -> SameSite {
	match same_site {
		CookieSameSite::Strict => SameSite::Strict,
		CookieSameSite::Lax => SameSite::Lax,
		CookieSameSite::None => SameSite::None,
	}
}

/// CDP reports `-1` for session cookies; those have no expiry to persist.
fn expires_from_cdp(expires: f64) -> Option<f64> {
	(expires >= 0.0).then_some(expires)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cookie_param_carries_all_set_fields() {
		let cookie = Cookie::new("session", "abc", ".example.com")
			.path("/")
			.http_only(true)
			.secure(true)
			.same_site(SameSite::Strict)
			.expires(1900000000.0);

		let param = to_cookie_param(&cookie).unwrap();
		assert_eq!(param.name, "session");
		assert_eq!(param.value, "abc");
		assert_eq!(param.domain.as_deref(), Some(".example.com"));
		assert_eq!(param.path.as_deref(), Some("/"));
		assert_eq!(param.secure, Some(true));
		assert_eq!(param.http_only, Some(true));
		assert!(param.expires.is_some());
	}

	#[test]
	fn session_cookie_expiry_is_dropped() {
		assert_eq!(expires_from_cdp(-1.0), None);
		assert_eq!(expires_from_cdp(1900000000.0), Some(1900000000.0));

		let cookie = Cookie::new("sid", "x", "example.com").expires(-1.0);
		let param = to_cookie_param(&cookie).unwrap();
		assert!(param.expires.is_none());
	}

	#[test]
	fn same_site_maps_both_ways() {
		for (wire, cdp) in [
			(SameSite::Strict, CookieSameSite::Strict),
			(SameSite::Lax, CookieSameSite::Lax),
			(SameSite::None, CookieSameSite::None),
		] {
			assert_eq!(same_site_from_cdp(&same_site_to_cdp(wire)), wire);
			assert_eq!(same_site_from_cdp(&cdp), wire);
		}
	}
}
