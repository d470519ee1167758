//! The browser session owner.
//!
//! Exactly one browser process and one active page per daemon. The "current
//! page" lives in a single slot guarded by a generation counter: operations
//! capture `(page, generation)` up front, run their page I/O without any
//! lock held, and re-check the generation before reporting success. A
//! `load-auth` replaces the slot wholesale (never mutates it in place), so
//! racing operations fail with [`Error::PageReplaced`] instead of silently
//! acting on a stale handle.

pub mod cookies;
pub mod login;

mod listeners;

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
	CaptureScreenshotFormat, CloseParams, ReloadParams,
};
use chromiumoxide::cdp::browser_protocol::storage::GetCookiesParams;
use chromiumoxide::cdp::browser_protocol::target::{
	CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roost_protocol::{LocalStorageEntry, LoginData, LoginRequest, OriginState, StorageState};

use crate::config::{
	DaemonConfig, INTERACTION_TIMEOUT, LOGIN_NAVIGATION_WAIT, NAVIGATION_TIMEOUT, SETTLE_DELAY,
};
use crate::error::{Error, Result};
use crate::telemetry::{Telemetry, now_ms};

struct PageSlot {
	page: Page,
	generation: u64,
}

pub struct BrowserSession {
	browser: tokio::sync::Mutex<Browser>,
	handler_task: JoinHandle<()>,
	slot: Mutex<PageSlot>,
	listener_task: Mutex<Option<JoinHandle<()>>>,
	/// Explicit browsing context created by `load-auth`; `None` means the
	/// browser's default context from launch.
	context_id: Mutex<Option<BrowserContextId>>,
	current_url: Mutex<Option<String>>,
	telemetry: Telemetry,
	headless: bool,
	screenshots_dir: PathBuf,
}

impl BrowserSession {
	/// Launches the browser and opens the single page this daemon owns.
	pub async fn launch(config: &DaemonConfig, telemetry: Telemetry) -> Result<Self> {
		let mut builder = BrowserConfig::builder().window_size(1280, 800);
		if !config.headless {
			builder = builder.with_head();
		}
		let browser_config = builder.build().map_err(Error::Launch)?;

		let (browser, mut handler) = Browser::launch(browser_config)
			.await
			.map_err(|err| Error::Launch(err.to_string()))?;
		let handler_task = tokio::spawn(async move {
			while let Some(event) = handler.next().await {
				if let Err(err) = event {
					debug!(target = "roost.session", error = %err, "browser handler event error");
				}
			}
		});

		let page = browser
			.new_page("about:blank")
			.await
			.map_err(|err| Error::Launch(format!("failed to open initial page: {err}")))?;
		let listener = listeners::attach_telemetry(&page, telemetry.clone()).await?;

		info!(target = "roost.session", headless = config.headless, "browser session ready");
		Ok(Self {
			browser: tokio::sync::Mutex::new(browser),
			handler_task,
			slot: Mutex::new(PageSlot {
				page,
				generation: 0,
			}),
			listener_task: Mutex::new(Some(listener)),
			context_id: Mutex::new(None),
			current_url: Mutex::new(None),
			telemetry,
			headless: config.headless,
			screenshots_dir: config.screenshots_dir(),
		})
	}

	pub fn headless(&self) -> bool {
		self.headless
	}

	/// URL of the last successful navigation, if any.
	pub fn current_url(&self) -> Option<String> {
		self.current_url.lock().clone()
	}

	fn current(&self) -> (Page, u64) {
		let slot = self.slot.lock();
		(slot.page.clone(), slot.generation)
	}

	fn ensure_generation(&self, generation: u64) -> Result<()> {
		if self.slot.lock().generation == generation {
			Ok(())
		} else {
			Err(Error::PageReplaced)
		}
	}

	/// Navigates the page, starting a fresh telemetry epoch first.
	pub async fn navigate(&self, raw_url: &str) -> Result<(String, String)> {
		let url = normalize_url(raw_url)?;
		let (page, generation) = self.current();
		info!(target = "roost.session", url = %url, "navigate");

		// The epoch boundary sits before the navigation is issued, so no
		// telemetry from the outgoing page leaks into the new one.
		self.telemetry.begin_epoch();
		nav_step(NAVIGATION_TIMEOUT, &url, async {
			page.goto(url.as_str()).await.map(|_| ())
		})
		.await?;
		nav_step(NAVIGATION_TIMEOUT, &url, async {
			page.wait_for_navigation().await.map(|_| ())
		})
		.await?;
		tokio::time::sleep(SETTLE_DELAY).await;
		self.ensure_generation(generation)?;

		let final_url = page.url().await?.unwrap_or(url);
		let title = page.get_title().await?.unwrap_or_default();
		*self.current_url.lock() = Some(final_url.clone());
		Ok((final_url, title))
	}

	/// Reloads the current page; same epoch semantics as `navigate`.
	pub async fn reload(&self) -> Result<(String, String)> {
		let (page, generation) = self.current();
		let url = page.url().await?.unwrap_or_else(|| "about:blank".into());
		info!(target = "roost.session", url = %url, "reload");

		self.telemetry.begin_epoch();
		nav_step(NAVIGATION_TIMEOUT, &url, async {
			page.execute(ReloadParams::default()).await?;
			page.wait_for_navigation().await.map(|_| ())
		})
		.await?;
		tokio::time::sleep(SETTLE_DELAY).await;
		self.ensure_generation(generation)?;

		let final_url = page.url().await?.unwrap_or(url);
		let title = page.get_title().await?.unwrap_or_default();
		Ok((final_url, title))
	}

	pub async fn click(&self, selector: &str) -> Result<()> {
		let (page, generation) = self.current();
		let element = find_element(&page, selector).await?;
		element
			.click()
			.await
			.map_err(|err| interaction_error(selector, err))?;
		self.ensure_generation(generation)
	}

	/// Sets an input's value wholesale and fires `input`/`change`, the way
	/// framework-controlled inputs expect.
	pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
		let (page, generation) = self.current();
		let element = find_element(&page, selector).await?;
		fill_element(&element, selector, value).await?;
		self.ensure_generation(generation)
	}

	/// Types into an element keystroke by keystroke, with an optional
	/// per-character delay.
	pub async fn type_text(&self, selector: &str, text: &str, delay_ms: Option<u64>) -> Result<()> {
		let (page, generation) = self.current();
		let element = find_element(&page, selector).await?;
		element
			.click()
			.await
			.map_err(|err| interaction_error(selector, err))?;
		match delay_ms.filter(|delay| *delay > 0) {
			Some(delay) => {
				for ch in text.chars() {
					element
						.type_str(ch.to_string())
						.await
						.map_err(|err| interaction_error(selector, err))?;
					tokio::time::sleep(Duration::from_millis(delay)).await;
				}
			}
			None => {
				element
					.type_str(text)
					.await
					.map_err(|err| interaction_error(selector, err))?;
			}
		}
		self.ensure_generation(generation)
	}

	/// Runs a script in page context and returns its JSON result. A thrown
	/// script error surfaces as [`Error::Eval`]; the daemon stays up.
	pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
		let (page, generation) = self.current();
		let result = match tokio::time::timeout(INTERACTION_TIMEOUT, page.evaluate(script)).await {
			Ok(Ok(result)) => result,
			Ok(Err(err)) => return Err(Error::Eval(err.to_string())),
			Err(_) => {
				return Err(Error::Timeout {
					ms: INTERACTION_TIMEOUT.as_millis() as u64,
					what: "script evaluation".into(),
				});
			}
		};
		self.ensure_generation(generation)?;
		Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
	}

	/// Captures a PNG screenshot to `path`, defaulting into the screenshots
	/// directory with a timestamped name. Returns `(path, byte length)`.
	pub async fn screenshot(&self, path: Option<String>, full_page: bool) -> Result<(String, u64)> {
		let (page, _) = self.current();
		let target = match path {
			Some(path) => PathBuf::from(path),
			None => self
				.screenshots_dir
				.join(format!("screenshot-{}.png", now_ms())),
		};
		let params = ScreenshotParams::builder()
			.format(CaptureScreenshotFormat::Png)
			.full_page(full_page)
			.build();
		let bytes = page.screenshot(params).await?;
		if let Some(parent) = target.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}
		tokio::fs::write(&target, &bytes).await?;
		Ok((target.display().to_string(), bytes.len() as u64))
	}

	/// Overrides the viewport metrics.
	pub async fn resize(&self, width: u32, height: u32) -> Result<()> {
		let (page, generation) = self.current();
		let params = SetDeviceMetricsOverrideParams::builder()
			.width(width as i64)
			.height(height as i64)
			.device_scale_factor(1.0)
			.mobile(false)
			.build()
			.map_err(Error::InvalidRequest)?;
		page.execute(params).await?;
		self.ensure_generation(generation)
	}

	/// Best-effort login flow: fill the username/password fields resolved
	/// from the candidate selector lists, submit, then race a navigation
	/// wait against a soft timeout — SPAs may never hard-navigate, and that
	/// is not treated as failure. Reports the resulting page either way.
	pub async fn login(&self, request: &LoginRequest) -> Result<LoginData> {
		if let Some(url) = &request.url {
			self.navigate(url).await?;
		}
		let (page, generation) = self.current();

		let username_candidates =
			login::candidates(request.username_selector.as_deref(), login::USERNAME_SELECTORS);
		let username_field = first_match(&page, &username_candidates)
			.await
			.ok_or_else(|| Error::Interaction {
				selector: username_candidates.join(", "),
				message: "no username field matched".into(),
			})?;
		let password_candidates =
			login::candidates(request.password_selector.as_deref(), login::PASSWORD_SELECTORS);
		let password_field = first_match(&page, &password_candidates)
			.await
			.ok_or_else(|| Error::Interaction {
				selector: password_candidates.join(", "),
				message: "no password field matched".into(),
			})?;

		fill_element(&username_field, "username field", &request.username).await?;
		fill_element(&password_field, "password field", &request.password).await?;

		let submit_candidates =
			login::candidates(request.submit_selector.as_deref(), login::SUBMIT_SELECTORS);
		match first_match(&page, &submit_candidates).await {
			Some(button) => {
				if let Err(err) = button.click().await {
					debug!(target = "roost.session", error = %err, "submit click failed, falling back to Enter");
					press_enter(&password_field).await?;
				}
			}
			None => press_enter(&password_field).await?,
		}

		let navigation_completed = tokio::select! {
			result = page.wait_for_navigation() => result.is_ok(),
			_ = tokio::time::sleep(LOGIN_NAVIGATION_WAIT) => false,
		};
		tokio::time::sleep(SETTLE_DELAY).await;
		self.ensure_generation(generation)?;

		let url = page.url().await.ok().flatten();
		let title = page.get_title().await.ok().flatten();
		let (screenshot, _) = self.screenshot(None, false).await?;
		if let Some(url) = &url {
			*self.current_url.lock() = Some(url.clone());
		}
		info!(
			target = "roost.session",
			url = ?url,
			navigation_completed,
			"login flow finished"
		);
		Ok(LoginData {
			url,
			title,
			screenshot,
			navigation_completed,
		})
	}

	/// Live url/title of the current page, best effort.
	pub async fn page_info(&self) -> (Option<String>, Option<String>) {
		let (page, _) = self.current();
		let url = page.url().await.ok().flatten();
		let title = page.get_title().await.ok().flatten();
		(url, title)
	}

	/// Serializes the context's storage state: all cookies, plus the
	/// current page origin's localStorage (CDP offers no context-wide
	/// localStorage dump, so origins are captured best-effort).
	pub async fn storage_state(&self) -> Result<StorageState> {
		let (page, _) = self.current();
		let mut params = GetCookiesParams::default();
		params.browser_context_id = self.context_id.lock().clone();
		let cookies_response = {
			let browser = self.browser.lock().await;
			browser.execute(params).await?
		};
		let cookies = cookies_response
			.cookies
			.iter()
			.map(cookies::from_cdp_cookie)
			.collect();
		let origins = current_origin_storage(&page).await;
		Ok(StorageState { cookies, origins })
	}

	/// Builds a fresh browsing context and page from `state`, then retires
	/// the old pair. The generation bump makes racing operations fail with
	/// [`Error::PageReplaced`] instead of touching the retired page.
	pub async fn restore_storage_state(&self, state: &StorageState) -> Result<()> {
		let (new_context, new_page) = {
			let browser = self.browser.lock().await;
			let context_response = browser
				.execute(CreateBrowserContextParams::default())
				.await?;
			let new_context = context_response.browser_context_id.clone();
			let mut target: CreateTargetParams = "about:blank".into();
			target.browser_context_id = Some(new_context.clone());
			let new_page = browser.new_page(target).await?;
			(new_context, new_page)
		};

		let cookie_params = state
			.cookies
			.iter()
			.map(cookies::to_cookie_param)
			.collect::<Result<Vec<_>>>()?;
		if !cookie_params.is_empty() {
			new_page.set_cookies(cookie_params).await?;
		}
		for origin in &state.origins {
			if let Err(err) = seed_origin_storage(&new_page, origin).await {
				warn!(
					target = "roost.auth",
					origin = %origin.origin,
					error = %err,
					"failed to restore origin storage"
				);
			}
		}
		if !state.origins.is_empty() {
			let _ = new_page.goto("about:blank").await;
		}

		let listener = listeners::attach_telemetry(&new_page, self.telemetry.clone()).await?;
		self.telemetry.begin_epoch();

		let old_page = {
			let mut slot = self.slot.lock();
			let old = slot.page.clone();
			slot.page = new_page;
			slot.generation += 1;
			old
		};
		if let Some(task) = self.listener_task.lock().replace(listener) {
			task.abort();
		}
		*self.current_url.lock() = None;

		if let Err(err) = old_page.execute(CloseParams::default()).await {
			debug!(target = "roost.session", error = %err, "old page close failed");
		}
		let old_context = self.context_id.lock().replace(new_context);
		if let Some(old) = old_context {
			let browser = self.browser.lock().await;
			if let Err(err) = browser.execute(DisposeBrowserContextParams::new(old)).await {
				debug!(target = "roost.session", error = %err, "old context dispose failed");
			}
		}
		info!(target = "roost.auth", "browsing context replaced from stored state");
		Ok(())
	}

	/// Closes the browser and stops the background tasks.
	pub async fn close(&self) {
		if let Some(task) = self.listener_task.lock().take() {
			task.abort();
		}
		let mut browser = self.browser.lock().await;
		if let Err(err) = browser.close().await {
			warn!(target = "roost.session", error = %err, "browser close failed");
		}
		self.handler_task.abort();
	}
}

/// Prepends `https://` to bare hostnames and rejects unparseable URLs.
fn normalize_url(raw: &str) -> Result<String> {
	let candidate = if raw.contains("://") || raw.starts_with("about:") {
		raw.to_string()
	} else {
		format!("https://{raw}")
	};
	if candidate.starts_with("about:") {
		return Ok(candidate);
	}
	url::Url::parse(&candidate)
		.map(|parsed| parsed.to_string())
		.map_err(|err| Error::InvalidRequest(format!("invalid url {raw:?}: {err}")))
}

async fn nav_step<T>(
	limit: Duration,
	url: &str,
	fut: impl Future<Output = std::result::Result<T, chromiumoxide::error::CdpError>>,
) -> Result<T> {
	match tokio::time::timeout(limit, fut).await {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => Err(Error::Navigation {
			url: url.into(),
			message: err.to_string(),
		}),
		Err(_) => Err(Error::Navigation {
			url: url.into(),
			message: format!("timed out after {}ms", limit.as_millis()),
		}),
	}
}

async fn find_element(page: &Page, selector: &str) -> Result<Element> {
	match tokio::time::timeout(INTERACTION_TIMEOUT, page.find_element(selector)).await {
		Ok(Ok(element)) => Ok(element),
		Ok(Err(err)) => Err(Error::Interaction {
			selector: selector.into(),
			message: format!("element not found: {err}"),
		}),
		Err(_) => Err(Error::Timeout {
			ms: INTERACTION_TIMEOUT.as_millis() as u64,
			what: format!("element {selector}"),
		}),
	}
}

/// First selector in `selectors` that resolves to an element, if any.
async fn first_match(page: &Page, selectors: &[&str]) -> Option<Element> {
	for selector in selectors {
		if let Ok(Ok(element)) =
			tokio::time::timeout(Duration::from_millis(1500), page.find_element(*selector)).await
		{
			return Some(element);
		}
	}
	None
}

async fn fill_element(element: &Element, selector: &str, value: &str) -> Result<()> {
	element
		.focus()
		.await
		.map_err(|err| interaction_error(selector, err))?;
	// Set the value through the native setter so framework-bound inputs
	// (React and friends) observe the change, then fire the usual events.
	let literal = serde_json::to_string(value)?;
	let function = format!(
		r#"function() {{
			const value = {literal};
			const proto = this instanceof HTMLTextAreaElement
				? window.HTMLTextAreaElement.prototype
				: window.HTMLInputElement.prototype;
			const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
			if (descriptor && descriptor.set) {{
				descriptor.set.call(this, value);
			}} else {{
				this.value = value;
			}}
			this.dispatchEvent(new Event('input', {{ bubbles: true }}));
			this.dispatchEvent(new Event('change', {{ bubbles: true }}));
		}}"#
	);
	element
		.call_js_fn(function, false)
		.await
		.map_err(|err| interaction_error(selector, err))?;
	Ok(())
}

async fn press_enter(element: &Element) -> Result<()> {
	element
		.press_key("Enter")
		.await
		.map_err(|err| interaction_error("password field", err))?;
	Ok(())
}

fn interaction_error(selector: &str, err: chromiumoxide::error::CdpError) -> Error {
	Error::Interaction {
		selector: selector.into(),
		message: err.to_string(),
	}
}

/// localStorage for the page's current origin, when it has one.
async fn current_origin_storage(page: &Page) -> Vec<OriginState> {
	let origin = match page.evaluate("window.location.origin").await {
		Ok(result) => result
			.value()
			.and_then(|value| value.as_str())
			.map(str::to_string),
		Err(_) => None,
	};
	let Some(origin) = origin.filter(|origin| origin.starts_with("http")) else {
		return Vec::new();
	};

	let entries: Vec<(String, String)> =
		match page.evaluate("JSON.stringify(Object.entries(window.localStorage))").await {
			Ok(result) => result
				.value()
				.and_then(|value| value.as_str())
				.and_then(|raw| serde_json::from_str(raw).ok())
				.unwrap_or_default(),
			Err(err) => {
				warn!(target = "roost.auth", error = %err, "localStorage capture failed");
				Vec::new()
			}
		};
	if entries.is_empty() {
		return Vec::new();
	}
	vec![OriginState {
		origin,
		local_storage: entries
			.into_iter()
			.map(|(name, value)| LocalStorageEntry { name, value })
			.collect(),
	}]
}

/// Visits `origin` and seeds its localStorage from the stored entries.
async fn seed_origin_storage(page: &Page, origin: &OriginState) -> Result<()> {
	nav_step(NAVIGATION_TIMEOUT, &origin.origin, async {
		page.goto(origin.origin.as_str()).await.map(|_| ())
	})
	.await?;
	let pairs: Vec<(&str, &str)> = origin
		.local_storage
		.iter()
		.map(|entry| (entry.name.as_str(), entry.value.as_str()))
		.collect();
	let payload = serde_json::to_string(&pairs)?;
	let script = format!(
		"for (const [key, value] of {payload}) {{ window.localStorage.setItem(key, value); }}"
	);
	page.evaluate(script)
		.await
		.map_err(|err| Error::Eval(err.to_string()))?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_hostnames_get_https() {
		assert_eq!(normalize_url("example.com").unwrap(), "https://example.com/");
	}

	#[test]
	fn schemes_are_preserved() {
		assert_eq!(
			normalize_url("http://example.com/a").unwrap(),
			"http://example.com/a"
		);
		assert_eq!(normalize_url("about:blank").unwrap(), "about:blank");
	}

	#[test]
	fn garbage_urls_are_rejected() {
		assert!(normalize_url("http://").is_err());
	}
}
