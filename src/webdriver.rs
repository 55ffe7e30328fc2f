//! Minimal W3C WebDriver client over blocking HTTP.
//!
//! Only the commands the removal workflow needs are implemented. Every call is
//! a single request/response exchange against a running driver server such as
//! `chromedriver`; waits are built on top as polling loops.

use std::{
    fmt, fs,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use base64::{Engine, engine::general_purpose::STANDARD};
use log::{debug, warn};
use reqwest::{Method, blocking::Client};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::executor::UiError;

/// JSON key under which W3C drivers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
/// WebDriver key code for the Enter key.
pub const ENTER: &str = "\u{E007}";

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("HTTP request to WebDriver failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebDriver returned '{error}': {message}")]
    Command { error: String, message: String },
    #[error("Malformed WebDriver response: {0}")]
    MalformedResponse(String),
    #[error("Screenshot payload is not valid base64: {0}")]
    Screenshot(#[from] base64::DecodeError),
    #[error("Writing screenshot failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebDriver session already closed")]
    Closed,
}

impl WebDriverError {
    /// True for errors that mean "the element is not there (yet)".
    pub fn is_transient_lookup(&self) -> bool {
        matches!(
            self,
            WebDriverError::Command { error, .. }
                if error == "no such element" || error == "stale element reference"
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum By {
    Css,
    Xpath,
}

impl By {
    fn strategy(self) -> &'static str {
        match self {
            By::Css => "css selector",
            By::Xpath => "xpath",
        }
    }
}

/// An element lookup: a strategy and its selector text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub selector: String,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            by: By::Css,
            selector: selector.into(),
        }
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self {
            by: By::Xpath,
            selector: expression.into(),
        }
    }

    /// Replaces every `{name}` in the selector with `value`.
    pub fn fill(&self, name: &str, value: &str) -> Locator {
        Locator {
            by: self.by,
            selector: self.selector.replace(&format!("{{{name}}}"), value),
        }
    }

    pub fn contains_placeholder(&self, name: &str) -> bool {
        self.selector.contains(&format!("{{{name}}}"))
    }

    fn to_body(&self) -> Value {
        json!({ "using": self.by.strategy(), "value": self.selector })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.by.strategy(), self.selector)
    }
}

/// Opaque element reference issued by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element(String);

impl Element {
    pub fn id(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Result<Self, WebDriverError> {
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(|id| Element(id.to_string()))
            .ok_or_else(|| WebDriverError::MalformedResponse(format!("expected element, got {value}")))
    }

    fn to_arg(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: String,
    #[serde(default)]
    message: String,
}

/// One browser session. Closed on [`WebDriverSession::close`] or drop.
#[derive(Debug)]
pub struct WebDriverSession {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WebDriverSession {
    /// Opens a session on the driver at `server_url` with `capabilities` as `alwaysMatch`.
    pub fn start(server_url: &str, capabilities: &Value) -> Result<Self, WebDriverError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let base_url = server_url.trim_end_matches('/').to_string();
        let mut session = Self {
            client,
            base_url,
            session_id: None,
        };
        let body = json!({ "capabilities": { "alwaysMatch": capabilities } });
        let value = session.send(Method::POST, format!("{}/session", session.base_url), Some(body))?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| WebDriverError::MalformedResponse(format!("no sessionId in {value}")))?;
        debug!("Opened WebDriver session {id}");
        session.session_id = Some(id.to_string());
        Ok(session)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<String, WebDriverError> {
        let id = self.session_id.as_deref().ok_or(WebDriverError::Closed)?;
        Ok(format!("{}/session/{id}{path}", self.base_url))
    }

    fn send(
        &self,
        method: Method,
        url: String,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send()?;
        let status = response.status();
        let payload: Value = response.json()?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(value);
        }
        match serde_json::from_value::<ErrorPayload>(value) {
            Ok(err) => Err(WebDriverError::Command {
                error: err.error,
                message: err.message,
            }),
            Err(_) => Err(WebDriverError::MalformedResponse(format!(
                "HTTP {status} without error payload"
            ))),
        }
    }

    fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, WebDriverError> {
        let url = self.endpoint(path)?;
        self.send(method, url, body)
    }

    pub fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))?;
        Ok(())
    }

    pub fn current_url(&self) -> Result<String, WebDriverError> {
        let value = self.command(Method::GET, "/url", None)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WebDriverError::MalformedResponse(format!("expected URL string, got {value}")))
    }

    pub fn find_elements(&self, locator: &Locator) -> Result<Vec<Element>, WebDriverError> {
        let value = self.command(Method::POST, "/elements", Some(locator.to_body()))?;
        elements_from(&value)
    }

    /// Looks `locator` up relative to `parent`; XPath expressions should start with `./`.
    pub fn find_child(
        &self,
        parent: &Element,
        locator: &Locator,
    ) -> Result<Element, WebDriverError> {
        let path = format!("/element/{}/element", parent.id());
        let value = self.command(Method::POST, &path, Some(locator.to_body()))?;
        Element::from_value(&value)
    }

    pub fn is_displayed(&self, element: &Element) -> Result<bool, WebDriverError> {
        self.element_flag(element, "displayed")
    }

    pub fn is_enabled(&self, element: &Element) -> Result<bool, WebDriverError> {
        self.element_flag(element, "enabled")
    }

    fn element_flag(&self, element: &Element, flag: &str) -> Result<bool, WebDriverError> {
        let value = self.command(Method::GET, &format!("/element/{}/{flag}", element.id()), None)?;
        value
            .as_bool()
            .ok_or_else(|| WebDriverError::MalformedResponse(format!("expected boolean, got {value}")))
    }

    pub fn click(&self, element: &Element) -> Result<(), WebDriverError> {
        self.command(Method::POST, &format!("/element/{}/click", element.id()), Some(json!({})))?;
        Ok(())
    }

    pub fn clear(&self, element: &Element) -> Result<(), WebDriverError> {
        self.command(Method::POST, &format!("/element/{}/clear", element.id()), Some(json!({})))?;
        Ok(())
    }

    pub fn send_keys(&self, element: &Element, text: &str) -> Result<(), WebDriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.id()),
            Some(json!({ "text": text })),
        )?;
        Ok(())
    }

    pub fn execute(&self, script: &str, args: &[Value]) -> Result<Value, WebDriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
    }

    pub fn scroll_into_view(&self, element: &Element) -> Result<(), WebDriverError> {
        self.execute("arguments[0].scrollIntoView(true);", &[element.to_arg()])?;
        Ok(())
    }

    pub fn screenshot(&self) -> Result<Vec<u8>, WebDriverError> {
        let value = self.command(Method::GET, "/screenshot", None)?;
        let encoded = value
            .as_str()
            .ok_or_else(|| WebDriverError::MalformedResponse("screenshot is not a string".into()))?;
        Ok(STANDARD.decode(encoded)?)
    }

    pub fn save_screenshot(&self, path: &Path) -> Result<(), WebDriverError> {
        let png = self.screenshot()?;
        fs::write(path, png)?;
        Ok(())
    }

    /// Deletes the session. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), WebDriverError> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        debug!("Closing WebDriver session {id}");
        self.send(Method::DELETE, format!("{}/session/{id}", self.base_url), None)?;
        Ok(())
    }

    /// Polls `probe` until it yields a value or `timeout` elapses.
    ///
    /// Transient lookup failures count as "not yet"; any other driver error ends the wait.
    pub fn wait_until<T, F>(
        &self,
        what: &str,
        timeout: Duration,
        mut probe: F,
    ) -> Result<T, UiError>
    where
        F: FnMut(&Self) -> Result<Option<T>, WebDriverError>,
    {
        let deadline = Instant::now() + timeout;
        loop {
            match probe(self) {
                Ok(Some(found)) => return Ok(found),
                Ok(None) => {}
                Err(err) if err.is_transient_lookup() => {}
                Err(err) => return Err(UiError::Driver(err)),
            }
            if Instant::now() >= deadline {
                return Err(UiError::Timeout {
                    what: what.to_string(),
                    timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<Element, UiError> {
        self.wait_until(&format!("visible {locator}"), timeout, |s| {
            first_matching(s, locator, |s, el| s.is_displayed(el))
        })
    }

    pub fn wait_clickable(&self, locator: &Locator, timeout: Duration) -> Result<Element, UiError> {
        self.wait_until(&format!("clickable {locator}"), timeout, |s| {
            first_matching(s, locator, |s, el| Ok(s.is_displayed(el)? && s.is_enabled(el)?))
        })
    }

    pub fn wait_absent(&self, locator: &Locator, timeout: Duration) -> Result<(), UiError> {
        self.wait_until(&format!("removal of {locator}"), timeout, |s| {
            Ok(s.find_elements(locator)?.is_empty().then_some(()))
        })
    }

    pub fn wait_for_url<F>(
        &self,
        what: &str,
        timeout: Duration,
        accept: F,
    ) -> Result<String, UiError>
    where
        F: Fn(&str) -> bool,
    {
        self.wait_until(what, timeout, |s| {
            let url = s.current_url()?;
            Ok(accept(&url).then_some(url))
        })
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("Failed to close WebDriver session: {err}");
        }
    }
}

fn elements_from(value: &Value) -> Result<Vec<Element>, WebDriverError> {
    value
        .as_array()
        .ok_or_else(|| WebDriverError::MalformedResponse(format!("expected element list, got {value}")))?
        .iter()
        .map(Element::from_value)
        .collect()
}

fn first_matching<F>(
    session: &WebDriverSession,
    locator: &Locator,
    mut accept: F,
) -> Result<Option<Element>, WebDriverError>
where
    F: FnMut(&WebDriverSession, &Element) -> Result<bool, WebDriverError>,
{
    for element in session.find_elements(locator)? {
        match accept(session, &element) {
            Ok(true) => return Ok(Some(element)),
            Ok(false) => {}
            Err(err) if err.is_transient_lookup() => {}
            Err(err) => return Err(err),
        }
    }
    Ok(None)
}
