//! Browser-backed [`WellTable`] plus the sign-in and navigation steps that
//! lead to it.

use std::{fmt, thread, time::Duration};

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};

use crate::{
    config::{
        BrowserSettings, IDENTIFIER_PLACEHOLDER, NavigationStep, PROJECT_PLACEHOLDER, RemoteProfile,
        SignInProfile, TableProfile,
    },
    executor::{UiError, WellTable},
    webdriver::{ENTER, Element, Locator, WebDriverSession},
};

const MASK_AUTOMATION_SCRIPT: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opens a session on `server_url` configured from `browser`.
pub fn open_session(server_url: &str, browser: &BrowserSettings) -> Result<WebDriverSession> {
    info!("Connecting to WebDriver at {server_url}");
    let session = WebDriverSession::start(server_url, &browser.capabilities())
        .with_context(|| format!("Starting {} session via {server_url}", browser.browser_name))?;
    if browser.mask_automation
        && let Err(err) = session.execute(MASK_AUTOMATION_SCRIPT, &[])
    {
        debug!("Could not mask automation flag: {err}");
    }
    info!("{} WebDriver session ready", browser.browser_name);
    Ok(session)
}

/// Signs in, retrying the whole handshake a fixed number of times.
pub fn sign_in(
    session: &WebDriverSession,
    profile: &RemoteProfile,
    credentials: &Credentials,
) -> Result<()> {
    let settings = &profile.sign_in;
    let max_attempts = settings.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        info!("Sign-in attempt {attempt}/{max_attempts}");
        match try_sign_in(session, &profile.app_url, settings, credentials) {
            Ok(()) => {
                info!("Sign-in completed");
                return Ok(());
            }
            Err(err) if attempt >= max_attempts => {
                warn!("All {max_attempts} sign-in attempts failed");
                return Err(err).context("Signing in to the remote application");
            }
            Err(err) => {
                warn!(
                    "Sign-in attempt {attempt} failed: {err:#}. Retrying in {:?}",
                    settings.retry_delay()
                );
                thread::sleep(settings.retry_delay());
            }
        }
    }
}

fn try_sign_in(
    session: &WebDriverSession,
    app_url: &str,
    settings: &SignInProfile,
    credentials: &Credentials,
) -> Result<()> {
    let timeout = settings.timeout();
    session.navigate(app_url)?;

    let username = session.wait_visible(&settings.username_input, timeout)?;
    session.clear(&username)?;
    session.send_keys(&username, &credentials.username)?;
    let next = session.wait_clickable(&settings.next_button, timeout)?;
    session.scroll_into_view(&next)?;
    session.click(&next)?;

    let password = session.wait_visible(&settings.password_input, timeout)?;
    session.clear(&password)?;
    session.send_keys(&password, &credentials.password)?;
    let submit = session.wait_clickable(&settings.submit_button, timeout)?;
    session.click(&submit)?;

    if let Some(prompt) = &settings.stay_signed_in {
        match session.wait_clickable(prompt, timeout) {
            Ok(button) => {
                session.click(&button)?;
                debug!("Accepted stay-signed-in prompt");
            }
            Err(err) => debug!("No stay-signed-in prompt: {err}"),
        }
    }

    let markers = &settings.ready_url_contains;
    let url = session.wait_for_url("application landing page", timeout, |url| {
        markers.is_empty() || markers.iter().any(|m| url.contains(m.as_str()))
    })?;
    debug!("Landed on {url}");
    Ok(())
}

/// Resolves the `{project}` placeholder of a navigation target.
pub fn navigation_target(step: &NavigationStep, project: Option<&str>) -> Result<Locator> {
    if !step.target.contains_placeholder(PROJECT_PLACEHOLDER) {
        return Ok(step.target.clone());
    }
    let project = project.ok_or_else(|| {
        anyhow!(
            "Navigation step '{}' needs a project title; pass --project",
            step.label
        )
    })?;
    Ok(step.target.fill(PROJECT_PLACEHOLDER, project))
}

pub fn navigate_to_wells(
    session: &WebDriverSession,
    steps: &[NavigationStep],
    project: Option<&str>,
) -> Result<()> {
    for step in steps {
        let target = navigation_target(step, project)?;
        info!("Navigation: {}", step.label);
        let element = session
            .wait_clickable(&target, step.timeout())
            .with_context(|| format!("Navigation step '{}'", step.label))?;
        session
            .click(&element)
            .with_context(|| format!("Clicking for navigation step '{}'", step.label))?;
    }
    Ok(())
}

/// The well table of the currently open project.
pub struct BrowserWellTable<'s> {
    session: &'s mut WebDriverSession,
    selectors: TableProfile,
}

impl<'s> BrowserWellTable<'s> {
    pub fn new(session: &'s mut WebDriverSession, selectors: TableProfile) -> Self {
        Self { session, selectors }
    }

    fn row_cell(&self, identifier: &str) -> Locator {
        self.selectors.row_cell.fill(IDENTIFIER_PLACEHOLDER, identifier)
    }
}

impl WellTable for BrowserWellTable<'_> {
    type Row = Element;

    fn submit_filter(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError> {
        let input = self.session.wait_visible(&self.selectors.filter_input, timeout)?;
        self.session.clear(&input)?;
        self.session.send_keys(&input, identifier)?;
        self.session.send_keys(&input, ENTER)?;
        Ok(())
    }

    fn locate_row(&mut self, identifier: &str, timeout: Duration) -> Result<Element, UiError> {
        let cell = self.row_cell(identifier);
        self.session.wait_clickable(&cell, timeout)
    }

    fn select_row(&mut self, row: &Element) -> Result<(), UiError> {
        let container = self.session.find_child(row, &self.selectors.row_container)?;
        self.session.click(&container)?;
        Ok(())
    }

    fn request_removal(&mut self, timeout: Duration) -> Result<(), UiError> {
        let button = self.session.wait_clickable(&self.selectors.remove_button, timeout)?;
        self.session.click(&button)?;
        Ok(())
    }

    fn confirm_removal(&mut self, timeout: Duration) -> Result<(), UiError> {
        let button = self.session.wait_clickable(&self.selectors.confirm_button, timeout)?;
        self.session.click(&button)?;
        Ok(())
    }

    fn wait_until_gone(&mut self, identifier: &str, timeout: Duration) -> Result<(), UiError> {
        let cell = self.row_cell(identifier);
        self.session.wait_absent(&cell, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_placeholder_is_filled() {
        let step = NavigationStep::new(
            "open project",
            Locator::xpath("//div[@title='{project}']//button"),
            20,
        );
        let target = navigation_target(&step, Some("02 - Eagleford Legacy")).unwrap();
        assert_eq!(
            target,
            Locator::xpath("//div[@title='02 - Eagleford Legacy']//button")
        );
    }

    #[test]
    fn missing_project_is_an_error() {
        let step = NavigationStep::new(
            "open project",
            Locator::xpath("//div[@title='{project}']"),
            20,
        );
        let err = navigation_target(&step, None).unwrap_err();
        assert!(err.to_string().contains("--project"));
    }

    #[test]
    fn static_steps_need_no_project() {
        let step = NavigationStep::new("open menu", Locator::css("button.menu"), 10);
        assert_eq!(navigation_target(&step, None).unwrap(), step.target);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials {
            username: "ops@example.test".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("ops@example.test"));
        assert!(!rendered.contains("hunter2"));
    }
}
