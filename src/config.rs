//! Remote application profile: where to sign in, how to reach the well table,
//! and which selectors drive it.
//!
//! Stored as YAML. Every field has a default matching the production
//! application, so a profile file only needs to list what differs.

use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{executor::StepTimeouts, webdriver::Locator};

pub const IDENTIFIER_PLACEHOLDER: &str = "identifier";
pub const PROJECT_PLACEHOLDER: &str = "project";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteProfile {
    pub app_url: String,
    pub sign_in: SignInProfile,
    /// Clicks that lead from the landing page to the project's well table.
    pub navigation: Vec<NavigationStep>,
    pub table: TableProfile,
    pub timeouts: TimeoutSettings,
    pub browser: BrowserSettings,
}

impl Default for RemoteProfile {
    fn default() -> Self {
        Self {
            app_url: "https://tilden.combocurve.com".to_string(),
            sign_in: SignInProfile::default(),
            navigation: vec![
                NavigationStep::new(
                    "open menu",
                    Locator::css("button[data-testid='drawer-button']"),
                    10,
                ),
                NavigationStep::new(
                    "open projects",
                    Locator::xpath("//span[contains(text(), 'Projects')]"),
                    10,
                ),
                NavigationStep::new(
                    "open project",
                    Locator::xpath(
                        "//div[@title='{project}']/ancestor::*[@role='row'][1]//button[contains(., 'Work')]",
                    ),
                    20,
                ),
                NavigationStep::new(
                    "open project wells",
                    Locator::xpath(
                        "//a[contains(@href, '/manage-wells') and .//span[contains(text(), 'Project Wells')]]",
                    ),
                    15,
                ),
            ],
            table: TableProfile::default(),
            timeouts: TimeoutSettings::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl RemoteProfile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening profile {path:?}"))?;
        let profile: RemoteProfile = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing profile YAML in {path:?}"))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating profile {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing profile YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing profile to YAML string")
    }

    pub fn validate(&self) -> Result<()> {
        if self.app_url.trim().is_empty() {
            bail!("Profile 'app_url' cannot be empty");
        }
        if !self.table.row_cell.contains_placeholder(IDENTIFIER_PLACEHOLDER) {
            bail!("Profile 'table.row_cell' must contain the {{{IDENTIFIER_PLACEHOLDER}}} placeholder");
        }
        if self.sign_in.attempts == 0 {
            bail!("Profile 'sign_in.attempts' must be at least 1");
        }
        Ok(())
    }

    /// True when some navigation step needs a project title.
    pub fn requires_project(&self) -> bool {
        self.navigation
            .iter()
            .any(|step| step.target.contains_placeholder(PROJECT_PLACEHOLDER))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInProfile {
    pub username_input: Locator,
    pub next_button: Locator,
    pub password_input: Locator,
    pub submit_button: Locator,
    /// Optional "stay signed in?" prompt; clicked when it shows up.
    pub stay_signed_in: Option<Locator>,
    /// Sign-in succeeds once the current URL contains any of these.
    pub ready_url_contains: Vec<String>,
    pub timeout_secs: u64,
    pub attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for SignInProfile {
    fn default() -> Self {
        Self {
            username_input: Locator::css("input[name='loginfmt']"),
            next_button: Locator::css("#idSIButton9"),
            password_input: Locator::css("input[name='passwd']"),
            submit_button: Locator::css("#idSIButton9"),
            stay_signed_in: Some(Locator::xpath(
                "//input[@type='submit' and @value='Yes'] | //button[normalize-space(text())='Yes']",
            )),
            ready_url_contains: vec!["dashboard".to_string(), "combocurve".to_string()],
            timeout_secs: 15,
            attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

impl SignInProfile {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    pub label: String,
    pub target: Locator,
    #[serde(default = "default_step_secs")]
    pub timeout_secs: u64,
}

fn default_step_secs() -> u64 {
    10
}

impl NavigationStep {
    pub fn new(label: &str, target: Locator, timeout_secs: u64) -> Self {
        Self {
            label: label.to_string(),
            target,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProfile {
    pub filter_input: Locator,
    /// Element showing an identifier; must contain `{identifier}`.
    pub row_cell: Locator,
    /// Relative lookup from `row_cell` to the clickable row.
    pub row_container: Locator,
    pub remove_button: Locator,
    pub confirm_button: Locator,
}

impl Default for TableProfile {
    fn default() -> Self {
        Self {
            filter_input: Locator::css("input[aria-label='API 14 Filter Input']"),
            row_cell: Locator::xpath("//div[@role='row']//div[contains(text(), '{identifier}')]"),
            row_container: Locator::xpath("./ancestor::div[@role='row'][1]"),
            remove_button: Locator::xpath("//button[contains(., 'Remove Wells')]"),
            confirm_button: Locator::xpath("//button[normalize-space(text())='Remove']"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub filter_secs: u64,
    pub locate_secs: u64,
    pub remove_secs: u64,
    pub confirm_secs: u64,
    pub verify_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            filter_secs: 10,
            locate_secs: 10,
            remove_secs: 10,
            confirm_secs: 10,
            verify_secs: 10,
        }
    }
}

impl TimeoutSettings {
    pub fn step_timeouts(&self) -> StepTimeouts {
        StepTimeouts {
            filter: Duration::from_secs(self.filter_secs),
            locate: Duration::from_secs(self.locate_secs),
            remove_action: Duration::from_secs(self.remove_secs),
            confirm: Duration::from_secs(self.confirm_secs),
            verify: Duration::from_secs(self.verify_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub browser_name: String,
    pub args: Vec<String>,
    /// Hides `navigator.webdriver` once the session is open.
    pub mask_automation: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        let args = [
            "--start-maximized",
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--disable-gpu",
            "--disable-extensions",
            "--disable-web-security",
            "--allow-running-insecure-content",
            "--disable-blink-features=AutomationControlled",
        ];
        Self {
            browser_name: "chrome".to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            mask_automation: true,
        }
    }
}

impl BrowserSettings {
    /// W3C capabilities for a new session.
    pub fn capabilities(&self) -> Value {
        let mut caps = json!({ "browserName": self.browser_name });
        if self.browser_name.eq_ignore_ascii_case("chrome") {
            caps["goog:chromeOptions"] = json!({
                "args": self.args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            });
        }
        caps
    }
}
