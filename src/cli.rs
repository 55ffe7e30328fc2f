use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::policy::TieBreakPolicy;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Resolve duplicate well records by API10 and remove the redundant ones",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split duplicate wells into keep and remove lists
    Resolve(ResolveArgs),
    /// Compare the legacy '0000' method against a tie-break policy on one dataset
    Simulate(SimulateArgs),
    /// Re-run resolution and compare it with a previous deletion file
    Reevaluate(ReevaluateArgs),
    /// Resolve duplicates and remove them through the web application
    Remove(RemoveArgs),
    /// List dataset and deletion files found in a directory
    Discover(DiscoverArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Most recent production date, then longest lateral, then non-'0000' API 14
    Full,
    /// Longest perforated lateral only
    Magnitude,
    /// Discard API 14 values ending in '0000'
    Legacy,
}

impl PolicyKind {
    pub fn policy(self) -> TieBreakPolicy {
        match self {
            PolicyKind::Full => TieBreakPolicy::full(),
            PolicyKind::Magnitude => TieBreakPolicy::magnitude(),
            PolicyKind::Legacy => TieBreakPolicy::legacy(),
        }
    }

    /// Infix inserted into artifact names.
    pub fn artifact_tag(self) -> Option<&'static str> {
        match self {
            PolicyKind::Full => None,
            PolicyKind::Magnitude => Some("perf_length"),
            PolicyKind::Legacy => Some("legacy"),
        }
    }
}

/// Options shared by every command that reads a well export.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Well export to read; prompts with discovered files when omitted
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Directory searched for exports when --input is omitted
    #[arg(long = "search-dir", default_value = ".")]
    pub search_dir: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Project label for output file names (derived from the input name by default)
    #[arg(long = "project-name")]
    pub project_name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Tie-break policy used to choose the wells to keep
    #[arg(long, value_enum, default_value_t = PolicyKind::Full)]
    pub policy: PolicyKind,
    /// Directory receiving the keep/remove files
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Policy playing the old method
    #[arg(long, value_enum, default_value_t = PolicyKind::Legacy)]
    pub baseline: PolicyKind,
    /// Policy playing the new method
    #[arg(long, value_enum, default_value_t = PolicyKind::Magnitude)]
    pub candidate: PolicyKind,
    /// Directory receiving the four comparison files
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct ReevaluateArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Earlier deletion file to compare against; prompts when omitted and candidates exist
    #[arg(long)]
    pub previous: Option<PathBuf>,
    /// Skip the comparison even when deletion files are present
    #[arg(long = "no-previous", conflicts_with = "previous")]
    pub no_previous: bool,
    #[arg(long, value_enum, default_value_t = PolicyKind::Magnitude)]
    pub policy: PolicyKind,
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Well export to resolve
    #[arg(short = 'i', long = "input", conflicts_with_all = ["export_dir", "from_removed"])]
    pub input: Option<PathBuf>,
    /// Directory where the application drops its exports
    #[arg(long = "export-dir", requires = "export_prefix")]
    pub export_dir: Option<PathBuf>,
    /// File name prefix of the exports to wait for
    #[arg(long = "export-prefix")]
    pub export_prefix: Option<String>,
    /// Seconds to wait for a readable export to appear
    #[arg(long = "export-wait", default_value_t = 60)]
    pub export_wait_secs: u64,
    /// Existing removal file to execute instead of resolving a dataset
    #[arg(long = "from-removed")]
    pub from_removed: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = PolicyKind::Magnitude)]
    pub policy: PolicyKind,
    /// Where the wells selected for removal are written
    #[arg(long = "removed-output", default_value = "duplicate wells deleted perf length.csv")]
    pub removed_output: PathBuf,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Resolve and write the removal file without opening a browser
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Remote profile YAML overriding the built-in selectors
    #[arg(long)]
    pub profile: Option<PathBuf>,
    /// Write the effective profile to this path and exit
    #[arg(long = "write-profile")]
    pub write_profile: Option<PathBuf>,
    /// Project title used by navigation steps containing {project}
    #[arg(long)]
    pub project: Option<String>,
    /// WebDriver server endpoint
    #[arg(long = "webdriver-url", env = "WEBDRIVER_URL", default_value = "http://localhost:9515")]
    pub webdriver_url: String,
    /// Sign-in user name; sign-in is skipped when absent
    #[arg(long, env = "WELL_DEDUP_USERNAME")]
    pub username: Option<String>,
    #[arg(long, env = "WELL_DEDUP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Directory for diagnostic screenshots taken on failure
    #[arg(long = "screenshot-dir", default_value = ".")]
    pub screenshot_dir: PathBuf,
    /// Do not ask for confirmation before removing wells
    #[arg(short = 'y', long = "yes")]
    pub assume_yes: bool,
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Directory to scan
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
