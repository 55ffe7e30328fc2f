use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, anyhow, bail};
use log::{error, info, warn};

use crate::{
    browser::{self, BrowserWellTable, Credentials},
    cli::RemoveArgs,
    config::RemoteProfile,
    discovery, engine,
    executor::{DeletionExecutor, ExecutionReport},
    io_utils, prompt, report,
    resolve_cmd::write_artifact,
    webdriver::WebDriverSession,
    well::{self, Dataset},
};

const EXPORT_POLL: Duration = Duration::from_secs(2);

pub fn execute(args: &RemoveArgs) -> Result<()> {
    let profile = match &args.profile {
        Some(path) => RemoteProfile::load(path)?,
        None => RemoteProfile::default(),
    };
    if let Some(path) = &args.write_profile {
        profile
            .save(path)
            .with_context(|| format!("Writing profile to {path:?}"))?;
        info!("Remote profile written to {path:?}");
        return Ok(());
    }

    let identifiers = removal_targets(args)?;
    if identifiers.is_empty() {
        println!("No wells to remove.");
        return Ok(());
    }
    if args.dry_run {
        let listing = args.from_removed.as_ref().unwrap_or(&args.removed_output);
        println!(
            "Dry run: {} well(s) would be removed; see {listing:?}",
            identifiers.len()
        );
        return Ok(());
    }
    if profile.requires_project() && args.project.is_none() {
        bail!("The remote profile navigates to a project; pass --project with its title");
    }
    if !args.assume_yes
        && !prompt::confirm_interactively(&format!(
            "Remove {} well(s) from the remote project?",
            identifiers.len()
        ))?
    {
        println!("Aborted; nothing was removed.");
        return Ok(());
    }

    let mut session = browser::open_session(&args.webdriver_url, &profile.browser)?;
    let outcome = run_removal(&mut session, &profile, args, &identifiers);
    if let Err(err) = &outcome {
        error!("Removal failed: {err:#}");
        save_diagnostic_screenshot(&session, args);
    }
    if let Err(err) = session.close() {
        warn!("Failed to close WebDriver session: {err}");
    }
    let execution = outcome?;
    report::print_report(&report::execution_summary(&execution));
    Ok(())
}

/// Identifiers to remove, in order. Writes the removal file unless it was the input.
fn removal_targets(args: &RemoveArgs) -> Result<Vec<String>> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    if let Some(path) = &args.from_removed {
        let delimiter = io_utils::resolve_input_delimiter(path, args.delimiter);
        let removal = well::load_dataset(path, delimiter, encoding)
            .with_context(|| format!("Loading removal list from {path:?}"))?;
        info!("Loaded {} well(s) to remove from {path:?}", removal.len());
        return Ok(removal.records.into_iter().map(|r| r.identifier).collect());
    }

    let path = dataset_path(args)?;
    let delimiter = io_utils::resolve_input_delimiter(&path, args.delimiter);
    let dataset = well::load_dataset(&path, delimiter, encoding)?;
    resolve_and_record(&dataset, args)
}

fn dataset_path(args: &RemoveArgs) -> Result<PathBuf> {
    if let Some(path) = &args.input {
        return Ok(path.clone());
    }
    match (&args.export_dir, &args.export_prefix) {
        (Some(dir), Some(prefix)) => {
            info!("Waiting for export '{prefix}*.csv' in {dir:?}");
            discovery::wait_for_export(
                dir,
                prefix,
                Duration::from_secs(args.export_wait_secs),
                EXPORT_POLL,
            )
        }
        _ => Err(anyhow!(
            "Provide --input, --export-dir with --export-prefix, or --from-removed"
        )),
    }
}

fn resolve_and_record(dataset: &Dataset, args: &RemoveArgs) -> Result<Vec<String>> {
    let policy = args.policy.policy();
    let resolution = engine::resolve(&dataset.records, &policy);
    report::print_report(&report::resolution_summary(
        "SUMMARY",
        dataset,
        resolution.as_ref(),
        &policy,
    ));
    let Some(resolution) = resolution else {
        return Ok(Vec::new());
    };
    write_artifact(&args.removed_output, dataset, &resolution.removed, "wells to remove")?;
    Ok(resolution
        .removed
        .iter()
        .map(|r| r.identifier.clone())
        .collect())
}

fn run_removal(
    session: &mut WebDriverSession,
    profile: &RemoteProfile,
    args: &RemoveArgs,
    identifiers: &[String],
) -> Result<ExecutionReport> {
    match (&args.username, &args.password) {
        (Some(username), Some(password)) => {
            let credentials = Credentials {
                username: username.clone(),
                password: password.clone(),
            };
            browser::sign_in(session, profile, &credentials)?;
        }
        _ => {
            info!("No credentials configured; assuming the browser profile is already signed in");
            session
                .navigate(&profile.app_url)
                .with_context(|| format!("Opening {}", profile.app_url))?;
        }
    }
    browser::navigate_to_wells(session, &profile.navigation, args.project.as_deref())?;

    let table = BrowserWellTable::new(session, profile.table.clone());
    let mut executor = DeletionExecutor::new(table, profile.timeouts.step_timeouts());
    executor.run(identifiers).map_err(|err| {
        report::print_report(&report::execution_summary(err.partial()));
        err.into()
    })
}

fn save_diagnostic_screenshot(session: &WebDriverSession, args: &RemoveArgs) {
    let path = args
        .screenshot_dir
        .join(format!("error_screenshot_{}.png", chrono::Utc::now().timestamp()));
    match session.save_screenshot(&path) {
        Ok(()) => info!("Screenshot saved to: {path:?}"),
        Err(err) => warn!("Could not save screenshot: {err}"),
    }
}
