//! `simulate` and `reevaluate`: compare two removal decisions on one dataset.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::{ReevaluateArgs, SimulateArgs},
    discovery, engine, io_utils, naming, prompt,
    reconcile::{identifier_set, reconcile},
    report::{self, ComparisonLabels},
    resolve_cmd::{load_input, write_artifact},
    well,
};

pub fn simulate(args: &SimulateArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let baseline = args.baseline.policy();
    let candidate = args.candidate.policy();

    info!("Simulating old method: {baseline}");
    let Some(old) = engine::resolve(&input.dataset.records, &baseline) else {
        println!("No duplicates found to process.");
        return Ok(());
    };
    info!("Applying new method: {candidate}");
    let Some(new) = engine::resolve(&input.dataset.records, &candidate) else {
        println!("No duplicates found to process.");
        return Ok(());
    };

    let old_label = format!("old method ({baseline})");
    let new_label = format!("new method ({candidate})");
    let reconciliation = reconcile(
        &identifier_set(old.removed.iter().copied()),
        &identifier_set(new.removed.iter().copied()),
    );
    report::print_report(&report::reconciliation_report(
        &reconciliation,
        &input.dataset,
        ComparisonLabels {
            a: &old_label,
            b: &new_label,
        },
    ));

    let project = &input.project;
    let path = |base: &str| args.output_dir.join(naming::artifact_name(base, None, project));
    let files = [
        (path("wells_kept_by_old_method"), &old.kept, "Wells kept by old method"),
        (path("wells_removed_by_old_method"), &old.removed, "Wells removed by old method"),
        (path("wells_kept_by_new_method"), &new.kept, "Wells kept by new method"),
        (path("wells_removed_by_new_method"), &new.removed, "Wells removed by new method"),
    ];
    for (file, records, what) in &files {
        write_artifact(file, &input.dataset, records, &what.to_lowercase())?;
    }

    report::print_report(&report::banner("SUMMARY"));
    let sides = [("Old method", &old, &baseline), ("New method", &new, &candidate)];
    for (title, resolution, policy) in sides {
        report::print_report(&report::resolution_summary(
            title,
            &input.dataset,
            Some(resolution),
            policy,
        ));
    }
    let listing = files
        .iter()
        .map(|(file, _, what)| (file.as_path(), *what))
        .collect::<Vec<_>>();
    report::print_report(&report::files_created(&listing));
    Ok(())
}

pub fn reevaluate(args: &ReevaluateArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let previous = previous_deletions(args)?;
    let policy = args.policy.policy();
    let tag = args.policy.artifact_tag();

    let Some(resolution) = engine::resolve(&input.dataset.records, &policy) else {
        println!("No duplicates found to re-evaluate.");
        return Ok(());
    };

    let kept_path = args
        .output_dir
        .join(naming::artifact_name("wells_to_keep", tag, &input.project));
    let removed_path = args
        .output_dir
        .join(naming::artifact_name("wells_to_remove", tag, &input.project));
    write_artifact(&kept_path, &input.dataset, &resolution.kept, "wells to keep")?;
    write_artifact(&removed_path, &input.dataset, &resolution.removed, "wells to remove")?;

    match &previous {
        Some(previous_path) => {
            let delimiter = io_utils::resolve_input_delimiter(previous_path, args.input.delimiter);
            let encoding = io_utils::resolve_encoding(args.input.input_encoding.as_deref())?;
            let old = well::load_dataset(previous_path, delimiter, encoding)
                .with_context(|| format!("Loading previous deletions from {previous_path:?}"))?;
            let new_label = format!("new method ({policy})");
            let reconciliation = reconcile(
                &identifier_set(&old.records),
                &identifier_set(resolution.removed.iter().copied()),
            );
            report::print_report(&report::reconciliation_report(
                &reconciliation,
                &input.dataset,
                ComparisonLabels {
                    a: "old deletion method",
                    b: &new_label,
                },
            ));
        }
        None => info!("No previous deletion file; skipping comparison"),
    }

    report::print_report(&report::resolution_summary(
        "SUMMARY",
        &input.dataset,
        Some(&resolution),
        &policy,
    ));
    report::print_report(&report::files_created(&[
        (kept_path.as_path(), "Wells that should be kept"),
        (removed_path.as_path(), "Wells that should be removed"),
    ]));
    if previous.is_some() {
        println!(
            "\nReview the comparison above to see which wells the old method removed wrongly \
             and which it missed."
        );
    }
    Ok(())
}

fn previous_deletions(args: &ReevaluateArgs) -> Result<Option<PathBuf>> {
    if args.no_previous {
        return Ok(None);
    }
    if let Some(path) = &args.previous {
        return Ok(Some(path.clone()));
    }
    find_previous(&args.input.search_dir)
}

fn find_previous(dir: &Path) -> Result<Option<PathBuf>> {
    let candidates = discovery::discover_candidates(dir)?;
    if candidates.deletion_files.is_empty() {
        info!("No deletion files found in {dir:?}");
        return Ok(None);
    }
    if !prompt::confirm_interactively("Compare against a previous deletion file?")? {
        return Ok(None);
    }
    prompt::choose_interactively(
        "Found the following deletion files:",
        &candidates.deletion_files,
    )
    .map(Some)
}
