use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::info;

use crate::{
    cli::{InputArgs, ResolveArgs},
    discovery, engine, io_utils, naming, prompt, report,
    well::{self, Dataset, WellRecord},
};

/// A dataset together with the label its artifacts are named after.
pub(crate) struct LoadedInput {
    pub path: PathBuf,
    pub project: String,
    pub dataset: Dataset,
}

pub fn execute(args: &ResolveArgs) -> Result<()> {
    let input = load_input(&args.input)?;
    let policy = args.policy.policy();
    info!("Resolving duplicates in {:?} with policy: {policy}", input.path);

    let resolution = engine::resolve(&input.dataset.records, &policy);
    report::print_report(&report::resolution_summary(
        "SUMMARY",
        &input.dataset,
        resolution.as_ref(),
        &policy,
    ));
    let Some(resolution) = resolution else {
        return Ok(());
    };

    let tag = args.policy.artifact_tag();
    let kept_path = args
        .output_dir
        .join(naming::artifact_name("wells_to_keep", tag, &input.project));
    let removed_path = args
        .output_dir
        .join(naming::artifact_name("wells_to_remove", tag, &input.project));
    write_artifact(&kept_path, &input.dataset, &resolution.kept, "wells to keep")?;
    write_artifact(&removed_path, &input.dataset, &resolution.removed, "wells to remove")?;

    report::print_report(&report::files_created(&[
        (kept_path.as_path(), "Wells that should be kept"),
        (removed_path.as_path(), "Wells that should be removed"),
    ]));
    Ok(())
}

/// Loads the dataset named by `--input`, or one picked from the search directory.
pub(crate) fn load_input(args: &InputArgs) -> Result<LoadedInput> {
    let path = match &args.input {
        Some(path) => path.clone(),
        None => pick_dataset(&args.search_dir)?,
    };
    let delimiter = io_utils::resolve_input_delimiter(&path, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let dataset = well::load_dataset(&path, delimiter, encoding)
        .with_context(|| format!("Loading well data from {path:?}"))?;
    let project = args
        .project_name
        .clone()
        .unwrap_or_else(|| naming::extract_project_name(&path));
    info!("Project identified: {project}");
    Ok(LoadedInput {
        path,
        project,
        dataset,
    })
}

fn pick_dataset(dir: &Path) -> Result<PathBuf> {
    info!("Looking for well data files in {dir:?}");
    let candidates = discovery::discover_candidates(dir)?;
    match candidates.datasets.as_slice() {
        [] => bail!(
            "No well data files found in {dir:?}; pass --input or place the export in that directory"
        ),
        [only] => {
            info!("Using the only well data file found: {only:?}");
            Ok(only.clone())
        }
        many => prompt::choose_interactively("Found the following well data files:", many),
    }
}

pub(crate) fn write_artifact(
    path: &Path,
    dataset: &Dataset,
    records: &[&WellRecord],
    what: &str,
) -> Result<()> {
    let written = well::write_records(
        path,
        &dataset.headers,
        records.iter().copied(),
        io_utils::DEFAULT_CSV_DELIMITER,
    )
    .with_context(|| format!("Writing {what} to {path:?}"))?;
    info!("Saved {written} {what}: {path:?}");
    Ok(())
}
