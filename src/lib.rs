pub mod browser;
pub mod cli;
pub mod compare_cmd;
pub mod config;
pub mod data;
pub mod discovery;
pub mod engine;
pub mod executor;
pub mod group;
pub mod io_utils;
pub mod key;
pub mod naming;
pub mod policy;
pub mod prompt;
pub mod reconcile;
pub mod remove_cmd;
pub mod report;
pub mod resolve_cmd;
pub mod webdriver;
pub mod well;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("well_dedup", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve(args) => resolve_cmd::execute(&args),
        Commands::Simulate(args) => compare_cmd::simulate(&args),
        Commands::Reevaluate(args) => compare_cmd::reevaluate(&args),
        Commands::Remove(args) => remove_cmd::execute(&args),
        Commands::Discover(args) => handle_discover(&args),
    }
}

fn handle_discover(args: &cli::DiscoverArgs) -> Result<()> {
    info!("Scanning {:?} for well exports", args.dir);
    let candidates = discovery::discover_candidates(&args.dir)?;
    let sections = [
        ("Well data files", &candidates.datasets),
        ("Deletion files", &candidates.deletion_files),
    ];
    for (title, files) in sections {
        println!("{title} ({}):", files.len());
        for (idx, file) in files.iter().enumerate() {
            let project = naming::extract_project_name(file);
            println!("{}. {}  [{project}]", idx + 1, file.display());
        }
    }
    Ok(())
}
