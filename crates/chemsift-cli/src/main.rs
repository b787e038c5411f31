//! chemsift - split an article corpus into shards, filter every shard in its
//! own process, and keep the documents dense in chemical and disease mentions.

mod cli;
mod config;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chemsift_ingestion::filter::ShardFilter;
use chemsift_ingestion::orchestrator::{FilterCommand, Orchestrator};
use chemsift_ingestion::partition;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, FilterArgs, RunAllArgs, SplitArgs};
use crate::config::Config;
use crate::progress::{make_progress_bar, FilterProgress};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is reserved for machine-readable output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chemsift=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Split(args) => split(args, &config),
        Command::Filter(args) => filter(args, &config).await,
        Command::RunAll(args) => run_all(args, &config, cli.config).await,
    }
}

fn split(args: SplitArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let num_splits = args.num_splits.unwrap_or(config.partition.num_splits);
    let plan = partition::prepare(&args.input_dir, &args.output_dir, num_splits)?;

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        files = plan.total_files,
        shards = plan.shards.len(),
        "Partitioning {}",
        args.input_dir.display()
    );
    let bar = make_progress_bar(plan.total_files as u64, "files");
    partition::execute_plan(&plan, |_| bar.inc(1))?;
    bar.finish_and_clear();

    for dir in plan.shard_dirs() {
        println!("{}", dir.display());
    }
    Ok(ExitCode::SUCCESS)
}

async fn filter(args: FilterArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let filter_config = config.filter.to_filter_config()?;
    let tagger = config.ner.build_tagger()?;

    let summary = tokio::task::spawn_blocking(move || {
        let mut observer = FilterProgress::default();
        ShardFilter::new(&tagger, &filter_config).run(
            &args.shard_dir,
            &args.output_dir,
            &args.error_log_dir,
            &mut observer,
        )
    })
    .await
    .context("filter task panicked")??;

    println!("{}", serde_json::to_string(&summary)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_all(
    args: RunAllArgs,
    config: &Config,
    config_path: Option<PathBuf>,
) -> anyhow::Result<ExitCode> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.orchestrator.output_dir.clone());
    let error_log_dir = args
        .error_log_dir
        .unwrap_or_else(|| config.orchestrator.error_log_dir.clone());
    let max_concurrency = args
        .max_concurrency
        .unwrap_or(config.orchestrator.max_concurrency);

    let mut command =
        FilterCommand::current_exe().context("cannot locate the chemsift executable")?;
    if let Some(path) = config_path {
        command = command.arg("--config").arg(path);
    }

    let summary = Orchestrator::new(command)
        .with_max_concurrency(Some(max_concurrency))
        .run_all(&args.shard_dirs, &output_dir, &error_log_dir)
        .await;

    for result in &summary.results {
        if result.succeeded() {
            println!(
                "Successfully processed {}: {}",
                result.shard_dir.display(),
                result.stdout.trim_end()
            );
        } else {
            eprintln!(
                "Error processing {}: {}",
                result.shard_dir.display(),
                result.stderr.trim_end()
            );
        }
    }
    print!("{}", summary.report());

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
