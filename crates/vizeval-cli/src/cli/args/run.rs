//! Run and score command arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    #[arg(long, default_value = "vizeval.yaml")]
    pub config: PathBuf,

    /// parallel workers (overrides config and VIZEVAL_CONCURRENCY)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..), conflicts_with = "sequential")]
    pub concurrency: Option<u64>,

    /// evaluate one test at a time, inline
    #[arg(long)]
    pub sequential: bool,

    /// keep caches in memory for this run only
    #[arg(long)]
    pub no_cache: bool,

    /// write result records (JSONL) here
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// write the score summary (JSON) here
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["records", "from_cache"])))]
pub struct ScoreArgs {
    /// benchmark JSONL, used for chart and difficulty breakdowns
    #[arg(long)]
    pub tests: PathBuf,

    /// result records from `vizeval run`; repeat to score several trials
    #[arg(long)]
    pub records: Vec<PathBuf>,

    /// cache root whose judgments should be scored
    #[arg(long)]
    pub from_cache: Option<PathBuf>,

    #[arg(long)]
    pub summary: Option<PathBuf>,
}
