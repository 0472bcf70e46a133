use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub cmd: CacheSub,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheSub {
    /// Remove every entry (both namespaces unless one is selected)
    Clear(CacheTarget),
    /// Print cached test ids per namespace
    List(CacheTarget),
}

#[derive(Args, Clone, Debug)]
pub struct CacheTarget {
    /// cache root (default: the per-user cache directory)
    #[arg(long, env = "VIZEVAL_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// only agent outputs
    #[arg(long, conflicts_with = "judgments")]
    pub artifacts: bool,

    /// only check results
    #[arg(long)]
    pub judgments: bool,
}
