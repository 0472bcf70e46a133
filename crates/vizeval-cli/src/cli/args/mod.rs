use clap::{Parser, Subcommand};

pub mod cache;
pub mod run;
pub use cache::*;
pub use run::*;

#[derive(Parser)]
#[command(
    name = "vizeval",
    version,
    about = "Evaluate natural-language-to-visualization agents against a benchmark"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the benchmark through the agent and the check pipeline
    Run(RunArgs),
    /// Score stored records or cached judgments without running anything
    Score(ScoreArgs),
    /// Inspect or clear the artifact and judgment caches
    Cache(CacheArgs),
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "vizeval",
            "run",
            "--config",
            "bench.yaml",
            "--concurrency",
            "4",
            "--no-cache",
            "--records",
            "out/records.jsonl",
        ])
        .unwrap();
        let Command::Run(args) = cli.cmd else {
            panic!("expected run");
        };
        assert_eq!(args.config.to_str(), Some("bench.yaml"));
        assert_eq!(args.concurrency, Some(4));
        assert!(args.no_cache);
        assert!(!args.sequential);
    }

    #[test]
    fn sequential_conflicts_with_concurrency() {
        assert!(Cli::try_parse_from(["vizeval", "run", "--sequential", "--concurrency", "2"]).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(Cli::try_parse_from(["vizeval", "run", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn score_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["vizeval", "score", "--tests", "t.jsonl"]).is_err());
        assert!(Cli::try_parse_from([
            "vizeval", "score", "--tests", "t.jsonl", "--records", "a.jsonl", "--from-cache", "c"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "vizeval", "score", "--tests", "t.jsonl", "--records", "a.jsonl", "--records", "b.jsonl",
        ])
        .unwrap();
        let Command::Score(args) = cli.cmd else {
            panic!("expected score");
        };
        assert_eq!(args.records.len(), 2);
    }

    #[test]
    fn cache_namespace_flags_conflict() {
        assert!(Cli::try_parse_from(["vizeval", "cache", "list", "--artifacts", "--judgments"]).is_err());
        let cli = Cli::try_parse_from(["vizeval", "cache", "clear", "--judgments"]).unwrap();
        let Command::Cache(CacheArgs { cmd: CacheSub::Clear(target) }) = cli.cmd else {
            panic!("expected cache clear");
        };
        assert!(target.judgments);
    }
}
