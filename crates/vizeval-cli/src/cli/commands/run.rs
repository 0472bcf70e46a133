use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use vizeval_core::loader::{load_tests, sample_per_group};
use vizeval_core::providers::agent::CommandAgentFactory;
use vizeval_core::providers::llm::client_from_config;
use vizeval_core::report::console::{default_progress_sink, print_scores};
use vizeval_core::report::{write_records, write_summary, ScoreSummary};
use vizeval_core::storage::{BlobStore, FsBlobStore, MemoryBlobStore};
use vizeval_core::{
    load_config, score, ArtifactCache, CheckPipeline, CheckSuite, Coordinator, EvalConfig,
    JudgmentCache,
};

use super::super::args::RunArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = load_config(&args.config)?;
    apply_flags(&mut cfg, &args);

    let mut tests = load_tests(&cfg.tests)?;
    if let Some(max) = cfg.max_tests_per_group {
        tests = sample_per_group(tests, max);
    }

    let store: Arc<dyn BlobStore> = if args.no_cache {
        Arc::new(MemoryBlobStore::new())
    } else {
        let root = cfg.cache_root()?;
        info!(cache_dir = %root.display(), "using cache");
        Arc::new(FsBlobStore::new(root))
    };

    let judge = client_from_config(&cfg.judge)?;
    let checks = CheckSuite::from_config(&cfg.checks, judge);
    let pipeline = CheckPipeline::new(
        ArtifactCache::new(store.clone()),
        JudgmentCache::new(store),
        checks,
    )
    .with_prompt_prefix(cfg.prompt_prefix.clone());
    let factory = Arc::new(CommandAgentFactory::new(cfg.agent.clone()));
    let coordinator = Coordinator::new(pipeline, factory)
        .with_test_timeout(cfg.test_timeout_secs.map(Duration::from_secs));

    let records = coordinator
        .evaluate_all(&tests, cfg.concurrency, default_progress_sink(tests.len()))
        .await;

    print_scores(&score(&records));

    if let Some(path) = &args.records {
        write_records(path, &records).context("writing result records")?;
    }
    if let Some(path) = &args.summary {
        write_summary(&ScoreSummary::build(&records, &tests), path)
            .context("writing score summary")?;
    }
    Ok(EXIT_SUCCESS)
}

/// Command-line flags win over the config file and the environment.
fn apply_flags(cfg: &mut EvalConfig, args: &RunArgs) {
    if args.sequential {
        cfg.concurrency = 1;
    } else if let Some(n) = args.concurrency {
        cfg.concurrency = usize::try_from(n).unwrap_or(usize::MAX);
    }
}
