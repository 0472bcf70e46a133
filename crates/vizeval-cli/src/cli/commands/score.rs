use std::sync::Arc;

use anyhow::Context;
use vizeval_core::loader::load_tests;
use vizeval_core::report::console::print_scores;
use vizeval_core::report::{read_records, write_summary, ScoreSummary};
use vizeval_core::storage::FsBlobStore;
use vizeval_core::{score, JudgmentCache, ResultRecord};

use super::super::args::ScoreArgs;
use crate::exit_codes::EXIT_SUCCESS;

pub(crate) async fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    let tests = load_tests(&args.tests)?;
    let records = collect_records(&args).await?;
    if records.is_empty() {
        eprintln!("note: no records to score");
    }

    print_scores(&score(&records));

    if let Some(path) = &args.summary {
        write_summary(&ScoreSummary::build(&records, &tests), path)
            .context("writing score summary")?;
    }
    Ok(EXIT_SUCCESS)
}

/// Every records file is one set of trials; cached judgments are one trial
/// per test id.
async fn collect_records(args: &ScoreArgs) -> anyhow::Result<Vec<ResultRecord>> {
    if let Some(root) = &args.from_cache {
        let cache = JudgmentCache::new(Arc::new(FsBlobStore::new(root)));
        return Ok(cache.list().await?);
    }
    let mut records = Vec::new();
    for path in &args.records {
        records.extend(read_records(path)?);
    }
    Ok(records)
}
