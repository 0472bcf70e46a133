//! Fail-fast check pipeline for one test.

use tracing::{debug, warn};

use crate::aspect::Aspect;
use crate::cache::{ArtifactCache, JudgmentCache};
use crate::checks::{ChartCheck, CheckContext, CheckSuite, Deconstruction, Review};
use crate::config::DEFAULT_PROMPT_PREFIX;
use crate::model::{CheckResult, ResultRecord, TestCase};
use crate::providers::agent::Agent;

mod stages;

pub use stages::{stage_passed, Stage, StageDescriptor, STAGES};

pub(crate) const EXECUTION_OK: &str = "Code executed successfully.";
pub(crate) const NO_CHART: &str = "no visualization produced";
pub(crate) const EMPTY_CHART: &str = "visualization rendered an empty document";
const DECONSTRUCTED: &str = "Deconstructed the chart successfully.";
const UNPARSEABLE: &str = "Cannot parse the visualization.";

#[derive(Debug, Clone)]
pub struct CheckPipeline {
    artifacts: ArtifactCache,
    judgments: JudgmentCache,
    checks: CheckSuite,
    prompt_prefix: String,
}

impl CheckPipeline {
    pub fn new(artifacts: ArtifactCache, judgments: JudgmentCache, checks: CheckSuite) -> Self {
        Self {
            artifacts,
            judgments,
            checks,
            prompt_prefix: DEFAULT_PROMPT_PREFIX.to_string(),
        }
    }

    pub fn with_prompt_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prompt_prefix = prefix.into();
        self
    }

    /// Finalized judgment from an earlier run, if any.
    pub async fn cached(&self, test_id: &str) -> Option<ResultRecord> {
        self.judgments.get(test_id).await
    }

    /// Judgment from cache, or a fresh evaluation.
    pub async fn run(&self, test: &TestCase, agent: &mut dyn Agent) -> ResultRecord {
        match self.cached(&test.id).await {
            Some(record) => record,
            None => self.evaluate(test, agent).await,
        }
    }

    /// Run every stage in order, stopping after the first failing stage, and
    /// store the outcome in the judgment cache. Never fails: check and agent
    /// errors become failing results.
    pub async fn evaluate(&self, test: &TestCase, agent: &mut dyn Agent) -> ResultRecord {
        let results = self.run_stages(test, agent).await;
        let record = ResultRecord::new(test.id.clone(), results);
        if let Err(e) = self.judgments.put(&record).await {
            warn!(test_id = %test.id, error = %e, "failed to store judgment");
        }
        record
    }

    async fn run_stages(&self, test: &TestCase, agent: &mut dyn Agent) -> Vec<CheckResult> {
        let mut results = Vec::new();
        let mut ctx: Option<CheckContext> = None;

        for desc in STAGES.iter() {
            let produced = if desc.stage == Stage::Execution {
                let (result, produced_ctx) = self.execute(test, &mut *agent).await;
                ctx = produced_ctx;
                vec![result]
            } else {
                match ctx.as_mut() {
                    Some(ctx) => self.run_stage(desc.stage, test, ctx).await,
                    None => break,
                }
            };

            let passed = stage_passed(&produced);
            debug!(
                test_id = %test.id,
                stage = desc.label,
                "{}: {}",
                desc.label,
                if passed { "Passed" } else { "Failed" }
            );
            results.extend(produced);
            if !passed {
                break;
            }
        }
        results
    }

    async fn execute(
        &self,
        test: &TestCase,
        agent: &mut dyn Agent,
    ) -> (CheckResult, Option<CheckContext>) {
        let prompt = format!("{}{}", self.prompt_prefix, test.question);
        agent.reset();
        let produced = self
            .artifacts
            .get_or_produce(&test.id, move || async move { agent.run(&prompt).await })
            .await;

        let artifact = match produced {
            Ok((artifact, source)) => {
                debug!(test_id = %test.id, ?source, "artifact ready");
                artifact
            }
            Err(e) => return (CheckResult::fail(Aspect::CodeExecution, format!("{:#}", e)), None),
        };

        match artifact.chart {
            None => (CheckResult::fail(Aspect::CodeExecution, NO_CHART), None),
            Some(chart) if chart.svg.trim().is_empty() => {
                (CheckResult::fail(Aspect::CodeExecution, EMPTY_CHART), None)
            }
            Some(chart) => (
                CheckResult::new(Aspect::CodeExecution, true, EXECUTION_OK),
                Some(CheckContext::new(test.question.clone(), chart)),
            ),
        }
    }

    async fn run_stage(
        &self,
        stage: Stage,
        test: &TestCase,
        ctx: &mut CheckContext,
    ) -> Vec<CheckResult> {
        let checks = &self.checks;
        match stage {
            Stage::Execution => Vec::new(),
            Stage::SurfaceForm => {
                vec![required(Aspect::SurfaceForm, checks.surface_form.as_ref(), ctx, test).await]
            }
            Stage::Deconstruction => vec![self.deconstruct(test, ctx).await],
            Stage::ChartTypeAndData => {
                let ctx = &*ctx;
                let (chart_type, data) = futures::join!(
                    required(Aspect::ChartType, checks.chart_type.as_ref(), ctx, test),
                    required(Aspect::Data, checks.data.as_ref(), ctx, test),
                );
                vec![chart_type, data]
            }
            Stage::Order => vec![required(Aspect::Order, checks.order.as_ref(), ctx, test).await],
            Stage::Readability => self.readability(test, ctx).await,
        }
    }

    async fn deconstruct(&self, test: &TestCase, ctx: &mut CheckContext) -> CheckResult {
        match self.checks.deconstructor.deconstruct(ctx).await {
            Ok(Deconstruction::Parsed(chart)) => {
                ctx.deconstructed = Some(chart);
                CheckResult::new(Aspect::Deconstruction, true, DECONSTRUCTED)
            }
            Ok(Deconstruction::Unparseable(message)) => {
                CheckResult::fail(Aspect::Deconstruction, message)
            }
            Err(e) => {
                debug!(test_id = %test.id, error = %format!("{:#}", e), "deconstruction failed");
                CheckResult::fail(Aspect::Deconstruction, UNPARSEABLE)
            }
        }
    }

    /// Layout, then scale and ticks, then the readability judge with the
    /// earlier rationales as peer reviews. Abstentions are dropped.
    async fn readability(&self, test: &TestCase, ctx: &mut CheckContext) -> Vec<CheckResult> {
        let mut results = Vec::new();

        let reviewers = [
            (Aspect::Layout, self.checks.layout.as_ref()),
            (Aspect::ScaleAndTicks, self.checks.scale_ticks.as_ref()),
        ];
        for (aspect, check) in reviewers {
            if let Some(check) = check {
                results.extend(optional(aspect, check.as_ref(), ctx, test).await);
            }
        }

        if let Some(judge) = self.checks.readability.as_ref() {
            ctx.reviews = results
                .iter()
                .filter_map(|r: &CheckResult| {
                    r.aspect.review_label().map(|label| Review {
                        aspect: label.to_string(),
                        content: r.rationale.clone(),
                    })
                })
                .collect();
            results.extend(optional(Aspect::Readability, judge.as_ref(), ctx, test).await);
        }
        results
    }
}

/// Abstention and error both fail.
async fn required(
    aspect: Aspect,
    check: &dyn ChartCheck,
    ctx: &CheckContext,
    test: &TestCase,
) -> CheckResult {
    match check.check(ctx, test).await {
        Ok(verdict) => match verdict.answer {
            Some(answer) => CheckResult::new(aspect, answer, verdict.rationale),
            None if verdict.rationale.is_empty() => CheckResult::fail(aspect, "check gave no answer"),
            None => CheckResult::fail(aspect, verdict.rationale),
        },
        Err(e) => CheckResult::fail(aspect, format!("{:#}", e)),
    }
}

/// Abstention yields nothing; error fails.
async fn optional(
    aspect: Aspect,
    check: &dyn ChartCheck,
    ctx: &CheckContext,
    test: &TestCase,
) -> Option<CheckResult> {
    match check.check(ctx, test).await {
        Ok(verdict) => verdict
            .answer
            .map(|answer| CheckResult::new(aspect, answer, verdict.rationale)),
        Err(e) => {
            debug!(test_id = %test.id, %aspect, error = %format!("{:#}", e), "readability check failed");
            Some(CheckResult::fail(aspect, format!("{:#}", e)))
        }
    }
}
