#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use vizeval_core::checks::{DeconstructedChart, Deconstruction};
use vizeval_core::model::MetaInfo;
use vizeval_core::storage::BlobStore;
use vizeval_core::{
    Agent, AgentFactory, ArtifactCache, ChartCheck, CheckContext, CheckPipeline, CheckSuite,
    Deconstructor, GroundTruth, JudgmentCache, ProducedArtifact, RenderedChart, TestCase, Verdict,
};

/// Questions containing these markers change how [`StubAgent`] behaves.
pub const PANIC_MARKER: &str = "[panic]";
pub const SLOW_MARKER: &str = "[slow]";
pub const FAIL_MARKER: &str = "[fail]";

/// Draws a bar chart for every question. Counts runs across all instances.
pub struct StubAgent {
    runs: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl Agent for StubAgent {
    async fn set_context(&mut self, group: &str) -> anyhow::Result<()> {
        if group == "broken" {
            anyhow::bail!("no such database: {}", group);
        }
        Ok(())
    }

    fn reset(&mut self) {}

    async fn run(&mut self, question: &str) -> anyhow::Result<ProducedArtifact> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if question.contains(PANIC_MARKER) {
            panic!("agent blew up");
        }
        if question.contains(SLOW_MARKER) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if question.contains(FAIL_MARKER) {
            anyhow::bail!("Traceback: NameError");
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ProducedArtifact {
            answer: format!("answered: {}", question),
            table: None,
            chart: Some(RenderedChart::new("<svg><g id=\"bar\"/></svg>")),
        })
    }
}

#[derive(Default)]
pub struct StubFactory {
    pub runs: Arc<AtomicUsize>,
    pub delay: Duration,
}

impl StubFactory {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            runs: Arc::default(),
            delay,
        }
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl AgentFactory for StubFactory {
    fn create(&self, _group: &str) -> anyhow::Result<Box<dyn Agent>> {
        Ok(Box::new(StubAgent {
            runs: Arc::clone(&self.runs),
            delay: self.delay,
        }))
    }
}

pub struct Pass;

#[async_trait]
impl ChartCheck for Pass {
    async fn check(&self, _ctx: &CheckContext, _test: &TestCase) -> anyhow::Result<Verdict> {
        Ok(Verdict::pass("looks right"))
    }
}

/// Fails tests whose ground truth expects a pie chart.
pub struct ExpectBar;

#[async_trait]
impl ChartCheck for ExpectBar {
    async fn check(&self, _ctx: &CheckContext, test: &TestCase) -> anyhow::Result<Verdict> {
        if test.ground_truth.chart == "bar" {
            Ok(Verdict::pass("bar chart as expected"))
        } else {
            Ok(Verdict::fail(format!(
                "expected {}, got bar",
                test.ground_truth.chart
            )))
        }
    }
}

pub struct BarDeconstructor;

#[async_trait]
impl Deconstructor for BarDeconstructor {
    async fn deconstruct(&self, _ctx: &CheckContext) -> anyhow::Result<Deconstruction> {
        Ok(Deconstruction::Parsed(DeconstructedChart {
            chart: "bar".into(),
            encoding: serde_json::json!({"x": {"scale": {"ticks": ["A", "B"]}}}),
            extra: Default::default(),
        }))
    }
}

pub fn suite() -> CheckSuite {
    let pass: Arc<dyn ChartCheck> = Arc::new(Pass);
    CheckSuite {
        surface_form: pass.clone(),
        deconstructor: Arc::new(BarDeconstructor),
        chart_type: Arc::new(ExpectBar),
        data: pass.clone(),
        order: pass,
        layout: None,
        scale_ticks: None,
        readability: None,
    }
}

pub fn pipeline(store: Arc<dyn BlobStore>, suite: CheckSuite) -> CheckPipeline {
    CheckPipeline::new(
        ArtifactCache::new(store.clone()),
        JudgmentCache::new(store),
        suite,
    )
}

pub fn test_case(id: &str, group: &str, question: &str, chart: &str) -> TestCase {
    TestCase {
        id: id.into(),
        group: group.into(),
        question: question.into(),
        difficulty: "Medium".into(),
        ground_truth: GroundTruth {
            chart: chart.into(),
            vis_obj: serde_json::Value::Null,
            meta_info: MetaInfo::default(),
            vis_query: String::new(),
            data: Vec::new(),
        },
    }
}

/// Six tests over two groups; `t3` expects a pie and fails the chart type check.
pub fn mixed_tests() -> Vec<TestCase> {
    vec![
        test_case("t0", "college", "Count departments per building", "bar"),
        test_case("t1", "college", "Average budget per department", "bar"),
        test_case("t2", "flights", "Flights per airline", "bar"),
        test_case("t3", "flights", "Share of flights per airport", "pie"),
        test_case("t4", "college", "Students per major", "bar"),
        test_case("t5", "flights", "Delays per month", "bar"),
    ]
}
