//! Check seams invoked by the pipeline.
//!
//! Each structural or perceptual check is a black-box predicate over the
//! rendered chart and the test's ground truth. The pipeline owns ordering,
//! short-circuiting and error conversion; implementations only answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::aspect::Aspect;
use crate::config::ChecksConfig;
use crate::judge::{ReadabilityJudge, ScaleTicksJudge};
use crate::model::{Answer, RenderedChart, TestCase};
use crate::providers::llm::LlmClient;

pub mod command;

pub use command::{CommandCheck, CommandDeconstructor};

/// A check's answer. `answer: None` means the check abstained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(default)]
    pub answer: Option<Answer>,
    #[serde(default)]
    pub rationale: String,
}

impl Verdict {
    pub fn pass(rationale: impl Into<String>) -> Self {
        Self::new(Answer::Bool(true), rationale)
    }

    pub fn fail(rationale: impl Into<String>) -> Self {
        Self::new(Answer::Bool(false), rationale)
    }

    pub fn score(score: i64, rationale: impl Into<String>) -> Self {
        Self::new(Answer::Score(score), rationale)
    }

    pub fn abstain(rationale: impl Into<String>) -> Self {
        Self {
            answer: None,
            rationale: rationale.into(),
        }
    }

    fn new(answer: Answer, rationale: impl Into<String>) -> Self {
        Self {
            answer: Some(answer),
            rationale: rationale.into(),
        }
    }
}

/// Structured reading of a rendered chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeconstructedChart {
    /// Chart kind as read from the figure.
    pub chart: String,
    #[serde(default)]
    pub encoding: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeconstructedChart {
    /// Tick labels of `axis` (`"x"` or `"y"`), from `encoding.<axis>.scale.ticks`.
    pub fn ticks(&self, axis: &str) -> Option<Vec<String>> {
        let ticks = self.encoding.get(axis)?.get("scale")?.get("ticks")?.as_array()?;
        Some(
            ticks
                .iter()
                .map(|t| match t {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Deconstruction {
    Parsed(DeconstructedChart),
    /// The deconstructor understood the input but could not read a chart.
    Unparseable(String),
}

/// Peer review from an earlier readability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    pub aspect: String,
    pub content: String,
}

/// What the checks see of one produced chart.
#[derive(Debug, Clone, Serialize)]
pub struct CheckContext {
    pub question: String,
    /// Rendering library, with `seaborn` folded into `matplotlib`.
    pub library: String,
    pub chart: RenderedChart,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deconstructed: Option<DeconstructedChart>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
}

impl CheckContext {
    pub fn new(question: impl Into<String>, chart: RenderedChart) -> Self {
        let library = match chart.library.as_str() {
            "seaborn" => "matplotlib".to_string(),
            other => other.to_string(),
        };
        Self {
            question: question.into(),
            library,
            chart,
            deconstructed: None,
            reviews: Vec::new(),
        }
    }
}

#[async_trait]
pub trait ChartCheck: Send + Sync {
    async fn check(&self, ctx: &CheckContext, test: &TestCase) -> anyhow::Result<Verdict>;
}

#[async_trait]
pub trait Deconstructor: Send + Sync {
    async fn deconstruct(&self, ctx: &CheckContext) -> anyhow::Result<Deconstruction>;
}

/// Every check the pipeline runs. Readability checks are optional; a
/// missing one is skipped.
#[derive(Clone)]
pub struct CheckSuite {
    pub surface_form: Arc<dyn ChartCheck>,
    pub deconstructor: Arc<dyn Deconstructor>,
    pub chart_type: Arc<dyn ChartCheck>,
    pub data: Arc<dyn ChartCheck>,
    pub order: Arc<dyn ChartCheck>,
    pub layout: Option<Arc<dyn ChartCheck>>,
    pub scale_ticks: Option<Arc<dyn ChartCheck>>,
    pub readability: Option<Arc<dyn ChartCheck>>,
}

impl std::fmt::Debug for CheckSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSuite")
            .field("layout", &self.layout.is_some())
            .field("scale_ticks", &self.scale_ticks.is_some())
            .field("readability", &self.readability.is_some())
            .finish_non_exhaustive()
    }
}

impl CheckSuite {
    /// Command-backed structural checks, plus judge checks when a judge
    /// client is given.
    pub fn from_config(cfg: &ChecksConfig, judge: Option<Arc<dyn LlmClient>>) -> Self {
        let command =
            |aspect, spec| -> Arc<dyn ChartCheck> { Arc::new(CommandCheck::new(aspect, spec)) };
        Self {
            surface_form: command(Aspect::SurfaceForm, cfg.surface_form.clone()),
            deconstructor: Arc::new(CommandDeconstructor::new(cfg.deconstruct.clone())),
            chart_type: command(Aspect::ChartType, cfg.chart_type.clone()),
            data: command(Aspect::Data, cfg.data.clone()),
            order: command(Aspect::Order, cfg.order.clone()),
            layout: cfg
                .layout
                .clone()
                .map(|spec| command(Aspect::Layout, spec)),
            scale_ticks: judge
                .clone()
                .map(|client| Arc::new(ScaleTicksJudge::new(client)) as Arc<dyn ChartCheck>),
            readability: judge
                .map(|client| Arc::new(ReadabilityJudge::new(client)) as Arc<dyn ChartCheck>),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandSpec;
    use serde_json::json;

    #[test]
    fn seaborn_is_read_as_matplotlib() {
        let mut chart = RenderedChart::new("<svg/>");
        chart.library = "seaborn".into();
        assert_eq!(CheckContext::new("q", chart).library, "matplotlib");

        let mut chart = RenderedChart::new("<svg/>");
        chart.library = "vega-lite".into();
        assert_eq!(CheckContext::new("q", chart).library, "vega-lite");
    }

    #[test]
    fn ticks_come_from_encoding_scale() {
        let chart: DeconstructedChart = serde_json::from_value(json!({
            "chart": "bar",
            "encoding": {
                "x": {"scale": {"ticks": ["A", "B"]}},
                "y": {"scale": {"ticks": [0, 0.5, 1]}}
            },
            "mark": "rect"
        }))
        .unwrap();
        assert_eq!(chart.ticks("x").unwrap(), vec!["A", "B"]);
        assert_eq!(chart.ticks("y").unwrap(), vec!["0", "0.5", "1"]);
        assert!(chart.extra.contains_key("mark"));
        assert_eq!(chart.ticks("color"), None);
    }

    #[test]
    fn verdict_wire_accepts_missing_answer() {
        let v: Verdict = serde_json::from_str(r#"{"rationale": "no layout engine"}"#).unwrap();
        assert_eq!(v, Verdict::abstain("no layout engine"));
        let v: Verdict = serde_json::from_str(r#"{"answer": 3}"#).unwrap();
        assert_eq!(v, Verdict::score(3, ""));
    }

    #[test]
    fn suite_without_judge_has_no_judge_checks() {
        let spec = CommandSpec::new("true");
        let cfg = ChecksConfig {
            surface_form: spec.clone(),
            deconstruct: spec.clone(),
            chart_type: spec.clone(),
            data: spec.clone(),
            order: spec.clone(),
            layout: Some(spec),
        };
        let suite = CheckSuite::from_config(&cfg, None);
        assert!(suite.layout.is_some());
        assert!(suite.scale_ticks.is_none());
        assert!(suite.readability.is_none());
    }
}
