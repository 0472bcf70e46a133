//! Judge-model readability checks.
//!
//! Both checks send the chart image to a vision-capable [`LlmClient`] and
//! read a small JSON object back, tolerating chatty or slightly malformed
//! output (see [`extract_json`]).

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tracing::warn;

use crate::checks::{ChartCheck, CheckContext, Verdict};
use crate::error::EvalError;
use crate::model::{RenderedChart, TestCase};
use crate::providers::llm::{ChatRequest, ContentPart, LlmClient};

mod parse;
mod prompt;

pub use parse::extract_json;

/// Image URL handed to the judge: the agent's raster rendition when present,
/// otherwise the SVG itself as a data URL.
pub fn chart_image_url(chart: &RenderedChart) -> String {
    match &chart.image_url {
        Some(url) => url.clone(),
        None => format!(
            "data:image/svg+xml;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(chart.svg.as_bytes())
        ),
    }
}

fn judge_error(message: impl Into<String>) -> EvalError {
    EvalError::Judge {
        message: message.into(),
    }
}

/// `scale and ticks check`.
pub struct ScaleTicksJudge {
    client: Arc<dyn LlmClient>,
}

impl ScaleTicksJudge {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChartCheck for ScaleTicksJudge {
    async fn check(&self, ctx: &CheckContext, _test: &TestCase) -> anyhow::Result<Verdict> {
        let chart = ctx
            .deconstructed
            .as_ref()
            .ok_or_else(|| judge_error("scale and ticks check needs a deconstructed chart"))?;

        let ticks = if chart.chart == "pie" {
            None
        } else {
            chart.ticks("x").zip(chart.ticks("y"))
        };
        let text = prompt::scale_ticks_text(
            &ctx.question,
            ticks.as_ref().map(|(x, y)| (x.as_slice(), y.as_slice())),
        );

        let request = ChatRequest {
            system: prompt::SCALE_TICKS_SYSTEM.to_string(),
            parts: vec![
                ContentPart::Text(text),
                ContentPart::ImageUrl(chart_image_url(&ctx.chart)),
            ],
        };
        let resp = self.client.complete(&request).await?;
        let value = extract_json(&resp.text).map_err(judge_error)?;

        let appropriate = value
            .get("Appropriate")
            .and_then(|v| v.as_bool())
            .ok_or_else(|| judge_error("judge JSON missing 'Appropriate'"))?;
        let rationale = value
            .get("Rationale")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        Ok(if appropriate {
            Verdict::pass(rationale)
        } else {
            Verdict::fail(rationale)
        })
    }
}

/// `readability check`: a 1-5 score informed by earlier peer reviews.
pub struct ReadabilityJudge {
    client: Arc<dyn LlmClient>,
}

impl ReadabilityJudge {
    pub const MIN_SCORE: i64 = 1;
    pub const MAX_SCORE: i64 = 5;

    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChartCheck for ReadabilityJudge {
    async fn check(&self, ctx: &CheckContext, test: &TestCase) -> anyhow::Result<Verdict> {
        let request = ChatRequest {
            system: prompt::READABILITY_SYSTEM.to_string(),
            parts: vec![
                ContentPart::Text(prompt::readability_text(&ctx.question, &ctx.reviews)),
                ContentPart::ImageUrl(chart_image_url(&ctx.chart)),
                ContentPart::Text(prompt::READABILITY_FOCUS.to_string()),
            ],
        };
        let resp = self.client.complete(&request).await?;
        let value = extract_json(&resp.text).map_err(judge_error)?;

        let score = value.get("Score").and_then(|v| v.as_i64());
        let rationale = value.get("Rationale").and_then(|v| v.as_str());
        if score.is_none() || rationale.is_none() {
            warn!(test_id = %test.id, response = %resp.text, "malformed readability response");
        }

        let score = score
            .unwrap_or(Self::MIN_SCORE)
            .clamp(Self::MIN_SCORE, Self::MAX_SCORE);
        Ok(Verdict::score(score, rationale.unwrap_or("")))
    }
}
