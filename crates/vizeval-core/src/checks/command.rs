use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ChartCheck, CheckContext, DeconstructedChart, Deconstruction, Deconstructor, Verdict};
use crate::aspect::Aspect;
use crate::config::CommandSpec;
use crate::model::TestCase;
use crate::process::run_json;

/// Check delegated to an external program.
///
/// stdin: `{"aspect", "context", "test"}`; stdout: `{"answer", "rationale"}`.
#[derive(Debug, Clone)]
pub struct CommandCheck {
    aspect: Aspect,
    command: CommandSpec,
}

impl CommandCheck {
    pub fn new(aspect: Aspect, command: CommandSpec) -> Self {
        Self { aspect, command }
    }
}

#[async_trait]
impl ChartCheck for CommandCheck {
    async fn check(&self, ctx: &CheckContext, test: &TestCase) -> anyhow::Result<Verdict> {
        let request = json!({
            "aspect": self.aspect,
            "context": ctx,
            "test": test,
        });
        Ok(run_json(&self.command, &[], &request).await?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeconstructReply {
    Failed { error: String },
    Parsed(DeconstructedChart),
}

/// Deconstructor delegated to an external program.
///
/// stdin: `{"aspect": "deconstruction", "context"}`; stdout: either a
/// deconstructed chart (`{"chart", "encoding", ..}`) or `{"error"}`.
#[derive(Debug, Clone)]
pub struct CommandDeconstructor {
    command: CommandSpec,
}

impl CommandDeconstructor {
    pub fn new(command: CommandSpec) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Deconstructor for CommandDeconstructor {
    async fn deconstruct(&self, ctx: &CheckContext) -> anyhow::Result<Deconstruction> {
        let request = json!({
            "aspect": Aspect::Deconstruction,
            "context": ctx,
        });
        let reply: DeconstructReply = run_json(&self.command, &[], &request).await?;
        Ok(match reply {
            DeconstructReply::Failed { error } => Deconstruction::Unparseable(error),
            DeconstructReply::Parsed(chart) => Deconstruction::Parsed(chart),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::model::{GroundTruth, MetaInfo, RenderedChart};

    fn sh(script: &str) -> CommandSpec {
        let mut spec = CommandSpec::new("sh");
        spec.args = vec!["-c".into(), script.into()];
        spec
    }

    fn test_case() -> TestCase {
        TestCase {
            id: "t1".into(),
            group: "g".into(),
            question: "q".into(),
            difficulty: "Easy".into(),
            ground_truth: GroundTruth {
                chart: "bar".into(),
                vis_obj: serde_json::Value::Null,
                meta_info: MetaInfo::default(),
                vis_query: String::new(),
                data: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn check_receives_aspect_and_parses_verdict() {
        // Answer true only when the request names the chart type aspect.
        let script = r#"if grep -q '"aspect":"chart type check"'; then echo '{"answer":true,"rationale":"bar"}'; else echo '{"answer":false}'; fi"#;
        let check = CommandCheck::new(Aspect::ChartType, sh(script));
        let ctx = CheckContext::new("q", RenderedChart::new("<svg/>"));
        let verdict = check.check(&ctx, &test_case()).await.unwrap();
        assert_eq!(verdict, Verdict::pass("bar"));
    }

    #[tokio::test]
    async fn deconstructor_maps_error_reply() {
        let ctx = CheckContext::new("q", RenderedChart::new("<svg/>"));

        let failed = CommandDeconstructor::new(sh(r#"cat >/dev/null; echo '{"error":"no axes"}'"#));
        assert_eq!(
            failed.deconstruct(&ctx).await.unwrap(),
            Deconstruction::Unparseable("no axes".into())
        );

        let parsed = CommandDeconstructor::new(sh(
            r#"cat >/dev/null; echo '{"chart":"pie","encoding":{}}'"#,
        ));
        match parsed.deconstruct(&ctx).await.unwrap() {
            Deconstruction::Parsed(chart) => assert_eq!(chart.chart, "pie"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn failing_program_is_a_check_error() {
        let check = CommandCheck::new(Aspect::Order, sh("exit 1"));
        let ctx = CheckContext::new("q", RenderedChart::new("<svg/>"));
        assert!(check.check(&ctx, &test_case()).await.is_err());
    }
}
