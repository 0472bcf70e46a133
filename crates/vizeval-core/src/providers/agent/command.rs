use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{Agent, AgentFactory};
use crate::config::{AgentConfig, CommandSpec};
use crate::model::ProducedArtifact;
use crate::process::run_json;

/// Agent backed by an external program.
///
/// Setup: `program args.. setup_args..` with `{"group"}` on stdin; whatever
/// JSON it prints becomes the group context. Each question: `program args..`
/// with `{"question", "group", "context"}` on stdin, a [`ProducedArtifact`]
/// on stdout.
#[derive(Debug)]
pub struct CommandAgent {
    command: CommandSpec,
    setup_args: Option<Vec<String>>,
    group: Option<String>,
    context: Value,
    calls: usize,
}

impl CommandAgent {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            command: config.command.clone(),
            setup_args: config.setup_args.clone(),
            group: None,
            context: Value::Null,
            calls: 0,
        }
    }

    /// Questions answered since the last reset.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[async_trait]
impl Agent for CommandAgent {
    async fn set_context(&mut self, group: &str) -> anyhow::Result<()> {
        self.context = match &self.setup_args {
            Some(args) => {
                debug!(group, program = %self.command.program, "agent setup");
                run_json(&self.command, args, &json!({ "group": group })).await?
            }
            None => Value::Null,
        };
        self.group = Some(group.to_string());
        Ok(())
    }

    fn reset(&mut self) {
        self.calls = 0;
    }

    async fn run(&mut self, question: &str) -> anyhow::Result<ProducedArtifact> {
        let Some(group) = self.group.as_deref() else {
            anyhow::bail!("agent has no context; call set_context first");
        };
        let request = json!({
            "question": question,
            "group": group,
            "context": self.context,
        });
        self.calls += 1;
        Ok(run_json(&self.command, &[], &request).await?)
    }
}

#[derive(Debug, Clone)]
pub struct CommandAgentFactory {
    config: AgentConfig,
}

impl CommandAgentFactory {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }
}

impl AgentFactory for CommandAgentFactory {
    fn create(&self, _group: &str) -> anyhow::Result<Box<dyn Agent>> {
        Ok(Box::new(CommandAgent::new(&self.config)))
    }
}
