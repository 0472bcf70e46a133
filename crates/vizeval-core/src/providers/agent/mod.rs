//! The agent under evaluation.
//!
//! An agent is bound to one data-source group through [`Agent::set_context`]
//! and then answers any number of questions for that group. The harness
//! calls [`Agent::reset`] before every [`Agent::run`], so per-question
//! scratch state never leaks between tests.

use async_trait::async_trait;

use crate::model::ProducedArtifact;

pub mod command;

pub use command::{CommandAgent, CommandAgentFactory};

#[async_trait]
pub trait Agent: Send {
    /// Bind to `group`. Expensive per-source setup belongs here.
    async fn set_context(&mut self, group: &str) -> anyhow::Result<()>;

    /// Clear per-call scratch state.
    fn reset(&mut self);

    async fn run(&mut self, question: &str) -> anyhow::Result<ProducedArtifact>;
}

/// Builds fresh, unbound agents.
pub trait AgentFactory: Send + Sync {
    fn create(&self, group: &str) -> anyhow::Result<Box<dyn Agent>>;
}
