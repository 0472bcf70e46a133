use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::providers::agent::{Agent, AgentFactory};

/// Per-group agent contexts, created on first use and reused.
///
/// A context is checked out by exactly one worker at a time. Idle contexts
/// of a group are handed out before a new one is built, so a group gets a
/// second context only when two of its tests run at the same time.
pub struct ContextPool {
    factory: Arc<dyn AgentFactory>,
    state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
    idle: HashMap<String, Vec<Box<dyn Agent>>>,
    created: HashMap<String, usize>,
    discarded: usize,
}

impl std::fmt::Debug for ContextPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPool")
            .field("created", &self.created())
            .finish_non_exhaustive()
    }
}

impl ContextPool {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            factory,
            state: Mutex::new(PoolState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idle context for `group`, or a freshly created and bound one.
    pub async fn checkout(self: &Arc<Self>, group: &str) -> anyhow::Result<ContextLease> {
        let idle = self.state().idle.get_mut(group).and_then(Vec::pop);
        let agent = match idle {
            Some(agent) => agent,
            None => {
                let mut agent = self.factory.create(group)?;
                info!(group, "creating evaluation context");
                agent.set_context(group).await?;
                *self.state().created.entry(group.to_string()).or_default() += 1;
                agent
            }
        };
        Ok(ContextLease {
            pool: Arc::clone(self),
            group: group.to_string(),
            agent: Some(agent),
            released: false,
        })
    }

    /// Contexts built so far, over all groups.
    pub fn created(&self) -> usize {
        self.state().created.values().sum()
    }

    pub fn created_for(&self, group: &str) -> usize {
        self.state().created.get(group).copied().unwrap_or(0)
    }

    /// Contexts dropped because their worker panicked or was cancelled.
    pub fn discarded(&self) -> usize {
        self.state().discarded
    }

    fn give_back(&self, group: String, agent: Box<dyn Agent>) {
        self.state().idle.entry(group).or_default().push(agent);
    }

    fn discard(&self, group: &str) {
        debug!(group, "discarding evaluation context");
        self.state().discarded += 1;
    }
}

/// Exclusive use of one context.
///
/// Call [`ContextLease::release`] once the work finished normally. A lease
/// dropped without release (panic, deadline) discards its context instead of
/// returning it to the pool.
pub struct ContextLease {
    pool: Arc<ContextPool>,
    group: String,
    agent: Option<Box<dyn Agent>>,
    released: bool,
}

impl ContextLease {
    pub fn agent(&mut self) -> &mut dyn Agent {
        match self.agent.as_mut() {
            Some(agent) => agent.as_mut(),
            // `agent` is only taken in `drop`.
            None => unreachable!("context lease used after drop"),
        }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn release(mut self) {
        self.released = true;
    }
}

impl Drop for ContextLease {
    fn drop(&mut self) {
        let Some(agent) = self.agent.take() else {
            return;
        };
        if self.released && !std::thread::panicking() {
            self.pool.give_back(std::mem::take(&mut self.group), agent);
        } else {
            self.pool.discard(&self.group);
        }
    }
}
