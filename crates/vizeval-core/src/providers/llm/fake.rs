use super::{ChatRequest, LlmClient, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Replays canned responses in order; falls back to a fixed response when
/// the queue is empty.
#[derive(Debug)]
pub struct FakeClient {
    model: String,
    queue: Mutex<VecDeque<String>>,
    fixed_response: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl FakeClient {
    pub fn new(model: String) -> Self {
        Self {
            model,
            queue: Mutex::new(VecDeque::new()),
            fixed_response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: String) -> Self {
        self.fixed_response = Some(response);
        self
    }

    pub fn with_queue<I, S>(self, responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(responses.into_iter().map(Into::into));
        self
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let text = match next.or_else(|| self.fixed_response.clone()) {
            Some(text) => text,
            None => anyhow::bail!("fake client has no response left"),
        };

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: self.model.clone(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
