use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{JudgeConfig, JudgeProvider};
use crate::error::{EvalError, EvalResult};

pub mod fake;
pub mod openai;

pub use fake::FakeClient;
pub use openai::OpenAIClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// `data:` or `https:` URL of an image.
    ImageUrl(String),
}

/// One system instruction plus one multimodal user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}

/// Judge client for `cfg`, or `None` when judging is off.
pub fn client_from_config(cfg: &JudgeConfig) -> EvalResult<Option<Arc<dyn LlmClient>>> {
    let model = cfg.model.clone().unwrap_or_else(|| "fake-judge".to_string());
    match cfg.provider {
        JudgeProvider::None => Ok(None),
        JudgeProvider::Fake => {
            let mut client = FakeClient::new(model);
            if let Some(response) = &cfg.fake_response {
                client = client.with_response(response.clone());
            }
            Ok(Some(Arc::new(client)))
        }
        JudgeProvider::Openai => {
            let api_key = std::env::var(&cfg.api_key_env).map_err(|_| {
                EvalError::config(format!(
                    "judge provider openai needs an API key in ${}",
                    cfg.api_key_env
                ))
            })?;
            let mut client = OpenAIClient::new(model, api_key, cfg.temperature, cfg.max_tokens);
            if let Some(base_url) = &cfg.base_url {
                client = client.with_base_url(base_url.clone());
            }
            Ok(Some(Arc::new(client)))
        }
    }
}
