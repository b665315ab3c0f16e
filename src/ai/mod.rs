//! Text-generation providers used to suggest meals.
//!
//! Each provider turns a prompt into raw text. Interpreting that text is the
//! caller's job; see `meals::suggestion`.

mod gemini;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::AiConfig;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Builds the prioritized provider chain: Gemini first, then OpenAI. A
/// provider without a configured key is skipped.
pub fn providers_from_config(cfg: &AiConfig) -> anyhow::Result<Vec<Arc<dyn CompletionProvider>>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
        .build()?;

    let mut chain: Vec<Arc<dyn CompletionProvider>> = Vec::new();
    if let Some(key) = &cfg.gemini_api_key {
        chain.push(Arc::new(GeminiProvider::new(
            client.clone(),
            key.clone(),
            cfg.gemini_model.clone(),
        )));
    }
    if let Some(key) = &cfg.openai_api_key {
        chain.push(Arc::new(OpenAiProvider::new(
            client,
            key.clone(),
            cfg.openai_model.clone(),
        )));
    }

    let names: Vec<&str> = chain.iter().map(|p| p.name()).collect();
    info!(providers = ?names, "ai provider chain configured");
    Ok(chain)
}
