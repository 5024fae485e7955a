//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Gemini / Mock / Scripted）

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

use std::sync::Arc;

pub use gemini::{create_gemini_client, GEMINI_BASE_URL, GEMINI_FLASH};
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;

use crate::config::AppConfig;

/// 根据配置与环境变量选择 LLM 后端（Gemini / OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_gemini = std::env::var("GEMINI_API_KEY").is_ok();
    let has_openai = std::env::var("OPENAI_API_KEY").is_ok();

    match provider.as_str() {
        "mock" => {
            tracing::info!("Using mock LLM");
            Arc::new(MockLlmClient)
        }
        "gemini" if has_gemini => {
            let client = create_gemini_client(cfg.llm.model.as_deref());
            tracing::info!("Using Gemini LLM ({})", client.model());
            Arc::new(client)
        }
        "openai" if has_openai => {
            let model = cfg.llm.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string());
            tracing::info!("Using OpenAI-compatible LLM ({})", model);
            Arc::new(OpenAiClient::new(cfg.llm.base_url.as_deref(), &model, None))
        }
        _ => {
            tracing::warn!(provider = %provider, "No API key for provider, using mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}
