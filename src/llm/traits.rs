//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Gemini / Mock / Scripted）实现 LlmClient：输入消息列表，返回生成文本。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成；错误以字符串描述返回，由 Planner 转为 AgentError
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }

    /// 后端名称（日志用）
    fn name(&self) -> &str {
        "llm"
    }
}
