//! Agent 错误类型与恢复动作
//!
//! 与 RecoveryEngine 配合：根据 AgentError 决定 RetryWithPrompt（在同一次运行内重新提示模型）或 Abort。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（模型、解析、工具、预算、取消等）
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("LLM request timed out after {0}s")]
    NetworkTimeout(u64),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Hallucinated tool: {0}")]
    HallucinatedTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 整次运行超过墙钟预算（agent.run_timeout_secs）
    #[error("Agent run exceeded {0}s")]
    RunTimeout(u64),

    #[error("Cancelled")]
    Cancelled,

    /// 后台任务 panic 或被中止（JoinError）
    #[error("Background task failed: {0}")]
    TaskPanicked(String),
}

/// 恢复引擎根据错误类型给出的建议动作
#[derive(Debug, Clone)]
pub enum RecoveryAction {
    /// 将提示注入下一轮，让 LLM 修正输出（如 JSON 格式错误、未知工具）
    RetryWithPrompt(String),
    /// 终止当前运行
    Abort,
}
