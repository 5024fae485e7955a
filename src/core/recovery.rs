//! 错误恢复引擎
//!
//! 根据 AgentError 类型返回 RecoveryAction：模型输出格式问题在同一次运行内重试，其余一律终止。
//! SQL 执行失败不重试，直接作为错误交给编排器。

use crate::core::{AgentError, RecoveryAction};

/// 语义化错误恢复：将错误映射为可执行动作（重试提示 / 终止）
#[derive(Debug, Default, Clone)]
pub struct RecoveryEngine {
    tool_names: Vec<String>,
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置已注册的工具名，用于在幻觉工具时提示模型
    pub fn with_tool_names(mut self, names: Vec<String>) -> Self {
        self.tool_names = names;
        self
    }

    pub fn handle(&self, err: &AgentError) -> RecoveryAction {
        match err {
            AgentError::JsonParseError(raw) => RecoveryAction::RetryWithPrompt(format!(
                "Your previous output could not be parsed: {raw}. \
                To call a tool, reply with exactly one JSON object and nothing else, \
                e.g. {{\"thought\": \"...\", \"tool\": \"sql_engine\", \"args\": {{\"query\": \"SELECT ...\"}}}}. \
                To finish, reply with <final_answer>your answer</final_answer>."
            )),
            AgentError::HallucinatedTool(name) => {
                let available = if self.tool_names.is_empty() {
                    "(none)".to_string()
                } else {
                    self.tool_names.join(", ")
                };
                RecoveryAction::RetryWithPrompt(format!(
                    "Tool '{name}' does not exist. Only use these tools: {available}."
                ))
            }
            _ => RecoveryAction::Abort,
        }
    }
}
