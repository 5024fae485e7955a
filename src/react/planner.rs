//! Planner：调用 LLM 与解析输出
//!
//! 模型每一轮要么输出一个 JSON tool call（`{"thought": "...", "tool": "sql_engine", "args": {...}}`），
//! 要么用 `<final_answer>...</final_answer>` 给出最终答案；没有 JSON 的纯文本也视为最终答案。

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 工具结果回写给模型时的前缀
pub const OBSERVATION_PREFIX: &str = "Observation:";

/// 规划步的提示
pub const PLANNING_PROMPT: &str = "Before taking the next action, write a short numbered plan of the steps \
you will take to complete the task. Do not call any tool in this reply.";

/// 默认 system prompt；{tools} 与 {schema} 在组装组件时替换
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert SQL assistant working on a relational database. \
You solve the task step by step.\n\
At each step do exactly one of the following:\n\
- call one tool by replying with a single JSON object (no other text) matching this schema:\n{schema}\n\
- finish by replying with <final_answer>your answer</final_answer>.\n\
After each tool call you receive its output as an observation. \
When the task asks you to execute a query, return the query output as your final answer.\n\n\
## Tools\n{tools}";

/// LLM 返回的 Tool Call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub thought: Option<String>,
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Planner 输出
#[derive(Debug, Clone)]
pub enum PlannerOutput {
    /// 需要执行工具
    ToolCall(ToolCall),
    /// 最终答案
    FinalAnswer(String),
}

/// 取 `<final_answer>` 标签内的文本：最后一个开标签之后、其后第一个闭标签之前，去掉首尾空白。
/// 没有开标签时返回 None。
pub fn extract_final_answer(text: &str) -> Option<String> {
    if !text.contains("<final_answer>") {
        return None;
    }
    let after_open = text.rsplit("<final_answer>").next().unwrap_or_default();
    let inner = after_open.split("</final_answer>").next().unwrap_or_default();
    Some(inner.trim().to_string())
}

fn fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*\})\s*```").expect("static regex")
    })
}

/// 解析 LLM 输出：最终答案标签优先，其次是 JSON tool call，其余纯文本视为最终答案
pub fn parse_llm_output(output: &str) -> Result<PlannerOutput, AgentError> {
    let trimmed = output.trim();

    if let Some(answer) = extract_final_answer(trimmed) {
        return Ok(PlannerOutput::FinalAnswer(answer));
    }

    let json_str = if let Some(caps) = fenced_json().captures(trimmed) {
        caps.get(1).map(|m| m.as_str()).unwrap_or(trimmed)
    } else if let Some(start) = trimmed.find('{') {
        match trimmed.rfind('}') {
            Some(end) if end > start => &trimmed[start..=end],
            // 截断的 tool call
            _ if trimmed.contains("\"tool\"") => {
                return Err(AgentError::JsonParseError(format!("unterminated JSON: {}", trimmed)));
            }
            _ => return Ok(PlannerOutput::FinalAnswer(trimmed.to_string())),
        }
    } else {
        return Ok(PlannerOutput::FinalAnswer(trimmed.to_string()));
    };

    let value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    if let Some(answer) = value.get("final_answer") {
        let answer = match answer.as_str() {
            Some(s) => s.trim().to_string(),
            None => answer.to_string(),
        };
        return Ok(PlannerOutput::FinalAnswer(answer));
    }

    let parsed: ToolCall = serde_json::from_value(value)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    if parsed.tool.trim().is_empty() {
        Ok(PlannerOutput::FinalAnswer(trimmed.to_string()))
    } else {
        Ok(PlannerOutput::ToolCall(parsed))
    }
}

/// Planner：持有 LLM、基础 system prompt 与单次请求超时
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    request_timeout: Duration,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 拼上 system 后调用 LLM；超时返回 NetworkTimeout，后端错误返回 LlmError
    pub async fn plan_with_system(
        &self,
        messages: &[Message],
        system: &str,
    ) -> Result<String, AgentError> {
        let mut full_messages = Vec::with_capacity(messages.len() + 1);
        full_messages.push(Message::system(system));
        full_messages.extend_from_slice(messages);

        match tokio::time::timeout(self.request_timeout, self.llm.complete(&full_messages)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(AgentError::LlmError(e)),
            Err(_) => Err(AgentError::NetworkTimeout(self.request_timeout.as_secs())),
        }
    }
}
