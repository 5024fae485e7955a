//! 离线 LLM 客户端
//!
//! - MockLlmClient：无 API Key 时的兜底，按固定套路跑通「调用 sql_engine → 给出最终答案」；
//!   无法识别的请求（如总结）返回空串，交给总结器的降级路径。
//! - ScriptedLlmClient：按预设顺序返回回复或错误，记录每次收到的消息，供测试使用。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};
use crate::react::planner::{OBSERVATION_PREFIX, PLANNING_PROMPT};
use crate::SQL_INSTRUCTION_PREFIX;

/// Mock 客户端
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        if last_user.starts_with(PLANNING_PROMPT) {
            return Ok("1. Run the query with sql_engine.\n2. Report the rows it returns.".to_string());
        }

        if let Some(observation) = last_user.strip_prefix(OBSERVATION_PREFIX) {
            return Ok(format!("<final_answer>{}</final_answer>", observation));
        }

        let sql = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .find_map(|m| m.content.strip_prefix(SQL_INSTRUCTION_PREFIX));
        match sql {
            Some(sql) => Ok(serde_json::json!({
                "thought": "Run the query as given.",
                "tool": "sql_engine",
                "args": { "query": sql.trim() }
            })
            .to_string()),
            None => Ok(String::new()),
        }
    }
}

/// 脚本化客户端：依次弹出预设回复，用尽后返回错误
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 追加一条回复（Ok 为文本，Err 为模拟后端故障）
    pub fn push(&self, reply: Result<String, String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(reply);
    }

    pub fn with_reply(self, reply: Result<String, String>) -> Self {
        self.push(reply);
        self
    }

    /// 每次 complete 收到的消息
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        self.calls
            .lock()
            .map_err(|e| e.to_string())?
            .push(messages.to_vec());
        self.replies
            .lock()
            .map_err(|e| e.to_string())?
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()))
    }
}
