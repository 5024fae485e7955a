//! 工具调用 JSON Schema 生成
//!
//! 将「合法 tool call」的 JSON 结构注入 system prompt，减少 LLM 输出格式错误。

use std::collections::HashMap;

use schemars::{schema_for, JsonSchema};

/// 工具调用格式：与 parse_llm_output 解析的 `{"thought": "...", "tool": "...", "args": {...}}` 一致（仅用于 Schema 生成）
#[allow(dead_code)]
#[derive(JsonSchema)]
struct ToolCallFormat {
    /// 调用前的简短推理
    pub thought: Option<String>,
    /// 工具名，如 sql_engine
    pub tool: String,
    /// 工具参数；sql_engine 只接受 query
    pub args: HashMap<String, String>,
}

/// 返回工具调用的 JSON Schema 字符串，可拼入 system prompt
pub fn tool_call_schema_json() -> String {
    serde_json::to_string_pretty(&schema_for!(ToolCallFormat)).unwrap_or_default()
}
