//! 流式事件：推送给客户端的 thought / result / error
//!
//! 序列化为 `{"type": "thought", "content": "..."}`，一个任务的事件序列形如 `thought* (result | error)`。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum StreamEvent {
    /// 一个推理步骤的可读摘要
    Thought(String),
    /// 最终的自然语言结果
    Result(String),
    /// 任务失败
    Error(String),
}

impl StreamEvent {
    /// result / error 都会结束事件流
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Thought(_))
    }

    pub fn content(&self) -> &str {
        match self {
            StreamEvent::Thought(c) | StreamEvent::Result(c) | StreamEvent::Error(c) => c,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Thought(_) => "thought",
            StreamEvent::Result(_) => "result",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","content":"failed to encode event: {}"}}"#, e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            StreamEvent::Thought("Step 1".into()).to_json(),
            r#"{"type":"thought","content":"Step 1"}"#
        );
        assert_eq!(
            StreamEvent::Error("boom".into()).to_json(),
            r#"{"type":"error","content":"boom"}"#
        );
        let back: StreamEvent =
            serde_json::from_str(r#"{"type":"result","content":"done"}"#).unwrap();
        assert_eq!(back, StreamEvent::Result("done".into()));
        assert!(back.is_terminal());
        assert_eq!(back.kind(), "result");
    }
}
