//! 记忆层：发给 LLM 的对话记录、Agent 的步骤日志

pub mod conversation;
pub mod steps;

pub use conversation::{ConversationMemory, Message, Role};
pub use steps::{AgentMemory, Step, StepKind, ToolCallRecord};
