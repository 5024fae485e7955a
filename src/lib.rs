//! ask-sql - 流式自然语言查询服务
//!
//! 模块划分：
//! - **agent**: 组件组装与推理会话（ReasoningAgent）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与恢复、任务状态、会话监管、并发调度、查询编排
//! - **database**: SQLite 查询执行、批量写入、表结构
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Gemini / Mock）
//! - **memory**: 对话记录与步骤记忆
//! - **react**: Planner、ReAct 主循环、步骤投影、结果总结
//! - **server**: HTTP / SSE 接口（web feature）
//! - **tools**: 工具注册表、执行器与 sql_engine

pub mod agent;
pub mod config;
pub mod core;
pub mod database;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod react;
#[cfg(feature = "web")]
pub mod server;
pub mod tools;

pub use crate::core::orchestrator::SQL_INSTRUCTION_PREFIX;
pub use crate::core::QueryService;
pub use crate::react::StreamEvent;
