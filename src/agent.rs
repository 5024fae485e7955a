//! Headless Agent 运行时
//!
//! create_agent_components 按配置组装 Planner / ToolExecutor / Recovery（注册 sql_engine 工具），
//! 组件可被多个任务共享；ReasoningAgent 是一次任务独占的会话，持有自己的步骤记忆与对话。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::core::{AgentError, RecoveryEngine};
use crate::database::QueryExecutor;
use crate::llm::LlmClient;
use crate::memory::{AgentMemory, ConversationMemory};
use crate::react::planner::DEFAULT_SYSTEM_PROMPT;
use crate::react::{react_loop, AgentSettings, Planner, ReactSession};
use crate::tools::{tool_call_schema_json, SqlEngineTool, ToolExecutor, ToolRegistry};

/// 预构建的 Agent 组件，可多会话共享
pub struct AgentComponents {
    pub planner: Planner,
    pub executor: ToolExecutor,
    pub recovery: RecoveryEngine,
    pub settings: AgentSettings,
    /// 基础 prompt + 工具清单 + tool call schema
    system_prompt: String,
}

impl AgentComponents {
    pub fn new(planner: Planner, executor: ToolExecutor, settings: AgentSettings) -> Self {
        let recovery = RecoveryEngine::new().with_tool_names(executor.tool_names());
        let system_prompt = planner
            .base_system_prompt()
            .replace("{schema}", &tool_call_schema_json())
            .replace("{tools}", &executor.registry().to_prompt_section());
        Self {
            planner,
            executor,
            recovery,
            settings,
            system_prompt,
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

/// 按 [database] 段构建查询执行器
pub fn query_executor_from_config(cfg: &AppConfig) -> QueryExecutor {
    QueryExecutor::new(cfg.database.path.clone())
        .with_busy_timeout(Duration::from_millis(cfg.database.busy_timeout_ms))
        .with_read_only(cfg.database.read_only)
}

/// 创建 Agent 组件：sql_engine 工具指向配置中的数据库与表
pub fn create_agent_components(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> AgentComponents {
    let mut tools = ToolRegistry::new();
    tools.register(SqlEngineTool::new(query_executor_from_config(cfg), &cfg.database.table));

    let planner = Planner::new(llm, DEFAULT_SYSTEM_PROMPT)
        .with_request_timeout(Duration::from_secs(cfg.llm.timeouts.request));
    let settings = AgentSettings {
        max_steps: cfg.agent.max_steps,
        planning_interval: cfg.agent.planning_interval,
    };

    AgentComponents::new(
        planner,
        ToolExecutor::new(tools, cfg.agent.tool_timeout_secs),
        settings,
    )
}

/// 推理会话：一次只能有一个运行（run 需要 &mut self）
pub struct ReasoningAgent {
    components: Arc<AgentComponents>,
    memory: AgentMemory,
    transcript: ConversationMemory,
}

impl ReasoningAgent {
    pub fn new(components: Arc<AgentComponents>) -> Self {
        Self {
            components,
            memory: AgentMemory::new(),
            transcript: ConversationMemory::new(),
        }
    }

    /// 清空步骤记忆与对话；每个任务开始前由调用方执行
    pub fn reset(&mut self) {
        self.memory.reset();
        self.transcript.clear();
    }

    pub fn memory(&self) -> &AgentMemory {
        &self.memory
    }

    pub fn components(&self) -> &Arc<AgentComponents> {
        &self.components
    }

    /// 对一条指令跑 ReAct 循环，步骤追加到本会话记忆
    pub async fn run(
        &mut self,
        instruction: &str,
        cancel_token: CancellationToken,
    ) -> Result<String, AgentError> {
        let components = Arc::clone(&self.components);
        let session = ReactSession::new(
            &components.planner,
            &components.executor,
            &components.recovery,
            components.system_prompt(),
            &components.settings,
            cancel_token,
        );
        react_loop(&session, &mut self.memory, &mut self.transcript, instruction).await
    }
}
