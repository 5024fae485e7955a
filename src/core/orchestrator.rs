//! 查询编排：一个问题 -> 有序事件流
//!
//! 每个任务在后台 driver 中依次经过：运行 Agent（offload）-> 投影 thought -> 总结（offload）-> result。
//! 任何阶段失败都只产生一个 error 事件；事件流被丢弃（客户端断开）时通过 DropGuard 取消任务。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::agent::{AgentComponents, ReasoningAgent};
use crate::config::AppConfig;
use crate::core::{AgentError, SessionSupervisor, TaskId, TaskPhase, TaskScheduler, TaskState};
use crate::react::synthesizer::{degraded_response, synthesize};
use crate::react::{project_steps, StreamEvent};

/// 交给 Agent 的指令前缀，后接用户原始问题
pub const SQL_INSTRUCTION_PREFIX: &str = "Execute this SQL query: ";

/// 事件流
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// 事件节奏与预算
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// 相邻 thought 之间的间隔
    pub thought_delay: Duration,
    /// 查询运行与总结运行各自的墙钟预算
    pub run_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            thought_delay: Duration::from_millis(10),
            run_timeout: Duration::from_secs(300),
            channel_capacity: 16,
        }
    }
}

impl StreamSettings {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            thought_delay: Duration::from_millis(cfg.stream.thought_delay_ms),
            run_timeout: Duration::from_secs(cfg.agent.run_timeout_secs),
            ..Self::default()
        }
    }
}

/// 查询服务：共享组件 + 并发上限，可 Clone 到各个请求处理器
#[derive(Clone)]
pub struct QueryService {
    components: Arc<AgentComponents>,
    scheduler: TaskScheduler,
    settings: StreamSettings,
}

impl QueryService {
    pub fn new(components: Arc<AgentComponents>, scheduler: TaskScheduler, settings: StreamSettings) -> Self {
        Self {
            components,
            scheduler,
            settings,
        }
    }

    pub fn from_config(cfg: &AppConfig, components: Arc<AgentComponents>) -> Self {
        Self::new(
            components,
            TaskScheduler::new(cfg.stream.max_concurrent_tasks),
            StreamSettings::from_config(cfg),
        )
    }

    pub fn components(&self) -> &Arc<AgentComponents> {
        &self.components
    }

    /// 为一个问题启动任务，返回形如 `thought* (result | error)` 的事件流
    pub fn execute_query(&self, query: impl Into<String>) -> EventStream {
        let query = query.into();
        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));
        let supervisor = SessionSupervisor::new();
        let guard = supervisor.drop_guard();

        let task = QueryTask {
            id: TaskId::new(),
            query,
            components: Arc::clone(&self.components),
            settings: self.settings.clone(),
        };
        let span = tracing::info_span!("task", id = %task.id);
        let scheduler = self.scheduler.clone();
        tokio::spawn(
            async move {
                let _permit = scheduler.acquire_task().await;
                task.drive(tx, supervisor).await;
            }
            .instrument(span),
        );

        Box::pin(stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|event| (event, (rx, guard)))
        }))
    }
}

/// 在独立任务中运行，并施加墙钟预算；panic 映射为 TaskPanicked，超时中止任务并返回 RunTimeout
async fn offload<F>(fut: F, budget: Duration) -> Result<F::Output, AgentError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let mut handle = tokio::spawn(fut);
    match tokio::time::timeout(budget, &mut handle).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(AgentError::TaskPanicked(e.to_string())),
        Err(_) => {
            handle.abort();
            Err(AgentError::RunTimeout(budget.as_secs()))
        }
    }
}

struct QueryTask {
    id: TaskId,
    query: String,
    components: Arc<AgentComponents>,
    settings: StreamSettings,
}

impl QueryTask {
    async fn drive(self, tx: mpsc::Sender<StreamEvent>, supervisor: SessionSupervisor) {
        let mut state = TaskState::new(self.id);
        let (init_prompt, init_completion, _) = self.components.planner.token_usage();
        tracing::info!(query = %self.query, "task started");

        let terminal = match self.run_phases(&mut state, &tx, &supervisor).await {
            Ok(summary) => {
                state.advance(TaskPhase::Done);
                StreamEvent::Result(summary)
            }
            Err(_) if supervisor.is_cancelled() || tx.is_closed() => {
                tracing::warn!("client disconnected, task abandoned");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "task failed");
                state.advance(TaskPhase::Error);
                StreamEvent::Error(format!("Error executing query: {}", e))
            }
        };

        if tx.send(terminal).await.is_err() {
            tracing::warn!("client disconnected before the final event");
        }

        let (prompt, completion, total) = self.components.planner.token_usage();
        tracing::info!(
            prompt_tokens = prompt.saturating_sub(init_prompt),
            completion_tokens = completion.saturating_sub(init_completion),
            cumulative_total = total,
            phase = ?state.phase(),
            "task finished"
        );
    }

    async fn run_phases(
        &self,
        state: &mut TaskState,
        tx: &mpsc::Sender<StreamEvent>,
        supervisor: &SessionSupervisor,
    ) -> Result<String, AgentError> {
        // 查询运行：新会话，运行前清空
        state.advance(TaskPhase::RunningAgent);
        let mut agent = ReasoningAgent::new(Arc::clone(&self.components));
        agent.reset();
        let instruction = format!("{}{}", SQL_INSTRUCTION_PREFIX, self.query);
        let token = supervisor.child_token();
        let (agent, result) = offload(
            async move {
                let result = agent.run(&instruction, token).await;
                (agent, result)
            },
            self.settings.run_timeout,
        )
        .await?;
        let raw_result = result?;

        state.advance(TaskPhase::ProjectingThoughts);
        for event in project_steps(agent.memory().steps(), &raw_result) {
            tx.send(event).await.map_err(|_| AgentError::Cancelled)?;
            tokio::time::sleep(self.settings.thought_delay).await;
        }

        // 总结运行：隔离的会话，不写入查询运行的记忆
        state.advance(TaskPhase::Synthesizing);
        let mut synth_agent = ReasoningAgent::new(Arc::clone(&self.components));
        synth_agent.reset();
        let question = self.query.clone();
        let raw = raw_result.clone();
        let token = supervisor.child_token();
        let summary = offload(
            async move { synthesize(&question, &raw, &mut synth_agent, token).await },
            self.settings.run_timeout,
        )
        .await
        .unwrap_or_else(|e| degraded_response(&raw_result, &e.to_string()));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::create_agent_components;
    use crate::llm::ScriptedLlmClient;
    use futures_util::StreamExt;

    fn service(llm: Arc<ScriptedLlmClient>) -> QueryService {
        let cfg = AppConfig::default();
        let components = Arc::new(create_agent_components(&cfg, llm));
        let settings = StreamSettings {
            thought_delay: Duration::from_millis(1),
            ..StreamSettings::default()
        };
        QueryService::new(components, TaskScheduler::new(2), settings)
    }

    #[tokio::test]
    async fn test_llm_failure_yields_single_error_event() {
        let llm = Arc::new(ScriptedLlmClient::default());
        let events: Vec<StreamEvent> = service(llm).execute_query("how many?").collect().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(msg) => {
                assert!(msg.starts_with("Error executing query: "));
                assert!(msg.contains("script exhausted"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_direct_answer_then_summary() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "<final_answer>42</final_answer>",
            "<final_answer>The answer is 42.</final_answer>",
        ]));
        let events: Vec<StreamEvent> = service(llm.clone()).execute_query("answer?").collect().await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StreamEvent::Thought(t) if t.starts_with("Step 1: ActionStep")));
        assert_eq!(events[1], StreamEvent::Result("The answer is 42.".to_string()));

        let calls = llm.calls();
        assert!(calls[0][1].content.starts_with(SQL_INSTRUCTION_PREFIX));
        // 总结运行不带查询运行的对话
        assert_eq!(calls[1].len(), 2);
        assert!(calls[1][1].content.contains("And these results: 42"));
    }

    #[tokio::test]
    async fn test_run_timeout_is_reported() {
        let err = offload(tokio::time::sleep(Duration::from_secs(5)), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::RunTimeout(_)));
    }
}
