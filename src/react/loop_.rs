//! ReAct 主循环
//!
//! (可选 Plan) -> Think -> Act (sql_engine) -> Observe -> 下一轮；每一轮追加一个 Step 到 AgentMemory。
//! 模型输出格式问题与未知工具走 RecoveryEngine 的 RetryWithPrompt，工具执行失败直接结束本次运行。

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::core::{AgentError, RecoveryAction, RecoveryEngine};
use crate::memory::{AgentMemory, ConversationMemory, Message, Step, StepKind};
use crate::react::planner::{parse_llm_output, Planner, PlannerOutput, OBSERVATION_PREFIX, PLANNING_PROMPT};
use crate::tools::ToolExecutor;

/// 单次运行的步数预算与规划间隔
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// 动作步上限（规划步不计入）
    pub max_steps: usize,
    /// Some(n)：每 n 个动作步之前插入一个规划步
    pub planning_interval: Option<usize>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: 10,
            planning_interval: None,
        }
    }
}

/// ReAct 会话配置：一次运行用到的只读组件
pub struct ReactSession<'a> {
    pub planner: &'a Planner,
    pub executor: &'a ToolExecutor,
    pub recovery: &'a RecoveryEngine,
    pub system_prompt: &'a str,
    pub settings: &'a AgentSettings,
    pub cancel_token: CancellationToken,
}

impl<'a> ReactSession<'a> {
    pub fn new(
        planner: &'a Planner,
        executor: &'a ToolExecutor,
        recovery: &'a RecoveryEngine,
        system_prompt: &'a str,
        settings: &'a AgentSettings,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            planner,
            executor,
            recovery,
            system_prompt,
            settings,
            cancel_token,
        }
    }
}

async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, AgentError>
where
    F: Future<Output = Result<T, AgentError>>,
{
    tokio::select! {
        _ = token.cancelled() => Err(AgentError::Cancelled),
        r = fut => r,
    }
}

/// 执行 ReAct 循环，返回本次运行的最终输出
///
/// memory 与 transcript 由调用方在运行前清空；步数用尽时返回带最后一次模型输出的提示文本而非错误。
pub async fn react_loop(
    session: &ReactSession<'_>,
    memory: &mut AgentMemory,
    transcript: &mut ConversationMemory,
    instruction: &str,
) -> Result<String, AgentError> {
    let planner = session.planner;
    let settings = session.settings;
    let cancel_token = &session.cancel_token;

    transcript.push(Message::user(instruction));

    let mut action_steps = 0;
    let mut last_llm_output = String::new();

    while action_steps < settings.max_steps {
        if cancel_token.is_cancelled() {
            return Err(AgentError::Cancelled);
        }

        if let Some(interval) = settings.planning_interval.filter(|n| *n > 0) {
            if action_steps % interval == 0 {
                plan_step(session, memory, transcript).await?;
            }
        }

        action_steps += 1;
        let step = Step::action();

        let output = match cancellable(
            cancel_token,
            planner.plan_with_system(transcript.messages(), session.system_prompt),
        )
        .await
        {
            Ok(o) => o,
            Err(e) => {
                memory.push(step.with_error(e.to_string()).finish());
                return Err(e);
            }
        };

        last_llm_output = output.clone();
        transcript.push(Message::assistant(output.clone()));
        let step = step.with_model_output(output.as_str());

        let failure = match parse_llm_output(&output) {
            Ok(PlannerOutput::FinalAnswer(answer)) => {
                memory.push(step.with_action_output(answer.as_str()).finish());
                tracing::debug!(steps = memory.len(), "final answer reached");
                return Ok(answer);
            }
            Ok(PlannerOutput::ToolCall(tc)) => {
                let step = step.with_tool_call(tc.tool.as_str(), tc.args.clone());
                match cancellable(cancel_token, session.executor.execute(&tc.tool, tc.args)).await {
                    Ok(observation) => {
                        transcript.push(Message::user(format!("{}\n{}", OBSERVATION_PREFIX, observation)));
                        memory.push(step.with_observation(observation).finish());
                        continue;
                    }
                    Err(e) => (step, e),
                }
            }
            Err(e) => (step, e),
        };

        let (step, err) = failure;
        memory.push(step.with_error(err.to_string()).finish());
        match session.recovery.handle(&err) {
            RecoveryAction::RetryWithPrompt(prompt) => {
                tracing::debug!(error = %err, "retrying with corrective prompt");
                transcript.push(Message::user(prompt));
            }
            RecoveryAction::Abort => return Err(err),
        }
    }

    tracing::warn!(max_steps = settings.max_steps, "step budget exhausted");
    Ok(format!(
        "Reached the step limit ({}) without a final answer. Last model output:\n{}",
        settings.max_steps, last_llm_output
    ))
}

/// 规划步：单独请求一份计划，写入记忆与对话，但不计入动作步
async fn plan_step(
    session: &ReactSession<'_>,
    memory: &mut AgentMemory,
    transcript: &mut ConversationMemory,
) -> Result<(), AgentError> {
    let mut messages = transcript.messages().to_vec();
    messages.push(Message::user(PLANNING_PROMPT));

    match cancellable(
        &session.cancel_token,
        session.planner.plan_with_system(&messages, session.system_prompt),
    )
    .await
    {
        Ok(plan) => {
            let plan = plan.trim().to_string();
            transcript.push(Message::assistant(format!("Plan:\n{}", plan)));
            memory.push(Step::planning(plan).finish());
            Ok(())
        }
        Err(e) => {
            memory.push(Step::new(StepKind::Planning).with_error(e.to_string()).finish());
            Err(e)
        }
    }
}
