//! Agent 记忆：按顺序记录的推理步骤
//!
//! 每次运行的每轮迭代追加一个 Step；Step 追加后不可修改；每个任务开始前必须 reset。

use std::fmt;

use chrono::{DateTime, Utc};

/// 步骤类型
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    /// 规划步：只有 plan
    Planning,
    /// 动作步：模型输出、工具调用、观察、最终输出或错误
    Action,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Planning => f.write_str("PlanningStep"),
            StepKind::Action => f.write_str("ActionStep"),
        }
    }
}

/// 一次工具调用：名称 + 参数
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: serde_json::Value,
}

impl fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// 一个推理步骤；可选字段只有在对应内容出现时才填充
#[derive(Clone, Debug)]
pub struct Step {
    /// 在记忆中的位置（从 1 开始），由 AgentMemory::push 分配
    pub number: usize,
    pub kind: StepKind,
    pub plan: Option<String>,
    pub model_output: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub observation: Option<String>,
    /// 终止动作的输出（最终答案）
    pub action_output: Option<String>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Step {
    pub fn new(kind: StepKind) -> Self {
        Self {
            number: 0,
            kind,
            plan: None,
            model_output: None,
            tool_calls: Vec::new(),
            observation: None,
            action_output: None,
            error: None,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn action() -> Self {
        Self::new(StepKind::Action)
    }

    pub fn planning(plan: impl Into<String>) -> Self {
        let mut step = Self::new(StepKind::Planning);
        step.plan = Some(plan.into());
        step
    }

    pub fn with_model_output(mut self, output: impl Into<String>) -> Self {
        self.model_output = Some(output.into());
        self
    }

    pub fn with_tool_call(mut self, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        self.tool_calls.push(ToolCallRecord {
            name: name.into(),
            arguments,
        });
        self
    }

    pub fn with_observation(mut self, observation: impl Into<String>) -> Self {
        self.observation = Some(observation.into());
        self
    }

    pub fn with_action_output(mut self, output: impl Into<String>) -> Self {
        self.action_output = Some(output.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// 以 started_at 为起点记录耗时
    pub fn finish(mut self) -> Self {
        let elapsed = Utc::now().signed_duration_since(self.started_at);
        self.duration_ms = elapsed.num_milliseconds().max(0) as u64;
        self
    }
}

/// 步骤日志：只追加、可整体清空
#[derive(Clone, Debug, Default)]
pub struct AgentMemory {
    steps: Vec<Step>,
}

impl AgentMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加步骤并分配序号
    pub fn push(&mut self, mut step: Step) -> usize {
        step.number = self.steps.len() + 1;
        self.steps.push(step);
        self.steps.len()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    pub fn reset(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
