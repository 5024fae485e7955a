//! 任务状态机：单个查询任务的阶段与合法迁移
//!
//! START → RUNNING_AGENT → PROJECTING_THOUGHTS → SYNTHESIZING → DONE，任意非终止阶段都可进入 ERROR。

use crate::core::TaskId;

/// 任务阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    Start,
    RunningAgent,
    ProjectingThoughts,
    Synthesizing,
    Done,
    Error,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Done | TaskPhase::Error)
    }

    /// 是否允许从当前阶段迁移到 next
    pub fn can_transition_to(self, next: TaskPhase) -> bool {
        use TaskPhase::*;
        match (self, next) {
            (from, Error) => !from.is_terminal(),
            (Start, RunningAgent)
            | (RunningAgent, ProjectingThoughts)
            | (ProjectingThoughts, Synthesizing)
            | (Synthesizing, Done) => true,
            _ => false,
        }
    }
}

/// 单个任务的运行时状态（仅用于日志与断言，不对外暴露）
#[derive(Debug)]
pub struct TaskState {
    pub id: TaskId,
    phase: TaskPhase,
}

impl TaskState {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            phase: TaskPhase::Start,
        }
    }

    pub fn phase(&self) -> TaskPhase {
        self.phase
    }

    /// 迁移到下一阶段；非法迁移返回 false 且不改变状态
    pub fn advance(&mut self, next: TaskPhase) -> bool {
        if !self.phase.can_transition_to(next) {
            tracing::warn!(task = %self.id, from = ?self.phase, to = ?next, "illegal phase transition");
            return false;
        }
        tracing::debug!(task = %self.id, from = ?self.phase, to = ?next, "phase");
        self.phase = next;
        true
    }
}
