//! 核心编排层：错误与恢复、任务状态、会话监管、任务调度、查询编排

pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod session_supervisor;
pub mod state;
pub mod task_scheduler;

pub use error::{AgentError, RecoveryAction};
pub use orchestrator::{EventStream, QueryService, StreamSettings, SQL_INSTRUCTION_PREFIX};
pub use recovery::RecoveryEngine;
pub use session_supervisor::SessionSupervisor;
pub use state::{TaskPhase, TaskState};
pub use task_scheduler::{TaskId, TaskScheduler};
