//! 任务调度：任务 ID 与并发上限
//!
//! 每个查询任务独占一个 Agent 会话；跨任务的并发由 Semaphore 限制，超出上限的任务排队等待。

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 任务 ID（进程内单调递增）
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskId {
    pub fn new() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// 任务调度器
#[derive(Clone)]
pub struct TaskScheduler {
    task_semaphore: Arc<Semaphore>,
}

impl TaskScheduler {
    pub fn new(max_concurrent_tasks: usize) -> Self {
        Self {
            task_semaphore: Arc::new(Semaphore::new(max_concurrent_tasks.max(1))),
        }
    }

    /// 获取任务执行许可；信号量从不关闭，关闭时返回 None
    pub async fn acquire_task(&self) -> Option<OwnedSemaphorePermit> {
        self.task_semaphore.clone().acquire_owned().await.ok()
    }

    /// 当前空闲许可数
    pub fn available(&self) -> usize {
        self.task_semaphore.available_permits()
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(4)
    }
}
