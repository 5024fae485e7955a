//! 会话监管：单个任务的取消令牌
//!
//! 客户端断开（事件流被 drop）时触发取消，后台的 Agent 运行与总结在下一个挂起点退出。

use tokio_util::sync::{CancellationToken, DropGuard};

/// 任务级生命周期管理：持有根取消令牌
#[derive(Debug, Clone)]
pub struct SessionSupervisor {
    cancel_token: CancellationToken,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// 子 token（Agent 运行、总结各用一个）
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// drop 时自动取消；交给事件流持有，流被丢弃即视为客户端断开
    pub fn drop_guard(&self) -> DropGuard {
        self.cancel_token.clone().drop_guard()
    }
}

impl Default for SessionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
