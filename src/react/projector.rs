//! 步骤投影：把 AgentMemory 中的 Step 转成给客户端看的 thought 事件
//!
//! 每个 Step 生成一行 `Step {n}: {kind} - 片段 | 片段 ...`；没有任何可展示字段的 Step 不产生事件。
//! 最后一个 Step 的 action output 若已包含在最终结果中则省略，避免与 result 事件重复。

use crate::memory::Step;
use crate::react::events::StreamEvent;

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// 单个 Step 的文本描述；没有可展示字段时返回 None
pub fn describe_step(step: &Step, is_last: bool, final_result: &str) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(plan) = present(&step.plan) {
        parts.push(format!("Plan:\n{}", plan));
    }
    if let Some(output) = present(&step.model_output) {
        parts.push(format!("LLM Output:\n{}", output));
    }
    for call in &step.tool_calls {
        parts.push(format!("Tool Call: {}", call));
    }
    if let Some(observation) = present(&step.observation) {
        parts.push(format!("Observation:\n{}", observation));
    }
    if let Some(output) = present(&step.action_output) {
        let duplicated = is_last && !final_result.is_empty() && final_result.contains(output);
        if !duplicated {
            parts.push(format!("Action Output: {}", output));
        }
    }
    if let Some(error) = present(&step.error) {
        parts.push(format!("Error: {}", error));
    }

    if parts.is_empty() {
        None
    } else {
        Some(format!("Step {}: {} - {}", step.number, step.kind, parts.join(" | ")))
    }
}

/// 惰性投影：逐个产出 thought 事件，消费一次即结束
pub struct StepProjector<'a> {
    steps: std::slice::Iter<'a, Step>,
    final_result: &'a str,
}

impl<'a> Iterator for StepProjector<'a> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let step = self.steps.next()?;
            let is_last = self.steps.len() == 0;
            if let Some(text) = describe_step(step, is_last, self.final_result) {
                return Some(StreamEvent::Thought(text));
            }
        }
    }
}

/// 按记忆顺序投影步骤
pub fn project_steps<'a>(steps: &'a [Step], final_result: &'a str) -> StepProjector<'a> {
    StepProjector {
        steps: steps.iter(),
        final_result,
    }
}
