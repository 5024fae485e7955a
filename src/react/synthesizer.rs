//! 结果总结：把原始查询结果交给 Agent 再跑一次，生成自然语言回答
//!
//! 模型回复为空或含 "error" 时退回到按关键词拼装的要点列表；总结过程出错时返回带原始结果的降级文本，
//! 总结失败从不导致整个查询失败。

use tokio_util::sync::CancellationToken;

use crate::agent::ReasoningAgent;
use crate::memory::AgentMemory;
use crate::react::planner::extract_final_answer;

pub const NO_RESULTS: &str = "No results found for this query.";

/// 总结提示：复述查询目标、关键发现、值得注意的规律
pub fn build_summary_prompt(question: &str, raw_result: &str) -> String {
    format!(
        "Given this SQL query: {question}\n\
        And these results: {raw_result}\n\n\
        Please provide a natural language summary of these results.\n\
        Focus on:\n\
        1. What was queried (the main objective)\n\
        2. Key findings from the results\n\
        3. Any notable patterns or insights\n\n\
        Format the response in a clear, concise & conversational way that a non-technical person would understand."
    )
}

/// 按问题里的关键词选动词
fn action_verb(question: &str) -> &'static str {
    let q = question.to_lowercase();
    if q.contains("count") {
        "counted"
    } else if q.contains("avg") || q.contains("average") {
        "calculated the average of"
    } else if q.contains("sum") {
        "calculated the total of"
    } else {
        "retrieved"
    }
}

/// 不依赖模型的兜底回答：每行结果一个要点，去掉括号与引号
pub fn fallback_response(question: &str, raw_result: &str) -> String {
    let raw = raw_result.trim();
    if raw.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut response = format!("I have {} the following information:\n", action_verb(question));
    for row in raw.split('\n') {
        let cleaned: String = row
            .trim_matches(|c| c == '(' || c == ')')
            .chars()
            .filter(|c| *c != '\'' && *c != '"')
            .collect();
        response.push_str(&format!("• {}\n", cleaned));
    }
    response
}

/// 总结失败时的降级文本
pub fn degraded_response(raw_result: &str, error: &str) -> String {
    format!(
        "I found the following raw results:\n{}\n\n(Could not generate a natural language summary due to an internal error: {})",
        raw_result, error
    )
}

/// 从一次总结运行中取最终文本
///
/// 回复为空或含 "error"（不区分大小写）时走兜底；否则取最后一个 Step 已解析出的最终答案（action output），
/// 不把模型的原始输出（JSON、标签）交给客户端。最后一步没有最终答案（如步数用尽）时同样走兜底；
/// 记忆为空时用运行的返回值。
pub fn select_response(question: &str, raw_result: &str, response: &str, memory: &AgentMemory) -> String {
    if response.trim().is_empty() || response.to_lowercase().contains("error") {
        return fallback_response(question, raw_result);
    }

    let Some(last) = memory.last() else {
        return response.trim().to_string();
    };
    match last.action_output.as_deref().map(str::trim) {
        Some(answer) if !answer.is_empty() => {
            extract_final_answer(answer).unwrap_or_else(|| answer.to_string())
        }
        _ => {
            tracing::debug!(step = last.number, "summary run ended without a final answer, using fallback");
            fallback_response(question, raw_result)
        }
    }
}

/// 生成自然语言回答；agent 应当是与查询运行隔离的新会话
pub async fn synthesize(
    question: &str,
    raw_result: &str,
    agent: &mut ReasoningAgent,
    cancel_token: CancellationToken,
) -> String {
    if raw_result.trim().is_empty() {
        return NO_RESULTS.to_string();
    }

    let prompt = build_summary_prompt(question, raw_result);
    match agent.run(&prompt, cancel_token).await {
        Ok(response) => select_response(question, raw_result, &response, agent.memory()),
        Err(e) => {
            tracing::warn!(error = %e, "summary generation failed, returning raw results");
            degraded_response(raw_result, &e.to_string())
        }
    }
}
