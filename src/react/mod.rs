//! 认知层：Planner、ReAct 主循环、步骤投影、结果总结、流式事件

pub mod events;
pub mod loop_;
pub mod planner;
pub mod projector;
pub mod synthesizer;

pub use events::StreamEvent;
pub use loop_::{react_loop, AgentSettings, ReactSession};
pub use planner::{extract_final_answer, parse_llm_output, Planner, PlannerOutput, ToolCall};
pub use projector::{describe_step, project_steps, StepProjector};
pub use synthesizer::{degraded_response, fallback_response, synthesize, NO_RESULTS};
