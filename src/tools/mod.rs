//! 工具箱：注册表、带超时与审计的执行器、SQL 工具

pub mod executor;
pub mod registry;
pub mod schema;
pub mod sql_engine;

pub use executor::ToolExecutor;
pub use registry::{Tool, ToolRegistry};
pub use schema::tool_call_schema_json;
pub use sql_engine::{SqlEngineTool, SQL_ENGINE_TOOL};
