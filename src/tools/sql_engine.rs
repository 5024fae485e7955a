//! sql_engine 工具：把 Agent 的 SQL 交给 QueryExecutor
//!
//! 描述中附带目标表的列清单；执行失败时返回数据库的原始错误信息。

use async_trait::async_trait;
use serde_json::Value;

use crate::database::{table_description, QueryExecutor};
use crate::tools::Tool;

pub const SQL_ENGINE_TOOL: &str = "sql_engine";

/// SQL 工具
pub struct SqlEngineTool {
    executor: QueryExecutor,
    description: String,
}

impl SqlEngineTool {
    pub fn new(executor: QueryExecutor, table: &str) -> Self {
        let description = format!(
            "Allows you to perform SQL queries on the table. Returns a string representation of the result, \
            one row per line.\n{}Args: {{\"query\": \"<correct SQL>\"}}",
            table_description(table)
        );
        Self { executor, description }
    }
}

#[async_trait]
impl Tool for SqlEngineTool {
    fn name(&self) -> &str {
        SQL_ENGINE_TOOL
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "The query to perform. This should be correct SQL." }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "sql_engine requires a string 'query' argument".to_string())?;
        self.executor.execute(query).await.map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_runs_query_and_reports_db_errors() {
        let dir = TempDir::new().unwrap();
        let exec = QueryExecutor::new(dir.path().join("t.db"));
        exec.ensure_schema("hotel_bookings").await.unwrap();
        let tool = SqlEngineTool::new(exec, "hotel_bookings");

        assert!(tool.description().contains("- adr: REAL"));
        assert_eq!(
            tool.execute(json!({"query": "SELECT COUNT(*) FROM hotel_bookings"})).await.unwrap(),
            "\n(0,)"
        );
        let err = tool.execute(json!({"query": "SELECT * FROM nowhere"})).await.unwrap_err();
        assert!(err.contains("no such table"), "{}", err);
        assert!(tool.execute(json!({})).await.is_err());
    }
}
