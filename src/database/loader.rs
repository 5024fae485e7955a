//! 批量写入：将 JSON 行追加到目标表
//!
//! 表不存在时按首个非空值推断列类型建表；所有行在同一事务内写入，任一行失败则整体回滚。

use std::path::PathBuf;
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use serde_json::{Map, Value};

use crate::database::executor::open_connection;
use crate::database::{validate_identifier, StoreError};

/// 批量写入器
#[derive(Debug, Clone)]
pub struct BulkLoader {
    path: PathBuf,
    busy_timeout: Duration,
}

fn column_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "INTEGER",
        Value::Number(n) if n.is_i64() || n.is_u64() => "INTEGER",
        Value::Number(_) => "REAL",
        _ => "TEXT",
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

/// 按首次出现顺序收集所有行的列名
fn collect_columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

impl BulkLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(5000),
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// 同步写入，返回写入行数
    pub fn write_rows_blocking(
        &self,
        table: &str,
        rows: &[Map<String, Value>],
    ) -> Result<usize, StoreError> {
        validate_identifier(table)?;
        if rows.is_empty() {
            return Err(StoreError::EmptyPayload);
        }
        let columns = collect_columns(rows);
        for c in &columns {
            validate_identifier(c)?;
        }

        let mut conn = open_connection(&self.path, self.busy_timeout, false)?;
        let tx = conn.transaction()?;

        let defs: Vec<String> = columns
            .iter()
            .map(|c| {
                let ty = rows
                    .iter()
                    .filter_map(|r| r.get(c))
                    .find(|v| !v.is_null())
                    .map(column_type)
                    .unwrap_or("TEXT");
                format!("\"{}\" {}", c, ty)
            })
            .collect();
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({})",
            table,
            defs.join(", ")
        ))?;

        let quoted: Vec<String> = columns.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            table,
            quoted.join(", "),
            placeholders
        );
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let values: Vec<SqlValue> = columns
                    .iter()
                    .map(|c| row.get(c).map(to_sql_value).unwrap_or(SqlValue::Null))
                    .collect();
                stmt.execute(rusqlite::params_from_iter(values))?;
            }
        }
        tx.commit()?;
        tracing::info!(table, rows = rows.len(), "bulk load committed");
        Ok(rows.len())
    }

    /// 在 blocking 线程池中写入
    pub async fn write_rows(
        &self,
        table: &str,
        rows: Vec<Map<String, Value>>,
    ) -> Result<usize, StoreError> {
        let this = self.clone();
        let table = table.to_string();
        tokio::task::spawn_blocking(move || this.write_rows_blocking(&table, &rows))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }
}
