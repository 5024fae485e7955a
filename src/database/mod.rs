//! 存储层：SQLite 查询执行器、固定表结构描述、批量写入

pub mod executor;
pub mod loader;
pub mod schema;

use thiserror::Error;

pub use executor::{render_value, QueryExecutor};
pub use loader::BulkLoader;
pub use schema::{create_table_sql, table_description, HOTEL_BOOKINGS_COLUMNS};

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Empty payload: no rows to write")]
    EmptyPayload,

    /// blocking 线程池中的任务失败
    #[error("Blocking task failed: {0}")]
    Join(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 校验 SQL 标识符（表名、列名）：仅字母、数字、下划线，且不以数字开头
pub(crate) fn validate_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}
