//! SQL 查询执行器
//!
//! 每条语句打开一个作用域连接，执行后逐行转为字符串并以 "\n" 前缀拼接返回；
//! 失败原样向上抛出，不重试、不返回部分结果。rusqlite 是同步的，异步入口放到 blocking 线程池执行。

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::database::{create_table_sql, validate_identifier, StoreError};

/// 打开一个连接（只读时不会创建文件）
pub(crate) fn open_connection(
    path: &Path,
    busy_timeout: Duration,
    read_only: bool,
) -> Result<Connection, StoreError> {
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI
    } else {
        OpenFlags::default()
    };
    let conn = Connection::open_with_flags(path, flags)?;
    conn.busy_timeout(busy_timeout)?;
    Ok(conn)
}

/// 实数的 repr 形式：最短往返位数；指数 < -4 或 >= 16 时用科学计数法（`1e+16`、`1.5e-05`），
/// 否则总带小数部分（`3.0`）
fn render_real(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let sci = format!("{:e}", f);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..16).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exp.abs());
    }

    let plain = f.to_string();
    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// 单个值的字符串形式：NULL → None，实数同 repr，文本加引号
pub fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "None".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => render_real(f),
        ValueRef::Text(bytes) => {
            let s = String::from_utf8_lossy(bytes).replace('\\', "\\\\");
            if s.contains('\'') && !s.contains('"') {
                format!("\"{}\"", s)
            } else {
                format!("'{}'", s.replace('\'', "\\'"))
            }
        }
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

/// 一行的字符串形式：(a, b)；单列为 (a,)
fn render_row(row: &rusqlite::Row<'_>, columns: usize) -> Result<String, StoreError> {
    let mut values = Vec::with_capacity(columns);
    for i in 0..columns {
        values.push(render_value(row.get_ref(i)?));
    }
    if columns == 1 {
        Ok(format!("({},)", values[0]))
    } else {
        Ok(format!("({})", values.join(", ")))
    }
}

/// 在给定连接上执行一条语句，返回 "\n" 前缀拼接的行
pub(crate) fn run_statement(conn: &Connection, sql: &str) -> Result<String, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt.column_count();
    let mut rows = stmt.query([])?;
    let mut output = String::new();
    while let Some(row) = rows.next()? {
        output.push('\n');
        output.push_str(&render_row(row, columns)?);
    }
    Ok(output)
}

/// 查询执行器：持有数据库路径与连接参数，本身不持有连接
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    path: PathBuf,
    busy_timeout: Duration,
    read_only: bool,
}

impl QueryExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(5000),
            read_only: false,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 同步执行（调用方需自行保证不在 async 线程上阻塞）
    pub fn execute_blocking(&self, sql: &str) -> Result<String, StoreError> {
        let start = Instant::now();
        let conn = open_connection(&self.path, self.busy_timeout, self.read_only)?;
        let result = run_statement(&conn, sql);
        match &result {
            Ok(out) => tracing::debug!(
                rows = out.matches('\n').count(),
                duration_ms = start.elapsed().as_millis() as u64,
                "sql executed"
            ),
            Err(e) => tracing::warn!(error = %e, "sql failed"),
        }
        result
    }

    /// 在 blocking 线程池中执行一条语句
    pub async fn execute(&self, sql: &str) -> Result<String, StoreError> {
        let this = self.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || this.execute_blocking(&sql))
            .await
            .map_err(|e| StoreError::Join(e.to_string()))?
    }

    /// 确保目标表存在（不存在时按固定列清单创建）；只读模式下跳过
    pub async fn ensure_schema(&self, table: &str) -> Result<(), StoreError> {
        validate_identifier(table)?;
        if self.read_only {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let this = self.clone();
        let ddl = create_table_sql(table);
        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = open_connection(&this.path, this.busy_timeout, false)?;
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }
}
