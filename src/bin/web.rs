//! ask-sql Web 服务
//!
//! 启动: cargo run --bin ask-sql-web
//! 访问 http://127.0.0.1:8000/ask?query=How+many+bookings+are+there

#![cfg(feature = "web")]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use ask_sql::agent::{create_agent_components, query_executor_from_config};
use ask_sql::config::load_config;
use ask_sql::database::BulkLoader;
use ask_sql::llm::create_llm_from_config;
use ask_sql::server::{router, AppState};
use ask_sql::{observability, QueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = load_config(None).context("Failed to load config")?;
    observability::init(&cfg.app.log_level);

    let executor = query_executor_from_config(&cfg);
    executor
        .ensure_schema(&cfg.database.table)
        .await
        .with_context(|| format!("Failed to prepare database at {}", executor.path().display()))?;

    let llm = create_llm_from_config(&cfg);
    let components = Arc::new(create_agent_components(&cfg, llm));
    let state = Arc::new(AppState {
        service: QueryService::from_config(&cfg, components),
        loader: BulkLoader::new(cfg.database.path.clone())
            .with_busy_timeout(Duration::from_millis(cfg.database.busy_timeout_ms)),
        default_table: cfg.database.table.clone(),
        keep_alive: Duration::from_secs(cfg.stream.keep_alive_secs.max(1)),
    });

    let port = std::env::var("ASKSQL_WEB_PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(cfg.web.port);
    let addr = format!("{}:{}", cfg.web.host, port);
    tracing::info!("{} listening on http://{}", cfg.app.name, addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
