//! ask-sql 命令行前端
//!
//! 用法：`ask-sql "How many bookings were cancelled?"`，每个事件以 `data: {json}` 一行输出。

use std::sync::Arc;

use anyhow::Context;
use futures_util::StreamExt;

use ask_sql::agent::{create_agent_components, query_executor_from_config};
use ask_sql::config::load_config;
use ask_sql::llm::create_llm_from_config;
use ask_sql::{observability, QueryService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.trim().is_empty() {
        anyhow::bail!("usage: ask-sql \"<question>\"");
    }

    let cfg = load_config(None).context("Failed to load config")?;
    observability::init(&cfg.app.log_level);

    query_executor_from_config(&cfg)
        .ensure_schema(&cfg.database.table)
        .await
        .context("Failed to prepare database")?;

    let llm = create_llm_from_config(&cfg);
    let components = Arc::new(create_agent_components(&cfg, llm));
    let service = QueryService::from_config(&cfg, components);

    let mut events = service.execute_query(query.trim());
    while let Some(event) = events.next().await {
        println!("data: {}\n", event.to_json());
    }
    Ok(())
}
