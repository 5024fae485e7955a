//! 端到端：问题 -> Agent 运行 -> thought 投影 -> 总结 -> result / error

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempDir;

use ask_sql::agent::{create_agent_components, query_executor_from_config};
use ask_sql::config::AppConfig;
use ask_sql::core::{StreamSettings, TaskScheduler};
use ask_sql::llm::{LlmClient, MockLlmClient, ScriptedLlmClient};
use ask_sql::react::NO_RESULTS;
use ask_sql::{QueryService, StreamEvent};

fn test_config(dir: &TempDir) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.path = dir.path().join("hotel.db");
    cfg.llm.provider = "mock".to_string();
    cfg.stream.thought_delay_ms = 0;
    cfg
}

async fn seeded_config(dir: &TempDir, rows: i64) -> AppConfig {
    let cfg = test_config(dir);
    let executor = query_executor_from_config(&cfg);
    executor.ensure_schema(&cfg.database.table).await.unwrap();
    if rows > 0 {
        let conn = rusqlite::Connection::open(&cfg.database.path).unwrap();
        conn.execute(
            "INSERT INTO hotel_bookings (hotel, is_canceled) \
             WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < ?1) \
             SELECT 'City Hotel', x % 2 FROM c",
            [rows],
        )
        .unwrap();
    }
    cfg
}

fn service(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> QueryService {
    let components = Arc::new(create_agent_components(cfg, llm));
    let settings = StreamSettings {
        thought_delay: Duration::from_millis(0),
        ..StreamSettings::default()
    };
    QueryService::new(components, TaskScheduler::new(4), settings)
}

fn assert_well_ordered(events: &[StreamEvent]) {
    let (last, thoughts) = events.split_last().expect("at least one event");
    assert!(last.is_terminal(), "stream must end with result or error: {:?}", last);
    assert!(
        thoughts.iter().all(|e| matches!(e, StreamEvent::Thought(_))),
        "only thoughts may precede the terminal event: {:?}",
        events
    );
}

#[tokio::test]
async fn test_count_query_streams_thoughts_then_result() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 119_390).await;
    let svc = service(&cfg, Arc::new(MockLlmClient));

    let events: Vec<StreamEvent> = svc
        .execute_query("SELECT COUNT(*) FROM hotel_bookings")
        .collect()
        .await;

    assert_well_ordered(&events);
    assert_eq!(events.len(), 3, "{:?}", events);

    let first = events[0].content();
    assert!(first.starts_with("Step 1: ActionStep - "));
    assert!(first.contains("Tool Call: sql_engine("));
    assert!(first.contains(" | Observation:\n\n(119390,)"));
    assert!(events[1].content().starts_with("Step 2: ActionStep - "));

    match &events[2] {
        StreamEvent::Result(text) => {
            assert_eq!(text, "I have counted the following information:\n• 119390,\n");
        }
        other => panic!("expected result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_syntax_error_yields_single_error_event() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 3).await;
    let svc = service(&cfg, Arc::new(MockLlmClient));

    let events: Vec<StreamEvent> = svc.execute_query("SELEC * FROM hotel_bookings").collect().await;

    assert_eq!(events.len(), 1, "{:?}", events);
    match &events[0] {
        StreamEvent::Error(msg) => {
            assert!(msg.starts_with("Error executing query: "), "{}", msg);
            assert!(msg.contains("syntax error"), "{}", msg);
        }
        other => panic!("expected error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_result_short_circuits_summary() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 3).await;
    let svc = service(&cfg, Arc::new(MockLlmClient));

    let events: Vec<StreamEvent> = svc
        .execute_query("SELECT hotel FROM hotel_bookings WHERE 1 = 0")
        .collect()
        .await;

    assert_well_ordered(&events);
    assert_eq!(events.last(), Some(&StreamEvent::Result(NO_RESULTS.to_string())));
}

#[tokio::test]
async fn test_summary_prefers_final_answer_of_last_step() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 3).await;
    let llm = Arc::new(ScriptedLlmClient::new([
        r#"{"thought": "count", "tool": "sql_engine", "args": {"query": "SELECT COUNT(*) FROM hotel_bookings"}}"#,
        "<final_answer>(3,)</final_answer>",
        "Thought: summarise\n<final_answer>  There are 3 bookings in total.  </final_answer>",
    ]));
    let svc = service(&cfg, llm.clone());

    let events: Vec<StreamEvent> = svc.execute_query("How many bookings?").collect().await;

    assert_well_ordered(&events);
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Result("There are 3 bookings in total.".to_string()))
    );
    // 最后一步的输出已包含在原始结果中，thought 里不重复
    assert!(!events[1].content().contains("Action Output"));

    let calls = llm.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[2][1].content.contains("Given this SQL query: How many bookings?"));
    assert!(calls[2][1].content.contains("(3,)"));
}

#[tokio::test]
async fn test_summary_error_text_triggers_fallback() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 2).await;
    let llm = Arc::new(ScriptedLlmClient::new([
        r#"{"tool": "sql_engine", "args": {"query": "SELECT AVG(is_canceled) FROM hotel_bookings"}}"#,
        "<final_answer>(0.5,)</final_answer>",
        "<final_answer>Error: I cannot summarise this.</final_answer>",
    ]));
    let svc = service(&cfg, llm);

    let events: Vec<StreamEvent> = svc.execute_query("average cancellation rate").collect().await;

    assert_eq!(
        events.last(),
        Some(&StreamEvent::Result(
            "I have calculated the average of the following information:\n• 0.5,\n".to_string()
        ))
    );
}

#[tokio::test]
async fn test_summary_json_final_answer_is_unwrapped() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 0).await;
    let llm = Arc::new(ScriptedLlmClient::new([
        r#"{"tool": "sql_engine", "args": {"query": "SELECT COUNT(*) FROM hotel_bookings"}}"#,
        "<final_answer>(0,)</final_answer>",
        r#"{"final_answer": "There are no bookings."}"#,
    ]));
    let svc = service(&cfg, llm);

    let events: Vec<StreamEvent> = svc.execute_query("How many bookings?").collect().await;

    assert_well_ordered(&events);
    assert_eq!(
        events.last(),
        Some(&StreamEvent::Result("There are no bookings.".to_string()))
    );
}

#[tokio::test]
async fn test_summary_step_limit_uses_fallback_not_tool_call() {
    let dir = TempDir::new().unwrap();
    let mut cfg = seeded_config(&dir, 2).await;
    cfg.agent.max_steps = 2;
    let call = r#"{"tool": "sql_engine", "args": {"query": "SELECT 1"}}"#;
    let llm = Arc::new(ScriptedLlmClient::new([
        r#"{"tool": "sql_engine", "args": {"query": "SELECT COUNT(*) FROM hotel_bookings"}}"#,
        "<final_answer>(2,)</final_answer>",
        call,
        call,
    ]));
    let svc = service(&cfg, llm);

    let events: Vec<StreamEvent> = svc.execute_query("count rows").collect().await;

    assert_well_ordered(&events);
    match events.last() {
        Some(StreamEvent::Result(text)) => {
            assert_eq!(text, "I have counted the following information:\n• 2,\n");
            assert!(!text.contains("sql_engine"), "{}", text);
        }
        other => panic!("expected result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_summary_failure_degrades_to_raw_results() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 2).await;
    // 总结运行时脚本已用尽，LLM 报错
    let llm = Arc::new(ScriptedLlmClient::new([
        r#"{"tool": "sql_engine", "args": {"query": "SELECT COUNT(*) FROM hotel_bookings"}}"#,
        "<final_answer>(2,)</final_answer>",
    ]));
    let svc = service(&cfg, llm);

    let events: Vec<StreamEvent> = svc.execute_query("count rows").collect().await;

    match events.last() {
        Some(StreamEvent::Result(text)) => {
            assert!(text.starts_with("I found the following raw results:\n(2,)"), "{}", text);
            assert!(text.contains("script exhausted"), "{}", text);
        }
        other => panic!("expected degraded result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_tasks_do_not_share_sessions() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 10).await;
    let svc = service(&cfg, Arc::new(MockLlmClient));

    let a = svc.execute_query("SELECT COUNT(*) FROM hotel_bookings").collect::<Vec<_>>();
    let b = svc
        .execute_query("SELECT COUNT(*) FROM hotel_bookings WHERE is_canceled = 1")
        .collect::<Vec<_>>();
    let (a, b) = tokio::join!(a, b);

    assert_well_ordered(&a);
    assert_well_ordered(&b);
    assert_eq!(a.len(), 3);
    assert_eq!(b.len(), 3);
    assert!(a[0].content().starts_with("Step 1:"));
    assert!(b[0].content().starts_with("Step 1:"));
    assert!(a.last().unwrap().content().contains("• 10,"));
    assert!(b.last().unwrap().content().contains("• 5,"));
}

#[tokio::test]
async fn test_dropping_stream_early_does_not_hang() {
    let dir = TempDir::new().unwrap();
    let cfg = seeded_config(&dir, 5).await;
    let svc = service(&cfg, Arc::new(MockLlmClient));

    let mut events = svc.execute_query("SELECT COUNT(*) FROM hotel_bookings");
    let first = events.next().await.unwrap();
    assert!(matches!(first, StreamEvent::Thought(_)));
    drop(events);

    // 放弃的任务释放许可后，新任务仍可完成
    let events: Vec<StreamEvent> = svc
        .execute_query("SELECT COUNT(*) FROM hotel_bookings")
        .collect()
        .await;
    assert_well_ordered(&events);
}
