//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `ASKSQL__*` 覆盖（双下划线表示嵌套，如 `ASKSQL__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub database: DatabaseSection,
    pub agent: AgentSection,
    pub stream: StreamSection,
    pub web: WebSection,
}

/// [app] 段：应用名、默认日志级别
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
    /// RUST_LOG 未设置时使用
    pub log_level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "ask-sql".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：gemini / openai / mock；是否真正启用还取决于对应 API Key 是否存在
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次 LLM 请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [database] 段：SQLite 文件、目标表、忙等待、只读开关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: PathBuf,
    pub table: String,
    pub busy_timeout_ms: u64,
    /// 为 true 时以只读方式打开连接，Agent 无法执行 DML/DDL
    pub read_only: bool,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/hotel_bookings.db"),
            table: "hotel_bookings".to_string(),
            busy_timeout_ms: 5000,
            read_only: false,
        }
    }
}

/// [agent] 段：推理循环预算
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 单次运行最多的动作步数
    pub max_steps: usize,
    /// 每 N 个动作步前插入一个规划步；None 表示不规划
    pub planning_interval: Option<usize>,
    pub tool_timeout_secs: u64,
    /// 单次运行的墙钟预算（秒）
    pub run_timeout_secs: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: 10,
            planning_interval: None,
            tool_timeout_secs: 30,
            run_timeout_secs: 300,
        }
    }
}

/// [stream] 段：事件节奏与并发
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSection {
    /// 相邻 thought 事件之间的间隔（毫秒）
    pub thought_delay_ms: u64,
    pub max_concurrent_tasks: usize,
    pub keep_alive_secs: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self {
            thought_delay_ms: 10,
            max_concurrent_tasks: 4,
            keep_alive_secs: 15,
        }
    }
}

/// [web] 段：监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebSection {
    pub host: String,
    pub port: u16,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 ASKSQL__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 ASKSQL__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("ASKSQL")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
