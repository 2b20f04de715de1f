use std::path::PathBuf;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 题目图片目录
    pub question_dir: PathBuf,
    /// 评分标准图片目录
    pub scheme_dir: PathBuf,
    /// 本批试卷信息（TOML：board / subject / year / paper）
    pub batch_file: PathBuf,
    /// 题库数据目录（每个集合一个 JSON 文件）
    pub data_dir: PathBuf,
    /// 主题分类表 CSV（可选）
    pub topic_schema_csv: Option<PathBuf>,
    /// 是否在提交前自动调用 AI 补全
    pub auto_enrich: bool,
    /// 补全时每行之间的等待时间（毫秒）
    pub enrich_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 判分最多尝试次数
    pub llm_max_retries: usize,
    /// 判分重试的基础等待（毫秒），之后每次翻倍
    pub llm_retry_base_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_dir: PathBuf::from("input/questions"),
            scheme_dir: PathBuf::from("input/schemes"),
            batch_file: PathBuf::from("input/batch.toml"),
            data_dir: PathBuf::from("data"),
            topic_schema_csv: None,
            auto_enrich: true,
            enrich_delay_ms: 500,
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_max_retries: 5,
            llm_retry_base_ms: 1000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            question_dir: std::env::var("QUESTION_DIR").map(PathBuf::from).unwrap_or(default.question_dir),
            scheme_dir: std::env::var("SCHEME_DIR").map(PathBuf::from).unwrap_or(default.scheme_dir),
            batch_file: std::env::var("BATCH_FILE").map(PathBuf::from).unwrap_or(default.batch_file),
            data_dir: std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            topic_schema_csv: std::env::var("TOPIC_SCHEMA_CSV").ok().filter(|v| !v.is_empty()).map(PathBuf::from).or(default.topic_schema_csv),
            auto_enrich: std::env::var("AUTO_ENRICH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_enrich),
            enrich_delay_ms: std::env::var("ENRICH_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.enrich_delay_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_max_retries: std::env::var("LLM_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_max_retries),
            llm_retry_base_ms: std::env::var("LLM_RETRY_BASE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_retry_base_ms),
        }
    }

    pub fn enrich_delay(&self) -> Duration {
        Duration::from_millis(self.enrich_delay_ms)
    }
}
