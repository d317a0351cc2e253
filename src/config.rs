use crate::error::{AppError, AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// REST API 根地址
    pub api_base_url: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 成绩提交失败后的重试次数，0 表示至多一次
    pub submit_retries: usize,
    /// 两次重试之间的等待（毫秒）
    pub submit_retry_delay_ms: u64,
    /// 是否启用本地进度缓存
    pub local_cache_enabled: bool,
    /// 本地缓存目录
    pub cache_dir: String,
    /// 离线题目 TOML 文件，设置后不再请求 /questions
    pub questions_toml: Option<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_timeout_secs: 10,
            submit_retries: 0,
            submit_retry_delay_ms: 500,
            local_cache_enabled: false,
            cache_dir: ".quiz_cache".to_string(),
            questions_toml: None,
            verbose_logging: false,
            output_log_file: "quiz_session.log".to_string(),
        }
    }
}

/// TOML 配置文件的形状，所有字段可选
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    submit_retries: Option<usize>,
    submit_retry_delay_ms: Option<u64>,
    local_cache_enabled: Option<bool>,
    cache_dir: Option<String>,
    questions_toml: Option<String>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 先读 `QUIZ_CONFIG` 指向的 TOML 文件，再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let base = match std::env::var("QUIZ_CONFIG") {
            Ok(path) => Self::from_toml_file(&path)?,
            Err(_) => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺失字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        Ok(Self {
            api_base_url: file.api_base_url.unwrap_or(default.api_base_url),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(default.request_timeout_secs),
            submit_retries: file.submit_retries.unwrap_or(default.submit_retries),
            submit_retry_delay_ms: file.submit_retry_delay_ms.unwrap_or(default.submit_retry_delay_ms),
            local_cache_enabled: file.local_cache_enabled.unwrap_or(default.local_cache_enabled),
            cache_dir: file.cache_dir.unwrap_or(default.cache_dir),
            questions_toml: file.questions_toml.or(default.questions_toml),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            output_log_file: file.output_log_file.unwrap_or(default.output_log_file),
        })
    }

    /// 环境变量覆盖已有配置；变量存在但无法解析时报错，而不是悄悄沿用旧值
    fn with_env_overrides(self) -> AppResult<Self> {
        Ok(Self {
            api_base_url: std::env::var("QUIZ_API_URL").unwrap_or(self.api_base_url),
            request_timeout_secs: env_or("QUIZ_REQUEST_TIMEOUT_SECS", self.request_timeout_secs, "u64")?,
            submit_retries: env_or("QUIZ_SUBMIT_RETRIES", self.submit_retries, "usize")?,
            submit_retry_delay_ms: env_or("QUIZ_SUBMIT_RETRY_DELAY_MS", self.submit_retry_delay_ms, "u64")?,
            local_cache_enabled: env_or("QUIZ_LOCAL_CACHE", self.local_cache_enabled, "bool")?,
            cache_dir: std::env::var("QUIZ_CACHE_DIR").unwrap_or(self.cache_dir),
            questions_toml: std::env::var("QUIZ_QUESTIONS_TOML").ok().or(self.questions_toml),
            verbose_logging: env_or("VERBOSE_LOGGING", self.verbose_logging, "bool")?,
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(self.output_log_file),
        })
    }

    /// 读取必需的环境变量
    pub fn require_env(var_name: &str) -> AppResult<String> {
        std::env::var(var_name).map_err(|_| {
            AppError::Config(ConfigError::EnvVarNotFound {
                var_name: var_name.to_string(),
            })
        })
    }
}

fn env_or<T: FromStr>(var_name: &str, default: T, expected_type: &str) -> AppResult<T> {
    parse_env_value(var_name, std::env::var(var_name).ok(), default, expected_type)
}

/// 解析环境变量的值；未设置时使用默认值
fn parse_env_value<T: FromStr>(
    var_name: &str,
    raw: Option<String>,
    default: T,
    expected_type: &str,
) -> AppResult<T> {
    let Some(value) = raw else {
        return Ok(default);
    };
    value.trim().parse().map_err(|_| {
        AppError::Config(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        })
    })
}
