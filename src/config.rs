//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能。配置先从 TOML 文件（可选）加载，
//! 再由命令行参数覆盖，最后统一校验。

use crate::error::{CsvlogError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// 默认并发读取文件数
pub const DEFAULT_THREAD_COUNT: usize = 3;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogConfig,
    /// csvlog 处理配置
    pub csvlog: CsvlogConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 日志输出目录，未设置时只输出到 stderr
    pub log_dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None }
    }
}

/// 查询文本的转换方式
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QueryTransform {
    /// 原样输出
    #[default]
    None,
    /// 仅折叠换行与连续空白
    Unfold,
    /// 完整归一化：小写、字面量替换为 `?`、去注释
    Canonicalize,
}

/// 输出格式
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
}

impl OutputFormat {
    /// 字段分隔符
    pub fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }
}

/// csvlog 处理配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvlogConfig {
    /// 查询文本转换方式
    pub query_transform: QueryTransform,
    /// 输出格式
    pub output_format: OutputFormat,
    /// 并发线程数
    pub thread_count: usize,
    /// 是否输出表头
    pub header: bool,
    /// 只输出该会话的记录
    pub filter_session_id: Option<String>,
    /// 是否暂存只有语句的记录，等待同会话的 duration 记录合并
    pub correlate_sessions: bool,
    /// 通过日志打印记录而不是输出分隔文本（调试用）
    pub debug_print: bool,
    /// 输出文件路径，未设置时输出到 stdout
    pub output_path: Option<String>,
    /// 错误输出文件路径 (JSONL)
    pub errors_out: Option<String>,
}

impl Default for CsvlogConfig {
    fn default() -> Self {
        Self {
            query_transform: QueryTransform::None,
            output_format: OutputFormat::Csv,
            thread_count: DEFAULT_THREAD_COUNT,
            header: false,
            filter_session_id: None,
            correlate_sessions: false,
            debug_print: false,
            output_path: None,
            errors_out: None,
        }
    }
}

impl CsvlogConfig {
    /// 实际生效的转换方式
    ///
    /// tsv 输出无法承载字段内换行，因此至少要折叠查询文本。
    pub fn effective_transform(&self) -> QueryTransform {
        match (self.query_transform, self.output_format) {
            (QueryTransform::None, OutputFormat::Tsv) => QueryTransform::Unfold,
            (transform, _) => transform,
        }
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CsvlogError::config_error(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(CsvlogError::config_error(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        if self.csvlog.thread_count == 0 {
            return Err(CsvlogError::config_error("线程数不能为0"));
        }

        if self
            .csvlog
            .filter_session_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(CsvlogError::config_error("会话过滤 ID 不能为空"));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = CsvlogError;

    /// 从 TOML 字符串加载配置，不做校验（命令行参数覆盖后再统一校验）
    fn from_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
