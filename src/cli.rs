//! 命令行参数定义
//!
//! 命令行参数覆盖配置文件中的同名项。

use crate::config::{Config, OutputFormat, QueryTransform};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "csvlog-cli")]
#[command(about = "解析 PostgreSQL csvlog，合并语句与耗时记录，归一化 SQL 文本")]
#[command(version)]
pub struct Cli {
    /// 输入的 csvlog 文件（支持 .gz）
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// 归一化查询文本（等同于 --query-transform canonicalize）
    #[arg(short = 'c', long = "canonicalize-query", conflicts_with = "query_transform")]
    pub canonicalize_query: bool,

    /// 查询文本转换方式
    #[arg(short = 'q', long = "query-transform", value_enum)]
    pub query_transform: Option<QueryTransform>,

    /// 输出 tsv（等同于 --output-format tsv）
    #[arg(short = 't', long = "tsv", conflicts_with = "output_format")]
    pub tsv: bool,

    /// 输出格式
    #[arg(short = 'F', long = "output-format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// 输出表头
    #[arg(short = 'H', long = "header")]
    pub header: bool,

    /// 只输出该会话 ID 的记录
    #[arg(short = 'f', long = "filter-session-id")]
    pub filter_session_id: Option<String>,

    /// 同时处理的文件数
    #[arg(short = 'n', long = "num-readers")]
    pub num_readers: Option<usize>,

    /// 暂存只有语句的记录，与同会话随后的 duration 记录合并
    #[arg(long = "correlate-sessions")]
    pub correlate_sessions: bool,

    /// 通过日志打印每条记录，不输出分隔文本
    #[arg(long = "debug-print")]
    pub debug_print: bool,

    /// 输出文件（默认 stdout）
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// 被跳过记录的 JSONL 输出文件
    #[arg(long = "errors-out")]
    pub errors_out: Option<String>,

    /// TOML 配置文件
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(long = "log-level")]
    pub log_level: Option<String>,

    /// 日志文件目录
    #[arg(long = "log-dir")]
    pub log_dir: Option<String>,
}

impl Cli {
    /// 把命令行参数覆盖到配置上
    pub fn apply_to(&self, config: &mut Config) {
        let csvlog = &mut config.csvlog;

        if self.canonicalize_query {
            csvlog.query_transform = QueryTransform::Canonicalize;
        } else if let Some(transform) = self.query_transform {
            csvlog.query_transform = transform;
        }

        if self.tsv {
            csvlog.output_format = OutputFormat::Tsv;
        } else if let Some(format) = self.output_format {
            csvlog.output_format = format;
        }

        if let Some(n) = self.num_readers {
            csvlog.thread_count = n;
        }
        if self.filter_session_id.is_some() {
            csvlog.filter_session_id = self.filter_session_id.clone();
        }
        if self.output.is_some() {
            csvlog.output_path = self.output.clone();
        }
        if self.errors_out.is_some() {
            csvlog.errors_out = self.errors_out.clone();
        }
        csvlog.header |= self.header;
        csvlog.correlate_sessions |= self.correlate_sessions;
        csvlog.debug_print |= self.debug_print;

        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
        if self.log_dir.is_some() {
            config.log.log_dir = self.log_dir.clone();
        }
    }

    /// 加载配置文件（如有），应用命令行覆盖并校验
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }
}
