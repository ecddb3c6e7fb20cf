//! 跳过记录写入模块 - 线程安全的 JSONL 错误记录器
//!
//! 处理过程中被跳过的记录（格式错误、时间戳无法解析）以及
//! 归一化时引号未闭合的语句，会以 JSONL 形式追加到错误文件中，
//! 便于事后检查。
//!
//! ## 输出格式示例
//!
//! ```json
//! {"path":"pg/postgresql.csv","record":42,"line":57,"kind":"decode","error":"记录格式错误 (第42条记录, 行57): 字段数为 3，期望 23","raw":"only,three,fields"}
//! ```

use crate::error::{CsvlogError, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// 记录格式错误，已跳过
    Decode,
    /// 时间戳无法解析，已跳过
    Timestamp,
    /// 引号未闭合，已按尽力结果输出
    Canonicalize,
}

impl ErrorKind {
    /// 按错误类型归类，其他错误不写入错误文件
    pub fn of(error: &CsvlogError) -> Option<Self> {
        match error {
            CsvlogError::Decode { .. } | CsvlogError::Csv(_) => Some(Self::Decode),
            CsvlogError::Timestamp { .. } => Some(Self::Timestamp),
            CsvlogError::Canonicalize(_) => Some(Self::Canonicalize),
            _ => None,
        }
    }
}

/// 错误文件中的一行
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry<'a> {
    pub path: &'a str,
    pub record: usize,
    pub line: u64,
    pub kind: ErrorKind,
    pub error: String,
    pub raw: &'a str,
}

impl ErrorEntry<'_> {
    /// 序列化为一行 JSON（不含换行）
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 错误写入器，多个工作线程共享
///
/// 每次写入后立即刷新，程序中途退出也不会丢失已记录的错误。
pub struct ErrorWriter {
    writer: Arc<Mutex<BufWriter<std::fs::File>>>,
    path: PathBuf,
}

impl ErrorWriter {
    /// 创建新的错误写入器，文件以追加方式打开
    ///
    /// # Errors
    /// 当无法创建父目录或打开输出文件时返回错误
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let writer = Arc::new(Mutex::new(BufWriter::new(file)));

        Ok(Self { writer, path })
    }

    /// 记录一个被跳过或降级处理的条目
    ///
    /// 写入失败只记日志，不影响主流程。
    pub fn write_error<P: AsRef<Path>>(
        &self,
        file_path: P,
        record: usize,
        line: u64,
        error: &CsvlogError,
        raw: &str,
    ) {
        let Some(kind) = ErrorKind::of(error) else {
            return;
        };

        let file_path = file_path.as_ref().to_string_lossy();
        let entry = ErrorEntry {
            path: &file_path,
            record,
            line,
            kind,
            error: error.to_string(),
            raw,
        };

        let json = match entry.to_json_line() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("序列化错误信息失败: {}", e);
                return;
            }
        };

        let Ok(mut writer) = self.writer.lock() else {
            tracing::error!("获取错误写入器锁失败");
            return;
        };

        if writeln!(writer, "{json}").is_err() || writer.flush().is_err() {
            tracing::error!("写入错误信息到文件失败: {}", self.path.display());
        }
    }

    /// 获取错误文件路径
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ErrorWriter {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
