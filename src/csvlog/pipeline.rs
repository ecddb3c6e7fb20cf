//! 单文件处理流水线
//!
//! 每条记录依次经过：解码 → 时间戳解析 → 会话关联 → SQL 变换 →
//! 会话 ID 过滤 → 写出。记录级错误就地记录并跳过，只有底层读取失败
//! 和输出写入失败会中断当前文件。

use crate::config::{CsvlogConfig, QueryTransform};
use crate::csvlog::canonicalize::unfold_query;
use crate::csvlog::correlator::SessionCorrelator;
use crate::csvlog::io::{CsvlogReader, Scanned};
use crate::csvlog::types::CsvLog;
use crate::error::{CsvlogError, Result};
use crate::error_writer::ErrorWriter;
use crate::exporter::SyncExporter;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// 流水线选项，由配置派生，整个运行期间不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// 实际生效的 SQL 变换
    pub transform: QueryTransform,
    /// 只输出该会话的记录
    pub filter_session_id: Option<String>,
    /// 是否暂存语句等待耗时记录
    pub correlate_sessions: bool,
}

impl PipelineOptions {
    pub fn from_config(config: &CsvlogConfig) -> Self {
        Self {
            transform: config.effective_transform(),
            filter_session_id: config.filter_session_id.clone(),
            correlate_sessions: config.correlate_sessions,
        }
    }

    fn accepts(&self, record: &CsvLog) -> bool {
        self.filter_session_id
            .as_deref()
            .is_none_or(|id| id == record.session_id)
    }
}

/// 单个文件的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub path: PathBuf,
    /// 扫描到的记录数（含格式错误的记录）
    pub records_read: usize,
    /// 写出的记录数
    pub records_written: usize,
    /// 合并的语句/耗时记录对数
    pub merged: usize,
    /// 被会话 ID 过滤掉的记录数
    pub filtered: usize,
    pub decode_errors: usize,
    pub timestamp_errors: usize,
    pub canonicalize_errors: usize,
}

impl FileSummary {
    fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf(), ..Default::default() }
    }

    /// 被跳过的记录数
    pub fn skipped(&self) -> usize {
        self.decode_errors + self.timestamp_errors
    }
}

/// 打开并处理一个文件
pub fn process_file<E: SyncExporter + ?Sized>(
    path: &Path,
    options: &PipelineOptions,
    exporter: &E,
    error_writer: Option<&ErrorWriter>,
    stop: &AtomicBool,
) -> Result<FileSummary> {
    let reader = CsvlogReader::open(path)?;
    process_reader(path, reader, options, exporter, error_writer, stop)
}

/// 处理任意数据源，`path` 仅用于日志与错误文件
pub fn process_reader<R: Read, E: SyncExporter + ?Sized>(
    path: &Path,
    mut reader: CsvlogReader<R>,
    options: &PipelineOptions,
    exporter: &E,
    error_writer: Option<&ErrorWriter>,
    stop: &AtomicBool,
) -> Result<FileSummary> {
    let mut run = FileRun {
        path,
        options,
        exporter,
        error_writer,
        summary: FileSummary::new(path),
    };
    let mut correlator = SessionCorrelator::new(options.correlate_sessions);

    while let Some(scanned) = reader.scan()? {
        if stop.load(Ordering::Relaxed) {
            tracing::debug!("收到停止信号，中断文件 {}", path.display());
            run.summary.records_read = reader.records_read();
            return Ok(run.summary);
        }

        let record_num = reader.records_read();
        let line = reader.line_number();

        match scanned {
            Scanned::Malformed { error, raw } => {
                run.summary.decode_errors += 1;
                run.skip(record_num, line, &error, &raw);
            }
            Scanned::Record(mut record) => {
                if let Err(error) = record.parse_timestamps() {
                    run.summary.timestamp_errors += 1;
                    let raw = record.fields().join(",");
                    run.skip(record_num, line, &error, &raw);
                    continue;
                }

                if let Some(ready) = correlator.correlate(record) {
                    run.emit(ready, record_num, line)?;
                }
            }
        }
    }

    let record_num = reader.records_read();
    let line = reader.line_number();
    for rest in correlator.drain() {
        run.emit(rest, record_num, line)?;
    }

    run.summary.records_read = record_num;
    run.summary.merged = correlator.merged_count();

    tracing::debug!(
        "文件 {} 处理完成: 读取 {} 条, 写出 {} 条, 合并 {} 条, 跳过 {} 条",
        path.display(),
        run.summary.records_read,
        run.summary.records_written,
        run.summary.merged,
        run.summary.skipped()
    );

    Ok(run.summary)
}

struct FileRun<'a, E: SyncExporter + ?Sized> {
    path: &'a Path,
    options: &'a PipelineOptions,
    exporter: &'a E,
    error_writer: Option<&'a ErrorWriter>,
    summary: FileSummary,
}

impl<E: SyncExporter + ?Sized> FileRun<'_, E> {
    fn skip(&self, record_num: usize, line: u64, error: &CsvlogError, raw: &str) {
        tracing::warn!(
            "跳过文件 {} 第 {} 条记录 (行 {}): {}",
            self.path.display(),
            record_num,
            line,
            error
        );
        if let Some(writer) = self.error_writer {
            writer.write_error(self.path, record_num, line, error, raw);
        }
    }

    /// 变换、过滤并写出一条已完成关联的记录
    fn emit(&mut self, mut record: CsvLog, record_num: usize, line: u64) -> Result<()> {
        let transform = self.options.transform;
        if transform != QueryTransform::None && !record.message.is_empty() {
            match unfold_query(&record.message, transform) {
                Ok(text) => record.message = text,
                Err(e) => {
                    self.summary.canonicalize_errors += 1;
                    tracing::warn!(
                        "文件 {} 第 {} 条记录 (行 {}) {}\n原文: {}\n替换为: {}",
                        self.path.display(),
                        record_num,
                        line,
                        e,
                        record.message,
                        e.partial()
                    );
                    if let Some(writer) = self.error_writer {
                        let error = CsvlogError::from(e.clone());
                        writer.write_error(self.path, record_num, line, &error, &record.message);
                    }
                    record.message = e.into_partial();
                }
            }
        }

        if !self.options.accepts(&record) {
            self.summary.filtered += 1;
            return Ok(());
        }

        self.exporter.export_record(&record)?;
        self.summary.records_written += 1;
        Ok(())
    }
}
