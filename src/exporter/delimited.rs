//! CSV/TSV 导出器实现
//!
//! 所有工作线程共用一个写入器，每条记录在互斥锁内整行写入，
//! 不会出现不同线程的半行交错。

use super::SyncExporter;
use crate::config::{CsvlogConfig, OutputFormat};
use crate::csvlog::types::{COLUMN_NAMES, CsvLog};
use crate::error::{CsvlogError, Result};
use crate::exporter::ExportStats;
use csv::{QuoteStyle, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

struct Inner {
    writer: csv::Writer<Box<dyn Write + Send>>,
    stats: ExportStats,
    header_written: bool,
}

/// 线程安全的分隔文本写入器
pub struct SharedCsvWriter {
    inner: Mutex<Inner>,
    format: OutputFormat,
    header: bool,
}

impl SharedCsvWriter {
    /// 基于任意输出流创建写入器
    pub fn new(
        out: Box<dyn Write + Send>,
        format: OutputFormat,
        header: bool,
    ) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .delimiter(format.delimiter())
            .quote_style(QuoteStyle::Necessary)
            .from_writer(out);

        Self {
            inner: Mutex::new(Inner {
                writer,
                stats: ExportStats::new(),
                header_written: false,
            }),
            format,
            header,
        }
    }

    /// 输出到 stdout
    pub fn stdout(format: OutputFormat, header: bool) -> Self {
        Self::new(Box::new(std::io::stdout()), format, header)
    }

    /// 输出到文件（覆盖已有文件）
    pub fn create<P: AsRef<Path>>(
        path: P,
        format: OutputFormat,
        header: bool,
    ) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(file), format, header))
    }

    /// 按配置创建：设置了 `output_path` 时写文件，否则写 stdout
    pub fn from_config(config: &CsvlogConfig) -> Result<Self> {
        match config.output_path.as_deref() {
            Some(path) => Self::create(path, config.output_format, config.header),
            None => Ok(Self::stdout(config.output_format, config.header)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| CsvlogError::write_error("输出写入器锁已损坏"))
    }

    fn write_header(inner: &mut Inner) -> Result<()> {
        inner
            .writer
            .write_record(COLUMN_NAMES)
            .map_err(|e| CsvlogError::write_error(e.to_string()))?;
        inner.header_written = true;
        Ok(())
    }
}

impl SyncExporter for SharedCsvWriter {
    fn name(&self) -> &str {
        match self.format {
            OutputFormat::Csv => "CSV",
            OutputFormat::Tsv => "TSV",
        }
    }

    fn export_record(&self, record: &CsvLog) -> Result<()> {
        let mut inner = self.lock()?;
        if self.header && !inner.header_written {
            Self::write_header(&mut inner)?;
        }
        inner
            .writer
            .write_record(record.fields())
            .map_err(|e| CsvlogError::write_error(e.to_string()))?;
        inner.stats.exported_records += 1;
        Ok(())
    }

    fn finalize(&self) -> Result<()> {
        let mut inner = self.lock()?;
        // 没有任何记录时也输出表头
        if self.header && !inner.header_written {
            Self::write_header(&mut inner)?;
        }
        inner
            .writer
            .flush()
            .map_err(|e| CsvlogError::write_error(e.to_string()))?;
        inner.stats.finish();

        tracing::info!(
            "{}导出完成: {} 条记录",
            self.name(),
            inner.stats.exported_records
        );
        Ok(())
    }

    fn get_stats(&self) -> ExportStats {
        self.inner
            .lock()
            .map(|inner| inner.stats.clone())
            .unwrap_or_default()
    }
}
