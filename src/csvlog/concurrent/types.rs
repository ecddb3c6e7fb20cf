//! 并发处理相关的数据类型定义

use crate::csvlog::pipeline::FileSummary;
use crate::error::CsvlogError;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// 文件任务，由分发线程按输入顺序投递
#[derive(Debug, Clone)]
pub struct FileTask {
    /// 在输入列表中的位置
    pub index: usize,
    /// 文件路径
    pub path: PathBuf,
}

/// 无法处理的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub index: usize,
    pub path: PathBuf,
    pub error: String,
}

/// 单个文件任务的结果
#[derive(Debug)]
pub(crate) enum FileOutcome {
    Done { index: usize, summary: FileSummary },
    Failed(FailedFile),
}

impl FileOutcome {
    pub(crate) fn index(&self) -> usize {
        match self {
            FileOutcome::Done { index, .. } => *index,
            FileOutcome::Failed(failed) => failed.index,
        }
    }
}

/// 单个工作线程的报告
#[derive(Debug, Default)]
pub(crate) struct WorkerReport {
    pub outcomes: Vec<FileOutcome>,
    /// 致命错误，出现后整个运行终止
    pub fatal: Option<CsvlogError>,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// 成功处理的文件，按输入顺序
    pub files: Vec<FileSummary>,
    /// 打开或读取失败的文件，按输入顺序
    pub failed: Vec<FailedFile>,
    /// 总耗时
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn records_read(&self) -> usize {
        self.files.iter().map(|f| f.records_read).sum()
    }

    pub fn records_written(&self) -> usize {
        self.files.iter().map(|f| f.records_written).sum()
    }

    pub fn merged(&self) -> usize {
        self.files.iter().map(|f| f.merged).sum()
    }

    pub fn skipped(&self) -> usize {
        self.files.iter().map(FileSummary::skipped).sum()
    }

    pub fn canonicalize_errors(&self) -> usize {
        self.files.iter().map(|f| f.canonicalize_errors).sum()
    }

    /// 是否有文件处理失败
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "文件: {} 成功 / {} 失败, 记录: 读取 {}, 写出 {}, 合并 {}, 跳过 {}, 耗时: {:.2}s",
            self.files.len(),
            self.failed.len(),
            self.records_read(),
            self.records_written(),
            self.merged(),
            self.skipped(),
            self.elapsed.as_secs_f64()
        )
    }
}
