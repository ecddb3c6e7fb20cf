//! 并发 csvlog 处理器主实现

use super::file_workers::{WorkerContext, file_worker};
use super::types::{FileOutcome, FileTask, RunSummary, WorkerReport};
use crate::config::CsvlogConfig;
use crate::csvlog::pipeline::PipelineOptions;
use crate::error::{CsvlogError, Result};
use crate::error_writer::ErrorWriter;
use crate::exporter::SyncExporter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Instant;

/// 并发 csvlog 处理器
///
/// 固定数量的工作线程从同一个无缓冲队列中取文件，每个文件由一个线程
/// 从头处理到尾；所有线程共享同一个导出器。
#[derive(Debug, Clone)]
pub struct ConcurrentProcessor {
    config: CsvlogConfig,
}

impl ConcurrentProcessor {
    /// 创建新的并发处理器
    pub fn new(config: CsvlogConfig) -> Self {
        tracing::debug!("创建并发处理器，配置: {:?}", config);
        Self { config }
    }

    /// 处理全部文件并在结束时完成导出
    ///
    /// 打不开或读取失败的文件记入 [`RunSummary::failed`]，其余文件照常处理。
    /// 输出写入失败时所有线程尽快停止，返回该写入错误，且不再调用 `finalize`。
    pub fn process_files<E: SyncExporter + ?Sized + 'static>(
        &self,
        file_paths: &[PathBuf],
        exporter: Arc<E>,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();

        if file_paths.is_empty() {
            tracing::warn!("文件列表为空，跳过处理");
            exporter.finalize()?;
            return Ok(RunSummary { elapsed: start_time.elapsed(), ..Default::default() });
        }

        let error_writer = match self.config.errors_out.as_deref() {
            Some(path) => Some(Arc::new(ErrorWriter::new(path)?)),
            None => None,
        };

        let worker_count = self.config.thread_count.max(1).min(file_paths.len());
        tracing::info!(
            "开始处理 {} 个文件，工作线程数: {}，导出器: {}",
            file_paths.len(),
            worker_count,
            exporter.name()
        );

        let ctx = Arc::new(WorkerContext {
            options: PipelineOptions::from_config(&self.config),
            exporter: Arc::clone(&exporter),
            error_writer,
            stop: Arc::new(AtomicBool::new(false)),
        });

        // 容量为 0：分发线程每投递一个文件都要等到有工作线程接手
        let (task_tx, task_rx) = mpsc::sync_channel::<FileTask>(0);
        let task_rx = Arc::new(Mutex::new(task_rx));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let task_rx = Arc::clone(&task_rx);
            let ctx = Arc::clone(&ctx);
            let handle = thread::Builder::new()
                .name(format!("csvlog-worker-{worker_id}"))
                .spawn(move || file_worker(worker_id, task_rx, ctx))?;
            handles.push(handle);
        }
        drop(task_rx);

        for (index, path) in file_paths.iter().enumerate() {
            if ctx.stop.load(Ordering::Relaxed) {
                break;
            }
            tracing::trace!("分发文件任务 {}: {}", index, path.display());
            if task_tx.send(FileTask { index, path: path.clone() }).is_err() {
                // 所有工作线程都已退出
                break;
            }
        }

        // 关闭队列，让工作线程知道没有更多任务
        drop(task_tx);

        let mut outcomes = Vec::with_capacity(file_paths.len());
        let mut fatal = None;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(WorkerReport { outcomes: mut done, fatal: worker_fatal }) => {
                    outcomes.append(&mut done);
                    if fatal.is_none() {
                        fatal = worker_fatal;
                    }
                }
                Err(e) => {
                    tracing::error!("工作线程 {} panic: {:?}", worker_id, e);
                    if fatal.is_none() {
                        fatal = Some(CsvlogError::other(format!("工作线程 {worker_id} panic")));
                    }
                }
            }
        }

        if let Some(error) = fatal {
            tracing::error!("运行终止: {}", error);
            return Err(error);
        }

        exporter.finalize()?;

        outcomes.sort_by_key(FileOutcome::index);
        let mut summary = RunSummary::default();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Done { summary: file, .. } => summary.files.push(file),
                FileOutcome::Failed(failed) => summary.failed.push(failed),
            }
        }
        summary.elapsed = start_time.elapsed();

        tracing::info!("处理完成 - {}", summary);
        tracing::info!("{} {}", exporter.name(), exporter.get_stats());

        Ok(summary)
    }
}

impl Default for ConcurrentProcessor {
    fn default() -> Self {
        Self::new(CsvlogConfig::default())
    }
}
