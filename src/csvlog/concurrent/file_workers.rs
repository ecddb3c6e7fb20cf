//! 文件工作线程

use super::types::{FailedFile, FileOutcome, FileTask, WorkerReport};
use crate::csvlog::pipeline::{PipelineOptions, process_file};
use crate::error_writer::ErrorWriter;
use crate::exporter::SyncExporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// 工作线程共享的只读上下文
pub(crate) struct WorkerContext<E: SyncExporter + ?Sized> {
    pub options: PipelineOptions,
    pub exporter: Arc<E>,
    pub error_writer: Option<Arc<ErrorWriter>>,
    pub stop: Arc<AtomicBool>,
}

/// 工作线程主循环：取文件、处理、再取，直到队列关闭
///
/// 文件打不开或读取中断只记入报告；输出写入失败时拉起停止标志并立即退出。
pub(crate) fn file_worker<E: SyncExporter + ?Sized>(
    worker_id: usize,
    task_rx: Arc<Mutex<Receiver<FileTask>>>,
    ctx: Arc<WorkerContext<E>>,
) -> WorkerReport {
    tracing::debug!("工作线程 {} 启动", worker_id);

    let mut report = WorkerReport::default();

    loop {
        let task = {
            let Ok(rx) = task_rx.lock() else {
                tracing::error!("工作线程 {} 获取任务队列锁失败", worker_id);
                break;
            };
            rx.recv()
        };
        // 队列已关闭且取空
        let Ok(task) = task else {
            break;
        };

        if ctx.stop.load(Ordering::Relaxed) {
            tracing::debug!("工作线程 {} 收到停止信号", worker_id);
            break;
        }

        tracing::info!("工作线程 {} 开始处理文件: {}", worker_id, task.path.display());
        let start = Instant::now();

        match process_file(
            &task.path,
            &ctx.options,
            ctx.exporter.as_ref(),
            ctx.error_writer.as_deref(),
            &ctx.stop,
        ) {
            Ok(summary) => {
                tracing::info!(
                    "工作线程 {} 完成文件 {}: 读取 {} 条, 写出 {} 条, 跳过 {} 条, 耗时 {:?}",
                    worker_id,
                    task.path.display(),
                    summary.records_read,
                    summary.records_written,
                    summary.skipped(),
                    start.elapsed()
                );
                report.outcomes.push(FileOutcome::Done { index: task.index, summary });
            }
            Err(e) if e.is_fatal() => {
                ctx.stop.store(true, Ordering::Relaxed);
                tracing::error!(
                    "工作线程 {} 写出失败，终止运行 (文件 {}): {}",
                    worker_id,
                    task.path.display(),
                    e
                );
                report.fatal = Some(e);
                break;
            }
            Err(e) => {
                tracing::error!("跳过文件 {}: {}", task.path.display(), e);
                report.outcomes.push(FileOutcome::Failed(FailedFile {
                    index: task.index,
                    path: task.path,
                    error: e.to_string(),
                }));
            }
        }
    }

    tracing::debug!("工作线程 {} 退出，处理了 {} 个文件", worker_id, report.outcomes.len());
    report
}
