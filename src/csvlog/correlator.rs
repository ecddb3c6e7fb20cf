//! 会话关联
//!
//! PostgreSQL 在开启 `log_statement` 与 `log_min_duration_statement` 时，
//! 会把同一条语句的文本和执行耗时分成两行记录。这里按会话 ID 暂存语句，
//! 在耗时记录到达时把两者合并为一条。
//!
//! 关联表只属于处理单个文件的那条流水线，不跨文件、不跨线程共享。

use crate::csvlog::types::CsvLog;
use std::collections::HashMap;

/// message 的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// 只有耗时、没有语句文本
    Completion,
    /// 只有语句文本、没有耗时
    Statement,
    /// 其他（语句与耗时同行，或与语句无关）
    Other,
}

impl MessageKind {
    pub fn of(record: &CsvLog) -> Self {
        match (record.has_duration(), record.has_statement()) {
            (true, false) => MessageKind::Completion,
            (false, true) => MessageKind::Statement,
            _ => MessageKind::Other,
        }
    }
}

#[derive(Debug)]
struct PendingRecord {
    seq: u64,
    record: CsvLog,
}

/// 按会话 ID 暂存未完成语句的关联表
///
/// 每个会话最多只有一条暂存记录。`hold_statements` 为 `false` 时
/// 从不写入关联表，耗时记录总是原样通过。
#[derive(Debug, Default)]
pub struct SessionCorrelator {
    pending: HashMap<String, PendingRecord>,
    hold_statements: bool,
    next_seq: u64,
    merged: usize,
}

impl SessionCorrelator {
    pub fn new(hold_statements: bool) -> Self {
        Self { hold_statements, ..Default::default() }
    }

    /// 处理一条刚解码的记录，返回应继续向下游输出的记录（可能没有）
    ///
    /// - 耗时记录：若该会话有暂存语句，取出并返回合并后的记录，
    ///   message 为耗时文本在前、语句文本在后；否则原样返回
    /// - 语句记录（仅在 `hold_statements` 时）：暂存为该会话的待合并记录，
    ///   被顶替的旧记录原样返回
    /// - 其他记录原样返回
    pub fn correlate(&mut self, record: CsvLog) -> Option<CsvLog> {
        match MessageKind::of(&record) {
            MessageKind::Completion => {
                match self.pending.remove(&record.session_id) {
                    Some(pending) => {
                        self.merged += 1;
                        tracing::trace!(
                            session = %record.session_id,
                            "耗时记录与暂存语句合并"
                        );
                        Some(merge(record, pending.record))
                    }
                    None => Some(record),
                }
            }
            MessageKind::Statement if self.hold_statements => {
                let seq = self.next_seq;
                self.next_seq += 1;
                let session = record.session_id.clone();
                self.pending
                    .insert(session, PendingRecord { seq, record })
                    .map(|displaced| displaced.record)
            }
            _ => Some(record),
        }
    }

    /// 取出所有仍在暂存的记录，按到达顺序返回
    pub fn drain(&mut self) -> Vec<CsvLog> {
        let mut rest: Vec<PendingRecord> =
            self.pending.drain().map(|(_, p)| p).collect();
        rest.sort_by_key(|p| p.seq);
        rest.into_iter().map(|p| p.record).collect()
    }

    /// 当前暂存的会话数
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 已合并的记录数
    pub fn merged_count(&self) -> usize {
        self.merged
    }
}

/// 合并后的记录沿用语句记录的字段，耗时文本前置
///
/// 两段文本之间固定插入一个空格，避免 `ms` 与 `statement:` 粘连。
fn merge(completion: CsvLog, mut statement: CsvLog) -> CsvLog {
    let mut message =
        String::with_capacity(completion.message.len() + 1 + statement.message.len());
    message.push_str(&completion.message);
    message.push(' ');
    message.push_str(&statement.message);
    statement.message = message;
    statement
}
