//! csvlog 记录解码
//!
//! 把 csv 读出的一行原始字段转换为 [`CsvLog`]，并解析其中的两个时间戳。
//! 字段数不符、时间戳非法都只影响当前记录，由调用方记录并跳过。

use crate::csvlog::types::{CsvLog, FIELD_COUNT, LogTimestamp};
use crate::error::{CsvlogError, Result};
use chrono::NaiveDateTime;
use csv::ByteRecord;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

impl CsvLog {
    /// 从 csv 原始字段构造记录
    ///
    /// 字段数必须正好为 [`FIELD_COUNT`]。无效 UTF-8 会被有损转换并记录警告。
    pub fn from_byte_record(
        raw: &ByteRecord,
        record_num: usize,
        line: u64,
    ) -> Result<Self> {
        if raw.len() != FIELD_COUNT {
            return Err(CsvlogError::decode_error(
                record_num,
                line,
                format!("字段数为 {}，期望 {}", raw.len(), FIELD_COUNT),
            ));
        }

        let field = |idx: usize| -> String {
            let bytes = &raw[idx];
            match String::from_utf8_lossy(bytes) {
                Cow::Borrowed(s) => s.to_string(),
                Cow::Owned(s) => {
                    tracing::warn!(
                        record = record_num,
                        line,
                        column = idx,
                        "发现无效 UTF-8 字节序列，已有损转换"
                    );
                    s
                }
            }
        };

        Ok(Self {
            log_time: field(0),
            user_name: field(1),
            database_name: field(2),
            process_id: field(3),
            connection_from: field(4),
            session_id: field(5),
            session_line_num: field(6),
            command_tag: field(7),
            session_start_time: field(8),
            virtual_transaction_id: field(9),
            transaction_id: field(10),
            error_severity: field(11),
            sql_state_code: field(12),
            message: field(13),
            detail: field(14),
            hint: field(15),
            internal_query: field(16),
            internal_query_pos: field(17),
            context: field(18),
            query: field(19),
            query_pos: field(20),
            location: field(21),
            application_name: field(22),
            parsed_log_time: None,
            parsed_session_start: None,
        })
    }

    /// 解析 `log_time` 与 `session_start_time`
    pub fn parse_timestamps(&mut self) -> Result<()> {
        self.parsed_log_time = Some(parse_log_timestamp(&self.log_time)?);
        self.parsed_session_start =
            Some(parse_log_timestamp(&self.session_start_time)?);
        Ok(())
    }
}

/// 解析 csvlog 时间戳，形如 `2024-01-15 10:00:00.123 UTC`（毫秒可选）
pub fn parse_log_timestamp(value: &str) -> Result<LogTimestamp> {
    lazy_static! {
        static ref TS_RE: Regex = Regex::new(
            r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d{1,9})?) ([A-Za-z0-9_:/+\-]+)$"
        )
        .unwrap();
    }

    let caps = TS_RE
        .captures(value)
        .ok_or_else(|| CsvlogError::timestamp_error(value, "格式不符"))?;

    let datetime = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| CsvlogError::timestamp_error(value, e.to_string()))?;

    Ok(LogTimestamp { datetime, zone: caps[2].to_string() })
}
