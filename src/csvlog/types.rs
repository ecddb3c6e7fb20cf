use chrono::NaiveDateTime;

/// csvlog 每行的字段数（PostgreSQL 9.4 布局）
pub const FIELD_COUNT: usize = 23;

/// 输出表头，顺序与 PostgreSQL `postgres_log` 表定义一致
pub const COLUMN_NAMES: [&str; FIELD_COUNT] = [
    "log_time",
    "user_name",
    "database_name",
    "process_id",
    "connection_from",
    "session_id",
    "session_line_num",
    "command_tag",
    "session_start_time",
    "virtual_transaction_id",
    "transaction_id",
    "error_severity",
    "sql_state_code",
    "message",
    "detail",
    "hint",
    "internal_query",
    "internal_query_pos",
    "context",
    "query",
    "query_pos",
    "location",
    "application_name",
];

/// message 中标识执行耗时的标记
pub const DURATION_MARKER: &str = "duration:";
/// message 中标识语句文本的标记
pub const STATEMENT_MARKER: &str = "statement:";

/// 解析后的时间戳：本地时间 + 时区缩写（如 `UTC`、`CST`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTimestamp {
    pub datetime: NaiveDateTime,
    pub zone: String,
}

/// 单条 csvlog 记录，包含所有字段
///
/// 除两个时间戳外，所有字段都按原文透传，只有 `message` 会被
/// 会话合并与 SQL 归一化改写。
#[derive(Default, Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CsvLog {
    pub log_time: String,
    pub user_name: String,
    pub database_name: String,
    pub process_id: String,
    pub connection_from: String,
    /// 会话 ID
    pub session_id: String,
    /// 会话内递增的行号
    pub session_line_num: String,
    pub command_tag: String,
    pub session_start_time: String,
    pub virtual_transaction_id: String,
    pub transaction_id: String,
    pub error_severity: String,
    pub sql_state_code: String,
    /// 日志正文，可能包含语句文本和/或执行耗时
    pub message: String,
    pub detail: String,
    pub hint: String,
    pub internal_query: String,
    pub internal_query_pos: String,
    pub context: String,
    pub query: String,
    pub query_pos: String,
    pub location: String,
    pub application_name: String,

    /// `log_time` 的解析结果
    #[serde(skip)]
    pub parsed_log_time: Option<LogTimestamp>,
    /// `session_start_time` 的解析结果
    #[serde(skip)]
    pub parsed_session_start: Option<LogTimestamp>,
}

impl CsvLog {
    /// 按输出顺序返回全部字段
    pub fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            self.log_time.as_str(),
            self.user_name.as_str(),
            self.database_name.as_str(),
            self.process_id.as_str(),
            self.connection_from.as_str(),
            self.session_id.as_str(),
            self.session_line_num.as_str(),
            self.command_tag.as_str(),
            self.session_start_time.as_str(),
            self.virtual_transaction_id.as_str(),
            self.transaction_id.as_str(),
            self.error_severity.as_str(),
            self.sql_state_code.as_str(),
            self.message.as_str(),
            self.detail.as_str(),
            self.hint.as_str(),
            self.internal_query.as_str(),
            self.internal_query_pos.as_str(),
            self.context.as_str(),
            self.query.as_str(),
            self.query_pos.as_str(),
            self.location.as_str(),
            self.application_name.as_str(),
        ]
    }

    /// message 是否报告了执行耗时
    pub fn has_duration(&self) -> bool {
        self.message.contains(DURATION_MARKER)
    }

    /// message 是否包含语句文本
    pub fn has_statement(&self) -> bool {
        self.message.contains(STATEMENT_MARKER)
    }
}
