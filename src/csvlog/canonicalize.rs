//! SQL 文本折叠与归一化
//!
//! 一次从左到右的逐字节扫描，同时维护四个相互独立的状态
//! （引号内、注释内、数字内、空白内）以及一个字符的回看和前瞻。
//! 每个输入字符按固定优先级依次经过下列规则，后面的规则看到的是
//! 前面规则已经改写过的字符：
//!
//! 1. 引号切换（不在注释内）：未被 `\` 转义的 `'` 切换引号状态；
//!    引号闭合时重置“已替换”标记，归一化模式下闭合引号本身不输出
//! 2. 注释检测（不在引号内）：`--` 的第一个 `-` 处进入注释，换行退出注释，
//!    换行本身继续参与后面的规则
//! 3. 字面量替换（引号内，仅归一化）：首字符替换为 `?`，其余字符丢弃
//! 4. 注释内的字符一律丢弃
//! 5. 空白折叠（不在引号内）：连续空白只输出一个空格
//! 6. 数字替换（仅归一化）：数字串只输出一个 `?`
//! 7. 大写 ASCII 转小写（仅归一化）
//! 8. 转义记录：更新“前一个字符”，两个连续 `\` 会清空记录
//!
//! 规则顺序决定输出结果，不能调整。

use crate::config::QueryTransform;

/// 归一化失败：引号未闭合，携带已经生成的部分结果
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanonicalizeError {
    #[error("引号未闭合, 部分结果: {partial}")]
    UnterminatedQuote { partial: String },
}

impl CanonicalizeError {
    /// 尽力生成的部分结果
    pub fn partial(&self) -> &str {
        match self {
            CanonicalizeError::UnterminatedQuote { partial } => partial,
        }
    }

    pub fn into_partial(self) -> String {
        match self {
            CanonicalizeError::UnterminatedQuote { partial } => partial,
        }
    }
}

/// 扫描状态
#[derive(Debug, Default)]
struct ScanState {
    in_quote: bool,
    in_comment: bool,
    in_number: bool,
    in_space: bool,
    /// 当前字面量是否已经输出过 `?`
    already_substituted: bool,
    /// 上一个原始字符，用于判断 `'` 是否被转义
    prev: Option<u8>,
}

fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\x0b' | b'\r' | b'\n')
}

/// 数字串是否在当前字符处延续
///
/// `.` `+` `-` 后面必须紧跟数字；`e`/`E` 后面可以是数字，
/// 也可以是符号再跟数字（`1e-3`）。
fn continues_number(c: u8, next: Option<u8>, after_next: Option<u8>) -> bool {
    let digit = |b: Option<u8>| b.is_some_and(|b| b.is_ascii_digit());
    match c {
        b'.' | b'+' | b'-' => digit(next),
        b'e' | b'E' => {
            digit(next)
                || (matches!(next, Some(b'+' | b'-')) && digit(after_next))
        }
        _ => false,
    }
}

/// 折叠或归一化一段 SQL 文本
///
/// - `Unfold`：折叠换行与连续空白，去除 `--` 注释，保留大小写和字面量
/// - `Canonicalize`：小写化、字面量与数字替换为 `?`、去除注释、折叠空白
/// - `None`：原样返回
///
/// 结果末尾的 `;` 和空格总会被去掉。文本结束时仍在引号内会返回
/// [`CanonicalizeError::UnterminatedQuote`]，其中携带已生成的部分结果，
/// 调用方可以决定是否使用。
///
/// ```
/// use csvlog_analysis::config::QueryTransform;
/// use csvlog_analysis::csvlog::canonicalize::unfold_query;
///
/// let q = unfold_query("SELECT * FROM t WHERE x = 'abc' LIMIT 10;", QueryTransform::Canonicalize);
/// assert_eq!(q.unwrap(), "select * from t where x = ? limit ?");
/// ```
pub fn unfold_query(
    query: &str,
    transform: QueryTransform,
) -> Result<String, CanonicalizeError> {
    let canonicalize = match transform {
        QueryTransform::None => return Ok(query.to_string()),
        QueryTransform::Unfold => false,
        QueryTransform::Canonicalize => true,
    };

    let bytes = query.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut st = ScanState::default();

    for (k, &raw) in bytes.iter().enumerate() {
        let next = bytes.get(k + 1).copied();
        let mut v = Some(raw);

        // 1. 引号切换
        if !st.in_comment && raw == b'\'' && st.prev != Some(b'\\') {
            st.in_quote = !st.in_quote;
            if !st.in_quote {
                st.already_substituted = false;
                if canonicalize {
                    v = None;
                }
            }
        }

        // 2. 注释检测
        if !st.in_quote {
            if !st.in_comment && raw == b'-' && next == Some(b'-') {
                st.in_comment = true;
            }
            if st.in_comment && raw == b'\n' {
                st.in_comment = false;
            }
        }

        // 3. 字面量替换
        if st.in_quote && canonicalize {
            if st.already_substituted {
                v = None;
            } else {
                v = Some(b'?');
                st.already_substituted = true;
            }
        }

        // 4. 注释丢弃
        if st.in_comment {
            v = None;
        }

        // 5. 空白折叠
        match v {
            Some(c) if !st.in_quote && is_space(c) => {
                if st.in_space {
                    v = None;
                } else {
                    v = Some(b' ');
                    st.in_space = true;
                }
            }
            _ => {
                if !st.in_comment {
                    st.in_space = false;
                }
            }
        }

        // 6. 数字替换
        if canonicalize {
            let starts = v.is_some_and(|c| c.is_ascii_digit());
            let continues = st.in_number
                && v.is_some_and(|c| {
                    continues_number(c, next, bytes.get(k + 2).copied())
                });
            if starts || continues {
                if st.in_number {
                    v = None;
                } else {
                    v = Some(b'?');
                    st.in_number = true;
                }
            } else {
                st.in_number = false;
            }
        }

        // 7. 小写化
        if let Some(c) = v {
            out.push(if canonicalize { c.to_ascii_lowercase() } else { c });
        }

        // 8. 转义记录
        if raw == b'\\' && st.prev == Some(b'\\') {
            st.prev = None;
        } else {
            st.prev = Some(raw);
        }
    }

    // 文本可以在注释内结束，这不是错误
    while matches!(out.last(), Some(b';' | b' ')) {
        out.pop();
    }

    // 只替换/丢弃整段字节或 ASCII 字符，输出仍是合法 UTF-8
    let text = match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    };

    if st.in_quote {
        Err(CanonicalizeError::UnterminatedQuote { partial: text })
    } else {
        Ok(text)
    }
}
