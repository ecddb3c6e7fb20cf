//! csvlog 文件读取
//!
//! 打开输入文件（按魔数透明解压 gzip），并逐条扫描出记录。

use crate::csvlog::types::CsvLog;
use crate::error::{CsvlogError, Result};
use csv::{ByteRecord, ReaderBuilder};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Chain, Cursor, Read};
use std::path::Path;

/// gzip 魔数 1F 8B 08
const GZIP_MAGIC: [u8; 3] = [0x1F, 0x8B, 0x08];

/// 打开日志文件，gzip 文件自动解压
pub fn open_log<P: AsRef<Path>>(path: P) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    let open_err = |source| CsvlogError::Open { path: path.to_path_buf(), source };

    let file = File::open(path).map_err(open_err)?;
    maybe_decompress(file).map_err(open_err)
}

/// 读取开头几个字节判断是否为 gzip，并把读出的字节放回流前面
pub fn maybe_decompress<R: Read + Send + 'static>(
    mut reader: R,
) -> std::io::Result<Box<dyn Read + Send>> {
    let mut head = [0u8; 3];
    let mut n = 0;
    while n < head.len() {
        let read = reader.read(&mut head[n..])?;
        if read == 0 {
            break;
        }
        n += read;
    }

    let chained: Chain<Cursor<Vec<u8>>, R> =
        Cursor::new(head[..n].to_vec()).chain(reader);

    if n == GZIP_MAGIC.len() && head == GZIP_MAGIC {
        tracing::debug!("检测到 gzip 压缩输入");
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(chained))))
    } else {
        Ok(Box::new(BufReader::new(chained)))
    }
}

/// 单条扫描结果
#[derive(Debug)]
pub enum Scanned {
    /// 格式正确的记录
    Record(CsvLog),
    /// 格式错误的记录，读取可以继续
    Malformed { error: CsvlogError, raw: String },
}

/// csvlog 扫描器
///
/// 输入为标准 CSV：`"` 引用，`""` 转义，引用字段内可以换行。
pub struct CsvlogReader<R: Read> {
    inner: csv::Reader<R>,
    raw: ByteRecord,
    records_read: usize,
    line: u64,
}

impl CsvlogReader<Box<dyn Read + Send>> {
    /// 打开文件并创建扫描器
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_reader(open_log(path)?))
    }
}

impl<R: Read> CsvlogReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);
        Self { inner, raw: ByteRecord::new(), records_read: 0, line: 0 }
    }

    /// 扫描下一条记录
    ///
    /// - `Ok(None)`：输入结束
    /// - `Ok(Some(Scanned::Malformed))`：当前记录格式错误，可以继续扫描
    /// - `Err(_)`：底层读取失败，文件无法继续处理
    pub fn scan(&mut self) -> Result<Option<Scanned>> {
        match self.inner.read_byte_record(&mut self.raw) {
            Ok(false) => Ok(None),
            Ok(true) => {
                self.records_read += 1;
                self.line = self.raw.position().map_or(self.line, |p| p.line());
                match CsvLog::from_byte_record(&self.raw, self.records_read, self.line)
                {
                    Ok(record) => Ok(Some(Scanned::Record(record))),
                    Err(error) => {
                        Ok(Some(Scanned::Malformed { error, raw: self.raw_text() }))
                    }
                }
            }
            Err(e) if e.is_io_error() => Err(e.into()),
            Err(e) => {
                self.records_read += 1;
                if let Some(pos) = e.position() {
                    self.line = pos.line();
                }
                let error = CsvlogError::decode_error(
                    self.records_read,
                    self.line,
                    e.to_string(),
                );
                Ok(Some(Scanned::Malformed { error, raw: String::new() }))
            }
        }
    }

    /// 最近一条记录起始的物理行号
    pub fn line_number(&self) -> u64 {
        self.line
    }

    /// 已扫描的记录数（含格式错误的记录）
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn raw_text(&self) -> String {
        let fields: Vec<String> = self
            .raw
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LINE: &str = "2024-01-15 10:00:00.123 UTC,\"postgres\",\"db\",1234,\"127.0.0.1:5000\",65a4f1e0.4d2,1,\"SELECT\",2024-01-15 09:59:00 UTC,3/45,0,LOG,00000,\"statement: SELECT 1\",,,,,,,,,\"psql\"\n";

    fn scan_all(input: &str) -> Vec<Scanned> {
        let mut reader = CsvlogReader::from_reader(input.as_bytes());
        let mut out = Vec::new();
        while let Some(s) = reader.scan().unwrap() {
            out.push(s);
        }
        out
    }

    #[test]
    fn test_scan_single_record() {
        let scanned = scan_all(LINE);
        assert_eq!(scanned.len(), 1);
        match &scanned[0] {
            Scanned::Record(r) => {
                assert_eq!(r.session_id, "65a4f1e0.4d2");
                assert_eq!(r.message, "statement: SELECT 1");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_multiline_quoted_message_and_line_numbers() {
        let multi = LINE.replace("statement: SELECT 1", "statement: SELECT 1\nFROM t");
        let input = format!("{multi}{LINE}");
        let mut reader = CsvlogReader::from_reader(input.as_bytes());

        match reader.scan().unwrap() {
            Some(Scanned::Record(r)) => assert_eq!(r.message, "statement: SELECT 1\nFROM t"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(reader.line_number(), 1);

        assert!(matches!(reader.scan().unwrap(), Some(Scanned::Record(_))));
        // 第二条记录从第 3 行开始
        assert_eq!(reader.line_number(), 3);
        assert!(reader.scan().unwrap().is_none());
        assert_eq!(reader.records_read(), 2);
    }

    #[test]
    fn test_malformed_record_does_not_stop_scan() {
        let input = format!("{LINE}only,three,fields\n{LINE}");
        let scanned = scan_all(&input);
        assert_eq!(scanned.len(), 3);
        assert!(matches!(scanned[0], Scanned::Record(_)));
        match &scanned[1] {
            Scanned::Malformed { error, raw } => {
                assert!(matches!(error, CsvlogError::Decode { record: 2, .. }));
                assert_eq!(raw, "only,three,fields");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(scanned[2], Scanned::Record(_)));
    }

    #[test]
    fn test_open_plain_and_gzip() {
        let plain = NamedTempFile::new().unwrap();
        std::fs::write(plain.path(), LINE).unwrap();

        let gz = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(LINE.as_bytes()).unwrap();
        std::fs::write(gz.path(), encoder.finish().unwrap()).unwrap();

        for path in [plain.path(), gz.path()] {
            let mut reader = CsvlogReader::open(path).unwrap();
            assert!(matches!(reader.scan().unwrap(), Some(Scanned::Record(_))));
            assert!(reader.scan().unwrap().is_none());
        }
    }

    #[test]
    fn test_open_missing_file() {
        let err = match CsvlogReader::open("/definitely/not/here.csv") {
            Ok(_) => panic!("expected open error"),
            Err(e) => e,
        };
        assert!(matches!(err, CsvlogError::Open { .. }));
    }

    #[test]
    fn test_short_input_is_not_gzip() {
        let mut out = String::new();
        maybe_decompress(Cursor::new(b"ab".to_vec()))
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "ab");
    }
}
