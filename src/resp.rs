//! RESP协议编解码模块
//!
//! RESP (REdis Serialization Protocol) 的编码器和流式解码器。
//!
//! 解码器基于 `BytesMut` 缓冲区工作：每解析出一个完整的元素就把它从缓冲区移除，
//! 数据不完整时返回 `Ok(None)`，调用方读入更多数据后重试即可。
//! 同一个缓冲区可以连续解析多个请求。

use crate::error::ProtocolError;
use bytes::{Buf, BytesMut};

/// 批量字符串的最大长度 (512 MiB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// 数组嵌套的最大深度
pub const MAX_DEPTH: usize = 64;

/// 内联命令和协议头部行的最大长度 (64 KiB)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// RESP数据类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// 简单字符串: +OK\r\n
    SimpleString(String),
    /// 错误: -Error message\r\n
    Error(String),
    /// 整数: :1000\r\n
    Integer(i64),
    /// 批量字符串: $6\r\nfoobar\r\n
    BulkString(Vec<u8>),
    /// 空批量字符串: $-1\r\n
    Null,
    /// 空数组: *-1\r\n
    NullArray,
    /// 数组: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n
    Array(Vec<RespValue>),
}

impl RespValue {
    /// 将RESP值序列化为字节
    ///
    /// # Panics
    ///
    /// 简单字符串包含 CR/LF，或批量字符串超过 [`MAX_BULK_LEN`] 时 panic。
    /// 这两种情况都是调用方的编程错误，不是运行时输入。
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }

    /// 把编码结果追加到 `dst`
    pub fn encode(&self, dst: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                assert!(
                    !s.contains(['\r', '\n']),
                    "simple string cannot contain a CR or LF character"
                );
                write_line(dst, b'+', s.as_bytes());
            }

            RespValue::Error(e) => write_line(dst, b'-', e.as_bytes()),

            RespValue::Integer(i) => write_line(dst, b':', i.to_string().as_bytes()),

            RespValue::BulkString(data) => {
                assert!(data.len() <= MAX_BULK_LEN, "bulk string is over 512 MB");
                write_line(dst, b'$', data.len().to_string().as_bytes());
                dst.extend_from_slice(data);
                dst.extend_from_slice(b"\r\n");
            }

            RespValue::Null => dst.extend_from_slice(b"$-1\r\n"),

            RespValue::NullArray => dst.extend_from_slice(b"*-1\r\n"),

            RespValue::Array(items) => {
                write_line(dst, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.encode(dst);
                }
            }
        }
    }

    /// 把请求值转换为 `[command, arg1, arg2, ...]`
    ///
    /// 请求必须是非空数组，元素都是字符串
    pub fn into_request(self) -> Result<Vec<String>, ProtocolError> {
        let items = match self {
            RespValue::Array(items) if !items.is_empty() => items,
            _ => return Err(ProtocolError::InvalidRequest),
        };

        items
            .into_iter()
            .map(|item| match item {
                RespValue::SimpleString(s) => Ok(s),
                RespValue::BulkString(data) => {
                    String::from_utf8(data).map_err(|_| ProtocolError::InvalidRequest)
                }
                _ => Err(ProtocolError::InvalidRequest),
            })
            .collect()
    }
}

fn write_line(dst: &mut Vec<u8>, tag: u8, body: &[u8]) {
    dst.push(tag);
    dst.extend_from_slice(body);
    dst.extend_from_slice(b"\r\n");
}

/// 便捷函数：创建OK响应
pub fn ok() -> RespValue {
    RespValue::SimpleString("OK".to_string())
}

/// 便捷函数：从字符串创建批量字符串
pub fn bulk_string(s: &str) -> RespValue {
    RespValue::BulkString(s.as_bytes().to_vec())
}

/// 流式RESP解析器，每个连接一个
///
/// 数组按元素增量解析：完整的元素立即从缓冲区移除并暂存在解析器里，
/// 之后的调用只处理新到达的字节。
#[derive(Debug, Default)]
pub struct RespParser {
    /// 尚未收齐元素的数组，栈顶是最内层
    pending: Vec<PartialArray>,
}

#[derive(Debug)]
struct PartialArray {
    len: usize,
    items: Vec<RespValue>,
}

impl RespParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从缓冲区解析一个顶层值
    ///
    /// 数据不完整时返回 `Ok(None)`，调用方读入更多数据后用同一个解析器重试。
    /// 空白的内联行会被跳过。出错后解析器回到初始状态。
    pub fn parse(&mut self, buf: &mut BytesMut) -> Result<Option<RespValue>, ProtocolError> {
        loop {
            let mut cursor = Cursor::new(&buf[..]);
            let step = match self.pending.len() {
                0 => cursor.top_step(),
                depth => cursor.step(depth),
            };
            let consumed = cursor.pos;

            let value = match step {
                Ok(Step::Value(value)) => value,
                Ok(Step::Array(len)) => {
                    buf.advance(consumed);
                    self.pending.push(PartialArray {
                        len,
                        // 长度来自网络，不能直接用于预分配
                        items: Vec::with_capacity(len.min(1024)),
                    });
                    continue;
                }
                Ok(Step::Blank) => {
                    buf.advance(consumed);
                    continue;
                }
                Err(Fail::Incomplete) => return Ok(None),
                Err(Fail::Protocol(e)) => {
                    self.pending.clear();
                    return Err(e);
                }
            };

            buf.advance(consumed);
            if let Some(value) = self.complete(value) {
                return Ok(Some(value));
            }
        }
    }

    /// 把一个完整的值放进最内层数组，逐层收起已经填满的数组
    ///
    /// 顶层值完成时返回它
    fn complete(&mut self, mut value: RespValue) -> Option<RespValue> {
        while let Some(mut array) = self.pending.pop() {
            array.items.push(value);
            if array.items.len() < array.len {
                self.pending.push(array);
                return None;
            }
            value = RespValue::Array(array.items);
        }
        Some(value)
    }
}

/// 从一段完整的字节中解码一个顶层值，返回值和消费的字节数
///
/// 输入在值结束之前耗尽时返回 [`ProtocolError::UnexpectedEof`]
pub fn decode(src: &[u8]) -> Result<(RespValue, usize), ProtocolError> {
    let mut buf = BytesMut::from(src);
    match RespParser::new().parse(&mut buf)? {
        Some(value) => Ok((value, src.len() - buf.len())),
        None => Err(ProtocolError::UnexpectedEof),
    }
}

/// 解析失败的内部原因：数据不够，或者数据本身是坏的
enum Fail {
    Incomplete,
    Protocol(ProtocolError),
}

impl From<ProtocolError> for Fail {
    fn from(e: ProtocolError) -> Self {
        Fail::Protocol(e)
    }
}

/// 一次解析前进的结果
enum Step {
    /// 一个完整的值
    Value(RespValue),
    /// 非空数组的头部，元素还要继续解析
    Array(usize),
    /// 空白内联行
    Blank,
}

fn is_type_tag(b: u8) -> bool {
    matches!(b, b'+' | b'-' | b':' | b'$' | b'*')
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// 找到 `\n` 的位置；超过 [`MAX_LINE_LEN`] 还没有换行是协议错误
fn find_newline(rest: &[u8]) -> Result<usize, Fail> {
    let window = &rest[..rest.len().min(MAX_LINE_LEN + 1)];
    match window.iter().position(|&b| b == b'\n') {
        Some(nl) => Ok(nl),
        None if rest.len() > MAX_LINE_LEN => {
            Err(ProtocolError::LineTooLong(MAX_LINE_LEN).into())
        }
        None => Err(Fail::Incomplete),
    }
}

struct Cursor<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    /// 顶层：RESP值或内联命令
    fn top_step(&mut self) -> Result<Step, Fail> {
        let first = *self.src.get(self.pos).ok_or(Fail::Incomplete)?;

        if is_type_tag(first) {
            return self.step(0);
        }
        if first.is_ascii_alphanumeric() || first.is_ascii_whitespace() {
            return match self.parse_inline()? {
                Some(value) => Ok(Step::Value(value)),
                None => Ok(Step::Blank),
            };
        }
        Err(ProtocolError::InvalidType(first as char).into())
    }

    /// 解析一个标量，或者一个数组的头部
    fn step(&mut self, depth: usize) -> Result<Step, Fail> {
        let tag = *self.src.get(self.pos).ok_or(Fail::Incomplete)?;

        match tag {
            b'+' => {
                let line = self.read_line()?;
                Ok(Step::Value(RespValue::SimpleString(lossy(line))))
            }

            b'-' => {
                let line = self.read_line()?;
                Ok(Step::Value(RespValue::Error(lossy(line))))
            }

            b':' => {
                let line = self.read_line()?;
                let text = lossy(line);
                let n = text
                    .parse::<i64>()
                    .map_err(|_| ProtocolError::InvalidInteger(text))?;
                Ok(Step::Value(RespValue::Integer(n)))
            }

            b'$' => {
                let len = self.read_length()?;
                if len == -1 {
                    return Ok(Step::Value(RespValue::Null));
                }
                if len < -1 || len as u64 > MAX_BULK_LEN as u64 {
                    return Err(ProtocolError::InvalidBulkLength(len).into());
                }
                let data = self.read_payload(len as usize)?;
                Ok(Step::Value(RespValue::BulkString(data.to_vec())))
            }

            b'*' => {
                if depth >= MAX_DEPTH {
                    return Err(ProtocolError::NestingTooDeep.into());
                }
                match self.read_length()? {
                    -1 => Ok(Step::Value(RespValue::NullArray)),
                    0 => Ok(Step::Value(RespValue::Array(Vec::new()))),
                    count if count < -1 => Err(ProtocolError::InvalidArrayLength(count).into()),
                    count => Ok(Step::Array(count as usize)),
                }
            }

            other => Err(ProtocolError::InvalidType(other as char).into()),
        }
    }

    /// 内联命令: 一行以空白分隔的文本
    fn parse_inline(&mut self) -> Result<Option<RespValue>, Fail> {
        let rest = &self.src[self.pos..];
        let nl = find_newline(rest)?;
        self.pos += nl + 1;

        let text = lossy(&rest[..nl]);
        let parts: Vec<RespValue> = text.split_whitespace().map(bulk_string).collect();

        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RespValue::Array(parts)))
        }
    }

    /// 读取一行，返回去掉类型字节和 CRLF 的内容
    fn read_line(&mut self) -> Result<&'a [u8], Fail> {
        let rest = &self.src[self.pos..];
        let nl = find_newline(rest)?;
        let line = &rest[..=nl];

        if line.len() < 3 {
            return Err(ProtocolError::LineTooShort(lossy(line)).into());
        }
        if line[line.len() - 2] != b'\r' {
            return Err(ProtocolError::InvalidCrlf(lossy(line)).into());
        }

        self.pos += line.len();
        Ok(&line[1..line.len() - 2])
    }

    fn read_length(&mut self) -> Result<i64, Fail> {
        let line = self.read_line()?;
        let text = lossy(line);
        text.parse::<i64>()
            .map_err(|_| ProtocolError::InvalidLength(text).into())
    }

    /// 读取 `len` 字节的载荷和结尾的 CRLF
    fn read_payload(&mut self, len: usize) -> Result<&'a [u8], Fail> {
        let rest = &self.src[self.pos..];
        if rest.len() < len + 2 {
            return Err(Fail::Incomplete);
        }
        if &rest[len..len + 2] != b"\r\n" {
            return Err(ProtocolError::InvalidCrlf(lossy(&rest[..len + 2])).into());
        }

        self.pos += len + 2;
        Ok(&rest[..len])
    }
}
