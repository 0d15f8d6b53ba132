//! 命令执行结果
//!
//! `Reply` 与线路编码无关；连接层通过 `From<Reply> for RespValue` 完成编码。

use crate::error::CommandError;
use crate::resp::RespValue;

/// 一条命令的执行结果，每条命令恰好产生一个
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 状态消息，例如 OK
    Message(&'static str),
    Nil,
    Integer(i64),
    Bulk(String),
    Array(Vec<Reply>),
    Error(CommandError),
    /// 关闭连接的哨兵
    Quit,
}

impl Reply {
    pub const OK: Reply = Reply::Message("OK");

    /// 由字符串序列构造批量字符串数组
    pub fn from_strings<I>(items: I) -> Reply
    where
        I: IntoIterator<Item = String>,
    {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err)
    }
}

/// 把 `Result<Reply, CommandError>` 折叠成单个 `Reply`
impl From<Result<Reply, CommandError>> for Reply {
    fn from(result: Result<Reply, CommandError>) -> Self {
        result.unwrap_or_else(Reply::Error)
    }
}

impl From<Reply> for RespValue {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Message(msg) => RespValue::SimpleString(msg.to_string()),
            Reply::Nil => RespValue::Null,
            Reply::Integer(n) => RespValue::Integer(n),
            Reply::Bulk(s) => RespValue::BulkString(s.into_bytes()),
            Reply::Array(items) => RespValue::Array(items.into_iter().map(RespValue::from).collect()),
            Reply::Error(err) => RespValue::Error(err.to_string()),
            Reply::Quit => RespValue::SimpleString("OK".to_string()),
        }
    }
}
