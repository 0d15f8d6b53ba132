//! 错误处理模块
//!
//! 三层错误:
//! - `CommandError` 命令级错误，会被转换为 `-ERR ...` 回复发给客户端
//! - `ProtocolError` 协议解码错误，字节流的帧边界已不可信，只能断开连接
//! - `KvError` 连接级错误，汇总IO、协议和超时

use std::io;
use thiserror::Error;

/// 命令执行错误
///
/// Display 的文本就是发送给客户端的错误内容(不含前导的 `-`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("ERR wrong number of arguments")]
    WrongNumberOfArguments,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR invalid expire time is set")]
    InvalidExpireTime,

    #[error("ERR syntax error")]
    Syntax,

    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR unknown command")]
    UnknownCommand,

    #[error("ERR not authorized")]
    NotAuthorized,

    #[error("ERR wrong password")]
    WrongPassword,

    #[error("ERR can't parse command")]
    EmptyCommand,
}

impl CommandError {
    /// 错误类别前缀
    pub fn prefix(&self) -> &'static str {
        match self {
            CommandError::WrongType => "WRONGTYPE",
            _ => "ERR",
        }
    }

    /// 去掉类别前缀后的错误描述
    pub fn message(&self) -> &'static str {
        match self {
            CommandError::WrongNumberOfArguments => "wrong number of arguments",
            CommandError::NotAnInteger => "value is not an integer or out of range",
            CommandError::InvalidExpireTime => "invalid expire time is set",
            CommandError::Syntax => "syntax error",
            CommandError::WrongType => "Operation against a key holding the wrong kind of value",
            CommandError::UnknownCommand => "unknown command",
            CommandError::NotAuthorized => "not authorized",
            CommandError::WrongPassword => "wrong password",
            CommandError::EmptyCommand => "can't parse command",
        }
    }
}

/// RESP解码错误，每一类畸形输入对应一个变体
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("line is too short: {0:?}")]
    LineTooShort(String),

    #[error("invalid CRLF: {0:?}")]
    InvalidCrlf(String),

    #[error("invalid RESP type: {0:?}")]
    InvalidType(char),

    #[error("invalid integer: {0:?}")]
    InvalidInteger(String),

    #[error("invalid length: {0:?}")]
    InvalidLength(String),

    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    #[error("nesting too deep")]
    NestingTooDeep,

    #[error("line is longer than {0} bytes")]
    LineTooLong(usize),

    #[error("invalid request format")]
    InvalidRequest,
}

/// 连接级错误
#[derive(Debug, Error)]
pub enum KvError {
    /// IO错误 - 网络读写失败
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    /// 协议错误
    #[error("协议错误: {0}")]
    Protocol(#[from] ProtocolError),

    /// 空闲超时
    #[error("连接空闲超时")]
    IdleTimeout,
}

pub type KvResult<T> = Result<T, KvError>;
