//! 一个用Rust实现的内存键值服务器，使用 Redis 兼容的 RESP 协议
//!
//! 支持字符串、列表、哈希三种数据类型以及键过期(惰性过期 + 主动过期扫描)。
//!
//! ## 模块结构
//!
//! - `error` - 错误处理
//! - `resp` - RESP协议编解码
//! - `reply` - 命令执行结果
//! - `expiration` - 过期队列
//! - `store` - 数据存储
//! - `command` - 命令表
//! - `server` - 命令分发与认证
//! - `connection` - 连接处理
//! - `config` - 命令行配置

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod expiration;
pub mod reply;
pub mod resp;
pub mod server;
pub mod store;

// 重新导出常用类型
pub use command::CommandTable;
pub use config::Config;
pub use error::{CommandError, KvError, KvResult, ProtocolError};
pub use reply::Reply;
pub use resp::RespValue;
pub use server::{Server, Session};
pub use store::{Entry, Storage};

/// 默认端口
pub const DEFAULT_PORT: u16 = 6379;

/// 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
