//! 命令表
//!
//! 每条命令都是一个函数 `(&Storage, &[String]) -> Result<Reply, CommandError>`，
//! 参数不包含命令名本身。命令表是从小写命令名到函数的静态映射。
//!
//! 所有命令遵守同样的约定:
//! - 参数数量错误在拿锁之前返回
//! - 只读命令整个执行期间持有读锁，写命令整个执行期间持有写锁
//! - 类型或参数错误时不做任何写入

pub mod hashes;
pub mod keys;
pub mod lists;
pub mod strings;

use crate::error::CommandError;
use crate::reply::Reply;
use crate::store::Storage;
use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

pub type CommandResult = Result<Reply, CommandError>;

pub type CommandFn = fn(&Storage, &[String]) -> CommandResult;

/// 命令名到命令函数的映射
#[derive(Clone)]
pub struct CommandTable {
    commands: HashMap<&'static str, CommandFn>,
}

impl CommandTable {
    /// 包含全部内置命令的命令表
    pub fn new() -> Self {
        let builtins: [(&'static str, CommandFn); 17] = [
            ("ttl", keys::ttl),
            ("expire", keys::expire),
            ("del", keys::del),
            ("get", strings::get),
            ("set", strings::set),
            ("update", strings::update),
            ("llen", lists::llen),
            ("lrange", lists::lrange),
            ("ltrim", lists::ltrim),
            ("lpush", lists::lpush),
            ("rpush", lists::rpush),
            ("lpop", lists::lpop),
            ("rpop", lists::rpop),
            ("hget", hashes::hget),
            ("hgetall", hashes::hgetall),
            ("hset", hashes::hset),
            ("hdel", hashes::hdel),
        ];

        Self {
            commands: builtins.into_iter().collect(),
        }
    }

    /// 空命令表
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// 按小写命令名查找
    pub fn get(&self, name: &str) -> Option<CommandFn> {
        self.commands.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("CommandTable").field("commands", &names).finish()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}

/// 检查参数数量是否正确
pub(crate) fn require_args(args: &[String], expected: usize) -> Result<(), CommandError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandError::WrongNumberOfArguments)
    }
}

/// 检查最少参数数量
pub(crate) fn require_min_args(args: &[String], min: usize) -> Result<(), CommandError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(CommandError::WrongNumberOfArguments)
    }
}

pub(crate) fn parse_integer(s: &str) -> Result<i64, CommandError> {
    s.parse().map_err(|_| CommandError::NotAnInteger)
}

/// 解析过期秒数，非数字或负数都是错误
pub(crate) fn parse_expire_seconds(s: &str) -> Result<i64, CommandError> {
    match s.parse::<i64>() {
        Ok(secs) if secs >= 0 => Ok(secs),
        _ => Err(CommandError::InvalidExpireTime),
    }
}

/// LRANGE / LTRIM 共用的下标规范化
///
/// 负数下标从末尾计数(-1 是最后一个元素)；越界的负起点截到 0，超出长度的终点截到 len-1。
/// 规范化后 start > end 或 start >= len 时返回 `None`，表示空区间。
pub(crate) fn normalize_range(len: usize, start: i64, end: i64) -> Option<Range<usize>> {
    let len = len as i64;

    let start = if start < 0 { (len + start).max(0) } else { start };
    let end = if end < 0 { len + end } else { end };

    if start > end || start >= len {
        return None;
    }
    let end = end.min(len - 1);

    Some(start as usize..end as usize + 1)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// 以字符串切片作为参数执行命令，把错误折叠成 `Reply`
    pub fn run(storage: &Storage, command: CommandFn, args: &[&str]) -> Reply {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        command(storage, &args).into()
    }

    pub fn bulks(items: &[&str]) -> Reply {
        Reply::Array(items.iter().map(|s| Reply::Bulk(s.to_string())).collect())
    }
}
