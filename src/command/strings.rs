//! 字符串命令: GET / SET / UPDATE

use super::{parse_expire_seconds, require_args, CommandResult};
use crate::error::CommandError;
use crate::reply::Reply;
use crate::store::{self, Entry, Storage};

/// GET key
pub fn get(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 1)?;

    let ks = storage.read();
    match ks.get(&args[0]) {
        None => Ok(Reply::Nil),
        Some(Entry::String(value)) => Ok(Reply::Bulk(value.clone())),
        Some(_) => Err(CommandError::WrongType),
    }
}

/// SET key value [EX seconds]
///
/// 不带 EX 时清除原有的过期时间。`EX 0` 等同于不带 EX。
pub fn set(storage: &Storage, args: &[String]) -> CommandResult {
    let expire_secs = parse_set_options(args)?;
    let key = &args[0];

    let mut ks = storage.write();
    ks.set(key.clone(), Entry::String(args[1].clone()));
    match expire_secs {
        Some(secs) if secs > 0 => ks.expire_at(key, store::now().saturating_add(secs)),
        _ => ks.remove_expiration(key),
    }
    Ok(Reply::OK)
}

/// 解析 SET 的参数，返回 EX 的秒数
fn parse_set_options(args: &[String]) -> Result<Option<i64>, CommandError> {
    match args.len() {
        2 => Ok(None),
        4 => {
            if !args[2].eq_ignore_ascii_case("EX") {
                return Err(CommandError::Syntax);
            }
            parse_expire_seconds(&args[3]).map(Some)
        }
        _ => Err(CommandError::WrongNumberOfArguments),
    }
}

/// UPDATE key value
///
/// 只覆盖值，保留过期时间
pub fn update(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 2)?;

    let mut ks = storage.write();
    ks.set(args[0].clone(), Entry::String(args[1].clone()));
    Ok(Reply::OK)
}
