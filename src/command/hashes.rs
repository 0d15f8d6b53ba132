//! 哈希命令: HGET / HGETALL / HSET / HDEL

use super::{require_args, require_min_args, CommandResult};
use crate::error::CommandError;
use crate::reply::Reply;
use crate::store::{Entry, Storage};
use std::collections::HashMap;

/// HGET key field
pub fn hget(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 2)?;

    let ks = storage.read();
    match ks.get(&args[0]) {
        None => Ok(Reply::Nil),
        Some(Entry::Hash(hash)) => Ok(hash
            .get(&args[1])
            .map_or(Reply::Nil, |value| Reply::Bulk(value.clone()))),
        Some(_) => Err(CommandError::WrongType),
    }
}

/// HGETALL key
///
/// 返回 `[field, value, field, value, ...]`，顺序不确定
pub fn hgetall(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 1)?;

    let ks = storage.read();
    match ks.get(&args[0]) {
        None => Ok(Reply::Array(Vec::new())),
        Some(Entry::Hash(hash)) => Ok(Reply::from_strings(
            hash.iter()
                .flat_map(|(field, value)| [field.clone(), value.clone()]),
        )),
        Some(_) => Err(CommandError::WrongType),
    }
}

/// HSET key field value
///
/// 新字段返回 1，覆盖已有字段返回 0
pub fn hset(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 3)?;
    let (key, field, value) = (&args[0], &args[1], &args[2]);

    let mut ks = storage.write();
    let created = match ks.get_mut(key) {
        Some(Entry::Hash(hash)) => hash.insert(field.clone(), value.clone()).is_none(),
        Some(_) => return Err(CommandError::WrongType),
        None => {
            let hash = HashMap::from([(field.clone(), value.clone())]);
            ks.set(key.clone(), Entry::Hash(hash));
            true
        }
    };
    Ok(Reply::Integer(created as i64))
}

/// HDEL key field [field ...]
///
/// 哈希变空时删除整个键
pub fn hdel(storage: &Storage, args: &[String]) -> CommandResult {
    require_min_args(args, 2)?;
    let (key, fields) = (&args[0], &args[1..]);

    let mut ks = storage.write();
    let (deleted, emptied) = match ks.get_mut(key) {
        None => return Ok(Reply::Integer(0)),
        Some(Entry::Hash(hash)) => {
            let deleted = fields
                .iter()
                .filter(|field| hash.remove(field.as_str()).is_some())
                .count();
            (deleted, hash.is_empty())
        }
        Some(_) => return Err(CommandError::WrongType),
    };

    if emptied {
        ks.del(key);
    }
    Ok(Reply::Integer(deleted as i64))
}
