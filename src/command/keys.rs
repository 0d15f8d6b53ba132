//! 键命令: TTL / EXPIRE / DEL

use super::{parse_expire_seconds, require_args, require_min_args, CommandResult};
use crate::reply::Reply;
use crate::store::{self, Storage};

/// TTL key
///
/// 返回剩余秒数；键存在但没有过期时间返回 -1，键不存在返回 -2
pub fn ttl(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 1)?;
    let key = &args[0];

    let ks = storage.read();
    let ttl = match ks.expiration_time(key) {
        Some(t) => (t - store::now()).max(0),
        None if ks.get(key).is_some() => -1,
        None => -2,
    };
    Ok(Reply::Integer(ttl))
}

/// EXPIRE key seconds
pub fn expire(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 2)?;
    let key = &args[0];
    let seconds = parse_expire_seconds(&args[1])?;

    let mut ks = storage.write();
    if ks.get(key).is_none() {
        return Ok(Reply::Integer(0));
    }
    ks.expire_at(key, store::now().saturating_add(seconds));
    Ok(Reply::Integer(1))
}

/// DEL key [key ...]
pub fn del(storage: &Storage, args: &[String]) -> CommandResult {
    require_min_args(args, 1)?;

    let mut ks = storage.write();
    let deleted = args.iter().filter(|key| ks.del(key)).count();
    Ok(Reply::Integer(deleted as i64))
}
