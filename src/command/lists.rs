//! 列表命令: LLEN / LRANGE / LTRIM / LPUSH / RPUSH / LPOP / RPOP
//!
//! 列表为空时键会被删除，存储中不会出现空列表。

use super::{normalize_range, parse_integer, require_args, require_min_args, CommandResult};
use crate::error::CommandError;
use crate::reply::Reply;
use crate::store::{Entry, Storage};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Back,
}

/// LLEN key
pub fn llen(storage: &Storage, args: &[String]) -> CommandResult {
    require_args(args, 1)?;

    let ks = storage.read();
    match ks.get(&args[0]) {
        // 不存在的键视为空列表
        None => Ok(Reply::Integer(0)),
        Some(Entry::List(list)) => Ok(Reply::Integer(list.len() as i64)),
        Some(_) => Err(CommandError::WrongType),
    }
}

/// LRANGE key start end
pub fn lrange(storage: &Storage, args: &[String]) -> CommandResult {
    let (start, end) = parse_range_args(args)?;

    let ks = storage.read();
    let list = match ks.get(&args[0]) {
        None => return Ok(Reply::Array(Vec::new())),
        Some(Entry::List(list)) => list,
        Some(_) => return Err(CommandError::WrongType),
    };

    let items = match normalize_range(list.len(), start, end) {
        Some(range) => list.range(range).cloned().collect(),
        None => Vec::new(),
    };
    Ok(Reply::from_strings(items))
}

/// LTRIM key start end
pub fn ltrim(storage: &Storage, args: &[String]) -> CommandResult {
    let (start, end) = parse_range_args(args)?;
    let key = &args[0];

    let mut ks = storage.write();
    let emptied = match ks.get_mut(key) {
        None => return Ok(Reply::OK),
        Some(Entry::List(list)) => match normalize_range(list.len(), start, end) {
            Some(range) => {
                list.truncate(range.end);
                list.drain(..range.start);
                false
            }
            None => true,
        },
        Some(_) => return Err(CommandError::WrongType),
    };

    if emptied {
        ks.del(key);
    }
    Ok(Reply::OK)
}

/// LPUSH key value [value ...]
///
/// 按参数顺序逐个插入到头部，`LPUSH k a b c` 得到 `c b a`
pub fn lpush(storage: &Storage, args: &[String]) -> CommandResult {
    push(storage, args, End::Front)
}

/// RPUSH key value [value ...]
pub fn rpush(storage: &Storage, args: &[String]) -> CommandResult {
    push(storage, args, End::Back)
}

/// LPOP key
pub fn lpop(storage: &Storage, args: &[String]) -> CommandResult {
    pop(storage, args, End::Front)
}

/// RPOP key
pub fn rpop(storage: &Storage, args: &[String]) -> CommandResult {
    pop(storage, args, End::Back)
}

fn parse_range_args(args: &[String]) -> Result<(i64, i64), CommandError> {
    require_args(args, 3)?;
    Ok((parse_integer(&args[1])?, parse_integer(&args[2])?))
}

fn push_all(list: &mut VecDeque<String>, values: &[String], end: End) {
    for value in values {
        match end {
            End::Front => list.push_front(value.clone()),
            End::Back => list.push_back(value.clone()),
        }
    }
}

fn push(storage: &Storage, args: &[String], end: End) -> CommandResult {
    require_min_args(args, 2)?;
    let (key, values) = (&args[0], &args[1..]);

    let mut ks = storage.write();
    let len = match ks.get_mut(key) {
        Some(Entry::List(list)) => {
            push_all(list, values, end);
            list.len()
        }
        Some(_) => return Err(CommandError::WrongType),
        None => {
            let mut list = VecDeque::with_capacity(values.len());
            push_all(&mut list, values, end);
            let len = list.len();
            ks.set(key.clone(), Entry::List(list));
            len
        }
    };
    Ok(Reply::Integer(len as i64))
}

fn pop(storage: &Storage, args: &[String], end: End) -> CommandResult {
    require_args(args, 1)?;
    let key = &args[0];

    let mut ks = storage.write();
    let (value, emptied) = match ks.get_mut(key) {
        None => return Ok(Reply::Nil),
        Some(Entry::List(list)) => {
            let value = match end {
                End::Front => list.pop_front(),
                End::Back => list.pop_back(),
            };
            (value, list.is_empty())
        }
        Some(_) => return Err(CommandError::WrongType),
    };

    if emptied {
        ks.del(key);
    }
    Ok(value.map_or(Reply::Nil, Reply::Bulk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::hashes::hset;
    use crate::command::test_support::{bulks, run};
    use std::sync::Arc;
    use std::thread;

    fn storage_with_list(items: &[&str]) -> Storage {
        let storage = Storage::new();
        let mut args = vec!["list"];
        args.extend_from_slice(items);
        run(&storage, rpush, &args);
        storage
    }

    #[test]
    fn test_push_order() {
        let storage = Storage::new();
        assert_eq!(run(&storage, lpush, &["l", "a", "b"]), Reply::Integer(2));
        assert_eq!(run(&storage, lrange, &["l", "0", "-1"]), bulks(&["b", "a"]));

        assert_eq!(run(&storage, rpush, &["r", "a", "b"]), Reply::Integer(2));
        assert_eq!(run(&storage, lrange, &["r", "0", "-1"]), bulks(&["a", "b"]));
    }

    #[test]
    fn test_lpush_prepends_to_existing_list() {
        let storage = storage_with_list(&["x", "y"]);
        assert_eq!(
            run(&storage, lpush, &["list", "a", "b", "c"]),
            Reply::Integer(5)
        );
        assert_eq!(
            run(&storage, lrange, &["list", "0", "-1"]),
            bulks(&["c", "b", "a", "x", "y"])
        );
    }

    #[test]
    fn test_llen() {
        let storage = storage_with_list(&["a", "b", "c"]);
        assert_eq!(run(&storage, llen, &["list"]), Reply::Integer(3));
        assert_eq!(run(&storage, llen, &["missing"]), Reply::Integer(0));
    }

    #[test]
    fn test_lrange_normalization() {
        let storage = storage_with_list(&["a", "b", "c", "d", "e"]);

        assert_eq!(
            run(&storage, lrange, &["list", "-100", "2"]),
            run(&storage, lrange, &["list", "0", "2"])
        );
        assert_eq!(run(&storage, lrange, &["list", "100", "-1"]), bulks(&[]));
        assert_eq!(run(&storage, lrange, &["list", "-2", "-1"]), bulks(&["d", "e"]));
        assert_eq!(run(&storage, lrange, &["list", "1", "100"]), bulks(&["b", "c", "d", "e"]));
        assert_eq!(run(&storage, lrange, &["list", "3", "1"]), bulks(&[]));
        assert_eq!(run(&storage, lrange, &["missing", "0", "-1"]), bulks(&[]));
    }

    #[test]
    fn test_lrange_bad_index() {
        let storage = storage_with_list(&["a"]);
        assert_eq!(
            run(&storage, lrange, &["list", "zero", "-1"]),
            Reply::Error(CommandError::NotAnInteger)
        );
        assert_eq!(
            run(&storage, ltrim, &["list", "0", "1.5"]),
            Reply::Error(CommandError::NotAnInteger)
        );
    }

    #[test]
    fn test_ltrim_then_lrange() {
        let storage = storage_with_list(&["a", "b", "c", "d", "e"]);
        let expected = run(&storage, lrange, &["list", "1", "-2"]);

        assert_eq!(run(&storage, ltrim, &["list", "1", "-2"]), Reply::OK);
        assert_eq!(run(&storage, lrange, &["list", "0", "-1"]), expected);
        assert_eq!(expected, bulks(&["b", "c", "d"]));
    }

    #[test]
    fn test_ltrim_empty_range_deletes_key() {
        let storage = storage_with_list(&["a", "b"]);
        assert_eq!(run(&storage, ltrim, &["list", "5", "10"]), Reply::OK);
        assert!(storage.read().get("list").is_none());
        assert_eq!(run(&storage, ltrim, &["list", "0", "1"]), Reply::OK);
    }

    #[test]
    fn test_pop_both_ends() {
        let storage = storage_with_list(&["a", "b", "c"]);
        assert_eq!(run(&storage, lpop, &["list"]), Reply::Bulk("a".to_string()));
        assert_eq!(run(&storage, rpop, &["list"]), Reply::Bulk("c".to_string()));
        assert_eq!(run(&storage, llen, &["list"]), Reply::Integer(1));
    }

    #[test]
    fn test_pop_last_element_deletes_key() {
        let storage = storage_with_list(&["only"]);
        assert_eq!(run(&storage, rpop, &["list"]), Reply::Bulk("only".to_string()));
        assert!(storage.read().is_empty());
        assert_eq!(run(&storage, lpop, &["list"]), Reply::Nil);
    }

    #[test]
    fn test_wrong_type_does_not_mutate() {
        let storage = Storage::new();
        run(&storage, hset, &["hash", "f", "v"]);
        let before = storage.read().get("hash").cloned();

        let wrong_type = Reply::Error(CommandError::WrongType);
        assert_eq!(run(&storage, lpush, &["hash", "a"]), wrong_type);
        assert_eq!(run(&storage, rpop, &["hash"]), wrong_type);
        assert_eq!(run(&storage, ltrim, &["hash", "0", "0"]), wrong_type);
        assert_eq!(run(&storage, llen, &["hash"]), wrong_type);
        assert_eq!(run(&storage, lrange, &["hash", "0", "-1"]), wrong_type);

        assert_eq!(storage.read().get("hash").cloned(), before);
    }

    #[test]
    fn test_reads_do_not_mutate() {
        let storage = storage_with_list(&["a", "b"]);
        let before = storage.read().get("list").cloned();

        run(&storage, llen, &["list"]);
        run(&storage, lrange, &["list", "0", "0"]);
        run(&storage, lrange, &["missing", "0", "-1"]);

        assert_eq!(storage.read().get("list").cloned(), before);
        assert_eq!(storage.read().len(), 1);
    }

    #[test]
    fn test_concurrent_lpush() {
        let storage = Arc::new(Storage::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let storage = Arc::clone(&storage);
                thread::spawn(move || {
                    for _ in 0..50 {
                        run(&storage, lpush, &["k", "x"]);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(run(&storage, llen, &["k"]), Reply::Integer(16 * 50));
    }
}
