//! 数据存储模块
//!
//! 所有键值、过期表和过期队列放在一个 `Keyspace` 里，由 `Storage` 持有的一把读写锁保护。
//! 只能通过 `Storage::read()` / `Storage::write()` 返回的守卫访问 `Keyspace`，
//! 修改方法需要 `&mut Keyspace`，因此只有持有写锁时才能调用。

use crate::expiration::ExpirationQueue;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// 自 1970-01-01 UTC 起的秒数
pub type Timestamp = i64;

/// 当前时间戳
pub fn now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}

fn time_expired(t: Timestamp) -> bool {
    t <= now()
}

/// 一个键上存储的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    String(String),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
}

/// 键空间
///
/// 过期的键在读取时被视为不存在(惰性过期)，物理删除由主动过期扫描完成。
#[derive(Debug, Default)]
pub struct Keyspace {
    values: HashMap<String, Entry>,
    /// 键 -> 过期时间；没有记录表示永不过期
    expirations: HashMap<String, Timestamp>,
    /// 只是 `expirations` 的索引，可能包含过时或重复的条目
    queue: ExpirationQueue,
}

impl Keyspace {
    pub fn get(&self, key: &str) -> Option<&Entry> {
        if self.is_expired(key) {
            return None;
        }
        self.values.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        if self.is_expired(key) {
            return None;
        }
        self.values.get_mut(key)
    }

    /// 写入值，不改变过期时间
    ///
    /// 如果旧值已经逻辑过期，它的过期记录一并丢弃，新值不继承这个过期时间。
    pub fn set(&mut self, key: String, entry: Entry) {
        if self.is_expired(&key) {
            self.expirations.remove(&key);
        }
        self.values.insert(key, entry);
    }

    /// 删除值和过期记录，返回是否删除了一个未过期的键
    pub fn del(&mut self, key: &str) -> bool {
        let live = self.get(key).is_some();
        self.values.remove(key);
        self.expirations.remove(key);
        live
    }

    /// 设置过期时间，覆盖之前的记录
    pub fn expire_at(&mut self, key: &str, timestamp: Timestamp) {
        self.queue.push(key.to_string(), timestamp);
        self.expirations.insert(key.to_string(), timestamp);
    }

    /// 过期时间；没有设置或已经过期都返回 `None`
    pub fn expiration_time(&self, key: &str) -> Option<Timestamp> {
        self.expirations
            .get(key)
            .copied()
            .filter(|t| !time_expired(*t))
    }

    pub fn remove_expiration(&mut self, key: &str) {
        self.expirations.remove(key);
    }

    /// 物理存在的键数量，包括已过期但尚未清理的键
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn is_expired(&self, key: &str) -> bool {
        self.expirations.get(key).is_some_and(|t| time_expired(*t))
    }

    fn root_expired(&self) -> bool {
        self.queue.peek_root().is_some_and(|(_, t)| time_expired(t))
    }

    /// 弹出所有已到期的队列条目，并按过期表重新核对后删除
    fn remove_expired(&mut self) -> usize {
        let mut removed = 0;

        while self.root_expired() {
            let Some((key, _)) = self.queue.pop_root() else {
                break;
            };
            // 队列条目可能已经过时：键被重新设置了过期时间或被删除
            if self.is_expired(&key) {
                self.values.remove(&key);
                self.expirations.remove(&key);
                removed += 1;
            }
        }

        removed
    }
}

/// 线程安全的存储句柄，克隆后共享同一个键空间
#[derive(Debug, Clone, Default)]
pub struct Storage {
    inner: Arc<RwLock<Keyspace>>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取共享读锁
    ///
    /// 命令在持锁期间 panic 不会留下半完成的写入，所以中毒的锁可以直接继续使用
    pub fn read(&self) -> RwLockReadGuard<'_, Keyspace> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// 获取独占写锁
    pub fn write(&self) -> RwLockWriteGuard<'_, Keyspace> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 主动过期扫描，返回删除的键数量
    ///
    /// 大多数时候没有键需要过期，先用读锁检查队列的根，只有确实有工作时才拿写锁。
    pub fn run_expiration_cycle(&self) -> usize {
        let anything_to_expire = self.read().root_expired();
        if !anything_to_expire {
            return 0;
        }

        self.write().remove_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Entry {
        Entry::String(s.to_string())
    }

    #[test]
    fn test_set_and_get() {
        let storage = Storage::new();
        storage.write().set("key".to_string(), string("value"));
        assert_eq!(storage.read().get("key"), Some(&string("value")));
        assert_eq!(storage.read().get("missing"), None);
    }

    #[test]
    fn test_del_removes_value_and_expiration() {
        let storage = Storage::new();
        let mut ks = storage.write();
        ks.set("key".to_string(), string("value"));
        ks.expire_at("key", now() + 100);

        assert!(ks.del("key"));
        assert_eq!(ks.get("key"), None);
        assert_eq!(ks.expiration_time("key"), None);
        assert!(!ks.del("key"));
    }

    #[test]
    fn test_lazy_expiration() {
        let mut ks = Keyspace::default();
        ks.set("key".to_string(), string("value"));
        ks.expire_at("key", now() - 1);

        assert_eq!(ks.get("key"), None);
        assert_eq!(ks.get_mut("key"), None);
        assert_eq!(ks.expiration_time("key"), None);
        // 还没有被物理删除
        assert_eq!(ks.len(), 1);
        assert!(!ks.del("key"));
    }

    #[test]
    fn test_expiration_time() {
        let mut ks = Keyspace::default();
        ks.set("key".to_string(), string("value"));
        assert_eq!(ks.expiration_time("key"), None);

        let t = now() + 10;
        ks.expire_at("key", t);
        assert_eq!(ks.expiration_time("key"), Some(t));

        ks.expire_at("key", t + 5);
        assert_eq!(ks.expiration_time("key"), Some(t + 5));

        ks.remove_expiration("key");
        assert_eq!(ks.expiration_time("key"), None);
    }

    #[test]
    fn test_set_over_expired_key_drops_old_expiration() {
        let mut ks = Keyspace::default();
        ks.set("key".to_string(), string("old"));
        ks.expire_at("key", now() - 1);

        ks.set("key".to_string(), string("new"));
        assert_eq!(ks.get("key"), Some(&string("new")));
        assert_eq!(ks.expiration_time("key"), None);
    }

    #[test]
    fn test_expiration_cycle_removes_expired_keys() {
        let storage = Storage::new();
        {
            let mut ks = storage.write();
            ks.set("a".to_string(), string("1"));
            ks.set("b".to_string(), string("2"));
            ks.set("c".to_string(), string("3"));
            ks.expire_at("a", now() - 10);
            ks.expire_at("b", now() - 5);
            ks.expire_at("c", now() + 100);
        }

        assert_eq!(storage.run_expiration_cycle(), 2);
        let ks = storage.read();
        assert_eq!(ks.len(), 1);
        assert!(ks.get("c").is_some());
    }

    #[test]
    fn test_expiration_cycle_nothing_to_do() {
        let storage = Storage::new();
        storage.write().set("a".to_string(), string("1"));
        assert_eq!(storage.run_expiration_cycle(), 0);
        assert_eq!(storage.read().len(), 1);
    }

    #[test]
    fn test_expiration_cycle_skips_stale_queue_entries() {
        let storage = Storage::new();
        {
            let mut ks = storage.write();
            ks.set("key".to_string(), string("value"));
            // 先设置一个过去的时间，再改成未来的时间，队列里留下一个过时的条目
            ks.expire_at("key", now() - 10);
            ks.expire_at("key", now() + 100);
        }

        assert_eq!(storage.run_expiration_cycle(), 0);
        assert!(storage.read().get("key").is_some());
    }

    #[test]
    fn test_expiration_cycle_skips_persisted_keys() {
        let storage = Storage::new();
        {
            let mut ks = storage.write();
            ks.set("key".to_string(), string("value"));
            ks.expire_at("key", now() - 10);
            ks.remove_expiration("key");
        }

        assert_eq!(storage.run_expiration_cycle(), 0);
        assert_eq!(storage.read().get("key"), Some(&string("value")));
    }

    #[test]
    fn test_clones_share_keyspace() {
        let storage = Storage::new();
        let other = storage.clone();
        storage.write().set("key".to_string(), string("value"));
        assert!(other.read().get("key").is_some());
    }
}
