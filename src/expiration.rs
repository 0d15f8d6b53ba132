//! 过期队列 - 按过期时间排序的最小堆
//!
//! 队列只是主动过期扫描的索引，不是过期时间的权威来源：同一个键可以被多次入队，
//! 旧的条目不会被删除。弹出的条目必须再和 `Keyspace` 里的过期表核对。

use crate::store::Timestamp;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug, Default)]
pub struct ExpirationQueue {
    heap: BinaryHeap<Reverse<(Timestamp, String)>>,
}

impl ExpirationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(log n)，允许重复的键
    pub fn push(&mut self, key: String, timestamp: Timestamp) {
        self.heap.push(Reverse((timestamp, key)));
    }

    /// 移除并返回过期时间最早的条目
    pub fn pop_root(&mut self) -> Option<(String, Timestamp)> {
        self.heap
            .pop()
            .map(|Reverse((timestamp, key))| (key, timestamp))
    }

    /// 查看过期时间最早的条目，O(1)
    pub fn peek_root(&self) -> Option<(&str, Timestamp)> {
        self.heap
            .peek()
            .map(|Reverse((timestamp, key))| (key.as_str(), *timestamp))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
