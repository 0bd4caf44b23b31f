// TaskQueue - 複数のProducer/Consumerから安全に使えるFIFOキュー

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

/// ミューテックスと条件変数で保護されたFIFOキュー
///
/// 一度取り出された要素は他のConsumerから見えることはない。
/// ユーザーのクロージャはロック中に実行されないため、ポイズンは内部状態の破損を意味しない。
#[derive(Debug)]
pub struct TaskQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 末尾に追加し、待機中のConsumerを1つ起こす
    pub fn push(&self, item: T) {
        self.lock().push_back(item);
        self.available.notify_one();
    }

    /// 先頭を取り出す。空ならブロックせずに `None`
    pub fn try_pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// 先頭を取り出す。空なら要素が追加されるまで待機
    pub fn pop_blocking(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = self
                .available
                .wait(items)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// 空かどうか（取得直後に古くなる可能性がある）
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 現在の要素数（参考値）
    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for TaskQueue<T> {
    /// コピー元をロックした状態で一貫したスナップショットを取る
    fn clone(&self) -> Self {
        let snapshot = self.lock().clone();
        Self {
            items: Mutex::new(snapshot),
            available: Condvar::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fifo_order() {
        let queue = TaskQueue::new();
        for i in 0..5 {
            queue.push(i);
        }

        let popped: Vec<_> = std::iter::from_fn(|| queue.try_pop()).collect();
        assert_eq!(popped, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_try_pop_on_empty_queue() {
        let queue: TaskQueue<u32> = TaskQueue::new();

        assert!(queue.try_pop().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn test_pop_blocking_wakes_on_push() {
        let queue = Arc::new(TaskQueue::new());
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_blocking())
        };

        // Consumerが待機に入るまで少し待つ
        thread::sleep(Duration::from_millis(20));
        queue.push(42);

        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn test_clone_is_independent_snapshot() {
        let queue = TaskQueue::new();
        queue.push("a");
        queue.push("b");

        let copy = queue.clone();
        queue.push("c");
        assert_eq!(queue.try_pop(), Some("a"));

        assert_eq!(copy.len(), 2);
        assert_eq!(copy.try_pop(), Some("a"));
        assert_eq!(copy.try_pop(), Some("b"));
        assert_eq!(copy.try_pop(), None);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_concurrent_consumers_receive_each_item_once() {
        const ITEMS: usize = 10_000;
        const CONSUMERS: usize = 4;

        let queue = Arc::new(TaskQueue::new());
        for i in 0..ITEMS {
            queue.push(Some(i));
        }
        for _ in 0..CONSUMERS {
            queue.push(None);
        }

        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Some(item) = queue.pop_blocking() {
                        seen.push(item);
                    }
                    seen
                })
            })
            .collect();

        let mut all = HashSet::new();
        let mut total = 0;
        for handle in handles {
            let seen = handle.join().unwrap();
            total += seen.len();
            all.extend(seen);
        }

        assert_eq!(total, ITEMS);
        assert_eq!(all.len(), ITEMS);
        assert!(queue.is_empty());
    }
}
