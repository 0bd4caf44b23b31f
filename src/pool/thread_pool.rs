// ThreadPool - 固定数ワーカーによるタスク実行プール
// 単一の共有キューからタスクを取り出し、停止フラグと番兵タスクで終了する

use super::queue::TaskQueue;
use crate::core::{PoolConfig, PoolError, QueueMode};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// 引数なし・戻り値なしの作業単位
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// キューに流れる要素
enum Job {
    Run(Task),
    /// 停止フラグを確認させるための空タスク
    Sentinel,
}

/// 外部から観測できるプールの状態
///
/// ワーカーの起動は `new` の中で、排出と終了待ちは `wait` の中で完結するため、
/// 観測できるのは起動後と停止後の2状態だけになる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// タスクを受け付けている
    Running,
    /// 全ワーカーが終了し、新しいタスクは拒否される
    Stopped,
}

#[derive(Debug, Default)]
struct Counters {
    executed: AtomicUsize,
    panicked: AtomicUsize,
    live_workers: AtomicUsize,
}

/// プールの実行統計（プール破棄後も参照可能）
#[derive(Debug, Clone)]
pub struct PoolStats {
    counters: Arc<Counters>,
}

impl PoolStats {
    /// 正常に完了したタスク数
    pub fn executed(&self) -> usize {
        self.counters.executed.load(Ordering::Acquire)
    }

    /// パニックしたタスク数
    pub fn panicked(&self) -> usize {
        self.counters.panicked.load(Ordering::Acquire)
    }

    /// まだ終了していないワーカー数
    pub fn live_workers(&self) -> usize {
        self.counters.live_workers.load(Ordering::Acquire)
    }
}

struct Shared {
    queue: TaskQueue<Job>,
    done: AtomicBool,
    mode: QueueMode,
    counters: Arc<Counters>,
}

impl Shared {
    fn next_job(&self) -> Job {
        match self.mode {
            QueueMode::Blocking => self.queue.pop_blocking(),
            QueueMode::Spin => loop {
                match self.queue.try_pop() {
                    Some(job) => break job,
                    None => thread::yield_now(),
                }
            },
        }
    }

    fn execute(&self, worker: usize, task: Task) {
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                self.counters.executed.fetch_add(1, Ordering::AcqRel);
            }
            Err(payload) => {
                self.counters.panicked.fetch_add(1, Ordering::AcqRel);
                log::error!(
                    "worker {worker}: タスクがパニックしました: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}

fn run_worker(worker: usize, shared: &Shared) {
    loop {
        match shared.next_job() {
            Job::Run(task) => shared.execute(worker, task),
            Job::Sentinel => {
                if shared.done.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }
    shared.counters.live_workers.fetch_sub(1, Ordering::AcqRel);
    log::trace!("worker {worker} exited");
}

/// 固定数のワーカースレッドを持つタスクプール
///
/// `wait` は冪等で、2回目以降は何もせずに `Ok(())` を返す。
/// `wait` は `&mut self` を取るため、停止処理と `submit` の競合や
/// 複数箇所からの同時 `wait` はコンパイル時に排除される。
/// `wait` 開始後の `submit` は `PoolError::ShutDown` で拒否される。
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    thread_count: usize,
    state: PoolState,
}

impl ThreadPool {
    /// 指定数のワーカーを起動
    pub fn new(thread_count: usize, mode: QueueMode) -> Result<Self, PoolError> {
        if thread_count == 0 {
            return Err(PoolError::ZeroThreads);
        }

        let shared = Arc::new(Shared {
            queue: TaskQueue::new(),
            done: AtomicBool::new(false),
            mode,
            counters: Arc::new(Counters::default()),
        });
        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(thread_count),
            thread_count,
            state: PoolState::Running,
        };

        for worker in 0..thread_count {
            let shared = Arc::clone(&pool.shared);
            shared.counters.live_workers.fetch_add(1, Ordering::AcqRel);
            let spawned = thread::Builder::new()
                .name(format!("tile-worker-{worker}"))
                .spawn(move || run_worker(worker, &shared));

            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(source) => {
                    pool.shared
                        .counters
                        .live_workers
                        .fetch_sub(1, Ordering::AcqRel);
                    // 起動済みのワーカーはDropで停止される
                    return Err(PoolError::spawn(worker, source));
                }
            }
        }

        log::debug!(
            "thread pool started: {thread_count} workers ({})",
            mode.as_str()
        );
        Ok(pool)
    }

    /// ハードウェア並列数と同じ数のワーカーを起動
    pub fn with_default_threads(mode: QueueMode) -> Result<Self, PoolError> {
        Self::new(num_cpus::get().max(1), mode)
    }

    /// 設定からプールを構築
    pub fn from_config<C: PoolConfig + ?Sized>(config: &C) -> Result<Self, PoolError> {
        Self::new(config.thread_count(), config.queue_mode())
    }

    /// タスクをキューへ投入
    pub fn submit<F>(&self, task: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state != PoolState::Running {
            return Err(PoolError::ShutDown);
        }
        self.shared.queue.push(Job::Run(Box::new(task)));
        Ok(())
    }

    /// 投入済みの全タスクの完了を待ち、全ワーカーを終了させる
    pub fn wait(&mut self) -> Result<(), PoolError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), PoolError> {
        if self.state == PoolState::Stopped {
            return Ok(());
        }

        self.shared.done.store(true, Ordering::Release);
        // 番兵は投入済みタスクの後ろに並ぶため、全タスクが先に取り出される
        for _ in 0..self.workers.len() {
            self.shared.queue.push(Job::Sentinel);
        }

        let mut result = Ok(());
        for (worker, handle) in self.workers.drain(..).enumerate() {
            if handle.join().is_err() && result.is_ok() {
                result = Err(PoolError::WorkerPanicked { worker });
            }
        }

        self.state = PoolState::Stopped;
        log::debug!(
            "thread pool stopped: executed={} panicked={}",
            self.shared.counters.executed.load(Ordering::Acquire),
            self.shared.counters.panicked.load(Ordering::Acquire)
        );
        result
    }

    /// ワーカー数（構築後は変化しない）
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn queue_mode(&self) -> QueueMode {
        self.shared.mode
    }

    pub fn state(&self) -> PoolState {
        self.state
    }

    /// まだ取り出されていないタスク数（参考値）
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    /// 統計ハンドルを取得
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            counters: Arc::clone(&self.shared.counters),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            log::error!("thread pool shutdown failed: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::MockPoolConfig;
    use std::sync::Mutex;
    use std::time::Duration;

    fn counting_run(thread_count: usize, mode: QueueMode, tasks: usize) -> usize {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(thread_count, mode).unwrap();

        for _ in 0..tasks {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.wait().unwrap();

        counter.load(Ordering::SeqCst)
    }

    #[test]
    fn test_zero_threads_rejected() {
        let result = ThreadPool::new(0, QueueMode::Blocking);
        assert!(matches!(result, Err(PoolError::ZeroThreads)));
    }

    #[test]
    fn test_counter_single_worker() {
        assert_eq!(counting_run(1, QueueMode::Blocking, 1_000), 1_000);
        assert_eq!(counting_run(1, QueueMode::Spin, 1_000), 1_000);
    }

    #[test]
    fn test_counter_two_workers() {
        assert_eq!(counting_run(2, QueueMode::Blocking, 5_000), 5_000);
        assert_eq!(counting_run(2, QueueMode::Spin, 5_000), 5_000);
    }

    #[test]
    fn test_counter_hardware_concurrency() {
        let threads = num_cpus::get().max(1);
        assert_eq!(counting_run(threads, QueueMode::Blocking, 20_000), 20_000);
        assert_eq!(counting_run(threads, QueueMode::Spin, 20_000), 20_000);
    }

    #[test]
    fn test_single_worker_runs_in_submission_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut pool = ThreadPool::new(1, QueueMode::Blocking).unwrap();

        for i in 0..100 {
            let order = Arc::clone(&order);
            pool.submit(move || order.lock().unwrap().push(i)).unwrap();
        }
        pool.wait().unwrap();

        assert_eq!(*order.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_panicking_task_does_not_stop_worker() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(1, QueueMode::Blocking).unwrap();

        pool.submit(|| panic!("region failed")).unwrap();
        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        pool.submit(|| panic!("{}", String::from("owned payload")))
            .unwrap();

        let stats = pool.stats();
        pool.wait().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(stats.executed(), 10);
        assert_eq!(stats.panicked(), 2);
    }

    #[test]
    fn test_wait_is_idempotent() {
        let mut pool = ThreadPool::new(2, QueueMode::Blocking).unwrap();
        assert_eq!(pool.state(), PoolState::Running);
        pool.submit(|| {}).unwrap();

        pool.wait().unwrap();
        assert_eq!(pool.state(), PoolState::Stopped);

        pool.wait().unwrap();
        assert_eq!(pool.state(), PoolState::Stopped);
        // 2回目のwaitは番兵を追加しない
        assert_eq!(pool.pending(), 0);
    }

    #[test]
    fn test_submit_after_wait_is_rejected() {
        let ran = Arc::new(AtomicBool::new(false));
        let mut pool = ThreadPool::new(2, QueueMode::Spin).unwrap();
        pool.wait().unwrap();

        let flag = Arc::clone(&ran);
        let result = pool.submit(move || flag.store(true, Ordering::SeqCst));

        assert!(matches!(result, Err(PoolError::ShutDown)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_joins_all_workers() {
        let mut pool = ThreadPool::new(4, QueueMode::Blocking).unwrap();
        let stats = pool.stats();
        assert_eq!(pool.thread_count(), 4);

        for _ in 0..16 {
            pool.submit(|| thread::sleep(Duration::from_millis(2)))
                .unwrap();
        }
        pool.wait().unwrap();

        assert_eq!(stats.live_workers(), 0);
        assert_eq!(stats.executed(), 16);
        assert_eq!(pool.thread_count(), 4);
    }

    #[test]
    fn test_drop_drains_and_joins() {
        let counter = Arc::new(AtomicUsize::new(0));
        let stats = {
            let pool = ThreadPool::new(3, QueueMode::Blocking).unwrap();
            for _ in 0..50 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    thread::sleep(Duration::from_micros(200));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
            pool.stats()
        };

        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert_eq!(stats.live_workers(), 0);
    }

    #[test]
    fn test_idle_pool_shuts_down() {
        for mode in [QueueMode::Blocking, QueueMode::Spin] {
            let mut pool = ThreadPool::new(3, mode).unwrap();
            let stats = pool.stats();
            pool.wait().unwrap();
            assert_eq!(stats.live_workers(), 0);
            assert_eq!(stats.executed(), 0);
        }
    }

    #[test]
    fn test_concurrent_submitters() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = ThreadPool::new(4, QueueMode::Blocking).unwrap();

        thread::scope(|scope| {
            for _ in 0..4 {
                let pool = &pool;
                let counter = Arc::clone(&counter);
                scope.spawn(move || {
                    for _ in 0..500 {
                        let counter = Arc::clone(&counter);
                        pool.submit(move || {
                            counter.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                    }
                });
            }
        });
        pool.wait().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 2_000);
    }

    #[test]
    fn test_from_config_uses_injected_settings() {
        let mut config = MockPoolConfig::new();
        config.expect_thread_count().times(1).return_const(3usize);
        config
            .expect_queue_mode()
            .times(1)
            .return_const(QueueMode::Spin);

        let mut pool = ThreadPool::from_config(&config).unwrap();

        assert_eq!(pool.thread_count(), 3);
        assert_eq!(pool.queue_mode(), QueueMode::Spin);
        pool.wait().unwrap();
    }
}
