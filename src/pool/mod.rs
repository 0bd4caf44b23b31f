// プール層 - タスクキューと固定数ワーカープール

pub mod queue;
pub mod thread_pool;

// 公開API
pub use queue::TaskQueue;
pub use thread_pool::{PoolState, PoolStats, Task, ThreadPool};
