// コアレイヤー - 基盤となるトレイト、型、エラー定義
// 他のレイヤーから参照される基本的な抽象化を提供

pub mod error;
pub mod traits;
pub mod types;

// 公開API - 明示的にエクスポートして曖昧性を回避
pub use error::{Axis, BufferError, PartitionError, PoolError, RenderError, RenderResult};
pub use traits::{
    ImageSink, MockImageSink, MockPoolConfig, MockProgressReporter, PoolConfig, ProgressReporter,
    RegionRenderer,
};
pub use types::{QueueMode, Region, RenderSummary, Rgb8Image};
