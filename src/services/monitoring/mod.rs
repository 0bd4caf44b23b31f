// 進捗監視機能
// レンダリング開始・領域完了・完了サマリーの報告

pub mod implementations;

// 公開API
pub use implementations::{ConsoleProgressReporter, NoOpProgressReporter};
