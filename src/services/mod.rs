// サービス層 - 機能別のビジネスロジック
// 共有出力バッファ・設定・進捗監視・永続化をそれぞれ独立した責任として持つ

pub mod config;
pub mod frame_buffer;
pub mod monitoring;
pub mod persistence;

// 公開API - 各サービスの主要機能を明示的にエクスポート
pub use config::DefaultRenderConfig;
pub use frame_buffer::{RegionView, SharedBuffer};
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter};
pub use persistence::{
    encode_ppm, sink_for_path, write_summary_json, ImageFileSink, MemorySink, PpmSink,
};
