// データ永続化機能
// レンダリング画像の書き出しと実行サマリーの保存

pub mod implementations;

// 公開API
pub use implementations::{
    encode_ppm, sink_for_path, write_summary_json, ImageFileSink, MemorySink, PpmSink,
};
