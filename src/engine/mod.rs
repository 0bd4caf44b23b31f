// エンジン層 - 並列レンダリングのオーケストレーション
// サービス層とワーカープールを組み合わせて高レベルな処理を提供

pub mod api;
pub mod render_engine;

// 公開API - 主要エンジンクラス
pub use api::{
    build_path_tracer, create_default_render_engine, create_quiet_render_engine, render_to_sink,
};
pub use render_engine::{RenderEngine, RenderOutput};
