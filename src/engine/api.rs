// 高レベル公開API
// RenderEngineを簡単に使用できるようにするための便利な関数

use super::RenderEngine;
use crate::{
    core::{ImageSink, ProgressReporter, RenderError, RenderResult, RenderSummary},
    scene::{Camera, PathTracer, Scene},
    services::{ConsoleProgressReporter, DefaultRenderConfig, NoOpProgressReporter},
};
use std::sync::Arc;

/// 設定からパストレーサーを構築
///
/// シーンファイルが指定されていればそれを読み込み、なければコーネルボックスを使う。
pub fn build_path_tracer(config: &DefaultRenderConfig) -> RenderResult<PathTracer> {
    let scene = match config.scene_path() {
        Some(path) => {
            Scene::from_json_file(path).map_err(|e| RenderError::configuration(format!("{e:#}")))?
        }
        None => Scene::cornell_box(),
    };
    let (width, height) = (config.width(), config.height());
    Ok(PathTracer::new(
        Arc::new(scene),
        Camera::cornell_box(width, height),
        width,
        height,
        config.samples(),
    ))
}

/// RenderEngine作成のヘルパー関数
///
/// コンソールに進捗を表示するエンジン
pub fn create_default_render_engine(
    config: DefaultRenderConfig,
) -> RenderResult<RenderEngine<PathTracer, ConsoleProgressReporter>> {
    let tracer = build_path_tracer(&config)?;
    Ok(RenderEngine::new(tracer, config, ConsoleProgressReporter::new()))
}

/// RenderEngine作成のヘルパー関数（静音版）
///
/// テストやベンチマーク用
pub fn create_quiet_render_engine(
    config: DefaultRenderConfig,
) -> RenderResult<RenderEngine<PathTracer, NoOpProgressReporter>> {
    let tracer = build_path_tracer(&config)?;
    Ok(RenderEngine::new(tracer, config, NoOpProgressReporter::new()))
}

/// レンダリングして出力先へ書き出す
///
/// 出力先へは全ワーカーの終了と共有バッファの回収が済んでから渡される。
pub fn render_to_sink<P, S>(
    engine: &RenderEngine<PathTracer, P>,
    sink: &S,
) -> RenderResult<RenderSummary>
where
    P: ProgressReporter + 'static,
    S: ImageSink + ?Sized,
{
    let output = engine.run()?;
    sink.write_image(&output.to_image())
        .map_err(RenderError::persistence)?;
    Ok(output.summary)
}
