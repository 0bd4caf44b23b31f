// RenderEngine - 分割・共有バッファ・ワーカープールを束ねるライフサイクル管理
// 全ての依存関係がコンストラクタで注入される

use crate::{
    core::{ProgressReporter, RegionRenderer, RenderResult, RenderSummary, Rgb8Image},
    partition::partition_with_policy,
    pool::ThreadPool,
    scene::Vec3,
    services::{DefaultRenderConfig, SharedBuffer},
};
use chrono::Utc;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Instant;

/// 1回のレンダリング結果
#[derive(Debug, Clone)]
pub struct RenderOutput<T> {
    /// 上の行から行優先で並んだセル
    pub cells: Vec<T>,
    pub summary: RenderSummary,
}

impl RenderOutput<Vec3> {
    /// ガンマ補正済みの8bit画像へ変換
    pub fn to_image(&self) -> Rgb8Image {
        Rgb8Image::from_radiance(self.summary.width, self.summary.height, &self.cells)
    }
}

/// タイル分割レンダリングのエンジン
///
/// 並列タスクで共有されるレンダラーとレポーターはArcで保持する。
pub struct RenderEngine<R, P> {
    renderer: Arc<R>,
    config: DefaultRenderConfig,
    reporter: Arc<P>,
}

impl<R, P> RenderEngine<R, P>
where
    R: RegionRenderer + 'static,
    P: ProgressReporter + 'static,
{
    pub fn new(renderer: R, config: DefaultRenderConfig, reporter: P) -> Self {
        Self {
            renderer: Arc::new(renderer),
            config,
            reporter: Arc::new(reporter),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn config(&self) -> &DefaultRenderConfig {
        &self.config
    }

    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// 分割・確保・投入・待機・回収を順に行う
    ///
    /// 設定エラーはタスクを1つも投入する前に返る。
    /// パニックした領域は `faulted_regions` に数えられ、既定値のまま残る。
    pub fn run(&self) -> RenderResult<RenderOutput<R::Cell>> {
        self.config.validate()?;
        let (width, height) = (self.config.width(), self.config.height());
        let (x_step, y_step) = self.config.step();
        let partition = partition_with_policy(width, height, x_step, y_step, self.config.policy())?;

        // バッファの確保はプールの起動より先
        let buffer = Arc::new(SharedBuffer::<R::Cell>::new(width, height));
        let views = buffer.split(&partition)?;
        let mut pool = ThreadPool::from_config(&self.config)?;
        // 統計値はこの実行分だけを数える
        self.renderer.reset_stats();

        let total = views.len();
        let completed = Arc::new(AtomicUsize::new(0));
        self.reporter.report_started(total, pool.thread_count());
        log::debug!("{width}x{height} を {total} 領域に分割 (step {x_step}x{y_step})");

        let start_time = Instant::now();
        for mut view in views {
            let renderer = Arc::clone(&self.renderer);
            let reporter = Arc::clone(&self.reporter);
            let completed = Arc::clone(&completed);
            pool.submit(move || {
                renderer.render_region(&mut view);
                let done = completed.fetch_add(1, Ordering::AcqRel) + 1;
                reporter.report_progress(done, total);
            })?;
        }
        pool.wait()?;
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        let thread_count = pool.thread_count();
        let queue_mode = pool.queue_mode();
        drop(pool);

        let cells = SharedBuffer::reclaim(buffer)?.into_cells();
        let completed_regions = completed.load(Ordering::Acquire);
        let summary = RenderSummary {
            width,
            height,
            samples: self.config.samples(),
            x_step,
            y_step,
            thread_count,
            queue_mode: queue_mode.as_str().to_string(),
            total_regions: total,
            completed_regions,
            faulted_regions: total - completed_regions,
            elapsed_ms,
            max_depth: self.renderer.max_depth(),
            rendered_at: Utc::now(),
        };
        log::info!(
            "rendered {completed_regions}/{total} regions in {elapsed_ms} ms ({thread_count} threads, {})",
            queue_mode.as_str()
        );
        self.reporter.report_completed(&summary);

        Ok(RenderOutput { cells, summary })
    }
}
