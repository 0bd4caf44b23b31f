// タイルレンダリングのトレイト定義
// プール設定・進捗報告・領域レンダラー・画像出力の抽象化インターフェース

use super::types::{QueueMode, RenderSummary, Rgb8Image};
use crate::services::frame_buffer::RegionView;
use anyhow::Result;
use mockall::automock;

/// ワーカープールの設定を抽象化するトレイト
#[automock]
pub trait PoolConfig: Send + Sync {
    /// ワーカースレッド数を取得
    fn thread_count(&self) -> usize;

    /// キューの待機方式を取得
    fn queue_mode(&self) -> QueueMode;
}

// PoolConfig for Box<dyn PoolConfig>
impl PoolConfig for Box<dyn PoolConfig> {
    fn thread_count(&self) -> usize {
        self.as_ref().thread_count()
    }

    fn queue_mode(&self) -> QueueMode {
        self.as_ref().queue_mode()
    }
}

/// 進捗報告の抽象化トレイト
///
/// `report_progress` はワーカースレッドから並行に呼ばれる。
#[automock]
pub trait ProgressReporter: Send + Sync {
    /// 処理開始時の報告
    fn report_started(&self, total_regions: usize, thread_count: usize);

    /// 領域1つの完了報告
    fn report_progress(&self, completed: usize, total: usize);

    /// 処理完了時の報告
    fn report_completed(&self, summary: &RenderSummary);
}

// ProgressReporter for Box<dyn ProgressReporter>
impl ProgressReporter for Box<dyn ProgressReporter> {
    fn report_started(&self, total_regions: usize, thread_count: usize) {
        self.as_ref().report_started(total_regions, thread_count)
    }

    fn report_progress(&self, completed: usize, total: usize) {
        self.as_ref().report_progress(completed, total)
    }

    fn report_completed(&self, summary: &RenderSummary) {
        self.as_ref().report_completed(summary)
    }
}

/// 1つの領域を計算して共有バッファへ書き込む処理
///
/// 異なる領域に対して複数スレッドから同時に呼ばれる。
/// 書き込めるのは `view` が指す領域のセルだけで、同じプールへタスクを投入してはならない。
pub trait RegionRenderer: Send + Sync {
    /// 出力バッファの1セルの型
    type Cell: Default + Send + 'static;

    /// 領域をレンダリング
    fn render_region(&self, view: &mut RegionView<Self::Cell>);

    /// レンダリング後の統計値（最大パス深度など）
    fn max_depth(&self) -> usize {
        0
    }

    /// 統計値を初期化する。1回のレンダリングの開始時に呼ばれる
    fn reset_stats(&self) {}
}

/// レンダリング結果の出力先を抽象化するトレイト
#[automock]
pub trait ImageSink: Send + Sync {
    /// 8bit RGB画像を書き出す
    fn write_image(&self, image: &Rgb8Image) -> Result<()>;
}

// ImageSink for Box<dyn ImageSink>
impl ImageSink for Box<dyn ImageSink> {
    fn write_image(&self, image: &Rgb8Image) -> Result<()> {
        self.as_ref().write_image(image)
    }
}
