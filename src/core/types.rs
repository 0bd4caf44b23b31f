// レンダリングに関連するデータ型定義

use crate::scene::Vec3;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ワーカーがキューを待つ方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum QueueMode {
    /// 条件変数で待機（アイドル時にCPUを消費しない）
    #[default]
    Blocking,
    /// `try_pop` と `yield_now` によるスピン待機
    Spin,
}

impl QueueMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Spin => "spin",
        }
    }
}

/// 出力領域上の軸平行な矩形 `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl Region {
    pub const fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub const fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub const fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub const fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// 2つの領域が1セルでも重なるかどうか
    pub const fn intersects(&self, other: &Region) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// 行優先で領域内の座標を列挙
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| (x, y)))
    }
}

/// レンダリング全体のサマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSummary {
    pub width: usize,
    pub height: usize,
    pub samples: usize,
    pub x_step: usize,
    pub y_step: usize,
    pub thread_count: usize,
    pub queue_mode: String,
    pub total_regions: usize,
    pub completed_regions: usize,
    pub faulted_regions: usize,
    pub elapsed_ms: u64,
    pub max_depth: usize,
    pub rendered_at: DateTime<Utc>,
}

impl RenderSummary {
    /// 全ての領域が正常に完了したかどうか
    pub fn is_complete(&self) -> bool {
        self.faulted_regions == 0 && self.completed_regions == self.total_regions
    }
}

/// 出力用の8bit RGB画像（上の行から行優先）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rgb8Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<[u8; 3]>,
}

impl Rgb8Image {
    /// 放射輝度バッファからガンマ補正済みの画像を作成
    pub fn from_radiance(width: usize, height: usize, radiance: &[Vec3]) -> Self {
        debug_assert_eq!(radiance.len(), width * height);
        Self {
            width,
            height,
            pixels: radiance.iter().map(Vec3::to_rgb8).collect(),
        }
    }
}
