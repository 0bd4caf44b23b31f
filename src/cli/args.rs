use crate::core::QueueMode;
use crate::services::DefaultRenderConfig;
use clap::Parser;
use std::path::PathBuf;

/// 位置引数を省略したときの分割ステップ
pub const DEFAULT_STEP: (usize, usize) = (2, 2);

/// 各軸を最低限この数の帯に分割する
pub const MIN_DIVISIONS: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "tile_tracer")]
#[command(about = "Render a path-traced Cornell box on a fixed worker pool, one task per image region")]
#[command(version)]
pub struct Cli {
    /// Region width in pixels (must be given together with Y_STEP)
    #[arg(value_name = "X_STEP", requires = "y_step")]
    pub x_step: Option<usize>,

    /// Region height in pixels
    #[arg(value_name = "Y_STEP")]
    pub y_step: Option<usize>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    pub width: usize,

    /// Image height in pixels
    #[arg(long, default_value_t = 768)]
    pub height: usize,

    /// Samples per subpixel
    #[arg(short, long, default_value_t = 2)]
    pub samples: usize,

    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// How idle workers wait for tasks
    #[arg(long, value_enum, default_value_t = QueueMode::Blocking)]
    pub queue: QueueMode,

    /// Output image path (.ppm, or any format the image crate can write)
    #[arg(short, long, default_value = "image.ppm")]
    pub output: PathBuf,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Load spheres from a JSON scene file instead of the built-in Cornell box
    #[arg(long)]
    pub scene: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// 位置引数の分割ステップ。省略時は既定値
    pub fn step(&self) -> (usize, usize) {
        match (self.x_step, self.y_step) {
            (Some(x_step), Some(y_step)) => (x_step, y_step),
            _ => DEFAULT_STEP,
        }
    }

    /// 引数からレンダリング設定を構築
    pub fn to_config(&self) -> DefaultRenderConfig {
        let (x_step, y_step) = self.step();
        let mut config = DefaultRenderConfig::default()
            .with_size(self.width, self.height)
            .with_samples(self.samples)
            .with_step(x_step, y_step)
            .with_queue_mode(self.queue)
            .with_min_divisions(MIN_DIVISIONS);
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if let Some(scene) = &self.scene {
            config = config.with_scene_path(scene);
        }
        config
    }
}
