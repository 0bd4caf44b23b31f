// 設定管理の具象実装

use crate::core::{PoolConfig, QueueMode, RenderError, RenderResult};
use crate::partition::PartitionPolicy;
use std::path::{Path, PathBuf};

/// デフォルト設定実装
#[derive(Debug, Clone)]
pub struct DefaultRenderConfig {
    width: usize,
    height: usize,
    samples: usize,
    x_step: usize,
    y_step: usize,
    thread_count: usize,
    queue_mode: QueueMode,
    policy: PartitionPolicy,
    scene_path: Option<PathBuf>,
}

impl DefaultRenderConfig {
    pub fn new(cpu_count: usize) -> Self {
        Self {
            thread_count: cpu_count,
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_step(mut self, x_step: usize, y_step: usize) -> Self {
        self.x_step = x_step;
        self.y_step = y_step;
        self
    }

    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_queue_mode(mut self, queue_mode: QueueMode) -> Self {
        self.queue_mode = queue_mode;
        self
    }

    pub fn with_min_step(mut self, min_x_step: usize, min_y_step: usize) -> Self {
        self.policy = self.policy.with_min_step(min_x_step, min_y_step);
        self
    }

    pub fn with_min_divisions(mut self, min_divisions: usize) -> Self {
        self.policy = self.policy.with_min_divisions(min_divisions);
        self
    }

    /// 既定のコーネルボックスの代わりに読み込むシーンファイル
    pub fn with_scene_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene_path = Some(path.into());
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn step(&self) -> (usize, usize) {
        (self.x_step, self.y_step)
    }

    pub fn policy(&self) -> &PartitionPolicy {
        &self.policy
    }

    pub fn scene_path(&self) -> Option<&Path> {
        self.scene_path.as_deref()
    }

    /// 分割以外の設定値を検証
    ///
    /// 分割ステップの検証は分割処理側で行う。
    pub fn validate(&self) -> RenderResult<()> {
        if self.samples == 0 {
            return Err(RenderError::configuration(
                "サンプル数は1以上である必要があります",
            ));
        }
        if self.thread_count == 0 {
            return Err(RenderError::configuration(
                "スレッド数は1以上である必要があります",
            ));
        }
        Ok(())
    }
}

impl Default for DefaultRenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            samples: 2,
            x_step: 2,
            y_step: 2,
            thread_count: num_cpus::get().max(1),
            queue_mode: QueueMode::Blocking,
            policy: PartitionPolicy::default(),
            scene_path: None,
        }
    }
}

impl PoolConfig for DefaultRenderConfig {
    fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn queue_mode(&self) -> QueueMode {
        self.queue_mode
    }
}
