// 進捗監視の具象実装

use crate::core::{ProgressReporter, RenderSummary};

/// 進捗を表示する刻み（全体に対する割合の分母）
const PROGRESS_STEPS: usize = 10;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

/// `completed` 個目の完了で新しい10%区切りに到達したかどうか
///
/// 完了数は単調に1ずつ増えるため、状態を持たずに判定できる。
fn crosses_step(completed: usize, total: usize) -> bool {
    if total == 0 || completed == 0 {
        return false;
    }
    completed == total
        || completed * PROGRESS_STEPS / total != (completed - 1) * PROGRESS_STEPS / total
}

impl ProgressReporter for ConsoleProgressReporter {
    fn report_started(&self, total_regions: usize, thread_count: usize) {
        if !self.quiet {
            println!("🚀 Rendering {total_regions} regions on {thread_count} threads...");
        }
    }

    fn report_progress(&self, completed: usize, total: usize) {
        if !self.quiet && crosses_step(completed, total) {
            let percentage = (completed as f64 / total as f64) * 100.0;
            println!("📊 Progress: {completed}/{total} ({percentage:.1}%)");
        }
    }

    fn report_completed(&self, summary: &RenderSummary) {
        if self.quiet {
            return;
        }
        if summary.is_complete() {
            println!(
                "✅ Completed! Regions: {}, Max depth: {}",
                summary.completed_regions, summary.max_depth
            );
        } else {
            eprintln!(
                "❌ {} of {} regions failed",
                summary.faulted_regions, summary.total_regions
            );
        }
        println!("Execution time: {} ms.", summary.elapsed_ms);
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressReporter for NoOpProgressReporter {
    fn report_started(&self, _total_regions: usize, _thread_count: usize) {
        // 何もしない
    }

    fn report_progress(&self, _completed: usize, _total: usize) {
        // 何もしない
    }

    fn report_completed(&self, _summary: &RenderSummary) {
        // 何もしない
    }
}
