// タイル分割パストレーサー
// 固定数ワーカーのスレッドプールで、画像を互いに重ならない領域ごとに並列レンダリングする

pub mod cli;
pub mod core;
pub mod engine;
pub mod partition;
pub mod pool;
pub mod scene;
pub mod services;
