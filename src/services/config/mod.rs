// 設定管理機能
// 画像サイズ・サンプル数・分割ステップ・ワーカー構成

pub mod implementations;

// 公開API
pub use implementations::DefaultRenderConfig;
