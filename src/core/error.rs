// タイルレンダリング専用のエラー型定義
// プール・分割・共有バッファ・レンダリング全体の各層ごとに分けて定義

use std::io;
use thiserror::Error;

/// 座標軸の識別子（エラーメッセージ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
        }
    }
}

/// ワーカープール固有のエラー型
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("設定エラー: ワーカー数は1以上である必要があります")]
    ZeroThreads,

    #[error("ワーカー起動エラー: worker {worker} - {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    #[error("プールは既に停止処理に入っています: 新しいタスクは受け付けません")]
    ShutDown,

    #[error("ワーカーが異常終了しました: worker {worker}")]
    WorkerPanicked { worker: usize },
}

impl PoolError {
    /// ワーカー起動エラーの作成
    pub fn spawn(worker: usize, source: io::Error) -> Self {
        Self::Spawn { worker, source }
    }
}

/// 領域分割の設定エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartitionError {
    #[error("設定エラー: 描画領域が空です ({width}x{height})")]
    EmptyDomain { width: usize, height: usize },

    #[error("設定エラー: {axis}方向のステップは1以上である必要があります")]
    ZeroStep { axis: Axis },

    #[error("設定エラー: {axis}方向のステップ {step} が領域サイズ {extent} を超えています")]
    StepExceedsDomain {
        axis: Axis,
        step: usize,
        extent: usize,
    },

    #[error("設定エラー: {axis}方向のステップ {step} が最小値 {minimum} 未満です")]
    StepBelowMinimum {
        axis: Axis,
        step: usize,
        minimum: usize,
    },

    #[error("設定エラー: {axis}方向の分割数 {divisions} が最小値 {minimum} 未満です")]
    TooFewDivisions {
        axis: Axis,
        divisions: usize,
        minimum: usize,
    },
}

/// 共有出力バッファのエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("共有バッファは既に領域ビューへ分割されています")]
    AlreadySplit,

    #[error("分割サイズ {partition:?} がバッファサイズ {buffer:?} と一致しません")]
    DimensionMismatch {
        partition: (usize, usize),
        buffer: (usize, usize),
    },

    #[error("共有バッファへの参照がまだ {references} 個残っています")]
    StillShared { references: usize },
}

/// レンダリング全体のエラー型
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("ワーカープールエラー: {0}")]
    Pool(#[from] PoolError),

    #[error("共有バッファエラー: {0}")]
    Buffer(#[from] BufferError),

    #[error("永続化エラー: {source}")]
    Persistence {
        #[source]
        source: anyhow::Error,
    },
}

impl RenderError {
    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// 永続化エラーの作成
    pub fn persistence(source: anyhow::Error) -> Self {
        Self::Persistence { source }
    }

    /// タスク投入前に検出される設定エラーかどうか
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. } | Self::Partition(_) | Self::Pool(PoolError::ZeroThreads)
        )
    }
}

/// レンダリングの結果型
pub type RenderResult<T> = std::result::Result<T, RenderError>;
