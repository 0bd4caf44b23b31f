// 共有出力バッファ - 領域ごとに排他的なビューを配布し、ロックなしで書き込む

use crate::core::{BufferError, Region};
use crate::partition::Partition;
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 行優先・固定長のセル配列
///
/// 書き込みは `split` で得た `RegionView` 経由でのみ行う。
/// ビューは互いに素な `Partition` から一度だけ作られるため、
/// 同じセルに2つのタスクが同時に書き込むことはない。
pub struct SharedBuffer<T> {
    width: usize,
    height: usize,
    cells: Box<[UnsafeCell<T>]>,
    split: AtomicBool,
}

// SAFETY: セルへの可変アクセスは互いに素な領域を持つ RegionView 経由に限られ、
// 各ビューは `&mut self` でのみ書き込む。
unsafe impl<T: Send> Sync for SharedBuffer<T> {}

impl<T: Default> SharedBuffer<T> {
    /// 既定値で初期化されたバッファを確保
    pub fn new(width: usize, height: usize) -> Self {
        let cells = (0..width * height)
            .map(|_| UnsafeCell::new(T::default()))
            .collect();
        Self {
            width,
            height,
            cells,
            split: AtomicBool::new(false),
        }
    }
}

impl<T> SharedBuffer<T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 分割の各領域に対応するビューを作成（1つのバッファにつき1回のみ）
    pub fn split(self: &Arc<Self>, partition: &Partition) -> Result<Vec<RegionView<T>>, BufferError> {
        if (partition.width(), partition.height()) != (self.width, self.height) {
            return Err(BufferError::DimensionMismatch {
                partition: (partition.width(), partition.height()),
                buffer: (self.width, self.height),
            });
        }
        if self.split.swap(true, Ordering::AcqRel) {
            return Err(BufferError::AlreadySplit);
        }

        Ok(partition
            .iter()
            .map(|&region| RegionView {
                buffer: Arc::clone(self),
                region,
            })
            .collect())
    }

    /// 全ビューが破棄された後に排他所有権を取り戻す
    pub fn reclaim(buffer: Arc<Self>) -> Result<Self, BufferError> {
        Arc::try_unwrap(buffer).map_err(|shared| BufferError::StillShared {
            references: Arc::strong_count(&shared) - 1,
        })
    }

    /// 排他所有時のセル参照
    pub fn get(&mut self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(&*self.cells[y * self.width + x].get_mut())
    }

    /// 行優先のセル列へ変換
    pub fn into_cells(self) -> Vec<T> {
        self.cells
            .into_vec()
            .into_iter()
            .map(UnsafeCell::into_inner)
            .collect()
    }
}

impl<T> fmt::Debug for SharedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("split", &self.split.load(Ordering::Acquire))
            .finish()
    }
}

/// 1つの領域だけに書き込めるバッファのビュー
///
/// 座標は出力全体の座標系で指定する。領域外へのアクセスはパニックする。
pub struct RegionView<T> {
    buffer: Arc<SharedBuffer<T>>,
    region: Region,
}

impl<T> RegionView<T> {
    pub fn region(&self) -> Region {
        self.region
    }

    /// 出力全体の幅と高さ
    pub fn domain(&self) -> (usize, usize) {
        (self.buffer.width, self.buffer.height)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            self.region.contains(x, y),
            "({x}, {y}) is outside of region {:?}",
            self.region
        );
        y * self.buffer.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        let index = self.index(x, y);
        // SAFETY: 領域内のセルはこのビューだけが書き込み、書き込みには `&mut self` が必要。
        unsafe { &*self.buffer.cells[index].get() }
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let index = self.index(x, y);
        // SAFETY: 領域はPartition内で互いに素で、ビューは領域ごとに1つしか存在しない。
        unsafe { &mut *self.buffer.cells[index].get() }
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }
}

impl<T> fmt::Debug for RegionView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionView")
            .field("region", &self.region)
            .finish()
    }
}
