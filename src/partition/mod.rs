// 領域分割 - 2次元の出力領域を互いに重ならない矩形へ分割

use crate::core::{Axis, PartitionError, Region};

/// 分割時の下限ポリシー
///
/// タスクあたりのオーバーヘッドが支配的にならないよう、
/// 公称ステップと軸ごとの分割数に下限を設ける。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionPolicy {
    pub min_x_step: usize,
    pub min_y_step: usize,
    pub min_divisions: usize,
}

impl Default for PartitionPolicy {
    fn default() -> Self {
        Self {
            min_x_step: 1,
            min_y_step: 1,
            min_divisions: 1,
        }
    }
}

impl PartitionPolicy {
    pub fn with_min_step(mut self, min_x_step: usize, min_y_step: usize) -> Self {
        self.min_x_step = min_x_step;
        self.min_y_step = min_y_step;
        self
    }

    pub fn with_min_divisions(mut self, min_divisions: usize) -> Self {
        self.min_divisions = min_divisions;
        self
    }
}

/// 1回の分割で得られた領域列
///
/// `partition` 以外からは構築できないため、保持していること自体が
/// 「全領域が互いに素で、領域全体を覆う」ことの証明になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    width: usize,
    height: usize,
    x_step: usize,
    y_step: usize,
    regions: Vec<Region>,
}

impl Partition {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn step(&self) -> (usize, usize) {
        (self.x_step, self.y_step)
    }

    /// 行優先（y外側、x内側）の領域列
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }
}

impl<'a> IntoIterator for &'a Partition {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}

fn check_axis(
    axis: Axis,
    step: usize,
    extent: usize,
    min_step: usize,
    min_divisions: usize,
) -> Result<(), PartitionError> {
    if step == 0 {
        return Err(PartitionError::ZeroStep { axis });
    }
    if step > extent {
        return Err(PartitionError::StepExceedsDomain { axis, step, extent });
    }
    if step < min_step {
        return Err(PartitionError::StepBelowMinimum {
            axis,
            step,
            minimum: min_step,
        });
    }
    // 切り詰められた末尾の帯は数えない
    let divisions = extent / step;
    if divisions < min_divisions {
        return Err(PartitionError::TooFewDivisions {
            axis,
            divisions,
            minimum: min_divisions,
        });
    }
    Ok(())
}

/// 既定ポリシーで `width x height` を `(x_step, y_step)` ごとに分割
pub fn partition(
    width: usize,
    height: usize,
    x_step: usize,
    y_step: usize,
) -> Result<Partition, PartitionError> {
    partition_with_policy(width, height, x_step, y_step, &PartitionPolicy::default())
}

/// ポリシーを指定して分割
///
/// 末尾の行・列は領域内に収まるよう切り詰められる。
pub fn partition_with_policy(
    width: usize,
    height: usize,
    x_step: usize,
    y_step: usize,
    policy: &PartitionPolicy,
) -> Result<Partition, PartitionError> {
    if width == 0 || height == 0 {
        return Err(PartitionError::EmptyDomain { width, height });
    }
    check_axis(
        Axis::X,
        x_step,
        width,
        policy.min_x_step,
        policy.min_divisions,
    )?;
    check_axis(
        Axis::Y,
        y_step,
        height,
        policy.min_y_step,
        policy.min_divisions,
    )?;

    let columns = width.div_ceil(x_step);
    let rows = height.div_ceil(y_step);
    let mut regions = Vec::with_capacity(columns * rows);

    for y in (0..height).step_by(y_step) {
        for x in (0..width).step_by(x_step) {
            regions.push(Region::new(
                x,
                (x + x_step).min(width),
                y,
                (y + y_step).min(height),
            ));
        }
    }

    Ok(Partition {
        width,
        height,
        x_step,
        y_step,
        regions,
    })
}
