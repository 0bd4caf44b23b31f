// ピンホールカメラ

use super::geometry::Ray;
use super::vec3::Vec3;

/// 視野の広さ（画面半幅と焦点距離の比）
const FIELD_OF_VIEW: f64 = 0.5135;
/// 一次光線を部屋の内側から開始させるための前進量
const NEAR_OFFSET: f64 = 140.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub direction: Vec3,
    /// 画面の水平方向の基底
    pub cx: Vec3,
    /// 画面の垂直方向の基底
    pub cy: Vec3,
}

impl Camera {
    pub fn new(origin: Vec3, direction: Vec3, width: usize, height: usize) -> Self {
        let direction = direction.normalized();
        let cx = Vec3::new(width as f64 * FIELD_OF_VIEW / height as f64, 0.0, 0.0);
        let cy = cx.cross(&direction).normalized() * FIELD_OF_VIEW;
        Self {
            origin,
            direction,
            cx,
            cy,
        }
    }

    /// コーネルボックスを正面から見る既定カメラ
    pub fn cornell_box(width: usize, height: usize) -> Self {
        Self::new(
            Vec3::new(50.0, 52.0, 295.6),
            Vec3::new(0.0, -0.042612, -1.0),
            width,
            height,
        )
    }

    /// 画面上の位置 (u, v) ∈ [-0.5, 0.5] を通る一次光線
    pub fn primary_ray(&self, u: f64, v: f64) -> Ray {
        let d = self.cx * u + self.cy * v + self.direction;
        Ray::new(self.origin + d * NEAR_OFFSET, d.normalized())
    }
}
