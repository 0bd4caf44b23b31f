// PathTracer - 領域単位のモンテカルロ・パストレーシング

use super::camera::Camera;
use super::geometry::{Material, Ray};
use super::sampler::Erand48;
use super::vec3::Vec3;
use super::Scene;
use crate::core::RegionRenderer;
use crate::services::frame_buffer::RegionView;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// この深さを超えるとロシアンルーレットで打ち切る
const ROULETTE_DEPTH: usize = 5;
/// 再帰の上限。これを超えた経路は放射だけを返して打ち切る
const MAX_DEPTH: usize = 256;
/// 屈折でのフレネル分岐を確率的に選ぶ深さ
const SPLIT_DEPTH: usize = 2;
const AIR_INDEX: f64 = 1.0;
const GLASS_INDEX: f64 = 1.5;

/// コーネルボックスを描画するパストレーサー
///
/// 各ピクセルを2x2のサブピクセルに分け、サブピクセルごとに `samples` 本の光線を飛ばす。
/// 乱数は領域の行ごとに行番号からシードするため、結果は実行順序に依存しない。
#[derive(Debug)]
pub struct PathTracer {
    scene: Arc<Scene>,
    camera: Camera,
    width: usize,
    height: usize,
    samples: usize,
    max_depth: AtomicUsize,
}

impl PathTracer {
    pub fn new(scene: Arc<Scene>, camera: Camera, width: usize, height: usize, samples: usize) -> Self {
        Self {
            scene,
            camera,
            width,
            height,
            samples,
            max_depth: AtomicUsize::new(0),
        }
    }

    /// 既定のコーネルボックスとカメラで作成
    pub fn cornell_box(width: usize, height: usize, samples: usize) -> Self {
        Self::new(
            Arc::new(Scene::cornell_box()),
            Camera::cornell_box(width, height),
            width,
            height,
            samples,
        )
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// 1本の光線の放射輝度
    pub fn radiance(&self, ray: &Ray, depth: usize, rng: &mut Erand48) -> Vec3 {
        let Some(hit) = self.scene.intersect(ray) else {
            return Vec3::zero();
        };
        let object = &self.scene.spheres()[hit.index];
        let x = ray.at(hit.distance);
        let n = (x - object.position).normalized();
        let nl = if n.dot(&ray.direction) < 0.0 { n } else { -n };
        let mut f = object.color;

        let depth = depth + 1;
        if depth > MAX_DEPTH {
            return object.emission;
        }
        if depth > ROULETTE_DEPTH {
            let p = f.max_component();
            if rng.next_f64() < p {
                f = f * (1.0 / p);
            } else {
                return object.emission;
            }
        }
        self.max_depth.fetch_max(depth, Ordering::Relaxed);

        let reflected = Ray::new(x, ray.direction - n * 2.0 * n.dot(&ray.direction));
        match object.material {
            Material::Diffuse => {
                let r1 = 2.0 * PI * rng.next_f64();
                let r2 = rng.next_f64();
                let r2s = r2.sqrt();
                let w = nl;
                let axis = if w.x.abs() > 0.1 {
                    Vec3::new(0.0, 1.0, 0.0)
                } else {
                    Vec3::new(1.0, 0.0, 0.0)
                };
                let u = axis.cross(&w).normalized();
                let v = w.cross(&u);
                let d = (u * (r1.cos() * r2s) + v * (r1.sin() * r2s) + w * (1.0 - r2).sqrt())
                    .normalized();
                object.emission + f.mul_elem(&self.radiance(&Ray::new(x, d), depth, rng))
            }
            Material::Specular => {
                object.emission + f.mul_elem(&self.radiance(&reflected, depth, rng))
            }
            Material::Refractive => {
                object.emission + f.mul_elem(&self.refract(ray, &reflected, x, n, nl, depth, rng))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn refract(
        &self,
        ray: &Ray,
        reflected: &Ray,
        x: Vec3,
        n: Vec3,
        nl: Vec3,
        depth: usize,
        rng: &mut Erand48,
    ) -> Vec3 {
        let into = n.dot(&nl) > 0.0;
        let nnt = if into {
            AIR_INDEX / GLASS_INDEX
        } else {
            GLASS_INDEX / AIR_INDEX
        };
        let ddn = ray.direction.dot(&nl);
        let cos2t = 1.0 - nnt * nnt * (1.0 - ddn * ddn);
        if cos2t < 0.0 {
            // 全反射
            return self.radiance(reflected, depth, rng);
        }

        let sign = if into { 1.0 } else { -1.0 };
        let tdir = (ray.direction * nnt - n * (sign * (ddn * nnt + cos2t.sqrt()))).normalized();
        let a = GLASS_INDEX - AIR_INDEX;
        let b = GLASS_INDEX + AIR_INDEX;
        let r0 = a * a / (b * b);
        let c = 1.0 - if into { -ddn } else { tdir.dot(&n) };
        let re = r0 + (1.0 - r0) * c.powi(5);
        let tr = 1.0 - re;
        let transmitted = Ray::new(x, tdir);

        if depth > SPLIT_DEPTH {
            let p = 0.25 + 0.5 * re;
            if rng.next_f64() < p {
                self.radiance(reflected, depth, rng) * (re / p)
            } else {
                self.radiance(&transmitted, depth, rng) * (tr / (1.0 - p))
            }
        } else {
            let reflection = self.radiance(reflected, depth, rng) * re;
            reflection + self.radiance(&transmitted, depth, rng) * tr
        }
    }

    /// 1ピクセル分（2x2サブピクセル）の色
    fn pixel(&self, column: usize, camera_row: usize, rng: &mut Erand48) -> Vec3 {
        let (w, h) = (self.width as f64, self.height as f64);
        let weight = 1.0 / self.samples as f64;
        let mut color = Vec3::zero();

        for sy in 0..2 {
            for sx in 0..2 {
                let mut r = Vec3::zero();
                for _ in 0..self.samples {
                    let dx = tent(2.0 * rng.next_f64());
                    let dy = tent(2.0 * rng.next_f64());
                    let u = ((sx as f64 + 0.5 + dx) / 2.0 + column as f64) / w - 0.5;
                    let v = ((sy as f64 + 0.5 + dy) / 2.0 + camera_row as f64) / h - 0.5;
                    r = r + self.radiance(&self.camera.primary_ray(u, v), 0, rng) * weight;
                }
                color = color + r.clamped() * 0.25;
            }
        }
        color
    }
}

/// [0, 2) の一様乱数をテントフィルタで [-1, 1) へ写す
fn tent(r: f64) -> f64 {
    if r < 1.0 {
        r.sqrt() - 1.0
    } else {
        1.0 - (2.0 - r).sqrt()
    }
}

impl RegionRenderer for PathTracer {
    type Cell = Vec3;

    fn render_region(&self, view: &mut RegionView<Vec3>) {
        let region = view.region();
        for image_row in region.y0..region.y1 {
            // 画像は上の行から、カメラ座標は下の行から数える
            let camera_row = self.height - image_row - 1;
            let mut rng = Erand48::for_row(camera_row);
            for column in region.x0..region.x1 {
                let color = self.pixel(column, camera_row, &mut rng);
                let cell = view.get_mut(column, image_row);
                *cell = *cell + color;
            }
        }
    }

    fn max_depth(&self) -> usize {
        self.max_depth.load(Ordering::Relaxed)
    }

    fn reset_stats(&self) {
        self.max_depth.store(0, Ordering::Relaxed);
    }
}
