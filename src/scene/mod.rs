// シーン層 - 領域ごとのレンダリング処理（パストレーサー）
// シーンはプール起動前に一度だけ構築され、以後は Arc で共有される不変オブジェクト

pub mod camera;
pub mod geometry;
pub mod sampler;
pub mod tracer;
pub mod vec3;

pub use camera::Camera;
pub use geometry::{Material, Ray, Sphere};
pub use sampler::Erand48;
pub use tracer::PathTracer;
pub use vec3::Vec3;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 光線が当たった球とその距離
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub distance: f64,
    pub index: usize,
}

/// 球の集合からなる不変シーン
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    spheres: Vec<Sphere>,
}

impl Scene {
    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self { spheres }
    }

    /// 壁・鏡面球・ガラス球・天井光源からなるコーネルボックス
    pub fn cornell_box() -> Self {
        let zero = Vec3::zero();
        let gray = Vec3::splat(0.75);
        Self::new(vec![
            Sphere::new(1e5, Vec3::new(1e5 + 1.0, 40.8, 81.6), zero, Vec3::new(0.75, 0.25, 0.25), Material::Diffuse), // 左
            Sphere::new(1e5, Vec3::new(-1e5 + 99.0, 40.8, 81.6), zero, Vec3::new(0.25, 0.25, 0.75), Material::Diffuse), // 右
            Sphere::new(1e5, Vec3::new(50.0, 40.8, 1e5), zero, gray, Material::Diffuse), // 奥
            Sphere::new(1e5, Vec3::new(50.0, 40.8, -1e5 + 170.0), zero, zero, Material::Diffuse), // 手前
            Sphere::new(1e5, Vec3::new(50.0, 1e5, 81.6), zero, gray, Material::Diffuse), // 床
            Sphere::new(1e5, Vec3::new(50.0, -1e5 + 81.6, 81.6), zero, gray, Material::Diffuse), // 天井
            Sphere::new(16.5, Vec3::new(27.0, 16.5, 47.0), zero, Vec3::splat(0.999), Material::Specular), // 鏡
            Sphere::new(16.5, Vec3::new(73.0, 16.5, 78.0), zero, Vec3::splat(0.999), Material::Refractive), // ガラス
            Sphere::new(600.0, Vec3::new(50.0, 681.6 - 0.27, 81.6), Vec3::splat(12.0), zero, Material::Diffuse), // 光源
        ])
    }

    /// JSONファイルからシーンを読み込む
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("シーンファイルを開けません: {}", path.display()))?;
        let scene: Scene = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("シーンファイルの形式が不正です: {}", path.display()))?;
        if scene.spheres.is_empty() {
            anyhow::bail!("シーンに球が1つもありません: {}", path.display());
        }
        scene
            .validate()
            .with_context(|| format!("シーンファイルの値が不正です: {}", path.display()))?;
        Ok(scene)
    }

    /// 各球の値がレンダリング可能な範囲にあるか検証
    ///
    /// 反射率の成分が1以上だとロシアンルーレットで経路が終わらない。
    pub fn validate(&self) -> Result<()> {
        for (index, sphere) in self.spheres.iter().enumerate() {
            let finite = sphere.radius.is_finite()
                && sphere.position.is_finite()
                && sphere.emission.is_finite()
                && sphere.color.is_finite();
            if !finite {
                anyhow::bail!("球 {index}: 有限でない値が含まれています");
            }
            if sphere.radius <= 0.0 {
                anyhow::bail!("球 {index}: 半径 {} は正である必要があります", sphere.radius);
            }
            if sphere.emission.min_component() < 0.0 {
                anyhow::bail!("球 {index}: 放射輝度は負にできません");
            }
            if sphere.color.min_component() < 0.0 || sphere.color.max_component() >= 1.0 {
                anyhow::bail!("球 {index}: 反射率の各成分は [0, 1) の範囲である必要があります");
            }
        }
        Ok(())
    }

    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// 最も近い交差。同距離の場合は後ろの球を優先
    pub fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let mut nearest: Option<Hit> = None;
        for (index, sphere) in self.spheres.iter().enumerate().rev() {
            if let Some(distance) = sphere.intersect(ray) {
                if nearest.map_or(true, |hit| distance < hit.distance) {
                    nearest = Some(Hit { distance, index });
                }
            }
        }
        nearest
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::cornell_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_cornell_box_layout() {
        let scene = Scene::cornell_box();

        assert_eq!(scene.spheres().len(), 9);
        let lights: Vec<_> = scene
            .spheres()
            .iter()
            .filter(|s| s.emission.max_component() > 0.0)
            .collect();
        assert_eq!(lights.len(), 1);
    }

    #[test]
    fn test_ray_towards_back_wall_hits_back_wall() {
        let scene = Scene::cornell_box();
        let ray = Ray::new(Vec3::new(50.0, 60.0, 160.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = scene.intersect(&ray).unwrap();
        assert_eq!(hit.index, 2);
        assert!((hit.distance - 160.0).abs() < 1e-2);
    }

    #[test]
    fn test_ray_hits_mirror_sphere_first() {
        let scene = Scene::cornell_box();
        let ray = Ray::new(Vec3::new(27.0, 16.5, 160.0), Vec3::new(0.0, 0.0, -1.0));

        let hit = scene.intersect(&ray).unwrap();
        assert_eq!(scene.spheres()[hit.index].material, Material::Specular);
    }

    #[test]
    fn test_empty_scene_never_hits() {
        let scene = Scene::new(Vec::new());
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));

        assert!(scene.intersect(&ray).is_none());
    }

    #[test]
    fn test_scene_json_roundtrip_through_file() {
        let scene = Scene::cornell_box();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&scene).unwrap().as_bytes())
            .unwrap();

        let loaded = Scene::from_json_file(file.path()).unwrap();
        assert_eq!(loaded.spheres().len(), scene.spheres().len());
        for (a, b) in loaded.spheres().iter().zip(scene.spheres()) {
            assert_eq!(a.material, b.material);
            assert!((a.position - b.position).length() < 1e-9);
            assert!((a.radius - b.radius).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cornell_box_passes_validation() {
        assert!(Scene::cornell_box().validate().is_ok());
    }

    #[test]
    fn test_full_reflectance_rejected() {
        let white = Sphere::new(
            1000.0,
            Vec3::new(50.0, 50.0, 100.0),
            Vec3::zero(),
            Vec3::splat(1.0),
            Material::Diffuse,
        );
        let error = Scene::new(vec![white]).validate().unwrap_err();
        assert!(error.to_string().contains("反射率"));

        let mut nan = Scene::cornell_box();
        nan.spheres[0].position.x = f64::NAN;
        assert!(nan.validate().is_err());

        let mut flat = Scene::cornell_box();
        flat.spheres[1].radius = 0.0;
        assert!(flat.validate().is_err());
    }

    #[test]
    fn test_empty_scene_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"spheres": []}"#).unwrap();

        let error = Scene::from_json_file(file.path()).unwrap_err();
        assert!(error.to_string().contains("球が1つもありません"));
    }
}
