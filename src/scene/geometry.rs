// 光線と球のジオメトリ

use super::vec3::Vec3;
use serde::{Deserialize, Serialize};

const HIT_EPSILON: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// 表面の反射特性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Diffuse,
    Specular,
    Refractive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub radius: f64,
    pub position: Vec3,
    pub emission: Vec3,
    pub color: Vec3,
    pub material: Material,
}

impl Sphere {
    pub const fn new(
        radius: f64,
        position: Vec3,
        emission: Vec3,
        color: Vec3,
        material: Material,
    ) -> Self {
        Self {
            radius,
            position,
            emission,
            color,
            material,
        }
    }

    /// 交差までの距離。当たらなければ `None`
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        // t^2 d.d + 2t (o-p).d + (o-p).(o-p) - R^2 = 0
        let op = self.position - ray.origin;
        let b = op.dot(&ray.direction);
        let det = b * b - op.dot(&op) + self.radius * self.radius;
        if det < 0.0 {
            return None;
        }
        let det = det.sqrt();
        [b - det, b + det].into_iter().find(|&t| t > HIT_EPSILON)
    }
}
