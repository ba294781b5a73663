//! Ray and frame math for gizmo manipulation.
//!
//! Everything here is pure: rays, oriented frames, the ray-sphere and
//! ray-plane intersections used to place a drag point, and the
//! axis-constrained rotation between two radius vectors.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Epsilon for floating point comparisons
const EPSILON: f32 = 1e-6;

/// A world-space ray with a unit-length direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray3 {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Default for Ray3 {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray3 {
    /// Create a ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at distance `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Point on the ray closest to `point` (clamped to the ray origin)
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let t = (point - self.origin).dot(self.direction).max(0.0);
        self.point_at(t)
    }
}

/// An origin plus orientation. Axis 0/1/2 are the rotated X/Y/Z.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame3 {
    pub origin: Vec3,
    pub rotation: Quat,
}

impl Default for Frame3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Frame3 {
    pub const IDENTITY: Self = Self {
        origin: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(origin: Vec3, rotation: Quat) -> Self {
        Self { origin, rotation }
    }

    /// Frame at `origin` aligned with the world axes
    pub fn from_origin(origin: Vec3) -> Self {
        Self {
            origin,
            rotation: Quat::IDENTITY,
        }
    }

    /// World-space direction of axis `index`. Indices past 2 map to Z.
    pub fn axis(&self, index: usize) -> Vec3 {
        let local = match index {
            0 => Vec3::X,
            1 => Vec3::Y,
            _ => Vec3::Z,
        };
        self.rotation * local
    }

    /// Same origin, orientation pre-multiplied by a world-space rotation
    pub fn rotated(&self, rotation: Quat) -> Self {
        Self {
            origin: self.origin,
            rotation: (rotation * self.rotation).normalize(),
        }
    }

    /// Intersect `ray` with the plane through this frame's origin whose
    /// normal is axis `normal_axis`. Hits behind the ray origin count.
    pub fn ray_plane_intersection(&self, ray: &Ray3, normal_axis: usize) -> Option<Vec3> {
        let normal = self.axis(normal_axis);
        ray_plane_intersection(ray.origin, ray.direction, self.origin, normal)
            .map(|t| ray.point_at(t))
    }
}

/// Ray-sphere intersection test.
/// Returns the distance to the closest intersection point, or None if no hit.
pub fn ray_sphere_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    sphere_center: Vec3,
    sphere_radius: f32,
) -> Option<f32> {
    let oc = ray_origin - sphere_center;
    let a = ray_dir.dot(ray_dir);
    if a < EPSILON {
        return None;
    }
    let b = 2.0 * oc.dot(ray_dir);
    let c = oc.dot(oc) - sphere_radius * sphere_radius;
    let discriminant = b * b - 4.0 * a * c;

    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = (-b - sqrt_d) / (2.0 * a);
    let t2 = (-b + sqrt_d) / (2.0 * a);

    // Return closest positive intersection
    if t1 > EPSILON {
        Some(t1)
    } else if t2 > EPSILON {
        Some(t2)
    } else {
        None
    }
}

/// Ray-plane intersection as an unbounded line parameter.
/// Returns None when the ray is parallel to the plane.
pub fn ray_plane_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    let denom = ray_dir.dot(plane_normal);
    if denom.abs() < EPSILON {
        return None;
    }
    Some((plane_point - ray_origin).dot(plane_normal) / denom)
}

/// Signed angle in radians from `from` to `to`, both projected onto the
/// plane perpendicular to `normal`. Positive is counter-clockwise about
/// `normal`. Degenerate projections give 0.
pub fn signed_plane_angle(from: Vec3, to: Vec3, normal: Vec3) -> f32 {
    let n = normal.normalize_or_zero();
    let a = (from - n * from.dot(n)).normalize_or_zero();
    let b = (to - n * to.dot(n)).normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    let sin = n.dot(a.cross(b));
    let cos = a.dot(b);
    sin.atan2(cos)
}

/// Rotation about `around` that carries `from` onto `to` as closely as a
/// single-axis rotation can.
pub fn constrained_rotation(from: Vec3, to: Vec3, around: Vec3) -> Quat {
    let axis = around.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis, signed_plane_angle(from, to, axis))
}
