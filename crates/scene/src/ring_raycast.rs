//! Ray picking against the three rotation rings of the active gizmo.
//!
//! Each ring is a torus around one axis of the gizmo frame, approximated by
//! capsule segments. The hit's `part` is the ring's axis index.

use bevy::prelude::Resource;
use gimbal_core::{Frame3, Ray3, UiElementId, UiHitQuery, UiRayHit, ray_sphere_intersection};
use glam::Vec3;

/// Epsilon for floating point comparisons
const EPSILON: f32 = 1e-6;

/// Segments per ring when approximating the torus
const RING_SEGMENTS: usize = 32;

/// Picking geometry for rotation rings
#[derive(Resource, Debug, Clone)]
pub struct RingGeometry {
    /// Radius of the rings (matches the trackball sphere)
    pub ring_radius: f32,
    /// Tube radius used for picking
    pub ring_thickness: f32,
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self {
            ring_radius: 1.0,
            ring_thickness: 0.06,
        }
    }
}

/// The rings of one gizmo element placed in the world
#[derive(Debug, Clone, Copy)]
pub struct RingHitQuery {
    pub element: UiElementId,
    /// Ring center and orientation; ring `i` lies around `axes.axis(i)`
    pub axes: Frame3,
    pub ring_radius: f32,
    pub ring_thickness: f32,
}

impl RingHitQuery {
    pub fn new(element: UiElementId, axes: Frame3, geometry: &RingGeometry) -> Self {
        Self {
            element,
            axes,
            ring_radius: geometry.ring_radius,
            ring_thickness: geometry.ring_thickness,
        }
    }
}

impl UiHitQuery for RingHitQuery {
    fn find_ui_hit(&self, ray: &Ray3) -> Option<UiRayHit> {
        (0..3)
            .filter_map(|part| {
                ray_torus_intersection(
                    ray.origin,
                    ray.direction,
                    self.axes.origin,
                    self.axes.axis(part),
                    self.ring_radius,
                    self.ring_thickness,
                )
                .map(|distance| (part, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(part, distance)| UiRayHit {
                element: self.element,
                position: ray.point_at(distance),
                distance,
                part,
            })
    }
}

/// Ray-cylinder intersection test (finite cylinder from `base` along `axis`).
fn ray_cylinder_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    base: Vec3,
    axis: Vec3,
    radius: f32,
    height: f32,
) -> Option<f32> {
    let o = ray_origin - base;

    // Project out the axis component
    let d_perp = ray_dir - axis * ray_dir.dot(axis);
    let o_perp = o - axis * o.dot(axis);

    let a = d_perp.dot(d_perp);
    if a < EPSILON {
        return None; // Ray parallel to cylinder axis
    }
    let b = 2.0 * o_perp.dot(d_perp);
    let c = o_perp.dot(o_perp) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)]
        .into_iter()
        .filter(|t| *t > EPSILON)
        .find(|t| (0.0..=height).contains(&(o + ray_dir * *t).dot(axis)))
}

/// Ray-capsule intersection (cylinder with hemispherical caps).
fn ray_capsule_intersection(ray_origin: Vec3, ray_dir: Vec3, cap1: Vec3, cap2: Vec3, radius: f32) -> Option<f32> {
    let segment = cap2 - cap1;
    let height = segment.length();
    if height < EPSILON {
        return ray_sphere_intersection(ray_origin, ray_dir, cap1, radius);
    }
    let axis = segment / height;

    let body = ray_cylinder_intersection(ray_origin, ray_dir, cap1, axis, radius, height);
    let caps = [cap1, cap2].into_iter().filter_map(|cap| {
        let t = ray_sphere_intersection(ray_origin, ray_dir, cap, radius)?;
        let h = (ray_origin + ray_dir * t - cap1).dot(axis);
        // Only the outward half of each sphere is part of the capsule
        (h <= 0.0 || h >= height).then_some(t)
    });

    body.into_iter().chain(caps).min_by(f32::total_cmp)
}

/// Ray-torus intersection, with the torus approximated by capsule segments.
/// The torus lies in the plane perpendicular to `axis` through `center`.
fn ray_torus_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    center: Vec3,
    axis: Vec3,
    major_radius: f32,
    minor_radius: f32,
) -> Option<f32> {
    let (tangent, bitangent) = perpendicular_vectors(axis);
    let point = |i: usize| {
        let angle = (i as f32 / RING_SEGMENTS as f32) * std::f32::consts::TAU;
        center + (tangent * angle.cos() + bitangent * angle.sin()) * major_radius
    };

    (0..RING_SEGMENTS)
        .filter_map(|i| ray_capsule_intersection(ray_origin, ray_dir, point(i), point(i + 1), minor_radius))
        .min_by(f32::total_cmp)
}

/// Two unit vectors perpendicular to `v` and to each other
fn perpendicular_vectors(v: Vec3) -> (Vec3, Vec3) {
    let arbitrary = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = v.cross(arbitrary).normalize();
    let bitangent = v.cross(tangent).normalize();
    (tangent, bitangent)
}
