//! Axis-constrained trackball rotation.
//!
//! The drag point is where the input ray meets a sphere around the target's
//! origin. Each update rotates the target about one of its frame axes by the
//! signed angle between the radius vector at capture start and the current
//! one. Rays that miss the sphere fall back to a plane through the origin so
//! the gesture never stalls near the silhouette.

use gimbal_config::TrackballConfig;
use glam::{Quat, Vec3};
use tracing::debug;

use crate::capture::{CaptureStatus, Capturable};
use crate::geometry::{Frame3, Ray3, constrained_rotation, ray_sphere_intersection};
use crate::input::InputEvent;

use super::Transformable;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackballState {
    Idle,
    Capturing {
        /// Target frame when the drag began
        frame: Frame3,
        /// Drag point when the drag began
        start_hit: Vec3,
        /// Most recent drag point
        last_hit: Vec3,
    },
}

/// Rotation around a single frame axis driven by a ray
#[derive(Debug, Clone)]
pub struct AxisTrackballWidget {
    axis: usize,
    rotate_speed: f32,
    gizmo_radius: f32,
    fallback_plane_axis: usize,
    visibility_threshold: f32,
    state: TrackballState,
}

impl AxisTrackballWidget {
    /// Widget rotating about frame axis `axis` (0 = X, 1 = Y, 2 = Z)
    pub fn new(axis: usize) -> Self {
        Self::with_config(axis, &TrackballConfig::default())
    }

    pub fn with_config(axis: usize, config: &TrackballConfig) -> Self {
        Self {
            axis,
            rotate_speed: config.rotate_speed,
            gizmo_radius: config.gizmo_radius,
            fallback_plane_axis: config.fallback_plane_axis,
            visibility_threshold: config.visibility_threshold(),
            state: TrackballState::Idle,
        }
    }

    /// Override the damping factor (1.0 = undamped)
    pub fn with_rotate_speed(mut self, rotate_speed: f32) -> Self {
        self.rotate_speed = rotate_speed;
        self
    }

    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn rotate_speed(&self) -> f32 {
        self.rotate_speed
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self.state, TrackballState::Capturing { .. })
    }

    /// Where `ray` grabs the trackball centered at `origin`.
    ///
    /// Sphere hit first, then the fallback plane, then `previous` (or the
    /// closest point on the ray) when the ray is parallel to that plane.
    pub fn drag_point(&self, origin: Vec3, ray: &Ray3, previous: Option<Vec3>) -> Vec3 {
        if let Some(t) = ray_sphere_intersection(ray.origin, ray.direction, origin, self.gizmo_radius) {
            return ray.point_at(t);
        }
        Frame3::from_origin(origin)
            .ray_plane_intersection(ray, self.fallback_plane_axis)
            .or(previous)
            .unwrap_or_else(|| ray.closest_point(origin))
    }

    /// A ring is degenerate when its axis points (nearly) at the eye.
    pub fn check_visibility(&self, frame: &Frame3, eye: Vec3) -> bool {
        let axis = frame.axis(self.axis);
        let eye_dir = (eye - frame.origin).normalize_or_zero();
        axis.dot(eye_dir).abs() <= self.visibility_threshold
    }
}

/// Rotation about `axis` for a drag from `start_hit` to `hit` around `origin`.
///
/// The signed angle is scaled by `rotate_speed` before the quaternion is
/// built, so the result is linear in the angular displacement.
pub fn trackball_rotation(start_hit: Vec3, hit: Vec3, origin: Vec3, axis: Vec3, rotate_speed: f32) -> Quat {
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let full = constrained_rotation(start_hit - origin, hit - origin, axis);
    // Signed twist about `axis`; `full` has w >= 0 so this stays in (-pi, pi]
    let angle = 2.0 * full.xyz().dot(axis).atan2(full.w);
    Quat::from_axis_angle(axis, angle * rotate_speed)
}

impl Capturable<dyn Transformable> for AxisTrackballWidget {
    fn wants_capture(&self, _target: &(dyn Transformable + 'static), event: &InputEvent) -> bool {
        !self.is_capturing() && event.hit.is_some()
    }

    fn begin_capture(&mut self, target: &mut (dyn Transformable + 'static), event: &InputEvent) -> bool {
        if self.is_capturing() {
            return false;
        }
        let frame = target.world_frame();
        let start_hit = self.drag_point(frame.origin, &event.ray(), None);
        self.state = TrackballState::Capturing {
            frame,
            start_hit,
            last_hit: start_hit,
        };
        debug!("Trackball: begin capture on axis {}", self.axis);
        true
    }

    fn update_capture(&mut self, target: &mut (dyn Transformable + 'static), event: &InputEvent) -> CaptureStatus {
        let TrackballState::Capturing {
            frame,
            start_hit,
            last_hit,
        } = self.state
        else {
            return CaptureStatus::End;
        };

        if event.device().trigger_released {
            return CaptureStatus::End;
        }

        let hit = self.drag_point(frame.origin, &event.ray(), Some(last_hit));
        let rotation = trackball_rotation(start_hit, hit, frame.origin, frame.axis(self.axis), self.rotate_speed);
        target.set_world_frame(frame.rotated(rotation));

        self.state = TrackballState::Capturing {
            frame,
            start_hit,
            last_hit: hit,
        };
        CaptureStatus::Continue
    }

    fn end_capture(&mut self, _target: &mut (dyn Transformable + 'static), _event: &InputEvent) {
        // Edits were committed on every update
        if self.is_capturing() {
            debug!("Trackball: end capture on axis {}", self.axis);
        }
        self.state = TrackballState::Idle;
    }
}
