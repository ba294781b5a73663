//! Per-frame input snapshot and the event handed to capturable elements.

use std::sync::atomic::{AtomicU64, Ordering};

use gimbal_protocol::CaptureSide;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::geometry::Ray3;

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an element in the scene's UI-element collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UiElementId(pub u64);

impl UiElementId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// State of one spatial device (controller / hand) for a single frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialDeviceState {
    /// Trigger went down this frame
    pub trigger_pressed: bool,
    /// Trigger went up this frame
    pub trigger_released: bool,
    /// Trigger is held
    pub trigger_down: bool,
    /// Device is tracked and should drive hover
    pub controller_active: bool,
    /// World-space pointing ray
    pub world_ray: Ray3,
}

/// Read-only record of device state for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub left: SpatialDeviceState,
    pub right: SpatialDeviceState,
}

impl InputSnapshot {
    pub fn device(&self, side: CaptureSide) -> &SpatialDeviceState {
        match side {
            CaptureSide::Left => &self.left,
            CaptureSide::Right => &self.right,
        }
    }

    pub fn device_mut(&mut self, side: CaptureSide) -> &mut SpatialDeviceState {
        match side {
            CaptureSide::Left => &mut self.left,
            CaptureSide::Right => &mut self.right,
        }
    }

    pub fn ray(&self, side: CaptureSide) -> Ray3 {
        self.device(side).world_ray
    }

    /// Side whose trigger was pressed this frame, if exactly one was
    pub fn single_trigger_pressed(&self) -> Option<CaptureSide> {
        match (self.left.trigger_pressed, self.right.trigger_pressed) {
            (true, false) => Some(CaptureSide::Left),
            (false, true) => Some(CaptureSide::Right),
            _ => None,
        }
    }
}

/// Result of a ray query against interactable UI elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UiRayHit {
    /// Element that was hit
    pub element: UiElementId,
    /// World-space hit position
    pub position: Vec3,
    /// Distance along the ray
    pub distance: f32,
    /// Sub-part of the element (e.g. which ring of a rotation gizmo)
    pub part: usize,
}

/// What a capturable element sees on each protocol call
#[derive(Debug, Clone, Copy)]
pub struct InputEvent<'a> {
    pub side: CaptureSide,
    pub input: &'a InputSnapshot,
    /// Present on `wants_capture` / `begin_capture`
    pub hit: Option<UiRayHit>,
}

impl<'a> InputEvent<'a> {
    pub fn spatial(side: CaptureSide, input: &'a InputSnapshot) -> Self {
        Self {
            side,
            input,
            hit: None,
        }
    }

    pub fn with_hit(mut self, hit: UiRayHit) -> Self {
        self.hit = Some(hit);
        self
    }

    /// The capturing side's world ray
    pub fn ray(&self) -> Ray3 {
        self.input.ray(self.side)
    }

    pub fn device(&self) -> &SpatialDeviceState {
        self.input.device(self.side)
    }
}
