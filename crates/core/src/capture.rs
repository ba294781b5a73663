//! The capture handshake between an input router and interactive elements.
//!
//! A gesture runs `wants_capture` (pure query) -> `begin_capture` ->
//! `update_capture` once per tick -> `end_capture`. `force_end_capture` is
//! the cancellation path and must leave the element exactly as a normal end
//! would, even when called after the element already ended.
//!
//! `S` is whatever the element edits while captured: a single
//! [`Transformable`](crate::widget::Transformable) for a bare widget, or the
//! host's [`FrameStore`](crate::scene::FrameStore) for a gizmo.

use gimbal_protocol::CaptureSide;

use crate::geometry::Ray3;
use crate::input::{InputEvent, UiElementId, UiRayHit};

/// Outcome of `update_capture`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Continue,
    End,
}

/// Router's answer to "do you want this gesture?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureRequest {
    Begin(CaptureSide),
    Ignore,
}

/// Capture currently held by a router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveCapture {
    pub side: CaptureSide,
    pub element: UiElementId,
}

/// An element that can own an input stream for the length of a drag
pub trait Capturable<S: ?Sized> {
    /// Would this element claim the gesture? Must not mutate anything.
    fn wants_capture(&self, scene: &S, event: &InputEvent) -> bool;

    /// Start the gesture. Returning false rejects it.
    fn begin_capture(&mut self, scene: &mut S, event: &InputEvent) -> bool;

    /// Apply this tick's edit
    fn update_capture(&mut self, scene: &mut S, event: &InputEvent) -> CaptureStatus;

    /// Normal conclusion
    fn end_capture(&mut self, scene: &mut S, event: &InputEvent);

    /// Abnormal conclusion (device lost, interrupt)
    fn force_end_capture(&mut self, scene: &mut S, event: &InputEvent) {
        self.end_capture(scene, event);
    }
}

/// Non-exclusive pointer-over notifications
pub trait Hoverable {
    fn update_hover(&mut self, ray: &Ray3, hit: &UiRayHit);
    fn end_hover(&mut self, ray: &Ray3);
}
