//! Three-ring rotation gizmo for a single object.
//!
//! Ray hit part `0..3` selects the ring (X, Y, Z). Rings rotate about the
//! object's own axes in local mode, about the world axes in world mode, or
//! about the reference object's axes when one is set in local mode.

use gimbal_config::TrackballConfig;
use gimbal_protocol::FrameMode;
use glam::{Quat, Vec3};
use tracing::debug;

use crate::capture::{Capturable, CaptureStatus, Hoverable};
use crate::geometry::{Frame3, Ray3};
use crate::input::{InputEvent, UiElementId, UiRayHit};
use crate::manager::{GizmoBuilder, TransformGizmo};
use crate::scene::{FrameStore, SceneHost, SceneObject};
use crate::widget::{AxisTrackballWidget, FrameTarget, Transformable};

/// Frames captured when a ring drag begins
#[derive(Debug, Clone, Copy)]
struct RingDrag {
    ring: usize,
    /// Frame the ring rotates in
    axes: Frame3,
    /// Target object's frame
    start: Frame3,
}

pub struct RotationGizmo<O: SceneObject> {
    element: UiElementId,
    targets: [O; 1],
    rings: [AxisTrackballWidget; 3],
    frame_mode: FrameMode,
    reference: Option<O>,
    drag: Option<RingDrag>,
    hovered_ring: Option<usize>,
}

impl<O: SceneObject> RotationGizmo<O> {
    pub fn new(target: O, config: &TrackballConfig) -> Self {
        Self {
            element: UiElementId::next(),
            targets: [target],
            rings: [0, 1, 2].map(|axis| AxisTrackballWidget::with_config(axis, config)),
            frame_mode: FrameMode::default(),
            reference: None,
            drag: None,
            hovered_ring: None,
        }
    }

    pub fn target(&self) -> &O {
        &self.targets[0]
    }

    pub fn reference_object(&self) -> Option<&O> {
        self.reference.as_ref()
    }

    /// Ring currently under a hovering ray
    pub fn hovered_ring(&self) -> Option<usize> {
        self.hovered_ring
    }

    /// Ring being dragged
    pub fn active_ring(&self) -> Option<usize> {
        self.drag.map(|drag| drag.ring)
    }

    /// Frame the rings are drawn and rotated in, or `None` when the target
    /// has no frame in `store`
    pub fn axes_frame(&self, store: &dyn FrameStore<O>) -> Option<Frame3> {
        let frame = store.world_frame(self.target())?;
        let rotation = match self.frame_mode {
            FrameMode::World => Quat::IDENTITY,
            FrameMode::Local => self
                .reference
                .as_ref()
                .and_then(|reference| store.world_frame(reference))
                .map_or(frame.rotation, |reference| reference.rotation),
        };
        Some(Frame3::new(frame.origin, rotation))
    }

    /// Per-ring visibility as seen from `eye`
    pub fn visible_rings(&self, store: &dyn FrameStore<O>, eye: Vec3) -> [bool; 3] {
        match self.axes_frame(store) {
            Some(axes) => [0, 1, 2].map(|ring| self.rings[ring].check_visibility(&axes, eye)),
            None => [false; 3],
        }
    }

    fn hit_ring(event: &InputEvent) -> Option<usize> {
        event.hit.map(|hit| hit.part).filter(|part| *part < 3)
    }
}

impl<O: SceneObject> Capturable<dyn FrameStore<O>> for RotationGizmo<O> {
    fn wants_capture(&self, store: &(dyn FrameStore<O> + 'static), event: &InputEvent) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let (Some(ring), Some(axes)) = (Self::hit_ring(event), self.axes_frame(store)) else {
            return false;
        };
        let widget = &self.rings[ring];
        widget.check_visibility(&axes, event.ray().origin)
            && widget.wants_capture(&FrameTarget::new(axes) as &dyn Transformable, event)
    }

    fn begin_capture(&mut self, store: &mut (dyn FrameStore<O> + 'static), event: &InputEvent) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let Some(ring) = Self::hit_ring(event) else {
            return false;
        };
        let (Some(axes), Some(start)) = (self.axes_frame(store), store.world_frame(self.target())) else {
            return false;
        };

        let mut presented = FrameTarget::new(axes);
        if !self.rings[ring].begin_capture(&mut presented as &mut dyn Transformable, event) {
            return false;
        }
        debug!(
            "RotationGizmo: dragging ring {} of {:?} in {:?} mode",
            ring, self.element, self.frame_mode
        );
        self.drag = Some(RingDrag { ring, axes, start });
        true
    }

    fn update_capture(&mut self, store: &mut (dyn FrameStore<O> + 'static), event: &InputEvent) -> CaptureStatus {
        let Some(drag) = self.drag else {
            return CaptureStatus::End;
        };

        let mut presented = FrameTarget::new(drag.axes);
        let status = self.rings[drag.ring].update_capture(&mut presented as &mut dyn Transformable, event);

        // The ring rotated the axes frame; apply the same world rotation to the object
        if let Some(written) = presented.written() {
            let delta = written.rotation * drag.axes.rotation.inverse();
            store.set_world_frame(self.target(), drag.start.rotated(delta));
        }
        status
    }

    fn end_capture(&mut self, store: &mut (dyn FrameStore<O> + 'static), event: &InputEvent) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let mut presented = FrameTarget::new(store.world_frame(self.target()).unwrap_or(drag.axes));
        self.rings[drag.ring].end_capture(&mut presented as &mut dyn Transformable, event);
    }
}

impl<O: SceneObject> Hoverable for RotationGizmo<O> {
    fn update_hover(&mut self, _ray: &Ray3, hit: &UiRayHit) {
        self.hovered_ring = (hit.part < 3).then_some(hit.part);
    }

    fn end_hover(&mut self, _ray: &Ray3) {
        self.hovered_ring = None;
    }
}

impl<O: SceneObject> TransformGizmo<O> for RotationGizmo<O> {
    fn element_id(&self) -> UiElementId {
        self.element
    }

    fn targets(&self) -> &[O] {
        &self.targets
    }

    fn supports_frame_mode(&self) -> bool {
        true
    }

    fn frame_mode(&self) -> FrameMode {
        self.frame_mode
    }

    fn set_frame_mode(&mut self, mode: FrameMode) {
        self.frame_mode = mode;
    }

    fn supports_reference_object(&self) -> bool {
        true
    }

    fn set_reference_object(&mut self, object: O) {
        self.reference = Some(object);
    }

    fn axes_frame(&self, store: &dyn FrameStore<O>) -> Option<Frame3> {
        RotationGizmo::axes_frame(self, store)
    }

    fn as_capturable(&mut self) -> Option<&mut dyn Capturable<dyn FrameStore<O>>> {
        Some(self)
    }

    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        Some(self)
    }

    fn disconnect(&mut self) {
        self.drag = None;
        self.hovered_ring = None;
    }
}

/// Builds a [`RotationGizmo`] for the first target
#[derive(Debug, Clone, Default)]
pub struct RotationGizmoBuilder {
    config: TrackballConfig,
}

impl RotationGizmoBuilder {
    pub fn new(config: TrackballConfig) -> Self {
        Self { config }
    }
}

impl<O: SceneObject> GizmoBuilder<O> for RotationGizmoBuilder {
    fn supports_multiple_objects(&self) -> bool {
        false
    }

    fn build(&self, _scene: &dyn SceneHost<O>, targets: &[O]) -> Option<Box<dyn TransformGizmo<O>>> {
        let target = targets.first()?;
        Some(Box::new(RotationGizmo::new(target.clone(), &self.config)))
    }
}
