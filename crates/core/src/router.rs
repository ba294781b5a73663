//! Routes spatial-device input (two pointing rays with triggers) into
//! capturable and hoverable UI elements.
//!
//! The router holds at most one capture. A gesture starts when exactly one
//! trigger goes down over an element that wants it; the element then sees
//! every tick until that side's trigger is released.
//!
//! Both rays can hover the same element. Hover is tracked per side, and an
//! element still hovered by one ray is never told that hover ended because
//! the other ray left it.

use gimbal_protocol::CaptureSide;
use tracing::{debug, info};

use crate::capture::{ActiveCapture, CaptureRequest, CaptureStatus, Capturable, Hoverable};
use crate::geometry::Ray3;
use crate::input::{InputEvent, InputSnapshot, UiElementId, UiRayHit};

/// Scene-side ray queries against interactable elements
pub trait UiHitQuery {
    /// Nearest element that can take a capture
    fn find_ui_hit(&self, ray: &Ray3) -> Option<UiRayHit>;

    /// Nearest element that reacts to hover
    fn find_ui_hover_hit(&self, ray: &Ray3) -> Option<UiRayHit> {
        self.find_ui_hit(ray)
    }
}

/// No element to query hits nothing
impl<T: UiHitQuery> UiHitQuery for Option<T> {
    fn find_ui_hit(&self, ray: &Ray3) -> Option<UiRayHit> {
        self.as_ref()?.find_ui_hit(ray)
    }

    fn find_ui_hover_hit(&self, ray: &Ray3) -> Option<UiRayHit> {
        self.as_ref()?.find_ui_hover_hit(ray)
    }
}

/// Lookup from element id to its input capabilities.
///
/// `S` is what captured elements edit, see [`Capturable`].
pub trait UiElementHost<S: ?Sized> {
    fn capturable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Capturable<S>>;

    fn hoverable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Hoverable>;
}

#[derive(Debug, Default)]
pub struct SpatialCaptureRouter {
    active: Option<ActiveCapture>,
    left_hover: Option<UiElementId>,
    right_hover: Option<UiElementId>,
}

impl SpatialCaptureRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_capture(&self) -> Option<ActiveCapture> {
        self.active
    }

    pub fn is_capturing(&self) -> bool {
        self.active.is_some()
    }

    pub fn hovered(&self, side: CaptureSide) -> Option<UiElementId> {
        match side {
            CaptureSide::Left => self.left_hover,
            CaptureSide::Right => self.right_hover,
        }
    }

    fn hover_slot(&mut self, side: CaptureSide) -> &mut Option<UiElementId> {
        match side {
            CaptureSide::Left => &mut self.left_hover,
            CaptureSide::Right => &mut self.right_hover,
        }
    }

    // ------------------------------------------------------------------
    // Capture
    // ------------------------------------------------------------------

    /// Ask the element under the pressing ray whether it wants the gesture.
    /// Ignored while a capture is held or when both triggers went down.
    pub fn wants_capture<S: ?Sized>(
        &self,
        input: &InputSnapshot,
        hits: &dyn UiHitQuery,
        elements: &mut dyn UiElementHost<S>,
        scene: &S,
    ) -> CaptureRequest {
        if self.active.is_some() {
            return CaptureRequest::Ignore;
        }
        let Some(side) = input.single_trigger_pressed() else {
            return CaptureRequest::Ignore;
        };
        let Some(hit) = hits.find_ui_hit(&input.ray(side)) else {
            return CaptureRequest::Ignore;
        };
        let Some(element) = elements.capturable_mut(hit.element) else {
            return CaptureRequest::Ignore;
        };

        let event = InputEvent::spatial(side, input).with_hit(hit);
        if element.wants_capture(scene, &event) {
            CaptureRequest::Begin(side)
        } else {
            CaptureRequest::Ignore
        }
    }

    /// Start a capture on `side`. The hit is queried again because the scene
    /// may have changed since `wants_capture`.
    pub fn begin_capture<S: ?Sized>(
        &mut self,
        side: CaptureSide,
        input: &InputSnapshot,
        hits: &dyn UiHitQuery,
        elements: &mut dyn UiElementHost<S>,
        scene: &mut S,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(hit) = hits.find_ui_hit(&input.ray(side)) else {
            return false;
        };
        let Some(element) = elements.capturable_mut(hit.element) else {
            return false;
        };

        let event = InputEvent::spatial(side, input).with_hit(hit);
        if !element.begin_capture(scene, &event) {
            debug!("SpatialCaptureRouter: {:?} rejected capture", hit.element);
            return false;
        }

        info!("SpatialCaptureRouter: {:?} captured by {:?} ray", hit.element, side);
        self.active = Some(ActiveCapture {
            side,
            element: hit.element,
        });
        true
    }

    /// Drive the captured element for one tick
    pub fn update_capture<S: ?Sized>(
        &mut self,
        input: &InputSnapshot,
        elements: &mut dyn UiElementHost<S>,
        scene: &mut S,
    ) -> CaptureStatus {
        let Some(active) = self.active else {
            return CaptureStatus::End;
        };
        let Some(element) = elements.capturable_mut(active.element) else {
            // Element was removed from the scene mid-gesture
            debug!("SpatialCaptureRouter: captured {:?} disappeared", active.element);
            self.active = None;
            return CaptureStatus::End;
        };

        let event = InputEvent::spatial(active.side, input);
        let device = input.device(active.side);

        if device.trigger_released {
            element.end_capture(scene, &event);
        } else if device.trigger_down {
            match element.update_capture(scene, &event) {
                CaptureStatus::Continue => return CaptureStatus::Continue,
                CaptureStatus::End => element.end_capture(scene, &event),
            }
        } else {
            // Trigger state was lost (e.g. device switched away)
            element.force_end_capture(scene, &event);
        }

        info!("SpatialCaptureRouter: {:?} released", active.element);
        self.active = None;
        CaptureStatus::End
    }

    /// Cancel the current capture, if any
    pub fn force_end_capture<S: ?Sized>(
        &mut self,
        input: &InputSnapshot,
        elements: &mut dyn UiElementHost<S>,
        scene: &mut S,
    ) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(element) = elements.capturable_mut(active.element) {
            element.force_end_capture(scene, &InputEvent::spatial(active.side, input));
        }
        info!("SpatialCaptureRouter: force-ended capture of {:?}", active.element);
    }

    // ------------------------------------------------------------------
    // Hover
    // ------------------------------------------------------------------

    pub fn update_hover<S: ?Sized>(
        &mut self,
        input: &InputSnapshot,
        hits: &dyn UiHitQuery,
        elements: &mut dyn UiElementHost<S>,
    ) {
        for side in [CaptureSide::Left, CaptureSide::Right] {
            self.update_side_hover(side, input, hits, elements);
        }
    }

    fn update_side_hover<S: ?Sized>(
        &mut self,
        side: CaptureSide,
        input: &InputSnapshot,
        hits: &dyn UiHitQuery,
        elements: &mut dyn UiElementHost<S>,
    ) {
        let device = input.device(side);
        let hit = device
            .controller_active
            .then(|| hits.find_ui_hover_hit(&device.world_ray))
            .flatten();

        let Some(hit) = hit else {
            if self.hovered(side).is_some() {
                self.deactivate_hover(side, input, elements);
            }
            return;
        };

        if self.hovered(side).is_some_and(|current| current != hit.element) {
            self.deactivate_hover(side, input, elements);
        }
        *self.hover_slot(side) = Some(hit.element);

        // The other ray already drives this element's hover
        if self.hovered(side.other()) == Some(hit.element) {
            return;
        }
        if let Some(element) = elements.hoverable_mut(hit.element) {
            element.update_hover(&device.world_ray, &hit);
        }
    }

    fn deactivate_hover<S: ?Sized>(
        &mut self,
        side: CaptureSide,
        input: &InputSnapshot,
        elements: &mut dyn UiElementHost<S>,
    ) {
        let Some(current) = self.hover_slot(side).take() else {
            return;
        };
        if self.hovered(side.other()) == Some(current) {
            return;
        }
        if let Some(element) = elements.hoverable_mut(current) {
            element.end_hover(&input.ray(side));
        }
    }

    /// End hover on both rays. An element shared by both rays hears it once.
    pub fn end_hover<S: ?Sized>(&mut self, input: &InputSnapshot, elements: &mut dyn UiElementHost<S>) {
        let left = self.left_hover.take();
        let right = self.right_hover.take();

        let mut end = |id: Option<UiElementId>, side: CaptureSide| {
            if let Some(element) = id.and_then(|id| elements.hoverable_mut(id)) {
                element.end_hover(&input.ray(side));
            }
        };
        end(left, CaptureSide::Left);
        if right != left {
            end(right, CaptureSide::Right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::collections::HashMap;

    /// Scene stand-in: counts edits
    #[derive(Default)]
    struct Counter {
        updates: usize,
    }

    #[derive(Default)]
    struct MockElement {
        accepts: bool,
        capturing: bool,
        ends: usize,
        force_ends: usize,
        hover_updates: usize,
        hover_ends: usize,
    }

    impl Capturable<Counter> for MockElement {
        fn wants_capture(&self, _scene: &Counter, event: &InputEvent) -> bool {
            self.accepts && event.hit.is_some()
        }

        fn begin_capture(&mut self, _scene: &mut Counter, _event: &InputEvent) -> bool {
            self.capturing = self.accepts;
            self.accepts
        }

        fn update_capture(&mut self, scene: &mut Counter, _event: &InputEvent) -> CaptureStatus {
            scene.updates += 1;
            CaptureStatus::Continue
        }

        fn end_capture(&mut self, _scene: &mut Counter, _event: &InputEvent) {
            self.capturing = false;
            self.ends += 1;
        }

        fn force_end_capture(&mut self, _scene: &mut Counter, _event: &InputEvent) {
            self.capturing = false;
            self.force_ends += 1;
        }
    }

    impl Hoverable for MockElement {
        fn update_hover(&mut self, _ray: &Ray3, _hit: &UiRayHit) {
            self.hover_updates += 1;
        }

        fn end_hover(&mut self, _ray: &Ray3) {
            self.hover_ends += 1;
        }
    }

    /// Elements hit by rays pointing along +X (element 1) or +Y (element 2)
    #[derive(Default)]
    struct MockScene {
        elements: HashMap<UiElementId, MockElement>,
    }

    impl MockScene {
        fn with_elements() -> Self {
            let mut scene = Self::default();
            for id in [1, 2] {
                scene.elements.insert(
                    UiElementId(id),
                    MockElement {
                        accepts: true,
                        ..MockElement::default()
                    },
                );
            }
            scene
        }

        fn element(&self, id: u64) -> &MockElement {
            &self.elements[&UiElementId(id)]
        }
    }

    struct DirectionHits;

    impl UiHitQuery for DirectionHits {
        fn find_ui_hit(&self, ray: &Ray3) -> Option<UiRayHit> {
            let element = if ray.direction.dot(Vec3::X) > 0.9 {
                UiElementId(1)
            } else if ray.direction.dot(Vec3::Y) > 0.9 {
                UiElementId(2)
            } else {
                return None;
            };
            Some(UiRayHit {
                element,
                position: ray.point_at(1.0),
                distance: 1.0,
                part: 0,
            })
        }
    }

    impl UiElementHost<Counter> for MockScene {
        fn capturable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Capturable<Counter>> {
            self.elements
                .get_mut(&element)
                .map(|e| e as &mut dyn Capturable<Counter>)
        }

        fn hoverable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Hoverable> {
            self.elements.get_mut(&element).map(|e| e as &mut dyn Hoverable)
        }
    }

    fn pointing(left: Vec3, right: Vec3) -> InputSnapshot {
        let mut input = InputSnapshot::default();
        input.left.world_ray = Ray3::new(Vec3::ZERO, left);
        input.right.world_ray = Ray3::new(Vec3::ZERO, right);
        input.left.controller_active = true;
        input.right.controller_active = true;
        input
    }

    fn press(input: &mut InputSnapshot, side: CaptureSide) {
        let device = input.device_mut(side);
        device.trigger_pressed = true;
        device.trigger_down = true;
    }

    fn begin(
        router: &mut SpatialCaptureRouter,
        input: &InputSnapshot,
        scene: &mut MockScene,
        counter: &mut Counter,
    ) -> bool {
        match router.wants_capture(input, &DirectionHits, scene, counter) {
            CaptureRequest::Begin(side) => router.begin_capture(side, input, &DirectionHits, scene, counter),
            CaptureRequest::Ignore => false,
        }
    }

    #[test]
    fn test_single_trigger_begins_capture() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::NEG_Z, Vec3::X);
        press(&mut input, CaptureSide::Right);

        assert!(begin(&mut router, &input, &mut scene, &mut counter));
        assert_eq!(
            router.active_capture(),
            Some(ActiveCapture {
                side: CaptureSide::Right,
                element: UiElementId(1),
            })
        );
        assert!(scene.element(1).capturing);
    }

    #[test]
    fn test_both_triggers_are_ignored() {
        let router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let counter = Counter::default();
        let mut input = pointing(Vec3::X, Vec3::Y);
        press(&mut input, CaptureSide::Left);
        press(&mut input, CaptureSide::Right);

        assert_eq!(
            router.wants_capture(&input, &DirectionHits, &mut scene, &counter),
            CaptureRequest::Ignore
        );
    }

    #[test]
    fn test_miss_and_refusal_are_ignored() {
        let router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let counter = Counter::default();

        let mut input = pointing(Vec3::NEG_Z, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        assert_eq!(
            router.wants_capture(&input, &DirectionHits, &mut scene, &counter),
            CaptureRequest::Ignore
        );

        scene.elements.get_mut(&UiElementId(1)).unwrap().accepts = false;
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        assert_eq!(
            router.wants_capture(&input, &DirectionHits, &mut scene, &counter),
            CaptureRequest::Ignore
        );
    }

    #[test]
    fn test_capture_is_exclusive() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        assert!(begin(&mut router, &input, &mut scene, &mut counter));

        let mut second = pointing(Vec3::NEG_Z, Vec3::Y);
        press(&mut second, CaptureSide::Right);
        assert!(!begin(&mut router, &second, &mut scene, &mut counter));
        assert!(!scene.element(2).capturing);
    }

    #[test]
    fn test_update_until_release() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        begin(&mut router, &input, &mut scene, &mut counter);

        input.left.trigger_pressed = false;
        for _ in 0..3 {
            assert_eq!(
                router.update_capture(&input, &mut scene, &mut counter),
                CaptureStatus::Continue
            );
        }
        assert_eq!(counter.updates, 3);

        input.left.trigger_down = false;
        input.left.trigger_released = true;
        assert_eq!(router.update_capture(&input, &mut scene, &mut counter), CaptureStatus::End);
        assert_eq!(scene.element(1).ends, 1);
        assert!(!router.is_capturing());
    }

    #[test]
    fn test_lost_trigger_force_ends() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::NEG_Z, Vec3::Y);
        press(&mut input, CaptureSide::Right);
        begin(&mut router, &input, &mut scene, &mut counter);

        let idle = pointing(Vec3::NEG_Z, Vec3::Y);
        assert_eq!(router.update_capture(&idle, &mut scene, &mut counter), CaptureStatus::End);
        assert_eq!(scene.element(2).force_ends, 1);
        assert_eq!(counter.updates, 0);
    }

    #[test]
    fn test_force_end_capture() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        begin(&mut router, &input, &mut scene, &mut counter);

        router.force_end_capture(&input, &mut scene, &mut counter);
        router.force_end_capture(&input, &mut scene, &mut counter);
        assert_eq!(scene.element(1).force_ends, 1);
        assert!(!scene.element(1).capturing);
        assert_eq!(router.update_capture(&input, &mut scene, &mut counter), CaptureStatus::End);
    }

    #[test]
    fn test_removed_element_ends_capture() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut counter = Counter::default();
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        press(&mut input, CaptureSide::Left);
        begin(&mut router, &input, &mut scene, &mut counter);

        scene.elements.remove(&UiElementId(1));
        assert_eq!(router.update_capture(&input, &mut scene, &mut counter), CaptureStatus::End);
        assert!(!router.is_capturing());
    }

    #[test]
    fn test_hover_tracks_each_side() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();

        router.update_hover(&pointing(Vec3::X, Vec3::Y), &DirectionHits, &mut scene);
        assert_eq!(router.hovered(CaptureSide::Left), Some(UiElementId(1)));
        assert_eq!(router.hovered(CaptureSide::Right), Some(UiElementId(2)));

        // Left ray moves off everything
        router.update_hover(&pointing(Vec3::NEG_Z, Vec3::Y), &DirectionHits, &mut scene);
        assert_eq!(router.hovered(CaptureSide::Left), None);
        assert_eq!(scene.element(1).hover_ends, 1);
        assert_eq!(scene.element(2).hover_updates, 2);
    }

    #[test]
    fn test_shared_hover_ends_once() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();

        // Both rays on element 1: only one of them drives its hover
        router.update_hover(&pointing(Vec3::X, Vec3::X), &DirectionHits, &mut scene);
        assert_eq!(scene.element(1).hover_updates, 1);

        // Left leaves, right still hovers: no end-hover yet
        router.update_hover(&pointing(Vec3::NEG_Z, Vec3::X), &DirectionHits, &mut scene);
        assert_eq!(scene.element(1).hover_ends, 0);

        router.update_hover(&pointing(Vec3::NEG_Z, Vec3::NEG_Z), &DirectionHits, &mut scene);
        assert_eq!(scene.element(1).hover_ends, 1);
    }

    #[test]
    fn test_end_hover_clears_both_sides() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let input = pointing(Vec3::X, Vec3::X);
        router.update_hover(&input, &DirectionHits, &mut scene);

        router.end_hover(&input, &mut scene);
        assert_eq!(scene.element(1).hover_ends, 1);
        assert_eq!(router.hovered(CaptureSide::Left), None);
        assert_eq!(router.hovered(CaptureSide::Right), None);

        router.end_hover(&input, &mut scene);
        assert_eq!(scene.element(1).hover_ends, 1);
    }

    #[test]
    fn test_inactive_controller_does_not_hover() {
        let mut router = SpatialCaptureRouter::new();
        let mut scene = MockScene::with_elements();
        let mut input = pointing(Vec3::X, Vec3::NEG_Z);
        input.left.controller_active = false;

        router.update_hover(&input, &DirectionHits, &mut scene);
        assert_eq!(router.hovered(CaptureSide::Left), None);
        assert_eq!(scene.element(1).hover_updates, 0);
    }
}
