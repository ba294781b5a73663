//! Bevy host for the transform manager
//!
//! Owns a [`TransformManager`] keyed by [`Entity`] and wires it into the
//! schedule:
//!
//! - `PreUpdate` runs the manager's next-frame actions queued last tick
//! - `Update` reacts to [`SelectionChanged`], routes [`SpatialInput`] into
//!   the active gizmo, then forwards manager events to [`OutboundUiMessages`]
//!
//! Tools talk to the manager through the [`TransformTools`] system param,
//! which supplies the scene context every manager call needs.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use gimbal_config::ManipulationConfig;
use gimbal_core::{
    CaptureRequest, FrameScheduler, FrameStore, GizmoTypeId, InputSnapshot, ManagerAction,
    NextFrameActions, RotationGizmoBuilder, SceneHost, SpatialCaptureRouter, TransformManager,
    TransformManagerError, UiElementId,
};

use crate::OutboundUiMessages;
use crate::ring_raycast::{RingGeometry, RingHitQuery};
use crate::selection::{Selectable, SelectionChanged, SelectionPlugin, SelectionState, apply_selection_requests};

/// The scene's transform manager
#[derive(Resource, Deref, DerefMut)]
pub struct GizmoManager(pub TransformManager<Entity>);

/// Manager actions waiting for the next `PreUpdate`
#[derive(Resource, Default, Debug, Deref, DerefMut)]
pub struct PendingManagerActions(pub NextFrameActions);

/// UI elements currently attached to the scene
#[derive(Resource, Default, Debug)]
pub struct SceneUiElements {
    pub elements: Vec<UiElementId>,
}

/// Spatial device state for this frame, written by the input layer
#[derive(Resource, Default, Debug, Clone, Copy, Deref, DerefMut)]
pub struct SpatialInput(pub InputSnapshot);

/// Capture and hover state of spatial input against gizmos
#[derive(Resource, Default, Debug)]
pub struct GizmoInteraction {
    pub router: SpatialCaptureRouter,
}

/// Plugin hosting the transform manager
#[derive(Default)]
pub struct TransformManagerPlugin {
    pub config: ManipulationConfig,
}

impl Plugin for TransformManagerPlugin {
    fn build(&self, app: &mut App) {
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(e) => {
                warn!("TransformManagerPlugin: {}, falling back to defaults", e);
                ManipulationConfig::default()
            }
        };

        if !app.is_plugin_added::<SelectionPlugin>() {
            app.add_plugins(SelectionPlugin);
        }

        let builder = Arc::new(RotationGizmoBuilder::new(config.trackball.clone()));
        let geometry = RingGeometry {
            ring_radius: config.trackball.gizmo_radius,
            ..default()
        };
        let manager = TransformManager::with_config(builder, &config);

        app.insert_resource(config)
            .insert_resource(GizmoManager(manager))
            .insert_resource(geometry)
            .init_resource::<PendingManagerActions>()
            .init_resource::<SceneUiElements>()
            .init_resource::<SpatialInput>()
            .init_resource::<GizmoInteraction>()
            .init_resource::<OutboundUiMessages>()
            .add_systems(PreUpdate, run_next_frame_actions)
            .add_systems(
                Update,
                (
                    react_to_selection_changes.after(apply_selection_requests),
                    route_spatial_input,
                    forward_transform_events,
                )
                    .chain(),
            );
    }
}

/// Scene context handed to manager calls
struct HostContext<'a> {
    selection: &'a SelectionState,
    elements: &'a mut SceneUiElements,
    actions: &'a mut NextFrameActions,
}

impl SceneHost<Entity> for HostContext<'_> {
    fn selected_objects(&self) -> Vec<Entity> {
        self.selection.selected.clone()
    }

    fn add_ui_element(&mut self, element: UiElementId) {
        if !self.elements.elements.contains(&element) {
            self.elements.elements.push(element);
        }
    }

    fn remove_ui_element(&mut self, element: UiElementId) {
        self.elements.elements.retain(|e| *e != element);
    }
}

impl FrameScheduler for HostContext<'_> {
    fn register_next_frame_action(&mut self, action: ManagerAction) {
        self.actions.register_next_frame_action(action);
    }
}

/// Access to the transform manager for tools and UI handlers
#[derive(SystemParam)]
pub struct TransformTools<'w> {
    manager: ResMut<'w, GizmoManager>,
    pending: ResMut<'w, PendingManagerActions>,
    elements: ResMut<'w, SceneUiElements>,
    selection: Res<'w, SelectionState>,
}

impl TransformTools<'_> {
    fn split(&mut self) -> (&mut TransformManager<Entity>, HostContext<'_>) {
        (
            &mut self.manager.0,
            HostContext {
                selection: &self.selection,
                elements: &mut self.elements,
                actions: &mut self.pending.0,
            },
        )
    }

    pub fn manager(&self) -> &TransformManager<Entity> {
        &self.manager.0
    }

    pub fn manager_mut(&mut self) -> &mut TransformManager<Entity> {
        &mut self.manager.0
    }

    pub fn set_active_type(&mut self, id: impl Into<GizmoTypeId>) -> Result<(), TransformManagerError> {
        let (manager, mut ctx) = self.split();
        manager.set_active_type(id, &mut ctx)
    }

    pub fn push_override(&mut self, id: impl Into<GizmoTypeId>) -> Result<(), TransformManagerError> {
        let (manager, mut ctx) = self.split();
        manager.push_override(id, &mut ctx)
    }

    pub fn pop_override(&mut self) -> Result<(), TransformManagerError> {
        let (manager, mut ctx) = self.split();
        manager.pop_override(&mut ctx)
    }

    pub fn pop_all_overrides(&mut self) {
        let (manager, mut ctx) = self.split();
        manager.pop_all_overrides(&mut ctx);
    }

    /// Flip the active gizmo between world and local axes
    pub fn toggle_frame_mode(&mut self) {
        let mode = self.manager.active_frame_mode().toggled();
        self.manager.set_active_frame_mode(mode);
    }

    pub fn dismiss_active_gizmo(&mut self) {
        let (manager, mut ctx) = self.split();
        manager.dismiss_active_gizmo(&mut ctx);
    }

    pub fn handle_selection_changed(&mut self) {
        let (manager, mut ctx) = self.split();
        manager.handle_selection_changed(&mut ctx);
    }

    /// Run the batch queued before this call. Actions registered while it
    /// runs wait for the next call.
    pub fn run_pending_actions(&mut self) {
        let batch = self.pending.drain();
        for action in batch {
            let (manager, mut ctx) = self.split();
            manager.run_next_frame_action(action, &mut ctx);
        }
    }
}

/// Frames of selectable objects, snapshotted for one routing pass
#[derive(Default)]
struct ObjectFrames {
    frames: HashMap<Entity, gimbal_core::Frame3>,
    dirty: Vec<Entity>,
}

impl FrameStore<Entity> for ObjectFrames {
    fn world_frame(&self, object: &Entity) -> Option<gimbal_core::Frame3> {
        self.frames.get(object).copied()
    }

    fn set_world_frame(&mut self, object: &Entity, frame: gimbal_core::Frame3) {
        if !self.frames.contains_key(object) {
            return;
        }
        self.frames.insert(*object, frame);
        if !self.dirty.contains(object) {
            self.dirty.push(*object);
        }
    }
}

/// Convert a Bevy transform into a manipulation frame (scale is not part of it)
pub fn frame_from_transform(transform: &Transform) -> gimbal_core::Frame3 {
    gimbal_core::Frame3::new(
        glam::Vec3::from_array(transform.translation.to_array()),
        glam::Quat::from_array(transform.rotation.to_array()),
    )
}

fn apply_frame(transform: &mut Transform, frame: &gimbal_core::Frame3) {
    transform.translation = Vec3::from_array(frame.origin.to_array());
    transform.rotation = Quat::from_array(frame.rotation.to_array());
}

fn run_next_frame_actions(mut tools: TransformTools) {
    if tools.pending.is_empty() {
        return;
    }
    tools.run_pending_actions();
}

fn react_to_selection_changes(mut changes: MessageReader<SelectionChanged>, mut tools: TransformTools) {
    // Several changes in one frame need one reaction
    if changes.read().count() == 0 {
        return;
    }
    tools.handle_selection_changed();
}

/// Feed this frame's spatial input to the capture router
fn route_spatial_input(
    input: Res<SpatialInput>,
    geometry: Res<RingGeometry>,
    mut interaction: ResMut<GizmoInteraction>,
    mut manager: ResMut<GizmoManager>,
    mut objects: Query<(Entity, &mut Transform), With<Selectable>>,
) {
    let router = &mut interaction.router;
    if !manager.has_active_gizmo() && !router.is_capturing() {
        return;
    }

    let mut frames = ObjectFrames::default();
    for (entity, transform) in objects.iter() {
        frames.frames.insert(entity, frame_from_transform(transform));
    }

    let hits = manager.active_gizmo().and_then(|gizmo| {
        let axes = gizmo.axes_frame(&frames)?;
        Some(RingHitQuery::new(gizmo.element_id(), axes, &geometry))
    });

    let input = &input.0;
    let elements = &mut manager.0;
    if router.is_capturing() {
        router.update_capture::<dyn FrameStore<Entity>>(input, elements, &mut frames);
    } else {
        router.update_hover::<dyn FrameStore<Entity>>(input, &hits, elements);
        if let CaptureRequest::Begin(side) =
            router.wants_capture::<dyn FrameStore<Entity>>(input, &hits, elements, &frames)
        {
            router.begin_capture::<dyn FrameStore<Entity>>(side, input, &hits, elements, &mut frames);
        }
    }

    for entity in &frames.dirty {
        if let (Some(frame), Ok((_, mut transform))) = (frames.frames.get(entity), objects.get_mut(*entity)) {
            apply_frame(&mut transform, frame);
        }
    }
}

fn forward_transform_events(mut manager: ResMut<GizmoManager>, mut outbound: ResMut<OutboundUiMessages>) {
    for event in manager.drain_events() {
        outbound.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionRequest;
    use bevy::ecs::system::RunSystemOnce;
    use gimbal_core::{Ray3, SpatialDeviceState};
    use gimbal_protocol::FrameMode;
    use gimbal_protocol::TransformEvent;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(TransformManagerPlugin::default());
        app
    }

    fn spawn_object(app: &mut App, id: &str) -> Entity {
        app.world_mut()
            .spawn((Selectable { id: id.to_string() }, Transform::default()))
            .id()
    }

    fn select(app: &mut App, entity: Entity) {
        app.world_mut()
            .write_message(SelectionRequest::Select { entity, additive: false });
        // Selection reaction this frame, gizmo build next frame
        app.update();
        app.update();
    }

    fn outbound(app: &mut App) -> Vec<TransformEvent> {
        app.world_mut().resource_mut::<OutboundUiMessages>().drain()
    }

    fn device(origin: glam::Vec3, pressed: bool, down: bool, released: bool) -> SpatialDeviceState {
        SpatialDeviceState {
            trigger_pressed: pressed,
            trigger_released: released,
            trigger_down: down,
            controller_active: true,
            world_ray: Ray3::new(origin, glam::Vec3::NEG_X),
        }
    }

    fn set_left(app: &mut App, state: SpatialDeviceState) {
        app.world_mut().resource_mut::<SpatialInput>().left = state;
    }

    #[test]
    fn test_selecting_object_attaches_gizmo() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");

        select(&mut app, cube);

        let manager = app.world().resource::<GizmoManager>();
        let gizmo = manager.active_gizmo().unwrap();
        assert_eq!(gizmo.targets(), &[cube]);
        let elements = &app.world().resource::<SceneUiElements>().elements;
        assert_eq!(elements, &vec![gizmo.element_id()]);

        let events = outbound(&mut app);
        assert!(matches!(
            events.as_slice(),
            [TransformEvent::GizmoAttached { target_count: 1, .. }]
        ));
    }

    #[test]
    fn test_clearing_selection_dismisses_gizmo() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        select(&mut app, cube);
        outbound(&mut app);

        app.world_mut().write_message(SelectionRequest::Clear);
        app.update();

        assert!(!app.world().resource::<GizmoManager>().has_active_gizmo());
        assert!(app.world().resource::<SceneUiElements>().elements.is_empty());
        assert!(matches!(
            outbound(&mut app).as_slice(),
            [TransformEvent::GizmoDismissed { .. }]
        ));
    }

    #[test]
    fn test_no_gizmo_override_hides_gizmo() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        select(&mut app, cube);

        app.world_mut()
            .run_system_once(|mut tools: TransformTools| tools.push_override(GizmoTypeId::NO_GIZMO))
            .unwrap()
            .unwrap();
        app.update();
        app.update();
        assert!(!app.world().resource::<GizmoManager>().has_active_gizmo());

        app.world_mut()
            .run_system_once(|mut tools: TransformTools| tools.pop_override())
            .unwrap()
            .unwrap();
        app.update();
        app.update();
        assert!(app.world().resource::<GizmoManager>().has_active_gizmo());
    }

    #[test]
    fn test_toggle_frame_mode_reports_change() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        select(&mut app, cube);
        outbound(&mut app);

        app.world_mut()
            .run_system_once(|mut tools: TransformTools| tools.toggle_frame_mode())
            .unwrap();
        app.update();

        // Fresh objects start in local mode
        let manager = app.world().resource::<GizmoManager>();
        assert_eq!(manager.active_frame_mode(), FrameMode::World);
        assert_eq!(manager.cached_frame_mode(&cube), Some(FrameMode::World));
        assert_eq!(
            outbound(&mut app),
            vec![TransformEvent::FrameModeChanged { mode: FrameMode::World }]
        );
    }

    #[test]
    fn test_ring_drag_rotates_selected_object() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        select(&mut app, cube);

        // Grab the Z ring from the +X side, sweep across to the other side
        set_left(&mut app, device(glam::Vec3::new(5.0, -0.6, 0.0), true, true, false));
        app.update();
        assert!(app.world().resource::<GizmoInteraction>().router.is_capturing());

        set_left(&mut app, device(glam::Vec3::new(5.0, 0.6, 0.0), false, true, false));
        app.update();

        let rotation = app.world().get::<Transform>(cube).unwrap().rotation;
        let expected = glam::Quat::from_rotation_z(2.0 * 0.75f32.atan());
        assert!(
            glam::Quat::from_array(rotation.to_array()).angle_between(expected) < 1e-3,
            "got {:?}",
            rotation
        );

        set_left(&mut app, device(glam::Vec3::new(5.0, 0.6, 0.0), false, false, true));
        app.update();
        assert!(!app.world().resource::<GizmoInteraction>().router.is_capturing());
    }

    #[test]
    fn test_rings_follow_reference_object_axes() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        // Reference X axis points along world -Z, so its ring 0 lies in the XY plane
        let reference = app
            .world_mut()
            .spawn((
                Selectable {
                    id: "reference".to_string(),
                },
                Transform::from_xyz(0.0, 10.0, 0.0).with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
            ))
            .id();
        select(&mut app, cube);
        app.world_mut()
            .resource_mut::<GizmoManager>()
            .set_active_reference_object(reference);

        set_left(&mut app, device(glam::Vec3::new(5.0, -0.6, 0.0), true, true, false));
        app.update();
        set_left(&mut app, device(glam::Vec3::new(5.0, 0.6, 0.0), false, true, false));
        app.update();

        // Picked and dragged the same ring: a turn about world Z, not world X
        let rotation = glam::Quat::from_array(app.world().get::<Transform>(cube).unwrap().rotation.to_array());
        let expected = glam::Quat::from_rotation_z(2.0 * 0.75f32.atan());
        assert!(rotation.angle_between(expected) < 1e-3, "got {:?}", rotation);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let mut app = App::new();
        app.add_plugins(TransformManagerPlugin {
            config: ManipulationConfig {
                max_override_depth: 0,
                ..default()
            },
        });

        assert_eq!(app.world().resource::<ManipulationConfig>(), &ManipulationConfig::default());
        app.world_mut()
            .run_system_once(|mut tools: TransformTools| tools.push_override(GizmoTypeId::NO_GIZMO))
            .unwrap()
            .unwrap();
        assert_eq!(app.world().resource::<GizmoManager>().override_depth(), 1);
    }

    #[test]
    fn test_missed_press_leaves_object_alone() {
        let mut app = app();
        let cube = spawn_object(&mut app, "cube");
        select(&mut app, cube);

        set_left(&mut app, device(glam::Vec3::new(5.0, 3.0, 0.0), true, true, false));
        app.update();

        assert!(!app.world().resource::<GizmoInteraction>().router.is_capturing());
        assert_eq!(app.world().get::<Transform>(cube).unwrap(), &Transform::default());
    }
}
