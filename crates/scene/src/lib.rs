//! Bevy host for Gimbal
//!
//! This crate plugs the engine-agnostic transform manager into a Bevy app:
//! object selection, ring picking for the rotation gizmo, and the systems
//! that drive the manager and route spatial input each frame.

use bevy::prelude::*;
use gimbal_protocol::TransformEvent;

mod ring_raycast;
mod selection;
mod transform_manager;

pub use ring_raycast::{RingGeometry, RingHitQuery};
pub use selection::{Selectable, Selected, SelectionChanged, SelectionPlugin, SelectionRequest, SelectionState};
pub use transform_manager::{
    GizmoInteraction, GizmoManager, PendingManagerActions, SceneUiElements, SpatialInput,
    TransformManagerPlugin, TransformTools, frame_from_transform,
};

/// Resource for queuing messages to send to the UI
/// The embedding app should drain this and forward to its UI layer
#[derive(Resource, Default)]
pub struct OutboundUiMessages {
    pub messages: Vec<TransformEvent>,
}

impl OutboundUiMessages {
    /// Queue a message to be sent to the UI
    pub fn send(&mut self, msg: TransformEvent) {
        self.messages.push(msg);
    }

    /// Take all queued messages, leaving the queue empty
    pub fn drain(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.messages)
    }
}

/// Selection plus the transform manager with default configuration
pub struct GimbalPlugin;

impl Plugin for GimbalPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<OutboundUiMessages>();

        app.add_plugins(SelectionPlugin);
        app.add_plugins(TransformManagerPlugin::default());
    }
}
