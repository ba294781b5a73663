//! Host-side collaborators the transform manager talks to.
//!
//! The manager never owns the scene. Every call that needs it takes a
//! context implementing [`SceneHost`] (selection + UI-element collection)
//! and [`FrameScheduler`] (run-next-frame queue).

use std::collections::VecDeque;
use std::fmt::Debug;
use std::hash::Hash;

use crate::geometry::Frame3;
use crate::input::UiElementId;

/// Handle to a scene object. Cheap to clone, usable as a map key.
pub trait SceneObject: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> SceneObject for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Selection source and UI-element collection
pub trait SceneHost<O: SceneObject> {
    /// Currently selected objects, in selection order
    fn selected_objects(&self) -> Vec<O>;

    /// Attach a gizmo's element to the scene
    fn add_ui_element(&mut self, element: UiElementId);

    /// Detach (and destroy) an element
    fn remove_ui_element(&mut self, element: UiElementId);
}

/// Work the manager defers to the start of the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerAction {
    /// Dismiss the active gizmo and re-run the selection reaction
    RefreshGizmo,
    /// Build a gizmo for whatever is selected once the frame has settled
    BuildGizmoForSelection,
}

/// "Run this action next frame"
pub trait FrameScheduler {
    fn register_next_frame_action(&mut self, action: ManagerAction);
}

/// Everything a manager call may touch
pub trait ManagerContext<O: SceneObject>: SceneHost<O> + FrameScheduler {
    fn scene(&self) -> &dyn SceneHost<O>;
}

impl<O: SceneObject, T: SceneHost<O> + FrameScheduler> ManagerContext<O> for T {
    fn scene(&self) -> &dyn SceneHost<O> {
        self
    }
}

/// World-space frames of scene objects, for gizmos editing them during capture
pub trait FrameStore<O: SceneObject> {
    fn world_frame(&self, object: &O) -> Option<Frame3>;
    fn set_world_frame(&mut self, object: &O, frame: Frame3);
}

/// FIFO of next-frame actions owned by the host tick loop
#[derive(Debug, Default)]
pub struct NextFrameActions {
    queue: VecDeque<ManagerAction>,
}

impl NextFrameActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take all queued actions in registration order, leaving the queue empty.
    /// Actions registered while the drained batch runs land in the next batch.
    pub fn drain(&mut self) -> Vec<ManagerAction> {
        self.queue.drain(..).collect()
    }
}

impl FrameScheduler for NextFrameActions {
    fn register_next_frame_action(&mut self, action: ManagerAction) {
        self.queue.push_back(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_frame_actions_fifo() {
        let mut actions = NextFrameActions::new();
        actions.register_next_frame_action(ManagerAction::RefreshGizmo);
        actions.register_next_frame_action(ManagerAction::BuildGizmoForSelection);
        assert_eq!(actions.len(), 2);

        let drained = actions.drain();
        assert_eq!(
            drained,
            vec![ManagerAction::RefreshGizmo, ManagerAction::BuildGizmoForSelection]
        );
        assert!(actions.is_empty());
    }
}
