//! Gizmo type identifiers, the builder/gizmo traits, and the type registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gimbal_protocol::FrameMode;
use serde::{Deserialize, Serialize};

use crate::capture::{Capturable, Hoverable};
use crate::error::TransformManagerError;
use crate::geometry::Frame3;
use crate::input::UiElementId;
use crate::scene::{FrameStore, SceneHost, SceneObject};

/// Name a gizmo builder is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GizmoTypeId(String);

impl GizmoTypeId {
    /// Built-in type whose builder never produces a gizmo
    pub const NO_GIZMO: &'static str = "no_gizmo";
    /// Built-in type bound to the manager's constructor builder
    pub const DEFAULT: &'static str = "default";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn no_gizmo() -> Self {
        Self::new(Self::NO_GIZMO)
    }

    pub fn default_type() -> Self {
        Self::new(Self::DEFAULT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GizmoTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GizmoTypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GizmoTypeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A 3D manipulation widget bound to a set of scene objects.
///
/// Capabilities beyond the target list are opt-in: the defaults describe a
/// gizmo with no frame mode, no reference object, and no input handling.
pub trait TransformGizmo<O: SceneObject>: Send + Sync {
    /// Element id the gizmo is attached to the scene under
    fn element_id(&self) -> UiElementId;

    /// Objects this gizmo edits. Order carries no meaning.
    fn targets(&self) -> &[O];

    fn supports_frame_mode(&self) -> bool {
        false
    }

    fn frame_mode(&self) -> FrameMode {
        FrameMode::default()
    }

    fn set_frame_mode(&mut self, _mode: FrameMode) {}

    fn supports_reference_object(&self) -> bool {
        false
    }

    fn set_reference_object(&mut self, _object: O) {}

    /// World frame whose axes the gizmo's handles are laid out on. Hosts place
    /// hit geometry with it, so picking agrees with the axes the drag uses.
    fn axes_frame(&self, _store: &dyn FrameStore<O>) -> Option<Frame3> {
        None
    }

    /// Capture capability, if the gizmo takes input
    fn as_capturable(&mut self) -> Option<&mut dyn Capturable<dyn FrameStore<O>>> {
        None
    }

    /// Hover capability
    fn as_hoverable(&mut self) -> Option<&mut dyn Hoverable> {
        None
    }

    /// Called once when the gizmo is detached from the scene
    fn disconnect(&mut self) {}
}

/// Factory for one gizmo type
pub trait GizmoBuilder<O: SceneObject>: Send + Sync {
    fn supports_multiple_objects(&self) -> bool;

    /// Build a gizmo for `targets`, or `None` for "no gizmo for this selection"
    fn build(&self, scene: &dyn SceneHost<O>, targets: &[O]) -> Option<Box<dyn TransformGizmo<O>>>;
}

/// Builder behind [`GizmoTypeId::NO_GIZMO`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGizmoBuilder;

impl<O: SceneObject> GizmoBuilder<O> for NoGizmoBuilder {
    fn supports_multiple_objects(&self) -> bool {
        true
    }

    fn build(&self, _scene: &dyn SceneHost<O>, _targets: &[O]) -> Option<Box<dyn TransformGizmo<O>>> {
        None
    }
}

/// Key-unique mapping from type id to builder
pub(crate) struct BuilderRegistry<O: SceneObject> {
    builders: HashMap<GizmoTypeId, Arc<dyn GizmoBuilder<O>>>,
}

impl<O: SceneObject> BuilderRegistry<O> {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Registry holding the two reserved types
    pub(crate) fn with_builtins(default_builder: Arc<dyn GizmoBuilder<O>>) -> Self {
        let mut builders: HashMap<GizmoTypeId, Arc<dyn GizmoBuilder<O>>> = HashMap::new();
        builders.insert(GizmoTypeId::no_gizmo(), Arc::new(NoGizmoBuilder));
        builders.insert(GizmoTypeId::default_type(), default_builder);
        Self { builders }
    }

    pub(crate) fn register(
        &mut self,
        id: GizmoTypeId,
        builder: Arc<dyn GizmoBuilder<O>>,
    ) -> Result<(), TransformManagerError> {
        if self.builders.contains_key(&id) {
            return Err(TransformManagerError::DuplicateType(id));
        }
        self.builders.insert(id, builder);
        Ok(())
    }

    pub(crate) fn get(&self, id: &GizmoTypeId) -> Option<&Arc<dyn GizmoBuilder<O>>> {
        self.builders.get(id)
    }

    pub(crate) fn contains(&self, id: &GizmoTypeId) -> bool {
        self.builders.contains_key(id)
    }

    /// Look up a type that must exist, for the error path of public calls
    pub(crate) fn require(&self, id: &GizmoTypeId) -> Result<&Arc<dyn GizmoBuilder<O>>, TransformManagerError> {
        self.builders
            .get(id)
            .ok_or_else(|| TransformManagerError::UnknownType(id.clone()))
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = &GizmoTypeId> {
        self.builders.keys()
    }
}
