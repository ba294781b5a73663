//! Concrete gizmos built from the widgets in [`crate::widget`].

mod rotation;

pub use rotation::{RotationGizmo, RotationGizmoBuilder};
