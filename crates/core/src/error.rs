//! Error types for the transform manager.

use crate::manager::GizmoTypeId;

/// Programmer-misuse signals raised by gizmo registration and override calls.
///
/// These are never transient: the calling tool is wrong and should be fixed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformManagerError {
    #[error("Gizmo type '{0}' is already registered")]
    DuplicateType(GizmoTypeId),
    #[error("Gizmo type '{0}' is not registered")]
    UnknownType(GizmoTypeId),
    #[error("Override gizmo stack exceeded {max} entries, probably a missing pop")]
    OverrideStackOverflow { max: usize },
    #[error("Tried to pop an empty override gizmo stack")]
    EmptyOverrideStack,
}
