//! Plain enums shared by every Gimbal crate.

use serde::{Deserialize, Serialize};

/// Frame of reference a transform gizmo operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMode {
    /// Object-local frame (axes rotate with the object)
    #[default]
    Local,
    /// World frame
    World,
}

impl FrameMode {
    /// The other mode, for UI toggles
    pub fn toggled(self) -> Self {
        match self {
            FrameMode::Local => FrameMode::World,
            FrameMode::World => FrameMode::Local,
        }
    }
}

/// Which hand / device side owns a capture or hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSide {
    Left,
    Right,
}

impl CaptureSide {
    pub fn other(self) -> Self {
        match self {
            CaptureSide::Left => CaptureSide::Right,
            CaptureSide::Right => CaptureSide::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_mode_default_is_local() {
        assert_eq!(FrameMode::default(), FrameMode::Local);
    }

    #[test]
    fn test_frame_mode_toggle() {
        assert_eq!(FrameMode::Local.toggled(), FrameMode::World);
        assert_eq!(FrameMode::World.toggled().toggled(), FrameMode::World);
    }

    #[test]
    fn test_capture_side_other() {
        assert_eq!(CaptureSide::Left.other(), CaptureSide::Right);
        assert_eq!(CaptureSide::Right.other(), CaptureSide::Left);
    }
}
