//! Outbound notifications raised by the transform manager.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::FrameMode;

/// Events emitted whenever the active gizmo changes.
///
/// Hosts drain these once per frame and forward them to whatever UI mirrors
/// the gizmo toolbar (frame-mode toggle, active tool indicator, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransformEvent {
    /// A gizmo was built and attached to the scene
    GizmoAttached {
        gizmo_type: String,
        element_id: u64,
        target_count: usize,
    },

    /// The active gizmo was detached
    GizmoDismissed { element_id: u64 },

    /// The active frame mode changed (on the gizmo or the manager default)
    FrameModeChanged { mode: FrameMode },
}

impl TransformEvent {
    /// Encode as a JSON string for a webview or log sink
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::InvalidFormat(e.to_string()))
    }
}
