//! Shared configuration for Gimbal
//!
//! This crate provides the single source of truth for the transform manager's
//! policy knobs and the trackball widget's geometry, shared by the
//! engine-agnostic core and the Bevy host.

use gimbal_protocol::FrameMode;
use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Maximum nesting of override gizmo pushes before we assume a missing pop
pub const DEFAULT_MAX_OVERRIDE_DEPTH: usize = 10;

/// Radius of the virtual trackball sphere in world units
pub const DEFAULT_GIZMO_RADIUS: f32 = 1.0;

/// Rotation speed multiplier (1.0 = drag point follows the cursor exactly)
pub const DEFAULT_ROTATE_SPEED: f32 = 1.0;

/// Angle between rotation axis and eye direction past which a ring is hidden
pub const DEFAULT_VISIBILITY_ANGLE_DEGREES: f32 = 85.0;

/// Frame axis whose perpendicular plane catches rays that miss the trackball
pub const DEFAULT_FALLBACK_PLANE_AXIS: usize = 2;

/// Errors raised when loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Trackball rotation widget tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackballConfig {
    /// Radius of the sphere the drag point is projected onto
    pub gizmo_radius: f32,
    /// Multiplier applied to the angular displacement of each drag
    pub rotate_speed: f32,
    /// Rings whose axis is within `90 - angle` degrees of the eye direction are hidden
    pub visibility_angle_degrees: f32,
    /// Axis index (0..3) of the fallback plane normal
    pub fallback_plane_axis: usize,
}

impl Default for TrackballConfig {
    fn default() -> Self {
        Self {
            gizmo_radius: DEFAULT_GIZMO_RADIUS,
            rotate_speed: DEFAULT_ROTATE_SPEED,
            visibility_angle_degrees: DEFAULT_VISIBILITY_ANGLE_DEGREES,
            fallback_plane_axis: DEFAULT_FALLBACK_PLANE_AXIS,
        }
    }
}

impl TrackballConfig {
    /// Cosine threshold used by the ring visibility test
    pub fn visibility_threshold(&self) -> f32 {
        self.visibility_angle_degrees.to_radians().cos()
    }
}

/// Transform manager policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct ManipulationConfig {
    /// Frame mode used by multi-object gizmos and when no gizmo is active
    pub default_frame_mode: FrameMode,
    /// Bound on nested override pushes
    pub max_override_depth: usize,
    pub trackball: TrackballConfig,
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            default_frame_mode: FrameMode::Local,
            max_override_depth: DEFAULT_MAX_OVERRIDE_DEPTH,
            trackball: TrackballConfig::default(),
        }
    }
}

impl ManipulationConfig {
    /// Parse from JSON, filling missing fields with defaults, then validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_override_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_override_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        let trackball = &self.trackball;
        if !(trackball.gizmo_radius > 0.0) {
            return Err(ConfigError::Invalid {
                field: "trackball.gizmo_radius",
                reason: format!("must be positive, got {}", trackball.gizmo_radius),
            });
        }
        if !(trackball.rotate_speed > 0.0) {
            return Err(ConfigError::Invalid {
                field: "trackball.rotate_speed",
                reason: format!("must be positive, got {}", trackball.rotate_speed),
            });
        }
        if !(0.0..=90.0).contains(&trackball.visibility_angle_degrees) {
            return Err(ConfigError::Invalid {
                field: "trackball.visibility_angle_degrees",
                reason: format!("must be in 0..=90, got {}", trackball.visibility_angle_degrees),
            });
        }
        if trackball.fallback_plane_axis > 2 {
            return Err(ConfigError::Invalid {
                field: "trackball.fallback_plane_axis",
                reason: format!("must be 0, 1 or 2, got {}", trackball.fallback_plane_axis),
            });
        }
        Ok(())
    }
}
