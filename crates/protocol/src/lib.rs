//! Message protocol for Gimbal
//!
//! Defines the small set of types shared between the transform manipulation
//! core, its host engine, and any UI that mirrors gizmo state.

pub mod error;
pub mod messages;
pub mod types;

pub use error::ProtocolError;
pub use messages::TransformEvent;
pub use types::{CaptureSide, FrameMode};
