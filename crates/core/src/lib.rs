//! Gimbal core - engine-agnostic transform manipulation
//!
//! This crate decides which gizmo a selection gets and routes input into it:
//! - [`manager`] - gizmo type registry, override stack, filters and the active gizmo
//! - [`capture`] - begin/update/end capture handshake and hover notifications
//! - [`router`] - two-ray spatial input router driving the capture handshake
//! - [`widget`] - axis trackball rotation widget
//! - [`gizmos`] - concrete gizmos assembled from widgets
//! - [`scene`] - traits the host scene implements, and the next-frame queue
//! - [`geometry`] - rays, frames and intersection math

pub mod capture;
pub mod error;
pub mod geometry;
pub mod gizmos;
pub mod input;
pub mod manager;
pub mod router;
pub mod scene;
pub mod widget;

pub use capture::*;
pub use error::*;
pub use geometry::*;
pub use gizmos::*;
pub use input::*;
pub use manager::*;
pub use router::*;
pub use scene::*;
pub use widget::*;
