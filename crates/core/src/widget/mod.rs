//! Interactive sub-widgets that gizmos are assembled from.

mod trackball;

pub use trackball::{AxisTrackballWidget, trackball_rotation};

use crate::geometry::Frame3;

/// Something with a world-space frame a widget can read and write
pub trait Transformable {
    fn world_frame(&self) -> Frame3;
    fn set_world_frame(&mut self, frame: Frame3);
}

/// Owned stand-in for a scene object during a single widget call.
///
/// Gizmos copy the object's frame in, let the widget edit it, then push the
/// written frame back to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTarget {
    frame: Frame3,
    written: bool,
}

impl FrameTarget {
    pub fn new(frame: Frame3) -> Self {
        Self {
            frame,
            written: false,
        }
    }

    /// The frame written by the widget, if any
    pub fn written(&self) -> Option<Frame3> {
        self.written.then_some(self.frame)
    }
}

impl Transformable for FrameTarget {
    fn world_frame(&self) -> Frame3 {
        self.frame
    }

    fn set_world_frame(&mut self, frame: Frame3) {
        self.frame = frame;
        self.written = true;
    }
}
