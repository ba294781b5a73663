//! Per-object memory of the user's explicit frame-mode choice.

use std::collections::HashMap;

use gimbal_protocol::FrameMode;

use crate::scene::SceneObject;

/// Mode a never-seen object starts in. Constant for now: the per-object
/// default is deliberately not derived from the manager-wide mode, which
/// also drives snapping behavior.
fn initial_frame_mode<O>(_object: &O) -> FrameMode {
    FrameMode::Local
}

#[derive(Debug)]
pub(crate) struct FrameModeCache<O: SceneObject> {
    modes: HashMap<O, FrameMode>,
}

impl<O: SceneObject> FrameModeCache<O> {
    pub(crate) fn new() -> Self {
        Self {
            modes: HashMap::new(),
        }
    }

    /// Cached mode for `object`, seeding (and caching) the initial mode on first use
    pub(crate) fn get_or_seed(&mut self, object: &O) -> FrameMode {
        *self
            .modes
            .entry(object.clone())
            .or_insert_with(|| initial_frame_mode(object))
    }

    pub(crate) fn get(&self, object: &O) -> Option<FrameMode> {
        self.modes.get(object).copied()
    }

    pub(crate) fn record(&mut self, object: O, mode: FrameMode) {
        self.modes.insert(object, mode);
    }

    pub(crate) fn forget(&mut self, object: &O) -> Option<FrameMode> {
        self.modes.remove(object)
    }

    pub(crate) fn clear(&mut self) {
        self.modes.clear();
    }
}
