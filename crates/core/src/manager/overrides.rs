//! Bounded override stack.
//!
//! The stack stores the override value that was current before each push,
//! so pop restores it. An empty history means "no override".

use crate::error::TransformManagerError;

use super::GizmoTypeId;

#[derive(Debug, Clone)]
pub(crate) struct OverrideStack {
    current: Option<GizmoTypeId>,
    history: Vec<Option<GizmoTypeId>>,
    max_depth: usize,
}

impl OverrideStack {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            current: None,
            history: Vec::new(),
            max_depth,
        }
    }

    /// Override that takes precedence over filters and the default type
    pub(crate) fn current(&self) -> Option<&GizmoTypeId> {
        self.current.as_ref()
    }

    pub(crate) fn depth(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn push(&mut self, id: GizmoTypeId) -> Result<(), TransformManagerError> {
        if self.history.len() >= self.max_depth {
            return Err(TransformManagerError::OverrideStackOverflow {
                max: self.max_depth,
            });
        }
        self.history.push(self.current.replace(id));
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> Result<(), TransformManagerError> {
        let previous = self
            .history
            .pop()
            .ok_or(TransformManagerError::EmptyOverrideStack)?;
        self.current = previous;
        Ok(())
    }

    /// Unwind every push, restoring the value from before the first one
    pub(crate) fn pop_all(&mut self) {
        if let Some(first) = self.history.drain(..).next() {
            self.current = first;
        }
    }
}
