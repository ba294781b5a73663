//! Ordered type filters that redirect which gizmo type a selection gets.

use serde::{Deserialize, Serialize};

use super::GizmoTypeId;

/// Handle returned when a filter is added, used to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterId(u64);

/// Single selected object -> gizmo type
pub type ObjectTypeFilter<O> = dyn Fn(&O) -> Option<GizmoTypeId> + Send + Sync;

/// Whole target list -> gizmo type
pub type GroupTypeFilter<O> = dyn Fn(&[O]) -> Option<GizmoTypeId> + Send + Sync;

/// Predicate deciding which selected objects are gizmo targets at all
pub type SelectionFilter<O> = dyn Fn(&O) -> bool + Send + Sync;

/// Filters kept in registration order
pub(crate) struct FilterList<F: ?Sized> {
    next_id: u64,
    entries: Vec<(FilterId, Box<F>)>,
}

impl<F: ?Sized> FilterList<F> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, filter: Box<F>) -> FilterId {
        let id = FilterId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, filter));
        id
    }

    /// Returns false if the filter was already gone
    pub(crate) fn remove(&mut self, id: FilterId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &F> {
        self.entries.iter().map(|(_, filter)| filter.as_ref())
    }
}
