//! Object selection state
//!
//! Selection is driven by [`SelectionRequest`] messages (from picking, the
//! outliner, or tools). Every change is announced with a single
//! [`SelectionChanged`] message per frame, which the transform manager reacts to.

use bevy::ecs::message::Message;
use bevy::prelude::*;

/// Marker component for selectable objects
#[derive(Component, Debug, Clone)]
pub struct Selectable {
    /// Unique identifier for this object
    pub id: String,
}

/// Marker component for currently selected objects
#[derive(Component)]
pub struct Selected;

/// Resource tracking current selection
#[derive(Resource, Default, Debug)]
pub struct SelectionState {
    /// Currently selected entities, in selection order
    pub selected: Vec<Entity>,
}

impl SelectionState {
    pub fn is_selected(&self, entity: Entity) -> bool {
        self.selected.contains(&entity)
    }

    /// Ids of the selected objects, in selection order
    pub fn selected_ids(&self, selectable: &Query<&Selectable>) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|e| selectable.get(*e).ok())
            .map(|object| object.id.clone())
            .collect()
    }
}

/// Requests to change the selection
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRequest {
    /// Select an entity. With `additive`, toggles it in the current
    /// selection (shift-click); otherwise replaces the selection.
    Select { entity: Entity, additive: bool },
    /// Remove one entity from the selection
    Deselect(Entity),
    /// Deselect everything
    Clear,
}

/// Sent once per frame in which the selection changed
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct SelectionChanged;

/// Plugin for object selection
pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectionState>()
            .add_message::<SelectionRequest>()
            .add_message::<SelectionChanged>()
            .add_systems(Update, apply_selection_requests);
    }
}

/// Apply queued selection requests and announce the change
pub(crate) fn apply_selection_requests(
    mut commands: Commands,
    mut selection: ResMut<SelectionState>,
    mut requests: MessageReader<SelectionRequest>,
    mut changed: MessageWriter<SelectionChanged>,
    selectable: Query<&Selectable>,
) {
    let before = selection.selected.clone();

    for request in requests.read() {
        match *request {
            SelectionRequest::Select { entity, additive } => {
                let Ok(object) = selectable.get(entity) else {
                    debug!("Selection: ignoring non-selectable {:?}", entity);
                    continue;
                };
                debug!("Selection: select '{}' (additive: {})", object.id, additive);
                let already_selected = selection.is_selected(entity);
                if additive {
                    // Toggle selection
                    if already_selected {
                        selection.selected.retain(|e| *e != entity);
                    } else {
                        selection.selected.push(entity);
                    }
                } else {
                    selection.selected.clear();
                    selection.selected.push(entity);
                }
            }
            SelectionRequest::Deselect(entity) => {
                selection.selected.retain(|e| *e != entity);
            }
            SelectionRequest::Clear => {
                selection.selected.clear();
            }
        }
    }

    if selection.selected == before {
        return;
    }

    // Keep Selected markers in sync
    for entity in before.iter().filter(|e| !selection.selected.contains(*e)) {
        if let Ok(mut entity_commands) = commands.get_entity(*entity) {
            entity_commands.remove::<Selected>();
        }
    }
    for entity in selection.selected.iter().filter(|e| !before.contains(*e)) {
        commands.entity(*entity).insert(Selected);
    }

    let ids = selection.selected_ids(&selectable);
    info!("Selection: {} object(s) selected {:?}", ids.len(), ids);
    changed.write(SelectionChanged);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::RunSystemOnce;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(SelectionPlugin);
        app
    }

    fn spawn_selectable(app: &mut App, id: &str) -> Entity {
        app.world_mut()
            .spawn(Selectable { id: id.to_string() })
            .id()
    }

    fn changes(app: &App) -> usize {
        app.world().resource::<Messages<SelectionChanged>>().len()
    }

    #[test]
    fn test_select_replaces_selection() {
        let mut app = app();
        let a = spawn_selectable(&mut app, "a");
        let b = spawn_selectable(&mut app, "b");

        app.world_mut().write_message(SelectionRequest::Select { entity: a, additive: false });
        app.update();
        app.world_mut().write_message(SelectionRequest::Select { entity: b, additive: false });
        app.update();

        assert_eq!(app.world().resource::<SelectionState>().selected, vec![b]);
        assert!(app.world().get::<Selected>(a).is_none());
        assert!(app.world().get::<Selected>(b).is_some());
    }

    #[test]
    fn test_additive_select_toggles() {
        let mut app = app();
        let a = spawn_selectable(&mut app, "a");
        let b = spawn_selectable(&mut app, "b");

        app.world_mut().write_message(SelectionRequest::Select { entity: a, additive: true });
        app.world_mut().write_message(SelectionRequest::Select { entity: b, additive: true });
        app.update();
        assert_eq!(app.world().resource::<SelectionState>().selected, vec![a, b]);
        assert_eq!(changes(&app), 1);

        app.world_mut().write_message(SelectionRequest::Select { entity: a, additive: true });
        app.update();
        assert_eq!(app.world().resource::<SelectionState>().selected, vec![b]);
        assert!(app.world().get::<Selected>(a).is_none());
    }

    #[test]
    fn test_selected_ids_follow_selection_order() {
        let mut app = app();
        let a = spawn_selectable(&mut app, "a");
        let b = spawn_selectable(&mut app, "b");

        app.world_mut().write_message(SelectionRequest::Select { entity: b, additive: true });
        app.world_mut().write_message(SelectionRequest::Select { entity: a, additive: true });
        app.update();

        let ids = app
            .world_mut()
            .run_system_once(|selection: Res<SelectionState>, objects: Query<&Selectable>| {
                selection.selected_ids(&objects)
            })
            .unwrap();
        assert_eq!(ids, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_non_selectable_is_ignored() {
        let mut app = app();
        let plain = app.world_mut().spawn_empty().id();

        app.world_mut().write_message(SelectionRequest::Select { entity: plain, additive: false });
        app.update();
        assert!(app.world().resource::<SelectionState>().selected.is_empty());
        assert_eq!(changes(&app), 0);
    }

    #[test]
    fn test_clear_deselects_all() {
        let mut app = app();
        let a = spawn_selectable(&mut app, "a");
        app.world_mut().write_message(SelectionRequest::Select { entity: a, additive: false });
        app.update();

        app.world_mut().write_message(SelectionRequest::Clear);
        app.update();
        assert!(app.world().resource::<SelectionState>().selected.is_empty());
        assert!(app.world().get::<Selected>(a).is_none());
    }
}
