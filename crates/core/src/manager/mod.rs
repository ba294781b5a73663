//! Transform manager: which gizmo appears for the current selection.
//!
//! Gizmos are 3D widgets that appear on selection rather than on starting a
//! tool. Each gizmo type is a builder registered under a [`GizmoTypeId`], and
//! the default type is chosen by id.
//!
//! Tools that need to replace or hide the default gizmo push an override
//! ([`GizmoTypeId::NO_GIZMO`] hides it) and pop it when they finish.
//! Group and object filters redirect the type for particular selections,
//! but an active override always wins. A selection filter limits which
//! selected objects are considered targets at all.
//!
//! Resolution order for a non-empty target list:
//! 1. current override
//! 2. first group filter returning a registered type
//! 3. first object filter returning a registered type (single target only)
//! 4. active default type

mod filters;
mod frame_cache;
mod overrides;
mod registry;

pub use filters::{FilterId, GroupTypeFilter, ObjectTypeFilter, SelectionFilter};
pub use registry::{GizmoBuilder, GizmoTypeId, NoGizmoBuilder, TransformGizmo};

use std::sync::Arc;

use gimbal_config::ManipulationConfig;
use gimbal_protocol::{FrameMode, TransformEvent};
use tracing::{debug, info, warn};

use crate::capture::{Capturable, Hoverable};
use crate::error::TransformManagerError;
use crate::input::UiElementId;
use crate::router::UiElementHost;
use crate::scene::{FrameStore, ManagerAction, ManagerContext, SceneObject};

use filters::FilterList;
use frame_cache::FrameModeCache;
use overrides::OverrideStack;
use registry::BuilderRegistry;

/// Owns the gizmo registry and the single active gizmo
pub struct TransformManager<O: SceneObject> {
    types: BuilderRegistry<O>,
    active_type: GizmoTypeId,
    active_builder: Arc<dyn GizmoBuilder<O>>,

    active_gizmo: Option<Box<dyn TransformGizmo<O>>>,
    /// Type the active gizmo was built from
    active_gizmo_type: Option<GizmoTypeId>,

    overrides: OverrideStack,
    object_filters: FilterList<ObjectTypeFilter<O>>,
    group_filters: FilterList<GroupTypeFilter<O>>,
    selection_filter: Option<Box<SelectionFilter<O>>>,

    default_frame_mode: FrameMode,
    frame_modes: FrameModeCache<O>,

    /// Outbound notifications, drained by the host
    events: Vec<TransformEvent>,
}

impl<O: SceneObject> TransformManager<O> {
    /// Manager whose `"default"` type is `default_builder`
    pub fn new(default_builder: Arc<dyn GizmoBuilder<O>>) -> Self {
        Self::with_config(default_builder, &ManipulationConfig::default())
    }

    pub fn with_config(default_builder: Arc<dyn GizmoBuilder<O>>, config: &ManipulationConfig) -> Self {
        let types = BuilderRegistry::with_builtins(default_builder.clone());

        Self {
            types,
            active_type: GizmoTypeId::default_type(),
            active_builder: default_builder,
            active_gizmo: None,
            active_gizmo_type: None,
            overrides: OverrideStack::new(config.max_override_depth),
            object_filters: FilterList::new(),
            group_filters: FilterList::new(),
            selection_filter: None,
            default_frame_mode: config.default_frame_mode,
            frame_modes: FrameModeCache::new(),
            events: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Registry and active type
    // ------------------------------------------------------------------

    /// Associate a new gizmo builder with an identifier
    pub fn register_type(
        &mut self,
        id: impl Into<GizmoTypeId>,
        builder: Arc<dyn GizmoBuilder<O>>,
    ) -> Result<(), TransformManagerError> {
        let id = id.into();
        self.types.register(id.clone(), builder).inspect_err(|e| {
            warn!("TransformManager: {}", e);
        })?;
        debug!("TransformManager: registered gizmo type '{}'", id);
        Ok(())
    }

    pub fn is_registered(&self, id: &GizmoTypeId) -> bool {
        self.types.contains(id)
    }

    /// Registered type ids, in no particular order
    pub fn registered_types(&self) -> impl Iterator<Item = &GizmoTypeId> {
        self.types.ids()
    }

    /// Current default gizmo type
    pub fn active_type(&self) -> &GizmoTypeId {
        &self.active_type
    }

    /// Select the default gizmo type and refresh the gizmo for the current selection
    pub fn set_active_type(
        &mut self,
        id: impl Into<GizmoTypeId>,
        ctx: &mut dyn ManagerContext<O>,
    ) -> Result<(), TransformManagerError> {
        let id = id.into();
        if self.active_type == id {
            return Ok(());
        }
        let builder = self.types.require(&id).inspect_err(|e| warn!("TransformManager: {}", e))?.clone();

        info!("TransformManager: active gizmo type '{}' -> '{}'", self.active_type, id);
        self.active_builder = builder;
        self.active_type = id;
        self.refresh_gizmo(ctx);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Override stack
    // ------------------------------------------------------------------

    /// Temporarily supersede the active type. Takes effect next frame.
    pub fn push_override(
        &mut self,
        id: impl Into<GizmoTypeId>,
        ctx: &mut dyn ManagerContext<O>,
    ) -> Result<(), TransformManagerError> {
        let id = id.into();
        self.types.require(&id).inspect_err(|e| warn!("TransformManager: {}", e))?;
        self.overrides
            .push(id.clone())
            .inspect_err(|e| warn!("TransformManager: {}", e))?;

        debug!(
            "TransformManager: pushed override '{}' (depth {})",
            id,
            self.overrides.depth()
        );
        // Usually called from inside a tool's own setup; building now would
        // see the tool half-initialized
        ctx.register_next_frame_action(ManagerAction::RefreshGizmo);
        Ok(())
    }

    /// Restore the override that was current before the last push. Takes effect next frame.
    pub fn pop_override(&mut self, ctx: &mut dyn ManagerContext<O>) -> Result<(), TransformManagerError> {
        self.overrides
            .pop()
            .inspect_err(|e| warn!("TransformManager: {}", e))?;
        debug!(
            "TransformManager: popped override, now {:?} (depth {})",
            self.overrides.current(),
            self.overrides.depth()
        );
        ctx.register_next_frame_action(ManagerAction::RefreshGizmo);
        Ok(())
    }

    /// Unwind every pushed override. Takes effect next frame.
    pub fn pop_all_overrides(&mut self, ctx: &mut dyn ManagerContext<O>) {
        self.overrides.pop_all();
        debug!("TransformManager: cleared override stack");
        ctx.register_next_frame_action(ManagerAction::RefreshGizmo);
    }

    pub fn current_override(&self) -> Option<&GizmoTypeId> {
        self.overrides.current()
    }

    pub fn override_depth(&self) -> usize {
        self.overrides.depth()
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Only objects passing `filter` will be given a gizmo
    pub fn set_selection_filter(&mut self, filter: impl Fn(&O) -> bool + Send + Sync + 'static) {
        self.selection_filter = Some(Box::new(filter));
    }

    pub fn clear_selection_filter(&mut self) {
        self.selection_filter = None;
    }

    /// Consulted for single-object selections. Returning a registered type
    /// replaces the default; overrides still win.
    pub fn add_object_filter(
        &mut self,
        filter: impl Fn(&O) -> Option<GizmoTypeId> + Send + Sync + 'static,
    ) -> FilterId {
        self.object_filters.add(Box::new(filter))
    }

    pub fn remove_object_filter(&mut self, id: FilterId) -> bool {
        self.object_filters.remove(id)
    }

    pub fn clear_object_filters(&mut self) {
        self.object_filters.clear();
    }

    /// Consulted for every non-empty selection, before object filters
    pub fn add_group_filter(
        &mut self,
        filter: impl Fn(&[O]) -> Option<GizmoTypeId> + Send + Sync + 'static,
    ) -> FilterId {
        self.group_filters.add(Box::new(filter))
    }

    pub fn remove_group_filter(&mut self, id: FilterId) -> bool {
        self.group_filters.remove(id)
    }

    pub fn clear_group_filters(&mut self) {
        self.group_filters.clear();
    }

    // ------------------------------------------------------------------
    // Active gizmo
    // ------------------------------------------------------------------

    pub fn has_active_gizmo(&self) -> bool {
        self.active_gizmo.is_some()
    }

    pub fn active_gizmo(&self) -> Option<&dyn TransformGizmo<O>> {
        self.active_gizmo.as_deref()
    }

    pub fn active_gizmo_mut(&mut self) -> Option<&mut (dyn TransformGizmo<O> + 'static)> {
        self.active_gizmo.as_deref_mut()
    }

    /// Type id the active gizmo was built from
    pub fn active_gizmo_type(&self) -> Option<&GizmoTypeId> {
        self.active_gizmo_type.as_ref()
    }

    /// Frame mode of the active gizmo, or the manager default
    pub fn active_frame_mode(&self) -> FrameMode {
        match &self.active_gizmo {
            Some(gizmo) if gizmo.supports_frame_mode() => gizmo.frame_mode(),
            _ => self.default_frame_mode,
        }
    }

    /// Change the frame mode of the active gizmo (remembered per object for
    /// single-object gizmos), or the manager default when no gizmo supports it.
    /// A gizmo's mode never leaks into the default, which also drives snapping.
    pub fn set_active_frame_mode(&mut self, mode: FrameMode) {
        match &mut self.active_gizmo {
            Some(gizmo) if gizmo.supports_frame_mode() => {
                gizmo.set_frame_mode(mode);
                if let [target] = gizmo.targets() {
                    self.frame_modes.record(target.clone(), mode);
                }
            }
            _ => self.default_frame_mode = mode,
        }
        self.events.push(TransformEvent::FrameModeChanged { mode });
    }

    /// Manager-wide mode used by multi-object gizmos
    pub fn default_frame_mode(&self) -> FrameMode {
        self.default_frame_mode
    }

    /// Last explicit mode for `object`, if any has been seeded or chosen
    pub fn cached_frame_mode(&self, object: &O) -> Option<FrameMode> {
        self.frame_modes.get(object)
    }

    /// Drop the remembered mode for an object that left the scene
    pub fn forget_frame_mode(&mut self, object: &O) -> Option<FrameMode> {
        self.frame_modes.forget(object)
    }

    pub fn clear_frame_mode_cache(&mut self) {
        self.frame_modes.clear();
    }

    /// Forward a reference object to the active gizmo, if it takes one
    pub fn set_active_reference_object(&mut self, object: O) {
        if let Some(gizmo) = &mut self.active_gizmo {
            if gizmo.supports_reference_object() {
                gizmo.set_reference_object(object);
            }
        }
    }

    /// Detach the active gizmo. Safe to call with no gizmo.
    pub fn dismiss_active_gizmo(&mut self, ctx: &mut dyn ManagerContext<O>) {
        let Some(mut gizmo) = self.active_gizmo.take() else {
            return;
        };
        let element_id = gizmo.element_id();
        ctx.remove_ui_element(element_id);
        gizmo.disconnect();
        self.active_gizmo_type = None;

        debug!("TransformManager: dismissed gizmo {:?}", element_id);
        self.events.push(TransformEvent::GizmoDismissed {
            element_id: element_id.0,
        });
    }

    /// Take queued notifications, leaving the queue empty
    pub fn drain_events(&mut self) -> Vec<TransformEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Selection reaction and deferred work
    // ------------------------------------------------------------------

    /// React to the scene's selection-changed notification.
    ///
    /// Teardown happens now; building is deferred to the next frame so a
    /// burst of selection changes within one update settles first.
    pub fn handle_selection_changed(&mut self, ctx: &mut dyn ManagerContext<O>) {
        let selected = self.filtered_selection(ctx);

        if selected.is_empty() && self.active_gizmo.is_some() {
            self.dismiss_active_gizmo(ctx);
            return;
        }

        let stale = self
            .active_gizmo
            .as_ref()
            .is_some_and(|gizmo| !unordered_eq(&selected, gizmo.targets()));
        if stale {
            self.dismiss_active_gizmo(ctx);
        }

        if !selected.is_empty() {
            ctx.register_next_frame_action(ManagerAction::BuildGizmoForSelection);
        }
    }

    /// Run one action previously handed to the scheduler
    pub fn run_next_frame_action(&mut self, action: ManagerAction, ctx: &mut dyn ManagerContext<O>) {
        match action {
            ManagerAction::RefreshGizmo => self.refresh_gizmo(ctx),
            ManagerAction::BuildGizmoForSelection => {
                let selected = self.filtered_selection(ctx);
                if !selected.is_empty() {
                    self.add_gizmo(&selected, ctx);
                }
            }
        }
    }

    /// Type the builder-resolution rules pick for `targets`
    pub fn resolve_type(&self, targets: &[O]) -> GizmoTypeId {
        if let Some(id) = self.overrides.current() {
            return id.clone();
        }

        if !targets.is_empty() {
            let group_pick = self
                .group_filters
                .iter()
                .filter_map(|filter| filter(targets))
                .find(|id| self.types.contains(id));
            if let Some(id) = group_pick {
                return id;
            }
        }

        if let [target] = targets {
            let object_pick = self
                .object_filters
                .iter()
                .filter_map(|filter| filter(target))
                .find(|id| self.types.contains(id));
            if let Some(id) = object_pick {
                return id;
            }
        }

        self.active_type.clone()
    }

    fn filtered_selection(&self, ctx: &dyn ManagerContext<O>) -> Vec<O> {
        let mut selected = ctx.selected_objects();
        if let Some(filter) = &self.selection_filter {
            selected.retain(|object| filter(object));
        }
        selected
    }

    fn refresh_gizmo(&mut self, ctx: &mut dyn ManagerContext<O>) {
        self.dismiss_active_gizmo(ctx);
        self.handle_selection_changed(ctx);
    }

    fn add_gizmo(&mut self, targets: &[O], ctx: &mut dyn ManagerContext<O>) {
        let type_id = self.resolve_type(targets);
        let builder = match self.types.get(&type_id) {
            Some(builder) => builder.clone(),
            None => self.active_builder.clone(),
        };

        let use_targets = if builder.supports_multiple_objects() {
            targets
        } else {
            &targets[..targets.len().min(1)]
        };

        if let Some(gizmo) = &self.active_gizmo {
            if unordered_eq(gizmo.targets(), use_targets) {
                return;
            }
            self.dismiss_active_gizmo(ctx);
        }

        let Some(mut gizmo) = builder.build(ctx.scene(), use_targets) else {
            debug!("TransformManager: '{}' built no gizmo", type_id);
            return;
        };

        // Each object starts in a fixed per-type mode and then remembers the
        // user's explicit choice, so changing the manager default (which also
        // drives snapping) does not silently retarget existing objects.
        if gizmo.supports_frame_mode() {
            let mode = match (targets.len(), use_targets) {
                (1, [target]) => self.frame_modes.get_or_seed(target),
                _ => self.default_frame_mode,
            };
            gizmo.set_frame_mode(mode);
        }

        let element_id = gizmo.element_id();
        let target_count = gizmo.targets().len();
        ctx.add_ui_element(element_id);
        info!(
            "TransformManager: attached '{}' gizmo {:?} for {} target(s)",
            type_id, element_id, target_count
        );

        self.events.push(TransformEvent::GizmoAttached {
            gizmo_type: type_id.to_string(),
            element_id: element_id.0,
            target_count,
        });
        self.active_gizmo = Some(gizmo);
        self.active_gizmo_type = Some(type_id);
    }
}

/// The active gizmo is the only UI element the manager owns
impl<O: SceneObject> UiElementHost<dyn FrameStore<O>> for TransformManager<O> {
    fn capturable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Capturable<dyn FrameStore<O>>> {
        self.active_gizmo
            .as_mut()
            .filter(|gizmo| gizmo.element_id() == element)?
            .as_capturable()
    }

    fn hoverable_mut(&mut self, element: UiElementId) -> Option<&mut dyn Hoverable> {
        self.active_gizmo
            .as_mut()
            .filter(|gizmo| gizmo.element_id() == element)?
            .as_hoverable()
    }
}

/// Same length and every element of `a` appears in `b`
fn unordered_eq<O: PartialEq>(a: &[O], b: &[O]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}
