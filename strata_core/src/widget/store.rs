// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays widget storage with allocation, topology, visibility, and
//! attribute management.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::{Rect, Size};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, SurfaceHandle, WidgetId};
use super::traverse::Children;
use crate::backend::{NullBridge, PlatformBridge};
use crate::config::EngineConfig;
use crate::dirty;
use crate::error::{ProgrammingError, SurfaceError};
use crate::focus::FocusPolicy;
use crate::notify::{Notification, Request, Widget, WidgetCtx};
use crate::paint::Color;
use crate::region::Region;
use crate::trace::{Diagnostic, TraceSink, Tracer};
use crate::window::TopLevel;

/// Per-widget boolean flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub(crate) struct WidgetFlags {
    /// Hidden by the caller (or never shown).
    pub(crate) explicit_hidden: bool,
    /// Disabled by the caller; children inherit it.
    pub(crate) disabled: bool,
    /// The widget promises to paint every pixel it owes.
    pub(crate) opaque_paint: bool,
    /// Invalidation is discarded; children inherit it.
    pub(crate) updates_disabled: bool,
    /// The widget has its own native surface.
    pub(crate) native: bool,
    /// A Move notification is owed once the widget is shown.
    pub(crate) pending_move: bool,
    /// A Resize notification is owed once the widget is shown.
    pub(crate) pending_resize: bool,
}

/// Struct-of-arrays storage for all widgets, plus the engine state that
/// spans widgets (focus, grabs, active window, platform bridge).
///
/// Widgets are addressed by [`WidgetId`] handles. Destroyed widgets are
/// recycled via a free list, and generation counters prevent stale handle
/// access. Using a stale handle is a contract violation and panics.
pub struct WidgetTree<B: PlatformBridge = NullBridge> {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry --
    pub(crate) rect: Vec<Rect>,
    pub(crate) notified_rect: Vec<Rect>,
    pub(crate) min_size: Vec<Size>,
    pub(crate) max_size: Vec<Size>,

    // -- Attributes (set by callers) --
    pub(crate) flags: Vec<WidgetFlags>,
    pub(crate) fill: Vec<Option<Color>>,
    pub(crate) mask: Vec<Option<Region>>,
    pub(crate) focus_policy: Vec<FocusPolicy>,

    // -- Derived state --
    pub(crate) visible: Vec<bool>,
    pub(crate) opaque_children: Vec<Option<Region>>,

    // -- Focus ring --
    pub(crate) focus_next: Vec<u32>,
    pub(crate) focus_prev: Vec<u32>,
    pub(crate) focus_child: Vec<u32>,

    // -- Native state --
    pub(crate) surface: Vec<Option<SurfaceHandle>>,
    pub(crate) windows: Vec<Option<TopLevel>>,

    // -- Implementations --
    pub(crate) handlers: Vec<Option<Box<dyn Widget>>>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Session state --
    pub(crate) focus_widget: u32,
    pub(crate) active_window: u32,
    pub(crate) mouse_grab: u32,
    pub(crate) keyboard_grab: u32,
    pub(crate) modal_stack: Vec<u32>,
    pub(crate) painting: u32,
    pub(crate) pass_index: u64,

    pub(crate) config: EngineConfig,
    pub(crate) bridge: B,
    pub(crate) trace: Option<Box<dyn TraceSink>>,
}

impl<B: PlatformBridge> fmt::Debug for WidgetTree<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetTree")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("focus_widget", &self.focus_widget)
            .field("active_window", &self.active_window)
            .field("pass_index", &self.pass_index)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for WidgetTree<NullBridge> {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetTree<NullBridge> {
    /// Creates an empty tree backed by a [`NullBridge`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_bridge(NullBridge::new())
    }
}

impl<B: PlatformBridge> WidgetTree<B> {
    /// Creates an empty tree that talks to the platform through `bridge`.
    #[must_use]
    pub fn with_bridge(bridge: B) -> Self {
        Self::with_config(bridge, EngineConfig::default())
    }

    /// Creates an empty tree with explicit configuration.
    #[must_use]
    pub fn with_config(bridge: B, config: EngineConfig) -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            rect: Vec::new(),
            notified_rect: Vec::new(),
            min_size: Vec::new(),
            max_size: Vec::new(),
            flags: Vec::new(),
            fill: Vec::new(),
            mask: Vec::new(),
            focus_policy: Vec::new(),
            visible: Vec::new(),
            opaque_children: Vec::new(),
            focus_next: Vec::new(),
            focus_prev: Vec::new(),
            focus_child: Vec::new(),
            surface: Vec::new(),
            windows: Vec::new(),
            handlers: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            focus_widget: INVALID,
            active_window: INVALID,
            mouse_grab: INVALID,
            keyboard_grab: INVALID,
            modal_stack: Vec::new(),
            painting: INVALID,
            pass_index: 0,
            config,
            bridge,
            trace: None,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the platform bridge.
    #[must_use]
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Returns the platform bridge mutably.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Installs a sink for trace events and diagnostics, returning the
    /// previous one.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) -> Option<Box<dyn TraceSink>> {
        self.trace.replace(sink)
    }

    /// Removes and returns the installed sink.
    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    // -- Allocation API --

    /// Creates a widget with the given geometry (parent coordinates) and
    /// returns its handle.
    ///
    /// Without a parent the widget is a top-level window; its geometry is in
    /// screen coordinates. New widgets start hidden when they are top-levels
    /// or their parent is already visible, and otherwise appear together with
    /// their parent. Move and Resize notifications are owed until the widget
    /// is first shown.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is stale.
    pub fn create_widget(&mut self, parent: Option<WidgetId>, geometry: Rect) -> WidgetId {
        if let Some(p) = parent {
            self.validate(p);
        }
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.rect[i] = Rect::ZERO;
            self.notified_rect[i] = Rect::ZERO;
            self.min_size[i] = Size::ZERO;
            self.max_size[i] = Size::new(super::MAX_WIDGET_EXTENT, super::MAX_WIDGET_EXTENT);
            self.flags[i] = WidgetFlags::default();
            self.fill[i] = None;
            self.mask[i] = None;
            self.focus_policy[i] = FocusPolicy::NoFocus;
            self.visible[i] = false;
            self.opaque_children[i] = None;
            self.focus_next[i] = idx;
            self.focus_prev[i] = idx;
            self.focus_child[i] = INVALID;
            self.surface[i] = None;
            self.windows[i] = None;
            self.handlers[i] = None;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.rect.push(Rect::ZERO);
            self.notified_rect.push(Rect::ZERO);
            self.min_size.push(Size::ZERO);
            self.max_size
                .push(Size::new(super::MAX_WIDGET_EXTENT, super::MAX_WIDGET_EXTENT));
            self.flags.push(WidgetFlags::default());
            self.fill.push(None);
            self.mask.push(None);
            self.focus_policy.push(FocusPolicy::NoFocus);
            self.visible.push(false);
            self.opaque_children.push(None);
            self.focus_next.push(idx);
            self.focus_prev.push(idx);
            self.focus_child.push(INVALID);
            self.surface.push(None);
            self.windows.push(None);
            self.handlers.push(None);
            self.generation.push(0);
            idx
        };

        let i = idx as usize;
        let size = self.clamp_size(idx, geometry.size());
        if size != geometry.size() {
            self.report(
                Some(idx),
                ProgrammingError::GeometryClamped {
                    requested: geometry.size(),
                    applied: size,
                },
            );
        }
        self.rect[i] = Rect::from_origin_size(geometry.origin(), size);
        self.notified_rect[i] = self.rect[i];
        self.flags[i].pending_move = true;
        self.flags[i].pending_resize = true;

        match parent {
            Some(p) => {
                self.flags[i].explicit_hidden = self.visible[p.idx as usize];
                self.link_last(p.idx, idx);
                let window = self.window_of(p.idx);
                let anchor = self.focus_prev[window as usize];
                self.focus_ring_insert_after(anchor, idx);
            }
            None => {
                self.flags[i].explicit_hidden = true;
                self.windows[i] = Some(TopLevel::new());
            }
        }

        WidgetId {
            idx,
            generation: self.generation[i],
        }
    }

    /// Installs the implementation that receives callbacks for `id`, replacing
    /// any previous one, and delivers [`Notification::Create`] to it.
    pub fn set_widget(&mut self, id: WidgetId, widget: Box<dyn Widget>) {
        self.validate(id);
        self.handlers[id.idx as usize] = Some(widget);
        self.send(id.idx, &Notification::Create);
    }

    /// Removes and returns the implementation installed for `id`.
    pub fn take_widget(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        self.validate(id);
        self.handlers[id.idx as usize].take()
    }

    /// Destroys a widget and its whole subtree.
    ///
    /// If keyboard focus is inside the subtree it first moves to the nearest
    /// focusable ancestor, or is cleared. Each widget then receives
    /// [`Notification::Destroy`] (children before parents) and is torn down
    /// in a fixed order: it leaves the focus ring, its damage and backing
    /// store bookkeeping is purged, and only then is it unlinked from its
    /// parent's child list.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn destroy(&mut self, id: WidgetId) {
        self.validate(id);
        let root = id.idx;

        self.evacuate_focus_for_destroy(root);

        if self.visible[root as usize] && self.parent[root as usize] != INVALID {
            self.update_in_parent(root);
        }

        let mut order = Vec::new();
        self.collect_post_order(root, &mut order);
        for idx in order {
            self.destroy_one(idx);
        }
    }

    /// Returns whether the given handle refers to a live widget.
    #[must_use]
    pub fn is_alive(&self, id: WidgetId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    // -- Topology API --

    /// Moves `id` under `new_parent`, or makes it a top-level window when
    /// `new_parent` is `None`.
    ///
    /// The widget is appended at the front of its new siblings, its focus
    /// chain segment is spliced into the new window's ring in its existing
    /// relative order, and it receives [`Notification::ParentChange`]. Like a
    /// freshly created widget it ends up hidden if the new parent is already
    /// visible (or it became a top-level). A top-level that gains a parent
    /// gives up its backing store and native surface.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale or `new_parent` is inside `id`'s subtree.
    pub fn set_parent(&mut self, id: WidgetId, new_parent: Option<WidgetId>) {
        self.validate(id);
        let idx = id.idx;
        let new_p = match new_parent {
            Some(p) => {
                self.validate(p);
                assert!(
                    !self.is_in_subtree(p.idx, idx),
                    "cannot reparent a widget into its own subtree"
                );
                p.idx
            }
            None => INVALID,
        };
        if self.parent[idx as usize] == new_p {
            return;
        }

        let old_window = self.window_of(idx);
        let new_window = if new_p == INVALID {
            idx
        } else {
            self.window_of(new_p)
        };

        if old_window != new_window
            && self.focus_widget != INVALID
            && self.is_in_subtree(self.focus_widget, idx)
        {
            self.clear_focus_idx(self.focus_widget);
        }
        self.forget_focus_children_in(idx);

        if self.visible[idx as usize] && self.parent[idx as usize] != INVALID {
            self.update_in_parent(idx);
        }

        // Collect ring members while the old topology is intact.
        let members = self.focus_ring_members_of_subtree(old_window, idx);

        let old_p = self.parent[idx as usize];
        if old_p == INVALID {
            self.release_window(idx);
        } else {
            self.unlink_from_parent(idx);
            self.dirty.remove_dependency(idx, old_p, dirty::VISIBILITY);
            self.dirty.remove_dependency(old_p, idx, dirty::OPAQUE);
            self.dirty.mark_with(old_p, dirty::OPAQUE, &EagerPolicy);
        }

        let i = idx as usize;
        if new_p == INVALID {
            self.windows[i] = Some(TopLevel::new());
            self.flags[i].explicit_hidden = true;
        } else {
            if self.visible[new_p as usize] {
                self.flags[i].explicit_hidden = true;
            }
            self.link_last(new_p, idx);
        }

        self.focus_ring_splice(&members, new_window);

        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
        self.apply_visibility_changes();
        self.send(idx, &Notification::ParentChange);
    }

    /// Returns the parent of a widget, if any.
    #[must_use]
    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.validate(id);
        self.id_or_none(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a widget, back to
    /// front.
    #[must_use]
    pub fn children(&self, id: WidgetId) -> Children<'_, B> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns the top-level window containing `id` (itself, if it is one).
    #[must_use]
    pub fn window(&self, id: WidgetId) -> WidgetId {
        self.validate(id);
        self.id_at(self.window_of(id.idx))
    }

    /// Returns `true` if `id` has no parent.
    #[must_use]
    pub fn is_top_level(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.parent[id.idx as usize] == INVALID
    }

    /// Returns all live top-level windows.
    #[must_use]
    pub fn top_levels(&self) -> Vec<WidgetId> {
        (0..self.len)
            .filter(|&idx| self.windows[idx as usize].is_some() && !self.free_list.contains(&idx))
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Returns `true` if `ancestor` is `id` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        self.validate(ancestor);
        self.validate(id);
        self.is_in_subtree(id.idx, ancestor.idx)
    }

    /// Moves `id` to the front of its siblings.
    pub fn raise(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        let p = self.parent[idx as usize];
        if p == INVALID {
            if let Some(s) = self.surface[idx as usize] {
                self.bridge.raise_surface(s);
            }
            self.send(idx, &Notification::ZOrderChange);
            return;
        }
        if self.next_sibling[idx as usize] == INVALID {
            return;
        }
        self.unlink_from_parent(idx);
        self.link_last(p, idx);
        self.restacked(idx);
    }

    /// Moves `id` to the back of its siblings.
    pub fn lower(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        let p = self.parent[idx as usize];
        if p == INVALID {
            if let Some(s) = self.surface[idx as usize] {
                self.bridge.lower_surface(s);
            }
            self.send(idx, &Notification::ZOrderChange);
            return;
        }
        if self.prev_sibling[idx as usize] == INVALID {
            return;
        }
        self.unlink_from_parent(idx);
        let first = self.first_child[p as usize];
        self.link_before(idx, p, first);
        self.restacked(idx);
    }

    /// Places `id` directly behind `sibling`.
    ///
    /// # Panics
    ///
    /// Panics if a handle is stale or the widgets are not siblings.
    pub fn stack_under(&mut self, id: WidgetId, sibling: WidgetId) {
        self.validate(id);
        self.validate(sibling);
        let (idx, s) = (id.idx, sibling.idx);
        let p = self.parent[idx as usize];
        assert!(
            p != INVALID && self.parent[s as usize] == p,
            "stack_under requires siblings"
        );
        if idx == s || self.next_sibling[idx as usize] == s {
            return;
        }
        self.unlink_from_parent(idx);
        self.link_before(idx, p, s);
        self.restacked(idx);
    }

    // -- Visibility API --

    /// Shows a widget.
    ///
    /// The widget and every descendant that is not explicitly hidden become
    /// visible if the parent is visible. Newly visible widgets first receive
    /// any owed Move and Resize notifications and then
    /// [`Notification::Show`], parents before children. Showing a top-level
    /// creates its native surface on first use, sizes its backing store,
    /// invalidates it entirely, and activates it.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if a native surface could not be created; the
    /// widget stays hidden and nothing else changes.
    pub fn show(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.validate(id);
        let idx = id.idx;
        let top_level = self.parent[idx as usize] == INVALID;
        if top_level {
            self.realize_window(idx)?;
        }
        if !self.flags[idx as usize].explicit_hidden {
            return Ok(());
        }
        self.flags[idx as usize].explicit_hidden = false;
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
        self.apply_visibility_changes();
        if top_level {
            self.window_shown(idx);
        }
        Ok(())
    }

    /// Hides a widget and, with it, its whole subtree.
    ///
    /// Newly hidden widgets receive [`Notification::Hide`]; the area they
    /// covered in the parent is invalidated. Keyboard focus inside the
    /// subtree moves to the next focusable widget or is cleared. Hiding a
    /// top-level unmaps its surface, drops pending damage, and deactivates
    /// it.
    pub fn hide(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        if self.flags[idx as usize].explicit_hidden {
            return;
        }
        if self.parent[idx as usize] == INVALID {
            self.window_hiding(idx);
        }
        self.flags[idx as usize].explicit_hidden = true;
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
        self.apply_visibility_changes();
    }

    /// Shows or hides a widget.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> Result<(), SurfaceError> {
        if visible {
            self.show(id)
        } else {
            self.hide(id);
            Ok(())
        }
    }

    /// Returns whether the widget is effectively visible (it and every
    /// ancestor are shown).
    #[must_use]
    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns whether the widget itself is hidden, regardless of ancestors.
    #[must_use]
    pub fn is_explicitly_hidden(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].explicit_hidden
    }

    // -- Attribute API --

    /// Declares that the widget paints every pixel it is asked to.
    ///
    /// Opaque widgets occlude what lies behind them and get no background
    /// painted by the compositor.
    pub fn set_opaque_paint(&mut self, id: WidgetId, on: bool) {
        self.validate(id);
        let idx = id.idx;
        if self.flags[idx as usize].opaque_paint == on {
            return;
        }
        self.flags[idx as usize].opaque_paint = on;
        self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
        self.update(id);
    }

    /// Sets the brush the compositor fills the widget's background with.
    ///
    /// A fully opaque brush makes the widget opaque.
    pub fn set_fill(&mut self, id: WidgetId, fill: Option<Color>) {
        self.validate(id);
        let idx = id.idx;
        if self.fill[idx as usize] == fill {
            return;
        }
        self.fill[idx as usize] = fill;
        self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
        self.update(id);
    }

    /// Restricts the widget's paintable area to `mask` (widget coordinates).
    pub fn set_mask(&mut self, id: WidgetId, mask: Option<Region>) {
        self.validate(id);
        let idx = id.idx;
        if self.parent[idx as usize] != INVALID {
            self.update_in_parent(idx);
        }
        self.mask[idx as usize] = mask;
        self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
        if self.parent[idx as usize] == INVALID {
            self.update(id);
        } else {
            self.update_in_parent(idx);
        }
    }

    /// Enables or disables a widget and its subtree.
    ///
    /// Disabled widgets refuse focus and input. Disabling the subtree that
    /// holds keyboard focus moves focus to the next focusable widget, or
    /// clears it.
    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) {
        self.validate(id);
        let idx = id.idx;
        if self.flags[idx as usize].disabled == !enabled {
            return;
        }
        self.flags[idx as usize].disabled = !enabled;
        if !enabled {
            self.relocate_focus(idx);
        }
        self.send(idx, &Notification::EnabledChange);
        self.update(id);
    }

    /// Returns `true` if neither the widget nor any ancestor is disabled.
    #[must_use]
    pub fn is_enabled(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.is_enabled_idx(id.idx)
    }

    /// Turns invalidation of the subtree on or off.
    ///
    /// While off, updates are discarded. Turning it back on invalidates the
    /// whole widget.
    pub fn set_updates_enabled(&mut self, id: WidgetId, enabled: bool) {
        self.validate(id);
        let idx = id.idx;
        if self.flags[idx as usize].updates_disabled == !enabled {
            return;
        }
        self.flags[idx as usize].updates_disabled = !enabled;
        if enabled {
            self.update(id);
        }
    }

    /// Gives the widget its own native surface, or takes it away.
    ///
    /// The pixel compositor skips native widgets and asks the platform to
    /// re-composite them instead.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the surface could not be created; the
    /// widget stays non-native.
    pub fn set_native(&mut self, id: WidgetId, native: bool) -> Result<(), SurfaceError> {
        self.validate(id);
        let idx = id.idx;
        if self.parent[idx as usize] == INVALID || self.flags[idx as usize].native == native {
            return Ok(());
        }
        if native {
            let geometry = self.rect[idx as usize] + self.window_offset(self.parent[idx as usize]);
            let surface = self.bridge.create_surface(id, geometry)?;
            self.surface[idx as usize] = Some(surface);
            if self.visible[idx as usize] {
                self.bridge.show_surface(surface);
            }
        } else if let Some(surface) = self.surface[idx as usize].take() {
            self.bridge.destroy_surface(surface);
        }
        self.flags[idx as usize].native = native;
        self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
        self.update_in_parent(idx);
        Ok(())
    }

    /// Returns the native surface of a window or native child, if it has one.
    #[must_use]
    pub fn surface(&self, id: WidgetId) -> Option<SurfaceHandle> {
        self.validate(id);
        self.surface[id.idx as usize]
    }

    /// Returns the widget's auto-fill brush.
    #[must_use]
    pub fn fill(&self, id: WidgetId) -> Option<Color> {
        self.validate(id);
        self.fill[id.idx as usize]
    }

    /// Returns the widget's mask.
    #[must_use]
    pub fn mask(&self, id: WidgetId) -> Option<&Region> {
        self.validate(id);
        self.mask[id.idx as usize].as_ref()
    }

    /// Returns whether the widget declared opaque painting.
    #[must_use]
    pub fn has_opaque_paint(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.flags[id.idx as usize].opaque_paint
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: WidgetId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale WidgetId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live slot.
    #[inline]
    pub(crate) fn id_at(&self, idx: u32) -> WidgetId {
        WidgetId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    #[inline]
    pub(crate) fn id_or_none(&self, idx: u32) -> Option<WidgetId> {
        (idx != INVALID).then(|| self.id_at(idx))
    }

    /// Returns the top-level ancestor of `idx`.
    pub(crate) fn window_of(&self, mut idx: u32) -> u32 {
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
        }
        idx
    }

    /// Returns `true` if `idx` is `root` or a descendant of it.
    pub(crate) fn is_in_subtree(&self, mut idx: u32, root: u32) -> bool {
        loop {
            if idx == root {
                return true;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return false;
            }
        }
    }

    pub(crate) fn is_enabled_idx(&self, mut idx: u32) -> bool {
        loop {
            if self.flags[idx as usize].disabled {
                return false;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return true;
            }
        }
    }

    pub(crate) fn updates_enabled_idx(&self, mut idx: u32) -> bool {
        loop {
            if self.flags[idx as usize].updates_disabled {
                return false;
            }
            idx = self.parent[idx as usize];
            if idx == INVALID {
                return true;
            }
        }
    }

    fn depth(&self, mut idx: u32) -> u32 {
        let mut d = 0;
        while self.parent[idx as usize] != INVALID {
            idx = self.parent[idx as usize];
            d += 1;
        }
        d
    }

    /// Appends the children of `idx` back to front.
    pub(crate) fn child_indices(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut c = self.first_child[idx as usize];
        while c != INVALID {
            out.push(c);
            c = self.next_sibling[c as usize];
        }
        out
    }

    fn collect_post_order(&self, idx: u32, out: &mut Vec<u32>) {
        for c in self.child_indices(idx) {
            self.collect_post_order(c, out);
        }
        out.push(idx);
    }

    /// Appends `c` as the frontmost child of `p` and wires dirty edges.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        self.add_edges(p, c);
    }

    /// Inserts `c` under `p` directly behind `sibling` (or last if
    /// `sibling` is [`INVALID`]).
    fn link_before(&mut self, c: u32, p: u32, sibling: u32) {
        if sibling == INVALID {
            self.link_last(p, c);
            return;
        }
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = sibling;
        self.prev_sibling[c as usize] = self.prev_sibling[sibling as usize];
        if self.prev_sibling[sibling as usize] != INVALID {
            self.next_sibling[self.prev_sibling[sibling as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[sibling as usize] = c;
        self.add_edges(p, c);
    }

    fn add_edges(&mut self, p: u32, c: u32) {
        // Visibility flows down, opaque-area invalidation flows up.
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);
        let _ = self.dirty.add_dependency(p, c, dirty::OPAQUE);
        self.dirty.mark_with(p, dirty::OPAQUE, &EagerPolicy);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Common tail of raise, lower, and stack-under.
    fn restacked(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        self.dirty.mark_with(p, dirty::OPAQUE, &EagerPolicy);
        if self.visible[idx as usize] {
            self.update_in_parent(idx);
        }
        self.send(idx, &Notification::ZOrderChange);
    }

    /// Recomputes effective visibility for everything marked on the
    /// visibility channel and delivers the resulting notifications.
    pub(crate) fn apply_visibility_changes(&mut self) {
        let mut marked: Vec<u32> = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .collect();
        marked.sort_by_key(|&idx| self.depth(idx));

        let mut shown = Vec::new();
        let mut hidden = Vec::new();
        for idx in marked {
            let p = self.parent[idx as usize];
            let parent_visible = p == INVALID || self.visible[p as usize];
            let now = parent_visible && !self.flags[idx as usize].explicit_hidden;
            if now != self.visible[idx as usize] {
                self.visible[idx as usize] = now;
                self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
                if now {
                    shown.push(idx);
                } else {
                    hidden.push(idx);
                }
            }
        }

        for &idx in &hidden {
            let p = self.parent[idx as usize];
            if p != INVALID && !hidden.contains(&p) {
                self.update_in_parent(idx);
            }
            if self.mouse_grab == idx {
                self.mouse_grab = INVALID;
            }
            if self.keyboard_grab == idx {
                self.keyboard_grab = INVALID;
            }
            if let Some(s) = self.surface[idx as usize] {
                if p != INVALID {
                    self.bridge.hide_surface(s);
                }
            }
        }
        if let Some(&root) = hidden.first() {
            if self.parent[root as usize] != INVALID {
                self.relocate_focus(root);
            }
        }
        for idx in hidden {
            self.send(idx, &Notification::Hide);
        }

        for &idx in &shown {
            self.flush_pending_geometry(idx);
            if let (Some(s), true) = (self.surface[idx as usize], self.parent[idx as usize] != INVALID) {
                self.bridge.show_surface(s);
            }
            self.send(idx, &Notification::Show);
            let p = self.parent[idx as usize];
            if p != INVALID && !shown.contains(&p) {
                self.update_in_parent(idx);
            }
        }
    }

    /// Delivers Move and Resize notifications deferred while hidden.
    fn flush_pending_geometry(&mut self, idx: u32) {
        let i = idx as usize;
        let old = self.notified_rect[i];
        let new = self.rect[i];
        self.notified_rect[i] = new;
        if core::mem::take(&mut self.flags[i].pending_move) {
            self.send(
                idx,
                &Notification::Move {
                    old: old.origin(),
                    new: new.origin(),
                },
            );
        }
        if core::mem::take(&mut self.flags[i].pending_resize) {
            self.send(
                idx,
                &Notification::Resize {
                    old: old.size(),
                    new: new.size(),
                },
            );
        }
    }

    fn destroy_one(&mut self, idx: u32) {
        self.send(idx, &Notification::Destroy);

        // 1. Focus ring.
        self.focus_ring_remove(idx);
        self.forget_focus_child(idx);
        if self.focus_widget == idx {
            self.focus_widget = INVALID;
        }

        // 2. Damage and backing-store bookkeeping.
        let p = self.parent[idx as usize];
        if p == INVALID {
            self.release_window(idx);
        } else if let Some(s) = self.surface[idx as usize].take() {
            self.bridge.destroy_surface(s);
        }
        self.dirty.remove_key(idx);
        self.opaque_children[idx as usize] = None;
        self.mask[idx as usize] = None;
        if self.mouse_grab == idx {
            self.mouse_grab = INVALID;
        }
        if self.keyboard_grab == idx {
            self.keyboard_grab = INVALID;
        }

        // 3. Parent's child list.
        if p != INVALID {
            self.unlink_from_parent(idx);
            self.dirty.mark_with(p, dirty::OPAQUE, &EagerPolicy);
        }

        self.handlers[idx as usize] = None;
        self.visible[idx as usize] = false;
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
    }

    /// Delivers a notification to the widget's implementation, then applies
    /// whatever it requested.
    pub(crate) fn send(&mut self, idx: u32, notification: &Notification) {
        let Some(mut handler) = self.handlers[idx as usize].take() else {
            return;
        };
        let id = self.id_at(idx);
        let mut requests = Vec::new();
        {
            let mut ctx = WidgetCtx::new(id, self.rect[idx as usize], &mut requests);
            handler.notify(&mut ctx, notification);
        }
        if self.handlers[idx as usize].is_none() {
            self.handlers[idx as usize] = Some(handler);
        }
        self.apply_requests(id, requests);
    }

    /// Applies requests queued by a callback on behalf of `id`.
    pub(crate) fn apply_requests(&mut self, id: WidgetId, requests: Vec<Request>) {
        for request in requests {
            if !self.is_alive(id) {
                return;
            }
            match request {
                Request::Update(None) => self.update(id),
                Request::Update(Some(rect)) => self.update_rect(id, rect),
                Request::Repaint => self.repaint(id),
                Request::Focus(reason) => self.set_focus(id, reason),
                Request::ClearFocus => self.clear_focus(id),
                Request::FocusNextPrev(forward) => {
                    self.focus_next_prev(forward);
                }
            }
        }
    }

    /// Returns a tracer over the installed sink.
    pub(crate) fn tracer(&mut self) -> Tracer<'_> {
        match self.trace.as_deref_mut() {
            Some(sink) => Tracer::new(sink),
            None => Tracer::none(),
        }
    }

    /// Reports a recovered programming error to the installed sink.
    pub(crate) fn report(&mut self, widget: Option<u32>, error: ProgrammingError) {
        let widget = widget.map(|idx| self.id_at(idx));
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_diagnostic(&Diagnostic { widget, error });
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::testing::{Event, Recorder, log};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn create_and_destroy() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        assert!(tree.is_alive(id));
        tree.destroy(id);
        assert!(!tree.is_alive(id));
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut tree = WidgetTree::new();
        let id1 = tree.create_widget(None, Rect::ZERO);
        tree.destroy(id1);
        let id2 = tree.create_widget(None, Rect::ZERO);
        assert!(!tree.is_alive(id1));
        assert!(tree.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    #[should_panic(expected = "stale WidgetId")]
    fn destroyed_handle_panics_on_parent() {
        let mut tree = WidgetTree::new();
        let id = tree.create_widget(None, Rect::ZERO);
        tree.destroy(id);
        let _ = tree.parent(id);
    }

    #[test]
    #[should_panic(expected = "cannot reparent a widget into its own subtree")]
    fn reparent_into_descendant_panics() {
        let mut tree = WidgetTree::new();
        let a = tree.create_widget(None, Rect::ZERO);
        let b = tree.create_widget(Some(a), Rect::ZERO);
        tree.set_parent(a, Some(b));
    }

    #[test]
    fn children_are_in_paint_order() {
        let mut tree = WidgetTree::new();
        let p = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let a = tree.create_widget(Some(p), rect(0.0, 0.0, 10.0, 10.0));
        let b = tree.create_widget(Some(p), rect(0.0, 0.0, 10.0, 10.0));
        let c = tree.create_widget(Some(p), rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![a, b, c]);

        tree.raise(a);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![b, c, a]);
        tree.lower(c);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![c, b, a]);
        tree.stack_under(a, b);
        assert_eq!(tree.children(p).collect::<Vec<_>>(), vec![c, a, b]);
    }

    #[test]
    fn visibility_follows_ancestors() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        let grandchild = tree.create_widget(Some(child), rect(0.0, 0.0, 5.0, 5.0));
        assert!(!tree.is_visible(win));
        assert!(!tree.is_visible(grandchild));

        tree.show(win).unwrap();
        assert!(tree.is_visible(child));
        assert!(tree.is_visible(grandchild));

        tree.hide(child);
        assert!(!tree.is_visible(grandchild));
        assert!(!tree.is_explicitly_hidden(grandchild));

        tree.show(child).unwrap();
        assert!(tree.is_visible(grandchild));
    }

    #[test]
    fn child_created_under_visible_parent_starts_hidden() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.show(win).unwrap();
        let late = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        assert!(!tree.is_visible(late));
        tree.show(late).unwrap();
        assert!(tree.is_visible(late));
    }

    #[test]
    fn show_delivers_deferred_geometry_before_show() {
        let log = log();
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(1.0, 2.0, 10.0, 10.0));
        tree.set_widget(win, Recorder::boxed("win", &log));
        tree.set_widget(child, Recorder::boxed("child", &log));
        tree.move_to(child, kurbo::Point::new(5.0, 5.0));
        log.borrow_mut().clear();

        tree.show(win).unwrap();
        let names: Vec<_> = log
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Notify(name, n) => Some((*name, *n)),
                _ => None,
            })
            .filter(|(_, n)| {
                matches!(
                    n,
                    Notification::Move { .. } | Notification::Resize { .. } | Notification::Show
                )
            })
            .collect();
        assert_eq!(names.len(), 6, "{names:?}");
        assert_eq!(names[0].0, "win");
        assert!(matches!(names[2], ("win", Notification::Show)));
        assert!(matches!(
            names[3],
            ("child", Notification::Move { new, .. }) if new == kurbo::Point::new(5.0, 5.0)
        ));
        assert!(matches!(names[5], ("child", Notification::Show)));
    }

    #[test]
    fn hide_sends_hide_to_subtree() {
        let log = log();
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        let leaf = tree.create_widget(Some(child), rect(0.0, 0.0, 5.0, 5.0));
        tree.show(win).unwrap();
        tree.set_widget(child, Recorder::boxed("child", &log));
        tree.set_widget(leaf, Recorder::boxed("leaf", &log));
        log.borrow_mut().clear();

        tree.hide(child);
        let hides: Vec<_> = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Notify(_, Notification::Hide)))
            .cloned()
            .collect();
        assert_eq!(
            hides,
            vec![
                Event::Notify("child", Notification::Hide),
                Event::Notify("leaf", Notification::Hide),
            ]
        );
    }

    #[test]
    fn destroy_notifies_children_first() {
        let log = log();
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        tree.set_widget(win, Recorder::boxed("win", &log));
        tree.set_widget(child, Recorder::boxed("child", &log));
        log.borrow_mut().clear();

        tree.destroy(win);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Notify("child", Notification::Destroy),
                Event::Notify("win", Notification::Destroy),
            ]
        );
        assert!(!tree.is_alive(child));
    }

    #[test]
    fn reparent_to_top_level_and_back() {
        let mut tree = WidgetTree::new();
        let w1 = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let w2 = tree.create_widget(None, rect(200.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(w1), rect(0.0, 0.0, 10.0, 10.0));
        tree.show(w1).unwrap();
        tree.show(w2).unwrap();
        assert!(tree.is_visible(child));

        tree.set_parent(child, Some(w2));
        assert_eq!(tree.parent(child), Some(w2));
        assert_eq!(tree.window(child), w2);
        assert!(!tree.is_visible(child), "reparented widgets need an explicit show");
        assert!(tree.children(w1).next().is_none());

        tree.set_parent(child, None);
        assert!(tree.is_top_level(child));
        assert!(tree.top_levels().contains(&child));

        tree.set_parent(child, Some(w1));
        assert!(!tree.is_top_level(child));
        assert!(tree.backing_store(child).is_none());
    }

    #[test]
    fn disabled_is_inherited() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        tree.set_enabled(win, false);
        assert!(!tree.is_enabled(child));
        tree.set_enabled(win, true);
        assert!(tree.is_enabled(child));
    }
}
