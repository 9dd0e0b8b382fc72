// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Top-level windows: native surfaces, window state, activation, and
//! modality.
//!
//! Window state transitions follow a small state machine. Entering
//! [`Maximized`](WindowState::Maximized) or
//! [`FullScreen`](WindowState::FullScreen) from any other state snapshots
//! the current geometry once; returning to [`Normal`](WindowState::Normal)
//! restores that snapshot exactly. [`Minimized`](WindowState::Minimized)
//! never touches geometry.

use kurbo::Rect;

use crate::backend::PlatformBridge;
use crate::compositor::BackingStore;
use crate::error::{ProgrammingError, SurfaceError};
use crate::notify::{FocusReason, Notification};
use crate::trace::{FocusChangeEvent, WindowStateEvent};
use crate::widget::{INVALID, WidgetId, WidgetTree};

/// Display state of a top-level window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WindowState {
    /// Regular geometry.
    #[default]
    Normal,
    /// Iconified; painting is suspended and damage is kept.
    Minimized,
    /// Fills the available screen area, minus decorations.
    Maximized,
    /// Fills the whole screen.
    FullScreen,
}

impl WindowState {
    const fn is_expanded(self) -> bool {
        matches!(self, Self::Maximized | Self::FullScreen)
    }
}

/// Which windows a visible modal window blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Modality {
    /// Blocks nothing.
    #[default]
    NonModal,
    /// Blocks its chain of transient parents. Without a transient parent it
    /// behaves like [`ApplicationModal`](Self::ApplicationModal).
    WindowModal,
    /// Blocks every window that is not transient for it.
    ApplicationModal,
}

/// Per-window state, present only on top-levels.
#[derive(Clone, Debug, Default)]
pub(crate) struct TopLevel {
    pub(crate) backing: BackingStore,
    pub(crate) state: WindowState,
    /// Geometry to restore when leaving maximized or full-screen.
    pub(crate) normal_geometry: Option<Rect>,
    pub(crate) modality: Modality,
    pub(crate) transient_for: u32,
}

impl TopLevel {
    pub(crate) fn new() -> Self {
        Self {
            backing: BackingStore::new(),
            state: WindowState::Normal,
            normal_geometry: None,
            modality: Modality::NonModal,
            transient_for: INVALID,
        }
    }
}

impl<B: PlatformBridge> WidgetTree<B> {
    // -- Window state --

    /// Returns the state of a top-level window.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `id` is not a top-level.
    #[must_use]
    pub fn window_state(&self, id: WidgetId) -> WindowState {
        self.validate(id);
        self.windows[id.idx as usize]
            .as_ref()
            .map(|top| top.state)
            .unwrap_or_else(|| panic!("window_state on a child widget: {id:?}"))
    }

    /// Returns the geometry a maximized or full-screen window will return
    /// to, if any.
    #[must_use]
    pub fn normal_geometry(&self, id: WidgetId) -> Option<Rect> {
        self.validate(id);
        self.windows[id.idx as usize]
            .as_ref()
            .and_then(|top| top.normal_geometry)
    }

    /// Changes the state of a top-level window.
    ///
    /// The window receives [`Notification::WindowStateChange`] before its
    /// geometry changes. Applying this to a child is reported as
    /// [`ProgrammingError::NotATopLevel`] and ignored.
    pub fn set_window_state(&mut self, id: WidgetId, state: WindowState) {
        self.validate(id);
        let idx = id.idx;
        let rect = self.rect[idx as usize];
        let Some(top) = self.windows[idx as usize].as_mut() else {
            self.report(Some(idx), ProgrammingError::NotATopLevel);
            return;
        };
        let old = top.state;
        if old == state {
            return;
        }
        if state.is_expanded() && !old.is_expanded() && top.normal_geometry.is_none() {
            top.normal_geometry = Some(rect);
        }
        top.state = state;
        let restore = if state == WindowState::Normal {
            top.normal_geometry.take()
        } else {
            None
        };

        self.send(idx, &Notification::WindowStateChange { old });
        self.tracer().window_state(&WindowStateEvent {
            window: id,
            old,
            new: state,
        });

        let target = match state {
            WindowState::Maximized => Some(self.maximized_geometry(idx)),
            WindowState::FullScreen => Some(self.bridge.screen_geometry()),
            WindowState::Normal => restore,
            WindowState::Minimized => None,
        };
        if let Some(target) = target {
            let target = self.clamped(idx, target, false);
            self.apply_geometry(idx, target);
        }
        if old == WindowState::Minimized {
            self.reschedule(idx);
        }
    }

    /// Shows the window in the normal state.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn show_normal(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.set_window_state(id, WindowState::Normal);
        self.show(id)
    }

    /// Shows the window maximized.
    ///
    /// The window is mapped first so the decoration margins are known.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn show_maximized(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.show(id)?;
        self.set_window_state(id, WindowState::Maximized);
        Ok(())
    }

    /// Shows the window minimized.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn show_minimized(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.set_window_state(id, WindowState::Minimized);
        self.show(id)
    }

    /// Shows the window full-screen.
    ///
    /// # Errors
    ///
    /// See [`show`](Self::show).
    pub fn show_full_screen(&mut self, id: WidgetId) -> Result<(), SurfaceError> {
        self.show(id)?;
        self.set_window_state(id, WindowState::FullScreen);
        Ok(())
    }

    // -- Modality --

    /// Sets the window's modality. Takes effect the next time it is shown.
    pub fn set_modality(&mut self, id: WidgetId, modality: Modality) {
        self.validate(id);
        match self.windows[id.idx as usize].as_mut() {
            Some(top) => top.modality = modality,
            None => self.report(Some(id.idx), ProgrammingError::NotATopLevel),
        }
    }

    /// Returns the window's modality.
    #[must_use]
    pub fn modality(&self, id: WidgetId) -> Modality {
        self.validate(id);
        self.windows[id.idx as usize]
            .as_ref()
            .map_or(Modality::NonModal, |top| top.modality)
    }

    /// Makes `id` a transient (dialog) window of `parent`.
    pub fn set_transient_for(&mut self, id: WidgetId, parent: Option<WidgetId>) {
        self.validate(id);
        let target = match parent {
            Some(p) => {
                self.validate(p);
                if self.windows[p.idx as usize].is_none() {
                    self.report(Some(p.idx), ProgrammingError::NotATopLevel);
                    return;
                }
                p.idx
            }
            None => INVALID,
        };
        match self.windows[id.idx as usize].as_mut() {
            Some(top) => top.transient_for = target,
            None => self.report(Some(id.idx), ProgrammingError::NotATopLevel),
        }
    }

    /// Returns the window `id` is transient for.
    #[must_use]
    pub fn transient_for(&self, id: WidgetId) -> Option<WidgetId> {
        self.validate(id);
        self.id_or_none(self.transient_parent(id.idx))
    }

    // -- Activation --

    /// Returns the active window.
    #[must_use]
    pub fn active_window(&self) -> Option<WidgetId> {
        self.id_or_none(self.active_window)
    }

    /// Returns `true` if `id` is the active window.
    #[must_use]
    pub fn is_active_window(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.active_window == id.idx
    }

    /// Makes a visible window the active one.
    ///
    /// The previously active window's focus widget receives FocusOut and the
    /// window WindowDeactivate. The new window receives WindowActivate, and
    /// focus returns to the widget it last had (or the first tab-focusable
    /// widget) with [`FocusReason::ActiveWindow`]. Windows blocked by a modal
    /// window cannot be activated.
    pub fn activate_window(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        if self.windows[idx as usize].is_none() {
            self.report(Some(idx), ProgrammingError::NotATopLevel);
            return;
        }
        if self.active_window == idx || !self.visible[idx as usize] || self.is_blocked(idx) {
            return;
        }
        self.deactivate_active();
        self.active_window = idx;
        self.send(idx, &Notification::WindowActivate);

        let remembered = self.focus_child[idx as usize];
        let target = if remembered != INVALID
            && self.visible[remembered as usize]
            && self.is_enabled_idx(remembered)
        {
            remembered
        } else {
            self.navigate(idx, true).0
        };
        if target != INVALID {
            self.set_focus_idx(target, FocusReason::ActiveWindow);
        }
    }

    // -- Internal helpers --

    fn transient_parent(&self, idx: u32) -> u32 {
        self.windows[idx as usize]
            .as_ref()
            .map_or(INVALID, |top| top.transient_for)
    }

    /// Returns `true` if `window` is `ancestor` or reaches it through
    /// transient parents.
    pub(crate) fn is_transient_descendant(&self, window: u32, ancestor: u32) -> bool {
        let mut n = window;
        let mut steps = 0;
        while n != INVALID && steps <= self.len {
            if n == ancestor {
                return true;
            }
            n = self.transient_parent(n);
            steps += 1;
        }
        false
    }

    /// Returns `true` if a visible modal window blocks input to `window`.
    pub(crate) fn is_blocked(&self, window: u32) -> bool {
        for &modal in self.modal_stack.iter().rev() {
            if modal == window {
                return false;
            }
            if self.is_transient_descendant(window, modal) {
                continue;
            }
            let Some(top) = self.windows[modal as usize].as_ref() else {
                continue;
            };
            let blocks = match top.modality {
                Modality::NonModal => false,
                Modality::ApplicationModal => true,
                Modality::WindowModal => {
                    top.transient_for == INVALID
                        || self.is_transient_descendant(top.transient_for, window)
                }
            };
            if blocks {
                return true;
            }
        }
        false
    }

    fn maximized_geometry(&self, idx: u32) -> Rect {
        let available = self.bridge.available_geometry();
        match self.surface[idx as usize] {
            Some(s) => available - self.bridge.frame_margins(s),
            None => available,
        }
    }

    /// A user geometry change drops maximized and full-screen windows back to
    /// the normal state without restoring the snapshot.
    pub(crate) fn leave_maximized_for_user_geometry(&mut self, idx: u32) {
        let Some(top) = self.windows[idx as usize].as_mut() else {
            return;
        };
        let old = top.state;
        top.state = WindowState::Normal;
        top.normal_geometry = None;
        let window = self.id_at(idx);
        self.send(idx, &Notification::WindowStateChange { old });
        self.tracer().window_state(&WindowStateEvent {
            window,
            old,
            new: WindowState::Normal,
        });
    }

    /// Creates the native surface on first show.
    pub(crate) fn realize_window(&mut self, idx: u32) -> Result<(), SurfaceError> {
        if self.surface[idx as usize].is_some() {
            return Ok(());
        }
        let id = self.id_at(idx);
        let surface = self.bridge.create_surface(id, self.rect[idx as usize])?;
        self.surface[idx as usize] = Some(surface);
        Ok(())
    }

    /// Maps the surface, allocates the backing store, and activates.
    pub(crate) fn window_shown(&mut self, idx: u32) {
        if let Some(s) = self.surface[idx as usize] {
            self.bridge.set_surface_geometry(s, self.rect[idx as usize]);
            self.bridge.show_surface(s);
        }
        self.resize_backing(idx);
        let (modal, minimized) = self.windows[idx as usize]
            .as_ref()
            .map_or((false, false), |top| {
                (
                    top.modality != Modality::NonModal,
                    top.state == WindowState::Minimized,
                )
            });
        if modal {
            self.modal_stack.retain(|&m| m != idx);
            self.modal_stack.push(idx);
        }
        if !minimized {
            self.activate_window(self.id_at(idx));
        }
    }

    /// Unmaps the surface and drops damage before the window is hidden.
    pub(crate) fn window_hiding(&mut self, idx: u32) {
        if let Some(s) = self.surface[idx as usize] {
            self.bridge.hide_surface(s);
        }
        if let Some(top) = self.windows[idx as usize].as_mut() {
            top.backing.discard();
        }
        self.modal_stack.retain(|&m| m != idx);
        if self.active_window == idx {
            self.deactivate_active();
        }
    }

    /// Tears down window state when `idx` is destroyed or gains a parent.
    pub(crate) fn release_window(&mut self, idx: u32) {
        if let Some(s) = self.surface[idx as usize].take() {
            self.bridge.destroy_surface(s);
        }
        self.windows[idx as usize] = None;
        self.modal_stack.retain(|&m| m != idx);
        if self.active_window == idx {
            self.active_window = INVALID;
            if self.focus_widget != INVALID && self.window_of(self.focus_widget) == idx {
                self.focus_widget = INVALID;
            }
        }
        for top in self.windows.iter_mut().flatten() {
            if top.transient_for == idx {
                top.transient_for = INVALID;
            }
        }
    }

    fn deactivate_active(&mut self) {
        let old = self.active_window;
        if old == INVALID {
            return;
        }
        let focus = self.focus_widget;
        if focus != INVALID {
            self.focus_widget = INVALID;
            self.send(focus, &Notification::FocusOut(FocusReason::ActiveWindow));
            let event = FocusChangeEvent {
                old: Some(self.id_at(focus)),
                new: None,
                reason: FocusReason::ActiveWindow,
            };
            self.tracer().focus_change(&event);
        }
        self.active_window = INVALID;
        self.send(old, &Notification::WindowDeactivate);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Insets, Rect};

    use super::*;
    use crate::focus::FocusPolicy;
    use crate::testing::{Event, Recorder, TestBridge, log};

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn maximize_and_restore_is_exact() {
        for start in [
            rect(10.0, 20.0, 300.0, 200.0),
            rect(50.0, 50.0, 0.0, 0.0),
            rect(-5000.0, -300.0, 120.0, 80.0),
        ] {
            let mut tree = WidgetTree::with_bridge(TestBridge::default());
            let win = tree.create_widget(None, start);
            tree.show(win).unwrap();
            tree.set_window_state(win, WindowState::Maximized);
            assert_eq!(tree.geometry(win), tree.bridge().available);
            assert_eq!(tree.normal_geometry(win), Some(start));
            tree.set_window_state(win, WindowState::Normal);
            assert_eq!(tree.geometry(win), start);
            assert_eq!(tree.normal_geometry(win), None);
        }
    }

    #[test]
    fn snapshot_survives_chained_states() {
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let start = rect(10.0, 10.0, 100.0, 100.0);
        let win = tree.create_widget(None, start);
        tree.show(win).unwrap();
        tree.set_window_state(win, WindowState::Maximized);
        tree.set_window_state(win, WindowState::FullScreen);
        assert_eq!(tree.geometry(win), tree.bridge().screen);
        tree.set_window_state(win, WindowState::Minimized);
        tree.set_window_state(win, WindowState::Normal);
        assert_eq!(tree.geometry(win), start);
    }

    #[test]
    fn maximize_leaves_room_for_decorations() {
        let bridge = TestBridge {
            margins: Insets::new(2.0, 30.0, 2.0, 2.0),
            ..TestBridge::default()
        };
        let mut tree = WidgetTree::with_bridge(bridge);
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.show_maximized(win).unwrap();
        let available = tree.bridge().available;
        assert_eq!(tree.frame_geometry(win), available);
    }

    #[test]
    fn user_geometry_drops_maximized_state() {
        let log = log();
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.set_widget(win, Recorder::boxed("win", &log));
        tree.show_maximized(win).unwrap();
        log.borrow_mut().clear();

        tree.set_geometry(win, rect(5.0, 5.0, 50.0, 50.0));
        assert_eq!(tree.window_state(win), WindowState::Normal);
        assert_eq!(tree.normal_geometry(win), None);
        assert_eq!(
            log.borrow().first(),
            Some(&Event::Notify(
                "win",
                Notification::WindowStateChange {
                    old: WindowState::Maximized
                }
            ))
        );
    }

    #[test]
    fn state_change_is_notified_before_geometry() {
        let log = log();
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.set_widget(win, Recorder::boxed("win", &log));
        tree.show(win).unwrap();
        log.borrow_mut().clear();
        tree.set_window_state(win, WindowState::FullScreen);
        let kinds: Vec<_> = log
            .borrow()
            .iter()
            .map(|e| match e {
                Event::Notify(_, Notification::WindowStateChange { .. }) => "state",
                Event::Notify(_, Notification::Move { .. }) => "move",
                Event::Notify(_, Notification::Resize { .. }) => "resize",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["state", "resize"]);
    }

    #[test]
    fn state_on_child_is_reported() {
        let diags = crate::testing::diagnostics();
        let mut tree = WidgetTree::new();
        tree.set_trace_sink(alloc::boxed::Box::new(crate::testing::DiagSink(diags.clone())));
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        tree.set_window_state(child, WindowState::Maximized);
        assert_eq!(diags.borrow().as_slice(), &[ProgrammingError::NotATopLevel]);
    }

    #[test]
    #[should_panic(expected = "window_state on a child widget")]
    fn state_query_on_child_panics() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        let _ = tree.window_state(child);
    }

    #[test]
    fn activation_moves_focus_between_windows() {
        let log = log();
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let w1 = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let f1 = tree.create_widget(Some(w1), rect(0.0, 0.0, 10.0, 10.0));
        let w2 = tree.create_widget(None, rect(200.0, 0.0, 100.0, 100.0));
        let f2 = tree.create_widget(Some(w2), rect(0.0, 0.0, 10.0, 10.0));
        for f in [f1, f2] {
            tree.set_focus_policy(f, FocusPolicy::StrongFocus);
        }
        tree.set_widget(w1, Recorder::boxed("w1", &log));
        tree.set_widget(f1, Recorder::boxed("f1", &log));
        tree.set_widget(w2, Recorder::boxed("w2", &log));
        tree.set_widget(f2, Recorder::boxed("f2", &log));

        tree.show(w1).unwrap();
        assert_eq!(tree.focus_widget(), Some(f1));
        tree.show(w2).unwrap();
        assert_eq!(tree.active_window(), Some(w2));
        assert_eq!(tree.focus_widget(), Some(f2));
        log.borrow_mut().clear();

        tree.activate_window(w1);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Notify("f2", Notification::FocusOut(FocusReason::ActiveWindow)),
                Event::Notify("w2", Notification::WindowDeactivate),
                Event::Notify("w1", Notification::WindowActivate),
                Event::Notify("f1", Notification::FocusIn(FocusReason::ActiveWindow)),
            ]
        );
        assert_eq!(tree.focus_child(w2), Some(f2), "remembered for later");
    }

    #[test]
    fn hiding_active_window_deactivates() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.show(win).unwrap();
        assert!(tree.is_active_window(win));
        tree.hide(win);
        assert_eq!(tree.active_window(), None);
    }

    #[test]
    fn application_modal_blocks_other_windows() {
        let mut tree = WidgetTree::new();
        let main = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let other = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let dialog = tree.create_widget(None, rect(0.0, 0.0, 50.0, 50.0));
        let sub = tree.create_widget(None, rect(0.0, 0.0, 20.0, 20.0));
        tree.set_modality(dialog, Modality::ApplicationModal);
        tree.set_transient_for(sub, Some(dialog));
        for w in [main, other, dialog, sub] {
            tree.show(w).unwrap();
        }
        assert!(tree.is_blocked(main.idx));
        assert!(tree.is_blocked(other.idx));
        assert!(!tree.is_blocked(dialog.idx));
        assert!(!tree.is_blocked(sub.idx));

        tree.activate_window(main);
        assert_ne!(tree.active_window(), Some(main));

        tree.hide(dialog);
        assert!(!tree.is_blocked(main.idx));
    }

    #[test]
    fn window_modal_blocks_transient_chain_only() {
        let mut tree = WidgetTree::new();
        let root = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let doc = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let unrelated = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let sheet = tree.create_widget(None, rect(0.0, 0.0, 50.0, 50.0));
        tree.set_transient_for(doc, Some(root));
        tree.set_transient_for(sheet, Some(doc));
        tree.set_modality(sheet, Modality::WindowModal);
        for w in [root, doc, unrelated, sheet] {
            tree.show(w).unwrap();
        }
        assert!(tree.is_blocked(doc.idx));
        assert!(tree.is_blocked(root.idx));
        assert!(!tree.is_blocked(unrelated.idx));
        assert!(!tree.is_blocked(sheet.idx));
    }

    #[test]
    fn destroying_window_releases_surface() {
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let dialog = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        tree.set_transient_for(dialog, Some(win));
        tree.show(win).unwrap();
        assert_eq!(tree.bridge().surfaces.len(), 1);
        tree.destroy(win);
        assert!(tree.bridge().surfaces.is_empty());
        assert_eq!(tree.active_window(), None);
        assert_eq!(tree.transient_for(dialog), None);
    }

    #[test]
    fn surface_failure_leaves_window_hidden() {
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.bridge_mut().fail_next_surface = true;
        assert_eq!(tree.show(win), Err(SurfaceError::ResourceExhaustion));
        assert!(!tree.is_visible(win));
        assert!(tree.surface(win).is_none());
        assert!(tree.show(win).is_ok());
        assert!(tree.is_visible(win));
    }
}
