// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Input routing.
//!
//! An [`InputEvent`] arriving for a window is delivered to exactly one
//! widget:
//!
//! 1. the widget holding the matching grab (mouse or keyboard), if any;
//! 2. otherwise, for pointer events, the topmost visible widget under the
//!    position (masks respected);
//! 3. otherwise, for keyboard events, the focus widget of the active window.
//!
//! Windows blocked by a visible modal window receive nothing, and neither
//! does a grabber inside one. Events a widget does not accept are not
//! forwarded to its parent.

use alloc::vec::Vec;

use crate::backend::PlatformBridge;
use crate::error::ProgrammingError;
use crate::notify::{FocusReason, InputEvent, WidgetCtx};
use crate::widget::{INVALID, SurfaceHandle, WidgetId, WidgetTree};

/// What happened to a routed event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteOutcome {
    /// The event reached `target`.
    Delivered {
        /// The receiving widget.
        target: WidgetId,
        /// Whether its implementation accepted the event.
        accepted: bool,
    },
    /// A modal window blocks the event's window.
    Blocked,
    /// No enabled widget could receive the event.
    NoTarget,
}

impl<B: PlatformBridge> WidgetTree<B> {
    // -- Grabs --

    /// Routes every pointer event to `id` until released. Ignored for
    /// widgets that are not visible.
    pub fn grab_mouse(&mut self, id: WidgetId) {
        self.validate(id);
        if self.visible[id.idx as usize] {
            self.mouse_grab = id.idx;
        }
    }

    /// Releases the mouse grab if `id` holds it.
    pub fn release_mouse(&mut self, id: WidgetId) {
        self.validate(id);
        if self.mouse_grab == id.idx {
            self.mouse_grab = INVALID;
        }
    }

    /// Returns the widget holding the mouse grab.
    #[must_use]
    pub fn mouse_grabber(&self) -> Option<WidgetId> {
        self.id_or_none(self.mouse_grab)
    }

    /// Routes every keyboard event to `id` until released. Ignored for
    /// widgets that are not visible.
    pub fn grab_keyboard(&mut self, id: WidgetId) {
        self.validate(id);
        if self.visible[id.idx as usize] {
            self.keyboard_grab = id.idx;
        }
    }

    /// Releases the keyboard grab if `id` holds it.
    pub fn release_keyboard(&mut self, id: WidgetId) {
        self.validate(id);
        if self.keyboard_grab == id.idx {
            self.keyboard_grab = INVALID;
        }
    }

    /// Returns the widget holding the keyboard grab.
    #[must_use]
    pub fn keyboard_grabber(&self) -> Option<WidgetId> {
        self.id_or_none(self.keyboard_grab)
    }

    // -- Routing --

    /// Returns `true` if a visible modal window blocks input to `window`.
    #[must_use]
    pub fn is_blocked_by_modal(&self, window: WidgetId) -> bool {
        self.validate(window);
        self.is_blocked(self.window_of(window.idx))
    }

    /// Delivers `event` arriving at `window`. Pointer positions are in
    /// window coordinates.
    pub fn route(&mut self, window: WidgetId, event: InputEvent) -> RouteOutcome {
        self.validate(window);
        let idx = window.idx;
        if self.windows[idx as usize].is_none() {
            self.report(Some(idx), ProgrammingError::NotATopLevel);
            return RouteOutcome::NoTarget;
        }

        let Some(pos) = event.position() else {
            let grab = self.keyboard_grab;
            if grab != INVALID {
                if self.is_blocked(self.window_of(grab)) {
                    return RouteOutcome::Blocked;
                }
                return self.deliver(grab, &event);
            }
            if self.is_blocked(idx) {
                return RouteOutcome::Blocked;
            }
            if self.active_window != idx || self.focus_widget == INVALID {
                return RouteOutcome::NoTarget;
            }
            return self.deliver(self.focus_widget, &event);
        };

        let grab = self.mouse_grab;
        if grab != INVALID {
            if self.is_blocked(self.window_of(grab)) {
                return RouteOutcome::Blocked;
            }
            let offset = self.global_offset(idx) - self.global_offset(grab);
            return self.deliver(grab, &event.translated(offset));
        }
        if self.is_blocked(idx) {
            return RouteOutcome::Blocked;
        }
        if !self.visible[idx as usize] {
            return RouteOutcome::NoTarget;
        }
        let target = self.hit_test(idx, pos);
        if target == INVALID {
            return RouteOutcome::NoTarget;
        }
        if matches!(event, InputEvent::PointerDown { .. }) {
            self.focus_on_click(target);
        }
        let local = event.translated(-self.window_offset(target));
        self.deliver(target, &local)
    }

    /// Delivers `event` arriving at a native surface. Unknown surfaces have
    /// no target.
    pub fn route_native(&mut self, surface: SurfaceHandle, event: InputEvent) -> RouteOutcome {
        let Some(id) = self.bridge.widget_for_surface(surface) else {
            return RouteOutcome::NoTarget;
        };
        if !self.is_alive(id) {
            return RouteOutcome::NoTarget;
        }
        let window = self.window_of(id.idx);
        let offset = self.window_offset(id.idx);
        self.route(self.id_at(window), event.translated(offset))
    }

    // -- Internal helpers --

    /// Gives focus to the nearest ancestor-or-self of `idx` that takes focus
    /// on click.
    fn focus_on_click(&mut self, idx: u32) {
        let mut n = idx;
        while n != INVALID {
            if self.focus_policy[n as usize].accepts_click() {
                if self.is_enabled_idx(n) {
                    self.set_focus_idx(n, FocusReason::Mouse);
                }
                return;
            }
            n = self.parent[n as usize];
        }
    }

    fn deliver(&mut self, idx: u32, event: &InputEvent) -> RouteOutcome {
        if !self.is_enabled_idx(idx) {
            return RouteOutcome::NoTarget;
        }
        let target = self.id_at(idx);
        let Some(mut handler) = self.handlers[idx as usize].take() else {
            return RouteOutcome::Delivered {
                target,
                accepted: false,
            };
        };
        let mut requests = Vec::new();
        let accepted = {
            let mut ctx = WidgetCtx::new(target, self.rect[idx as usize], &mut requests);
            handler.input(&mut ctx, event)
        };
        if self.handlers[idx as usize].is_none() {
            self.handlers[idx as usize] = Some(handler);
        }
        self.apply_requests(target, requests);
        RouteOutcome::Delivered { target, accepted }
    }
}
