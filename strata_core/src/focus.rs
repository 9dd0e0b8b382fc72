// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyboard focus and the focus chain.
//!
//! Every window has a circular, doubly linked focus ring whose head is the
//! window itself; widgets join the ring of their window when created and
//! are spliced out of it when destroyed or moved to another window. Tab
//! navigation walks the ring, skipping widgets that do not accept tab focus
//! or are disabled or hidden. Crossing the head is a wrap, which the
//! platform bridge may veto.
//!
//! Each widget also remembers which descendant last had focus
//! (`focus_child`), so that activating a window restores focus where it was.

use alloc::vec::Vec;

use crate::backend::PlatformBridge;
use crate::error::ProgrammingError;
use crate::notify::{FocusReason, Notification};
use crate::trace::FocusChangeEvent;
use crate::widget::{INVALID, WidgetId, WidgetTree};

/// How a widget accepts keyboard focus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FocusPolicy {
    /// Never takes focus on its own.
    #[default]
    NoFocus,
    /// Takes focus through tab navigation.
    TabFocus,
    /// Takes focus when clicked.
    ClickFocus,
    /// Takes focus through tab navigation and clicks.
    StrongFocus,
}

impl FocusPolicy {
    /// Returns `true` if tab navigation may land on the widget.
    #[must_use]
    pub const fn accepts_tab(self) -> bool {
        matches!(self, Self::TabFocus | Self::StrongFocus)
    }

    /// Returns `true` if a click gives the widget focus.
    #[must_use]
    pub const fn accepts_click(self) -> bool {
        matches!(self, Self::ClickFocus | Self::StrongFocus)
    }
}

impl<B: PlatformBridge> WidgetTree<B> {
    // -- Policy --

    /// Sets how the widget accepts focus.
    pub fn set_focus_policy(&mut self, id: WidgetId, policy: FocusPolicy) {
        self.validate(id);
        self.focus_policy[id.idx as usize] = policy;
    }

    /// Returns how the widget accepts focus.
    #[must_use]
    pub fn focus_policy(&self, id: WidgetId) -> FocusPolicy {
        self.validate(id);
        self.focus_policy[id.idx as usize]
    }

    // -- Queries --

    /// Returns the widget holding keyboard focus, if any.
    #[must_use]
    pub fn focus_widget(&self) -> Option<WidgetId> {
        self.id_or_none(self.focus_widget)
    }

    /// Returns `true` if the widget holds keyboard focus.
    #[must_use]
    pub fn has_focus(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.focus_widget == id.idx
    }

    /// Returns the descendant that last had (or will get) focus within `id`.
    #[must_use]
    pub fn focus_child(&self, id: WidgetId) -> Option<WidgetId> {
        self.validate(id);
        self.id_or_none(self.focus_child[id.idx as usize])
    }

    /// Returns the widget after `id` in its window's focus ring.
    #[must_use]
    pub fn next_in_focus_chain(&self, id: WidgetId) -> WidgetId {
        self.validate(id);
        self.id_at(self.focus_next[id.idx as usize])
    }

    /// Returns the widget before `id` in its window's focus ring.
    #[must_use]
    pub fn prev_in_focus_chain(&self, id: WidgetId) -> WidgetId {
        self.validate(id);
        self.id_at(self.focus_prev[id.idx as usize])
    }

    /// Returns where tab navigation from `id` would land.
    ///
    /// Widgets that do not accept tab focus, are disabled, or are hidden are
    /// skipped. If `id` itself is the only candidate it is returned. Using a
    /// disabled widget as the starting point is reported as a
    /// [`ProgrammingError::DisabledInFocusChain`] diagnostic; navigation
    /// still proceeds from its position in the ring.
    pub fn next_focus_target(&mut self, id: WidgetId, forward: bool) -> Option<WidgetId> {
        self.validate(id);
        if !self.is_enabled_idx(id.idx) {
            self.report(Some(id.idx), ProgrammingError::DisabledInFocusChain);
        }
        let (target, _) = self.navigate(id.idx, forward);
        self.id_or_none(target)
    }

    // -- Mutation --

    /// Gives the widget keyboard focus.
    ///
    /// Disabled widgets refuse focus; the call is a no-op. If the widget's
    /// window is not active (or the widget is hidden) focus is only
    /// remembered and applied when the window is activated. Otherwise the
    /// old focus widget receives FocusAboutToChange, then FocusOut, and the
    /// new one FocusIn.
    pub fn set_focus(&mut self, id: WidgetId, reason: FocusReason) {
        self.validate(id);
        self.set_focus_idx(id.idx, reason);
    }

    /// Takes focus away from the widget if it has it, and forgets it as the
    /// remembered focus of its ancestors.
    pub fn clear_focus(&mut self, id: WidgetId) {
        self.validate(id);
        self.clear_focus_idx(id.idx);
    }

    /// Moves focus to the next (or previous) widget in the active window.
    ///
    /// Returns `false` if there is nowhere to go or the platform vetoed
    /// wrapping around the end of the chain.
    pub fn focus_next_prev(&mut self, forward: bool) -> bool {
        let from = if self.focus_widget != INVALID {
            self.focus_widget
        } else if self.active_window != INVALID {
            self.active_window
        } else {
            return false;
        };
        let (target, wrapped) = self.navigate(from, forward);
        if target == INVALID || target == from {
            return false;
        }
        // Without focus the walk starts at the head, so leaving it is no wrap.
        if wrapped && self.focus_widget != INVALID {
            let window = self.id_at(self.window_of(from));
            if !self.bridge.focus_wrap(window, forward) {
                return false;
            }
        }
        let reason = if forward {
            FocusReason::Tab
        } else {
            FocusReason::Backtab
        };
        self.set_focus_idx(target, reason);
        true
    }

    /// Places `second` directly after `first` in the focus ring.
    ///
    /// Both widgets must be in the same window
    /// ([`ProgrammingError::TabOrderAcrossWindows`] otherwise) and accept
    /// tab focus while enabled ([`ProgrammingError::DisabledInFocusChain`]
    /// otherwise); violations are reported and ignored. Windows keep their
    /// place at the head of their ring.
    pub fn set_tab_order(&mut self, first: WidgetId, second: WidgetId) {
        self.validate(first);
        self.validate(second);
        let (a, b) = (first.idx, second.idx);
        if self.window_of(a) != self.window_of(b) {
            self.report(Some(b), ProgrammingError::TabOrderAcrossWindows);
            return;
        }
        for w in [a, b] {
            if !self.focus_policy[w as usize].accepts_tab() || !self.is_enabled_idx(w) {
                self.report(Some(w), ProgrammingError::DisabledInFocusChain);
                return;
            }
        }
        if a == b || self.parent[b as usize] == INVALID || self.focus_next[a as usize] == b {
            return;
        }
        self.focus_ring_remove(b);
        self.focus_ring_insert_after(a, b);
    }

    // -- Internal helpers --

    pub(crate) fn set_focus_idx(&mut self, idx: u32, reason: FocusReason) {
        if !self.is_enabled_idx(idx) {
            return;
        }
        let window = self.window_of(idx);
        if self.focus_widget == idx {
            self.set_focus_chain(idx);
            return;
        }
        if self.active_window != window || !self.visible[idx as usize] {
            self.set_focus_chain(idx);
            return;
        }

        let prev = self.focus_widget;
        if prev != INVALID {
            self.send(prev, &Notification::FocusAboutToChange(reason));
        }
        self.set_focus_chain(idx);
        self.focus_widget = idx;
        if prev != INVALID {
            self.send(prev, &Notification::FocusOut(reason));
        }
        let event = FocusChangeEvent {
            old: self.id_or_none(prev),
            new: Some(self.id_at(idx)),
            reason,
        };
        self.tracer().focus_change(&event);
        self.send(idx, &Notification::FocusIn(reason));
    }

    pub(crate) fn clear_focus_idx(&mut self, idx: u32) {
        self.forget_focus_child(idx);
        if self.focus_widget != idx {
            return;
        }
        self.focus_widget = INVALID;
        self.send(idx, &Notification::FocusOut(FocusReason::Other));
        let event = FocusChangeEvent {
            old: Some(self.id_at(idx)),
            new: None,
            reason: FocusReason::Other,
        };
        self.tracer().focus_change(&event);
    }

    /// Records `idx` as the remembered focus of itself and every ancestor.
    fn set_focus_chain(&mut self, idx: u32) {
        let mut n = idx;
        while n != INVALID {
            self.focus_child[n as usize] = idx;
            n = self.parent[n as usize];
        }
    }

    /// Clears ancestor `focus_child` pointers that name `idx`.
    pub(crate) fn forget_focus_child(&mut self, idx: u32) {
        let mut n = idx;
        while n != INVALID {
            if self.focus_child[n as usize] == idx {
                self.focus_child[n as usize] = INVALID;
            }
            n = self.parent[n as usize];
        }
    }

    /// Clears ancestor `focus_child` pointers that point into `root`'s
    /// subtree.
    pub(crate) fn forget_focus_children_in(&mut self, root: u32) {
        let mut n = self.parent[root as usize];
        while n != INVALID {
            let fc = self.focus_child[n as usize];
            if fc != INVALID && self.is_in_subtree(fc, root) {
                self.focus_child[n as usize] = INVALID;
            }
            n = self.parent[n as usize];
        }
    }

    fn accepts_tab_now(&self, idx: u32) -> bool {
        self.focus_policy[idx as usize].accepts_tab()
            && self.visible[idx as usize]
            && self.is_enabled_idx(idx)
    }

    /// Walks the ring from `from` to the next widget satisfying `accept`.
    ///
    /// Returns the target (or [`INVALID`]) and whether the walk crossed the
    /// window at the head of the ring.
    fn find_in_ring(&self, from: u32, forward: bool, accept: impl Fn(u32) -> bool) -> (u32, bool) {
        let window = self.window_of(from);
        let mut wrapped = false;
        let mut cur = from;
        loop {
            if !forward && cur == window {
                wrapped = true;
            }
            cur = if forward {
                self.focus_next[cur as usize]
            } else {
                self.focus_prev[cur as usize]
            };
            if forward && cur == window {
                wrapped = true;
            }
            if cur == from {
                return (if accept(from) { from } else { INVALID }, wrapped);
            }
            if accept(cur) {
                return (cur, wrapped);
            }
        }
    }

    pub(crate) fn navigate(&self, from: u32, forward: bool) -> (u32, bool) {
        self.find_in_ring(from, forward, |n| self.accepts_tab_now(n))
    }

    /// Moves focus out of `root`'s subtree after it was hidden or disabled.
    pub(crate) fn relocate_focus(&mut self, root: u32) {
        let focus = self.focus_widget;
        if focus == INVALID || !self.is_in_subtree(focus, root) {
            self.forget_focus_children_in(root);
            return;
        }
        let (target, _) = self.find_in_ring(root, true, |n| {
            !self.is_in_subtree(n, root) && self.accepts_tab_now(n)
        });
        if target == INVALID {
            self.clear_focus_idx(focus);
        } else {
            self.set_focus_idx(target, FocusReason::Other);
        }
        self.forget_focus_children_in(root);
    }

    /// Moves focus to the nearest focusable ancestor of `root` before the
    /// subtree is destroyed, or clears it.
    pub(crate) fn evacuate_focus_for_destroy(&mut self, root: u32) {
        let focus = self.focus_widget;
        if focus == INVALID || !self.is_in_subtree(focus, root) {
            return;
        }
        let mut n = self.parent[root as usize];
        while n != INVALID {
            if self.focus_policy[n as usize] != FocusPolicy::NoFocus
                && self.visible[n as usize]
                && self.is_enabled_idx(n)
            {
                self.set_focus_idx(n, FocusReason::Other);
                return;
            }
            n = self.parent[n as usize];
        }
        self.clear_focus_idx(focus);
    }

    // -- Ring primitives --

    /// Links detached `idx` into a ring after `anchor`. Re-inserting a
    /// linked widget moves it.
    pub(crate) fn focus_ring_insert_after(&mut self, anchor: u32, idx: u32) {
        if anchor == idx {
            return;
        }
        self.focus_ring_remove(idx);
        let next = self.focus_next[anchor as usize];
        self.focus_next[anchor as usize] = idx;
        self.focus_prev[idx as usize] = anchor;
        self.focus_next[idx as usize] = next;
        self.focus_prev[next as usize] = idx;
    }

    /// Unlinks `idx` from its ring. Detached widgets are left alone.
    pub(crate) fn focus_ring_remove(&mut self, idx: u32) {
        let next = self.focus_next[idx as usize];
        if next == idx {
            return;
        }
        let prev = self.focus_prev[idx as usize];
        self.focus_next[prev as usize] = next;
        self.focus_prev[next as usize] = prev;
        self.focus_next[idx as usize] = idx;
        self.focus_prev[idx as usize] = idx;
    }

    /// Members of `root`'s subtree in `window`'s ring, in ring order
    /// starting from the head.
    pub(crate) fn focus_ring_members_of_subtree(&self, window: u32, root: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = window;
        loop {
            if self.is_in_subtree(cur, root) {
                out.push(cur);
            }
            cur = self.focus_next[cur as usize];
            if cur == window {
                break;
            }
        }
        out
    }

    /// Moves `members` (in order) to the end of `window`'s ring. If the
    /// first member is `window` itself the members form a new ring headed
    /// by it.
    pub(crate) fn focus_ring_splice(&mut self, members: &[u32], window: u32) {
        for &m in members {
            self.focus_ring_remove(m);
        }
        let mut anchor = if members.first() == Some(&window) || members.contains(&window) {
            window
        } else {
            self.focus_prev[window as usize]
        };
        for &m in members {
            if m == window {
                continue;
            }
            self.focus_ring_insert_after(anchor, m);
            anchor = m;
        }
    }
}
