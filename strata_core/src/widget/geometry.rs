// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget geometry: placement, size constraints, and coordinate mapping.
//!
//! A widget's rectangle is expressed in its parent's coordinate space; a
//! top-level's rectangle is in screen coordinates. Window-local coordinates
//! have their origin at the top-left corner of the containing top-level.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use understory_dirty::EagerPolicy;

use super::id::{INVALID, WidgetId};
use super::store::WidgetTree;
use crate::backend::PlatformBridge;
use crate::dirty;
use crate::error::ProgrammingError;
use crate::notify::Notification;
use crate::window::WindowState;

/// Largest width or height a widget may have.
pub const MAX_WIDGET_EXTENT: f64 = 16_777_215.0;

impl<B: PlatformBridge> WidgetTree<B> {
    // -- Queries --

    /// Returns the widget's rectangle in parent coordinates (screen
    /// coordinates for top-levels).
    #[must_use]
    #[inline]
    pub fn geometry(&self, id: WidgetId) -> Rect {
        self.validate(id);
        self.rect[id.idx as usize]
    }

    /// Returns the widget's position in parent coordinates.
    #[must_use]
    #[inline]
    pub fn pos(&self, id: WidgetId) -> Point {
        self.geometry(id).origin()
    }

    /// Returns the widget's size.
    #[must_use]
    #[inline]
    pub fn size(&self, id: WidgetId) -> Size {
        self.geometry(id).size()
    }

    /// Returns the widget's rectangle in its own coordinates.
    #[must_use]
    #[inline]
    pub fn local_rect(&self, id: WidgetId) -> Rect {
        self.size(id).to_rect()
    }

    /// Returns the geometry of a window including its decorations, as
    /// reported by the platform. Children have no frame.
    #[must_use]
    pub fn frame_geometry(&self, id: WidgetId) -> Rect {
        self.validate(id);
        let rect = self.rect[id.idx as usize];
        match self.surface[id.idx as usize] {
            Some(s) if self.parent[id.idx as usize] == INVALID => {
                rect + self.bridge.frame_margins(s)
            }
            _ => rect,
        }
    }

    /// Returns the minimum size.
    #[must_use]
    pub fn minimum_size(&self, id: WidgetId) -> Size {
        self.validate(id);
        self.min_size[id.idx as usize]
    }

    /// Returns the maximum size.
    #[must_use]
    pub fn maximum_size(&self, id: WidgetId) -> Size {
        self.validate(id);
        self.max_size[id.idx as usize]
    }

    // -- Mutation --

    /// Places the widget at `rect` (parent coordinates).
    ///
    /// The size is clamped to the widget's minimum and maximum; clamping is
    /// reported as a [`ProgrammingError::GeometryClamped`] diagnostic. If the
    /// widget is visible, Move and Resize are delivered immediately and the
    /// affected area is invalidated; a pure translation of an opaque,
    /// unobstructed widget moves the painted pixels instead of repainting
    /// them. Otherwise the notifications are delivered when it is next shown.
    ///
    /// Changing the geometry of a maximized or full-screen window returns it
    /// to the normal state.
    pub fn set_geometry(&mut self, id: WidgetId, rect: Rect) {
        self.validate(id);
        let idx = id.idx;
        let rect = self.clamped(idx, rect, true);
        if rect == self.rect[idx as usize] {
            return;
        }
        if let Some(top) = &self.windows[idx as usize] {
            if matches!(top.state, WindowState::Maximized | WindowState::FullScreen) {
                self.leave_maximized_for_user_geometry(idx);
            }
        }
        self.apply_geometry(idx, rect);
    }

    /// Moves the widget to `pos` (parent coordinates), keeping its size.
    pub fn move_to(&mut self, id: WidgetId, pos: Point) {
        let size = self.size(id);
        self.set_geometry(id, Rect::from_origin_size(pos, size));
    }

    /// Resizes the widget, keeping its position.
    pub fn resize(&mut self, id: WidgetId, size: Size) {
        let pos = self.pos(id);
        self.set_geometry(id, Rect::from_origin_size(pos, size));
    }

    /// Sets the minimum size.
    ///
    /// Negative extents are clamped to zero and extents above
    /// [`MAX_WIDGET_EXTENT`] are clamped down, each with a diagnostic. A
    /// minimum above the current maximum raises the maximum. The widget
    /// grows if it is smaller than the new minimum.
    pub fn set_minimum_size(&mut self, id: WidgetId, size: Size) {
        self.validate(id);
        let idx = id.idx;
        let minimum = self.sanitize_extent(idx, size);
        let current_max = self.max_size[idx as usize];
        let maximum = Size::new(
            current_max.width.max(minimum.width),
            current_max.height.max(minimum.height),
        );
        if maximum != current_max {
            self.report(
                Some(idx),
                ProgrammingError::MinimumExceedsMaximum { minimum, maximum },
            );
        }
        self.min_size[idx as usize] = minimum;
        self.max_size[idx as usize] = maximum;
        self.reclamp(idx);
    }

    /// Sets the maximum size.
    ///
    /// Clamping follows [`set_minimum_size`](Self::set_minimum_size); a
    /// maximum below the current minimum lowers the minimum. The widget
    /// shrinks if it is larger than the new maximum.
    pub fn set_maximum_size(&mut self, id: WidgetId, size: Size) {
        self.validate(id);
        let idx = id.idx;
        let maximum = self.sanitize_extent(idx, size);
        let current_min = self.min_size[idx as usize];
        let minimum = Size::new(
            current_min.width.min(maximum.width),
            current_min.height.min(maximum.height),
        );
        if minimum != current_min {
            self.report(
                Some(idx),
                ProgrammingError::MinimumExceedsMaximum { minimum, maximum },
            );
        }
        self.min_size[idx as usize] = minimum;
        self.max_size[idx as usize] = maximum;
        self.reclamp(idx);
    }

    /// Pins the widget to a single size.
    pub fn set_fixed_size(&mut self, id: WidgetId, size: Size) {
        self.set_maximum_size(id, size);
        self.set_minimum_size(id, size);
    }

    // -- Coordinate mapping --

    /// Maps a point from widget coordinates to window-local coordinates.
    #[must_use]
    pub fn map_to_window(&self, id: WidgetId, point: Point) -> Point {
        self.validate(id);
        point + self.window_offset(id.idx)
    }

    /// Maps a point from window-local coordinates to widget coordinates.
    #[must_use]
    pub fn map_from_window(&self, id: WidgetId, point: Point) -> Point {
        self.validate(id);
        point - self.window_offset(id.idx)
    }

    /// Maps a point from widget coordinates to screen coordinates.
    #[must_use]
    pub fn map_to_global(&self, id: WidgetId, point: Point) -> Point {
        self.validate(id);
        point + self.global_offset(id.idx)
    }

    /// Maps a point from screen coordinates to widget coordinates.
    #[must_use]
    pub fn map_from_global(&self, id: WidgetId, point: Point) -> Point {
        self.validate(id);
        point - self.global_offset(id.idx)
    }

    /// Maps a point from `from`'s coordinates to `to`'s coordinates.
    #[must_use]
    pub fn map_to(&self, from: WidgetId, to: WidgetId, point: Point) -> Point {
        self.map_from_global(to, self.map_to_global(from, point))
    }

    // -- Internal helpers --

    /// Offset of `idx`'s coordinate space within its window.
    pub(crate) fn window_offset(&self, mut idx: u32) -> Vec2 {
        let mut offset = Vec2::ZERO;
        while self.parent[idx as usize] != INVALID {
            offset += self.rect[idx as usize].origin().to_vec2();
            idx = self.parent[idx as usize];
        }
        offset
    }

    /// Offset of `idx`'s coordinate space on screen.
    pub(crate) fn global_offset(&self, idx: u32) -> Vec2 {
        let window = self.window_of(idx);
        self.window_offset(idx) + self.rect[window as usize].origin().to_vec2()
    }

    /// Clamps a size to the widget's limits.
    pub(crate) fn clamp_size(&self, idx: u32, size: Size) -> Size {
        size.clamp(self.min_size[idx as usize], self.max_size[idx as usize])
    }

    /// Clamps `rect`'s size, optionally reporting the adjustment.
    pub(crate) fn clamped(&mut self, idx: u32, rect: Rect, report: bool) -> Rect {
        let requested = rect.size();
        let applied = self.clamp_size(idx, requested);
        if report && applied != requested {
            self.report(
                Some(idx),
                ProgrammingError::GeometryClamped { requested, applied },
            );
        }
        Rect::from_origin_size(rect.origin(), applied)
    }

    fn sanitize_extent(&mut self, idx: u32, requested: Size) -> Size {
        if requested.width < 0.0 || requested.height < 0.0 {
            self.report(
                Some(idx),
                ProgrammingError::NegativeMinimumSize { requested },
            );
        }
        let applied = Size::new(
            requested.width.clamp(0.0, MAX_WIDGET_EXTENT),
            requested.height.clamp(0.0, MAX_WIDGET_EXTENT),
        );
        if applied.width < requested.width || applied.height < requested.height {
            self.report(
                Some(idx),
                ProgrammingError::GeometryClamped { requested, applied },
            );
        }
        applied
    }

    fn reclamp(&mut self, idx: u32) {
        let rect = self.rect[idx as usize];
        let clamped = self.clamped(idx, rect, false);
        self.apply_geometry(idx, clamped);
    }

    /// Applies an already-clamped rectangle: delivers or defers Move and
    /// Resize, then invalidates and forwards native geometry.
    ///
    /// Handlers run before invalidation, so damage they request lands in the
    /// same pass. Invalidation covers the old rectangle and whatever geometry
    /// the handlers left behind.
    pub(crate) fn apply_geometry(&mut self, idx: u32, new: Rect) {
        let i = idx as usize;
        let old = self.rect[i];
        if old == new {
            return;
        }
        self.rect[i] = new;
        self.dirty.mark_with(idx, dirty::OPAQUE, &EagerPolicy);
        if self.parent[i] == INVALID {
            if let Some(s) = self.surface[i] {
                self.bridge.set_surface_geometry(s, new);
            }
        }

        self.notify_geometry(idx);

        let current = self.rect[i];
        if current == old {
            return;
        }
        let resized = old.size() != current.size();
        if self.parent[i] == INVALID {
            if resized {
                self.resize_backing(idx);
            }
        } else {
            if self.visible[i] {
                if resized {
                    self.invalidate_resized(idx, old);
                } else {
                    self.move_rect(idx, old);
                }
            }
            self.sync_native_geometry(idx);
        }
    }

    fn notify_geometry(&mut self, idx: u32) {
        let i = idx as usize;
        let old = self.notified_rect[i];
        let new = self.rect[i];
        let moved = old.origin() != new.origin();
        let resized = old.size() != new.size();
        if !self.visible[i] {
            self.flags[i].pending_move |= moved;
            self.flags[i].pending_resize |= resized;
            return;
        }
        self.notified_rect[i] = new;
        if moved {
            self.send(
                idx,
                &Notification::Move {
                    old: old.origin(),
                    new: new.origin(),
                },
            );
        }
        if resized {
            self.send(
                idx,
                &Notification::Resize {
                    old: old.size(),
                    new: new.size(),
                },
            );
        }
    }

    /// Repositions native child surfaces in the subtree of `idx`.
    fn sync_native_geometry(&mut self, idx: u32) {
        let mut stack: Vec<u32> = alloc::vec![idx];
        while let Some(n) = stack.pop() {
            if let Some(s) = self.surface[n as usize] {
                let p = self.parent[n as usize];
                let rect = self.rect[n as usize] + self.window_offset(p);
                self.bridge.set_surface_geometry(s, rect);
            }
            stack.extend(self.child_indices(n));
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec;
    use alloc::vec::Vec;

    use kurbo::{Insets, Point, Rect, Size};

    use super::MAX_WIDGET_EXTENT;
    use crate::error::ProgrammingError;
    use crate::notify::Notification;
    use crate::testing::{DiagSink, Event, Recorder, TestBridge, log};
    use crate::widget::WidgetTree;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn mapping_accumulates_offsets() {
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(100.0, 200.0, 400.0, 400.0));
        let a = tree.create_widget(Some(win), rect(10.0, 20.0, 100.0, 100.0));
        let b = tree.create_widget(Some(a), rect(5.0, 5.0, 10.0, 10.0));

        assert_eq!(tree.map_to_window(b, Point::ZERO), Point::new(15.0, 25.0));
        assert_eq!(tree.map_to_global(b, Point::ZERO), Point::new(115.0, 225.0));
        assert_eq!(
            tree.map_from_global(b, Point::new(115.0, 225.0)),
            Point::ZERO
        );
        assert_eq!(tree.map_to(b, a, Point::new(1.0, 1.0)), Point::new(6.0, 6.0));
        assert_eq!(tree.map_from_window(win, Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
    }

    #[test]
    fn visible_move_notifies_immediately() {
        let log = log();
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        tree.show(win).unwrap();
        tree.set_widget(child, Recorder::boxed("child", &log));
        log.borrow_mut().clear();

        tree.set_geometry(child, rect(5.0, 5.0, 20.0, 10.0));
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Notify(
                    "child",
                    Notification::Move {
                        old: Point::ZERO,
                        new: Point::new(5.0, 5.0)
                    }
                ),
                Event::Notify(
                    "child",
                    Notification::Resize {
                        old: Size::new(10.0, 10.0),
                        new: Size::new(20.0, 10.0)
                    }
                ),
            ]
        );
    }

    #[test]
    fn hidden_geometry_changes_are_deferred_and_collapsed() {
        let log = log();
        let mut tree = WidgetTree::new();
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        tree.show(win).unwrap();
        tree.set_widget(child, Recorder::boxed("child", &log));
        tree.show(child).unwrap();
        tree.hide(child);
        log.borrow_mut().clear();

        tree.move_to(child, Point::new(1.0, 1.0));
        tree.move_to(child, Point::new(2.0, 2.0));
        assert!(log.borrow().is_empty());

        tree.show(child).unwrap();
        let moves: Vec<_> = log
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Notify(_, Notification::Move { .. })))
            .cloned()
            .collect();
        assert_eq!(
            moves,
            vec![Event::Notify(
                "child",
                Notification::Move {
                    old: Point::ZERO,
                    new: Point::new(2.0, 2.0)
                }
            )]
        );
    }

    #[test]
    fn geometry_is_clamped_with_diagnostic() {
        let diags = crate::testing::diagnostics();
        let mut tree = WidgetTree::new();
        tree.set_trace_sink(Box::new(DiagSink(diags.clone())));
        let w = tree.create_widget(None, rect(0.0, 0.0, 50.0, 50.0));
        tree.set_maximum_size(w, Size::new(40.0, 40.0));
        assert_eq!(tree.size(w), Size::new(40.0, 40.0));
        assert!(diags.borrow().is_empty(), "shrinking to a new maximum is silent");

        tree.resize(w, Size::new(100.0, 10.0));
        assert_eq!(tree.size(w), Size::new(40.0, 10.0));
        assert_eq!(
            diags.borrow().as_slice(),
            &[ProgrammingError::GeometryClamped {
                requested: Size::new(100.0, 10.0),
                applied: Size::new(40.0, 10.0),
            }]
        );
    }

    #[test]
    fn negative_minimum_is_clamped_to_zero() {
        let diags = crate::testing::diagnostics();
        let mut tree = WidgetTree::new();
        tree.set_trace_sink(Box::new(DiagSink(diags.clone())));
        let w = tree.create_widget(None, rect(0.0, 0.0, 50.0, 50.0));
        tree.set_minimum_size(w, Size::new(-5.0, 10.0));
        assert_eq!(tree.minimum_size(w), Size::new(0.0, 10.0));
        assert_eq!(
            diags.borrow().first(),
            Some(&ProgrammingError::NegativeMinimumSize {
                requested: Size::new(-5.0, 10.0)
            })
        );
    }

    #[test]
    fn minimum_above_maximum_raises_maximum_and_grows_widget() {
        let diags = crate::testing::diagnostics();
        let mut tree = WidgetTree::new();
        tree.set_trace_sink(Box::new(DiagSink(diags.clone())));
        let w = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        tree.set_maximum_size(w, Size::new(20.0, 20.0));
        tree.set_minimum_size(w, Size::new(30.0, 5.0));
        assert_eq!(tree.maximum_size(w), Size::new(30.0, 20.0));
        assert_eq!(tree.size(w), Size::new(30.0, 10.0));
        assert!(matches!(
            diags.borrow().as_slice(),
            [ProgrammingError::MinimumExceedsMaximum { .. }]
        ));
    }

    #[test]
    fn oversized_maximum_is_clamped_to_extent_limit() {
        let mut tree = WidgetTree::new();
        let w = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        tree.set_maximum_size(w, Size::new(1e9, 1e9));
        assert_eq!(
            tree.maximum_size(w),
            Size::new(MAX_WIDGET_EXTENT, MAX_WIDGET_EXTENT)
        );
    }

    #[test]
    fn frame_geometry_adds_platform_margins() {
        let bridge = TestBridge {
            margins: Insets::new(4.0, 20.0, 4.0, 4.0),
            ..TestBridge::default()
        };
        let mut tree = WidgetTree::with_bridge(bridge);
        let win = tree.create_widget(None, rect(100.0, 100.0, 200.0, 100.0));
        let child = tree.create_widget(Some(win), rect(0.0, 0.0, 10.0, 10.0));
        assert_eq!(tree.frame_geometry(win), tree.geometry(win), "no surface yet");

        tree.show(win).unwrap();
        assert_eq!(tree.frame_geometry(win), Rect::new(96.0, 80.0, 304.0, 204.0));
        assert_eq!(tree.frame_geometry(child), tree.geometry(child));
    }

    #[test]
    fn top_level_geometry_is_forwarded_to_the_surface() {
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        tree.show(win).unwrap();
        let surface = tree.surface(win).unwrap();
        tree.set_geometry(win, rect(10.0, 10.0, 120.0, 80.0));
        assert_eq!(
            tree.bridge().surfaces.get(&surface).copied(),
            Some(rect(10.0, 10.0, 120.0, 80.0))
        );
        let store = tree.backing_store(win).unwrap();
        assert_eq!((store.buffer().width(), store.buffer().height()), (120, 80));
    }

    #[test]
    fn resize_notifies_then_repaints_once() {
        let log = log();
        let mut tree = WidgetTree::with_bridge(TestBridge::default());
        let win = tree.create_widget(None, rect(0.0, 0.0, 100.0, 100.0));
        let child = tree.create_widget(Some(win), rect(10.0, 10.0, 20.0, 20.0));
        tree.set_widget(child, Recorder::boxed("child", &log));
        tree.show(win).unwrap();
        assert!(tree.paint_pass(win));
        log.borrow_mut().clear();

        tree.set_geometry(child, rect(10.0, 10.0, 30.0, 30.0));
        assert_eq!(
            *log.borrow(),
            vec![Event::Notify(
                "child",
                Notification::Resize {
                    old: Size::new(20.0, 20.0),
                    new: Size::new(30.0, 30.0)
                }
            )],
            "notified before anything is painted"
        );
        assert_eq!(
            tree.backing_store(win).unwrap().dirty().region(),
            &crate::region::Region::from_rect(rect(10.0, 10.0, 30.0, 30.0))
        );

        assert!(tree.paint_pass(win));
        assert_eq!(
            crate::testing::paints(&log),
            vec![(
                "child",
                crate::region::Region::from_rect(rect(0.0, 0.0, 30.0, 30.0))
            )]
        );
        log.borrow_mut().clear();
        assert!(!tree.paint_pass(win));
        assert!(log.borrow().is_empty());
    }
}
