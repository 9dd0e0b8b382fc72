// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backing-store compositing.
//!
//! Every visible top-level owns a [`BackingStore`]: a [`PixelBuffer`] the
//! size of the window, the [`DirtyRegion`] waiting to be repainted, and a
//! [`PaintState`]. Invalidation only records damage and, on the first
//! damage since the last pass, asks the platform to schedule a pass.
//!
//! A pass snapshots and clears the dirty region, then walks the window's
//! subtree back to front. Each widget is asked to paint the part of the
//! damage inside its clip that its own opaque children do not cover; the
//! compositor paints its background first. Damage recorded while the pass
//! runs is left for the next pass. Native children are skipped and handed
//! to the platform for re-compositing.
//!
//! Pure translations of opaque, unobstructed widgets move the already
//! painted pixels in the backing store instead of repainting them.

use alloc::vec::Vec;
use core::mem;

use kurbo::{Rect, Vec2};

use crate::backend::PlatformBridge;
use crate::damage::DirtyRegion;
use crate::error::ProgrammingError;
use crate::notify::PaintCtx;
use crate::paint::{Color, Painter, PixelBuffer};
use crate::region::{Region, intersect, rect_is_empty};
use crate::trace::{BlitEvent, InvalidateEvent, PassBeginEvent, PassEndEvent, PassKind};
use crate::widget::{INVALID, SurfaceHandle, WidgetId, WidgetTree};
use crate::window::WindowState;

/// Where a top-level is in its paint cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintState {
    /// Nothing pending.
    #[default]
    Idle,
    /// A pass has been requested from the run loop.
    ScheduledPending,
    /// A pass is running.
    Painting,
}

/// Pixels and pending damage of one top-level window.
#[derive(Clone, Debug, Default)]
pub struct BackingStore {
    buffer: PixelBuffer,
    dirty: DirtyRegion,
    state: PaintState,
    /// Pixels changed outside a pass (by blits) that still need flushing.
    flush_pending: Region,
}

impl BackingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The composited pixels, in window coordinates.
    #[must_use]
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Damage waiting for the next pass.
    #[must_use]
    pub fn dirty(&self) -> &DirtyRegion {
        &self.dirty
    }

    /// The paint-cycle state.
    #[must_use]
    pub fn state(&self) -> PaintState {
        self.state
    }

    /// Area moved by blits that has not been flushed to the screen yet.
    #[must_use]
    pub fn flush_pending(&self) -> &Region {
        &self.flush_pending
    }

    pub(crate) fn discard(&mut self) {
        self.dirty.clear();
        self.flush_pending.clear();
        self.state = PaintState::Idle;
    }
}

/// What a widget paints into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PaintTarget {
    /// The backing store of the given top-level.
    BackingStore(WidgetId),
    /// A native surface composited by the platform.
    NativeSurface(SurfaceHandle),
    /// Nothing yet: the window has never been shown.
    Unrealized,
}

/// Per-pass bookkeeping threaded through the recursive draw.
struct PassCtx {
    pass_index: u64,
    /// Pixel position of window coordinate `(0, 0)` is `-base`.
    base: Vec2,
    /// Sibling occlusion and ancestor clipping stop at this widget.
    stop: u32,
    /// Rendering into an external buffer: explicit visibility decides what
    /// is drawn.
    redirected: bool,
    paint_count: u32,
    recomposite: Vec<(SurfaceHandle, Region)>,
}

impl<B: PlatformBridge> WidgetTree<B> {
    // -- Queries --

    /// Returns the backing store of a top-level window.
    #[must_use]
    pub fn backing_store(&self, id: WidgetId) -> Option<&BackingStore> {
        self.validate(id);
        self.windows[id.idx as usize].as_ref().map(|top| &top.backing)
    }

    /// Returns what the widget's painting ends up in.
    #[must_use]
    pub fn paint_target(&self, id: WidgetId) -> PaintTarget {
        self.validate(id);
        let idx = id.idx;
        if self.parent[idx as usize] != INVALID {
            if let Some(s) = self.surface[idx as usize] {
                return PaintTarget::NativeSurface(s);
            }
        }
        let window = self.window_of(idx);
        if self.surface[window as usize].is_some() {
            PaintTarget::BackingStore(self.id_at(window))
        } else {
            PaintTarget::Unrealized
        }
    }

    // -- Invalidation --

    /// Schedules a repaint of the whole widget.
    ///
    /// Nothing happens for hidden widgets or while updates are disabled.
    pub fn update(&mut self, id: WidgetId) {
        self.validate(id);
        let local = self.rect[id.idx as usize].size().to_rect();
        self.update_region_idx(id.idx, &Region::from_rect(local));
    }

    /// Schedules a repaint of `rect` (widget coordinates).
    pub fn update_rect(&mut self, id: WidgetId, rect: Rect) {
        self.validate(id);
        self.update_region_idx(id.idx, &Region::from_rect(rect));
    }

    /// Schedules a repaint of `region` (widget coordinates).
    pub fn update_region(&mut self, id: WidgetId, region: &Region) {
        self.validate(id);
        self.update_region_idx(id.idx, region);
    }

    pub(crate) fn update_region_idx(&mut self, idx: u32, region: &Region) {
        if region.is_empty() || !self.visible[idx as usize] || !self.updates_enabled_idx(idx) {
            return;
        }
        let mut area = region.translated(self.window_offset(idx));
        area.intersect_rect(self.window_clip_rect(idx));
        let mut n = idx;
        while n != INVALID {
            if let Some(mask) = &self.mask[n as usize] {
                area.intersect(&mask.translated(self.window_offset(n)));
            }
            n = self.parent[n as usize];
        }
        let window = self.window_of(idx);
        self.mark_dirty(window, &area);
    }

    /// Invalidates the area `idx` covers in its parent.
    pub(crate) fn update_in_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        if p == INVALID {
            return;
        }
        let area = self.footprint(idx);
        self.update_region_idx(p, &area);
    }

    /// Adds `area` (window coordinates) to a window's damage.
    pub(crate) fn mark_dirty(&mut self, window: u32, area: &Region) {
        if area.is_empty() {
            return;
        }
        let id = self.id_at(window);
        let Some(top) = self.windows[window as usize].as_mut() else {
            return;
        };
        if !top.backing.dirty.mark(area) {
            return;
        }
        let schedule =
            top.backing.state == PaintState::Idle && top.state != WindowState::Minimized;
        if schedule {
            top.backing.state = PaintState::ScheduledPending;
        }
        self.tracer().invalidate(&InvalidateEvent {
            window: id,
            bounds: area.bounding_box(),
        });
        if schedule {
            self.bridge.schedule_update(id);
        }
    }

    /// Asks for another pass if damage is pending and none is scheduled.
    pub(crate) fn reschedule(&mut self, window: u32) {
        let id = self.id_at(window);
        let Some(top) = self.windows[window as usize].as_mut() else {
            return;
        };
        if top.backing.state != PaintState::Idle
            || top.state == WindowState::Minimized
            || (top.backing.dirty.is_empty() && top.backing.flush_pending.is_empty())
        {
            return;
        }
        top.backing.state = PaintState::ScheduledPending;
        self.bridge.schedule_update(id);
    }

    /// Sizes a visible window's buffer to its geometry and damages all of
    /// it.
    pub(crate) fn resize_backing(&mut self, window: u32) {
        if !self.visible[window as usize] {
            return;
        }
        let size = self.rect[window as usize].size();
        let Some(top) = self.windows[window as usize].as_mut() else {
            return;
        };
        top.backing.buffer = PixelBuffer::with_size(size, Color::TRANSPARENT);
        top.backing.flush_pending.clear();
        self.mark_dirty(window, &Region::from_rect(size.to_rect()));
    }

    // -- Passes --

    /// Runs a paint pass for a top-level window.
    ///
    /// The pending damage is snapshotted and cleared, every widget owing
    /// part of it is painted back to front, and the result is flushed to the
    /// window's surface. Returns `true` if anything was painted or flushed.
    ///
    /// Hidden windows drop their damage. Minimized windows keep it until they
    /// are restored.
    pub fn paint_pass(&mut self, window: WidgetId) -> bool {
        self.validate(window);
        let idx = window.idx;
        if self.parent[idx as usize] != INVALID {
            self.report(Some(idx), ProgrammingError::NotATopLevel);
            return false;
        }
        if self.painting != INVALID {
            self.report(Some(idx), ProgrammingError::ReentrantRepaint);
            return false;
        }
        let visible = self.visible[idx as usize];
        let Some(top) = self.windows[idx as usize].as_mut() else {
            return false;
        };
        if !visible {
            top.backing.discard();
            return false;
        }
        if top.state == WindowState::Minimized {
            top.backing.state = PaintState::Idle;
            return false;
        }
        let region = top.backing.dirty.take();
        if region.is_empty() && top.backing.flush_pending.is_empty() {
            top.backing.state = PaintState::Idle;
            return false;
        }
        self.run_pass(idx, region, PassKind::Scheduled);
        true
    }

    /// Paints the widget synchronously instead of waiting for the next pass.
    ///
    /// The widget's area is repainted, including whatever shows through it
    /// from behind, and removed from the window's pending damage. Calling
    /// this while a pass is running is a programming error; it is reported
    /// and the area is scheduled for the next pass instead.
    pub fn repaint(&mut self, id: WidgetId) {
        self.validate(id);
        let idx = id.idx;
        if self.painting != INVALID {
            self.report(Some(idx), ProgrammingError::ReentrantRepaint);
            self.update(id);
            return;
        }
        if !self.visible[idx as usize] || !self.updates_enabled_idx(idx) {
            return;
        }
        let window = self.window_of(idx);
        let minimized = self.windows[window as usize]
            .as_ref()
            .is_none_or(|top| top.state == WindowState::Minimized);
        if minimized || self.surface[window as usize].is_none() {
            self.update(id);
            return;
        }
        let local = self.rect[idx as usize].size().to_rect();
        let mut area = Region::from_rect(local);
        self.refresh_opaque_caches();
        area = self
            .window_clip_within(idx, INVALID)
            .intersected(&area.translated(self.window_offset(idx)));
        if area.is_empty() {
            return;
        }
        if let Some(top) = self.windows[window as usize].as_mut() {
            top.backing.dirty.subtract(&area);
        }
        self.run_pass(window, area, PassKind::Repaint);
    }

    /// Renders the widget and its subtree into a fresh buffer of the
    /// widget's size.
    ///
    /// Siblings and ancestors are ignored, descendants are drawn if they are
    /// not explicitly hidden, and the window's damage and backing store are
    /// left untouched.
    pub fn grab(&mut self, id: WidgetId) -> PixelBuffer {
        self.validate(id);
        let idx = id.idx;
        let size = self.rect[idx as usize].size();
        let mut buffer = PixelBuffer::with_size(size, Color::TRANSPARENT);
        if self.painting != INVALID {
            self.report(Some(idx), ProgrammingError::ReentrantRepaint);
            return buffer;
        }
        self.refresh_opaque_caches();
        self.pass_index += 1;
        let base = self.window_offset(idx);
        let region = Region::from_rect(size.to_rect() + base);
        let mut pass = PassCtx {
            pass_index: self.pass_index,
            base,
            stop: idx,
            redirected: true,
            paint_count: 0,
            recomposite: Vec::new(),
        };
        let window = self.id_at(self.window_of(idx));
        self.tracer().pass_begin(&PassBeginEvent {
            pass_index: pass.pass_index,
            window,
            kind: PassKind::Grab,
            bounds: region.bounding_box(),
            rect_count: rect_count(&region),
        });
        self.painting = idx;
        self.draw_widget(idx, &region, &mut buffer, &mut pass);
        self.painting = INVALID;
        self.tracer().pass_end(&PassEndEvent {
            pass_index: pass.pass_index,
            window,
            paint_count: pass.paint_count,
            rescheduled: false,
        });
        buffer
    }

    fn run_pass(&mut self, window: u32, mut region: Region, kind: PassKind) {
        let w = window as usize;
        self.refresh_opaque_caches();
        self.pass_index += 1;
        region.intersect_rect(self.rect[w].size().to_rect());

        let window_id = self.id_at(window);
        let mut pass = PassCtx {
            pass_index: self.pass_index,
            base: Vec2::ZERO,
            stop: INVALID,
            redirected: false,
            paint_count: 0,
            recomposite: Vec::new(),
        };
        self.tracer().pass_begin(&PassBeginEvent {
            pass_index: pass.pass_index,
            window: window_id,
            kind,
            bounds: region.bounding_box(),
            rect_count: rect_count(&region),
        });

        let Some(top) = self.windows[w].as_mut() else {
            return;
        };
        top.backing.state = PaintState::Painting;
        let mut buffer = mem::take(&mut top.backing.buffer);
        self.painting = window;
        if !region.is_empty() {
            self.draw_widget(window, &region, &mut buffer, &mut pass);
        }
        self.painting = INVALID;

        let Some(top) = self.windows[w].as_mut() else {
            return;
        };
        top.backing.buffer = buffer;
        let mut flushed = mem::take(&mut top.backing.flush_pending);
        flushed.union(&region);
        if let Some(surface) = self.surface[w] {
            if !flushed.is_empty() {
                self.bridge.flush(surface, &flushed, &top.backing.buffer);
            }
        }
        for (surface, area) in mem::take(&mut pass.recomposite) {
            self.bridge.recomposite(surface, &area);
        }

        if let Some(top) = self.windows[w].as_mut() {
            top.backing.state = PaintState::Idle;
        }
        self.reschedule(window);
        let rescheduled = self.windows[w]
            .as_ref()
            .is_some_and(|top| top.backing.state == PaintState::ScheduledPending);
        self.tracer().pass_end(&PassEndEvent {
            pass_index: pass.pass_index,
            window: window_id,
            paint_count: pass.paint_count,
            rescheduled,
        });
    }

    /// Paints `idx` and its subtree where they intersect `region` (window
    /// coordinates).
    fn draw_widget(
        &mut self,
        idx: u32,
        region: &Region,
        buffer: &mut PixelBuffer,
        pass: &mut PassCtx,
    ) {
        let offset = self.window_offset(idx);
        let mut owed = self.window_clip_within(idx, pass.stop);
        owed.intersect(region);
        if owed.is_empty() {
            return;
        }

        let mut own = owed.clone();
        own.subtract(&self.opaque_children_idx(idx).translated(offset));
        if !own.is_empty() {
            let in_buffer = own.translated(-pass.base);
            let i = idx as usize;
            if !self.flags[i].opaque_paint {
                if let Some(fill) = self.fill[i] {
                    buffer.fill_region(&in_buffer, fill);
                } else if self.parent[i] == INVALID {
                    buffer.fill_region(&in_buffer, self.config.window_background);
                }
            }
            self.dispatch_paint(idx, &in_buffer, offset - pass.base, buffer, pass);
        }

        for c in self.child_indices(idx) {
            let shown = if pass.redirected {
                !self.flags[c as usize].explicit_hidden
            } else {
                self.visible[c as usize]
            };
            if !shown {
                continue;
            }
            if self.flags[c as usize].native {
                if let Some(surface) = self.surface[c as usize] {
                    let area = self.footprint(c).translated(offset).intersected(&owed);
                    if !area.is_empty() {
                        pass.recomposite.push((surface, area));
                    }
                }
                continue;
            }
            self.draw_widget(c, &owed, buffer, pass);
        }
    }

    /// Delivers a paint callback for `clip` (buffer coordinates).
    fn dispatch_paint(
        &mut self,
        idx: u32,
        clip: &Region,
        origin: Vec2,
        buffer: &mut PixelBuffer,
        pass: &mut PassCtx,
    ) {
        pass.paint_count += 1;
        let id = self.id_at(idx);
        let local = clip.translated(-origin);

        #[cfg(feature = "trace-rich")]
        {
            let pass_index = pass.pass_index;
            self.tracer().paint(&crate::trace::PaintEvent {
                pass_index,
                widget: id,
                bounds: local.bounding_box(),
                rect_count: rect_count(&local),
            });
        }

        let Some(mut handler) = self.handlers[idx as usize].take() else {
            return;
        };
        let mut requests = Vec::new();
        {
            let painter = Painter::new(buffer, origin, clip.clone());
            let mut ctx = PaintCtx::new(
                id,
                self.rect[idx as usize].size(),
                &local,
                painter,
                &mut requests,
            );
            handler.paint(&mut ctx);
        }
        if self.handlers[idx as usize].is_none() {
            self.handlers[idx as usize] = Some(handler);
        }
        self.apply_requests(id, requests);
    }

    // -- Geometry invalidation --

    /// Invalidates after a resize of visible child `idx` from `old`.
    ///
    /// The parent repaints what the old footprint exposed; the widget
    /// repaints entirely.
    pub(crate) fn invalidate_resized(&mut self, idx: u32, old: Rect) {
        let p = self.parent[idx as usize];
        let new = self.rect[idx as usize];
        let mut exposed = self.footprint_at(idx, old);
        exposed.subtract(&self.footprint_at(idx, new));
        self.update_region_idx(p, &exposed);
        self.update_region_idx(idx, &Region::from_rect(new.size().to_rect()));
    }

    /// Invalidates after visible child `idx` moved from `old` without
    /// resizing, blitting its pixels when possible.
    pub(crate) fn move_rect(&mut self, idx: u32, old: Rect) {
        let i = idx as usize;
        let p = self.parent[i];
        let new = self.rect[i];
        let delta = new.origin() - old.origin();
        let parent_offset = self.window_offset(p);
        let parent_clip = self.window_clip_rect(p) - parent_offset;
        let window = self.window_of(idx);

        let old_visible = intersect(old, parent_clip);
        let dest = intersect(old_visible + delta, parent_clip);
        let source = dest - delta;

        let accelerate = self.config.fast_move
            && self.is_opaque_idx(idx)
            && self.mask[i].is_none()
            && !self.flags[i].native
            && self.updates_enabled_idx(idx)
            && self.surface[window as usize].is_some()
            && !rect_is_empty(dest)
            && !self.overlapped_in_parent(idx, source)
            && !self.overlapped_in_parent(idx, dest);

        if !accelerate {
            let mut exposed = Region::from_rect(old);
            exposed.subtract_rect(new);
            self.update_region_idx(p, &exposed);
            self.update_region_idx(idx, &Region::from_rect(new.size().to_rect()));
            return;
        }

        let window_source = source + parent_offset;
        if let Some(top) = self.windows[window as usize].as_mut() {
            top.backing.buffer.copy_rect(window_source, delta);
            top.backing.dirty.follow_blit(window_source, delta);
            top.backing.flush_pending.union_rect(dest + parent_offset);
        }
        let window_id = self.id_at(window);
        self.tracer().blit(&BlitEvent {
            window: window_id,
            source: window_source,
            delta,
        });
        self.reschedule(window);

        let mut parent_area = Region::from_rect(old_visible);
        parent_area.subtract_rect(new);
        self.update_region_idx(p, &parent_area);

        let mut exposed = Region::from_rect(intersect(new, parent_clip));
        exposed.subtract_rect(dest);
        let mut uncovered = Region::from_rect(new);
        uncovered.subtract_rect(old);
        exposed.union(&uncovered);
        exposed.translate(-new.origin().to_vec2());
        self.update_region_idx(idx, &exposed);
    }

    /// Footprint of `idx` in parent coordinates if it were placed at `rect`.
    fn footprint_at(&self, idx: u32, rect: Rect) -> Region {
        match &self.mask[idx as usize] {
            Some(mask) => mask
                .intersected_rect(rect.size().to_rect())
                .translated(rect.origin().to_vec2()),
            None => Region::from_rect(rect),
        }
    }
}

fn rect_count(region: &Region) -> u32 {
    u32::try_from(region.rects().len()).unwrap_or(u32::MAX)
}
