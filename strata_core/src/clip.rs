// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip resolution and hit testing.
//!
//! A widget's clip is the part of its rectangle that survives intersection
//! with every ancestor's rectangle, minus the area covered by opaque siblings
//! stacked above it (and above each of its ancestors), intersected with every
//! mask along the way. This is the only area a paint pass lets it touch.

use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::backend::PlatformBridge;
use crate::region::{Region, intersect, overlaps, rect_is_empty};
use crate::widget::{INVALID, WidgetId, WidgetTree};

impl<B: PlatformBridge> WidgetTree<B> {
    /// Returns the widget's rectangle intersected with every ancestor's
    /// rectangle, in widget coordinates.
    #[must_use]
    pub fn clip_rect(&self, id: WidgetId) -> Rect {
        self.validate(id);
        let idx = id.idx;
        self.window_clip_rect(idx) - self.window_offset(idx)
    }

    /// Returns the region the widget may paint into, in widget coordinates.
    ///
    /// This is [`clip_rect`](Self::clip_rect) minus opaque later siblings of
    /// the widget and of each ancestor, intersected with all masks from the
    /// widget up to its window. Invisible widgets have an empty clip.
    pub fn compute_clip(&mut self, id: WidgetId) -> Region {
        self.validate(id);
        let idx = id.idx;
        if !self.visible[idx as usize] {
            return Region::new();
        }
        self.refresh_opaque_caches();
        let clip = self.window_clip_within(idx, INVALID);
        clip.translated(-self.window_offset(idx))
    }

    /// Returns the region of the widget that is actually visible on screen:
    /// its clip minus the area its own opaque children cover.
    pub fn visible_region(&mut self, id: WidgetId) -> Region {
        let mut clip = self.compute_clip(id);
        if !clip.is_empty() {
            let covered = self.opaque_children_idx(id.idx);
            clip.subtract(&covered);
        }
        clip
    }

    /// Returns `true` if a visible sibling stacked above the widget, or above
    /// any of its ancestors, overlaps `rect` (widget coordinates).
    ///
    /// Masks on the overlapping siblings are respected.
    #[must_use]
    pub fn is_overlapped(&self, id: WidgetId, rect: Rect) -> bool {
        self.validate(id);
        let idx = id.idx;
        self.overlapped_in_parent(idx, rect + self.rect[idx as usize].origin().to_vec2())
    }

    /// Returns the deepest visible descendant of `id` under `point` (widget
    /// coordinates), honoring masks. Returns `None` if the point hits no
    /// child.
    #[must_use]
    pub fn child_at(&self, id: WidgetId, point: Point) -> Option<WidgetId> {
        self.validate(id);
        let hit = self.hit_test(id.idx, point);
        (hit != id.idx && hit != INVALID).then(|| self.id_at(hit))
    }

    /// Returns the deepest visible widget in the subtree of `idx` containing
    /// `point` (coordinates of `idx`), `idx` itself if no child is hit, or
    /// [`INVALID`] if the point misses `idx` entirely.
    pub(crate) fn hit_test(&self, idx: u32, point: Point) -> u32 {
        let local = self.rect[idx as usize].size().to_rect();
        let inside_mask = self.mask[idx as usize]
            .as_ref()
            .is_none_or(|m| m.contains_point(point));
        if !local.contains(point) || !inside_mask {
            return INVALID;
        }
        let mut current = idx;
        let mut point = point;
        'descend: loop {
            let children = self.child_indices(current);
            for &c in children.iter().rev() {
                if !self.visible[c as usize] {
                    continue;
                }
                let r = self.rect[c as usize];
                let p = point - r.origin().to_vec2();
                if !r.size().to_rect().contains(p) {
                    continue;
                }
                if let Some(mask) = &self.mask[c as usize] {
                    if !mask.contains_point(p) {
                        continue;
                    }
                }
                current = c;
                point = p;
                continue 'descend;
            }
            return current;
        }
    }

    /// Window-local rectangle of `idx` clipped by all ancestors.
    pub(crate) fn window_clip_rect(&self, idx: u32) -> Rect {
        self.window_clip_rect_within(idx, INVALID)
    }

    /// Window-local rectangle of `idx` clipped by its ancestors, ignoring
    /// those above `stop`.
    fn window_clip_rect_within(&self, idx: u32, stop: u32) -> Rect {
        let mut rect = self.rect[idx as usize].size().to_rect() + self.window_offset(idx);
        let mut n = idx;
        while n != stop {
            let p = self.parent[n as usize];
            if p == INVALID {
                break;
            }
            let ancestor = self.rect[p as usize].size().to_rect() + self.window_offset(p);
            rect = intersect(rect, ancestor);
            n = p;
        }
        rect
    }

    /// Window-local clip of `idx`, considering occluding siblings and masks
    /// only below `stop` (or up to the window when `stop` is [`INVALID`]).
    ///
    /// Opaque caches must be fresh.
    pub(crate) fn window_clip_within(&mut self, idx: u32, stop: u32) -> Region {
        let bounds = self.window_clip_rect_within(idx, stop);
        if rect_is_empty(bounds) {
            return Region::new();
        }
        let mut clip = Region::from_rect(bounds);

        let mut n = idx;
        loop {
            if let Some(mask) = &self.mask[n as usize] {
                clip.intersect(&mask.translated(self.window_offset(n)));
            }
            if n == stop {
                break;
            }
            let p = self.parent[n as usize];
            if p == INVALID {
                break;
            }
            if self.config.subtract_opaque_siblings {
                self.subtract_opaque_siblings(n, p, &mut clip);
            }
            if clip.is_empty() {
                return clip;
            }
            n = p;
        }
        clip
    }

    /// Removes from `clip` (window coordinates) the opaque area of every
    /// visible sibling stacked above `n`.
    fn subtract_opaque_siblings(&mut self, n: u32, p: u32, clip: &mut Region) {
        let offset = self.window_offset(p);
        let mut s = self.next_sibling[n as usize];
        let mut above = Vec::new();
        while s != INVALID {
            above.push(s);
            s = self.next_sibling[s as usize];
        }
        for s in above {
            if clip.is_empty() {
                return;
            }
            if !self.visible[s as usize] {
                continue;
            }
            if !overlaps(self.footprint_bounds(s) + offset, clip.bounding_box()) {
                continue;
            }
            let covered = self.opaque_footprint(s).translated(offset);
            clip.subtract(&covered);
        }
    }

    /// `rect` is in the coordinates of `idx`'s parent.
    pub(crate) fn overlapped_in_parent(&self, idx: u32, rect: Rect) -> bool {
        let mut n = idx;
        let mut r = rect;
        loop {
            let p = self.parent[n as usize];
            if p == INVALID {
                return false;
            }
            let mut s = self.next_sibling[n as usize];
            while s != INVALID {
                if self.visible[s as usize]
                    && overlaps(self.footprint_bounds(s), r)
                    && self.footprint(s).intersects_rect(r)
                {
                    return true;
                }
                s = self.next_sibling[s as usize];
            }
            r = r + self.rect[p as usize].origin().to_vec2();
            n = p;
        }
    }
}
