// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Opaque-region computation.
//!
//! A widget is opaque when it promises to paint every pixel
//! ([`set_opaque_paint`](crate::widget::WidgetTree::set_opaque_paint)), when
//! its auto-fill brush has full alpha, or when it is a top-level over an
//! opaque window background. The opaque region of a widget's children is
//! cached per widget and invalidated upward through the
//! [`OPAQUE`](crate::dirty::OPAQUE) channel whenever a descendant's
//! geometry, visibility, mask, opacity, or stacking changes.

use kurbo::Rect;

use crate::backend::PlatformBridge;
use crate::dirty;
use crate::region::Region;
use crate::widget::{INVALID, WidgetId, WidgetTree};

impl<B: PlatformBridge> WidgetTree<B> {
    /// Returns whether the widget paints every pixel of its rectangle.
    #[must_use]
    pub fn is_opaque(&self, id: WidgetId) -> bool {
        self.validate(id);
        self.is_opaque_idx(id.idx)
    }

    /// Returns the area (widget coordinates) covered by opaque visible
    /// descendants, clipped to the widget's rectangle.
    pub fn opaque_children(&mut self, id: WidgetId) -> Region {
        self.validate(id);
        self.refresh_opaque_caches();
        self.opaque_children_idx(id.idx)
    }

    pub(crate) fn is_opaque_idx(&self, idx: u32) -> bool {
        let i = idx as usize;
        self.flags[i].opaque_paint
            || self.fill[i].is_some_and(|c| c.is_opaque())
            || (self.parent[i] == INVALID && self.config.window_background.is_opaque())
    }

    /// Drops cached opaque regions for everything invalidated since the last
    /// query.
    pub(crate) fn refresh_opaque_caches(&mut self) {
        let stale: alloc::vec::Vec<u32> = self
            .dirty
            .drain(dirty::OPAQUE)
            .affected()
            .deterministic()
            .run()
            .collect();
        for idx in stale {
            self.opaque_children[idx as usize] = None;
        }
    }

    /// Cached opaque area of `idx`'s children. Call
    /// [`refresh_opaque_caches`](Self::refresh_opaque_caches) first.
    pub(crate) fn opaque_children_idx(&mut self, idx: u32) -> Region {
        if let Some(cached) = &self.opaque_children[idx as usize] {
            return cached.clone();
        }
        let mut region = Region::new();
        for c in self.child_indices(idx) {
            if !self.visible[c as usize] {
                continue;
            }
            region.union(&self.opaque_footprint(c));
        }
        region.intersect_rect(self.rect[idx as usize].size().to_rect());
        self.opaque_children[idx as usize] = Some(region.clone());
        region
    }

    /// Area of the parent that `idx` and its descendants fully cover
    /// (parent coordinates).
    pub(crate) fn opaque_footprint(&mut self, idx: u32) -> Region {
        let rect = self.rect[idx as usize];
        let mut local = if self.is_opaque_idx(idx) {
            Region::from_rect(rect.size().to_rect())
        } else {
            self.opaque_children_idx(idx)
        };
        if let Some(mask) = &self.mask[idx as usize] {
            local.intersect(mask);
        }
        local.translate(rect.origin().to_vec2());
        local
    }

    /// The widget's full footprint in parent coordinates, respecting its
    /// mask.
    pub(crate) fn footprint(&self, idx: u32) -> Region {
        let rect = self.rect[idx as usize];
        match &self.mask[idx as usize] {
            Some(mask) => mask
                .intersected_rect(rect.size().to_rect())
                .translated(rect.origin().to_vec2()),
            None => Region::from_rect(rect),
        }
    }

    /// Bounding box of [`footprint`](Self::footprint).
    pub(crate) fn footprint_bounds(&self, idx: u32) -> Rect {
        let rect = self.rect[idx as usize];
        match &self.mask[idx as usize] {
            Some(mask) => mask.bounding_box().intersect(rect.size().to_rect()) + rect.origin().to_vec2(),
            None => rect,
        }
    }
}
