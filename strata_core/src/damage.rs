// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-window damage accumulation.
//!
//! A [`DirtyRegion`] collects every area of one top-level window that needs
//! repainting. Invalidations coalesce into a single region until a paint pass
//! consumes it with [`take`](DirtyRegion::take), which snapshots and clears
//! in one step so a pass never observes a partially consumed region.

use kurbo::{Rect, Vec2};

use crate::region::Region;

/// Accumulated damage for one top-level window, in window coordinates.
#[derive(Clone, Debug, Default)]
pub struct DirtyRegion {
    region: Region,
}

impl DirtyRegion {
    /// Creates an empty dirty region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Returns the pending area.
    #[inline]
    #[must_use]
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Marks `area` dirty.
    ///
    /// Returns `false` (and changes nothing) if `area` is already fully
    /// covered by pending damage.
    pub fn mark(&mut self, area: &Region) -> bool {
        if self.region.contains_region(area) {
            return false;
        }
        self.region.union(area);
        true
    }

    /// Marks `rect` dirty. See [`mark`](Self::mark).
    pub fn mark_rect(&mut self, rect: Rect) -> bool {
        self.mark(&Region::from_rect(rect))
    }

    /// Returns the pending area and leaves the tracker empty.
    #[must_use]
    pub fn take(&mut self) -> Region {
        core::mem::take(&mut self.region)
    }

    /// Drops all pending damage.
    pub fn clear(&mut self) {
        self.region.clear();
    }

    /// Removes `area` from the pending damage.
    pub fn subtract(&mut self, area: &Region) {
        self.region.subtract(area);
    }

    /// Moves pending damage inside `source` along with a pixel blit by
    /// `delta`, so stale pixels that were carried along stay dirty.
    pub fn follow_blit(&mut self, source: Rect, delta: Vec2) {
        let mut moved = self.region.intersected_rect(source);
        if moved.is_empty() {
            return;
        }
        moved.translate(delta);
        self.region.union(&moved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_marks_coalesce() {
        let mut d = DirtyRegion::new();
        assert!(d.mark_rect(Rect::new(10.0, 10.0, 15.0, 15.0)));
        assert!(d.mark_rect(Rect::new(12.0, 12.0, 17.0, 17.0)));
        assert_eq!(d.region().bounding_box(), Rect::new(10.0, 10.0, 17.0, 17.0));
        assert_eq!(d.region().area(), 41.0);
    }

    #[test]
    fn marking_covered_area_is_noop() {
        let mut d = DirtyRegion::new();
        d.mark_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(!d.mark_rect(Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert_eq!(d.region().rects().len(), 1);
    }

    #[test]
    fn take_snapshots_and_clears() {
        let mut d = DirtyRegion::new();
        d.mark_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        let snapshot = d.take();
        assert_eq!(snapshot.area(), 25.0);
        assert!(d.is_empty());
        assert!(d.take().is_empty());
    }

    #[test]
    fn follow_blit_carries_stale_area() {
        let mut d = DirtyRegion::new();
        d.mark_rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        d.follow_blit(Rect::new(0.0, 0.0, 10.0, 10.0), Vec2::new(5.0, 0.0));
        assert!(d.region().contains_rect(Rect::new(5.0, 0.0, 7.0, 2.0)));
        assert!(d.region().contains_rect(Rect::new(0.0, 0.0, 2.0, 2.0)));
    }
}
