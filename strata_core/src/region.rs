// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectilinear regions.
//!
//! A [`Region`] is a set of pairwise-disjoint, axis-aligned rectangles. It is
//! the currency of damage tracking, clipping, and occlusion: dirty areas,
//! opaque-children areas, clips, and masks are all regions.
//!
//! Rectangles are half-open (`x0 <= x < x1`), so two rectangles that share
//! an edge do not overlap. Coordinates are expected to be integral pixel
//! positions; the arithmetic here is exact for such values.
//!
//! Equality compares regions as point sets, so two regions built from
//! different decompositions of the same area compare equal.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

/// A set of disjoint axis-aligned rectangles.
#[derive(Clone, Debug, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// An empty region.
    pub const EMPTY: Self = Self { rects: Vec::new() };

    /// Creates an empty region.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Creates a region covering `rect`.
    ///
    /// Degenerate rectangles (zero or negative extent) produce an empty
    /// region.
    #[must_use]
    pub fn from_rect(rect: Rect) -> Self {
        if rect_is_empty(rect) {
            Self::new()
        } else {
            Self {
                rects: alloc::vec![rect],
            }
        }
    }

    /// Returns `true` if the region covers no area.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Returns the disjoint rectangles making up this region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Returns the smallest rectangle containing the region, or
    /// [`Rect::ZERO`] if the region is empty.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        let mut it = self.rects.iter().copied();
        let Some(first) = it.next() else {
            return Rect::ZERO;
        };
        it.fold(first, |acc, r| acc.union(r))
    }

    /// Returns the covered area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.rects.iter().map(|r| r.width() * r.height()).sum()
    }

    /// Removes every rectangle, leaving the region empty.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    // -- Set operations --

    /// Adds `rect` to the region.
    pub fn union_rect(&mut self, rect: Rect) {
        if rect_is_empty(rect) {
            return;
        }
        let mut pieces = alloc::vec![rect];
        for &existing in &self.rects {
            if !overlaps(existing, rect) {
                continue;
            }
            let mut next = Vec::with_capacity(pieces.len());
            for piece in pieces {
                subtract_into(piece, existing, &mut next);
            }
            pieces = next;
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
        self.coalesce();
    }

    /// Adds every rectangle of `other` to the region.
    pub fn union(&mut self, other: &Self) {
        for &r in &other.rects {
            self.union_rect(r);
        }
    }

    /// Removes `hole` from the region.
    pub fn subtract_rect(&mut self, hole: Rect) {
        if rect_is_empty(hole) || !self.rects.iter().any(|&r| overlaps(r, hole)) {
            return;
        }
        let mut out = Vec::with_capacity(self.rects.len() + 3);
        for &r in &self.rects {
            subtract_into(r, hole, &mut out);
        }
        self.rects = out;
    }

    /// Removes `other` from the region.
    pub fn subtract(&mut self, other: &Self) {
        for &hole in &other.rects {
            if self.is_empty() {
                return;
            }
            self.subtract_rect(hole);
        }
    }

    /// Restricts the region to `clip`.
    pub fn intersect_rect(&mut self, clip: Rect) {
        self.rects.retain_mut(|r| {
            *r = intersect(*r, clip);
            !rect_is_empty(*r)
        });
    }

    /// Restricts the region to `other`.
    pub fn intersect(&mut self, other: &Self) {
        let mut out = Vec::new();
        for &a in &self.rects {
            for &b in &other.rects {
                let r = intersect(a, b);
                if !rect_is_empty(r) {
                    out.push(r);
                }
            }
        }
        self.rects = out;
    }

    /// Shifts every rectangle by `offset`.
    pub fn translate(&mut self, offset: Vec2) {
        if offset == Vec2::ZERO {
            return;
        }
        for r in &mut self.rects {
            *r = *r + offset;
        }
    }

    // -- Combinators returning new regions --

    /// Returns this region shifted by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        let mut out = self.clone();
        out.translate(offset);
        out
    }

    /// Returns the intersection of this region with `clip`.
    #[must_use]
    pub fn intersected_rect(&self, clip: Rect) -> Self {
        let mut out = self.clone();
        out.intersect_rect(clip);
        out
    }

    /// Returns the intersection of this region with `other`.
    #[must_use]
    pub fn intersected(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.intersect(other);
        out
    }

    /// Returns this region minus `other`.
    #[must_use]
    pub fn subtracted(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.subtract(other);
        out
    }

    /// Returns the union of this region and `other`.
    #[must_use]
    pub fn united(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.union(other);
        out
    }

    // -- Queries --

    /// Returns `true` if `point` lies inside the region.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        self.rects.iter().any(|r| r.contains(point))
    }

    /// Returns `true` if every point of `rect` lies inside the region.
    ///
    /// Degenerate rectangles are trivially contained.
    #[must_use]
    pub fn contains_rect(&self, rect: Rect) -> bool {
        let mut rest = Self::from_rect(rect);
        rest.subtract(self);
        rest.is_empty()
    }

    /// Returns `true` if every point of `other` lies inside the region.
    #[must_use]
    pub fn contains_region(&self, other: &Self) -> bool {
        other.subtracted(self).is_empty()
    }

    /// Returns `true` if the region and `rect` share any area.
    #[must_use]
    pub fn intersects_rect(&self, rect: Rect) -> bool {
        self.rects.iter().any(|&r| overlaps(r, rect))
    }

    /// Returns `true` if the two regions share any area.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        other.rects.iter().any(|&r| self.intersects_rect(r))
    }

    /// Merges rectangles that share a full edge.
    fn coalesce(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    let (a, b) = (self.rects[i], self.rects[j]);
                    let joined = if a.y0 == b.y0 && a.y1 == b.y1 && (a.x1 == b.x0 || b.x1 == a.x0) {
                        Some(Rect::new(a.x0.min(b.x0), a.y0, a.x1.max(b.x1), a.y1))
                    } else if a.x0 == b.x0 && a.x1 == b.x1 && (a.y1 == b.y0 || b.y1 == a.y0) {
                        Some(Rect::new(a.x0, a.y0.min(b.y0), a.x1, a.y1.max(b.y1)))
                    } else {
                        None
                    };
                    if let Some(r) = joined {
                        self.rects[i] = r;
                        self.rects.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.contains_region(other) && other.contains_region(self)
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::from_rect(rect)
    }
}

impl FromIterator<Rect> for Region {
    fn from_iter<I: IntoIterator<Item = Rect>>(iter: I) -> Self {
        let mut region = Self::new();
        for r in iter {
            region.union_rect(r);
        }
        region
    }
}

// ---------------------------------------------------------------------------
// Rectangle helpers
// ---------------------------------------------------------------------------

/// Returns `true` if `r` has no interior (also for NaN coordinates).
#[inline]
#[must_use]
pub fn rect_is_empty(r: Rect) -> bool {
    !(r.x1 > r.x0 && r.y1 > r.y0)
}

/// Intersection of two rectangles. The result may be empty.
#[inline]
#[must_use]
pub fn intersect(a: Rect, b: Rect) -> Rect {
    Rect::new(a.x0.max(b.x0), a.y0.max(b.y0), a.x1.min(b.x1), a.y1.min(b.y1))
}

/// Returns `true` if the interiors of `a` and `b` overlap.
#[inline]
#[must_use]
pub fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}

/// Pushes the parts of `r` not covered by `hole` onto `out`.
///
/// Produces at most four rectangles: full-width bands above and below the
/// hole, and the left and right remainders of the middle band.
fn subtract_into(r: Rect, hole: Rect, out: &mut Vec<Rect>) {
    if !overlaps(r, hole) {
        out.push(r);
        return;
    }
    if hole.y0 > r.y0 {
        out.push(Rect::new(r.x0, r.y0, r.x1, hole.y0));
    }
    if hole.y1 < r.y1 {
        out.push(Rect::new(r.x0, hole.y1, r.x1, r.y1));
    }
    let y0 = r.y0.max(hole.y0);
    let y1 = r.y1.min(hole.y1);
    if hole.x0 > r.x0 {
        out.push(Rect::new(r.x0, y0, hole.x0, y1));
    }
    if hole.x1 < r.x1 {
        out.push(Rect::new(hole.x1, y0, r.x1, y1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    fn assert_disjoint(region: &Region) {
        let rects = region.rects();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!overlaps(*a, *b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn degenerate_rect_is_empty_region() {
        assert!(Region::from_rect(rect(5.0, 5.0, 0.0, 10.0)).is_empty());
        assert!(Region::from_rect(Rect::new(10.0, 10.0, 0.0, 0.0)).is_empty());
        assert_eq!(Region::new().bounding_box(), Rect::ZERO);
    }

    #[test]
    fn union_of_overlapping_rects_has_correct_area() {
        let mut r = Region::from_rect(rect(10.0, 10.0, 5.0, 5.0));
        r.union_rect(rect(12.0, 12.0, 5.0, 5.0));
        assert_disjoint(&r);
        // 25 + 25 - 9 overlap.
        assert_eq!(r.area(), 41.0);
        assert_eq!(r.bounding_box(), Rect::new(10.0, 10.0, 17.0, 17.0));
    }

    #[test]
    fn union_of_contained_rect_is_noop() {
        let mut r = Region::from_rect(rect(0.0, 0.0, 100.0, 100.0));
        r.union_rect(rect(10.0, 10.0, 5.0, 5.0));
        assert_eq!(r.rects().len(), 1);
    }

    #[test]
    fn adjacent_rects_coalesce() {
        let mut r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        r.union_rect(rect(10.0, 0.0, 10.0, 10.0));
        assert_eq!(r.rects(), &[rect(0.0, 0.0, 20.0, 10.0)]);
    }

    #[test]
    fn subtract_leaves_frame() {
        let mut r = Region::from_rect(rect(0.0, 0.0, 30.0, 30.0));
        r.subtract_rect(rect(10.0, 10.0, 10.0, 10.0));
        assert_disjoint(&r);
        assert_eq!(r.area(), 800.0);
        assert!(!r.contains_point(Point::new(15.0, 15.0)));
        assert!(r.contains_point(Point::new(5.0, 15.0)));
        assert!(r.contains_point(Point::new(25.0, 25.0)));
    }

    #[test]
    fn subtract_everything_is_empty() {
        let mut r = Region::from_rect(rect(10.0, 10.0, 5.0, 5.0));
        r.union_rect(rect(30.0, 30.0, 5.0, 5.0));
        r.subtract_rect(rect(0.0, 0.0, 100.0, 100.0));
        assert!(r.is_empty());
    }

    #[test]
    fn intersect_regions() {
        let mut a = Region::from_rect(rect(0.0, 0.0, 20.0, 20.0));
        a.union_rect(rect(40.0, 0.0, 20.0, 20.0));
        let b = Region::from_rect(rect(10.0, 10.0, 40.0, 40.0));
        let i = a.intersected(&b);
        assert_eq!(i.area(), 100.0 + 100.0);
        assert_disjoint(&i);
    }

    #[test]
    fn equality_ignores_decomposition() {
        let whole = Region::from_rect(rect(0.0, 0.0, 20.0, 10.0));
        let mut halves = Region::new();
        halves.union_rect(rect(0.0, 0.0, 10.0, 10.0));
        halves.union_rect(rect(10.0, 0.0, 10.0, 10.0));
        assert_eq!(whole, halves);

        let mut quarters = Region::from_rect(rect(0.0, 0.0, 20.0, 10.0));
        quarters.subtract_rect(rect(0.0, 0.0, 10.0, 5.0));
        assert_ne!(whole, quarters);
    }

    #[test]
    fn contains_rect_across_pieces() {
        let mut r = Region::from_rect(rect(0.0, 0.0, 10.0, 20.0));
        r.union_rect(rect(10.0, 5.0, 10.0, 10.0));
        assert!(r.contains_rect(rect(5.0, 6.0, 10.0, 8.0)));
        assert!(!r.contains_rect(rect(5.0, 0.0, 10.0, 8.0)));
    }

    #[test]
    fn translate_moves_all_rects() {
        let mut r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        r.union_rect(rect(20.0, 20.0, 5.0, 5.0));
        r.translate(Vec2::new(3.0, -2.0));
        assert!(r.contains_rect(rect(3.0, -2.0, 10.0, 10.0)));
        assert!(r.contains_rect(rect(23.0, 18.0, 5.0, 5.0)));
        assert_eq!(r.area(), 125.0);
    }

    #[test]
    fn shared_edge_is_not_overlap() {
        assert!(!overlaps(rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 0.0, 10.0, 10.0)));
        let r = Region::from_rect(rect(0.0, 0.0, 10.0, 10.0));
        assert!(!r.intersects_rect(rect(10.0, 0.0, 5.0, 5.0)));
        assert!(r.intersects_rect(rect(9.0, 9.0, 5.0, 5.0)));
    }
}
