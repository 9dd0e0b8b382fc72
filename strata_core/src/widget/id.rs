// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget and native-surface identity types.

use core::fmt;

/// Sentinel value indicating "no widget" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a widget in a [`WidgetTree`](super::WidgetTree).
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a widget is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetId {
    /// Slot index into the tree's arrays.
    pub(crate) idx: u32,
    /// Generation counter; must match the tree's generation for this slot.
    pub(crate) generation: u32,
}

impl WidgetId {
    /// Reassembles a handle from its raw parts.
    ///
    /// Intended for decoding recorded traces; a handle built this way is only
    /// valid if the parts came from a live widget.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self {
            idx: index,
            generation,
        }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WidgetId({}@gen{})", self.idx, self.generation)
    }
}

/// An opaque reference to a native platform surface.
///
/// Surfaces are created by the [`PlatformBridge`](crate::backend::PlatformBridge)
/// for top-level windows and for children that request their own surface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHandle({})", self.0)
    }
}
