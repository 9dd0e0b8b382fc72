// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform bridge contract.
//!
//! The engine never talks to a windowing system directly. Everything native
//! goes through a [`PlatformBridge`], owned by the
//! [`WidgetTree`](crate::widget::WidgetTree):
//!
//! - **Surfaces** — creation, destruction, geometry, visibility, and stacking
//!   of native windows and native child surfaces.
//! - **Screen** — screen and work-area geometry, plus frame margins for
//!   decorated windows.
//! - **Run loop** — [`schedule_update`](PlatformBridge::schedule_update)
//!   asks the external run loop to call
//!   [`WidgetTree::paint_pass`](crate::widget::WidgetTree::paint_pass) later.
//!   It is called at most once per window between passes.
//! - **Output** — [`flush`](PlatformBridge::flush) hands freshly painted
//!   pixels to the screen, and [`recomposite`](PlatformBridge::recomposite)
//!   asks the platform to re-composite native child surfaces the pixel
//!   compositor skipped.
//!
//! Incoming native events name surfaces, not widgets. A bridge maps them back
//! with a [`SurfaceRegistry`], which it owns; there is no process-wide lookup
//! table.

use alloc::collections::BTreeMap;

use kurbo::{Insets, Rect};

use crate::error::SurfaceError;
use crate::paint::PixelBuffer;
use crate::region::Region;
use crate::widget::{SurfaceHandle, WidgetId};

/// Screen geometry reported by [`NullBridge`].
pub const DEFAULT_SCREEN: Rect = Rect::new(0.0, 0.0, 1920.0, 1080.0);

/// Native windowing services consumed by the widget tree.
///
/// Only [`create_surface`](Self::create_surface),
/// [`destroy_surface`](Self::destroy_surface), and
/// [`screen_geometry`](Self::screen_geometry) are required; every other
/// method defaults to a no-op or a neutral answer.
pub trait PlatformBridge {
    /// Creates a native surface for `widget` at `geometry` (screen
    /// coordinates for windows, window coordinates for native children).
    fn create_surface(
        &mut self,
        widget: WidgetId,
        geometry: Rect,
    ) -> Result<SurfaceHandle, SurfaceError>;

    /// Destroys a surface created by [`create_surface`](Self::create_surface).
    fn destroy_surface(&mut self, surface: SurfaceHandle);

    /// Moves or resizes a surface.
    fn set_surface_geometry(&mut self, surface: SurfaceHandle, geometry: Rect) {
        _ = (surface, geometry);
    }

    /// Returns the current geometry of a surface, if known.
    fn surface_geometry(&self, surface: SurfaceHandle) -> Option<Rect> {
        _ = surface;
        None
    }

    /// Maps a surface on screen.
    fn show_surface(&mut self, surface: SurfaceHandle) {
        _ = surface;
    }

    /// Unmaps a surface.
    fn hide_surface(&mut self, surface: SurfaceHandle) {
        _ = surface;
    }

    /// Stacks a surface above its siblings.
    fn raise_surface(&mut self, surface: SurfaceHandle) {
        _ = surface;
    }

    /// Stacks a surface below its siblings.
    fn lower_surface(&mut self, surface: SurfaceHandle) {
        _ = surface;
    }

    /// Returns the decoration margins around a window surface.
    fn frame_margins(&self, surface: SurfaceHandle) -> Insets {
        _ = surface;
        Insets::ZERO
    }

    /// Returns the full screen rectangle.
    fn screen_geometry(&self) -> Rect;

    /// Returns the screen area available to windows (excluding panels).
    fn available_geometry(&self) -> Rect {
        self.screen_geometry()
    }

    /// Requests that the run loop paint `window` soon.
    fn schedule_update(&mut self, window: WidgetId) {
        _ = window;
    }

    /// Called when focus navigation wraps around `window`'s focus chain.
    ///
    /// Returning `false` vetoes the wrap; focus stays where it is (for
    /// example, because an embedding host takes focus instead).
    fn focus_wrap(&mut self, window: WidgetId, forward: bool) -> bool {
        _ = (window, forward);
        true
    }

    /// Asks the platform to re-composite a native child surface over
    /// `region` (window coordinates).
    fn recomposite(&mut self, surface: SurfaceHandle, region: &Region) {
        _ = (surface, region);
    }

    /// Presents `region` (window coordinates) of `buffer` on `surface`.
    fn flush(&mut self, surface: SurfaceHandle, region: &Region, buffer: &PixelBuffer) {
        _ = (surface, region, buffer);
    }

    /// Maps a native surface back to its widget.
    fn widget_for_surface(&self, surface: SurfaceHandle) -> Option<WidgetId> {
        _ = surface;
        None
    }
}

// ---------------------------------------------------------------------------
// SurfaceRegistry
// ---------------------------------------------------------------------------

/// Handle-to-widget map for routing native events.
///
/// Owned by a bridge; handles are allocated sequentially and never reused.
#[derive(Clone, Debug, Default)]
pub struct SurfaceRegistry {
    next: u64,
    widgets: BTreeMap<SurfaceHandle, WidgetId>,
}

impl SurfaceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh handle bound to `widget`.
    pub fn register(&mut self, widget: WidgetId) -> SurfaceHandle {
        self.next += 1;
        let handle = SurfaceHandle(self.next);
        self.widgets.insert(handle, widget);
        handle
    }

    /// Removes a handle. Unknown handles are ignored.
    pub fn unregister(&mut self, surface: SurfaceHandle) -> Option<WidgetId> {
        self.widgets.remove(&surface)
    }

    /// Returns the widget bound to `surface`.
    #[must_use]
    pub fn widget(&self, surface: SurfaceHandle) -> Option<WidgetId> {
        self.widgets.get(&surface).copied()
    }

    /// Returns the number of live handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Returns `true` if no handles are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// NullBridge
// ---------------------------------------------------------------------------

/// A [`PlatformBridge`] with no screen behind it.
///
/// Surfaces always succeed and are tracked only in a [`SurfaceRegistry`];
/// update requests and flushes are dropped. Useful for tests and for driving
/// the engine without a windowing system.
#[derive(Clone, Debug, Default)]
pub struct NullBridge {
    registry: SurfaceRegistry,
}

impl NullBridge {
    /// Creates a bridge with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlatformBridge for NullBridge {
    fn create_surface(
        &mut self,
        widget: WidgetId,
        geometry: Rect,
    ) -> Result<SurfaceHandle, SurfaceError> {
        _ = geometry;
        Ok(self.registry.register(widget))
    }

    fn destroy_surface(&mut self, surface: SurfaceHandle) {
        self.registry.unregister(surface);
    }

    fn screen_geometry(&self) -> Rect {
        DEFAULT_SCREEN
    }

    fn widget_for_surface(&self, surface: SurfaceHandle) -> Option<WidgetId> {
        self.registry.widget(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_round_trips_handles() {
        let mut reg = SurfaceRegistry::new();
        let a = WidgetId::from_raw(0, 0);
        let b = WidgetId::from_raw(1, 0);
        let ha = reg.register(a);
        let hb = reg.register(b);
        assert_ne!(ha, hb);
        assert_eq!(reg.widget(ha), Some(a));
        assert_eq!(reg.unregister(ha), Some(a));
        assert_eq!(reg.widget(ha), None);
        assert_eq!(reg.unregister(ha), None);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn null_bridge_maps_surfaces() {
        let mut bridge = NullBridge::new();
        let w = WidgetId::from_raw(3, 1);
        let s = bridge.create_surface(w, Rect::ZERO).unwrap();
        assert_eq!(bridge.widget_for_surface(s), Some(w));
        bridge.destroy_surface(s);
        assert_eq!(bridge.widget_for_surface(s), None);
    }
}
