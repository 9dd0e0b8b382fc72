// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory surface table.

use std::collections::{BTreeMap, VecDeque};

use kurbo::{Insets, Rect};
use strata_core::backend::{DEFAULT_SCREEN, PlatformBridge, SurfaceRegistry};
use strata_core::error::SurfaceError;
use strata_core::paint::PixelBuffer;
use strata_core::region::Region;
use strata_core::widget::{SurfaceHandle, WidgetId};

/// State of one headless surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessSurface {
    /// Widget the surface was created for.
    pub widget: WidgetId,
    /// Last geometry set by the engine.
    pub geometry: Rect,
    /// Whether the surface is mapped.
    pub visible: bool,
}

/// One [`flush`](PlatformBridge::flush) call.
#[derive(Clone, Debug, PartialEq)]
pub struct FlushRecord {
    /// Surface the pixels were presented to.
    pub surface: SurfaceHandle,
    /// Area that changed, in window coordinates.
    pub region: Region,
    /// Buffer width at the time of the flush.
    pub width: u32,
    /// Buffer height at the time of the flush.
    pub height: u32,
}

/// A [`PlatformBridge`] backed by plain data structures.
#[derive(Clone, Debug)]
pub struct HeadlessBridge {
    registry: SurfaceRegistry,
    surfaces: BTreeMap<SurfaceHandle, HeadlessSurface>,
    /// Bottom to top.
    stacking: Vec<SurfaceHandle>,
    screen: Rect,
    available: Rect,
    margins: Insets,
    pending: VecDeque<WidgetId>,
    fail_next_surface: bool,
    veto_wrap: bool,
    flushes: Vec<FlushRecord>,
    recomposites: Vec<(SurfaceHandle, Region)>,
}

impl Default for HeadlessBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBridge {
    /// Creates a bridge with a 1920x1080 screen and no decorations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: SurfaceRegistry::new(),
            surfaces: BTreeMap::new(),
            stacking: Vec::new(),
            screen: DEFAULT_SCREEN,
            available: DEFAULT_SCREEN,
            margins: Insets::ZERO,
            pending: VecDeque::new(),
            fail_next_surface: false,
            veto_wrap: false,
            flushes: Vec::new(),
            recomposites: Vec::new(),
        }
    }

    /// Sets the screen and its available (work) area.
    #[must_use]
    pub fn with_screen(mut self, screen: Rect, available: Rect) -> Self {
        self.screen = screen;
        self.available = available;
        self
    }

    /// Sets the decoration margins reported for every surface.
    #[must_use]
    pub fn with_frame_margins(mut self, margins: Insets) -> Self {
        self.margins = margins;
        self
    }

    // -- Scripting --

    /// Makes the next [`create_surface`](PlatformBridge::create_surface) call
    /// fail with [`SurfaceError::ResourceExhaustion`].
    pub fn fail_next_surface(&mut self) {
        self.fail_next_surface = true;
    }

    /// Refuses (or allows) focus navigation wrapping around a window.
    pub fn set_focus_wrap_veto(&mut self, veto: bool) {
        self.veto_wrap = veto;
    }

    // -- Inspection --

    /// Returns the state of a live surface.
    #[must_use]
    pub fn surface(&self, handle: SurfaceHandle) -> Option<&HeadlessSurface> {
        self.surfaces.get(&handle)
    }

    /// Returns the number of live surfaces.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Live surfaces, bottom to top.
    #[must_use]
    pub fn stacking_order(&self) -> &[SurfaceHandle] {
        &self.stacking
    }

    /// Returns `true` if a window asked for a paint pass.
    #[must_use]
    pub fn has_pending_updates(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Removes and returns the windows that asked for a paint pass, oldest
    /// first.
    pub fn take_pending_updates(&mut self) -> Vec<WidgetId> {
        self.pending.drain(..).collect()
    }

    /// Every flush since the last [`clear_logs`](Self::clear_logs).
    #[must_use]
    pub fn flushes(&self) -> &[FlushRecord] {
        &self.flushes
    }

    /// Every re-composite request since the last
    /// [`clear_logs`](Self::clear_logs).
    #[must_use]
    pub fn recomposites(&self) -> &[(SurfaceHandle, Region)] {
        &self.recomposites
    }

    /// Clears the flush and re-composite logs.
    pub fn clear_logs(&mut self) {
        self.flushes.clear();
        self.recomposites.clear();
    }

    fn restack(&mut self, surface: SurfaceHandle, top: bool) {
        self.stacking.retain(|&s| s != surface);
        if top {
            self.stacking.push(surface);
        } else {
            self.stacking.insert(0, surface);
        }
    }
}

impl PlatformBridge for HeadlessBridge {
    fn create_surface(
        &mut self,
        widget: WidgetId,
        geometry: Rect,
    ) -> Result<SurfaceHandle, SurfaceError> {
        if std::mem::take(&mut self.fail_next_surface) {
            return Err(SurfaceError::ResourceExhaustion);
        }
        if !(geometry.is_finite() && geometry.width() >= 0.0 && geometry.height() >= 0.0) {
            return Err(SurfaceError::InvalidGeometry);
        }
        let handle = self.registry.register(widget);
        self.surfaces.insert(
            handle,
            HeadlessSurface {
                widget,
                geometry,
                visible: false,
            },
        );
        self.stacking.push(handle);
        Ok(handle)
    }

    fn destroy_surface(&mut self, surface: SurfaceHandle) {
        self.registry.unregister(surface);
        self.surfaces.remove(&surface);
        self.stacking.retain(|&s| s != surface);
    }

    fn set_surface_geometry(&mut self, surface: SurfaceHandle, geometry: Rect) {
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.geometry = geometry;
        }
    }

    fn surface_geometry(&self, surface: SurfaceHandle) -> Option<Rect> {
        self.surfaces.get(&surface).map(|s| s.geometry)
    }

    fn show_surface(&mut self, surface: SurfaceHandle) {
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.visible = true;
        }
    }

    fn hide_surface(&mut self, surface: SurfaceHandle) {
        if let Some(s) = self.surfaces.get_mut(&surface) {
            s.visible = false;
        }
    }

    fn raise_surface(&mut self, surface: SurfaceHandle) {
        self.restack(surface, true);
    }

    fn lower_surface(&mut self, surface: SurfaceHandle) {
        self.restack(surface, false);
    }

    fn frame_margins(&self, _surface: SurfaceHandle) -> Insets {
        self.margins
    }

    fn screen_geometry(&self) -> Rect {
        self.screen
    }

    fn available_geometry(&self) -> Rect {
        self.available
    }

    fn schedule_update(&mut self, window: WidgetId) {
        if !self.pending.contains(&window) {
            self.pending.push_back(window);
        }
    }

    fn focus_wrap(&mut self, _window: WidgetId, _forward: bool) -> bool {
        !self.veto_wrap
    }

    fn recomposite(&mut self, surface: SurfaceHandle, region: &Region) {
        self.recomposites.push((surface, region.clone()));
    }

    fn flush(&mut self, surface: SurfaceHandle, region: &Region, buffer: &PixelBuffer) {
        self.flushes.push(FlushRecord {
            surface,
            region: region.clone(),
            width: buffer.width(),
            height: buffer.height(),
        });
    }

    fn widget_for_surface(&self, surface: SurfaceHandle) -> Option<WidgetId> {
        self.registry.widget(surface)
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;
    use strata_core::widget::WidgetTree;

    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    #[test]
    fn window_lifecycle_maps_surfaces() {
        let mut tree = WidgetTree::with_bridge(HeadlessBridge::new());
        let win = tree.create_widget(None, rect(10.0, 10.0, 200.0, 100.0));
        tree.show(win).unwrap();
        let surface = tree.surface(win).unwrap();
        assert_eq!(
            tree.bridge().surface(surface),
            Some(&HeadlessSurface {
                widget: win,
                geometry: rect(10.0, 10.0, 200.0, 100.0),
                visible: true,
            })
        );

        tree.move_to(win, Point::new(50.0, 60.0));
        assert_eq!(
            tree.bridge().surface_geometry(surface),
            Some(rect(50.0, 60.0, 200.0, 100.0))
        );

        tree.hide(win);
        assert!(!tree.bridge().surface(surface).unwrap().visible);
        tree.destroy(win);
        assert_eq!(tree.bridge().surface_count(), 0);
        assert_eq!(tree.bridge().widget_for_surface(surface), None);
    }

    #[test]
    fn raise_and_lower_restack_windows() {
        let mut tree = WidgetTree::with_bridge(HeadlessBridge::new());
        let a = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        let b = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        tree.show(a).unwrap();
        tree.show(b).unwrap();
        let (sa, sb) = (tree.surface(a).unwrap(), tree.surface(b).unwrap());
        assert_eq!(tree.bridge().stacking_order(), &[sa, sb]);
        tree.raise(a);
        assert_eq!(tree.bridge().stacking_order(), &[sb, sa]);
        tree.lower(a);
        assert_eq!(tree.bridge().stacking_order(), &[sa, sb]);
    }

    #[test]
    fn injected_failure_is_returned_once() {
        let mut tree = WidgetTree::with_bridge(HeadlessBridge::new());
        let win = tree.create_widget(None, rect(0.0, 0.0, 10.0, 10.0));
        tree.bridge_mut().fail_next_surface();
        assert_eq!(tree.show(win), Err(SurfaceError::ResourceExhaustion));
        assert!(!tree.is_visible(win));
        assert_eq!(tree.show(win), Ok(()));
    }

    #[test]
    fn schedule_requests_are_deduplicated() {
        let mut bridge = HeadlessBridge::new();
        let w = WidgetId::from_raw(0, 0);
        bridge.schedule_update(w);
        bridge.schedule_update(w);
        assert_eq!(bridge.take_pending_updates(), vec![w]);
        assert!(!bridge.has_pending_updates());
    }

    #[test]
    fn maximize_uses_scripted_work_area() {
        let bridge = HeadlessBridge::new()
            .with_screen(rect(0.0, 0.0, 800.0, 600.0), rect(0.0, 30.0, 800.0, 570.0))
            .with_frame_margins(Insets::new(1.0, 20.0, 1.0, 1.0));
        let mut tree = WidgetTree::with_bridge(bridge);
        let win = tree.create_widget(None, rect(100.0, 100.0, 100.0, 100.0));
        tree.show_maximized(win).unwrap();
        assert_eq!(tree.frame_geometry(win), rect(0.0, 30.0, 800.0, 570.0));
        assert_eq!(tree.geometry(win), rect(1.0, 50.0, 798.0, 549.0));
    }
}
