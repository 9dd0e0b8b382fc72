// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for unit tests.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::{Insets, Rect};

use crate::backend::{PlatformBridge, SurfaceRegistry};
use crate::error::{ProgrammingError, SurfaceError};
use crate::notify::{InputEvent, Notification, PaintCtx, Widget, WidgetCtx};
use crate::paint::PixelBuffer;
use crate::region::Region;
use crate::trace::{Diagnostic, TraceSink};
use crate::widget::{SurfaceHandle, WidgetId};

/// Something a [`Recorder`] saw.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Notify(&'static str, Notification),
    Paint(&'static str, Region),
    Input(&'static str, InputEvent),
}

pub(crate) type Log = Rc<RefCell<Vec<Event>>>;

pub(crate) fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// The paint events in `log`, in order.
pub(crate) fn paints(log: &Log) -> Vec<(&'static str, Region)> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Paint(name, region) => Some((*name, region.clone())),
            _ => None,
        })
        .collect()
}

/// A widget that appends everything it receives to a shared log.
pub(crate) struct Recorder {
    name: &'static str,
    log: Log,
    on_paint: Option<fn(&mut PaintCtx<'_>)>,
    accept_input: bool,
}

impl Recorder {
    pub(crate) fn boxed(name: &'static str, log: &Log) -> Box<Self> {
        Box::new(Self {
            name,
            log: log.clone(),
            on_paint: None,
            accept_input: true,
        })
    }

    pub(crate) fn with_paint(mut self: Box<Self>, f: fn(&mut PaintCtx<'_>)) -> Box<Self> {
        self.on_paint = Some(f);
        self
    }

    pub(crate) fn ignoring_input(mut self: Box<Self>) -> Box<Self> {
        self.accept_input = false;
        self
    }
}

impl Widget for Recorder {
    fn notify(&mut self, _ctx: &mut WidgetCtx<'_>, notification: &Notification) {
        self.log
            .borrow_mut()
            .push(Event::Notify(self.name, *notification));
    }

    fn paint(&mut self, ctx: &mut PaintCtx<'_>) {
        self.log
            .borrow_mut()
            .push(Event::Paint(self.name, ctx.region().clone()));
        if let Some(f) = self.on_paint {
            f(ctx);
        }
    }

    fn input(&mut self, _ctx: &mut WidgetCtx<'_>, event: &InputEvent) -> bool {
        self.log.borrow_mut().push(Event::Input(self.name, *event));
        self.accept_input
    }
}

pub(crate) type Diagnostics = Rc<RefCell<Vec<ProgrammingError>>>;

pub(crate) fn diagnostics() -> Diagnostics {
    Rc::new(RefCell::new(Vec::new()))
}

/// Collects reported programming errors.
pub(crate) struct DiagSink(pub(crate) Diagnostics);

impl TraceSink for DiagSink {
    fn on_diagnostic(&mut self, d: &Diagnostic) {
        self.0.borrow_mut().push(d.error);
    }
}

/// A bridge that records every call it receives.
#[derive(Debug)]
pub(crate) struct TestBridge {
    pub(crate) registry: SurfaceRegistry,
    pub(crate) surfaces: BTreeMap<SurfaceHandle, Rect>,
    pub(crate) scheduled: Vec<WidgetId>,
    pub(crate) flushes: Vec<(SurfaceHandle, Region)>,
    pub(crate) recomposites: Vec<(SurfaceHandle, Region)>,
    pub(crate) fail_next_surface: bool,
    pub(crate) veto_wrap: bool,
    pub(crate) wraps: Vec<bool>,
    pub(crate) margins: Insets,
    pub(crate) screen: Rect,
    pub(crate) available: Rect,
}

impl Default for TestBridge {
    fn default() -> Self {
        Self {
            registry: SurfaceRegistry::new(),
            surfaces: BTreeMap::new(),
            scheduled: Vec::new(),
            flushes: Vec::new(),
            recomposites: Vec::new(),
            fail_next_surface: false,
            veto_wrap: false,
            wraps: Vec::new(),
            margins: Insets::ZERO,
            screen: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            available: Rect::new(0.0, 0.0, 1920.0, 1040.0),
        }
    }
}

impl PlatformBridge for TestBridge {
    fn create_surface(
        &mut self,
        widget: WidgetId,
        geometry: Rect,
    ) -> Result<SurfaceHandle, SurfaceError> {
        if core::mem::take(&mut self.fail_next_surface) {
            return Err(SurfaceError::ResourceExhaustion);
        }
        let handle = self.registry.register(widget);
        self.surfaces.insert(handle, geometry);
        Ok(handle)
    }

    fn destroy_surface(&mut self, surface: SurfaceHandle) {
        self.registry.unregister(surface);
        self.surfaces.remove(&surface);
    }

    fn set_surface_geometry(&mut self, surface: SurfaceHandle, geometry: Rect) {
        if let Some(r) = self.surfaces.get_mut(&surface) {
            *r = geometry;
        }
    }

    fn surface_geometry(&self, surface: SurfaceHandle) -> Option<Rect> {
        self.surfaces.get(&surface).copied()
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
        self.scheduled.push(window);
    }

    fn focus_wrap(&mut self, _window: WidgetId, forward: bool) -> bool {
        self.wraps.push(forward);
        !self.veto_wrap
    }

    fn recomposite(&mut self, surface: SurfaceHandle, region: &Region) {
        self.recomposites.push((surface, region.clone()));
    }

    fn flush(&mut self, surface: SurfaceHandle, region: &Region, _buffer: &PixelBuffer) {
        self.flushes.push((surface, region.clone()));
    }

    fn widget_for_surface(&self, surface: SurfaceHandle) -> Option<WidgetId> {
        self.registry.widget(surface)
    }
}
