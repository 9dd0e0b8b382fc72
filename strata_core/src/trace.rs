// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! widget tree calls as it invalidates, paints, and moves focus. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! [`Diagnostic`]s do not go through [`Tracer`]: programming errors are
//! always delivered to an installed sink, regardless of features.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates per-widget [`PaintEvent`]s and
//!   the corresponding `TraceSink` method.

use kurbo::{Rect, Vec2};

use crate::error::ProgrammingError;
use crate::notify::FocusReason;
use crate::widget::WidgetId;
use crate::window::WindowState;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What started a paint pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// A pass scheduled by the run loop after invalidation.
    Scheduled,
    /// A synchronous repaint of one subtree.
    Repaint,
    /// Rendering into an offscreen buffer.
    Grab,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a paint pass starts.
#[derive(Clone, Copy, Debug)]
pub struct PassBeginEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Window being painted.
    pub window: WidgetId,
    /// What started the pass.
    pub kind: PassKind,
    /// Bounding box of the area to repaint, in window coordinates.
    pub bounds: Rect,
    /// Number of rectangles in the area to repaint.
    pub rect_count: u32,
}

/// Emitted when a paint pass finishes.
#[derive(Clone, Copy, Debug)]
pub struct PassEndEvent {
    /// Monotonic pass counter.
    pub pass_index: u64,
    /// Window that was painted.
    pub window: WidgetId,
    /// Number of paint notifications dispatched.
    pub paint_count: u32,
    /// Whether invalidation during the pass requested another pass.
    pub rescheduled: bool,
}

/// Emitted when a window gains new damage.
#[derive(Clone, Copy, Debug)]
pub struct InvalidateEvent {
    /// Window that owns the damage.
    pub window: WidgetId,
    /// Bounding box of the newly marked area, in window coordinates.
    pub bounds: Rect,
}

/// Emitted when previously painted pixels are moved instead of repainted.
#[derive(Clone, Copy, Debug)]
pub struct BlitEvent {
    /// Window whose backing store was scrolled.
    pub window: WidgetId,
    /// Source rectangle, in window coordinates.
    pub source: Rect,
    /// Offset applied to the pixels.
    pub delta: Vec2,
}

/// Emitted when keyboard focus moves.
#[derive(Clone, Copy, Debug)]
pub struct FocusChangeEvent {
    /// Widget that lost focus, if any.
    pub old: Option<WidgetId>,
    /// Widget that gained focus, if any.
    pub new: Option<WidgetId>,
    /// Why focus moved.
    pub reason: FocusReason,
}

/// Emitted when a window changes state.
#[derive(Clone, Copy, Debug)]
pub struct WindowStateEvent {
    /// The window.
    pub window: WidgetId,
    /// State before the change.
    pub old: WindowState,
    /// State after the change.
    pub new: WindowState,
}

/// Emitted for each paint notification dispatched during a pass.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct PaintEvent {
    /// Pass counter.
    pub pass_index: u64,
    /// Widget that was asked to paint.
    pub widget: WidgetId,
    /// Bounding box of the owed region, in widget coordinates.
    pub bounds: Rect,
    /// Number of rectangles in the owed region.
    pub rect_count: u32,
}

/// A recovered programming error.
#[derive(Clone, Copy, Debug)]
pub struct Diagnostic {
    /// Widget the offending call targeted, if any.
    pub widget: Option<WidgetId>,
    /// What went wrong.
    pub error: ProgrammingError,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events and diagnostics from the widget tree.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a paint pass starts.
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        _ = e;
    }

    /// Called when a paint pass finishes.
    fn on_pass_end(&mut self, e: &PassEndEvent) {
        _ = e;
    }

    /// Called when a window gains damage.
    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        _ = e;
    }

    /// Called when backing-store pixels are moved.
    fn on_blit(&mut self, e: &BlitEvent) {
        _ = e;
    }

    /// Called when keyboard focus moves.
    fn on_focus_change(&mut self, e: &FocusChangeEvent) {
        _ = e;
    }

    /// Called when a window changes state.
    fn on_window_state(&mut self, e: &WindowStateEvent) {
        _ = e;
    }

    /// Called for each paint notification (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_paint(&mut self, e: &PaintEvent) {
        _ = e;
    }

    /// Called when a programming error was recovered from.
    ///
    /// Delivered regardless of crate features.
    fn on_diagnostic(&mut self, d: &Diagnostic) {
        _ = d;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PassBeginEvent`].
    #[inline]
    pub fn pass_begin(&mut self, e: &PassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PassEndEvent`].
    #[inline]
    pub fn pass_end(&mut self, e: &PassEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_pass_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`InvalidateEvent`].
    #[inline]
    pub fn invalidate(&mut self, e: &InvalidateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_invalidate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`BlitEvent`].
    #[inline]
    pub fn blit(&mut self, e: &BlitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_blit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FocusChangeEvent`].
    #[inline]
    pub fn focus_change(&mut self, e: &FocusChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_focus_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`WindowStateEvent`].
    #[inline]
    pub fn window_state(&mut self, e: &WindowStateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_window_state(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintEvent`].
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn paint(&mut self, e: &PaintEvent) {
        if let Some(s) = &mut self.sink {
            s.on_paint(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_tracer_accepts_events() {
        let mut tracer = Tracer::none();
        tracer.invalidate(&InvalidateEvent {
            window: WidgetId::from_raw(0, 0),
            bounds: Rect::ZERO,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_forwards_to_sink() {
        #[derive(Default)]
        struct Count(u32);
        impl TraceSink for Count {
            fn on_blit(&mut self, _: &BlitEvent) {
                self.0 += 1;
            }
        }

        let mut sink = Count::default();
        let mut tracer = Tracer::new(&mut sink);
        tracer.blit(&BlitEvent {
            window: WidgetId::from_raw(1, 0),
            source: Rect::new(0.0, 0.0, 4.0, 4.0),
            delta: Vec2::new(1.0, 0.0),
        });
        drop(tracer);
        assert_eq!(sink.0, 1);
    }
}
