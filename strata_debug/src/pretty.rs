// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] writes one line per event to any [`Write`]
//! implementation (stderr by default). Write errors are ignored: a broken
//! log stream must never disturb painting.

use std::io::{self, Write};

use kurbo::Rect;
use strata_core::trace::{
    BlitEvent, Diagnostic, FocusChangeEvent, InvalidateEvent, PaintEvent, PassBeginEvent,
    PassEndEvent, TraceSink, WindowStateEvent,
};
use strata_core::widget::WidgetId;

/// A [`TraceSink`] that prints each event on its own line.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(io::stderr()),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn widget(id: WidgetId) -> String {
    format!("#{}.{}", id.index(), id.generation())
}

fn maybe_widget(id: Option<WidgetId>) -> String {
    id.map_or_else(|| "-".to_owned(), widget)
}

fn rect(r: Rect) -> String {
    format!("({}, {}) {}x{}", r.x0, r.y0, r.width(), r.height())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass {}] begin {:?} window={} area={} rects={}",
            e.pass_index,
            e.kind,
            widget(e.window),
            rect(e.bounds),
            e.rect_count,
        );
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        let _ = writeln!(
            self.writer,
            "[pass {}] end window={} painted={}{}",
            e.pass_index,
            widget(e.window),
            e.paint_count,
            if e.rescheduled { " rescheduled" } else { "" },
        );
    }

    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        let _ = writeln!(
            self.writer,
            "[invalidate] window={} area={}",
            widget(e.window),
            rect(e.bounds),
        );
    }

    fn on_blit(&mut self, e: &BlitEvent) {
        let _ = writeln!(
            self.writer,
            "[blit] window={} source={} delta=({}, {})",
            widget(e.window),
            rect(e.source),
            e.delta.x,
            e.delta.y,
        );
    }

    fn on_focus_change(&mut self, e: &FocusChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[focus] {} -> {} ({:?})",
            maybe_widget(e.old),
            maybe_widget(e.new),
            e.reason,
        );
    }

    fn on_window_state(&mut self, e: &WindowStateEvent) {
        let _ = writeln!(
            self.writer,
            "[window] {} {:?} -> {:?}",
            widget(e.window),
            e.old,
            e.new,
        );
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        let _ = writeln!(
            self.writer,
            "[pass {}]   paint {} area={} rects={}",
            e.pass_index,
            widget(e.widget),
            rect(e.bounds),
            e.rect_count,
        );
    }

    fn on_diagnostic(&mut self, d: &Diagnostic) {
        let _ = writeln!(
            self.writer,
            "[warning] {}: {}",
            maybe_widget(d.widget),
            d.error,
        );
    }
}
