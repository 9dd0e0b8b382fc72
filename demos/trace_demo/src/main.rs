// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless session that exercises the tracing and diagnostics pipeline.
//!
//! Builds a small window on the headless backend, mutates it (moves, focus
//! navigation, maximize and restore, a bad size request), and runs paint
//! passes in between. Every event goes to both a
//! [`PrettyPrintSink`](strata_debug::pretty::PrettyPrintSink) on stdout and a
//! [`RecorderSink`](strata_debug::recorder::RecorderSink), whose recording
//! is then exported as JSON.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use strata_backend_headless::{HeadlessBridge, HeadlessRunLoop};
use strata_core::focus::FocusPolicy;
use strata_core::notify::{PaintCtx, Widget};
use strata_core::paint::Color;
use strata_core::trace::{
    BlitEvent, Diagnostic, FocusChangeEvent, InvalidateEvent, PaintEvent, PassBeginEvent,
    PassEndEvent, TraceSink, WindowStateEvent,
};
use strata_core::widget::WidgetTree;
use strata_core::window::WindowState;
use strata_debug::pretty::PrettyPrintSink;
use strata_debug::recorder::RecorderSink;

/// Forwards every event to a pretty printer and a shared recorder.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Tee {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.pretty.on_pass_begin(e);
        self.recorder.borrow_mut().on_pass_begin(e);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.pretty.on_pass_end(e);
        self.recorder.borrow_mut().on_pass_end(e);
    }

    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        self.pretty.on_invalidate(e);
        self.recorder.borrow_mut().on_invalidate(e);
    }

    fn on_blit(&mut self, e: &BlitEvent) {
        self.pretty.on_blit(e);
        self.recorder.borrow_mut().on_blit(e);
    }

    fn on_focus_change(&mut self, e: &FocusChangeEvent) {
        self.pretty.on_focus_change(e);
        self.recorder.borrow_mut().on_focus_change(e);
    }

    fn on_window_state(&mut self, e: &WindowStateEvent) {
        self.pretty.on_window_state(e);
        self.recorder.borrow_mut().on_window_state(e);
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        self.pretty.on_paint(e);
        self.recorder.borrow_mut().on_paint(e);
    }

    fn on_diagnostic(&mut self, d: &Diagnostic) {
        self.pretty.on_diagnostic(d);
        self.recorder.borrow_mut().on_diagnostic(d);
    }
}

/// A flat-colored widget.
struct Swatch(Color);

impl Widget for Swatch {
    fn paint(&mut self, ctx: &mut PaintCtx<'_>) {
        ctx.painter().fill(self.0);
    }
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    Rect::new(x, y, x + w, y + h)
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let tee = Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: recorder.clone(),
    };

    // -- tree --------------------------------------------------------------
    let mut tree = WidgetTree::with_bridge(HeadlessBridge::new());
    let _ = tree.set_trace_sink(Box::new(tee));
    let run_loop = HeadlessRunLoop::new();

    let window = tree.create_widget(None, rect(100.0, 100.0, 320.0, 240.0));
    let toolbar = tree.create_widget(Some(window), rect(0.0, 0.0, 320.0, 32.0));
    tree.set_fill(toolbar, Some(Color::rgb(0x30, 0x30, 0x38)));

    let mut buttons = Vec::new();
    for (i, color) in [0xC0_40_40_u32, 0x40_C0_40, 0x40_40_C0].into_iter().enumerate() {
        let x = 16.0 + 64.0 * i as f64;
        let button = tree.create_widget(Some(window), rect(x, 64.0, 48.0, 24.0));
        let [_, r, g, b] = color.to_be_bytes();
        tree.set_widget(button, Box::new(Swatch(Color::rgb(r, g, b))));
        tree.set_opaque_paint(button, true);
        tree.set_focus_policy(button, FocusPolicy::StrongFocus);
        buttons.push(button);
    }

    // -- session -----------------------------------------------------------
    println!("-- show");
    tree.show(window).expect("headless surfaces never fail");
    run_loop.run_pending(&mut tree);

    println!("-- move a button (blit)");
    tree.move_to(buttons[2], Point::new(208.0, 120.0));
    run_loop.run_pending(&mut tree);

    println!("-- small update");
    tree.update_rect(window, rect(0.0, 200.0, 40.0, 40.0));
    tree.update_rect(window, rect(20.0, 210.0, 40.0, 20.0));
    run_loop.run_pending(&mut tree);

    println!("-- tab around");
    for _ in 0..buttons.len() {
        tree.focus_next_prev(true);
    }

    println!("-- maximize and restore");
    tree.set_window_state(window, WindowState::Maximized);
    run_loop.run_pending(&mut tree);
    tree.set_window_state(window, WindowState::Normal);
    run_loop.run_pending(&mut tree);

    println!("-- bad size request");
    tree.set_minimum_size(buttons[0], Size::new(-10.0, 24.0));

    // -- export ------------------------------------------------------------
    drop(tree.take_trace_sink());
    let bytes = recorder.borrow().as_bytes().to_vec();
    let path = "strata_trace.json";
    let file = File::create(path).expect("failed to create strata_trace.json");
    let mut writer = BufWriter::new(file);
    strata_debug::json::export(&bytes, &mut writer).expect("failed to write JSON trace");

    println!("Wrote {path} ({} bytes recorded)", bytes.len());
}
