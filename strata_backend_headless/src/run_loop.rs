// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stand-in for the platform run loop.

use strata_core::widget::WidgetTree;

use crate::bridge::HeadlessBridge;

/// Default bound on back-to-back rounds in [`HeadlessRunLoop::run_pending`].
const DEFAULT_MAX_ROUNDS: usize = 16;

/// Drives paint passes for windows that asked for one.
///
/// A real run loop would run a pass when the platform next gives it time.
/// Headless, "later" is whenever [`run_pending`](Self::run_pending) is
/// called.
#[derive(Clone, Copy, Debug)]
pub struct HeadlessRunLoop {
    max_rounds: usize,
}

impl Default for HeadlessRunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRunLoop {
    /// Creates a run loop with the default round limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    /// Limits how many rounds [`run_pending`](Self::run_pending) runs when
    /// passes keep requesting more passes. Zero is promoted to one.
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Runs a paint pass for every window that requested one, repeating
    /// while passes request further passes, up to the round limit.
    ///
    /// Requests from windows that were destroyed or became children in the
    /// meantime are dropped. Returns the number of passes that ran.
    pub fn run_pending(&self, tree: &mut WidgetTree<HeadlessBridge>) -> usize {
        let mut passes = 0;
        for _ in 0..self.max_rounds {
            let pending = tree.bridge_mut().take_pending_updates();
            if pending.is_empty() {
                break;
            }
            for window in pending {
                if tree.is_alive(window) && tree.is_top_level(window) && tree.paint_pass(window) {
                    passes += 1;
                }
            }
        }
        passes
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use kurbo::Rect;
    use strata_core::backend::PlatformBridge;
    use strata_core::notify::{PaintCtx, Widget};
    use strata_core::paint::Color;
    use strata_core::region::Region;

    use super::*;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
        Rect::new(x, y, x + w, y + h)
    }

    struct Counter {
        paints: Rc<Cell<u32>>,
        again: bool,
    }

    impl Widget for Counter {
        fn paint(&mut self, ctx: &mut PaintCtx<'_>) {
            self.paints.set(self.paints.get() + 1);
            ctx.painter().fill(Color::rgb(0x20, 0x40, 0x80));
            if self.again {
                ctx.request_update();
            }
        }
    }

    fn window_with_counter(again: bool) -> (WidgetTree<HeadlessBridge>, Rc<Cell<u32>>) {
        let paints = Rc::new(Cell::new(0));
        let mut tree = WidgetTree::with_bridge(HeadlessBridge::new());
        let win = tree.create_widget(None, rect(0.0, 0.0, 64.0, 48.0));
        let child = tree.create_widget(Some(win), rect(8.0, 8.0, 16.0, 16.0));
        tree.set_widget(
            child,
            Box::new(Counter {
                paints: paints.clone(),
                again,
            }),
        );
        tree.show(win).unwrap();
        (tree, paints)
    }

    #[test]
    fn first_show_paints_and_flushes_once() {
        let (mut tree, paints) = window_with_counter(false);
        let run_loop = HeadlessRunLoop::new();
        assert_eq!(run_loop.run_pending(&mut tree), 1);
        assert_eq!(paints.get(), 1);

        let flushes = tree.bridge().flushes();
        assert_eq!(flushes.len(), 1);
        assert_eq!((flushes[0].width, flushes[0].height), (64, 48));
        assert_eq!(flushes[0].region, Region::from_rect(rect(0.0, 0.0, 64.0, 48.0)));

        assert_eq!(run_loop.run_pending(&mut tree), 0, "nothing left to do");
    }

    #[test]
    fn invalidation_is_painted_on_the_next_run() {
        let (mut tree, paints) = window_with_counter(false);
        let run_loop = HeadlessRunLoop::new();
        run_loop.run_pending(&mut tree);
        tree.bridge_mut().clear_logs();

        let win = tree.top_levels()[0];
        tree.update_rect(win, rect(0.0, 0.0, 10.0, 10.0));
        assert!(tree.bridge().has_pending_updates());
        assert_eq!(run_loop.run_pending(&mut tree), 1);
        assert_eq!(paints.get(), 2, "child overlaps the damage");
        assert_eq!(
            tree.bridge().flushes()[0].region,
            Region::from_rect(rect(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn self_invalidating_widget_is_bounded() {
        let (mut tree, paints) = window_with_counter(true);
        let run_loop = HeadlessRunLoop::new().with_max_rounds(3);
        assert_eq!(run_loop.run_pending(&mut tree), 3);
        assert_eq!(paints.get(), 3);
        assert!(tree.bridge().has_pending_updates());
    }

    #[test]
    fn destroyed_window_request_is_dropped() {
        let (mut tree, paints) = window_with_counter(false);
        let win = tree.top_levels()[0];
        tree.bridge_mut().schedule_update(win);
        tree.destroy(win);
        assert_eq!(HeadlessRunLoop::new().run_pending(&mut tree), 0);
        assert_eq!(paints.get(), 0);
    }
}
