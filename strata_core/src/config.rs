// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

use crate::paint::Color;

/// Tunables for a [`WidgetTree`](crate::widget::WidgetTree).
///
/// The defaults are what an application wants; the switches exist to make
/// the optimizations easy to rule out when chasing rendering bugs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Move already-painted pixels when an opaque, unobstructed widget is
    /// translated, instead of repainting its whole footprint.
    pub fast_move: bool,
    /// Remove area covered by opaque later siblings from each widget's clip.
    pub subtract_opaque_siblings: bool,
    /// Background painted behind top-level windows that neither paint
    /// opaquely nor have an auto-fill brush.
    pub window_background: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_move: true,
            subtract_opaque_siblings: true,
            window_background: Color::rgb(0xEF, 0xEF, 0xEF),
        }
    }
}
