// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained-mode widget tree with damage tracking, occlusion-aware
//! compositing, and keyboard focus management.
//!
//! `strata_core` holds a hierarchy of rectangular widgets in array-based
//! struct-of-arrays storage with generational handles. It is `no_std`
//! compatible (with `alloc`). Widgets never touch the screen directly: they
//! invalidate areas, and the compositor later asks each one to paint exactly
//! the part of the damage it is responsible for, into a per-window backing
//! store.
//!
//! # Architecture
//!
//! ```text
//!   mutation (geometry, visibility, stacking, attributes)
//!       │
//!       ├──► opaque caches invalidated upward (OPAQUE channel)
//!       ▼
//!   update() ──► DirtyRegion (per window) ──► PlatformBridge::schedule_update
//!                                                   │
//!                 ┌─────────────────────────────────┘
//!                 ▼
//!   paint_pass() ──► compute_clip() per widget ──► Widget::paint
//!                                                   │
//!                 ┌─────────────────────────────────┘
//!                 ▼
//!   PixelBuffer ──► PlatformBridge::flush
//! ```
//!
//! **[`widget`]** — Struct-of-arrays widget tree with generational handles:
//! topology, visibility, attributes, and geometry with deferred Move/Resize
//! notifications.
//!
//! **[`region`]** — [`Region`](region::Region), a set of disjoint rectangles
//! used for every damage, clip, and occlusion computation.
//!
//! **[`dirty`]** — Invalidation channels via `understory_dirty`. VISIBILITY
//! propagates to descendants; OPAQUE propagates to ancestors.
//!
//! **[`opaque`]** and **[`clip`]** — Occlusion: which area of a widget its
//! opaque children cover, and which area of a widget is visible on screen.
//!
//! **[`compositor`]** — Backing stores, paint passes, synchronous repaint,
//! blit-accelerated moves, and offscreen grabs.
//!
//! **[`focus`]** — Per-window focus rings, tab navigation, and focus
//! relocation on hide, disable, and destroy.
//!
//! **[`window`]** — Window states (normal, minimized, maximized,
//! full-screen), activation, and modality.
//!
//! **[`event`]** — Input routing honoring grabs, focus, and modal windows.
//!
//! **[`notify`]** — The [`Widget`](notify::Widget) trait implemented by
//! widget code, and the notifications it receives.
//!
//! **[`backend`]** — The [`PlatformBridge`](backend::PlatformBridge) trait
//! that platform backends implement to supply native surfaces.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! paint-pass instrumentation and diagnostics, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-widget
//!   paint events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod clip;
pub mod compositor;
pub mod config;
pub mod damage;
pub mod dirty;
pub mod error;
pub mod event;
pub mod focus;
pub mod notify;
pub mod opaque;
pub mod paint;
pub mod region;
pub mod trace;
pub mod widget;
pub mod window;

#[cfg(test)]
mod testing;
