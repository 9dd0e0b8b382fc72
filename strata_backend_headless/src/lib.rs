// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless backend for strata.
//!
//! This crate provides a [`PlatformBridge`] with no windowing system behind
//! it:
//!
//! - An in-memory surface table with geometry, visibility, and stacking
//! - Scriptable screen geometry and frame margins
//! - An update-request queue standing in for the platform run loop,
//!   drained by [`HeadlessRunLoop`]
//! - Failure injection for surface creation and a focus-wrap veto
//! - Logs of flushed and re-composited regions

mod bridge;
mod run_loop;

pub use bridge::{FlushRecord, HeadlessBridge, HeadlessSurface};
pub use run_loop::HeadlessRunLoop;
pub use strata_core::backend::PlatformBridge;
