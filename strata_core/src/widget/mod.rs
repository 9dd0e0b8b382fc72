// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays widget tree.
//!
//! Every widget occupies a slot in parallel arrays inside [`WidgetTree`] and is
//! addressed by a generational [`WidgetId`]. Children are kept in a doubly
//! linked sibling list whose order is the paint order (first child is at the
//! back); each child holds a non-owning parent index.
//!
//! A widget without a parent is a top-level window. Top-levels own a backing
//! store, a window state, and the head of their focus chain.

mod geometry;
mod id;
mod store;
mod traverse;

pub use geometry::MAX_WIDGET_EXTENT;
pub use id::{INVALID, SurfaceHandle, WidgetId};
pub use store::WidgetTree;
pub use traverse::{Ancestors, Children};
