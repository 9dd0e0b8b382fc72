// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! The widget tree uses multi-channel dirty tracking (via [`understory_dirty`])
//! to invalidate derived per-widget state. Dependency edges point in opposite
//! directions on the two channels:
//!
//! - [`VISIBILITY`] has edges from child to parent. Showing or hiding a
//!   widget marks it with [`EagerPolicy`](understory_dirty::EagerPolicy), so
//!   the whole subtree is drained and its effective visibility recomputed
//!   parent-before-child.
//!
//! - [`OPAQUE`] has edges from parent to child. Any change to a widget's
//!   geometry, visibility, mask, opacity, or children marks it eagerly, which
//!   marks every ancestor. The cached opaque-children regions of the drained
//!   widgets are dropped and recomputed on the next query.

use understory_dirty::Channel;

/// Explicit-hidden flag changed or the widget moved under a new parent.
pub const VISIBILITY: Channel = Channel::new(0);

/// Something affecting the opaque area of a widget or its descendants
/// changed.
pub const OPAQUE: Channel = Channel::new(1);
