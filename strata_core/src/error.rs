// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Two classes of failure exist:
//!
//! - [`SurfaceError`] — the platform could not provide a native surface.
//!   Returned from the mutating call; the widget keeps its prior state.
//! - [`ProgrammingError`] — the caller asked for something contradictory.
//!   Never returned. The operation is clamped or ignored and the error is
//!   reported through [`TraceSink::on_diagnostic`](crate::trace::TraceSink::on_diagnostic).

use core::fmt;

use kurbo::Size;

/// Failure to obtain a native surface from the platform bridge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceError {
    /// The platform ran out of surfaces, memory, or handles.
    ResourceExhaustion,
    /// The platform refused the requested surface geometry.
    InvalidGeometry,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceExhaustion => write!(f, "native surface creation failed: resources exhausted"),
            Self::InvalidGeometry => write!(f, "native surface creation failed: invalid geometry"),
        }
    }
}

impl core::error::Error for SurfaceError {}

/// Misuse of the engine that was recovered from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProgrammingError {
    /// A synchronous repaint was requested while a paint pass was running.
    /// The request is folded into the next scheduled pass.
    ReentrantRepaint,
    /// A negative minimum size was requested; it was clamped to zero.
    NegativeMinimumSize {
        /// The size that was asked for.
        requested: Size,
    },
    /// A minimum size larger than the maximum (or the reverse) was
    /// requested; the other bound was moved to match.
    MinimumExceedsMaximum {
        /// Minimum size after clamping.
        minimum: Size,
        /// Maximum size after clamping.
        maximum: Size,
    },
    /// Requested geometry fell outside the allowed size range and was
    /// clamped.
    GeometryClamped {
        /// The size that was asked for.
        requested: Size,
        /// The size that was applied.
        applied: Size,
    },
    /// A disabled or non-focusable widget was used as a focus-chain anchor.
    DisabledInFocusChain,
    /// Tab order was requested between widgets in different windows.
    TabOrderAcrossWindows,
    /// A window-only operation was applied to a child widget.
    NotATopLevel,
}

impl fmt::Display for ProgrammingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReentrantRepaint => {
                write!(f, "recursive repaint detected; deferred to the next pass")
            }
            Self::NegativeMinimumSize { requested } => write!(
                f,
                "negative minimum size {}x{} clamped to zero",
                requested.width, requested.height
            ),
            Self::MinimumExceedsMaximum { minimum, maximum } => write!(
                f,
                "minimum size {}x{} exceeds maximum {}x{}",
                minimum.width, minimum.height, maximum.width, maximum.height
            ),
            Self::GeometryClamped { requested, applied } => write!(
                f,
                "size {}x{} clamped to {}x{}",
                requested.width, requested.height, applied.width, applied.height
            ),
            Self::DisabledInFocusChain => {
                write!(f, "disabled or non-focusable widget used in focus navigation")
            }
            Self::TabOrderAcrossWindows => {
                write!(f, "tab order widgets must belong to the same window")
            }
            Self::NotATopLevel => write!(f, "operation requires a top-level widget"),
        }
    }
}

impl core::error::Error for ProgrammingError {}
