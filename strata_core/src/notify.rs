// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Widget callbacks and the contexts they receive.
//!
//! A widget implementation is a [`Widget`] trait object installed with
//! [`WidgetTree::set_widget`](crate::widget::WidgetTree::set_widget). The
//! tree calls it synchronously for lifecycle [`Notification`]s, paint
//! requests, and routed input.
//!
//! Callbacks cannot reach the tree directly. Requests made through a context
//! (repaint, focus, ...) are queued and applied once the callback returns,
//! so a widget can never mutate the tree underneath an in-progress
//! traversal.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use crate::paint::Painter;
use crate::region::Region;
use crate::widget::WidgetId;
use crate::window::WindowState;

/// Why keyboard focus moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusReason {
    /// A pointer press.
    Mouse,
    /// Forward tab navigation.
    Tab,
    /// Backward tab navigation.
    Backtab,
    /// The containing window was activated or deactivated.
    ActiveWindow,
    /// A popup opened or closed.
    Popup,
    /// A keyboard shortcut.
    Shortcut,
    /// Anything else, including programmatic focus changes.
    Other,
}

/// Lifecycle notification delivered to exactly one widget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Notification {
    /// The widget implementation was installed.
    Create,
    /// The widget is about to be destroyed.
    Destroy,
    /// The widget became effectively visible.
    Show,
    /// The widget stopped being effectively visible.
    Hide,
    /// The widget's position changed (parent coordinates).
    Move {
        /// Position before the change.
        old: Point,
        /// Position after the change.
        new: Point,
    },
    /// The widget's size changed.
    Resize {
        /// Size before the change.
        old: Size,
        /// Size after the change.
        new: Size,
    },
    /// Focus is about to leave this widget.
    FocusAboutToChange(FocusReason),
    /// The widget gained keyboard focus.
    FocusIn(FocusReason),
    /// The widget lost keyboard focus.
    FocusOut(FocusReason),
    /// The window changed state; sent before the new geometry takes effect.
    WindowStateChange {
        /// State before the change.
        old: WindowState,
    },
    /// The window became the active window.
    WindowActivate,
    /// The window stopped being the active window.
    WindowDeactivate,
    /// The widget moved to a new parent.
    ParentChange,
    /// The widget's position in its parent's stacking order changed.
    ZOrderChange,
    /// The widget's enabled state changed.
    EnabledChange,
}

/// Input delivered by the event router.
///
/// Positions are in the target widget's coordinates once delivered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// A pointer button was pressed.
    PointerDown {
        /// Pointer position.
        pos: Point,
        /// Button index.
        button: u8,
    },
    /// A pointer button was released.
    PointerUp {
        /// Pointer position.
        pos: Point,
        /// Button index.
        button: u8,
    },
    /// The pointer moved.
    PointerMove {
        /// Pointer position.
        pos: Point,
    },
    /// A scroll wheel turned.
    Wheel {
        /// Pointer position.
        pos: Point,
        /// Scroll amount.
        delta: Vec2,
    },
    /// A key was pressed.
    KeyDown {
        /// Platform key code.
        key: u32,
    },
    /// A key was released.
    KeyUp {
        /// Platform key code.
        key: u32,
    },
}

impl InputEvent {
    /// Returns the pointer position for pointer events.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match *self {
            Self::PointerDown { pos, .. }
            | Self::PointerUp { pos, .. }
            | Self::PointerMove { pos }
            | Self::Wheel { pos, .. } => Some(pos),
            Self::KeyDown { .. } | Self::KeyUp { .. } => None,
        }
    }

    /// Returns `true` for keyboard events.
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::KeyDown { .. } | Self::KeyUp { .. })
    }

    /// Returns a copy with the pointer position shifted by `offset`.
    #[must_use]
    pub(crate) fn translated(self, offset: Vec2) -> Self {
        match self {
            Self::PointerDown { pos, button } => Self::PointerDown {
                pos: pos + offset,
                button,
            },
            Self::PointerUp { pos, button } => Self::PointerUp {
                pos: pos + offset,
                button,
            },
            Self::PointerMove { pos } => Self::PointerMove { pos: pos + offset },
            Self::Wheel { pos, delta } => Self::Wheel {
                pos: pos + offset,
                delta,
            },
            key => key,
        }
    }
}

/// A widget implementation.
///
/// Every method has a default that ignores its input, so implement only what
/// the widget needs.
pub trait Widget {
    /// Handles a lifecycle notification.
    fn notify(&mut self, ctx: &mut WidgetCtx<'_>, notification: &Notification) {
        _ = (ctx, notification);
    }

    /// Paints the region described by [`PaintCtx::region`].
    fn paint(&mut self, ctx: &mut PaintCtx<'_>) {
        _ = ctx;
    }

    /// Handles routed input. Returns `true` if the event was accepted.
    ///
    /// Unaccepted events are not forwarded to the parent.
    fn input(&mut self, ctx: &mut WidgetCtx<'_>, event: &InputEvent) -> bool {
        _ = (ctx, event);
        false
    }
}

/// A deferred request made from inside a callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Request {
    Update(Option<Rect>),
    Repaint,
    Focus(FocusReason),
    ClearFocus,
    FocusNextPrev(bool),
}

/// Context for [`Widget::notify`] and [`Widget::input`].
#[derive(Debug)]
pub struct WidgetCtx<'a> {
    id: WidgetId,
    geometry: Rect,
    requests: &'a mut Vec<Request>,
}

impl<'a> WidgetCtx<'a> {
    pub(crate) fn new(id: WidgetId, geometry: Rect, requests: &'a mut Vec<Request>) -> Self {
        Self {
            id,
            geometry,
            requests,
        }
    }

    /// The widget receiving the callback.
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The widget's geometry in parent coordinates.
    #[must_use]
    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// The widget's size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.geometry.size()
    }

    /// Schedules a repaint of the whole widget.
    pub fn request_update(&mut self) {
        self.requests.push(Request::Update(None));
    }

    /// Schedules a repaint of `rect` (widget coordinates).
    pub fn request_update_rect(&mut self, rect: Rect) {
        self.requests.push(Request::Update(Some(rect)));
    }

    /// Repaints the widget synchronously once the callback returns.
    pub fn request_repaint(&mut self) {
        self.requests.push(Request::Repaint);
    }

    /// Gives this widget keyboard focus.
    pub fn request_focus(&mut self, reason: FocusReason) {
        self.requests.push(Request::Focus(reason));
    }

    /// Takes keyboard focus away from this widget.
    pub fn clear_focus(&mut self) {
        self.requests.push(Request::ClearFocus);
    }

    /// Moves focus to the next (or previous) widget in the focus chain.
    pub fn focus_next_prev(&mut self, forward: bool) {
        self.requests.push(Request::FocusNextPrev(forward));
    }
}

/// Context for [`Widget::paint`].
#[derive(Debug)]
pub struct PaintCtx<'a> {
    id: WidgetId,
    size: Size,
    region: &'a Region,
    painter: Painter<'a>,
    requests: &'a mut Vec<Request>,
}

impl<'a> PaintCtx<'a> {
    pub(crate) fn new(
        id: WidgetId,
        size: Size,
        region: &'a Region,
        painter: Painter<'a>,
        requests: &'a mut Vec<Request>,
    ) -> Self {
        Self {
            id,
            size,
            region,
            painter,
            requests,
        }
    }

    /// The widget being painted.
    #[must_use]
    pub fn id(&self) -> WidgetId {
        self.id
    }

    /// The widget's size.
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// The region this widget owes, in widget coordinates.
    ///
    /// Never includes area that is occluded, masked, or clipped away.
    #[must_use]
    pub fn region(&self) -> &Region {
        self.region
    }

    /// The painter, clipped to [`region`](Self::region).
    pub fn painter(&mut self) -> &mut Painter<'a> {
        &mut self.painter
    }

    /// Schedules a repaint of the whole widget in a later pass.
    pub fn request_update(&mut self) {
        self.requests.push(Request::Update(None));
    }

    /// Requests a synchronous repaint.
    ///
    /// Repainting from inside a paint pass is a programming error; the
    /// request is reported and folded into the next pass.
    pub fn request_repaint(&mut self) {
        self.requests.push(Request::Repaint);
    }
}
