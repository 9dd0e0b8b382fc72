// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as tagged little-endian records. [`decode`] reads them back as
//! an iterator of [`RecordedEvent`].
//!
//! Region payloads are stored as their bounding box and rectangle count, the
//! same summary the events themselves carry.

use kurbo::{Rect, Size, Vec2};
use strata_core::error::ProgrammingError;
use strata_core::notify::FocusReason;
use strata_core::trace::{
    BlitEvent, Diagnostic, FocusChangeEvent, InvalidateEvent, PaintEvent, PassBeginEvent,
    PassEndEvent, PassKind, TraceSink, WindowStateEvent,
};
use strata_core::widget::WidgetId;
use strata_core::window::WindowState;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PASS_BEGIN: u8 = 1;
const TAG_PASS_END: u8 = 2;
const TAG_INVALIDATE: u8 = 3;
const TAG_BLIT: u8 = 4;
const TAG_FOCUS_CHANGE: u8 = 5;
const TAG_WINDOW_STATE: u8 = 6;
const TAG_PAINT: u8 = 7;
const TAG_DIAGNOSTIC: u8 = 8;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_rect(&mut self, r: Rect) {
        self.write_f64(r.x0);
        self.write_f64(r.y0);
        self.write_f64(r.x1);
        self.write_f64(r.y1);
    }

    fn write_size(&mut self, s: Size) {
        self.write_f64(s.width);
        self.write_f64(s.height);
    }

    fn write_widget(&mut self, id: WidgetId) {
        self.write_u32(id.index());
        self.write_u32(id.generation());
    }

    fn write_option_widget(&mut self, id: Option<WidgetId>) {
        match id {
            Some(id) => {
                self.write_u8(1);
                self.write_widget(id);
            }
            None => {
                self.write_u8(0);
                self.write_u32(0);
                self.write_u32(0);
            }
        }
    }

    fn write_pass_kind(&mut self, k: PassKind) {
        self.write_u8(match k {
            PassKind::Scheduled => 0,
            PassKind::Repaint => 1,
            PassKind::Grab => 2,
        });
    }

    fn write_reason(&mut self, r: FocusReason) {
        self.write_u8(match r {
            FocusReason::Mouse => 0,
            FocusReason::Tab => 1,
            FocusReason::Backtab => 2,
            FocusReason::ActiveWindow => 3,
            FocusReason::Popup => 4,
            FocusReason::Shortcut => 5,
            FocusReason::Other => 6,
        });
    }

    fn write_state(&mut self, s: WindowState) {
        self.write_u8(match s {
            WindowState::Normal => 0,
            WindowState::Minimized => 1,
            WindowState::Maximized => 2,
            WindowState::FullScreen => 3,
        });
    }

    fn write_error(&mut self, e: ProgrammingError) {
        match e {
            ProgrammingError::ReentrantRepaint => self.write_u8(0),
            ProgrammingError::NegativeMinimumSize { requested } => {
                self.write_u8(1);
                self.write_size(requested);
            }
            ProgrammingError::MinimumExceedsMaximum { minimum, maximum } => {
                self.write_u8(2);
                self.write_size(minimum);
                self.write_size(maximum);
            }
            ProgrammingError::GeometryClamped { requested, applied } => {
                self.write_u8(3);
                self.write_size(requested);
                self.write_size(applied);
            }
            ProgrammingError::DisabledInFocusChain => self.write_u8(4),
            ProgrammingError::TabOrderAcrossWindows => self.write_u8(5),
            ProgrammingError::NotATopLevel => self.write_u8(6),
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_pass_begin(&mut self, e: &PassBeginEvent) {
        self.write_u8(TAG_PASS_BEGIN);
        self.write_u64(e.pass_index);
        self.write_widget(e.window);
        self.write_pass_kind(e.kind);
        self.write_rect(e.bounds);
        self.write_u32(e.rect_count);
    }

    fn on_pass_end(&mut self, e: &PassEndEvent) {
        self.write_u8(TAG_PASS_END);
        self.write_u64(e.pass_index);
        self.write_widget(e.window);
        self.write_u32(e.paint_count);
        self.write_u8(u8::from(e.rescheduled));
    }

    fn on_invalidate(&mut self, e: &InvalidateEvent) {
        self.write_u8(TAG_INVALIDATE);
        self.write_widget(e.window);
        self.write_rect(e.bounds);
    }

    fn on_blit(&mut self, e: &BlitEvent) {
        self.write_u8(TAG_BLIT);
        self.write_widget(e.window);
        self.write_rect(e.source);
        self.write_f64(e.delta.x);
        self.write_f64(e.delta.y);
    }

    fn on_focus_change(&mut self, e: &FocusChangeEvent) {
        self.write_u8(TAG_FOCUS_CHANGE);
        self.write_option_widget(e.old);
        self.write_option_widget(e.new);
        self.write_reason(e.reason);
    }

    fn on_window_state(&mut self, e: &WindowStateEvent) {
        self.write_u8(TAG_WINDOW_STATE);
        self.write_widget(e.window);
        self.write_state(e.old);
        self.write_state(e.new);
    }

    fn on_paint(&mut self, e: &PaintEvent) {
        self.write_u8(TAG_PAINT);
        self.write_u64(e.pass_index);
        self.write_widget(e.widget);
        self.write_rect(e.bounds);
        self.write_u32(e.rect_count);
    }

    fn on_diagnostic(&mut self, d: &Diagnostic) {
        self.write_u8(TAG_DIAGNOSTIC);
        self.write_option_widget(d.widget);
        self.write_error(d.error);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PassBeginEvent`].
    PassBegin(PassBeginEvent),
    /// A [`PassEndEvent`].
    PassEnd(PassEndEvent),
    /// An [`InvalidateEvent`].
    Invalidate(InvalidateEvent),
    /// A [`BlitEvent`].
    Blit(BlitEvent),
    /// A [`FocusChangeEvent`].
    FocusChange(FocusChangeEvent),
    /// A [`WindowStateEvent`].
    WindowState(WindowStateEvent),
    /// A [`PaintEvent`].
    Paint(PaintEvent),
    /// A [`Diagnostic`].
    Diagnostic(Diagnostic),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_rect(&mut self) -> Option<Rect> {
        Some(Rect::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        ))
    }

    fn read_size(&mut self) -> Option<Size> {
        Some(Size::new(self.read_f64()?, self.read_f64()?))
    }

    fn read_widget(&mut self) -> Option<WidgetId> {
        Some(WidgetId::from_raw(self.read_u32()?, self.read_u32()?))
    }

    fn read_option_widget(&mut self) -> Option<Option<WidgetId>> {
        let present = self.read_u8()?;
        let id = self.read_widget()?;
        Some((present != 0).then_some(id))
    }

    fn read_pass_kind(&mut self) -> Option<PassKind> {
        Some(match self.read_u8()? {
            0 => PassKind::Scheduled,
            1 => PassKind::Repaint,
            _ => PassKind::Grab,
        })
    }

    fn read_reason(&mut self) -> Option<FocusReason> {
        Some(match self.read_u8()? {
            0 => FocusReason::Mouse,
            1 => FocusReason::Tab,
            2 => FocusReason::Backtab,
            3 => FocusReason::ActiveWindow,
            4 => FocusReason::Popup,
            5 => FocusReason::Shortcut,
            _ => FocusReason::Other,
        })
    }

    fn read_state(&mut self) -> Option<WindowState> {
        Some(match self.read_u8()? {
            0 => WindowState::Normal,
            1 => WindowState::Minimized,
            2 => WindowState::Maximized,
            _ => WindowState::FullScreen,
        })
    }

    fn read_error(&mut self) -> Option<ProgrammingError> {
        Some(match self.read_u8()? {
            0 => ProgrammingError::ReentrantRepaint,
            1 => ProgrammingError::NegativeMinimumSize {
                requested: self.read_size()?,
            },
            2 => ProgrammingError::MinimumExceedsMaximum {
                minimum: self.read_size()?,
                maximum: self.read_size()?,
            },
            3 => ProgrammingError::GeometryClamped {
                requested: self.read_size()?,
                applied: self.read_size()?,
            },
            4 => ProgrammingError::DisabledInFocusChain,
            5 => ProgrammingError::TabOrderAcrossWindows,
            6 => ProgrammingError::NotATopLevel,
            _ => return None,
        })
    }

    fn decode_pass_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassBegin(PassBeginEvent {
            pass_index: self.read_u64()?,
            window: self.read_widget()?,
            kind: self.read_pass_kind()?,
            bounds: self.read_rect()?,
            rect_count: self.read_u32()?,
        }))
    }

    fn decode_pass_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PassEnd(PassEndEvent {
            pass_index: self.read_u64()?,
            window: self.read_widget()?,
            paint_count: self.read_u32()?,
            rescheduled: self.read_u8()? != 0,
        }))
    }

    fn decode_invalidate(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Invalidate(InvalidateEvent {
            window: self.read_widget()?,
            bounds: self.read_rect()?,
        }))
    }

    fn decode_blit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Blit(BlitEvent {
            window: self.read_widget()?,
            source: self.read_rect()?,
            delta: Vec2::new(self.read_f64()?, self.read_f64()?),
        }))
    }

    fn decode_focus_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FocusChange(FocusChangeEvent {
            old: self.read_option_widget()?,
            new: self.read_option_widget()?,
            reason: self.read_reason()?,
        }))
    }

    fn decode_window_state(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::WindowState(WindowStateEvent {
            window: self.read_widget()?,
            old: self.read_state()?,
            new: self.read_state()?,
        }))
    }

    fn decode_paint(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Paint(PaintEvent {
            pass_index: self.read_u64()?,
            widget: self.read_widget()?,
            bounds: self.read_rect()?,
            rect_count: self.read_u32()?,
        }))
    }

    fn decode_diagnostic(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Diagnostic(Diagnostic {
            widget: self.read_option_widget()?,
            error: self.read_error()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PASS_BEGIN => self.decode_pass_begin(),
            TAG_PASS_END => self.decode_pass_end(),
            TAG_INVALIDATE => self.decode_invalidate(),
            TAG_BLIT => self.decode_blit(),
            TAG_FOCUS_CHANGE => self.decode_focus_change(),
            TAG_WINDOW_STATE => self.decode_window_state(),
            TAG_PAINT => self.decode_paint(),
            TAG_DIAGNOSTIC => self.decode_diagnostic(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const WIN: WidgetId = WidgetId::from_raw(0, 0);
    const FIELD: WidgetId = WidgetId::from_raw(3, 2);

    fn sample_pass(rec: &mut RecorderSink) {
        rec.on_invalidate(&InvalidateEvent {
            window: WIN,
            bounds: Rect::new(10.0, 10.0, 50.0, 30.0),
        });
        rec.on_pass_begin(&PassBeginEvent {
            pass_index: 4,
            window: WIN,
            kind: PassKind::Scheduled,
            bounds: Rect::new(10.0, 10.0, 50.0, 30.0),
            rect_count: 2,
        });
        rec.on_paint(&PaintEvent {
            pass_index: 4,
            widget: FIELD,
            bounds: Rect::new(0.0, 0.0, 40.0, 20.0),
            rect_count: 1,
        });
        rec.on_pass_end(&PassEndEvent {
            pass_index: 4,
            window: WIN,
            paint_count: 1,
            rescheduled: true,
        });
    }

    #[test]
    fn pass_sequence_decodes_in_order() {
        let mut rec = RecorderSink::new();
        sample_pass(&mut rec);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RecordedEvent::Invalidate(_)));
        match &events[1] {
            RecordedEvent::PassBegin(e) => {
                assert_eq!(e.pass_index, 4);
                assert_eq!(e.window, WIN);
                assert_eq!(e.kind, PassKind::Scheduled);
                assert_eq!(e.bounds, Rect::new(10.0, 10.0, 50.0, 30.0));
                assert_eq!(e.rect_count, 2);
            }
            other => panic!("expected PassBegin, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::Paint(e) => assert_eq!(e.widget, FIELD),
            other => panic!("expected Paint, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::PassEnd(e) => {
                assert_eq!(e.paint_count, 1);
                assert!(e.rescheduled);
            }
            other => panic!("expected PassEnd, got {other:?}"),
        }
    }

    #[test]
    fn focus_change_keeps_missing_sides() {
        let mut rec = RecorderSink::new();
        rec.on_focus_change(&FocusChangeEvent {
            old: None,
            new: Some(FIELD),
            reason: FocusReason::Backtab,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::FocusChange(e)] => {
                assert_eq!(e.old, None);
                assert_eq!(e.new, Some(FIELD));
                assert_eq!(e.reason, FocusReason::Backtab);
            }
            other => panic!("expected one FocusChange, got {other:?}"),
        }
    }

    #[test]
    fn diagnostics_keep_their_payload() {
        let mut rec = RecorderSink::new();
        let error = ProgrammingError::GeometryClamped {
            requested: Size::new(-4.0, 20.0),
            applied: Size::new(0.0, 20.0),
        };
        rec.on_diagnostic(&Diagnostic {
            widget: Some(FIELD),
            error,
        });
        rec.on_diagnostic(&Diagnostic {
            widget: None,
            error: ProgrammingError::ReentrantRepaint,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::Diagnostic(a), RecordedEvent::Diagnostic(b)] => {
                assert_eq!(a.widget, Some(FIELD));
                assert_eq!(a.error, error);
                assert_eq!(b.widget, None);
                assert_eq!(b.error, ProgrammingError::ReentrantRepaint);
            }
            other => panic!("expected two diagnostics, got {other:?}"),
        }
    }

    #[test]
    fn window_state_and_blit() {
        let mut rec = RecorderSink::new();
        rec.on_window_state(&WindowStateEvent {
            window: WIN,
            old: WindowState::Maximized,
            new: WindowState::Normal,
        });
        rec.on_blit(&BlitEvent {
            window: WIN,
            source: Rect::new(0.0, 0.0, 20.0, 20.0),
            delta: Vec2::new(5.0, -3.0),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::WindowState(s), RecordedEvent::Blit(b)] => {
                assert_eq!(s.old, WindowState::Maximized);
                assert_eq!(s.new, WindowState::Normal);
                assert_eq!(b.delta, Vec2::new(5.0, -3.0));
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        sample_pass(&mut rec);
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 3);
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        let mut rec = RecorderSink::new();
        sample_pass(&mut rec);
        let mut bytes = vec![0xFF];
        bytes.extend_from_slice(rec.as_bytes());
        assert_eq!(decode(&bytes).count(), 0);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
