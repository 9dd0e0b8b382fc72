// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a
//! [`RecorderSink`](super::recorder::RecorderSink) and writes them as a JSON
//! array with one object per event, in recording order. Every object has an
//! `"event"` name; widgets are written as `[index, generation]` pairs and
//! rectangles as `[x0, y0, x1, y1]`.

use std::io::{self, Write};

use kurbo::Rect;
use serde_json::{Value, json};
use strata_core::widget::WidgetId;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_json).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_json(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::PassBegin(e) => json!({
            "event": "PassBegin",
            "pass": e.pass_index,
            "window": widget(e.window),
            "kind": format!("{:?}", e.kind),
            "bounds": rect(e.bounds),
            "rects": e.rect_count,
        }),
        RecordedEvent::PassEnd(e) => json!({
            "event": "PassEnd",
            "pass": e.pass_index,
            "window": widget(e.window),
            "painted": e.paint_count,
            "rescheduled": e.rescheduled,
        }),
        RecordedEvent::Invalidate(e) => json!({
            "event": "Invalidate",
            "window": widget(e.window),
            "bounds": rect(e.bounds),
        }),
        RecordedEvent::Blit(e) => json!({
            "event": "Blit",
            "window": widget(e.window),
            "source": rect(e.source),
            "delta": [e.delta.x, e.delta.y],
        }),
        RecordedEvent::FocusChange(e) => json!({
            "event": "FocusChange",
            "old": e.old.map(widget),
            "new": e.new.map(widget),
            "reason": format!("{:?}", e.reason),
        }),
        RecordedEvent::WindowState(e) => json!({
            "event": "WindowState",
            "window": widget(e.window),
            "old": format!("{:?}", e.old),
            "new": format!("{:?}", e.new),
        }),
        RecordedEvent::Paint(e) => json!({
            "event": "Paint",
            "pass": e.pass_index,
            "widget": widget(e.widget),
            "bounds": rect(e.bounds),
            "rects": e.rect_count,
        }),
        RecordedEvent::Diagnostic(d) => json!({
            "event": "Diagnostic",
            "widget": d.widget.map(widget),
            "kind": format!("{:?}", d.error),
            "message": d.error.to_string(),
        }),
    }
}

fn widget(id: WidgetId) -> Value {
    json!([id.index(), id.generation()])
}

fn rect(r: Rect) -> Value {
    json!([r.x0, r.y0, r.x1, r.y1])
}
