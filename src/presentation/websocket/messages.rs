//! WebSocket Message Decoding
//!
//! Each inbound text frame carries exactly one JSON object. Outbound frames
//! are the serialized event object itself; there is no envelope.

use crate::domain::Event;
use crate::shared::error::FrameError;

/// Decode one inbound text frame into an event.
pub fn decode_frame(text: &str) -> Result<Event, FrameError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    Event::from_value(value)
}
