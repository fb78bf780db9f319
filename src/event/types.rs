//! Decoded stream-events lines
//!
//! An [`Event`] keeps the exact line it was decoded from so the forwarded
//! body is byte-for-byte what Gerrit sent. Field access is lenient: a
//! missing or non-string field reads as `None` and is left to the
//! classifier to interpret.

use serde_json::Value;

use crate::error::{GatewayError, Result};

pub const PATCHSET_CREATED: &str = "patchset-created";
pub const COMMENT_ADDED: &str = "comment-added";

/// `patchSet.kind` of a patch set that changes nothing reviewable
pub const NO_CHANGE_KIND: &str = "NO_CHANGE";

/// One code-review notification read from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    raw: String,
    value: Value,
}

impl Event {
    /// Decode one line of stream output.
    ///
    /// Anything but a JSON object is rejected; the stream guarantees one
    /// object per line.
    pub fn from_line(line: impl Into<String>) -> Result<Self> {
        let raw = line.into();
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(source) => return Err(GatewayError::Decode { line: raw, source }),
        };
        if !value.is_object() {
            return Err(GatewayError::NotAnObject(raw));
        }
        Ok(Self { raw, value })
    }

    /// The line exactly as received
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn event_type(&self) -> Option<&str> {
        extract_str(&self.value, "/type")
    }

    pub fn project(&self) -> Option<&str> {
        extract_str(&self.value, "/project")
    }

    pub fn change_id(&self) -> Option<&str> {
        extract_str(&self.value, "/changeKey/id")
    }

    pub fn patch_set_kind(&self) -> Option<&str> {
        extract_str(&self.value, "/patchSet/kind")
    }

    pub fn comment(&self) -> Option<&str> {
        extract_str(&self.value, "/comment")
    }
}

fn extract_str<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}
