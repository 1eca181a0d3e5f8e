use crate::error::{EmacsError, Result};
use arboard::Clipboard;
use parking_lot::Mutex;
use std::sync::Arc;

/// Destination for killed text outside the kill ring.
pub trait ClipboardSink: Send {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard. A handle is opened per write so that a missing
/// display only fails the write, not the whole session.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        Clipboard::new()
            .and_then(|mut c| c.set_text(text.to_owned()))
            .map_err(|e| EmacsError::Clipboard(e.to_string()))
    }
}

/// Keeps every write in memory. Clones share the same history.
#[derive(Debug, Default, Clone)]
pub struct RecordingClipboard {
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.writes.lock().last().cloned()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}
