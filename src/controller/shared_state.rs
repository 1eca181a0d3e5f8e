use crate::controller::mode::ModeController;
use crate::host::HostCall;
use crate::surface::EditorSurface;
use crossterm::event::KeyEvent;

/// Everything a keyboard handler or command may touch while one key is
/// processed. Host requests are only queued here.
pub struct Editor<'a> {
    pub mode: &'a mut ModeController,
    pub surface: &'a mut dyn EditorSurface,
    host_calls: Vec<HostCall>,
}

impl<'a> Editor<'a> {
    pub fn new(mode: &'a mut ModeController, surface: &'a mut dyn EditorSurface) -> Self {
        Self {
            mode,
            surface,
            host_calls: Vec::new(),
        }
    }

    pub fn request(&mut self, call: HostCall) {
        self.host_calls.push(call);
    }

    pub fn take_host_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.host_calls)
    }
}

/// Result of handling a key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Handled without running a command.
    Consumed,
    /// A bound command ran.
    Command(String),
    /// Part of a multi-chord sequence; waiting for more.
    Pending,
    /// Not ours; the editor's native handling applies.
    PassThrough,
}

/// Trait that all keyboard handlers must implement
pub trait KeyboardHandler {
    fn handle_keyboard(&mut self, key: &KeyEvent, editor: &mut Editor<'_>) -> KeyOutcome;
}
