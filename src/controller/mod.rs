/// Controller subsystem - Handles all key input and command execution
///
/// This module contains the mode state machine, the command table it wraps
/// and the host-facing `EmacsMode` handle, keeping key interpretation apart
/// from the editor surface that owns the text.

pub mod command;
pub mod editor;
pub mod handler;
pub mod mode;
pub mod shared_state;
pub mod status;

// Re-export public interface
pub use command::{BUILTIN_COMMANDS, CommandFn, CommandTable};
pub use editor::{EmacsMode, ModeListener};
pub use handler::EmacsHandler;
pub use mode::{Intercept, ModeController, ModeEvent, ModeFlags, ReservedChords};
pub use shared_state::{Editor, KeyOutcome, KeyboardHandler};
pub use status::StatusLine;
