//! Emacs-style key layer for a single-cursor text editor.
//!
//! Raw key events go through [`EmacsMode::handle_key`]. The layer keeps the
//! incremental search and kill accumulation modes, a kill ring and one mark
//! per buffer, and drives the host editor through the [`EditorSurface`]
//! trait.

pub mod buffers;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod debug;
pub mod error;
pub mod host;
pub mod keys;
pub mod kill_ring;
pub mod marks;
pub mod search;
pub mod surface;
pub mod timers;

pub use buffers::{BufferId, BufferMap};
pub use controller::{EmacsMode, KeyOutcome, ModeController, ModeEvent, ModeFlags};
pub use error::{EmacsError, Result};
pub use host::HostServices;
pub use surface::{EditorSurface, MemorySurface, Position, Range};
