//! Typed errors for the emacs-mode crate.
//!
//! Most failure conditions of the key layer are not errors at all: a failed
//! search, a yank from an empty kill ring or an exchange without a mark all
//! degrade to a status message or a silent no-op. What remains are
//! configuration problems and host requests that name something unknown.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the host application.
///
/// The type is `Clone` so that a single in-flight keymap load can hand the
/// same failure to every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum EmacsError {
    /// A key or key sequence could not be parsed (`C-x C-s`, `<left>`).
    #[error("invalid key: '{0}'")]
    InvalidKey(String),

    /// A command id that the command table does not know.
    #[error("unknown command: '{0}'")]
    UnknownCommand(String),

    /// A `bind`/`unbind` line in the rc file is malformed.
    #[error("invalid binding on line {line}: {message}")]
    InvalidBinding {
        /// 1-based line number in the rc file.
        line: usize,
        message: String,
    },

    /// The rc file exists but could not be read.
    #[error("could not read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The asynchronous keymap load failed for a reason other than the above.
    #[error("keymap load failed: {0}")]
    LoadFailed(String),

    /// A command was invoked while the mode is disabled.
    #[error("emacs mode is not enabled")]
    Inactive,

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

impl EmacsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EmacsError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

pub type Result<T, E = EmacsError> = std::result::Result<T, E>;
