/// Configuration subsystem - Settings and key bindings
///
/// This module loads `.emacsmoderc` files: mode settings, timing constants
/// and the key sequence to command bindings.

pub mod rc;

// Re-export public interface
pub use rc::{RC_FILE_NAME, RcConfig, RcKeymapSource, RcLoader};
