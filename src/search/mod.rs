/// Search subsystem - Incremental search as the user types
///
/// `SearchState` holds the per-buffer query and highlight markers;
/// `SearchEngine` runs the find/repeat/end steps against an editor surface.
pub mod engine;
pub mod search_state;

pub use engine::{DEFAULT_FAILURE_DELAY, SearchCx, SearchEngine, SearchTimeout};
pub use search_state::{SearchDirection, SearchState, pick_match};
