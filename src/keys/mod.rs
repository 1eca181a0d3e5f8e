/// Key subsystem - Keystroke classification, chord notation and bindings
///
/// Raw crossterm key events are sorted into the categories the mode state
/// machine reasons about, human-readable chords (`C-x C-s`) are parsed, and
/// the keymap maps key sequences to command ids.
pub mod chord;
pub mod classifier;
pub mod keymap;

pub use chord::{KeyChord, KeySequence};
pub use classifier::{KeyClass, classify, is_chord_mask, is_movement_key, is_noop_key};
pub use keymap::{DEFAULT_BINDINGS, Keymap, KeymapSource, Lookup, StaticKeymap};
