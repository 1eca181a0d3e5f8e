use super::chord::{KeyChord, KeySequence};
use crate::error::{EmacsError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;

/// Bindings installed when no rc file overrides them.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("c-x c-x", "exchange-point-and-mark"),
    ("c-s", "isearch-forward"),
    ("c-r", "isearch-backward"),
    ("c-x s", "save"),
    ("c-x c-s", "save"),
    ("c-x c-w", "save-as"),
    ("c-x c-b", "list-buffers"),
    ("c-x b", "switch-to-previous-buffer"),
    ("c-space", "set-mark"),
    ("c-k", "kill-line"),
    ("c-w", "kill-region"),
    ("c-y", "yank"),
    ("c-g", "keyboard-quit"),
];

/// Result of matching the chords typed so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Exact(String),
    /// A longer binding starts with these chords.
    Prefix,
    Unbound,
}

/// Key sequence to command id table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<KeySequence, String>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        for (seq, command) in DEFAULT_BINDINGS {
            match seq.parse::<KeySequence>() {
                Ok(seq) => keymap.bind(seq, *command),
                Err(e) => log::warn!("skipping default binding {seq}: {e}"),
            }
        }
        keymap
    }
}

impl Keymap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, seq: KeySequence, command: impl Into<String>) {
        self.bindings.insert(seq, command.into());
    }

    pub fn bind_str(&mut self, seq: &str, command: &str) -> Result<()> {
        let seq = seq.parse::<KeySequence>()?;
        self.bind(seq, command);
        Ok(())
    }

    pub fn unbind(&mut self, seq: &KeySequence) -> Option<String> {
        self.bindings.remove(seq)
    }

    pub fn command_for(&self, seq: &KeySequence) -> Option<&str> {
        self.bindings.get(seq).map(String::as_str)
    }

    pub fn lookup(&self, chords: &[KeyChord]) -> Lookup {
        if chords.is_empty() {
            return Lookup::Unbound;
        }
        let typed = KeySequence(chords.to_vec());
        if let Some(command) = self.bindings.get(&typed) {
            return Lookup::Exact(command.clone());
        }
        if self
            .bindings
            .keys()
            .any(|seq| seq.len() > chords.len() && seq.starts_with(chords))
        {
            Lookup::Prefix
        } else {
            Lookup::Unbound
        }
    }

    /// Every chord that appears in a sequence bound to `command`.
    pub fn chords_for(&self, command: &str) -> Vec<KeyChord> {
        let mut chords = Vec::new();
        for (seq, bound) in &self.bindings {
            if bound != command {
                continue;
            }
            for chord in seq.chords() {
                if !chords.contains(chord) {
                    chords.push(*chord);
                }
            }
        }
        chords
    }

    /// Bindings sorted by their printed key sequence.
    pub fn bindings(&self) -> Vec<(&KeySequence, &str)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .map(|(seq, command)| (seq, command.as_str()))
            .collect();
        all.sort_by_key(|(seq, _)| seq.to_string());
        all
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Asynchronous provider of the keymap installed when the mode is enabled.
pub trait KeymapSource: Send + Sync {
    fn load(&self) -> BoxFuture<'static, Result<Keymap, EmacsError>>;
}

/// A keymap that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticKeymap(pub Keymap);

impl KeymapSource for StaticKeymap {
    fn load(&self) -> BoxFuture<'static, Result<Keymap, EmacsError>> {
        futures::future::ready(Ok(self.0.clone())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(s: &str) -> Vec<KeyChord> {
        s.parse::<KeySequence>().unwrap().0
    }

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::default();
        assert_eq!(keymap.len(), DEFAULT_BINDINGS.len());
        assert_eq!(keymap.lookup(&seq("C-s")), Lookup::Exact("isearch-forward".into()));
        assert_eq!(keymap.lookup(&seq("C-x C-s")), Lookup::Exact("save".into()));
        assert_eq!(keymap.lookup(&seq("C-x s")), Lookup::Exact("save".into()));
        assert_eq!(
            keymap.lookup(&seq("C-x C-x")),
            Lookup::Exact("exchange-point-and-mark".into())
        );
    }

    #[test]
    fn test_prefix_and_unbound() {
        let keymap = Keymap::default();
        assert_eq!(keymap.lookup(&seq("C-x")), Lookup::Prefix);
        assert_eq!(keymap.lookup(&seq("C-x C-q")), Lookup::Unbound);
        assert_eq!(keymap.lookup(&seq("a")), Lookup::Unbound);
        assert_eq!(keymap.lookup(&[]), Lookup::Unbound);
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut keymap = Keymap::default();
        keymap.bind_str("M-w", "kill-region").unwrap();
        assert_eq!(keymap.lookup(&seq("M-w")), Lookup::Exact("kill-region".into()));

        let removed = keymap.unbind(&"c-x c-w".parse().unwrap());
        assert_eq!(removed.as_deref(), Some("save-as"));
        assert_eq!(keymap.lookup(&seq("C-x C-w")), Lookup::Unbound);
        assert!(keymap.bind_str("C-<bogus>", "yank").is_err());
    }

    #[test]
    fn test_chords_for_command() {
        let keymap = Keymap::default();
        assert_eq!(keymap.chords_for("isearch-backward"), vec![KeyChord::ctrl('r')]);
        assert_eq!(keymap.chords_for("keyboard-quit"), vec![KeyChord::ctrl('g')]);
        assert!(keymap.chords_for("noop").is_empty());
    }

    #[test]
    fn test_static_source() {
        let keymap = futures::executor::block_on(StaticKeymap(Keymap::empty()).load()).unwrap();
        assert!(keymap.is_empty());
        let defaults = futures::executor::block_on(StaticKeymap::default().load()).unwrap();
        assert_eq!(defaults, Keymap::default());
    }
}
