use crate::error::EmacsError;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;
use std::str::FromStr;

/// Modifiers that take part in chord matching.
const CHORD_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT)
    .union(KeyModifiers::SUPER);

/// A single key with its modifiers, normalized so that a parsed binding and
/// a live key event compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut modifiers = modifiers & CHORD_MODIFIERS;
        let mut code = code;
        if let KeyCode::Char(c) = code {
            if modifiers.contains(KeyModifiers::SHIFT) && !c.is_whitespace() {
                // The character already carries the shift.
                modifiers.remove(KeyModifiers::SHIFT);
                if c.is_ascii_lowercase() {
                    code = KeyCode::Char(c.to_ascii_uppercase());
                }
            }
        }
        Self { code, modifiers }
    }

    pub fn plain(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    pub fn alt(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::ALT)
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }

    /// A key event that produces this chord, as a terminal would report it.
    pub fn to_event(&self) -> KeyEvent {
        let mut modifiers = self.modifiers;
        if let KeyCode::Char(c) = self.code {
            if c.is_uppercase() {
                modifiers.insert(KeyModifiers::SHIFT);
            }
        }
        KeyEvent::new(self.code, modifiers)
    }

    fn parse_modifier(name: &str) -> Option<KeyModifiers> {
        match name.to_ascii_lowercase().as_str() {
            "c" | "ctrl" | "control" => Some(KeyModifiers::CONTROL),
            "m" | "alt" | "meta" => Some(KeyModifiers::ALT),
            "s" | "shift" => Some(KeyModifiers::SHIFT),
            "super" | "cmd" => Some(KeyModifiers::SUPER),
            _ => None,
        }
    }

    fn parse_key(name: &str) -> Option<KeyCode> {
        let name = name
            .strip_prefix('<')
            .and_then(|n| n.strip_suffix('>'))
            .unwrap_or(name);

        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(KeyCode::Char(c));
        }

        let lower = name.to_ascii_lowercase();
        let code = match lower.as_str() {
            "space" | "spc" => KeyCode::Char(' '),
            "return" | "ret" | "enter" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "tab" => KeyCode::Tab,
            "backspace" | "del" => KeyCode::Backspace,
            "delete" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "prior" => KeyCode::PageUp,
            "pagedown" | "next" => KeyCode::PageDown,
            "insert" => KeyCode::Insert,
            "null" | "nul" => KeyCode::Null,
            _ => {
                let number = lower.strip_prefix('f')?.parse::<u8>().ok()?;
                if (1..=24).contains(&number) {
                    KeyCode::F(number)
                } else {
                    return None;
                }
            }
        };
        Some(code)
    }
}

impl FromStr for KeyChord {
    type Err = EmacsError;

    /// Parses `c-x`, `C-x`, `M-/`, `s-c-space`, `<left>`, `RET` and friends.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Err(EmacsError::InvalidKey(s.to_string()));
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut rest = token;
        while let Some((head, tail)) = rest.split_once('-') {
            if tail.is_empty() {
                break;
            }
            match Self::parse_modifier(head) {
                Some(modifier) => {
                    modifiers |= modifier;
                    rest = tail;
                }
                None => break,
            }
        }

        let code = Self::parse_key(rest).ok_or_else(|| EmacsError::InvalidKey(s.to_string()))?;
        Ok(Self::new(code, modifiers))
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("C-")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("M-")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("S-")?;
        }
        if self.modifiers.contains(KeyModifiers::SUPER) {
            f.write_str("s-")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("SPC"),
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Enter => f.write_str("RET"),
            KeyCode::Esc => f.write_str("ESC"),
            KeyCode::Tab => f.write_str("TAB"),
            KeyCode::Backspace => f.write_str("DEL"),
            KeyCode::F(n) => write!(f, "<f{n}>"),
            other => write!(f, "<{}>", format!("{other:?}").to_ascii_lowercase()),
        }
    }
}

/// One or more chords typed in order, e.g. `C-x C-s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySequence(pub Vec<KeyChord>);

impl KeySequence {
    pub fn chords(&self) -> &[KeyChord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &[KeyChord]) -> bool {
        self.0.starts_with(prefix)
    }
}

impl From<KeyChord> for KeySequence {
    fn from(chord: KeyChord) -> Self {
        Self(vec![chord])
    }
}

impl FromStr for KeySequence {
    type Err = EmacsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chords = s
            .split_whitespace()
            .map(KeyChord::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if chords.is_empty() {
            return Err(EmacsError::InvalidKey(s.to_string()));
        }
        Ok(Self(chords))
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, chord) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{chord}")?;
        }
        Ok(())
    }
}
