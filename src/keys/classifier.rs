use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Keys that end an incremental search and break a kill streak, whatever
/// modifiers accompany them.
pub const MOVEMENT_KEYS: [KeyCode; 10] = [
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::Home,
    KeyCode::End,
    KeyCode::PageUp,
    KeyCode::PageDown,
    KeyCode::Esc,
    KeyCode::Enter,
];

/// Semantic category of a raw keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// A printable character, unmodified, shifted or typed with AltGr.
    Plain(char),
    Movement,
    /// Control-only or alt-only combination.
    ModifierChord,
    /// Only a modifier was pressed; there is no key.
    NoOp,
    /// Everything else (tab, backspace, function keys, ctrl+shift, ...).
    Other,
}

pub fn is_movement_key(code: KeyCode) -> bool {
    MOVEMENT_KEYS.contains(&code)
}

pub fn is_noop_key(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::Null | KeyCode::Modifier(_) | KeyCode::Char('\0')
    )
}

/// True for exactly `CONTROL` or exactly `ALT`. Shift combinations do not
/// count, so shifted text still reads as plain input.
pub fn is_chord_mask(modifiers: KeyModifiers) -> bool {
    modifiers == KeyModifiers::CONTROL || modifiers == KeyModifiers::ALT
}

/// Some terminals report AltGr as control plus alt.
fn is_text_mask(modifiers: KeyModifiers) -> bool {
    modifiers.is_empty()
        || modifiers == KeyModifiers::SHIFT
        || modifiers == KeyModifiers::CONTROL | KeyModifiers::ALT
}

pub fn classify(event: &KeyEvent) -> KeyClass {
    if is_noop_key(event.code) {
        return KeyClass::NoOp;
    }
    if is_movement_key(event.code) {
        return KeyClass::Movement;
    }
    if is_chord_mask(event.modifiers) {
        return KeyClass::ModifierChord;
    }
    match event.code {
        KeyCode::Char(c) if !c.is_control() && is_text_mask(event.modifiers) => KeyClass::Plain(c),
        _ => KeyClass::Other,
    }
}
