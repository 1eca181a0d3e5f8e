use crate::controller::command::CommandTable;
use crate::controller::mode::{Intercept, ReservedChords};
use crate::controller::shared_state::{Editor, KeyOutcome, KeyboardHandler};
use crossterm::event::{KeyEvent, KeyEventKind};

/// Wraps a base keyboard handler with the search and kill modes. Keys the
/// modes consume never reach the inner handler.
pub struct EmacsHandler<H> {
    inner: H,
    reserved: ReservedChords,
}

impl EmacsHandler<CommandTable> {
    /// Reserved chords follow the table's own bindings.
    pub fn wrap(table: CommandTable) -> Self {
        let reserved = ReservedChords::from_keymap(table.keymap());
        Self::new(table, reserved)
    }
}

impl<H> EmacsHandler<H> {
    pub fn new(inner: H, reserved: ReservedChords) -> Self {
        Self { inner, reserved }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut H {
        &mut self.inner
    }

    pub fn reserved(&self) -> &ReservedChords {
        &self.reserved
    }
}

impl<H: KeyboardHandler> KeyboardHandler for EmacsHandler<H> {
    fn handle_keyboard(&mut self, key: &KeyEvent, editor: &mut Editor<'_>) -> KeyOutcome {
        if key.kind == KeyEventKind::Release {
            return KeyOutcome::PassThrough;
        }
        match editor.mode.intercept(editor.surface, key, &self.reserved) {
            Intercept::Consumed => KeyOutcome::Consumed,
            Intercept::Forward => self.inner.handle_keyboard(key, editor),
        }
    }
}
