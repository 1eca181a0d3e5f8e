use crate::controller::mode::KEYBOARD_QUIT;
use crate::controller::shared_state::{Editor, KeyOutcome, KeyboardHandler};
use crate::error::{EmacsError, Result};
use crate::host::HostCall;
use crate::keys::{KeyChord, KeySequence, Keymap, Lookup, is_noop_key};
use crate::search::SearchDirection;
use crossterm::event::KeyEvent;
use std::collections::HashMap;

pub type CommandFn = fn(&mut Editor<'_>);

/// Command ids every table starts with.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "isearch-forward",
    "isearch-backward",
    "kill-line",
    "kill-region",
    "yank",
    "set-mark",
    "exchange-point-and-mark",
    "save",
    "save-as",
    "list-buffers",
    "switch-to-previous-buffer",
    "keyboard-quit",
    "noop",
];

/// Named commands plus the keymap that triggers them. This is the base
/// keyboard handler: bound sequences run commands, anything else passes
/// through to the editor.
pub struct CommandTable {
    commands: HashMap<String, CommandFn>,
    keymap: Keymap,
    pending: Vec<KeyChord>,
}

impl CommandTable {
    pub fn new(keymap: Keymap) -> Self {
        let mut table = Self {
            commands: HashMap::new(),
            keymap,
            pending: Vec::new(),
        };
        table.register_builtins();
        table
    }

    fn register_builtins(&mut self) {
        self.register("isearch-forward", |ed| {
            ed.mode.isearch(ed.surface, SearchDirection::Forward)
        });
        self.register("isearch-backward", |ed| {
            ed.mode.isearch(ed.surface, SearchDirection::Backward)
        });
        self.register("kill-line", |ed| ed.mode.kill_line(ed.surface));
        self.register("kill-region", |ed| ed.mode.kill_region(ed.surface));
        self.register("yank", |ed| ed.mode.yank(ed.surface));
        self.register("set-mark", |ed| ed.mode.set_mark(ed.surface));
        self.register("exchange-point-and-mark", |ed| {
            ed.mode.exchange_point_and_mark(ed.surface)
        });
        self.register("save", |ed| {
            let buffer = ed.mode.current_buffer().clone();
            ed.request(HostCall::Save(buffer));
        });
        self.register("save-as", |ed| {
            let buffer = ed.mode.current_buffer().clone();
            ed.request(HostCall::SaveAs(buffer));
        });
        self.register("list-buffers", |ed| ed.request(HostCall::ListBuffers));
        self.register("switch-to-previous-buffer", switch_to_previous_buffer);
        self.register(KEYBOARD_QUIT, |ed| {
            ed.surface.clear_selection();
            ed.mode.flash("Quit");
        });
        self.register("noop", |_| {});
    }

    /// Add or replace a command.
    pub fn register(&mut self, name: &str, command: CommandFn) {
        self.commands.insert(name.to_string(), command);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Chords typed so far of an unfinished sequence.
    pub fn pending(&self) -> &[KeyChord] {
        &self.pending
    }

    pub fn invoke(&mut self, editor: &mut Editor<'_>, name: &str) -> Result<()> {
        let command = self
            .commands
            .get(name)
            .copied()
            .ok_or_else(|| EmacsError::UnknownCommand(name.to_string()))?;
        log::debug!("running {name}");
        if name == KEYBOARD_QUIT {
            self.pending.clear();
        }
        command(editor);
        Ok(())
    }

    fn run_bound(&mut self, editor: &mut Editor<'_>, name: String) -> KeyOutcome {
        match self.invoke(editor, &name) {
            Ok(()) => KeyOutcome::Command(name),
            Err(e) => {
                log::warn!("{e}");
                editor.mode.flash(e.to_string());
                KeyOutcome::Consumed
            }
        }
    }
}

fn switch_to_previous_buffer(ed: &mut Editor<'_>) {
    match ed.mode.previous_buffer().cloned() {
        Some(previous) => ed.request(HostCall::ShowBuffer(previous)),
        None => log::debug!("no previous buffer to switch to"),
    }
}

impl KeyboardHandler for CommandTable {
    fn handle_keyboard(&mut self, key: &KeyEvent, editor: &mut Editor<'_>) -> KeyOutcome {
        if is_noop_key(key.code) {
            return if self.pending.is_empty() {
                KeyOutcome::PassThrough
            } else {
                KeyOutcome::Pending
            };
        }

        let chord = KeyChord::from_event(key);
        self.pending.push(chord);
        match self.keymap.lookup(&self.pending) {
            Lookup::Exact(name) => {
                self.pending.clear();
                self.run_bound(editor, name)
            }
            Lookup::Prefix => KeyOutcome::Pending,
            Lookup::Unbound => {
                let typed = KeySequence(std::mem::take(&mut self.pending));
                if typed.len() == 1 {
                    return KeyOutcome::PassThrough;
                }
                // Quit works in the middle of a sequence too.
                if let Lookup::Exact(name) = self.keymap.lookup(&[chord]) {
                    if name == KEYBOARD_QUIT {
                        return self.run_bound(editor, name);
                    }
                }
                editor.mode.flash(format!("{typed} is undefined"));
                KeyOutcome::Consumed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::BufferId;
    use crate::controller::mode::ModeController;
    use crate::host::RecordingHost;
    use crate::surface::{EditorSurface, MemorySurface, Position};
    use crate::timers::ManualClock;
    use std::sync::Arc;

    struct Fixture {
        table: CommandTable,
        mode: ModeController,
        surface: MemorySurface,
        host: RecordingHost,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            Self {
                table: CommandTable::new(Keymap::default()),
                mode: ModeController::new(Arc::new(ManualClock::new())),
                surface: MemorySurface::from_string(text),
                host: RecordingHost::new(),
            }
        }

        fn key(&mut self, chord: &str) -> KeyOutcome {
            let event = chord.parse::<KeyChord>().unwrap().to_event();
            let mut editor = Editor::new(&mut self.mode, &mut self.surface);
            let outcome = self.table.handle_keyboard(&event, &mut editor);
            let calls = editor.take_host_calls();
            self.deliver(calls);
            outcome
        }

        fn invoke(&mut self, name: &str) -> Result<()> {
            let mut editor = Editor::new(&mut self.mode, &mut self.surface);
            let result = self.table.invoke(&mut editor, name);
            let calls = editor.take_host_calls();
            self.deliver(calls);
            result
        }

        fn deliver(&mut self, calls: Vec<HostCall>) {
            for call in calls {
                call.send_to(&mut self.host);
            }
        }
    }

    #[test]
    fn test_builtins_registered() {
        let table = CommandTable::new(Keymap::empty());
        for name in BUILTIN_COMMANDS {
            assert!(table.contains(name), "missing {name}");
        }
        assert_eq!(table.command_names().len(), BUILTIN_COMMANDS.len());
    }

    #[test]
    fn test_unknown_command() {
        let mut fx = Fixture::new("");
        let err = fx.invoke("transpose-chars").unwrap_err();
        assert!(matches!(err, EmacsError::UnknownCommand(name) if name == "transpose-chars"));
    }

    #[test]
    fn test_single_chord_binding() {
        let mut fx = Fixture::new("hello");
        assert_eq!(fx.key("C-k"), KeyOutcome::Command("kill-line".into()));
        assert_eq!(fx.surface.text(), "");
        assert_eq!(fx.key("C-y"), KeyOutcome::Command("yank".into()));
        assert_eq!(fx.surface.text(), "hello");
    }

    #[test]
    fn test_unbound_keys_pass_through() {
        let mut fx = Fixture::new("hello");
        assert_eq!(fx.key("a"), KeyOutcome::PassThrough);
        assert_eq!(fx.key("C-a"), KeyOutcome::PassThrough);
        assert!(fx.table.pending().is_empty());
    }

    #[test]
    fn test_multi_chord_sequence() {
        let mut fx = Fixture::new("hello");
        assert_eq!(fx.key("C-x"), KeyOutcome::Pending);
        assert_eq!(fx.table.pending(), &[KeyChord::ctrl('x')]);
        assert_eq!(fx.key("C-s"), KeyOutcome::Command("save".into()));
        assert_eq!(fx.key("C-x"), KeyOutcome::Pending);
        assert_eq!(fx.key("C-w"), KeyOutcome::Command("save-as".into()));
        assert_eq!(
            fx.host.calls(),
            &[
                HostCall::Save(BufferId::new("*scratch*")),
                HostCall::SaveAs(BufferId::new("*scratch*")),
            ]
        );
    }

    #[test]
    fn test_undefined_sequence() {
        let mut fx = Fixture::new("hello");
        fx.key("C-x");
        assert_eq!(fx.key("C-q"), KeyOutcome::Consumed);
        assert_eq!(fx.mode.status().text(), "C-x C-q is undefined");
        assert!(fx.table.pending().is_empty());
    }

    #[test]
    fn test_quit_drops_pending_prefix() {
        let mut fx = Fixture::new("hello");
        fx.key("C-x");
        assert_eq!(fx.key("C-g"), KeyOutcome::Command(KEYBOARD_QUIT.into()));
        assert!(fx.table.pending().is_empty());
        assert_eq!(fx.mode.status().text(), "Quit");
    }

    #[test]
    fn test_exchange_point_and_mark_binding() {
        let mut fx = Fixture::new("hello world");
        fx.key("C-SPC");
        fx.surface.move_cursor_to(Position::new(0, 6));
        fx.key("C-x");
        fx.key("C-x");
        assert_eq!(fx.surface.cursor_position(), Position::new(0, 0));
        fx.key("C-x");
        fx.key("C-x");
        assert_eq!(fx.surface.cursor_position(), Position::new(0, 6));
    }

    #[test]
    fn test_switch_to_previous_buffer_when_open() {
        let mut fx = Fixture::new("");
        fx.invoke("switch-to-previous-buffer").unwrap();
        assert!(fx.host.calls().is_empty());

        fx.mode.focus_buffer(&mut fx.surface, BufferId::new("notes"));
        fx.invoke("switch-to-previous-buffer").unwrap();
        assert!(fx.host.calls().is_empty());

        fx.host.open(BufferId::new("*scratch*"));
        fx.invoke("switch-to-previous-buffer").unwrap();
        assert_eq!(
            fx.host.calls(),
            &[HostCall::ShowBuffer(BufferId::new("*scratch*"))]
        );
    }

    #[test]
    fn test_bound_to_unknown_command() {
        let mut keymap = Keymap::empty();
        keymap.bind_str("C-c C-c", "compile").unwrap();
        let mut fx = Fixture::new("");
        fx.table = CommandTable::new(keymap);
        fx.key("C-c");
        assert_eq!(fx.key("C-c"), KeyOutcome::Consumed);
        assert_eq!(fx.mode.status().text(), "unknown command: 'compile'");
    }

    #[test]
    fn test_custom_command() {
        let mut fx = Fixture::new("abc");
        fx.table.register("beginning-of-line", |ed| {
            let row = ed.surface.cursor_position().row;
            ed.surface.move_cursor_to(Position::new(row, 0));
        });
        fx.surface.move_cursor_to(Position::new(0, 2));
        fx.invoke("beginning-of-line").unwrap();
        assert_eq!(fx.surface.cursor_position(), Position::new(0, 0));
    }
}
