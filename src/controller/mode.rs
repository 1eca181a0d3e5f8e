use crate::buffers::BufferId;
use crate::clipboard::{ClipboardSink, SystemClipboard};
use crate::config::RcConfig;
use crate::controller::status::StatusLine;
use crate::keys::{KeyChord, KeyClass, Keymap, classify};
use crate::kill_ring::KillRing;
use crate::marks::MarkManager;
use crate::search::{SearchCx, SearchDirection, SearchEngine, SearchTimeout};
use crate::surface::{EditorSurface, Range};
use crate::timers::{Clock, DeferredQueue};
use crossterm::event::KeyEvent;
use std::sync::Arc;
use std::time::Instant;

pub const KILL_LINE: &str = "kill-line";
pub const ISEARCH_FORWARD: &str = "isearch-forward";
pub const ISEARCH_BACKWARD: &str = "isearch-backward";
pub const KEYBOARD_QUIT: &str = "keyboard-quit";

/// Session-wide mode flags. They are independent: a kill streak survives
/// entering and leaving a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeFlags {
    pub searching: bool,
    pub killing: bool,
}

/// Chords with a special meaning to the mode state machine, taken from
/// whatever the keymap binds to the corresponding commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedChords {
    /// Do not break a kill streak.
    pub kill: Vec<KeyChord>,
    /// Repeat the search instead of ending it.
    pub search_repeat: Vec<KeyChord>,
    /// End the search and put the cursor back.
    pub abort: Vec<KeyChord>,
}

impl ReservedChords {
    pub fn from_keymap(keymap: &Keymap) -> Self {
        let mut search_repeat = keymap.chords_for(ISEARCH_FORWARD);
        for chord in keymap.chords_for(ISEARCH_BACKWARD) {
            if !search_repeat.contains(&chord) {
                search_repeat.push(chord);
            }
        }
        Self {
            kill: keymap.chords_for(KILL_LINE),
            search_repeat,
            abort: keymap.chords_for(KEYBOARD_QUIT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeEvent {
    Enabled,
    Disabled,
    ModeChanged(ModeFlags),
    Status(String),
}

/// What the mode layer did with a keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intercept {
    Consumed,
    /// Continue to command dispatch.
    Forward,
}

/// The input mode state machine of one editing session.
pub struct ModeController {
    flags: ModeFlags,
    current: BufferId,
    previous: Option<BufferId>,
    search: SearchEngine,
    kill_ring: KillRing,
    marks: MarkManager,
    status: StatusLine,
    timers: DeferredQueue<SearchTimeout>,
    clock: Arc<dyn Clock>,
    clipboard: Option<Box<dyn ClipboardSink>>,
    events: Vec<ModeEvent>,
}

impl ModeController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            flags: ModeFlags::default(),
            current: BufferId::new("*scratch*"),
            previous: None,
            search: SearchEngine::default(),
            kill_ring: KillRing::default(),
            marks: MarkManager::new(),
            status: StatusLine::default(),
            timers: DeferredQueue::new(),
            clock,
            clipboard: None,
            events: Vec::new(),
        }
    }

    pub fn from_config(config: &RcConfig, clock: Arc<dyn Clock>) -> Self {
        let mut controller = Self::new(clock);
        controller.search = SearchEngine::new(config.failure_delay);
        controller.kill_ring = KillRing::new(config.kill_ring_max);
        controller.status = StatusLine::new(config.flash_duration, config.status_width);
        if config.mirror_clipboard {
            controller.clipboard = Some(Box::new(SystemClipboard));
        }
        controller
    }

    pub fn with_buffer(mut self, buffer: BufferId) -> Self {
        self.current = buffer;
        self
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn ClipboardSink>) -> Self {
        self.clipboard = Some(clipboard);
        self
    }

    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    pub fn current_buffer(&self) -> &BufferId {
        &self.current
    }

    pub fn previous_buffer(&self) -> Option<&BufferId> {
        self.previous.as_ref()
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn kill_ring(&self) -> &KillRing {
        &self.kill_ring
    }

    pub fn marks(&self) -> &MarkManager {
        &self.marks
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    /// Host status caption with the flash text in front.
    pub fn status_line(&self, caption: &str) -> String {
        self.status.compose(caption)
    }

    /// When the host should call `tick` next.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timers.next_deadline(), self.status.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn take_events(&mut self) -> Vec<ModeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run `f` and queue events for any change of flags or status text.
    fn track<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let flags = self.flags;
        let status = self.status.text().to_string();
        let result = f(self);
        if self.flags != flags {
            self.events.push(ModeEvent::ModeChanged(self.flags));
        }
        if self.status.text() != status {
            self.events.push(ModeEvent::Status(self.status.text().to_string()));
        }
        result
    }

    fn search_parts<'a>(
        &'a mut self,
        surface: &'a mut dyn EditorSurface,
    ) -> (&'a mut SearchEngine, SearchCx<'a>) {
        let cx = SearchCx {
            buffer: &self.current,
            surface,
            flags: &mut self.flags,
            status: &mut self.status,
            timers: &mut self.timers,
            now: self.clock.now(),
        };
        (&mut self.search, cx)
    }

    /// Mode handling of a keystroke ahead of command dispatch.
    pub fn intercept(
        &mut self,
        surface: &mut dyn EditorSurface,
        key: &KeyEvent,
        reserved: &ReservedChords,
    ) -> Intercept {
        self.track(|this| this.intercept_inner(surface, key, reserved))
    }

    fn intercept_inner(
        &mut self,
        surface: &mut dyn EditorSurface,
        key: &KeyEvent,
        reserved: &ReservedChords,
    ) -> Intercept {
        let class = classify(key);
        let chord = KeyChord::from_event(key);
        log::debug!("key {chord} classified as {class:?}");

        if self.flags.killing {
            let breaks_streak = match class {
                KeyClass::ModifierChord => !reserved.kill.contains(&chord),
                KeyClass::Movement => true,
                _ => false,
            };
            if breaks_streak {
                self.flags.killing = false;
            }
        }

        if !self.flags.searching {
            return Intercept::Forward;
        }

        let (search, mut cx) = self.search_parts(surface);
        match class {
            KeyClass::Plain(c) => {
                search.append_char(&mut cx, c);
                Intercept::Consumed
            }
            KeyClass::NoOp => Intercept::Consumed,
            KeyClass::ModifierChord if reserved.search_repeat.contains(&chord) => {
                Intercept::Forward
            }
            KeyClass::Movement | KeyClass::ModifierChord => {
                search.end(&mut cx, reserved.abort.contains(&chord));
                Intercept::Forward
            }
            KeyClass::Other => Intercept::Forward,
        }
    }

    pub fn isearch(&mut self, surface: &mut dyn EditorSurface, direction: SearchDirection) {
        self.track(|this| {
            let (search, mut cx) = this.search_parts(surface);
            search.begin(&mut cx, direction);
        });
    }

    /// Leave search mode, optionally putting the cursor back where the
    /// search started.
    pub fn end_search(&mut self, surface: &mut dyn EditorSurface, restore: bool) {
        self.track(|this| {
            let (search, mut cx) = this.search_parts(surface);
            search.end(&mut cx, restore);
        });
    }

    /// Move `range` into the kill ring and delete it from the document.
    fn kill(&mut self, surface: &mut dyn EditorSurface, range: Range) {
        let text = surface.text_range(range);
        if text.is_empty() {
            surface.clear_selection();
            return;
        }
        if !(self.flags.killing && self.kill_ring.append_to_top(&text)) {
            self.kill_ring.push(&text);
        }
        self.flags.killing = true;

        if let (Some(clipboard), Some(top)) = (self.clipboard.as_mut(), self.kill_ring.top()) {
            if let Err(e) = clipboard.set_text(top) {
                log::warn!("{e}");
            }
        }
        surface.remove_range(range);
        surface.clear_selection();
    }

    /// Kill to the end of the line, or the line break when already there.
    pub fn kill_line(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            surface.clear_selection();
            surface.select_line_end();
            let mut range = surface.selection_range();
            if range.is_empty() {
                surface.select_right();
                range = surface.selection_range();
            }
            this.kill(surface, range);
        });
    }

    /// Kill between point and mark, or the selection when there is no mark.
    pub fn kill_region(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            if let Some(mark) = this.marks.mark(&this.current) {
                surface.clear_selection();
                surface.select_to_position(mark);
            }
            let range = surface.selection_range();
            if !range.is_empty() {
                this.kill(surface, range);
            }
        });
    }

    pub fn set_mark(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            let now = this.clock.now();
            this.status.flash("Set Mark", now);
            this.marks.set_mark(&this.current, surface.cursor_position());
        });
    }

    pub fn exchange_point_and_mark(&mut self, surface: &mut dyn EditorSurface) {
        let point = surface.cursor_position();
        if let Some(mark) = self.marks.exchange(&self.current, point) {
            surface.clear_selection();
            surface.move_cursor_to(mark);
        }
    }

    /// Insert the most recent kill, leaving the mark where it started.
    pub fn yank(&mut self, surface: &mut dyn EditorSurface) {
        let Some(text) = self.kill_ring.top().map(str::to_string) else {
            return;
        };
        self.marks.set_mark(&self.current, surface.cursor_position());
        surface.insert_at_cursor(&text);
    }

    pub fn flash(&mut self, text: impl Into<String>) {
        self.track(|this| {
            let now = this.clock.now();
            this.status.flash(text, now);
        });
    }

    /// Fire due search-failure timers and expire the flash text.
    pub fn tick(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            let now = this.clock.now();
            let due = this.timers.drain_due(now);
            if !due.is_empty() {
                let (search, mut cx) = this.search_parts(surface);
                for timeout in &due {
                    if search.on_timeout(&mut cx, timeout) {
                        log::debug!("failing search in {} timed out", timeout.buffer);
                    }
                }
            }
            this.status.expire(now);
        });
    }

    /// Mouse click in the editor: drop highlights and both modes. The
    /// query is kept so the next search resumes it.
    pub fn cancel_all_modes(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            let (search, mut cx) = this.search_parts(surface);
            search.cancel(&mut cx);
            this.flags.killing = false;
        });
    }

    /// Leave every mode before the layer is detached.
    pub fn deactivate(&mut self, surface: &mut dyn EditorSurface) {
        self.track(|this| {
            if this.flags.searching {
                let (search, mut cx) = this.search_parts(surface);
                search.end(&mut cx, false);
            }
            this.flags.killing = false;
            this.timers.clear();
        });
    }

    /// The host switched documents. `surface` is still the document being
    /// left, so an active search can clean up its highlights.
    pub fn focus_buffer(&mut self, surface: &mut dyn EditorSurface, to: BufferId) {
        if to == self.current {
            return;
        }
        self.track(|this| {
            if this.flags.searching {
                let (search, mut cx) = this.search_parts(surface);
                search.end(&mut cx, false);
            }
            this.flags.killing = false;
            let from = std::mem::replace(&mut this.current, to);
            log::debug!("focus {from} -> {}", this.current);
            this.previous = Some(from);
        });
    }

    /// Forget everything kept for a closed buffer.
    pub fn close_buffer(&mut self, buffer: &BufferId) {
        self.track(|this| {
            this.search.remove_buffer(buffer);
            this.marks.cleanup_for_closed_buffer(buffer);
            if this.previous.as_ref() == Some(buffer) {
                this.previous = None;
            }
            if &this.current == buffer {
                this.flags.searching = false;
                this.timers.clear();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::RecordingClipboard;
    use crate::keys::KeyChord;
    use crate::surface::{MemorySurface, Position};
    use crate::timers::ManualClock;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;

    fn setup(text: &str) -> (ModeController, MemorySurface, ManualClock) {
        let clock = ManualClock::new();
        let controller = ModeController::new(Arc::new(clock.clone()));
        (controller, MemorySurface::from_string(text), clock)
    }

    fn reserved() -> ReservedChords {
        ReservedChords::from_keymap(&Keymap::default())
    }

    fn press(c: &mut ModeController, s: &mut MemorySurface, chord: KeyChord) -> Intercept {
        c.intercept(s, &chord.to_event(), &reserved())
    }

    #[test]
    fn test_reserved_chords_from_default_keymap() {
        let reserved = reserved();
        assert_eq!(reserved.kill, vec![KeyChord::ctrl('k')]);
        assert_eq!(reserved.search_repeat.len(), 2);
        assert!(reserved.search_repeat.contains(&KeyChord::ctrl('s')));
        assert!(reserved.search_repeat.contains(&KeyChord::ctrl('r')));
        assert_eq!(reserved.abort, vec![KeyChord::ctrl('g')]);
    }

    #[test]
    fn test_plain_keys_consumed_while_searching() {
        let (mut c, mut s, _) = setup("alpha beta");
        assert_eq!(press(&mut c, &mut s, KeyChord::plain('b')), Intercept::Forward);

        c.isearch(&mut s, SearchDirection::Forward);
        assert_eq!(press(&mut c, &mut s, KeyChord::plain('b')), Intercept::Consumed);
        assert_eq!(s.text(), "alpha beta");
        assert_eq!(s.cursor_position(), Position::new(0, 6));

        let modifier_only = KeyEvent::new(
            KeyCode::Modifier(crossterm::event::ModifierKeyCode::LeftControl),
            KeyModifiers::CONTROL,
        );
        assert_eq!(c.intercept(&mut s, &modifier_only, &reserved()), Intercept::Consumed);
        assert!(c.flags().searching);
    }

    #[test]
    fn test_movement_ends_search_in_place() {
        let (mut c, mut s, _) = setup("alpha beta");
        c.isearch(&mut s, SearchDirection::Forward);
        press(&mut c, &mut s, KeyChord::plain('e'));
        let landed = s.cursor_position();

        let left = KeyEvent::new(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(c.intercept(&mut s, &left, &reserved()), Intercept::Forward);
        assert!(!c.flags().searching);
        assert_eq!(s.cursor_position(), landed);
        assert!(s.highlights().is_empty());
    }

    #[test]
    fn test_repeat_chord_keeps_searching() {
        let (mut c, mut s, _) = setup("alpha beta");
        c.isearch(&mut s, SearchDirection::Forward);
        assert_eq!(press(&mut c, &mut s, KeyChord::ctrl('s')), Intercept::Forward);
        assert!(c.flags().searching);
        assert_eq!(press(&mut c, &mut s, KeyChord::ctrl('a')), Intercept::Forward);
        assert!(!c.flags().searching);
    }

    #[test]
    fn test_abort_chord_restores_cursor() {
        let (mut c, mut s, _) = setup("alpha beta\ngamma");
        s.move_cursor_to(Position::new(1, 2));
        c.isearch(&mut s, SearchDirection::Forward);
        press(&mut c, &mut s, KeyChord::plain('l'));
        assert_eq!(s.cursor_position(), Position::new(0, 1));

        press(&mut c, &mut s, KeyChord::ctrl('g'));
        assert!(!c.flags().searching);
        assert_eq!(s.cursor_position(), Position::new(1, 2));
    }

    #[test]
    fn test_kill_streak() {
        let (mut c, mut s, _) = setup("one\ntwo\nthree");
        c.kill_line(&mut s);
        assert!(c.flags().killing);
        // Plain characters and the kill chord keep the streak alive.
        press(&mut c, &mut s, KeyChord::plain('x'));
        press(&mut c, &mut s, KeyChord::ctrl('k'));
        assert!(c.flags().killing);
        c.kill_line(&mut s);
        assert_eq!(c.kill_ring().len(), 1);
        assert_eq!(c.kill_ring().top(), Some("one\n"));

        press(&mut c, &mut s, KeyChord::ctrl('f'));
        assert!(!c.flags().killing);
        c.kill_line(&mut s);
        assert_eq!(c.kill_ring().len(), 2);
        assert_eq!(c.kill_ring().top(), Some("two"));
    }

    #[test]
    fn test_empty_kill_does_not_start_streak() {
        let (mut c, mut s, _) = setup("old\nnew");
        c.kill_line(&mut s);
        press(&mut c, &mut s, KeyChord::ctrl('f'));
        assert!(!c.flags().killing);

        s.move_cursor_to(Position::new(1, 3));
        c.kill_line(&mut s);
        assert!(!c.flags().killing);
        assert_eq!(c.kill_ring().len(), 1);

        s.move_cursor_to(Position::new(1, 0));
        c.kill_line(&mut s);
        assert_eq!(c.kill_ring().iter().collect::<Vec<_>>(), vec!["old", "new"]);
        assert_eq!(s.text(), "\n");
    }

    #[test]
    fn test_kill_mirrors_clipboard() {
        let (c, mut s, _) = setup("hello world");
        let clipboard = RecordingClipboard::new();
        let mut c = c.with_clipboard(Box::new(clipboard.clone()));
        s.move_cursor_to(Position::new(0, 5));
        c.kill_line(&mut s);
        assert_eq!(clipboard.last().as_deref(), Some(" world"));
        assert_eq!(s.text(), "hello");
    }

    #[test]
    fn test_kill_region_uses_mark() {
        let (mut c, mut s, _) = setup("hello world");
        c.set_mark(&mut s);
        assert_eq!(c.status().text(), "Set Mark");
        s.move_cursor_to(Position::new(0, 5));
        c.kill_region(&mut s);
        assert_eq!(s.text(), " world");
        assert_eq!(c.kill_ring().top(), Some("hello"));
    }

    #[test]
    fn test_kill_region_without_mark_or_selection() {
        let (mut c, mut s, _) = setup("hello");
        c.kill_region(&mut s);
        assert_eq!(s.text(), "hello");
        assert!(c.kill_ring().is_empty());
        assert!(!c.flags().killing);
    }

    #[test]
    fn test_yank_sets_mark_and_inserts() {
        let (mut c, mut s, _) = setup("abc def");
        c.yank(&mut s);
        assert_eq!(s.text(), "abc def");
        assert_eq!(c.marks().mark(c.current_buffer()), None);

        s.move_cursor_to(Position::new(0, 3));
        c.kill_line(&mut s);
        s.move_cursor_to(Position::new(0, 0));
        c.yank(&mut s);
        assert_eq!(s.text(), " defabc");
        assert_eq!(c.marks().mark(c.current_buffer()), Some(Position::new(0, 0)));
        assert_eq!(s.cursor_position(), Position::new(0, 4));
    }

    #[test]
    fn test_tick_expires_status() {
        let (mut c, mut s, clock) = setup("abc");
        c.flash("Quit");
        clock.advance(Duration::from_millis(1500));
        c.tick(&mut s);
        assert_eq!(c.status().text(), "Quit");
        clock.advance(Duration::from_millis(500));
        c.tick(&mut s);
        assert_eq!(c.status().text(), "");
    }

    #[test]
    fn test_events_track_changes() {
        let (mut c, mut s, _) = setup("abc");
        c.isearch(&mut s, SearchDirection::Forward);
        let events = c.take_events();
        assert_eq!(
            events,
            vec![
                ModeEvent::ModeChanged(ModeFlags {
                    searching: true,
                    killing: false
                }),
                ModeEvent::Status("I-search: ".to_string()),
            ]
        );
        assert!(c.take_events().is_empty());
    }

    #[test]
    fn test_click_cancels_modes() {
        let (mut c, mut s, _) = setup("abc abc");
        c.kill_line(&mut s);
        s.insert_at_cursor("abc abc");
        c.isearch(&mut s, SearchDirection::Forward);
        press(&mut c, &mut s, KeyChord::plain('b'));
        assert_eq!(s.highlights().len(), 2);

        c.cancel_all_modes(&mut s);
        assert_eq!(c.flags(), ModeFlags::default());
        assert!(s.highlights().is_empty());
    }

    #[test]
    fn test_focus_switch_tracks_previous() {
        let (mut c, mut s, _) = setup("abc");
        c.isearch(&mut s, SearchDirection::Forward);
        c.focus_buffer(&mut s, BufferId::new("other"));
        assert!(!c.flags().searching);
        assert_eq!(c.current_buffer().as_str(), "other");
        assert_eq!(c.previous_buffer().map(BufferId::as_str), Some("*scratch*"));

        c.close_buffer(&BufferId::new("*scratch*"));
        assert_eq!(c.previous_buffer(), None);
        assert_eq!(c.search().buffer_count(), 0);
    }

    #[test]
    fn test_next_deadline() {
        let (mut c, mut s, clock) = setup("abc");
        assert_eq!(c.next_deadline(), None);
        c.isearch(&mut s, SearchDirection::Forward);
        press(&mut c, &mut s, KeyChord::plain('z'));
        assert_eq!(c.next_deadline(), Some(clock.now() + Duration::from_millis(500)));
    }
}
