use super::search_state::{SearchDirection, SearchState, pick_match};
use crate::buffers::{BufferId, BufferMap};
use crate::controller::mode::ModeFlags;
use crate::controller::status::StatusLine;
use crate::surface::{EditorSurface, Position};
use crate::timers::DeferredQueue;
use std::time::{Duration, Instant};

pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_millis(500);

/// Deferred exit of a failing search. Fires only if no search action
/// happened after it was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTimeout {
    pub buffer: BufferId,
    pub epoch: u64,
}

/// Everything a search step touches besides the search state itself.
pub struct SearchCx<'a> {
    pub buffer: &'a BufferId,
    pub surface: &'a mut dyn EditorSurface,
    pub flags: &'a mut ModeFlags,
    pub status: &'a mut StatusLine,
    pub timers: &'a mut DeferredQueue<SearchTimeout>,
    pub now: Instant,
}

/// Incremental search over the editor surface, one `SearchState` per buffer.
#[derive(Debug)]
pub struct SearchEngine {
    states: BufferMap<SearchState>,
    /// Bumped by every search action; stale failure timers compare unequal.
    epoch: u64,
    failure_delay: Duration,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_DELAY)
    }
}

impl SearchEngine {
    pub fn new(failure_delay: Duration) -> Self {
        Self {
            states: BufferMap::new(),
            epoch: 0,
            failure_delay,
        }
    }

    pub fn state(&self, buffer: &BufferId) -> Option<&SearchState> {
        self.states.get(buffer)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start a search, or repeat it when one is already running. A query
    /// left over from a search that has not been closed yet resumes too.
    pub fn begin(&mut self, cx: &mut SearchCx<'_>, direction: SearchDirection) {
        let resumable = self
            .states
            .get(cx.buffer)
            .is_some_and(|s| !s.query.is_empty());
        if resumable {
            cx.flags.searching = true;
        }
        if cx.flags.searching {
            self.repeat(cx, direction);
            return;
        }

        self.epoch += 1;
        let state = self.states.entry(cx.buffer);
        state.direction = direction;
        state.anchor = Some(cx.surface.cursor_position());

        let selection = cx.surface.selection_range();
        if !selection.is_empty() {
            cx.surface.set_selection_range(selection, direction.is_forward());
        }
        cx.status.flash("I-search: ", cx.now);
        cx.flags.searching = true;
        log::debug!("isearch {direction:?} started in {}", cx.buffer);
    }

    /// Search key pressed again while searching: reuse the previous query
    /// when nothing was typed, then jump to the next match.
    pub fn repeat(&mut self, cx: &mut SearchCx<'_>, direction: SearchDirection) {
        self.epoch += 1;
        let state = self.states.entry(cx.buffer);
        state.direction = direction;
        if state.query.is_empty() {
            state.query = state.previous_query.clone();
        }
        if !state.query.is_empty() {
            self.find(cx, None);
        }
    }

    /// Grow the query by one character and search again from just behind
    /// (forward) or just past (backward) the cursor.
    pub fn append_char(&mut self, cx: &mut SearchCx<'_>, c: char) {
        self.epoch += 1;
        let cursor = cx.surface.cursor_position();
        let state = self.states.entry(cx.buffer);
        state.query.push(c);
        let start = match state.direction {
            SearchDirection::Forward => Position::new(cursor.row, cursor.column.saturating_sub(1)),
            SearchDirection::Backward => Position::new(cursor.row, cursor.column + 1),
        };
        log::debug!("isearch query {:?}", state.query);
        self.find(cx, Some(start));
    }

    /// Replace all highlights with those of the current query and move the
    /// selection to the chosen match. `start` defaults to the selection
    /// edge in the search direction.
    pub fn find(&mut self, cx: &mut SearchCx<'_>, start: Option<Position>) {
        let epoch = self.epoch;
        let delay = self.failure_delay;
        let state = self.states.entry(cx.buffer);

        for marker in state.markers.drain(..) {
            cx.surface.remove_highlight(marker);
        }
        cx.status.flash(format!("I-search: {}", state.query), cx.now);

        let forward = state.direction.is_forward();
        let matches = cx.surface.find_matches(&state.query, &state.options);
        let from = start.unwrap_or_else(|| {
            let selection = cx.surface.selection_range();
            if forward { selection.end } else { selection.start }
        });
        if let Some(target) = pick_match(&matches, from, state.direction, state.options.wrap) {
            cx.surface.set_selection_range(target, forward);
        }
        for range in &matches {
            let marker = cx.surface.add_highlight(*range);
            state.markers.push(marker);
        }

        if matches.is_empty() {
            cx.status.flash(format!("Failing I-search: {}", state.query), cx.now);
            cx.timers.schedule(
                cx.now + delay,
                SearchTimeout {
                    buffer: cx.buffer.clone(),
                    epoch,
                },
            );
            log::debug!("isearch failing for {:?}", state.query);
        }
    }

    /// Leave search mode. With `restore` the cursor goes back to where the
    /// search began; otherwise it stays on the last match.
    pub fn end(&mut self, cx: &mut SearchCx<'_>, restore: bool) {
        self.epoch += 1;
        let state = self.states.entry(cx.buffer);
        for marker in state.markers.drain(..) {
            cx.surface.remove_highlight(marker);
        }
        cx.flags.searching = false;

        let query = std::mem::take(&mut state.query);
        if !query.is_empty() {
            state.previous_query = query;
        }
        if let Some(anchor) = state.anchor.take() {
            if restore {
                cx.surface.clear_selection();
                cx.surface.move_cursor_to(anchor);
            }
        }
        log::debug!("isearch ended (restore: {restore})");
    }

    /// Failure timer callback. Ignored when a newer search action superseded
    /// the failing one.
    pub fn on_timeout(&mut self, cx: &mut SearchCx<'_>, timeout: &SearchTimeout) -> bool {
        if timeout.epoch != self.epoch {
            log::debug!("stale isearch timeout ignored");
            return false;
        }
        cx.flags.searching = false;
        if let Some(state) = self.states.get_mut(&timeout.buffer) {
            state.query.clear();
            state.anchor = None;
        }
        true
    }

    /// Drop highlights and leave search mode without touching the query,
    /// so the next search key resumes it.
    pub fn cancel(&mut self, cx: &mut SearchCx<'_>) {
        if let Some(state) = self.states.get_mut(cx.buffer) {
            for marker in state.markers.drain(..) {
                cx.surface.remove_highlight(marker);
            }
        }
        cx.flags.searching = false;
    }

    /// Forget the state of a closed buffer.
    pub fn remove_buffer(&mut self, buffer: &BufferId) -> Option<SearchState> {
        self.states.remove(buffer)
    }

    pub fn buffer_count(&self) -> usize {
        self.states.len()
    }
}
