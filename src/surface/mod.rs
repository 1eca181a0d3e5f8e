/// Editor surface subsystem - The contract the key layer drives
///
/// The Emacs layer never owns text. Everything it does to a document goes
/// through `EditorSurface`, which a host editor implements. `MemorySurface`
/// is the in-process implementation used by the CLI and the tests.
pub mod memory;

pub use memory::MemorySurface;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// A span of text, always stored with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn empty_at(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Opaque handle to a highlight created by `EditorSurface::add_highlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    #[default]
    All,
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub wrap: bool,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub regex: bool,
    pub scope: SearchScope,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            wrap: true,
            case_sensitive: false,
            whole_word: false,
            regex: false,
            scope: SearchScope::All,
        }
    }
}

/// Primitives the key layer needs from the host editor.
pub trait EditorSurface {
    fn cursor_position(&self) -> Position;
    fn move_cursor_to(&mut self, pos: Position);
    fn clear_selection(&mut self);

    /// Current selection; empty at the cursor when nothing is selected.
    fn selection_range(&self) -> Range;
    /// Select `range`. When `reversed` the cursor lands on `range.start`,
    /// otherwise on `range.end`.
    fn set_selection_range(&mut self, range: Range, reversed: bool);
    fn select_line_end(&mut self);
    fn select_right(&mut self);
    fn select_to_position(&mut self, pos: Position);

    fn text_range(&self, range: Range) -> String;
    fn remove_range(&mut self, range: Range);
    /// Paste primitive: replaces the selection, if any, and leaves the
    /// cursor after the inserted text.
    fn insert_at_cursor(&mut self, text: &str);

    /// Every match of `query` in document order.
    fn find_matches(&self, query: &str, options: &SearchOptions) -> Vec<Range>;
    fn add_highlight(&mut self, range: Range) -> MarkerHandle;
    fn remove_highlight(&mut self, marker: MarkerHandle);
}
