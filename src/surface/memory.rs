use super::{EditorSurface, MarkerHandle, Position, Range, SearchOptions, SearchScope};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use regex::Regex;
use std::cell::Cell;
use std::collections::BTreeMap;

const PAGE_LINES: usize = 20;

/// Highlight bookkeeping, recorded in call order so callers can check that
/// stale markers are dropped before new ones appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightOp {
    Added(MarkerHandle),
    Removed(MarkerHandle),
}

/// Line-based in-memory document with a single cursor and an optional
/// selection anchor. Columns count chars, not bytes.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    lines: Vec<String>,
    cursor: Position,
    anchor: Option<Position>,
    highlights: BTreeMap<u64, Range>,
    next_marker: u64,
    highlight_log: Vec<HighlightOp>,
    find_calls: Cell<usize>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::from_string("")
    }

    pub fn from_string(content: &str) -> Self {
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        Self {
            lines: normalized.split('\n').map(str::to_string).collect(),
            cursor: Position::default(),
            anchor: None,
            highlights: BTreeMap::new(),
            next_marker: 1,
            highlight_log: Vec::new(),
            find_calls: Cell::new(0),
        }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn line(&self, row: usize) -> Option<&str> {
        self.lines.get(row).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |l| l.chars().count())
    }

    pub fn highlights(&self) -> Vec<Range> {
        self.highlights.values().copied().collect()
    }

    pub fn highlight_log(&self) -> &[HighlightOp] {
        &self.highlight_log
    }

    /// Number of `find_matches` calls so far.
    pub fn find_calls(&self) -> usize {
        self.find_calls.get()
    }

    fn clamp(&self, pos: Position) -> Position {
        let row = pos.row.min(self.lines.len().saturating_sub(1));
        Position::new(row, pos.column.min(self.line_len(row)))
    }

    fn byte_index(line: &str, column: usize) -> usize {
        line.char_indices()
            .nth(column)
            .map_or(line.len(), |(idx, _)| idx)
    }

    fn char_column(line: &str, byte: usize) -> usize {
        line[..byte].chars().count()
    }

    fn position_to_offset(&self, pos: Position) -> usize {
        let pos = self.clamp(pos);
        let before: usize = self.lines[..pos.row]
            .iter()
            .map(|l| l.chars().count() + 1)
            .sum();
        before + pos.column
    }

    fn offset_to_position(&self, mut offset: usize) -> Position {
        for (row, line) in self.lines.iter().enumerate() {
            let len = line.chars().count();
            if offset <= len {
                return Position::new(row, offset);
            }
            offset -= len + 1;
        }
        let last = self.lines.len().saturating_sub(1);
        Position::new(last, self.line_len(last))
    }

    fn shift_after_removal(&self, pos: Position, start: usize, end: usize) -> usize {
        let offset = self.position_to_offset(pos);
        if offset >= end {
            offset - (end - start)
        } else if offset > start {
            start
        } else {
            offset
        }
    }

    fn move_to(&mut self, pos: Position) {
        self.anchor = None;
        self.cursor = self.clamp(pos);
    }

    /// Apply the editor's own handling of a key that the Emacs layer passed
    /// through: printable chars insert, movement keys move, editing keys
    /// edit. Returns false for keys the surface ignores.
    pub fn apply_native(&mut self, key: &KeyEvent) -> bool {
        let Position { row, column } = self.cursor;
        match key.code {
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.insert_at_cursor(&c.to_string());
            }
            KeyCode::Enter => self.insert_at_cursor("\n"),
            KeyCode::Tab => self.insert_at_cursor("\t"),
            KeyCode::Backspace => {
                let offset = self.position_to_offset(self.cursor);
                if offset > 0 {
                    let start = self.offset_to_position(offset - 1);
                    self.remove_range(Range::new(start, self.cursor));
                }
            }
            KeyCode::Delete => {
                let offset = self.position_to_offset(self.cursor);
                let end = self.offset_to_position(offset + 1);
                self.remove_range(Range::new(self.cursor, end));
            }
            KeyCode::Left => {
                let offset = self.position_to_offset(self.cursor);
                let target = self.offset_to_position(offset.saturating_sub(1));
                self.move_to(target);
            }
            KeyCode::Right => {
                let offset = self.position_to_offset(self.cursor);
                let target = self.offset_to_position(offset + 1);
                self.move_to(target);
            }
            KeyCode::Up => self.move_to(Position::new(row.saturating_sub(1), column)),
            KeyCode::Down => self.move_to(Position::new(row + 1, column)),
            KeyCode::Home => self.move_to(Position::new(row, 0)),
            KeyCode::End => self.move_to(Position::new(row, usize::MAX)),
            KeyCode::PageUp => self.move_to(Position::new(row.saturating_sub(PAGE_LINES), column)),
            KeyCode::PageDown => self.move_to(Position::new(row + PAGE_LINES, column)),
            KeyCode::Esc => self.anchor = None,
            _ => return false,
        }
        true
    }

    fn build_regex(query: &str, options: &SearchOptions) -> Option<Regex> {
        let mut pattern = if options.regex {
            query.to_string()
        } else {
            regex::escape(query)
        };
        if options.whole_word {
            pattern = format!(r"\b{pattern}\b");
        }
        if !options.case_sensitive {
            pattern = format!("(?i){pattern}");
        }
        match Regex::new(&pattern) {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::debug!("invalid search pattern {query:?}: {e}");
                None
            }
        }
    }
}

impl EditorSurface for MemorySurface {
    fn cursor_position(&self) -> Position {
        self.cursor
    }

    fn move_cursor_to(&mut self, pos: Position) {
        self.cursor = self.clamp(pos);
    }

    fn clear_selection(&mut self) {
        self.anchor = None;
    }

    fn selection_range(&self) -> Range {
        match self.anchor {
            Some(anchor) => Range::new(anchor, self.cursor),
            None => Range::empty_at(self.cursor),
        }
    }

    fn set_selection_range(&mut self, range: Range, reversed: bool) {
        let (anchor, cursor) = if reversed {
            (range.end, range.start)
        } else {
            (range.start, range.end)
        };
        self.anchor = Some(self.clamp(anchor));
        self.cursor = self.clamp(cursor);
    }

    fn select_line_end(&mut self) {
        let row = self.cursor.row;
        self.select_to_position(Position::new(row, self.line_len(row)));
    }

    fn select_right(&mut self) {
        let offset = self.position_to_offset(self.cursor);
        let target = self.offset_to_position(offset + 1);
        self.select_to_position(target);
    }

    fn select_to_position(&mut self, pos: Position) {
        if self.anchor.is_none() {
            self.anchor = Some(self.cursor);
        }
        self.cursor = self.clamp(pos);
    }

    fn text_range(&self, range: Range) -> String {
        let start = self.position_to_offset(range.start);
        let end = self.position_to_offset(range.end);
        self.text().chars().skip(start).take(end - start).collect()
    }

    fn remove_range(&mut self, range: Range) {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end);
        if start == end {
            return;
        }
        let start_offset = self.position_to_offset(start);
        let end_offset = self.position_to_offset(end);
        let cursor = self.shift_after_removal(self.cursor, start_offset, end_offset);
        let anchor = self
            .anchor
            .map(|a| self.shift_after_removal(a, start_offset, end_offset));

        let end_line = &self.lines[end.row];
        let tail = end_line[Self::byte_index(end_line, end.column)..].to_string();
        let start_line = &mut self.lines[start.row];
        let cut = Self::byte_index(start_line, start.column);
        start_line.truncate(cut);
        start_line.push_str(&tail);
        self.lines.drain(start.row + 1..=end.row);

        self.cursor = self.offset_to_position(cursor);
        self.anchor = anchor.map(|a| self.offset_to_position(a));
    }

    fn insert_at_cursor(&mut self, text: &str) {
        let selection = self.selection_range();
        if !selection.is_empty() {
            self.remove_range(selection);
        }
        self.anchor = None;

        let Position { row, column } = self.cursor;
        let line = &self.lines[row];
        let split = Self::byte_index(line, column);
        let tail = line[split..].to_string();
        let head = line[..split].to_string();

        let mut pieces = text.split('\n');
        let first = pieces.next().unwrap_or_default();
        let rest: Vec<&str> = pieces.collect();

        if rest.is_empty() {
            self.lines[row] = format!("{head}{first}{tail}");
            self.cursor = Position::new(row, column + first.chars().count());
            return;
        }

        self.lines[row] = format!("{head}{first}");
        let last_index = rest.len() - 1;
        for (i, piece) in rest.iter().enumerate() {
            let new_line = if i == last_index {
                format!("{piece}{tail}")
            } else {
                piece.to_string()
            };
            self.lines.insert(row + 1 + i, new_line);
        }
        self.cursor = Position::new(row + rest.len(), rest[last_index].chars().count());
    }

    fn find_matches(&self, query: &str, options: &SearchOptions) -> Vec<Range> {
        self.find_calls.set(self.find_calls.get() + 1);
        if query.is_empty() {
            return Vec::new();
        }
        let Some(regex) = Self::build_regex(query, options) else {
            return Vec::new();
        };

        let scope = self.selection_range();
        let mut matches = Vec::new();
        for (row, line) in self.lines.iter().enumerate() {
            for mat in regex.find_iter(line) {
                if mat.start() == mat.end() {
                    continue;
                }
                let range = Range::new(
                    Position::new(row, Self::char_column(line, mat.start())),
                    Position::new(row, Self::char_column(line, mat.end())),
                );
                if options.scope == SearchScope::Selection
                    && (range.start < scope.start || range.end > scope.end)
                {
                    continue;
                }
                matches.push(range);
            }
        }
        matches
    }

    fn add_highlight(&mut self, range: Range) -> MarkerHandle {
        let handle = MarkerHandle(self.next_marker);
        self.next_marker += 1;
        self.highlights.insert(handle.0, range);
        self.highlight_log.push(HighlightOp::Added(handle));
        handle
    }

    fn remove_highlight(&mut self, marker: MarkerHandle) {
        if self.highlights.remove(&marker.0).is_some() {
            self.highlight_log.push(HighlightOp::Removed(marker));
        }
    }
}
