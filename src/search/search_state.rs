use crate::surface::{MarkerHandle, Position, Range, SearchOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Backward,
}

impl SearchDirection {
    pub fn is_forward(self) -> bool {
        self == SearchDirection::Forward
    }
}

/// Incremental search state of one buffer. Lives as long as the buffer so
/// that `previous_query` survives between searches.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    pub previous_query: String,
    pub direction: SearchDirection,
    pub options: SearchOptions,
    /// Highlights for every match of `query`; never for an older query.
    pub markers: Vec<MarkerHandle>,
    /// Cursor position when the search began, restored on abort.
    pub anchor: Option<Position>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Choose the match a search step lands on. Forward takes the first match
/// starting at or after `from`; backward the last one ending at or before
/// it. With `wrap` the search continues from the other end of the document.
pub fn pick_match(
    matches: &[Range],
    from: Position,
    direction: SearchDirection,
    wrap: bool,
) -> Option<Range> {
    let found = match direction {
        SearchDirection::Forward => matches.iter().find(|m| m.start >= from),
        SearchDirection::Backward => matches.iter().rev().find(|m| m.end <= from),
    };
    let wrapped = || match direction {
        SearchDirection::Forward => matches.first(),
        SearchDirection::Backward => matches.last(),
    };
    found.or_else(|| if wrap { wrapped() } else { None }).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(row: usize, start: usize, end: usize) -> Range {
        Range::new(Position::new(row, start), Position::new(row, end))
    }

    #[test]
    fn test_defaults() {
        let state = SearchState::new();
        assert!(state.options.wrap);
        assert!(!state.options.case_sensitive);
        assert!(!state.options.whole_word);
        assert!(!state.options.regex);
        assert_eq!(state.direction, SearchDirection::Forward);
    }

    #[test]
    fn test_pick_forward() {
        let matches = [r(0, 0, 3), r(1, 4, 7), r(3, 0, 3)];
        assert_eq!(
            pick_match(&matches, Position::new(0, 1), SearchDirection::Forward, true),
            Some(r(1, 4, 7))
        );
        assert_eq!(
            pick_match(&matches, Position::new(1, 4), SearchDirection::Forward, true),
            Some(r(1, 4, 7))
        );
    }

    #[test]
    fn test_pick_backward() {
        let matches = [r(0, 0, 3), r(1, 4, 7), r(3, 0, 3)];
        assert_eq!(
            pick_match(&matches, Position::new(1, 6), SearchDirection::Backward, true),
            Some(r(0, 0, 3))
        );
        assert_eq!(
            pick_match(&matches, Position::new(2, 0), SearchDirection::Backward, true),
            Some(r(1, 4, 7))
        );
    }

    #[test]
    fn test_pick_wraps_only_when_enabled() {
        let matches = [r(0, 0, 3)];
        let end = Position::new(5, 0);
        assert_eq!(
            pick_match(&matches, end, SearchDirection::Forward, true),
            Some(r(0, 0, 3))
        );
        assert_eq!(pick_match(&matches, end, SearchDirection::Forward, false), None);
        assert_eq!(
            pick_match(&matches, Position::new(0, 0), SearchDirection::Backward, true),
            Some(r(0, 0, 3))
        );
        assert_eq!(pick_match(&[], end, SearchDirection::Forward, true), None);
    }
}
