use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthChar;

pub const DEFAULT_FLASH: Duration = Duration::from_secs(2);

/// Transient status text ("I-search: foo", "Set Mark") that clears itself
/// after `flash_for`. A new flash restarts the timer.
#[derive(Debug, Clone)]
pub struct StatusLine {
    text: String,
    expires_at: Option<Instant>,
    flash_for: Duration,
    width: Option<usize>,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(DEFAULT_FLASH, None)
    }
}

impl StatusLine {
    pub fn new(flash_for: Duration, width: Option<usize>) -> Self {
        Self {
            text: String::new(),
            expires_at: None,
            flash_for,
            width,
        }
    }

    pub fn flash(&mut self, text: impl Into<String>, now: Instant) {
        self.text = text.into();
        self.expires_at = Some(now + self.flash_for);
    }

    /// Clear the text once its deadline has passed. Returns true if it was
    /// cleared by this call.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) if now >= at => {
                self.text.clear();
                self.expires_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.expires_at
    }

    /// The host's own status caption with the flash text in front of it.
    pub fn compose(&self, caption: &str) -> String {
        let line = match (self.text.is_empty(), caption.is_empty()) {
            (true, _) => caption.to_string(),
            (false, true) => self.text.clone(),
            (false, false) => format!("{} {}", self.text, caption),
        };
        match self.width {
            Some(width) => truncate_to_width(&line, width),
            None => line,
        }
    }
}

/// Cut `text` so that it occupies at most `width` terminal columns.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flash_expires() {
        let start = Instant::now();
        let mut status = StatusLine::default();
        status.flash("Set Mark", start);
        assert_eq!(status.text(), "Set Mark");

        assert!(!status.expire(start + Duration::from_millis(1999)));
        assert_eq!(status.text(), "Set Mark");
        assert!(status.expire(start + DEFAULT_FLASH));
        assert_eq!(status.text(), "");
    }

    #[test]
    fn test_reflash_restarts_timer() {
        let start = Instant::now();
        let mut status = StatusLine::default();
        status.flash("I-search: ", start);
        status.flash("I-search: f", start + Duration::from_millis(1500));
        assert!(!status.expire(start + Duration::from_millis(2500)));
        assert_eq!(status.text(), "I-search: f");
    }

    #[test]
    fn test_compose_prefixes_caption() {
        let mut status = StatusLine::default();
        assert_eq!(status.compose("Ln 3, Col 1"), "Ln 3, Col 1");
        status.flash("Set Mark", Instant::now());
        assert_eq!(status.compose("Ln 3, Col 1"), "Set Mark Ln 3, Col 1");
        assert_eq!(status.compose(""), "Set Mark");
    }

    #[test]
    fn test_compose_respects_display_width() {
        let mut status = StatusLine::new(DEFAULT_FLASH, Some(13));
        status.flash("I-search: 日本語", Instant::now());
        // Wide chars take two columns each.
        assert_eq!(status.compose(""), "I-search: 日");
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }
}
