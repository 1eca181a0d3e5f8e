use crate::error::{EmacsError, Result};
use crate::keys::{Keymap, KeymapSource, KeySequence};
use crate::kill_ring::DEFAULT_KILL_RING_MAX;
use crate::search::DEFAULT_FAILURE_DELAY;
use crate::controller::status::DEFAULT_FLASH;
use futures::future::{BoxFuture, FutureExt};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const RC_FILE_NAME: &str = ".emacsmoderc";

#[derive(Debug, Clone)]
pub struct RcConfig {
    pub enabled: bool,
    pub mirror_clipboard: bool,
    pub failure_delay: Duration,
    pub flash_duration: Duration,
    pub status_width: Option<usize>,
    pub kill_ring_max: usize,
    pub keymap: Keymap,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mirror_clipboard: false,
            failure_delay: DEFAULT_FAILURE_DELAY,
            flash_duration: DEFAULT_FLASH,
            status_width: None,
            kill_ring_max: DEFAULT_KILL_RING_MAX,
            keymap: Keymap::default(),
        }
    }
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .emacsmoderc in:
    /// 1. Current directory
    /// 2. Home directory (~/.emacsmoderc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE_NAME);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(RC_FILE_NAME);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load the RC file from the default locations. A missing or unreadable
    /// file yields the defaults.
    pub fn load_config() -> RcConfig {
        let Some(rc_path) = Self::get_rc_path() else {
            return RcConfig::default();
        };
        match Self::load_from(&rc_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}");
                RcConfig::default()
            }
        }
    }

    /// Load a specific RC file. Bad lines are logged and skipped; only a
    /// read failure is an error.
    pub fn load_from(path: &Path) -> Result<RcConfig> {
        let content = fs::read_to_string(path).map_err(|e| EmacsError::io(path, e))?;
        let mut config = RcConfig::default();
        for error in Self::parse_config_content(&content, &mut config) {
            log::warn!("{}: {error}", path.display());
        }
        log::info!(
            "loaded {} with {} bindings",
            path.display(),
            config.keymap.len()
        );
        Ok(config)
    }

    /// Parse the content of an RC file, returning the problems found.
    pub fn parse_config_content(content: &str, config: &mut RcConfig) -> Vec<EmacsError> {
        let mut errors = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Err(e) = Self::parse_config_line(index + 1, line, config) {
                errors.push(e);
            }
        }
        errors
    }

    /// Parse a single configuration line
    fn parse_config_line(line_no: usize, line: &str, config: &mut RcConfig) -> Result<()> {
        // Inline comments need whitespace before the '#', so "#" stays bindable.
        let line = match line.find(" #") {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        if let Some(rest) = line.strip_prefix("bind ") {
            return Self::parse_bind(line_no, rest, config);
        }
        if let Some(rest) = line.strip_prefix("unbind ") {
            let seq = Self::parse_sequence(line_no, rest.trim())?;
            if config.keymap.unbind(&seq).is_none() {
                log::debug!("line {line_no}: {seq} was not bound");
            }
            return Ok(());
        }

        if let Some(setting) = line.strip_prefix("set ") {
            match setting.trim() {
                "enabled" => config.enabled = true,
                "noenabled" => config.enabled = false,
                "clipboard" => config.mirror_clipboard = true,
                "noclipboard" => config.mirror_clipboard = false,
                other => match other.split_once('=') {
                    Some((key, value)) => Self::apply_value(line_no, key.trim(), value.trim(), config),
                    None => log::warn!("line {line_no}: unknown setting '{other}'"),
                },
            }
        } else if let Some((key, value)) = line.split_once('=') {
            Self::apply_value(line_no, key.trim(), value.trim(), config);
        } else {
            log::warn!("line {line_no}: ignoring '{line}'");
        }
        Ok(())
    }

    fn apply_value(line_no: usize, key: &str, value: &str, config: &mut RcConfig) {
        let flag = || matches!(value, "true" | "1" | "yes");
        match key {
            "enabled" => config.enabled = flag(),
            "clipboard" | "mirror_clipboard" => config.mirror_clipboard = flag(),
            "failure_delay_ms" => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => config.failure_delay = Duration::from_millis(ms),
                _ => log::warn!("line {line_no}: invalid failure_delay_ms '{value}'"),
            },
            "flash_ms" => match value.parse::<u64>() {
                Ok(ms) if ms > 0 => config.flash_duration = Duration::from_millis(ms),
                _ => log::warn!("line {line_no}: invalid flash_ms '{value}'"),
            },
            "status_width" => match value.parse::<usize>() {
                Ok(0) => config.status_width = None,
                Ok(width) => config.status_width = Some(width),
                Err(_) => log::warn!("line {line_no}: invalid status_width '{value}'"),
            },
            "kill_ring_max" => match value.parse::<usize>() {
                Ok(max) if max > 0 => config.kill_ring_max = max,
                _ => log::warn!("line {line_no}: invalid kill_ring_max '{value}'"),
            },
            _ => log::warn!("line {line_no}: unknown setting '{key}'"),
        }
    }

    /// `bind <key sequence> <command-id>`; the last word is the command.
    fn parse_bind(line_no: usize, rest: &str, config: &mut RcConfig) -> Result<()> {
        let rest = rest.trim();
        let Some((keys, command)) = rest.rsplit_once(char::is_whitespace) else {
            return Err(EmacsError::InvalidBinding {
                line: line_no,
                message: format!("expected 'bind <keys> <command>', got '{rest}'"),
            });
        };
        let seq = Self::parse_sequence(line_no, keys.trim())?;
        config.keymap.bind(seq, command.trim());
        Ok(())
    }

    fn parse_sequence(line_no: usize, keys: &str) -> Result<KeySequence> {
        keys.parse::<KeySequence>()
            .map_err(|e| EmacsError::InvalidBinding {
                line: line_no,
                message: e.to_string(),
            })
    }

    /// Generate a sample RC file content
    pub fn generate_sample_rc() -> String {
        let mut sample = String::from(
            r#"# emacs-mode configuration file (.emacsmoderc)
# Lines starting with # are comments

set enabled            # or: set noenabled
set noclipboard        # set clipboard mirrors kills to the system clipboard

failure_delay_ms=500   # failing search exits after this long
flash_ms=2000          # status messages clear after this long
status_width=0         # 0 means no truncation
kill_ring_max=30

# Key bindings: bind <key sequence> <command>
"#,
        );
        for (seq, command) in Keymap::default().bindings() {
            sample.push_str(&format!("bind {seq} {command}\n"));
        }
        sample
    }
}

/// Loads the keymap from an RC file when the mode is enabled. Without a
/// path the default locations are searched.
#[derive(Debug, Clone, Default)]
pub struct RcKeymapSource {
    path: Option<PathBuf>,
}

impl RcKeymapSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl KeymapSource for RcKeymapSource {
    fn load(&self) -> BoxFuture<'static, Result<Keymap, EmacsError>> {
        let path = self.path.clone().or_else(RcLoader::get_rc_path);
        async move {
            match path {
                Some(path) => RcLoader::load_from(&path).map(|config| config.keymap),
                None => Ok(Keymap::default()),
            }
        }
        .boxed()
    }
}
