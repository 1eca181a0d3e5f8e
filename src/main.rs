use anyhow::Context;
use clap::Parser;
use emacs_mode::buffers::BufferId;
use emacs_mode::config::{RcKeymapSource, RcLoader};
use emacs_mode::controller::{EmacsMode, KeyOutcome, ModeController};
use emacs_mode::host::RecordingHost;
use emacs_mode::keys::KeySequence;
use emacs_mode::surface::{EditorSurface, MemorySurface};
use emacs_mode::timers::ManualClock;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "emacs-mode")]
#[command(version, about = "Replay Emacs-style key sequences against a file", long_about = None)]
struct Cli {
    /// File to load into the in-memory editor
    file: Option<PathBuf>,

    /// Keys to replay, e.g. "C-s f o o C-g"
    #[arg(long, short, value_name = "KEYS", default_value = "")]
    keys: String,

    /// RC file to use instead of ./.emacsmoderc or ~/.emacsmoderc
    #[arg(long, value_name = "PATH")]
    rc: Option<PathBuf>,

    /// Log level for stderr (off, error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Virtual time that passes after each key
    #[arg(long, value_name = "MS", default_value_t = 100)]
    step_ms: u64,

    /// Print a sample RC file and exit
    #[arg(long)]
    sample_rc: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    emacs_mode::debug::init_log_bridge(cli.log_level.as_deref());

    if cli.sample_rc {
        print!("{}", RcLoader::generate_sample_rc());
        return Ok(());
    }

    let config = match &cli.rc {
        Some(path) => RcLoader::load_from(path)?,
        None => RcLoader::load_config(),
    };

    let text = match &cli.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => String::new(),
    };
    let buffer = cli
        .file
        .as_ref()
        .map(|p| BufferId::new(p.display().to_string()))
        .unwrap_or_else(|| BufferId::new("*scratch*"));

    let clock = ManualClock::new();
    let controller =
        ModeController::from_config(&config, Arc::new(clock.clone())).with_buffer(buffer.clone());
    let mode = EmacsMode::new(controller, RcKeymapSource::new(cli.rc.clone()));
    let mut surface = MemorySurface::from_string(&text);
    let mut host = RecordingHost::new();
    host.open(buffer);

    futures::executor::block_on(mode.set_active(config.enabled, &mut surface))?;

    let script = if cli.keys.trim().is_empty() {
        Vec::new()
    } else {
        cli.keys.parse::<KeySequence>()?.0
    };
    let step = Duration::from_millis(cli.step_ms);

    for chord in script {
        let event = chord.to_event();
        match mode.handle_key(&mut surface, &mut host, &event) {
            KeyOutcome::PassThrough => {
                if !surface.apply_native(&event) {
                    log::debug!("{chord} ignored");
                }
            }
            outcome => log::debug!("{chord} -> {outcome:?}"),
        }
        clock.advance(step);
        mode.tick(&mut surface);
    }

    let flags = mode.flags();
    println!("{}", surface.text());
    println!("---");
    println!("cursor: {}", surface.cursor_position());
    println!("searching: {}, killing: {}", flags.searching, flags.killing);
    println!("status: {}", mode.status_line(""));
    for call in host.calls() {
        println!("host: {call:?}");
    }
    Ok(())
}
