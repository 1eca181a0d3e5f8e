use crate::buffers::BufferId;
use crate::config::RcConfig;
use crate::controller::command::CommandTable;
use crate::controller::handler::EmacsHandler;
use crate::controller::mode::{ModeController, ModeEvent, ModeFlags};
use crate::controller::shared_state::{Editor, KeyOutcome, KeyboardHandler};
use crate::error::{EmacsError, Result};
use crate::host::{HostCall, HostServices};
use crate::keys::{Keymap, KeymapSource, StaticKeymap};
use crate::surface::EditorSurface;
use crate::timers::Clock;
use crossterm::event::KeyEvent;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

type KeymapLoad = Shared<BoxFuture<'static, Result<Keymap, EmacsError>>>;

pub type ModeListener = Arc<dyn Fn(&ModeEvent) + Send + Sync>;

struct ModeState {
    enabled: bool,
    controller: ModeController,
    handler: Option<EmacsHandler<CommandTable>>,
    loading: Option<KeymapLoad>,
    /// Bumped by `disable`; a load started before it must not install.
    generation: u64,
}

/// Host-facing handle of the Emacs key layer. Clones share one session.
#[derive(Clone)]
pub struct EmacsMode {
    state: Arc<Mutex<ModeState>>,
    source: Arc<dyn KeymapSource>,
    listeners: Arc<Mutex<Vec<ModeListener>>>,
}

impl EmacsMode {
    pub fn new(controller: ModeController, source: impl KeymapSource + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(ModeState {
                enabled: false,
                controller,
                handler: None,
                loading: None,
                generation: 0,
            })),
            source: Arc::new(source),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Settings and bindings both come from `config`.
    pub fn from_config(config: &RcConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            ModeController::from_config(config, clock),
            StaticKeymap(config.keymap.clone()),
        )
    }

    pub fn subscribe(&self, listener: impl Fn(&ModeEvent) + Send + Sync + 'static) {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Listeners run unlocked, so they may subscribe or drive the mode.
    fn emit(&self, events: Vec<ModeEvent>) {
        if events.is_empty() {
            return;
        }
        let listeners = self.listeners.lock().clone();
        for event in &events {
            for listener in listeners.iter() {
                listener(event);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading.is_some()
    }

    /// Load the keymap and attach the handler. Calls made while a load is
    /// in flight wait for that same load instead of starting another.
    pub async fn enable(&self) -> Result<()> {
        let (load, generation) = {
            let mut state = self.state.lock();
            if state.enabled {
                return Ok(());
            }
            let load = match &state.loading {
                Some(load) => load.clone(),
                None => {
                    log::info!("loading keymap");
                    let load = self.source.load().shared();
                    state.loading = Some(load.clone());
                    load
                }
            };
            (load, state.generation)
        };

        let result = load.await;

        {
            let mut state = self.state.lock();
            if state.generation != generation {
                log::debug!("disabled while the keymap was loading");
                return Ok(());
            }
            state.loading = None;
            if state.enabled {
                return Ok(());
            }
            let keymap = result?;
            log::info!("emacs mode enabled with {} bindings", keymap.len());
            state.handler = Some(EmacsHandler::wrap(CommandTable::new(keymap)));
            state.enabled = true;
        }
        self.emit(vec![ModeEvent::Enabled]);
        Ok(())
    }

    /// Detach the handler and leave every mode. Does nothing when the mode
    /// is already disabled.
    pub fn disable(&self, surface: &mut dyn EditorSurface) {
        let events = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.loading = None;
            if !state.enabled {
                return;
            }
            state.enabled = false;
            state.handler = None;
            state.controller.deactivate(surface);
            let mut events = state.controller.take_events();
            events.push(ModeEvent::Disabled);
            events
        };
        log::info!("emacs mode disabled");
        self.emit(events);
    }

    /// Returns whether the mode is enabled afterwards.
    pub async fn toggle(&self, surface: &mut dyn EditorSurface) -> Result<bool> {
        self.set_active(!self.is_enabled(), surface).await?;
        Ok(self.is_enabled())
    }

    /// Follow a persisted on/off setting.
    pub async fn set_active(&self, active: bool, surface: &mut dyn EditorSurface) -> Result<()> {
        if active {
            self.enable().await
        } else {
            self.disable(surface);
            Ok(())
        }
    }

    /// Feed one key event through the layer. Due timers fire before the key
    /// is dispatched. Host requests are delivered after the state lock is
    /// released.
    pub fn handle_key(
        &self,
        surface: &mut dyn EditorSurface,
        host: &mut dyn HostServices,
        key: &KeyEvent,
    ) -> KeyOutcome {
        let (outcome, events, calls) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some(handler) = state.handler.as_mut() else {
                return KeyOutcome::PassThrough;
            };
            state.controller.tick(surface);
            let mut editor = Editor::new(&mut state.controller, surface);
            let outcome = handler.handle_keyboard(key, &mut editor);
            let calls = editor.take_host_calls();
            (outcome, state.controller.take_events(), calls)
        };
        self.emit(events);
        deliver(host, calls);
        outcome
    }

    /// Run a command by id, as a menu item would.
    pub fn invoke(
        &self,
        surface: &mut dyn EditorSurface,
        host: &mut dyn HostServices,
        name: &str,
    ) -> Result<()> {
        let (result, events, calls) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let Some(handler) = state.handler.as_mut() else {
                return Err(EmacsError::Inactive);
            };
            let mut editor = Editor::new(&mut state.controller, surface);
            let result = handler.inner_mut().invoke(&mut editor, name);
            let calls = editor.take_host_calls();
            (result, state.controller.take_events(), calls)
        };
        self.emit(events);
        deliver(host, calls);
        result
    }

    fn with_controller<R>(&self, f: impl FnOnce(&mut ModeController) -> R) -> R {
        let (result, events) = {
            let mut state = self.state.lock();
            let result = f(&mut state.controller);
            (result, state.controller.take_events())
        };
        self.emit(events);
        result
    }

    /// Poll deferred work. Hosts call this from their event loop, at the
    /// latest by `next_deadline`.
    pub fn tick(&self, surface: &mut dyn EditorSurface) {
        self.with_controller(|c| c.tick(surface));
    }

    /// A mouse click in the editor.
    pub fn on_click(&self, surface: &mut dyn EditorSurface) {
        self.with_controller(|c| c.cancel_all_modes(surface));
    }

    /// The host switched to `to`; `surface` is the document being left.
    pub fn focus_buffer(&self, surface: &mut dyn EditorSurface, to: BufferId) {
        self.with_controller(|c| c.focus_buffer(surface, to));
    }

    pub fn close_buffer(&self, buffer: &BufferId) {
        self.with_controller(|c| c.close_buffer(buffer));
    }

    pub fn status_line(&self, caption: &str) -> String {
        self.state.lock().controller.status_line(caption)
    }

    pub fn flags(&self) -> ModeFlags {
        self.state.lock().controller.flags()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().controller.next_deadline()
    }

    /// Read-only access to the session state.
    pub fn inspect<R>(&self, f: impl FnOnce(&ModeController) -> R) -> R {
        f(&self.state.lock().controller)
    }
}

fn deliver(host: &mut dyn HostServices, calls: Vec<HostCall>) {
    for call in calls {
        log::debug!("host request {call:?}");
        call.send_to(host);
    }
}
