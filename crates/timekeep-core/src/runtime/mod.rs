//! The foreground owner of the timer engine.
//!
//! `Runtime` wires the engine to everything around it: it persists
//! snapshots, fast-forwards on load and when the foreground becomes visible
//! again, turns events into sounds, notifications and history entries, and
//! keeps the background worker informed. [`Runtime::run`] drives it from a
//! tokio select loop.

mod ticker;

pub use ticker::Ticker;

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::audio::AudioEngine;
use crate::error::CoreError;
use crate::events::Event;
use crate::notify::{
    DesktopBackend, Notification, NotificationBackend, NotificationBridge, NullBackend,
};
use crate::storage::{
    Config, EngineConfig, HistoryEntry, NotificationBackendKind, Preferences, Store,
};
use crate::timer::{Command, Snapshot, Timer, TimerEngine, TimerKind};
use crate::worker::{BackgroundWorker, PageMessage, WorkerHandle, WorkerMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Input to [`Runtime::run`].
#[derive(Debug, Clone)]
pub enum Input {
    Command(Command),
    Visibility(Visibility),
    Shutdown,
}

pub struct Runtime {
    engine: TimerEngine,
    store: Store,
    audio: AudioEngine,
    notifications: NotificationBridge,
    worker: Option<WorkerHandle>,
    settings: EngineConfig,
    visibility: Visibility,
    ticks_since_save: u32,
    since_push_ms: u64,
    observer: watch::Sender<TimerEngine>,
}

fn backend_for(kind: NotificationBackendKind) -> Box<dyn NotificationBackend> {
    match kind {
        NotificationBackendKind::Desktop => Box::new(DesktopBackend),
        NotificationBackendKind::None => Box::new(NullBackend),
    }
}

impl Runtime {
    pub fn new(
        store: Store,
        audio: AudioEngine,
        notifications: NotificationBridge,
        settings: EngineConfig,
    ) -> Self {
        let (observer, _) = watch::channel(TimerEngine::default());
        let mut runtime = Self {
            engine: TimerEngine::default(),
            store,
            audio,
            notifications,
            worker: None,
            settings,
            visibility: Visibility::Visible,
            ticks_since_save: 0,
            since_push_ms: 0,
            observer,
        };
        let prefs = runtime.store.preferences();
        runtime.apply_preferences(&prefs);
        runtime
    }

    /// Build from the application config: device audio with its
    /// fallbacks, the configured notification backend, and the given store.
    pub fn from_config(config: &Config, store: Store) -> Self {
        let audio = AudioEngine::from_config(&config.audio);
        let notifications = NotificationBridge::new(backend_for(config.notifications.backend))
            .with_branding(
                config.notifications.icon.clone(),
                config.notifications.badge.clone(),
            );
        Self::new(store, audio, notifications, config.engine.clone())
    }

    /// Spawn a background worker using the configured notification backend.
    /// Must be called inside a tokio runtime.
    pub fn spawn_worker(&mut self, config: &Config) -> mpsc::UnboundedReceiver<PageMessage> {
        let bridge = NotificationBridge::new(backend_for(config.notifications.backend))
            .with_branding(
                config.notifications.icon.clone(),
                config.notifications.badge.clone(),
            );
        let (handle, replies) = WorkerHandle::spawn(BackgroundWorker::new(bridge));
        handle.post(WorkerMessage::SkipWaiting);
        self.worker = Some(handle);
        replies
    }

    pub fn attach_worker(&mut self, handle: WorkerHandle) {
        self.worker = Some(handle);
    }

    pub fn apply_preferences(&mut self, prefs: &Preferences) {
        self.audio.set_enabled(prefs.audio_enabled);
        self.audio.set_volume(prefs.volume);
        self.notifications.set_enabled(prefs.notifications_enabled);
        if prefs.notifications_enabled {
            self.notifications.request_permission();
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Watch the engine state after every change.
    pub fn subscribe(&self) -> watch::Receiver<TimerEngine> {
        self.observer.subscribe()
    }

    /// Restore the saved snapshot, fast-forwarded to `now`. Keeps the
    /// in-memory state when there is nothing usable on disk.
    pub fn load(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let Some(snapshot) = Snapshot::load(self.store.db()) else {
            debug!("no saved timers");
            return Vec::new();
        };
        let (engine, events) = snapshot.restore(now);
        self.engine = engine;
        info!(running = ?self.engine.running_kind(), "restored timers");
        self.after_change(&events);
        self.save();
        events
    }

    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let events = self.engine.dispatch(command);
        self.after_change(&events);
        self.save();
        events
    }

    pub fn tick(&mut self, delta_ms: u64) -> Vec<Event> {
        let events = self.engine.tick(delta_ms);
        self.after_change(&events);

        self.ticks_since_save += 1;
        if !events.is_empty() || self.ticks_since_save >= self.settings.save_every_ticks {
            self.save();
        }

        if self.visibility == Visibility::Hidden && self.engine.any_running() {
            self.since_push_ms += delta_ms;
            if self.since_push_ms >= self.settings.background_push_interval_ms {
                self.since_push_ms = 0;
                self.push_states();
            }
        }
        events
    }

    /// Hidden saves and tells the worker; visible tells the worker and
    /// reconciles with the saved snapshot.
    pub fn set_visibility(&mut self, visibility: Visibility, now: DateTime<Utc>) -> Vec<Event> {
        if visibility == self.visibility {
            return Vec::new();
        }
        self.visibility = visibility;
        self.since_push_ms = 0;
        match visibility {
            Visibility::Hidden => {
                self.save();
                self.post(WorkerMessage::TabHidden);
                Vec::new()
            }
            Visibility::Visible => {
                self.post(WorkerMessage::TabVisible);
                self.load(now)
            }
        }
    }

    pub fn handle_page_message(&mut self, message: PageMessage) {
        match message {
            PageMessage::GetTimerStates => self.push_states(),
        }
    }

    /// Write the snapshot. Failures are logged.
    pub fn save(&mut self) {
        self.ticks_since_save = 0;
        if let Err(e) = Snapshot::capture(&self.engine, Utc::now()).save(self.store.db()) {
            warn!("failed to save timer snapshot: {e}");
        }
    }

    fn push_states(&self) {
        let snapshot = Snapshot::capture(&self.engine, Utc::now());
        self.post(WorkerMessage::TimerStates { snapshot });
    }

    fn post(&self, message: WorkerMessage) {
        if let Some(worker) = &self.worker {
            if !worker.post(message) {
                debug!("background worker is gone");
            }
        }
    }

    fn after_change(&mut self, events: &[Event]) {
        self.handle_events(events);
        self.observer.send_replace(self.engine.clone());
    }

    fn sound_enabled_for(&self, kind: TimerKind) -> bool {
        match self.engine.get(kind) {
            Some(Timer::Meditation(m)) => m.sound_enabled,
            _ => true,
        }
    }

    /// Side effects of engine events: sound, notification, history, and
    /// the worker's copy of terminal events.
    fn handle_events(&mut self, events: &[Event]) {
        let mut forwarded = HashSet::new();
        for event in events {
            if self.sound_enabled_for(event.kind()) {
                if let Some(cue) = AudioEngine::cue_for(event) {
                    self.audio.play(cue);
                }
            }

            if self.visibility == Visibility::Visible {
                if let Some(notification) = Notification::for_event(event) {
                    self.notifications.send(notification);
                }
            }

            if let Some(entry) = HistoryEntry::from_event(event) {
                if let Err(e) = self.store.add_history_entry(entry) {
                    warn!("failed to record history: {e}");
                }
            }

            if event.is_terminal() && forwarded.insert(event.kind()) {
                self.post(WorkerMessage::TimerCompleted {
                    event: event.clone(),
                });
            }
        }
    }

    fn sync_ticker(&self, ticker: &mut Ticker) {
        if self.engine.any_running() {
            ticker.start();
        } else {
            ticker.stop();
        }
    }

    /// Drive the runtime until `Input::Shutdown` or the input channel
    /// closes. The ticker only runs while some timer does.
    pub async fn run(
        mut self,
        mut inputs: mpsc::Receiver<Input>,
        mut page: Option<mpsc::UnboundedReceiver<PageMessage>>,
    ) -> Self {
        let mut ticker = Ticker::new(Duration::from_millis(self.settings.tick_interval_ms));
        self.sync_ticker(&mut ticker);

        loop {
            tokio::select! {
                Some(delta) = ticker.next(), if ticker.is_ticking() => {
                    self.tick(delta);
                }
                input = inputs.recv() => match input {
                    Some(Input::Command(command)) => {
                        self.apply(command);
                    }
                    Some(Input::Visibility(visibility)) => {
                        self.set_visibility(visibility, Utc::now());
                    }
                    Some(Input::Shutdown) | None => break,
                },
                message = recv_page(&mut page) => match message {
                    Some(message) => self.handle_page_message(message),
                    None => page = None,
                },
            }
            self.sync_ticker(&mut ticker);
        }

        self.save();
        if let Some(worker) = self.worker.take() {
            worker.shutdown().await;
        }
        info!("runtime stopped");
        self
    }

    pub fn into_store(self) -> Store {
        self.store
    }
}

async fn recv_page(page: &mut Option<mpsc::UnboundedReceiver<PageMessage>>) -> Option<PageMessage> {
    match page {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Runtime {
    /// Open the default store and build a runtime from `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &Config) -> Result<Self, CoreError> {
        Ok(Self::from_config(config, Store::open()?))
    }
}
