//! # timekeep Core Library
//!
//! Core logic for timekeep, a collection of ten timers (stopwatch,
//! countdown, interval, Pomodoro, egg, bomb, meditation, basketball, hockey
//! and presentation) that keep counting while nothing is watching them.
//! The `timekeep` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a state container with one timer per kind, driven by
//!   commands and wall-clock `tick(delta)` calls that return events
//! - **Snapshot / Runtime**: persists the engine with a timestamp and
//!   fast-forwards running timers by the real time that passed
//! - **Storage**: SQLite key-value store for preferences, history and stats;
//!   TOML configuration
//! - **Feedback**: synthesized tones and desktop notifications as side
//!   effects of events
//! - **Worker**: background task that notifies on completion while the
//!   foreground is hidden, plus the offline asset cache
//! - **API**: mock HTTP endpoints for timer states
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: per-kind timer state and operations
//! - [`Runtime`]: owner of the engine and its side effects
//! - [`Store`]: preferences, history and stats
//! - [`Config`]: application configuration

pub mod api;
pub mod audio;
pub mod error;
pub mod events;
pub mod notify;
pub mod routes;
pub mod runtime;
pub mod storage;
pub mod timer;
pub mod view;
pub mod worker;

pub use audio::{AudioEngine, Pattern, Sound};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use notify::{Notification, NotificationBridge, Permission};
pub use routes::Route;
pub use runtime::{Input, Runtime, Visibility};
pub use storage::{Config, Database, HistoryEntry, Preferences, Store, UserStats};
pub use timer::{Command, Snapshot, Timer, TimerConfig, TimerEngine, TimerKind};
