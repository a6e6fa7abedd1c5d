//! Desktop notifications with permission handling and message templates.
//!
//! The bridge asks its backend for permission once and caches the answer.
//! A notification is shown only when the user has notifications enabled and
//! permission was granted; anything else drops it silently.

use std::process::Command;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::events::Event;
use crate::timer::{Phase, SessionType, TimerKind};

const APP_NAME: &str = "timekeep";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    #[default]
    Default,
    Granted,
    Denied,
    /// No notification mechanism on this system.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationAction {
    Dismiss,
    View,
}

impl NotificationAction {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationAction::Dismiss => "Dismiss",
            NotificationAction::View => "View",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: Option<String>,
    pub badge: Option<String>,
    /// Notifications sharing a tag replace each other.
    pub tag: Option<String>,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }

    pub fn require_interaction(mut self) -> Self {
        self.require_interaction = true;
        self
    }

    pub fn with_actions(mut self, actions: &[NotificationAction]) -> Self {
        self.actions = actions.to_vec();
        self
    }
}

/// Templates
impl Notification {
    pub fn timer_complete(kind: TimerKind) -> Self {
        Self::new(
            format!("{} finished", kind.label()),
            format!("Your {} is done.", kind.label().to_lowercase()),
        )
        .with_tag(format!("timer-{kind}"))
        .require_interaction()
        .with_actions(&[NotificationAction::View, NotificationAction::Dismiss])
    }

    pub fn pomodoro_session(next: SessionType) -> Self {
        let (title, body) = match next {
            SessionType::Work => ("Break over", "Time to focus on the next session."),
            SessionType::ShortBreak => ("Work session complete", "Take a short break."),
            SessionType::LongBreak => ("Work session complete", "Great work! Take a longer break."),
        };
        Self::new(title, body)
            .with_tag("pomodoro")
            .with_actions(&[NotificationAction::View, NotificationAction::Dismiss])
    }

    pub fn interval_phase(is_work: bool, cycle: u32) -> Self {
        let title = if is_work { "Work!" } else { "Rest" };
        Self::new(title, format!("Cycle {cycle}")).with_tag("interval")
    }

    /// Template for an engine event, if the event warrants one.
    pub fn for_event(event: &Event) -> Option<Self> {
        match event {
            Event::TimerCompleted { kind, .. } if *kind != TimerKind::Bomb => {
                Some(Self::timer_complete(*kind))
            }
            Event::BombExploded { .. } => Some(
                Self::new("Boom!", "The bomb exploded.")
                    .with_tag("timer-bomb")
                    .require_interaction(),
            ),
            Event::PomodoroSessionCompleted { next, .. } => Some(Self::pomodoro_session(*next)),
            Event::PhaseChanged {
                kind: TimerKind::Interval,
                phase,
                cycle,
                ..
            } => Some(Self::interval_phase(*phase == Phase::Work, *cycle)),
            _ => None,
        }
    }
}

/// Something that can display notifications.
pub trait NotificationBackend: Send {
    fn request_permission(&mut self) -> Permission;
    fn show(&mut self, notification: &Notification) -> std::io::Result<()>;
}

/// Desktop notifications through `notify-send` (Linux) or `osascript`
/// (macOS).
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopBackend;

impl DesktopBackend {
    fn program() -> &'static str {
        if cfg!(target_os = "macos") {
            "osascript"
        } else {
            "notify-send"
        }
    }

    fn command_exists(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl NotificationBackend for DesktopBackend {
    fn request_permission(&mut self) -> Permission {
        if Self::command_exists(Self::program()) {
            Permission::Granted
        } else {
            Permission::Unsupported
        }
    }

    fn show(&mut self, notification: &Notification) -> std::io::Result<()> {
        let status = if cfg!(target_os = "macos") {
            let title = notification.title.replace('"', r#"\""#);
            let body = notification.body.replace('"', r#"\""#);
            let script = format!(r#"display notification "{body}" with title "{title}""#);
            Command::new("osascript").args(["-e", &script]).status()?
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.args(["--app-name", APP_NAME]);
            if let Some(icon) = &notification.icon {
                cmd.args(["--icon", icon]);
            }
            if notification.require_interaction {
                cmd.args(["--urgency", "critical"]);
            }
            cmd.args([&notification.title, &notification.body]);
            cmd.status()?
        };
        if !status.success() {
            return Err(std::io::Error::other(format!(
                "{} exited with {status}",
                Self::program()
            )));
        }
        Ok(())
    }
}

/// Backend for systems without notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl NotificationBackend for NullBackend {
    fn request_permission(&mut self) -> Permission {
        Permission::Unsupported
    }

    fn show(&mut self, _notification: &Notification) -> std::io::Result<()> {
        Ok(())
    }
}

/// Keeps shown notifications in memory. Clones share the same log.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    answer: Permission,
    asked: Arc<Mutex<u32>>,
    shown: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingBackend {
    /// A backend that answers permission requests with `answer`.
    pub fn new(answer: Permission) -> Self {
        Self {
            answer,
            asked: Arc::default(),
            shown: Arc::default(),
        }
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn times_asked(&self) -> u32 {
        self.asked.lock().map(|n| *n).unwrap_or_default()
    }
}

impl NotificationBackend for RecordingBackend {
    fn request_permission(&mut self) -> Permission {
        if let Ok(mut asked) = self.asked.lock() {
            *asked += 1;
        }
        self.answer
    }

    fn show(&mut self, notification: &Notification) -> std::io::Result<()> {
        self.shown
            .lock()
            .map_err(|_| std::io::Error::other("recording backend poisoned"))?
            .push(notification.clone());
        Ok(())
    }
}

pub struct NotificationBridge {
    backend: Box<dyn NotificationBackend>,
    permission: Permission,
    enabled: bool,
    icon: Option<String>,
    badge: Option<String>,
}

impl NotificationBridge {
    pub fn new(backend: Box<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            permission: Permission::Default,
            enabled: true,
            icon: None,
            badge: None,
        }
    }

    /// Icon and badge applied to notifications that set neither.
    pub fn with_branding(mut self, icon: Option<String>, badge: Option<String>) -> Self {
        self.icon = icon;
        self.badge = badge;
        self
    }

    pub fn permission(&self) -> Permission {
        self.permission
    }

    /// Ask the backend once; later calls return the cached answer.
    pub fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = self.backend.request_permission();
            debug!(permission = ?self.permission, "notification permission");
        }
        self.permission
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Show a notification. Returns whether it was handed to the backend.
    pub fn send(&mut self, mut notification: Notification) -> bool {
        if !self.enabled || self.permission != Permission::Granted {
            return false;
        }
        if notification.icon.is_none() {
            notification.icon = self.icon.clone();
        }
        if notification.badge.is_none() {
            notification.badge = self.badge.clone();
        }
        match self.backend.show(&notification) {
            Ok(()) => true,
            Err(e) => {
                warn!(title = %notification.title, "notification failed: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn permission_is_asked_once() {
        let backend = RecordingBackend::new(Permission::Granted);
        let mut bridge = NotificationBridge::new(Box::new(backend.clone()));
        assert_eq!(bridge.permission(), Permission::Default);
        bridge.request_permission();
        bridge.request_permission();
        assert_eq!(backend.times_asked(), 1);
        assert_eq!(bridge.permission(), Permission::Granted);
    }

    #[test]
    fn send_requires_permission_and_preference() {
        let backend = RecordingBackend::new(Permission::Granted);
        let mut bridge = NotificationBridge::new(Box::new(backend.clone()))
            .with_branding(Some("icon.png".into()), None);
        assert!(!bridge.send(Notification::new("a", "b")));

        bridge.request_permission();
        bridge.set_enabled(false);
        assert!(!bridge.send(Notification::new("a", "b")));

        bridge.set_enabled(true);
        assert!(bridge.send(Notification::timer_complete(TimerKind::Egg)));
        let shown = backend.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].icon.as_deref(), Some("icon.png"));
        assert_eq!(shown[0].tag.as_deref(), Some("timer-egg"));
    }

    #[test]
    fn denied_drops_silently() {
        let backend = RecordingBackend::new(Permission::Denied);
        let mut bridge = NotificationBridge::new(Box::new(backend.clone()));
        bridge.request_permission();
        assert!(!bridge.send(Notification::new("a", "b")));
        assert!(backend.shown().is_empty());

        let mut null = NotificationBridge::new(Box::new(NullBackend));
        assert_eq!(null.request_permission(), Permission::Unsupported);
    }

    #[test]
    fn templates_for_events() {
        let phase = Event::PhaseChanged {
            kind: TimerKind::Interval,
            phase: Phase::Rest,
            cycle: 2,
            remaining_ms: 10_000,
            at: Utc::now(),
        };
        let n = Notification::for_event(&phase).unwrap();
        assert_eq!(n.title, "Rest");
        assert_eq!(n.body, "Cycle 2");

        let pomodoro = Event::PomodoroSessionCompleted {
            session: 4,
            session_type: SessionType::Work,
            next: SessionType::LongBreak,
            at: Utc::now(),
        };
        assert!(Notification::for_event(&pomodoro)
            .unwrap()
            .body
            .contains("longer break"));

        let started = Event::TimerStarted {
            kind: TimerKind::Egg,
            time_ms: 1,
            at: Utc::now(),
        };
        assert!(Notification::for_event(&started).is_none());
    }
}
