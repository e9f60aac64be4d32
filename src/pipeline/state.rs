//! Session state and its reducer.
//!
//! The orchestrator owns the only [`Session`] and changes it exclusively
//! through [`Session::apply`].  The UI sees immutable [`SessionSnapshot`]s
//! published over a `tokio::sync::watch` channel.
//!
//! ```text
//! Initializing ──▶ Idle ──select_task──▶ Capturing ──▶ AwaitingAnalysis ──▶ Speaking ──▶ Idle
//!                   │                         ▲
//!                   ├──FindShop──▶ Speaking(prompt) ──▶ ListeningForSubQuery ┘
//!                   └──start_listening──▶ ListeningForCommand ──▶ Idle ──▶ (dispatch)
//! any failure ──▶ Error ──(message spoken)──▶ Idle
//! ```

use crate::locale::Locale;
use crate::location::Coordinates;
use crate::task::Task;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Initializing,
    Idle,
    Capturing,
    AwaitingAnalysis,
    Speaking,
    ListeningForCommand,
    ListeningForSubQuery,
    /// Transient: the failure message is being presented.
    Error,
}

impl Phase {
    /// Every phase but `Idle` blocks new actions.
    ///
    /// ```
    /// use sight_assist::pipeline::Phase;
    ///
    /// assert!(!Phase::Idle.is_busy());
    /// assert!(Phase::Speaking.is_busy());
    /// assert!(Phase::Initializing.is_busy());
    /// ```
    pub fn is_busy(self) -> bool {
        self != Phase::Idle
    }

    pub fn is_listening(self) -> bool {
        matches!(self, Phase::ListeningForCommand | Phase::ListeningForSubQuery)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Initializing => "Initializing",
            Phase::Idle => "Idle",
            Phase::Capturing => "Capturing",
            Phase::AwaitingAnalysis => "Analyzing",
            Phase::Speaking => "Speaking",
            Phase::ListeningForCommand => "Listening",
            Phase::ListeningForSubQuery => "Listening",
            Phase::Error => "Error",
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Initializing,
    /// Idle with the locale's "ready" text; clears the last error.
    Ready,
    /// Idle, keeping the current status text (e.g. a description or error).
    Settled,
    Capturing(Task),
    AwaitingAnalysis,
    /// Speaking a fixed locale line (prompt, welcome).
    Announcing(&'static str),
    /// Speaking an analysis result.
    Described(String),
    ListeningForCommand,
    ListeningForSubQuery(Task),
    Failed(String),
    Locating,
    Located(Coordinates),
    LocaleChanged(&'static Locale),
    MockModeChanged(bool),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    pub locale: &'static Locale,
    pub mock_mode: bool,
    pub phase: Phase,
    /// Never empty.
    pub status: String,
    pub last_error: Option<String>,
    /// Set only while in `ListeningForSubQuery`.
    pub pending_sub_dialog: Option<Task>,
    pub active_task: Option<Task>,
    pub last_description: Option<String>,
    pub location: Option<Coordinates>,
    pub locating: bool,
}

impl Session {
    pub fn new(locale: &'static Locale, mock_mode: bool) -> Self {
        Self {
            locale,
            mock_mode,
            phase: Phase::Initializing,
            status: locale.status.initializing.to_string(),
            last_error: None,
            pending_sub_dialog: None,
            active_task: None,
            last_description: None,
            location: None,
            locating: false,
        }
    }

    /// Busy flag consulted by every guarded operation.
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy() || self.locating
    }

    pub fn apply(&mut self, event: SessionEvent) {
        let current: &'static Locale = self.locale;
        let status = &current.status;
        match event {
            SessionEvent::Initializing => {
                self.set_phase(Phase::Initializing);
                self.status = status.initializing.to_string();
            }
            SessionEvent::Ready => {
                self.set_phase(Phase::Idle);
                self.status = status.ready.to_string();
                self.last_error = None;
                self.active_task = None;
            }
            SessionEvent::Settled => {
                self.set_phase(Phase::Idle);
                self.active_task = None;
            }
            SessionEvent::Capturing(task) => {
                self.set_phase(Phase::Capturing);
                self.status = status.processing.to_string();
                self.last_error = None;
                self.active_task = Some(task);
            }
            SessionEvent::AwaitingAnalysis => self.set_phase(Phase::AwaitingAnalysis),
            SessionEvent::Announcing(line) => {
                self.set_phase(Phase::Speaking);
                self.status = line.to_string();
            }
            SessionEvent::Described(text) => {
                self.set_phase(Phase::Speaking);
                self.status = text.clone();
                self.last_description = Some(text);
            }
            SessionEvent::ListeningForCommand => {
                self.set_phase(Phase::ListeningForCommand);
                self.status = status.listening.to_string();
                self.last_error = None;
            }
            SessionEvent::ListeningForSubQuery(task) => {
                self.set_phase(Phase::ListeningForSubQuery);
                self.status = status.listening.to_string();
                self.pending_sub_dialog = Some(task);
                self.active_task = Some(task);
            }
            SessionEvent::Failed(message) => {
                self.set_phase(Phase::Error);
                self.locating = false;
                self.status = message.clone();
                self.last_error = Some(message);
            }
            SessionEvent::Locating => {
                self.locating = true;
                self.status = status.acquiring_location.to_string();
            }
            SessionEvent::Located(coordinates) => {
                self.locating = false;
                self.location = Some(coordinates);
            }
            SessionEvent::LocaleChanged(locale) => {
                if let Some(line) = translate_status(&self.status, current, locale) {
                    self.status = line.to_string();
                }
                self.locale = locale;
            }
            SessionEvent::MockModeChanged(enabled) => self.mock_mode = enabled,
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if phase != Phase::ListeningForSubQuery {
            self.pending_sub_dialog = None;
        }
        self.phase = phase;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            locale: self.locale,
            mock_mode: self.mock_mode,
            phase: self.phase,
            busy: self.is_busy(),
            status: self.status.clone(),
            last_error: self.last_error.clone(),
            active_task: self.active_task,
            last_description: self.last_description.clone(),
            location: self.location,
        }
    }
}

/// The `to` rendering of `line` when it is one of `from`'s fixed status
/// lines.  Descriptions and error messages yield `None`.
fn translate_status(line: &str, from: &Locale, to: &'static Locale) -> Option<&'static str> {
    let (a, b) = (&from.status, &to.status);
    [
        (a.initializing, b.initializing),
        (a.ready, b.ready),
        (a.processing, b.processing),
        (a.listening, b.listening),
        (a.acquiring_location, b.acquiring_location),
        (a.shop_prompt, b.shop_prompt),
        (a.welcome, b.welcome),
    ]
    .into_iter()
    .find(|(old, _)| *old == line)
    .map(|(_, new)| new)
}

/// Read-only view for the UI.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub locale: &'static Locale,
    pub mock_mode: bool,
    pub phase: Phase,
    pub busy: bool,
    pub status: String,
    pub last_error: Option<String>,
    pub active_task: Option<Task>,
    pub last_description: Option<String>,
    pub location: Option<Coordinates>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale;

    fn ready_session() -> Session {
        let mut s = Session::new(locale::default_locale(), false);
        s.apply(SessionEvent::Ready);
        s
    }

    #[test]
    fn starts_initializing_and_busy() {
        let s = Session::new(locale::default_locale(), false);
        assert_eq!(s.phase, Phase::Initializing);
        assert!(s.is_busy());
        assert_eq!(s.status, locale::default_locale().status.initializing);
    }

    #[test]
    fn pending_sub_dialog_only_while_listening_for_it() {
        let mut s = ready_session();
        s.apply(SessionEvent::ListeningForSubQuery(Task::FindShop));
        assert_eq!(s.pending_sub_dialog, Some(Task::FindShop));

        s.apply(SessionEvent::Capturing(Task::FindShop));
        assert_eq!(s.pending_sub_dialog, None);

        s.apply(SessionEvent::ListeningForSubQuery(Task::FindShop));
        s.apply(SessionEvent::Failed("no speech".into()));
        assert_eq!(s.pending_sub_dialog, None);
    }

    #[test]
    fn failure_then_settle_keeps_error_text_but_is_idle() {
        let mut s = ready_session();
        s.apply(SessionEvent::Capturing(Task::Explore));
        s.apply(SessionEvent::Failed("camera not ready".into()));
        assert_eq!(s.phase, Phase::Error);
        assert!(s.is_busy());

        s.apply(SessionEvent::Settled);
        assert_eq!(s.phase, Phase::Idle);
        assert!(!s.is_busy());
        assert_eq!(s.status, "camera not ready");
        assert_eq!(s.last_error.as_deref(), Some("camera not ready"));

        s.apply(SessionEvent::Capturing(Task::Explore));
        assert!(s.last_error.is_none());
    }

    #[test]
    fn description_becomes_status_and_is_remembered() {
        let mut s = ready_session();
        s.apply(SessionEvent::Described("A bench on your left.".into()));
        s.apply(SessionEvent::Settled);
        assert_eq!(s.status, "A bench on your left.");
        assert_eq!(s.last_description.as_deref(), Some("A bench on your left."));
    }

    #[test]
    fn locating_marks_busy_until_resolved() {
        let mut s = ready_session();
        s.apply(SessionEvent::Locating);
        assert!(s.is_busy());
        assert_eq!(s.phase, Phase::Idle);

        s.apply(SessionEvent::Located(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
            accuracy_m: None,
        }));
        assert!(!s.is_busy());
        assert!(s.location.is_some());
    }

    #[test]
    fn locale_change_translates_ready_status() {
        let mut s = ready_session();
        let es = locale::find("es-ES").unwrap();
        s.apply(SessionEvent::LocaleChanged(es));
        assert_eq!(s.locale.code, "es-ES");
        assert_eq!(s.status, es.status.ready);
    }

    #[test]
    fn locale_change_keeps_failure_visible() {
        let mut s = ready_session();
        s.apply(SessionEvent::Capturing(Task::Explore));
        s.apply(SessionEvent::Failed("camera not ready".into()));
        s.apply(SessionEvent::Settled);

        s.apply(SessionEvent::LocaleChanged(locale::find("th-TH").unwrap()));

        assert_eq!(s.locale.code, "th-TH");
        assert_eq!(s.status, "camera not ready");
        assert_eq!(s.last_error.as_deref(), Some("camera not ready"));
    }

    #[test]
    fn locale_change_keeps_description_and_translates_fixed_lines() {
        let mut s = ready_session();
        s.apply(SessionEvent::Described("A bench on your left.".into()));
        s.apply(SessionEvent::Settled);
        let es = locale::find("es-ES").unwrap();
        s.apply(SessionEvent::LocaleChanged(es));
        assert_eq!(s.status, "A bench on your left.");

        s.apply(SessionEvent::ListeningForCommand);
        let th = locale::find("th-TH").unwrap();
        s.apply(SessionEvent::LocaleChanged(th));
        assert_eq!(s.status, th.status.listening);
    }

    #[test]
    fn snapshot_reflects_busy_flag() {
        let mut s = ready_session();
        assert!(!s.snapshot().busy);
        s.apply(SessionEvent::ListeningForCommand);
        let snap = s.snapshot();
        assert!(snap.busy);
        assert!(snap.phase.is_listening());
        assert!(!snap.status.is_empty());
    }
}
