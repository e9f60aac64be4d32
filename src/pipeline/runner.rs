//! The orchestrator: sequences capture → analysis → speech, the voice
//! command flow and the shop sub-dialog, one action at a time.
//!
//! [`Orchestrator`] owns the [`Session`] and responds to [`Command`]s
//! received over a `tokio::sync::mpsc` channel.  Each action runs to
//! completion before the next command is taken; commands for actions that
//! piled up meanwhile are discarded, since the busy guard would have
//! rejected them.
//!
//! ```text
//! SelectTask(task)
//!   └─▶ [FindShop] speak prompt ─▶ listen ─▶ query
//!   └─▶ capture ─▶ analyze ─▶ speak ─▶ Idle
//! StartListening
//!   └─▶ listen ─▶ resolve transcript ─▶ SelectTask
//! any failure ─▶ Error ─▶ speak message ─▶ Idle
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::analysis::{AnalysisClient, AnalysisReply, AnalysisRequest};
use crate::camera::{CaptureError, CaptureProvider};
use crate::config::Preferences;
use crate::locale::{self, VoiceCommandResolver};
use crate::location::LocationProvider;
use crate::speech::{SpeechInput, SpeechOutput, SpeechOutputError};
use crate::task::Task;

use super::state::{Session, SessionEvent, SessionSnapshot};

// ---------------------------------------------------------------------------
// Wiring types
// ---------------------------------------------------------------------------

/// The external collaborators, bound once at startup.
///
/// Each field holds either a working adapter or the matching
/// `Unsupported*`/`Unavailable*` variant; the orchestrator never checks
/// which.
#[derive(Clone)]
pub struct Providers {
    pub camera: Arc<dyn CaptureProvider>,
    pub speech_out: Arc<dyn SpeechOutput>,
    pub speech_in: Arc<dyn SpeechInput>,
    pub location: Arc<dyn LocationProvider>,
}

/// Requests from the UI and hotkeys.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectTask(Task),
    StartListening,
    Locate,
    SetLocale(String),
    SetMockMode(bool),
}

impl Command {
    /// Actions are subject to the busy guard; preference changes are not.
    pub fn is_action(&self) -> bool {
        !matches!(self, Command::SetLocale(_) | Command::SetMockMode(_))
    }
}

/// Outcome of a guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Accepted,
    /// Another action was in progress; nothing happened.
    Rejected,
}

/// What [`Orchestrator::bootstrap`] does before reporting ready.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Camera initialisation failure to surface once.
    pub camera_error: Option<CaptureError>,
    pub locate: bool,
    pub speak_welcome: bool,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Single owner of the [`Session`].  Every state change goes through
/// [`Session::apply`] and is published to the `watch` receiver returned by
/// [`Orchestrator::new`].
pub struct Orchestrator {
    session: Session,
    providers: Providers,
    analysis: AnalysisClient,
    resolver: VoiceCommandResolver,
    prefs_path: Option<PathBuf>,
    updates: watch::Sender<SessionSnapshot>,
}

impl Orchestrator {
    /// Create the orchestrator and the receiver the UI reads snapshots from.
    ///
    /// # Arguments
    ///
    /// * `prefs` - initial locale and mock mode.  An unknown locale code
    ///   falls back to the default locale.
    /// * `prefs_path` - where locale / mock-mode changes are saved; `None`
    ///   keeps them in memory only.
    ///
    /// The session starts in `Initializing`; call [`bootstrap`](Self::bootstrap)
    /// before [`run`](Self::run).
    pub fn new(
        providers: Providers,
        analysis: AnalysisClient,
        prefs: &Preferences,
        prefs_path: Option<PathBuf>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let session = Session::new(locale::find_or_default(&prefs.locale), prefs.mock_mode);
        let (updates, rx) = watch::channel(session.snapshot());
        (
            Self {
                session,
                providers,
                analysis,
                resolver: VoiceCommandResolver::new(),
                prefs_path,
                updates,
            },
            rx,
        )
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Process commands until every sender is dropped.
    ///
    /// Runs each action to completion.  Actions that queued up meanwhile
    /// are dropped; locale and mock-mode changes among them still apply.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            let was_action = command.is_action();
            self.execute(command).await;

            if was_action {
                while let Ok(queued) = commands.try_recv() {
                    if queued.is_action() {
                        log::debug!("pipeline: dropping {queued:?} queued while busy");
                    } else {
                        self.execute(queued).await;
                    }
                }
            }
        }
        log::info!("pipeline: command channel closed, orchestrator shutting down");
    }

    /// Run one command to completion.  Rejections by the busy guard are
    /// silent.
    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::SelectTask(task) => {
                self.select_task(task).await;
            }
            Command::StartListening => {
                self.start_listening().await;
            }
            Command::Locate => {
                self.locate().await;
            }
            Command::SetLocale(code) => {
                self.set_locale(&code);
            }
            Command::SetMockMode(enabled) => self.set_mock_mode(enabled),
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Startup sequence: surface a camera failure, optionally fix the
    /// location, then report ready.
    ///
    /// When either step fails the session is left `Idle` with that failure
    /// on the status line and no welcome is spoken.
    pub async fn bootstrap(&mut self, options: StartupOptions) {
        self.apply(SessionEvent::Initializing);
        let mut clean = true;

        if let Some(err) = options.camera_error {
            log::error!("pipeline: camera initialisation failed: {err}");
            self.fail(err.user_message(self.session.locale).to_string()).await;
            clean = false;
        }

        if options.locate {
            clean &= self.acquire_location().await;
        }

        if !clean {
            // Idle already, with the failure still on the status line.
            return;
        }

        if options.speak_welcome {
            let welcome = self.session.locale.status.welcome;
            self.apply(SessionEvent::Announcing(welcome));
            if let Err(e) = self.say(welcome).await {
                log::warn!("pipeline: welcome not spoken: {e}");
            }
        }
        self.apply(SessionEvent::Ready);
        log::info!("pipeline: ready ({})", self.session.locale.code);
    }

    /// Run `task`: capture a frame, analyze it and speak the answer.
    ///
    /// [`Task::FindShop`] first asks which shop and listens for the answer,
    /// which becomes the query sent with the frame.
    ///
    /// Returns [`Dispatch::Rejected`] without side effects while another
    /// action is running.  Every failure is shown and spoken, then the
    /// session settles back to `Idle`.
    pub async fn select_task(&mut self, task: Task) -> Dispatch {
        if self.session.is_busy() {
            log::debug!("pipeline: {task} rejected, busy in {:?}", self.session.phase);
            return Dispatch::Rejected;
        }
        log::info!("pipeline: task {task}");

        if task.has_sub_dialog() {
            self.run_sub_dialog(task).await;
        } else {
            self.describe(task, None).await;
        }
        Dispatch::Accepted
    }

    /// Listen for one voice command and dispatch the task it names.
    ///
    /// An aborted listen returns to `Idle` quietly; any other listening
    /// error is reported like a task failure.
    pub async fn start_listening(&mut self) -> Dispatch {
        if self.session.is_busy() {
            return Dispatch::Rejected;
        }

        self.apply(SessionEvent::ListeningForCommand);
        let lang = self.session.locale.code;
        match self.providers.speech_in.listen(lang).await {
            Ok(transcript) => {
                self.apply(SessionEvent::Settled);
                self.handle_voice_command(&transcript).await;
            }
            Err(e) if e.is_benign() => self.apply(SessionEvent::Ready),
            Err(e) => {
                let message = e.user_message(self.session.locale).to_string();
                self.fail(message).await;
            }
        }
        Dispatch::Accepted
    }

    /// Resolve `transcript` against the active locale's keywords and run the
    /// matching task.  A transcript naming no task is reported as
    /// unrecognized.
    pub async fn handle_voice_command(&mut self, transcript: &str) -> Dispatch {
        if self.session.is_busy() {
            return Dispatch::Rejected;
        }

        match self.resolver.resolve(transcript, self.session.locale) {
            Some(task) => self.select_task(task).await,
            None => {
                log::info!("pipeline: no command in {transcript:?}");
                let message = self.session.locale.status.unrecognized_command.to_string();
                self.fail(message).await;
                Dispatch::Accepted
            }
        }
    }

    /// Request a fresh position.  On success it is attached to later
    /// location-aware prompts; on failure the previous position is kept.
    pub async fn locate(&mut self) -> Dispatch {
        if self.session.is_busy() {
            return Dispatch::Rejected;
        }
        if self.acquire_location().await {
            self.apply(SessionEvent::Ready);
        }
        Dispatch::Accepted
    }

    /// Switch language.  Unknown codes leave the locale unchanged.
    pub fn set_locale(&mut self, code: &str) -> bool {
        let Some(locale) = locale::find(code) else {
            log::warn!("pipeline: unknown locale {code:?} ignored");
            return false;
        };
        self.apply(SessionEvent::LocaleChanged(locale));
        self.persist();
        true
    }

    /// Not guarded: takes effect from the next analysis.
    pub fn set_mock_mode(&mut self, enabled: bool) {
        self.apply(SessionEvent::MockModeChanged(enabled));
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Flows
    // -----------------------------------------------------------------------

    /// Ask which shop, then describe with the answer as the query.  The
    /// question is fully spoken before the microphone opens.
    async fn run_sub_dialog(&mut self, task: Task) {
        let prompt = self.session.locale.status.shop_prompt;
        self.apply(SessionEvent::Announcing(prompt));
        if let Err(e) = self.say(prompt).await {
            self.fail_speech(e).await;
            return;
        }

        self.apply(SessionEvent::ListeningForSubQuery(task));
        let lang = self.session.locale.code;
        match self.providers.speech_in.listen(lang).await {
            Ok(query) => self.describe(task, Some(query)).await,
            Err(e) if e.is_benign() => self.apply(SessionEvent::Ready),
            Err(e) => {
                let message = e.user_message(self.session.locale).to_string();
                self.fail(message).await;
            }
        }
    }

    async fn describe(&mut self, task: Task, user_query: Option<String>) {
        self.apply(SessionEvent::Capturing(task));
        let Some(frame) = self.providers.camera.capture_frame().await else {
            log::warn!("pipeline: no frame for {task}");
            let message = self.session.locale.errors.camera_not_ready.to_string();
            self.fail(message).await;
            return;
        };

        self.apply(SessionEvent::AwaitingAnalysis);
        let locale = self.session.locale;
        let request = AnalysisRequest::new(task, frame, locale, user_query, self.session.location);
        let reply = self
            .analysis
            .analyze(&request, self.session.mock_mode, locale)
            .await;

        match reply {
            AnalysisReply::Described(text) => {
                self.apply(SessionEvent::Described(text.clone()));
                match self.say(&text).await {
                    Ok(()) => self.apply(SessionEvent::Settled),
                    Err(e) => self.fail_speech(e).await,
                }
            }
            AnalysisReply::Failed { message, .. } => self.fail(message.to_string()).await,
        }
    }

    /// Returns `false` when the location request failed (already surfaced).
    async fn acquire_location(&mut self) -> bool {
        self.apply(SessionEvent::Locating);
        match self.providers.location.request_location().await {
            Ok(coordinates) => {
                log::info!(
                    "pipeline: located at {:.4}, {:.4}",
                    coordinates.latitude,
                    coordinates.longitude
                );
                self.apply(SessionEvent::Located(coordinates));
                true
            }
            Err(e) => {
                log::warn!("pipeline: location failed: {e}");
                let message = e.user_message(self.session.locale).to_string();
                self.fail(message).await;
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Error → speak the message → Idle.  A failure to speak the message is
    /// only logged.
    async fn fail(&mut self, message: String) {
        log::warn!("pipeline: {message}");
        self.apply(SessionEvent::Failed(message.clone()));
        if let Err(e) = self.say(&message).await {
            log::error!("pipeline: could not speak error message: {e}");
        }
        self.apply(SessionEvent::Settled);
    }

    async fn fail_speech(&mut self, error: SpeechOutputError) {
        log::warn!("pipeline: {error}");
        let message = error.user_message(self.session.locale).to_string();
        self.fail(message).await;
    }

    /// Speak `text` in the active locale.  Without a synthesizer the text
    /// is only displayed and this succeeds.
    async fn say(&self, text: &str) -> Result<(), SpeechOutputError> {
        match self
            .providers
            .speech_out
            .speak(text, self.session.locale.code)
            .await
        {
            Err(e) if e.is_display_only() => {
                log::debug!("pipeline: not spoken ({e})");
                Ok(())
            }
            other => other,
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        self.session.apply(event);
        self.updates.send_replace(self.session.snapshot());
    }

    fn persist(&self) {
        let Some(path) = &self.prefs_path else {
            return;
        };
        let prefs = Preferences {
            locale: self.session.locale.code.to_string(),
            mock_mode: self.session.mock_mode,
        };
        if let Err(e) = prefs.save_to(path) {
            log::warn!("pipeline: could not save preferences: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
