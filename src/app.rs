//! Floating control widget (egui/eframe).
//!
//! # Architecture
//!
//! [`AssistApp`] is the top-level [`eframe::App`].  It never mutates session
//! state itself; it holds:
//!
//! * `snapshots`: the orchestrator's `watch` channel, read every frame.
//! * `command_tx`: sends [`Command`]s to the orchestrator.
//! * `speech_in`: used only to abort an in-flight listen.
//!
//! # Layout
//!
//! | Row | Content |
//! |-----|---------|
//! | Title bar | phase icon, drag handle, settings / close |
//! | Tasks | four large buttons, disabled while busy |
//! | Microphone | starts a voice command, or stops listening |
//! | Status | last status line (description, prompt or error), then the previous description when the status has moved on |
//! | Settings | language picker and mock-mode toggle |

use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::{mpsc, watch};

use crate::locale::LOCALES;
use crate::pipeline::{Command, Phase, SessionSnapshot};
use crate::speech::SpeechInput;
use crate::task::Task;

/// What the microphone button does in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicAction {
    Listen,
    Abort,
    Disabled,
}

impl MicAction {
    pub fn for_snapshot(snapshot: &SessionSnapshot) -> Self {
        if snapshot.phase.is_listening() {
            MicAction::Abort
        } else if snapshot.busy {
            MicAction::Disabled
        } else {
            MicAction::Listen
        }
    }
}

// ---------------------------------------------------------------------------
// AssistApp
// ---------------------------------------------------------------------------

pub struct AssistApp {
    snapshots: watch::Receiver<SessionSnapshot>,
    command_tx: mpsc::Sender<Command>,
    speech_in: Arc<dyn SpeechInput>,
    /// Hotkey hint shown on the microphone button, e.g. `"F9"`.
    listen_key: Option<String>,
    show_settings: bool,
}

impl AssistApp {
    pub fn new(
        snapshots: watch::Receiver<SessionSnapshot>,
        command_tx: mpsc::Sender<Command>,
        speech_in: Arc<dyn SpeechInput>,
        listen_key: Option<String>,
    ) -> Self {
        Self {
            snapshots,
            command_tx,
            speech_in,
            listen_key,
            show_settings: false,
        }
    }

    fn send(&self, command: Command) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::debug!("ui: command not queued: {e}");
        }
    }

    // ── Title bar ────────────────────────────────────────────────────────

    fn draw_title_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, snap: &SessionSnapshot) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(phase_icon(snap.phase)).color(phase_color(snap.phase)));

            let title = ui.label(
                egui::RichText::new("Sight Assist")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(13.0),
            );
            if title.is_pointer_button_down_on() {
                if let Some(outer_rect) = ctx.input(|i| i.viewport().outer_rect) {
                    let delta = ctx.input(|i| i.pointer.delta());
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(
                        outer_rect.min + delta,
                    ));
                }
            }
            if snap.mock_mode {
                ui.label(
                    egui::RichText::new("MOCK")
                        .color(egui::Color32::from_rgb(230, 180, 60))
                        .size(10.0),
                );
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new("x").size(12.0)).frame(false))
                    .on_hover_text("Close")
                    .clicked()
                {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui
                    .add(egui::Button::new(egui::RichText::new("=").size(12.0)).frame(false))
                    .on_hover_text("Settings")
                    .clicked()
                {
                    self.show_settings = !self.show_settings;
                }
            });
        });
    }

    // ── Controls ─────────────────────────────────────────────────────────

    fn draw_tasks(&self, ui: &mut egui::Ui, snap: &SessionSnapshot) {
        let width = (ui.available_width() - 6.0) / 2.0;
        for row in Task::ALL.chunks(2) {
            ui.horizontal(|ui| {
                for &task in row {
                    let active = snap.active_task == Some(task);
                    let mut text = egui::RichText::new(snap.locale.task_label(task)).size(16.0);
                    if active {
                        text = text.strong();
                    }
                    let button = egui::Button::new(text).min_size(egui::vec2(width, 44.0));
                    if ui.add_enabled(!snap.busy, button).clicked() {
                        self.send(Command::SelectTask(task));
                    }
                }
            });
        }
    }

    fn draw_microphone(&self, ui: &mut egui::Ui, snap: &SessionSnapshot) {
        let action = MicAction::for_snapshot(snap);
        let label = match (action, &self.listen_key) {
            (MicAction::Abort, _) => "Stop listening".to_string(),
            (_, Some(key)) => format!("Voice command ({key})"),
            (_, None) => "Voice command".to_string(),
        };
        let button = egui::Button::new(egui::RichText::new(label).size(15.0))
            .min_size(egui::vec2(ui.available_width(), 36.0));

        if ui.add_enabled(action != MicAction::Disabled, button).clicked() {
            match action {
                MicAction::Listen => self.send(Command::StartListening),
                MicAction::Abort => self.speech_in.abort(),
                MicAction::Disabled => {}
            }
        }
    }

    fn draw_status(&self, ui: &mut egui::Ui, snap: &SessionSnapshot) {
        let color = if snap.last_error.is_some() {
            egui::Color32::from_rgb(255, 136, 68)
        } else {
            egui::Color32::from_rgb(220, 220, 220)
        };
        ui.add_space(4.0);
        ui.label(egui::RichText::new(snap.status.as_str()).color(color).size(14.0));
        if let Some(previous) = previous_description(snap) {
            ui.label(
                egui::RichText::new(previous)
                    .color(egui::Color32::from_rgb(150, 150, 150))
                    .size(11.0),
            );
        }
        if let Some(loc) = snap.location {
            ui.label(
                egui::RichText::new(format!("{:.4}, {:.4}", loc.latitude, loc.longitude))
                    .color(egui::Color32::from_rgb(120, 120, 120))
                    .size(10.0),
            );
        }
    }

    fn draw_settings(&self, ui: &mut egui::Ui, snap: &SessionSnapshot) {
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Language").size(12.0));
            egui::ComboBox::from_id_salt("locale")
                .selected_text(snap.locale.display_name)
                .show_ui(ui, |ui| {
                    for locale in LOCALES {
                        let selected = locale == snap.locale;
                        if ui.selectable_label(selected, locale.display_name).clicked() && !selected {
                            self.send(Command::SetLocale(locale.code.to_string()));
                        }
                    }
                });
        });

        let mut mock = snap.mock_mode;
        if ui.checkbox(&mut mock, "Mock mode (no network)").changed() {
            self.send(Command::SetMockMode(mock));
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The last description, when the status line no longer shows it.
fn previous_description(snap: &SessionSnapshot) -> Option<&str> {
    snap.last_description
        .as_deref()
        .filter(|text| *text != snap.status)
}

fn phase_icon(phase: Phase) -> &'static str {
    match phase {
        Phase::Initializing => "..",
        Phase::Idle => "  ",
        Phase::Capturing | Phase::AwaitingAnalysis => "~ ",
        Phase::Speaking => "> ",
        Phase::ListeningForCommand | Phase::ListeningForSubQuery => "* ",
        Phase::Error => "! ",
    }
}

fn phase_color(phase: Phase) -> egui::Color32 {
    match phase {
        Phase::Initializing | Phase::Idle => egui::Color32::from_rgb(100, 100, 100),
        Phase::Capturing | Phase::AwaitingAnalysis => egui::Color32::from_rgb(68, 136, 255),
        Phase::Speaking => egui::Color32::from_rgb(80, 200, 120),
        Phase::ListeningForCommand | Phase::ListeningForSubQuery => {
            egui::Color32::from_rgb(255, 68, 68)
        }
        Phase::Error => egui::Color32::from_rgb(255, 136, 68),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for AssistApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let snap = self.snapshots.borrow_and_update().clone();

        // The orchestrator runs on another thread; poll for new snapshots.
        let interval = if snap.busy { 100 } else { 250 };
        ctx.request_repaint_after(Duration::from_millis(interval));

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 235))
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(8));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_title_bar(ui, ctx, &snap);
            ui.separator();

            if self.show_settings {
                self.draw_settings(ui, &snap);
                ui.separator();
            }

            self.draw_tasks(ui, &snap);
            ui.add_space(4.0);
            self.draw_microphone(ui, &snap);
            self.draw_status(ui, &snap);
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!("Sight Assist widget closing");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale;
    use crate::pipeline::Session;
    use crate::pipeline::SessionEvent;

    fn snapshot(events: &[SessionEvent]) -> SessionSnapshot {
        let mut s = Session::new(locale::default_locale(), false);
        for e in events {
            s.apply(e.clone());
        }
        s.snapshot()
    }

    #[test]
    fn previous_description_shown_once_status_moves_on() {
        let described = snapshot(&[
            SessionEvent::Ready,
            SessionEvent::Described("A bench on your left.".into()),
            SessionEvent::Settled,
        ]);
        assert_eq!(previous_description(&described), None);

        let after_failure = snapshot(&[
            SessionEvent::Ready,
            SessionEvent::Described("A bench on your left.".into()),
            SessionEvent::Settled,
            SessionEvent::Failed("camera not ready".into()),
            SessionEvent::Settled,
        ]);
        assert_eq!(previous_description(&after_failure), Some("A bench on your left."));
        assert_eq!(previous_description(&snapshot(&[SessionEvent::Ready])), None);
    }

    #[test]
    fn microphone_listens_when_idle() {
        let snap = snapshot(&[SessionEvent::Ready]);
        assert_eq!(MicAction::for_snapshot(&snap), MicAction::Listen);
    }

    #[test]
    fn microphone_aborts_while_listening() {
        let snap = snapshot(&[SessionEvent::Ready, SessionEvent::ListeningForSubQuery(Task::FindShop)]);
        assert_eq!(MicAction::for_snapshot(&snap), MicAction::Abort);
    }

    #[test]
    fn microphone_disabled_while_busy_otherwise() {
        let snap = snapshot(&[SessionEvent::Ready, SessionEvent::Capturing(Task::Explore)]);
        assert_eq!(MicAction::for_snapshot(&snap), MicAction::Disabled);
        let snap = snapshot(&[]);
        assert_eq!(MicAction::for_snapshot(&snap), MicAction::Disabled);
    }
}
