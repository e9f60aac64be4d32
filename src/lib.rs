//! Sight Assist: a voice-driven camera assistant for pedestrians.
//!
//! A camera frame is sent with a task-specific prompt to an image model and
//! the answer is read aloud.  The [`pipeline::Orchestrator`] sequences
//! capture, analysis and speech, runs the voice-command and shop sub-dialog
//! flows, and lets only one action run at a time.

pub mod analysis;
pub mod app;
pub mod audio;
pub mod camera;
pub mod config;
pub mod hotkey;
pub mod locale;
pub mod location;
pub mod pipeline;
pub mod proxy;
pub mod speech;
pub mod stt;
pub mod task;
