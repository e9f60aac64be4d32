//! Language configurations: display strings, status text, error text, mock
//! responses and the voice-command vocabulary.
//!
//! The catalog is fixed at compile time.  [`find`] looks up a locale by its
//! language tag; [`default_locale`] is what a fresh install (or an unknown
//! persisted code) starts with.
//!
//! ```
//! use sight_assist::locale;
//!
//! assert_eq!(locale::default_locale().code, "en-US");
//! assert!(locale::find("th-TH").is_some());
//! assert!(locale::find("xx-XX").is_none());
//! ```

pub mod catalog;
pub mod resolver;

pub use catalog::LOCALES;
pub use resolver::VoiceCommandResolver;

use crate::task::Task;

// ---------------------------------------------------------------------------
// String tables
// ---------------------------------------------------------------------------

/// Status line texts shown (and sometimes spoken) by the orchestrator.
#[derive(Debug)]
pub struct StatusText {
    pub initializing: &'static str,
    pub ready: &'static str,
    pub processing: &'static str,
    pub listening: &'static str,
    pub acquiring_location: &'static str,
    pub unrecognized_command: &'static str,
    /// Question asked before listening for the shop the user wants.
    pub shop_prompt: &'static str,
    /// Spoken once after startup when the welcome line is enabled.
    pub welcome: &'static str,
}

/// User-presentable messages, one per error kind.
#[derive(Debug)]
pub struct ErrorText {
    pub camera_unavailable: &'static str,
    pub camera_not_ready: &'static str,
    pub invalid_credential: &'static str,
    pub not_authorized: &'static str,
    pub service_unavailable: &'static str,
    pub connection_failed: &'static str,
    pub timed_out: &'static str,
    pub empty_result: &'static str,
    pub analysis_failed: &'static str,
    pub speech_failed: &'static str,
    pub microphone_denied: &'static str,
    pub no_speech: &'static str,
    pub listening_failed: &'static str,
    pub location_denied: &'static str,
    pub location_unavailable: &'static str,
    pub location_timeout: &'static str,
    pub location_unsupported: &'static str,
}

/// Phrase fragments that select each task, matched by substring containment.
#[derive(Debug)]
pub struct CommandVocabulary {
    pub find_bus: &'static [&'static str],
    pub cross_road: &'static [&'static str],
    pub explore: &'static [&'static str],
    pub find_shop: &'static [&'static str],
}

impl CommandVocabulary {
    pub fn phrases(&self, task: Task) -> &'static [&'static str] {
        match task {
            Task::FindBus => self.find_bus,
            Task::CrossRoad => self.cross_road,
            Task::Explore => self.explore,
            Task::FindShop => self.find_shop,
        }
    }
}

// ---------------------------------------------------------------------------
// Locale
// ---------------------------------------------------------------------------

/// A complete language configuration.
///
/// Adding a language means adding a full `Locale` to [`LOCALES`]: labels,
/// status strings, error strings, mock responses and command vocabulary.
#[derive(Debug)]
pub struct Locale {
    /// BCP-47 language tag, e.g. `"en-US"`.
    pub code: &'static str,
    /// Name shown in the language picker.
    pub display_name: &'static str,
    /// Language name used when asking the model to answer in this language.
    pub model_language: &'static str,
    /// Button labels, indexed by [`Task::index`].
    pub task_labels: [&'static str; 4],
    /// Canned mock-mode answers, indexed by [`Task::index`].
    pub mock_responses: [&'static str; 4],
    pub commands: CommandVocabulary,
    pub status: StatusText,
    pub errors: ErrorText,
}

impl Locale {
    pub fn task_label(&self, task: Task) -> &'static str {
        self.task_labels[task.index()]
    }

    pub fn mock_response(&self, task: Task) -> &'static str {
        self.mock_responses[task.index()]
    }

    /// Primary language subtag (`"en"` for `"en-US"`).
    pub fn primary_language(&self) -> &'static str {
        self.code.split('-').next().unwrap_or(self.code)
    }
}

impl PartialEq for Locale {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find a locale by tag (ASCII case-insensitive).
pub fn find(code: &str) -> Option<&'static Locale> {
    LOCALES
        .iter()
        .find(|l| l.code.eq_ignore_ascii_case(code.trim()))
}

/// The locale used when nothing (or something unknown) is configured.
pub fn default_locale() -> &'static Locale {
    &LOCALES[0]
}

/// [`find`], falling back to [`default_locale`].
pub fn find_or_default(code: &str) -> &'static Locale {
    find(code).unwrap_or_else(|| {
        log::warn!("locale: unknown code {code:?}, using {}", default_locale().code);
        default_locale()
    })
}
