//! Maps a recognised transcript to a [`Task`].
//!
//! Matching is deliberately simple: the transcript is trimmed and
//! lower-cased, then checked for any command phrase of the active locale by
//! substring containment.  Tasks are tried in [`Task::ALL`] order and the
//! first hit wins, so "bus across the road" resolves to `FindBus`.

use crate::task::Task;

use super::Locale;

/// Stateless keyword matcher over a locale's command vocabulary.
///
/// ```
/// use sight_assist::locale::{self, VoiceCommandResolver};
/// use sight_assist::task::Task;
///
/// let en = locale::find("en-US").unwrap();
/// let resolver = VoiceCommandResolver::new();
/// assert_eq!(resolver.resolve("I want to find a bus", en), Some(Task::FindBus));
/// assert_eq!(resolver.resolve("xyz", en), None);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct VoiceCommandResolver;

impl VoiceCommandResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `transcript` against `locale`'s vocabulary only.
    pub fn resolve(&self, transcript: &str, locale: &Locale) -> Option<Task> {
        let folded = transcript.trim().to_lowercase();
        if folded.is_empty() {
            return None;
        }

        Task::ALL.into_iter().find(|&task| {
            locale
                .commands
                .phrases(task)
                .iter()
                .any(|phrase| folded.contains(phrase))
        })
    }
}
