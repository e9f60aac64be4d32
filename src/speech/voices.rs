//! Installed-voice discovery and per-language voice selection.

/// One synthesizer voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Name passed to the synthesizer's voice flag.
    pub name: String,
    /// BCP-47-style tag with `-` separators (e.g. `en-US`, `es`).
    pub language: String,
}

/// Parse `espeak-ng --voices` output.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File          Other Languages
///  5  en-us           --/M      English_(America)  gmw/en-US     (en 10)
/// ```
///
/// espeak-ng selects voices by language code, so `name` is the language
/// column.
pub fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let lang = line.split_whitespace().nth(1)?;
            Some(Voice {
                name: lang.to_string(),
                language: lang.replace('_', "-"),
            })
        })
        .collect()
}

/// Parse macOS `say -v '?'` output.
///
/// ```text
/// Alex                en_US    # Most people recognize me by my voice.
/// Bad News            en_US    # The light you see at the end of the tunnel...
/// ```
pub fn parse_say_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let head = line.split('#').next()?.trim_end();
            let (name, lang) = head.rsplit_once(char::is_whitespace)?;
            let name = name.trim();
            if name.is_empty() || lang.is_empty() {
                return None;
            }
            Some(Voice {
                name: name.to_string(),
                language: lang.replace('_', "-"),
            })
        })
        .collect()
}

/// Choose a voice for `tag`: exact tag match first, then the first voice
/// sharing the primary language subtag, else `None` (engine default).
///
/// ```
/// use sight_assist::speech::{select_voice, Voice};
///
/// let voices = vec![
///     Voice { name: "es-419".into(), language: "es-419".into() },
///     Voice { name: "es".into(), language: "es".into() },
/// ];
/// assert_eq!(select_voice(&voices, "es-ES").unwrap().name, "es-419");
/// assert!(select_voice(&voices, "th-TH").is_none());
/// ```
pub fn select_voice<'a>(voices: &'a [Voice], tag: &str) -> Option<&'a Voice> {
    let wanted = tag.replace('_', "-");
    let primary = primary_subtag(&wanted);

    voices
        .iter()
        .find(|v| v.language.eq_ignore_ascii_case(&wanted))
        .or_else(|| {
            voices
                .iter()
                .find(|v| primary_subtag(&v.language).eq_ignore_ascii_case(primary))
        })
}

fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}
