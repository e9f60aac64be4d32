//! Per-invocation analysis request and prompt composition.

use crate::camera::EncodedFrame;
use crate::locale::Locale;
use crate::location::Coordinates;
use crate::task::Task;

/// Everything a strategy needs to describe one frame.
///
/// Built fresh for every invocation by [`AnalysisRequest::new`]; never
/// persisted.  The prompt always starts with the task's base instruction, so
/// it is never empty.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub task: Task,
    /// Base64-encoded image bytes (standard alphabet, padded).
    pub base64_image: String,
    pub mime_type: String,
    /// Fully composed instruction text sent with the image.
    pub prompt: String,
    /// Free-text answer to the shop question (FindShop only).
    pub user_query: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Tag of the locale the answer should be given in.
    pub locale_code: &'static str,
}

impl AnalysisRequest {
    pub fn new(
        task: Task,
        frame: EncodedFrame,
        locale: &'static Locale,
        user_query: Option<String>,
        coordinates: Option<Coordinates>,
    ) -> Self {
        // Only the sub-dialog task carries a query.
        let user_query = user_query
            .filter(|_| task.has_sub_dialog())
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let coordinates = coordinates.filter(|_| task.uses_location());

        let prompt = compose_prompt(task, locale, user_query.as_deref(), coordinates.as_ref());

        Self {
            task,
            base64_image: frame.base64,
            mime_type: frame.mime_type,
            prompt,
            user_query,
            coordinates,
            locale_code: locale.code,
        }
    }
}

/// Build the instruction text for `task`.
///
/// ```
/// use sight_assist::analysis::compose_prompt;
/// use sight_assist::locale;
/// use sight_assist::task::Task;
///
/// let es = locale::find("es-ES").unwrap();
/// let prompt = compose_prompt(Task::FindShop, es, Some("panadería"), None);
/// assert!(prompt.contains("Spanish"));
/// assert!(prompt.contains("panadería"));
/// ```
pub fn compose_prompt(
    task: Task,
    locale: &Locale,
    user_query: Option<&str>,
    coordinates: Option<&Coordinates>,
) -> String {
    let mut prompt = String::from(task.prompt());

    prompt.push_str(&format!(
        "\nAnswer in {} using plain spoken language, without markdown.",
        locale.model_language
    ));

    if let Some(query) = user_query {
        prompt.push_str(&format!("\nThe user is looking for: \"{query}\"."));
    }

    if let Some(c) = coordinates {
        prompt.push_str(&format!(
            "\nThe user is near latitude {:.5}, longitude {:.5}; use this only to \
             interpret local signage and street names.",
            c.latitude, c.longitude
        ));
    }

    prompt
}
