//! Best-effort conversation titles.
//!
//! A secondary call made after a conversation's first reply. Failures are
//! logged and swallowed; they never affect the primary exchange.

use tracing::warn;

use crate::client::core::ChatClient;

const TITLE_SYSTEM_PROMPT: &str = "Write a short title (at most six words) for a coaching \
conversation that starts with the user's message. Reply with the title only, no quotes.";
const TITLE_MAX_TOKENS: u32 = 24;
const TITLE_MAX_CHARS: usize = 60;

pub async fn suggest_title(
    client: &ChatClient,
    first_message: &str,
    model: &str,
) -> Option<String> {
    match client
        .send(first_message, Some(TITLE_SYSTEM_PROMPT), model, TITLE_MAX_TOKENS)
        .await
    {
        Ok(resp) => clean_title(&resp.text_content),
        Err(e) => {
            warn!(error = %e, "title generation failed");
            None
        }
    }
}

fn clean_title(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|l| !l.is_empty())?;
    let trimmed = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '*' || c == '#')
        .trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(TITLE_MAX_CHARS).collect())
}
