use futures::{Stream, StreamExt};

use crate::types::{AssistantDraft, ChatTurn};
use crate::{Error, Result};

/// A streamed reply frozen into a turn.
///
/// On failure `turn` still holds whatever text arrived before the error, so the
/// caller can persist or discard the partial reply.
#[derive(Debug)]
pub struct ReplyOutcome {
    pub turn: ChatTurn,
    pub error: Option<Error>,
}

impl ReplyOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<ChatTurn> {
        match self.error {
            None => Ok(self.turn),
            Some(e) => Err(e),
        }
    }
}

/// Drain a chunk stream into an assistant turn.
pub async fn collect_reply<S>(mut chunks: S) -> ReplyOutcome
where
    S: Stream<Item = Result<String>> + Unpin,
{
    let mut draft = AssistantDraft::new();
    while let Some(item) = chunks.next().await {
        match item {
            Ok(chunk) => draft.push_str(&chunk),
            Err(e) => {
                return ReplyOutcome {
                    turn: draft.freeze(),
                    error: Some(e),
                }
            }
        }
    }
    ReplyOutcome {
        turn: draft.freeze(),
        error: None,
    }
}
