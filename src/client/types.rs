use std::sync::atomic::{AtomicU8, Ordering};

use tokio_util::sync::CancellationToken;

/// Lifecycle of one streaming call.
///
/// `Idle → CredentialFetch → Connecting → Streaming → {Completed | Failed | Cancelled}`.
/// Terminal phases are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamPhase {
    Idle = 0,
    CredentialFetch = 1,
    Connecting = 2,
    Streaming = 3,
    Completed = 4,
    Failed = 5,
    Cancelled = 6,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamPhase::Completed | StreamPhase::Failed | StreamPhase::Cancelled
        )
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => StreamPhase::CredentialFetch,
            2 => StreamPhase::Connecting,
            3 => StreamPhase::Streaming,
            4 => StreamPhase::Completed,
            5 => StreamPhase::Failed,
            6 => StreamPhase::Cancelled,
            _ => StreamPhase::Idle,
        }
    }
}

/// Shared phase cell; refuses to leave a terminal phase.
#[derive(Debug)]
pub(crate) struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(StreamPhase::Idle as u8))
    }

    pub fn get(&self) -> StreamPhase {
        StreamPhase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` unless already terminal. Returns whether the move happened.
    pub fn advance(&self, next: StreamPhase) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                if StreamPhase::from_u8(cur).is_terminal() {
                    None
                } else {
                    Some(next as u8)
                }
            })
            .is_ok()
    }
}

/// Cancels a [`crate::client::ChatStream`] from anywhere.
///
/// Cancellation is not an error: the stream simply ends without further output
/// and its connection is released.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
