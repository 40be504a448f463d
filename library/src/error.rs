use wasm_call_protocol::PeerId;

/// Everything that can go wrong while placing, answering or running a call.
///
/// None of these are fatal: whenever one of them aborts the current call the session
/// is already back to idle with its media released by the time the error is returned.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A call is already placed, ringing or running.
    #[error("already in a call with {peer}")]
    AlreadyInCall { peer: PeerId },

    /// Camera or microphone were denied or are missing.
    #[error("local media is unavailable: {0}")]
    MediaUnavailable(String),

    /// The peer link rejected a session description or could not be created.
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),

    /// The signaling relay cannot be reached.
    #[error("signaling relay is unavailable: {0}")]
    TransportUnavailable(String),

    /// Answer, candidate or hangup that matches no pending session.
    #[error("stale message from {peer} dropped")]
    StaleMessage { peer: PeerId },

    /// Call attempt outlived by a hangup or a newer call.
    #[error("call attempt to {peer} was cancelled")]
    Cancelled { peer: PeerId },

    /// Configuration rejected before connecting to the relay.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Errors that are only logged and never shown to the user.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(*self, Self::StaleMessage { .. } | Self::Cancelled { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
