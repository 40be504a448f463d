/*!
Signaling messages exchanged between a calling endpoint and the relay.

Variant names on the wire are the relay's event names (`call-user`, `call-made`, ...),
so every message is encoded as `{ "<event-name>": { ..fields } }`.
*/

use serde::{Deserialize, Serialize};

use crate::common::{IceCandidate, SessionDescription};
use crate::PeerId;

/// Messages an endpoint sends to the relay, each addressed to exactly one peer.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Start a call by proposing an offer to `to`
    CallUser {
        /// Local offer
        offer: SessionDescription,
        /// Callee
        to: PeerId,
    },
    /// Accept a call by returning an answer to `to`
    MakeAnswer {
        /// Local answer
        answer: SessionDescription,
        /// Caller
        to: PeerId,
    },
    /// Trickle one locally gathered candidate to `to`
    SendIceCandidate {
        /// Local candidate
        candidate: IceCandidate,
        /// Remote party of the current call
        to: PeerId,
    },
    /// Hang up, or refuse an offer
    EndCall {
        /// Remote party
        to: PeerId,
    },
}

impl ClientMessage {
    /// Peer the relay should forward this message to.
    #[must_use]
    pub fn recipient(&self) -> &PeerId {
        match *self {
            Self::CallUser { ref to, .. }
            | Self::MakeAnswer { ref to, .. }
            | Self::SendIceCandidate { ref to, .. }
            | Self::EndCall { ref to } => to,
        }
    }
}

/// Messages the relay delivers to an endpoint.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Identity the relay assigned to this connection
    Connected {
        /// Local peer identifier
        id: PeerId,
    },
    /// `from` proposes a call
    CallMade {
        /// Caller
        from: PeerId,
        /// Remote offer
        offer: SessionDescription,
    },
    /// `from` accepted our call
    AnswerMade {
        /// Callee
        from: PeerId,
        /// Remote answer
        answer: SessionDescription,
    },
    /// `from` trickled a candidate
    IceReceived {
        /// Remote party
        from: PeerId,
        /// Remote candidate
        candidate: IceCandidate,
    },
    /// The remote party hung up or refused the call
    CallEnded {
        /// Remote party, when the relay reports it
        #[serde(default)]
        from: Option<PeerId>,
    },
    /// A peer became reachable
    AddUserToList {
        /// New peer
        user: PeerId,
    },
    /// A peer is no longer reachable
    RemoveUserFromList {
        /// Departed peer
        user: PeerId,
    },
    /// Authoritative list of every reachable peer
    UpdateUsersList {
        /// Complete roster
        users: Vec<PeerId>,
    },
}
