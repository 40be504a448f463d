/*!
Negotiation payloads that travel through the relay without modification.
*/

use serde::{Deserialize, Serialize};

/// Kind of a session description.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Description proposed by the calling side
    Offer,
    /// Description returned by the called side
    Answer,
}

/// `SDP` blob with its kind, shaped like the browser's `RTCSessionDescriptionInit`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionDescription {
    /// Whether this is an offer or an answer
    #[serde(rename = "type")]
    pub kind: SdpType,
    /// Raw `SDP` text
    pub sdp: String,
}

impl SessionDescription {
    /// Wrap `SDP` text into an offer
    #[must_use]
    pub const fn offer(sdp: String) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp,
        }
    }

    /// Wrap `SDP` text into an answer
    #[must_use]
    pub const fn answer(sdp: String) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp,
        }
    }
}

/// Connectivity candidate proposed by one endpoint for the other to try.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct IceCandidate {
    /// Candidate line as produced by the ICE agent
    pub candidate: String,
    /// Media stream identification tag the candidate belongs to
    pub sdp_mid: Option<String>,
    /// Index of the media description the candidate belongs to
    pub sdp_m_line_index: Option<u16>,
}
