/*!
Helper crate that declares the types shared between [wasm-call](../wasm_call/index.html)
endpoints and the signaling relay they talk through.

The relay is only a mailbox: it stamps every forwarded message with the sender's [`PeerId`]
and publishes roster changes, it never inspects session descriptions or candidates.
*/

#![warn(missing_docs)]

use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod common;
pub mod signal;

pub use common::{IceCandidate, SdpType, SessionDescription};
pub use signal::{ClientMessage, ServerMessage};

/// Opaque identifier the relay assigns to every connected endpoint.
///
/// It is only meaningful while that endpoint stays connected to the relay.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap String into a `PeerId` `struct`
    #[must_use]
    pub const fn new(inner: String) -> Self {
        Self(inner)
    }

    /// Return reference to the underling string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Acquire the underlying type
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for PeerId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_owned()))
    }
}

impl From<&str> for PeerId {
    fn from(val: &str) -> Self {
        Self(val.to_owned())
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::PeerId;

    #[test]
    fn peer_id_serializes_as_plain_string() {
        let peer = PeerId::from("peer-7");
        assert_eq!(serde_json::to_string(&peer).unwrap(), r#""peer-7""#);
        assert_eq!(
            serde_json::from_str::<PeerId>(r#""peer-7""#).unwrap(),
            peer
        );
    }

    #[test]
    fn peer_ids_order_lexicographically() {
        assert!(PeerId::from("alpha") < PeerId::from("beta"));
        assert!(PeerId::from("peer-10") < PeerId::from("peer-9"));
    }
}
