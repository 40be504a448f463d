/*!
The single call an endpoint can be part of.

```text
Idle ──place_call──▶ Outgoing ──answer──▶ Active ──▶ Idle
Idle ──offer──────▶ Incoming ──answer sent──▶ Active ──▶ Idle
          any phase ──teardown──▶ Idle
```

Every call attempt gets its own [`Attempt`] number. Asynchronous steps capture the number
before suspending and check it with [`CallSession::is_current`] afterwards, so work that
finishes after a hangup or after a newer call started can tell it has been outlived.
*/

use std::fmt::{Display, Formatter};
use std::rc::Rc;

use wasm_call_protocol::PeerId;

use crate::error::{Error, Result};
use crate::negotiation::{NegotiationEngine, PeerLink};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum CallPhase {
    #[default]
    Idle,
    /// Offer being prepared or sent, waiting for the answer.
    Outgoing,
    /// Remote offer being answered.
    Incoming,
    Active,
}

impl Display for CallPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            Self::Idle => "idle",
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Active => "active",
        };
        f.write_str(name)
    }
}

/// Identifies one call attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Attempt(u64);

/// Resources handed back by [`CallSession::teardown`] for the caller to dispose of.
pub struct Released<S, L: PeerLink> {
    pub peer: PeerId,
    pub phase: CallPhase,
    /// Whether the remote side knows about this call and expects a hangup notice.
    pub contacted: bool,
    pub local_stream: Option<S>,
    pub remote_stream: Option<S>,
    pub link: Option<Rc<NegotiationEngine<L>>>,
}

pub struct CallSession<S, L: PeerLink> {
    phase: CallPhase,
    remote_peer: Option<PeerId>,
    attempt: u64,
    contacted: bool,
    answer_expected: bool,
    local_stream: Option<S>,
    remote_stream: Option<S>,
    link: Option<Rc<NegotiationEngine<L>>>,
}

impl<S, L: PeerLink> Default for CallSession<S, L> {
    fn default() -> Self {
        Self {
            phase: CallPhase::Idle,
            remote_peer: None,
            attempt: 0,
            contacted: false,
            answer_expected: false,
            local_stream: None,
            remote_stream: None,
            link: None,
        }
    }
}

impl<S: Clone, L: PeerLink> CallSession<S, L> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> CallPhase {
        self.phase
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == CallPhase::Idle
    }

    /// Remote party, `None` while idle.
    #[must_use]
    pub fn remote_peer(&self) -> Option<&PeerId> {
        self.remote_peer.as_ref().filter(|_| !self.is_idle())
    }

    #[must_use]
    pub fn local_stream(&self) -> Option<&S> {
        self.local_stream.as_ref()
    }

    #[must_use]
    pub fn remote_stream(&self) -> Option<&S> {
        self.remote_stream.as_ref()
    }

    #[must_use]
    pub const fn attempt(&self) -> Attempt {
        Attempt(self.attempt)
    }

    /// Whether `peer` is the remote party of a pending or running call.
    #[must_use]
    pub fn involves(&self, peer: &PeerId) -> bool {
        self.remote_peer() == Some(peer)
    }

    #[must_use]
    pub fn is_current(&self, attempt: Attempt) -> bool {
        !self.is_idle() && self.attempt == attempt.0
    }

    /// Reserve the session for a new call attempt.
    ///
    /// # Errors
    /// [`Error::AlreadyInCall`] when not idle; the session is left untouched.
    pub fn begin(&mut self, phase: CallPhase, peer: PeerId) -> Result<Attempt> {
        debug_assert!(matches!(phase, CallPhase::Outgoing | CallPhase::Incoming));
        if let Some(current) = self.remote_peer() {
            return Err(Error::AlreadyInCall {
                peer: current.clone(),
            });
        }
        self.attempt += 1;
        self.phase = phase;
        self.remote_peer = Some(peer);
        // an offerer is waiting on us from the moment its offer arrived
        self.contacted = phase == CallPhase::Incoming;
        self.answer_expected = false;
        Ok(Attempt(self.attempt))
    }

    /// Store the local stream and link acquired for `attempt`.
    /// Returns them untouched when the attempt has been outlived.
    ///
    /// # Errors
    /// Hands `stream` and `link` back if `attempt` is no longer current.
    pub fn attach(
        &mut self,
        attempt: Attempt,
        stream: S,
        link: Rc<NegotiationEngine<L>>,
    ) -> std::result::Result<(), (S, Rc<NegotiationEngine<L>>)> {
        if !self.is_current(attempt) {
            return Err((stream, link));
        }
        self.local_stream = Some(stream);
        self.link = Some(link);
        Ok(())
    }

    /// Link of the call with `peer`, once it exists.
    #[must_use]
    pub fn link_for(&self, peer: &PeerId) -> Option<Rc<NegotiationEngine<L>>> {
        self.link.clone().filter(|_| self.involves(peer))
    }

    /// Record that our offer left; from now on exactly one answer is accepted.
    pub fn offer_sent(&mut self, attempt: Attempt) -> bool {
        if !self.is_current(attempt) || self.phase != CallPhase::Outgoing {
            return false;
        }
        self.contacted = true;
        self.answer_expected = true;
        true
    }

    /// Take the right to apply an answer from `peer`. Succeeds once per outgoing attempt.
    pub fn claim_answer(&mut self, peer: &PeerId) -> Option<(Attempt, Rc<NegotiationEngine<L>>)> {
        if self.phase != CallPhase::Outgoing || !self.involves(peer) || !self.answer_expected {
            return None;
        }
        let link = self.link.clone()?;
        self.answer_expected = false;
        Some((Attempt(self.attempt), link))
    }

    pub fn activate(&mut self, attempt: Attempt) -> bool {
        if !self.is_current(attempt) || self.phase == CallPhase::Active {
            return false;
        }
        self.phase = CallPhase::Active;
        self.contacted = true;
        true
    }

    /// Swap in a newly received remote stream, returning the one it replaces.
    ///
    /// # Errors
    /// Hands `stream` back if `attempt` is no longer current.
    pub fn replace_remote_stream(
        &mut self,
        attempt: Attempt,
        stream: S,
    ) -> std::result::Result<Option<S>, S> {
        if !self.is_current(attempt) {
            return Err(stream);
        }
        Ok(self.remote_stream.replace(stream))
    }

    /// Move back to idle and hand every owned resource to the caller.
    /// `None` if the session was idle already.
    pub fn teardown(&mut self) -> Option<Released<S, L>> {
        if self.is_idle() {
            return None;
        }
        let phase = std::mem::replace(&mut self.phase, CallPhase::Idle);
        let peer = self.remote_peer.take()?;
        self.answer_expected = false;
        Some(Released {
            peer,
            phase,
            contacted: std::mem::take(&mut self.contacted),
            local_stream: self.local_stream.take(),
            remote_stream: self.remote_stream.take(),
            link: self.link.take(),
        })
    }
}
