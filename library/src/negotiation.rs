/*!
Offer/answer/candidate exchange on top of a raw peer link.

[`PeerLink`] is the seam to the platform's ICE/SDP-capable connection
(`RTCPeerConnection` in the browser). [`NegotiationEngine`] drives it in the order the
exchange requires and turns every platform failure into [`Error::NegotiationFailed`].
Remote candidates are handed to the link as they arrive; buffering the ones that come
before the remote description is left to the link itself.
*/

use std::cell::Cell;
use std::rc::Rc;

use log::debug;
use wasm_call_protocol::{IceCandidate, PeerId, SdpType, SessionDescription};

use crate::error::{Error, Result};

/// Something the link reports on its own, outside of any negotiation step.
#[derive(Debug, Clone)]
pub enum LinkEvent<S> {
    /// Candidate gathered locally that has to be relayed to the remote peer.
    LocalCandidate(IceCandidate),
    /// Remote media arrived; replaces any previously received stream.
    RemoteStream(S),
}

/// Callback handle a link uses to surface [`LinkEvent`]s.
pub struct LinkEvents<S> {
    sink: Rc<dyn Fn(LinkEvent<S>)>,
}

impl<S> LinkEvents<S> {
    pub fn new(sink: impl Fn(LinkEvent<S>) + 'static) -> Self {
        Self {
            sink: Rc::new(sink),
        }
    }

    pub fn local_candidate(&self, candidate: IceCandidate) {
        (self.sink)(LinkEvent::LocalCandidate(candidate));
    }

    pub fn remote_stream(&self, stream: S) {
        (self.sink)(LinkEvent::RemoteStream(stream));
    }
}

impl<S> Clone for LinkEvents<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Rc::clone(&self.sink),
        }
    }
}

/// Raw point-to-point connection able to exchange session descriptions and candidates.
#[allow(async_fn_in_trait)]
pub trait PeerLink {
    /// # Errors
    /// Platform refused to produce an offer.
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    /// # Errors
    /// Platform refused to produce an answer, usually because no offer was applied.
    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    /// # Errors
    /// Description was rejected.
    async fn set_local_description(&self, description: &SessionDescription)
        -> anyhow::Result<()>;

    /// # Errors
    /// Description was rejected.
    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> anyhow::Result<()>;

    /// # Errors
    /// Candidate was rejected.
    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> anyhow::Result<()>;

    /// Terminate the link and free its native resources.
    fn close(&self);
}

/// Creates a fresh [`PeerLink`] for every call attempt.
pub trait PeerLinkFactory {
    type Stream;
    type Link: PeerLink;

    /// Local tracks are attached here and only here.
    ///
    /// # Errors
    /// Platform could not create the connection.
    fn create(
        &self,
        local_stream: &Self::Stream,
        events: LinkEvents<Self::Stream>,
    ) -> anyhow::Result<Self::Link>;
}

fn negotiation_failed(context: &str, error: &anyhow::Error) -> Error {
    Error::NegotiationFailed(format!("{context}: {error:#}"))
}

fn expect_kind(description: &SessionDescription, kind: SdpType) -> Result<()> {
    if description.kind != kind {
        return Err(Error::NegotiationFailed(format!(
            "expected an {kind:?} description, got {:?}",
            description.kind
        )));
    }
    if description.sdp.trim().is_empty() {
        return Err(Error::NegotiationFailed(format!(
            "{kind:?} description is empty"
        )));
    }
    Ok(())
}

/// Owns one peer link for the lifetime of one call attempt.
pub struct NegotiationEngine<L: PeerLink> {
    peer: PeerId,
    link: L,
    closed: Cell<bool>,
}

impl<L: PeerLink> NegotiationEngine<L> {
    pub fn new(peer: PeerId, link: L) -> Self {
        Self {
            peer,
            link,
            closed: Cell::new(false),
        }
    }

    #[must_use]
    pub const fn link(&self) -> &L {
        &self.link
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::NegotiationFailed(format!(
                "link to {} is already closed",
                self.peer
            )));
        }
        Ok(())
    }

    /// Create an offer and apply it locally.
    ///
    /// # Errors
    /// [`Error::NegotiationFailed`] if the link is closed or refuses either step.
    pub async fn create_offer(&self) -> Result<SessionDescription> {
        self.ensure_open()?;
        let offer = self
            .link
            .create_offer()
            .await
            .map_err(|err| negotiation_failed("failed to create an SDP offer", &err))?;
        self.link
            .set_local_description(&offer)
            .await
            .map_err(|err| negotiation_failed("failed to set local description", &err))?;
        debug!("created an offer for {}", self.peer);
        Ok(offer)
    }

    /// Apply the remote offer, then create and apply the local answer.
    ///
    /// # Errors
    /// [`Error::NegotiationFailed`] on a malformed offer or when the link refuses any step.
    pub async fn accept_offer(&self, offer: &SessionDescription) -> Result<SessionDescription> {
        self.ensure_open()?;
        expect_kind(offer, SdpType::Offer)?;
        self.link
            .set_remote_description(offer)
            .await
            .map_err(|err| negotiation_failed("failed to set remote offer", &err))?;
        let answer = self
            .link
            .create_answer()
            .await
            .map_err(|err| negotiation_failed("failed to create an SDP answer", &err))?;
        self.link
            .set_local_description(&answer)
            .await
            .map_err(|err| negotiation_failed("failed to set local description", &err))?;
        debug!("received an offer from {} and created an answer", self.peer);
        Ok(answer)
    }

    /// # Errors
    /// [`Error::NegotiationFailed`] on a malformed answer or when the link rejects it.
    pub async fn apply_answer(&self, answer: &SessionDescription) -> Result<()> {
        self.ensure_open()?;
        expect_kind(answer, SdpType::Answer)?;
        self.link
            .set_remote_description(answer)
            .await
            .map_err(|err| negotiation_failed("failed to set remote answer", &err))?;
        debug!("received answer from {} and set remote description", self.peer);
        Ok(())
    }

    /// # Errors
    /// [`Error::NegotiationFailed`] when the link rejects the candidate.
    pub async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.ensure_open()?;
        self.link
            .add_ice_candidate(candidate)
            .await
            .map_err(|err| negotiation_failed("failed to add ICE candidate", &err))?;
        debug!("added ice candidate from {}: {:?}", self.peer, candidate);
        Ok(())
    }

    /// Safe to call any number of times, only the first call reaches the link.
    pub fn close(&self) {
        if !self.closed.replace(true) {
            debug!("closing link to {}", self.peer);
            self.link.close();
        }
    }
}

impl<L: PeerLink> Drop for NegotiationEngine<L> {
    fn drop(&mut self) {
        self.close();
    }
}
