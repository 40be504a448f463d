/*!
Glue between the relay, the local media devices and the single call session.

[`CallDispatcher`] owns the roster and the [`CallSession`] and is the only place they are
mutated. All of its methods run on one thread; asynchronous steps (media capture, offer
and answer creation) suspend the calling task and let other messages be handled
meanwhile, so every step re-checks its call attempt after resuming before touching the
session again.

# Example

```ignore
use wasm_call::{CallDispatcher, CallUpdate, MediaConstraints, PeerId};

let dispatcher = CallDispatcher::new(transport, media, links, MediaConstraints::default());
dispatcher.set_observer(|update| match update {
    CallUpdate::Busy { .. } => show_notice("You have existing call! End it to make another!"),
    CallUpdate::Failed(error) => show_error(&error.to_string()),
    _ => render(),
});

// every frame received from the relay
dispatcher.handle_message(message).await?;

dispatcher.place_call(PeerId::from("peer-7")).await?;
dispatcher.end_call(None);
```
*/

mod message_handler;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, error, info, warn};
use wasm_call_protocol::{ClientMessage, PeerId, ServerMessage};

use crate::config::MediaConstraints;
use crate::error::{Error, Result};
use crate::media::MediaDevices;
use crate::negotiation::{LinkEvent, LinkEvents, NegotiationEngine, PeerLink, PeerLinkFactory};
use crate::roster::Roster;
use crate::session::{Attempt, CallPhase, CallSession, Released};
use crate::transport::SignalingTransport;

/// Why a call went back to idle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EndReason {
    LocalHangup,
    RemoteHangup,
    /// Remote party disappeared from the roster.
    PeerLeft,
    TransportLost,
    Failed,
    /// Our own offer gave way to the remote party's crossing offer.
    Superseded,
}

/// What the UI is told about.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CallUpdate {
    /// Anything in [`CallSnapshot`] may have changed.
    StateChanged,
    /// A call was attempted while another one, with `peer`, is in progress.
    Busy { peer: PeerId },
    /// The current call was aborted by an error.
    Failed(Error),
    Ended { peer: PeerId, reason: EndReason },
}

/// Everything the UI renders from.
#[derive(Debug, Clone)]
pub struct CallSnapshot<S> {
    pub phase: CallPhase,
    pub remote_peer: Option<PeerId>,
    pub local_stream: Option<S>,
    pub remote_stream: Option<S>,
    pub roster: Vec<PeerId>,
    /// Identity assigned by the relay, for display only.
    pub local_id: Option<PeerId>,
}

type Observer = Rc<dyn Fn(CallUpdate)>;

struct DispatcherInner<S, K, L: PeerLink> {
    local_id: Option<PeerId>,
    roster: Roster,
    session: CallSession<S, L>,
    constraints: MediaConstraints,
    local_sink: Option<K>,
    remote_sink: Option<K>,
    observer: Option<Observer>,
}

/// Handle to the call machinery of one endpoint.
///
/// This class is a pointer to the underlying resource and can be cloned freely.
pub struct CallDispatcher<T, M, F>
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    inner: Rc<RefCell<DispatcherInner<M::Stream, M::Sink, F::Link>>>,
    transport: Rc<T>,
    media: Rc<M>,
    links: Rc<F>,
}

impl<T, M, F> Clone for CallDispatcher<T, M, F>
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            transport: Rc::clone(&self.transport),
            media: Rc::clone(&self.media),
            links: Rc::clone(&self.links),
        }
    }
}

/// Non-owning handle captured by peer link callbacks, so a link never keeps its
/// session alive.
struct WeakDispatcher<T, M, F>
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    inner: Weak<RefCell<DispatcherInner<M::Stream, M::Sink, F::Link>>>,
    transport: Rc<T>,
    media: Rc<M>,
    links: Rc<F>,
}

impl<T, M, F> WeakDispatcher<T, M, F>
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    fn upgrade(&self) -> Option<CallDispatcher<T, M, F>> {
        Some(CallDispatcher {
            inner: self.inner.upgrade()?,
            transport: Rc::clone(&self.transport),
            media: Rc::clone(&self.media),
            links: Rc::clone(&self.links),
        })
    }
}

impl<T, M, F> CallDispatcher<T, M, F>
where
    T: SignalingTransport + 'static,
    M: MediaDevices + 'static,
    F: PeerLinkFactory<Stream = M::Stream> + 'static,
    F::Link: 'static,
{
    pub fn new(transport: T, media: M, links: F, constraints: MediaConstraints) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DispatcherInner {
                local_id: None,
                roster: Roster::new(),
                session: CallSession::new(),
                constraints,
                local_sink: None,
                remote_sink: None,
                observer: None,
            })),
            transport: Rc::new(transport),
            media: Rc::new(media),
            links: Rc::new(links),
        }
    }

    pub fn set_observer(&self, observer: impl Fn(CallUpdate) + 'static) {
        self.inner.borrow_mut().observer = Some(Rc::new(observer));
    }

    /// Where the local preview is rendered. The current stream, if any, is bound right away.
    pub fn set_local_sink(&self, sink: M::Sink) {
        let mut inner = self.inner.borrow_mut();
        self.media.bind(inner.session.local_stream(), &sink);
        inner.local_sink = Some(sink);
    }

    /// Where the remote party is rendered. The current stream, if any, is bound right away.
    pub fn set_remote_sink(&self, sink: M::Sink) {
        let mut inner = self.inner.borrow_mut();
        self.media.bind(inner.session.remote_stream(), &sink);
        inner.remote_sink = Some(sink);
    }

    #[must_use]
    pub fn snapshot(&self) -> CallSnapshot<M::Stream> {
        let inner = self.inner.borrow();
        CallSnapshot {
            phase: inner.session.phase(),
            remote_peer: inner.session.remote_peer().cloned(),
            local_stream: inner.session.local_stream().cloned(),
            remote_stream: inner.session.remote_stream().cloned(),
            roster: inner.roster.to_vec(),
            local_id: inner.local_id.clone(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> CallPhase {
        self.inner.borrow().session.phase()
    }

    #[must_use]
    pub fn remote_peer(&self) -> Option<PeerId> {
        self.inner.borrow().session.remote_peer().cloned()
    }

    #[must_use]
    pub fn roster(&self) -> Vec<PeerId> {
        self.inner.borrow().roster.to_vec()
    }

    #[must_use]
    pub fn local_id(&self) -> Option<PeerId> {
        self.inner.borrow().local_id.clone()
    }

    /// Call `peer`: capture local media, create a fresh link and send it an offer.
    ///
    /// The session leaves idle before the first suspend point, so a second call placed
    /// while this one is still being prepared is refused.
    ///
    /// # Errors
    /// - [`Error::AlreadyInCall`] if a call is in progress, nothing is changed then,
    /// - [`Error::MediaUnavailable`], [`Error::NegotiationFailed`] or
    ///   [`Error::TransportUnavailable`] after the attempt was torn down,
    /// - [`Error::Cancelled`] if the call was hung up before the offer left.
    pub async fn place_call(&self, peer: PeerId) -> Result<()> {
        let begun = self
            .inner
            .borrow_mut()
            .session
            .begin(CallPhase::Outgoing, peer.clone());
        let attempt = match begun {
            Ok(attempt) => attempt,
            Err(err) => {
                warn!("refusing to call {}: {}", peer, err);
                if let Error::AlreadyInCall { peer: ref current } = err {
                    self.notify(CallUpdate::Busy {
                        peer: current.clone(),
                    });
                }
                return Err(err);
            }
        };
        info!("placing a call to {}", peer);
        self.notify(CallUpdate::StateChanged);

        let result = self.run_outgoing(attempt, &peer).await;
        self.settle(attempt, &peer, result)
    }

    async fn run_outgoing(&self, attempt: Attempt, peer: &PeerId) -> Result<()> {
        let link = self.prepare_link(attempt, peer).await?;
        let offer = link.create_offer().await?;
        self.ensure_current(attempt, peer)?;
        self.send(ClientMessage::CallUser {
            offer,
            to: peer.clone(),
        })?;
        self.inner.borrow_mut().session.offer_sent(attempt);
        debug!("sent an offer to {} successfully", peer);
        Ok(())
    }

    /// Hang up. With `Some(peer)` only a call with that peer is ended.
    /// Does nothing while idle.
    pub fn end_call(&self, peer: Option<&PeerId>) {
        {
            let inner = self.inner.borrow();
            if inner.session.is_idle() {
                debug!("no call to end");
                return;
            }
            if let Some(peer) = peer {
                if !inner.session.involves(peer) {
                    debug!("not in a call with {}, nothing to end", peer);
                    return;
                }
            }
        }
        self.teardown(EndReason::LocalHangup, true);
    }

    /// Replace the roster with the relay's authoritative list.
    /// A call whose remote party is missing from it is torn down.
    pub fn apply_full_update(&self, peers: Vec<PeerId>) {
        let remote_gone = {
            let mut inner = self.inner.borrow_mut();
            let local_id = inner.local_id.clone();
            let departed = inner.roster.apply_full_update(
                peers
                    .into_iter()
                    .filter(|peer| Some(peer) != local_id.as_ref()),
            );
            debug!(
                "roster updated: {} peers, {} departed",
                inner.roster.len(),
                departed.len()
            );
            inner
                .session
                .remote_peer()
                .is_some_and(|remote| !inner.roster.contains(remote))
        };
        if remote_gone {
            warn!("remote party is no longer reachable");
            self.teardown(EndReason::PeerLeft, false);
        }
        self.notify(CallUpdate::StateChanged);
    }

    pub fn add_peer(&self, peer: PeerId) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.local_id.as_ref() == Some(&peer) {
                return;
            }
            if !inner.roster.add_peer(peer) {
                return;
            }
        }
        self.notify(CallUpdate::StateChanged);
    }

    /// Drop `peer` from the roster, ending the call with it if there is one.
    pub fn remove_peer(&self, peer: &PeerId) {
        let in_call = {
            let mut inner = self.inner.borrow_mut();
            inner.roster.remove_peer(peer);
            inner.session.involves(peer)
        };
        if in_call {
            warn!("{} left while in a call with us", peer);
            self.teardown(EndReason::PeerLeft, false);
        }
        self.notify(CallUpdate::StateChanged);
    }

    /// The connection to the relay is gone: end the call, forget roster and identity.
    pub fn handle_transport_closed(&self, reason: &str) {
        error!("lost connection to the signaling relay: {}", reason);
        let had_call = self.teardown(EndReason::TransportLost, false).is_some();
        {
            let mut inner = self.inner.borrow_mut();
            inner.roster.clear();
            inner.local_id = None;
        }
        if had_call {
            self.notify(CallUpdate::Failed(Error::TransportUnavailable(
                reason.to_owned(),
            )));
        }
        self.notify(CallUpdate::StateChanged);
    }

    /// Apply one message received from the relay.
    ///
    /// Answers, candidates and hangups that match no pending call are logged and dropped.
    ///
    /// # Errors
    /// - [`Error::AlreadyInCall`] for an offer refused because another call is in progress,
    /// - the errors of [`place_call`](Self::place_call) when answering an offer or
    ///   applying an answer aborted the call.
    pub async fn handle_message(&self, message: ServerMessage) -> Result<()> {
        let result = match message {
            ServerMessage::Connected { id } => {
                self.set_local_id(id);
                Ok(())
            }
            ServerMessage::CallMade { from, offer } => {
                message_handler::receive_offer(self, from, offer).await
            }
            ServerMessage::AnswerMade { from, answer } => {
                message_handler::receive_answer(self, from, answer).await
            }
            ServerMessage::IceReceived { from, candidate } => {
                message_handler::receive_remote_candidate(self, from, candidate).await
            }
            ServerMessage::CallEnded { from } => {
                message_handler::receive_call_ended(self, from.as_ref())
            }
            ServerMessage::AddUserToList { user } => {
                self.add_peer(user);
                Ok(())
            }
            ServerMessage::RemoveUserFromList { user } => {
                self.remove_peer(&user);
                Ok(())
            }
            ServerMessage::UpdateUsersList { users } => {
                self.apply_full_update(users);
                Ok(())
            }
        };
        match result {
            Err(err) if err.is_silent() => {
                debug!("{}", err);
                Ok(())
            }
            other => other,
        }
    }

    fn set_local_id(&self, id: PeerId) {
        info!("connected to the signaling relay as {}", id);
        {
            let mut inner = self.inner.borrow_mut();
            inner.roster.remove_peer(&id);
            inner.local_id = Some(id);
        }
        self.notify(CallUpdate::StateChanged);
    }

    fn notify(&self, update: CallUpdate) {
        let observer = self.inner.borrow().observer.clone();
        if let Some(observer) = observer {
            observer(update);
        }
    }

    fn send(&self, message: ClientMessage) -> Result<()> {
        self.transport
            .send(&message)
            .map_err(|err| Error::TransportUnavailable(format!("{err:#}")))
    }

    fn ensure_current(&self, attempt: Attempt, peer: &PeerId) -> Result<()> {
        if self.inner.borrow().session.is_current(attempt) {
            Ok(())
        } else {
            Err(Error::Cancelled { peer: peer.clone() })
        }
    }

    fn bind_local(&self, stream: Option<&M::Stream>) {
        if let Some(sink) = self.inner.borrow().local_sink.as_ref() {
            self.media.bind(stream, sink);
        }
    }

    fn bind_remote(&self, stream: Option<&M::Stream>) {
        if let Some(sink) = self.inner.borrow().remote_sink.as_ref() {
            self.media.bind(stream, sink);
        }
    }

    /// Capture local media and create the link for `attempt`, storing both in the session.
    async fn prepare_link(
        &self,
        attempt: Attempt,
        peer: &PeerId,
    ) -> Result<Rc<NegotiationEngine<F::Link>>> {
        let constraints = self.inner.borrow().constraints;
        let stream = self
            .media
            .acquire(constraints)
            .await
            .map_err(|err| Error::MediaUnavailable(format!("{err:#}")))?;
        if let Err(err) = self.ensure_current(attempt, peer) {
            self.media.release(&stream);
            return Err(err);
        }

        let link = match self.links.create(&stream, self.link_events(attempt, peer)) {
            Ok(link) => Rc::new(NegotiationEngine::new(peer.clone(), link)),
            Err(err) => {
                self.media.release(&stream);
                return Err(Error::NegotiationFailed(format!(
                    "failed to create peer link: {err:#}"
                )));
            }
        };
        let attached = self
            .inner
            .borrow_mut()
            .session
            .attach(attempt, stream.clone(), Rc::clone(&link));
        if let Err((orphan_stream, orphan_link)) = attached {
            orphan_link.close();
            self.media.release(&orphan_stream);
            return Err(Error::Cancelled { peer: peer.clone() });
        }
        self.bind_local(Some(&stream));
        self.notify(CallUpdate::StateChanged);
        Ok(link)
    }

    fn link_events(&self, attempt: Attempt, peer: &PeerId) -> LinkEvents<M::Stream> {
        let weak = WeakDispatcher {
            inner: Rc::downgrade(&self.inner),
            transport: Rc::clone(&self.transport),
            media: Rc::clone(&self.media),
            links: Rc::clone(&self.links),
        };
        let peer = peer.clone();
        LinkEvents::new(move |event| {
            if let Some(dispatcher) = weak.upgrade() {
                dispatcher.on_link_event(attempt, &peer, event);
            }
        })
    }

    fn on_link_event(&self, attempt: Attempt, peer: &PeerId, event: LinkEvent<M::Stream>) {
        match event {
            LinkEvent::LocalCandidate(candidate) => {
                if !self.inner.borrow().session.is_current(attempt) {
                    debug!("dropping local candidate of an ended call with {}", peer);
                    return;
                }
                let message = ClientMessage::SendIceCandidate {
                    candidate,
                    to: peer.clone(),
                };
                if let Err(err) = self.send(message) {
                    warn!("failed to send one of the ICE candidates: {}", err);
                }
            }
            LinkEvent::RemoteStream(stream) => {
                let replaced = self
                    .inner
                    .borrow_mut()
                    .session
                    .replace_remote_stream(attempt, stream.clone());
                if replaced.is_err() {
                    debug!("dropping remote stream of an ended call with {}", peer);
                    return;
                }
                info!("received remote stream from {}", peer);
                self.bind_remote(Some(&stream));
                self.notify(CallUpdate::StateChanged);
            }
        }
    }

    /// Turn the outcome of an asynchronous step into the session's next state.
    ///
    /// A step that failed after its attempt was outlived reports [`Error::Cancelled`],
    /// whatever the link said.
    fn settle(&self, attempt: Attempt, peer: &PeerId, result: Result<()>) -> Result<()> {
        let Err(err) = result else {
            return Ok(());
        };
        if err.is_silent() {
            debug!("{}", err);
            return Err(err);
        }
        let current = self.inner.borrow().session.is_current(attempt);
        if current {
            error!("call attempt failed: {}", err);
            self.teardown(EndReason::Failed, true);
            self.notify(CallUpdate::Failed(err.clone()));
            Err(err)
        } else {
            debug!("outlived call attempt failed: {}", err);
            Err(Error::Cancelled { peer: peer.clone() })
        }
    }

    /// Back to idle: close the link, stop every track, blank the sinks and, if asked and
    /// the remote side knows about the call, tell it we hung up.
    fn teardown(&self, reason: EndReason, notify_remote: bool) -> Option<PeerId> {
        let released = self.inner.borrow_mut().session.teardown()?;
        let Released {
            peer,
            phase,
            contacted,
            local_stream,
            remote_stream,
            link,
        } = released;

        if notify_remote && contacted {
            if let Err(err) = self.send(ClientMessage::EndCall { to: peer.clone() }) {
                warn!("failed to notify {} about the hangup: {}", peer, err);
            }
        }
        if let Some(link) = link {
            link.close();
        }
        for stream in local_stream.iter().chain(remote_stream.iter()) {
            self.media.release(stream);
        }
        self.bind_local(None);
        self.bind_remote(None);

        info!("call with {} ended while {}: {:?}", peer, phase, reason);
        self.notify(CallUpdate::Ended {
            peer: peer.clone(),
            reason,
        });
        self.notify(CallUpdate::StateChanged);
        Some(peer)
    }
}
