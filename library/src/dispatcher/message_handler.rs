use ::log::{debug, info, warn};
use wasm_call_protocol::{ClientMessage, IceCandidate, PeerId, SessionDescription};

use super::{CallDispatcher, CallUpdate, EndReason};
use crate::error::{Error, Result};
use crate::media::MediaDevices;
use crate::negotiation::PeerLinkFactory;
use crate::session::{Attempt, CallPhase};
use crate::transport::SignalingTransport;

/// How an inbound offer relates to the session we already have.
enum Admission {
    Accept,
    /// Offer repeated by the party we are already answering or talking to.
    Duplicate,
    /// Both sides offered to each other at once.
    Glare { yield_to_remote: bool },
    Busy { current: PeerId },
}

fn admit_offer<T, M, F>(dispatcher: &CallDispatcher<T, M, F>, from: &PeerId) -> Admission
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    let inner = dispatcher.inner.borrow();
    match inner.session.remote_peer() {
        None => Admission::Accept,
        Some(current) if current == from => match inner.session.phase() {
            // the endpoint with the lower id gives way, without an id there is nothing to compare
            CallPhase::Outgoing => Admission::Glare {
                yield_to_remote: inner.local_id.as_ref().is_some_and(|local| local < from),
            },
            _ => Admission::Duplicate,
        },
        Some(current) => Admission::Busy {
            current: current.clone(),
        },
    }
}

/// Answer an offer, or refuse it if we are busy with somebody else.
pub(super) async fn receive_offer<T, M, F>(
    dispatcher: &CallDispatcher<T, M, F>,
    from: PeerId,
    offer: SessionDescription,
) -> Result<()>
where
    T: SignalingTransport + 'static,
    M: MediaDevices + 'static,
    F: PeerLinkFactory<Stream = M::Stream> + 'static,
    F::Link: 'static,
{
    match admit_offer(dispatcher, &from) {
        Admission::Accept => {}
        Admission::Duplicate => {
            debug!("already in a call with {}, ignoring repeated offer", from);
            return Ok(());
        }
        Admission::Glare {
            yield_to_remote: false,
        } => {
            info!("offer from {} crossed ours, keeping ours", from);
            return Ok(());
        }
        Admission::Glare {
            yield_to_remote: true,
        } => {
            info!("offer from {} crossed ours, answering theirs", from);
            dispatcher.teardown(EndReason::Superseded, false);
        }
        Admission::Busy { current } => {
            warn!("refusing call from {}, busy with {}", from, current);
            if let Err(err) = dispatcher.send(ClientMessage::EndCall { to: from }) {
                warn!("failed to refuse the call: {}", err);
            }
            return Err(Error::AlreadyInCall { peer: current });
        }
    }

    let attempt = dispatcher
        .inner
        .borrow_mut()
        .session
        .begin(CallPhase::Incoming, from.clone())?;
    info!("incoming call from {}", from);
    dispatcher.notify(CallUpdate::StateChanged);

    let result = answer_offer(dispatcher, attempt, &from, &offer).await;
    dispatcher.settle(attempt, &from, result)
}

async fn answer_offer<T, M, F>(
    dispatcher: &CallDispatcher<T, M, F>,
    attempt: Attempt,
    from: &PeerId,
    offer: &SessionDescription,
) -> Result<()>
where
    T: SignalingTransport + 'static,
    M: MediaDevices + 'static,
    F: PeerLinkFactory<Stream = M::Stream> + 'static,
    F::Link: 'static,
{
    let link = dispatcher.prepare_link(attempt, from).await?;
    let answer = link.accept_offer(offer).await?;
    dispatcher.ensure_current(attempt, from)?;
    dispatcher.send(ClientMessage::MakeAnswer {
        answer,
        to: from.clone(),
    })?;
    dispatcher.inner.borrow_mut().session.activate(attempt);
    info!("answered {}, call is active", from);
    dispatcher.notify(CallUpdate::StateChanged);
    Ok(())
}

/// Apply the answer to our pending offer. Only the first answer is taken.
pub(super) async fn receive_answer<T, M, F>(
    dispatcher: &CallDispatcher<T, M, F>,
    from: PeerId,
    answer: SessionDescription,
) -> Result<()>
where
    T: SignalingTransport + 'static,
    M: MediaDevices + 'static,
    F: PeerLinkFactory<Stream = M::Stream> + 'static,
    F::Link: 'static,
{
    let claimed = dispatcher.inner.borrow_mut().session.claim_answer(&from);
    let Some((attempt, link)) = claimed else {
        return Err(Error::StaleMessage { peer: from });
    };

    let applied = link.apply_answer(&answer).await;
    let result = applied.and_then(|()| {
        dispatcher.ensure_current(attempt, &from)?;
        dispatcher.inner.borrow_mut().session.activate(attempt);
        info!("{} answered, call is active", from);
        dispatcher.notify(CallUpdate::StateChanged);
        Ok(())
    });
    dispatcher.settle(attempt, &from, result)
}

/// Hand a remote candidate to the current link. A rejected candidate does not end the call.
pub(super) async fn receive_remote_candidate<T, M, F>(
    dispatcher: &CallDispatcher<T, M, F>,
    from: PeerId,
    candidate: IceCandidate,
) -> Result<()>
where
    M: MediaDevices,
    F: PeerLinkFactory,
{
    let link = dispatcher.inner.borrow().session.link_for(&from);
    let Some(link) = link else {
        return Err(Error::StaleMessage { peer: from });
    };
    if let Err(err) = link.add_remote_candidate(&candidate).await {
        warn!("discarding ICE candidate from {}: {}", from, err);
    }
    Ok(())
}

/// The remote party hung up or refused our offer.
pub(super) fn receive_call_ended<T, M, F>(
    dispatcher: &CallDispatcher<T, M, F>,
    from: Option<&PeerId>,
) -> Result<()>
where
    T: SignalingTransport + 'static,
    M: MediaDevices + 'static,
    F: PeerLinkFactory<Stream = M::Stream> + 'static,
    F::Link: 'static,
{
    {
        let inner = dispatcher.inner.borrow();
        if inner.session.is_idle() {
            debug!("hangup received while idle");
            return Ok(());
        }
        if let Some(peer) = from {
            if !inner.session.involves(peer) {
                return Err(Error::StaleMessage { peer: peer.clone() });
            }
        }
    }
    dispatcher.teardown(EndReason::RemoteHangup, false);
    Ok(())
}
