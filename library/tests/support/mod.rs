#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::bail;
use tokio::sync::oneshot;
use wasm_call::{
    CallDispatcher, CallUpdate, ClientMessage, IceCandidate, LinkEvents, MediaConstraints,
    MediaDevices, PeerId, PeerLink, PeerLinkFactory, SdpType, ServerMessage, SessionDescription,
    SignalingTransport,
};

pub const FAKE_OFFER: &str = "v=0 fake offer";
pub const FAKE_ANSWER: &str = "v=0 fake answer";

pub fn peer(id: &str) -> PeerId {
    PeerId::from(id)
}

pub fn offer() -> SessionDescription {
    SessionDescription::offer("v=0 remote offer".to_owned())
}

pub fn answer() -> SessionDescription {
    SessionDescription::answer("v=0 remote answer".to_owned())
}

pub fn candidate() -> IceCandidate {
    IceCandidate {
        candidate: "candidate:1 1 udp 2122260223 192.168.1.10 54400 typ host".to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
    }
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    sent: Rc<RefCell<Vec<ClientMessage>>>,
    offline: Rc<Cell<bool>>,
}

impl FakeTransport {
    pub fn go_offline(&self) {
        self.offline.set(true);
    }

    pub fn take_sent(&self) -> Vec<ClientMessage> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl SignalingTransport for FakeTransport {
    fn send(&self, message: &ClientMessage) -> anyhow::Result<()> {
        if self.offline.get() {
            bail!("websocket is not open");
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeStream {
    pub id: u32,
    stopped: Rc<Cell<bool>>,
}

impl FakeStream {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            stopped: Rc::new(Cell::new(false)),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

/// Stands in for a `<video>` element: remembers which stream it shows.
#[derive(Clone, Default)]
pub struct FakeSink(Rc<Cell<Option<u32>>>);

impl FakeSink {
    pub fn shown(&self) -> Option<u32> {
        self.0.get()
    }
}

type Hold = (oneshot::Sender<()>, oneshot::Receiver<()>);

#[derive(Clone, Default)]
pub struct FakeMedia {
    next_id: Rc<Cell<u32>>,
    acquired: Rc<RefCell<Vec<FakeStream>>>,
    denied: Rc<Cell<bool>>,
    hold: Rc<RefCell<Option<Hold>>>,
}

impl FakeMedia {
    pub fn deny(&self) {
        self.denied.set(true);
    }

    /// Suspend the next `acquire`: the first receiver fires once it started,
    /// it finishes after the sender fires.
    pub fn hold_next_acquire(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.hold.borrow_mut() = Some((started_tx, release_rx));
        (started_rx, release_tx)
    }

    pub fn acquired(&self) -> Vec<FakeStream> {
        self.acquired.borrow().clone()
    }
}

impl MediaDevices for FakeMedia {
    type Stream = FakeStream;
    type Sink = FakeSink;

    async fn acquire(&self, _constraints: MediaConstraints) -> anyhow::Result<FakeStream> {
        let hold = self.hold.borrow_mut().take();
        if let Some((started, release)) = hold {
            let _ = started.send(());
            let _ = release.await;
        }
        if self.denied.get() {
            bail!("NotAllowedError: Permission denied");
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let stream = FakeStream::new(id);
        self.acquired.borrow_mut().push(stream.clone());
        Ok(stream)
    }

    fn bind(&self, stream: Option<&FakeStream>, sink: &FakeSink) {
        sink.0.set(stream.map(|stream| stream.id));
    }

    fn release(&self, stream: &FakeStream) {
        stream.stopped.set(true);
    }
}

/// Test-side view of a link the dispatcher created.
#[derive(Clone)]
pub struct LinkProbe {
    pub local_stream: u32,
    pub events: LinkEvents<FakeStream>,
    calls: Rc<RefCell<Vec<&'static str>>>,
    closed: Rc<Cell<bool>>,
}

impl LinkProbe {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|&&made| made == call).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Behaves like `RTCPeerConnection`: every operation fails once the link is closed.
pub struct FakeLink {
    calls: Rc<RefCell<Vec<&'static str>>>,
    closed: Rc<Cell<bool>>,
    hold_offer: RefCell<Option<Hold>>,
    reject_answers: bool,
    reject_candidates: bool,
}

impl FakeLink {
    fn ensure_open(&self) -> anyhow::Result<()> {
        if self.closed.get() {
            bail!("InvalidStateError: RTCPeerConnection is closed");
        }
        Ok(())
    }
}

impl PeerLink for FakeLink {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription> {
        self.calls.borrow_mut().push("create_offer");
        let hold = self.hold_offer.borrow_mut().take();
        if let Some((started, release)) = hold {
            let _ = started.send(());
            let _ = release.await;
        }
        self.ensure_open()?;
        Ok(SessionDescription::offer(FAKE_OFFER.to_owned()))
    }

    async fn create_answer(&self) -> anyhow::Result<SessionDescription> {
        self.calls.borrow_mut().push("create_answer");
        self.ensure_open()?;
        Ok(SessionDescription::answer(FAKE_ANSWER.to_owned()))
    }

    async fn set_local_description(&self, _: &SessionDescription) -> anyhow::Result<()> {
        self.calls.borrow_mut().push("set_local");
        self.ensure_open()?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> anyhow::Result<()> {
        self.calls.borrow_mut().push("set_remote");
        self.ensure_open()?;
        if self.reject_answers && description.kind == SdpType::Answer {
            bail!("InvalidStateError: Failed to set remote answer sdp");
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, _: &IceCandidate) -> anyhow::Result<()> {
        self.calls.borrow_mut().push("add_candidate");
        self.ensure_open()?;
        if self.reject_candidates {
            bail!("OperationError: Error processing ICE candidate");
        }
        Ok(())
    }

    fn close(&self) {
        self.calls.borrow_mut().push("close");
        self.closed.set(true);
    }
}

#[derive(Clone, Default)]
pub struct FakeLinkFactory {
    probes: Rc<RefCell<Vec<LinkProbe>>>,
    hold_offer: Rc<RefCell<Option<Hold>>>,
    reject_answers: Rc<Cell<bool>>,
    reject_candidates: Rc<Cell<bool>>,
}

impl FakeLinkFactory {
    /// Suspend `create_offer` on the next link, gated like
    /// [`FakeMedia::hold_next_acquire`].
    pub fn hold_next_offer(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.hold_offer.borrow_mut() = Some((started_tx, release_rx));
        (started_rx, release_tx)
    }

    pub fn reject_answers(&self) {
        self.reject_answers.set(true);
    }

    pub fn reject_candidates(&self) {
        self.reject_candidates.set(true);
    }

    pub fn probes(&self) -> Vec<LinkProbe> {
        self.probes.borrow().clone()
    }
}

impl PeerLinkFactory for FakeLinkFactory {
    type Stream = FakeStream;
    type Link = FakeLink;

    fn create(
        &self,
        local_stream: &FakeStream,
        events: LinkEvents<FakeStream>,
    ) -> anyhow::Result<FakeLink> {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let closed = Rc::new(Cell::new(false));
        self.probes.borrow_mut().push(LinkProbe {
            local_stream: local_stream.id,
            events,
            calls: Rc::clone(&calls),
            closed: Rc::clone(&closed),
        });
        Ok(FakeLink {
            calls,
            closed,
            hold_offer: RefCell::new(self.hold_offer.borrow_mut().take()),
            reject_answers: self.reject_answers.get(),
            reject_candidates: self.reject_candidates.get(),
        })
    }
}

pub type Dispatcher = CallDispatcher<FakeTransport, FakeMedia, FakeLinkFactory>;

/// One endpoint wired to fakes, with every observer update recorded.
pub struct Harness {
    pub dispatcher: Dispatcher,
    pub transport: FakeTransport,
    pub media: FakeMedia,
    pub links: FakeLinkFactory,
    pub local_sink: FakeSink,
    pub remote_sink: FakeSink,
    updates: Rc<RefCell<Vec<CallUpdate>>>,
}

impl Harness {
    pub fn new() -> Self {
        let transport = FakeTransport::default();
        let media = FakeMedia::default();
        let links = FakeLinkFactory::default();
        let dispatcher = CallDispatcher::new(
            transport.clone(),
            media.clone(),
            links.clone(),
            MediaConstraints::default(),
        );

        let updates = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&updates);
        dispatcher.set_observer(move |update| recorded.borrow_mut().push(update));

        let local_sink = FakeSink::default();
        let remote_sink = FakeSink::default();
        dispatcher.set_local_sink(local_sink.clone());
        dispatcher.set_remote_sink(remote_sink.clone());

        Self {
            dispatcher,
            transport,
            media,
            links,
            local_sink,
            remote_sink,
            updates,
        }
    }

    /// Endpoint that got `local` assigned and sees `others` online.
    pub async fn connected(local: &str, others: &[&str]) -> Self {
        let harness = Self::new();
        harness
            .receive(ServerMessage::Connected { id: peer(local) })
            .await
            .unwrap();
        harness
            .receive(ServerMessage::UpdateUsersList {
                users: others.iter().map(|id| peer(id)).collect(),
            })
            .await
            .unwrap();
        harness.take_updates();
        harness
    }

    /// `local` called `remote`, the offer left and no answer came back yet.
    pub async fn in_outgoing_call(local: &str, remote: &str) -> Self {
        let harness = Self::connected(local, &[remote]).await;
        harness.dispatcher.place_call(peer(remote)).await.unwrap();
        harness.take_sent();
        harness.take_updates();
        harness
    }

    /// `local` called `remote`, who answered.
    pub async fn in_answered_call(local: &str, remote: &str) -> Self {
        let harness = Self::in_outgoing_call(local, remote).await;
        harness
            .receive(ServerMessage::AnswerMade {
                from: peer(remote),
                answer: answer(),
            })
            .await
            .unwrap();
        harness.take_sent();
        harness.take_updates();
        harness
    }

    /// `remote` called `local`, who answered.
    pub async fn in_incoming_call(local: &str, remote: &str) -> Self {
        let harness = Self::connected(local, &[remote]).await;
        harness
            .receive(ServerMessage::CallMade {
                from: peer(remote),
                offer: offer(),
            })
            .await
            .unwrap();
        harness.take_sent();
        harness.take_updates();
        harness
    }

    pub async fn receive(&self, message: ServerMessage) -> wasm_call::Result<()> {
        self.dispatcher.handle_message(message).await
    }

    pub fn take_sent(&self) -> Vec<ClientMessage> {
        self.transport.take_sent()
    }

    pub fn take_updates(&self) -> Vec<CallUpdate> {
        std::mem::take(&mut *self.updates.borrow_mut())
    }

    pub fn last_link(&self) -> LinkProbe {
        self.links.probes().pop().expect("no link was created")
    }

    pub fn local_stream(&self) -> FakeStream {
        self.media.acquired().pop().expect("no media was acquired")
    }
}
