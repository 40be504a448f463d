use anyhow::anyhow;
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_call_protocol::{IceCandidate, SdpType, SessionDescription};
use web_sys::{
    MediaStream, MediaStreamTrack, RtcConfiguration, RtcIceCandidate, RtcIceCandidateInit,
    RtcPeerConnection, RtcPeerConnectionIceEvent, RtcSdpType, RtcSessionDescriptionInit,
    RtcTrackEvent,
};

use crate::config::ConnectionType;
use crate::negotiation::{LinkEvents, PeerLink, PeerLinkFactory};
use crate::web::callbacks::{
    set_peer_connection_on_ice_candidate, set_peer_connection_on_ice_connection_state_change,
    set_peer_connection_on_track,
};

fn js_error(error: JsValue) -> anyhow::Error {
    anyhow!("{:?}", error)
}

pub(crate) fn create_peer_connection(
    connection_type: &ConnectionType,
) -> Result<RtcPeerConnection, JsValue> {
    let ice_servers = Array::new();
    for server in connection_type.ice_servers() {
        let server_entry = Object::new();
        Reflect::set(&server_entry, &"urls".into(), &server.urls.into())?;
        if let Some(username) = server.username {
            Reflect::set(&server_entry, &"username".into(), &username.into())?;
        }
        if let Some(credential) = server.credential {
            Reflect::set(&server_entry, &"credential".into(), &credential.into())?;
        }
        ice_servers.push(&server_entry);
    }

    let mut rtc_configuration = RtcConfiguration::new();
    rtc_configuration.ice_servers(&ice_servers);

    RtcPeerConnection::new_with_configuration(&rtc_configuration)
}

fn sdp_of(description: &JsValue) -> anyhow::Result<String> {
    Reflect::get(description, &JsValue::from_str("sdp"))
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| anyhow!("session description carries no sdp"))
}

fn description_init(description: &SessionDescription) -> RtcSessionDescriptionInit {
    let kind = match description.kind {
        SdpType::Offer => RtcSdpType::Offer,
        SdpType::Answer => RtcSdpType::Answer,
    };
    let mut init = RtcSessionDescriptionInit::new(kind);
    init.sdp(&description.sdp);
    init
}

/// One `RtcPeerConnection` together with the callbacks registered on it.
pub struct RtcLink {
    peer_connection: RtcPeerConnection,
    _on_ice_candidate: Closure<dyn FnMut(RtcPeerConnectionIceEvent)>,
    _on_track: Closure<dyn FnMut(RtcTrackEvent)>,
    _on_ice_connection_state_change: Closure<dyn FnMut()>,
}

impl RtcLink {
    #[must_use]
    pub const fn peer_connection(&self) -> &RtcPeerConnection {
        &self.peer_connection
    }
}

impl PeerLink for RtcLink {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription> {
        let offer = JsFuture::from(self.peer_connection.create_offer())
            .await
            .map_err(js_error)?;
        Ok(SessionDescription::offer(sdp_of(&offer)?))
    }

    async fn create_answer(&self) -> anyhow::Result<SessionDescription> {
        let answer = JsFuture::from(self.peer_connection.create_answer())
            .await
            .map_err(js_error)?;
        Ok(SessionDescription::answer(sdp_of(&answer)?))
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> anyhow::Result<()> {
        let init = description_init(description);
        JsFuture::from(self.peer_connection.set_local_description(&init))
            .await
            .map_err(js_error)?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> anyhow::Result<()> {
        let init = description_init(description);
        JsFuture::from(self.peer_connection.set_remote_description(&init))
            .await
            .map_err(js_error)?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> anyhow::Result<()> {
        let mut rtc_candidate = RtcIceCandidateInit::new(&candidate.candidate);
        rtc_candidate.sdp_mid(candidate.sdp_mid.as_deref());
        rtc_candidate.sdp_m_line_index(candidate.sdp_m_line_index);
        let rtc_candidate = RtcIceCandidate::new(&rtc_candidate).map_err(js_error)?;
        JsFuture::from(
            self.peer_connection
                .add_ice_candidate_with_opt_rtc_ice_candidate(Some(&rtc_candidate)),
        )
        .await
        .map_err(js_error)?;
        Ok(())
    }

    fn close(&self) {
        self.peer_connection.set_onicecandidate(None);
        self.peer_connection.set_ontrack(None);
        self.peer_connection.set_oniceconnectionstatechange(None);
        self.peer_connection.close();
    }
}

/// Creates one [`RtcLink`] per call, using the configured ICE servers.
#[derive(Debug, Clone)]
pub struct RtcLinkFactory {
    connection_type: ConnectionType,
}

impl RtcLinkFactory {
    #[must_use]
    pub const fn new(connection_type: ConnectionType) -> Self {
        Self { connection_type }
    }
}

impl PeerLinkFactory for RtcLinkFactory {
    type Stream = MediaStream;
    type Link = RtcLink;

    fn create(
        &self,
        local_stream: &MediaStream,
        events: LinkEvents<MediaStream>,
    ) -> anyhow::Result<RtcLink> {
        let peer_connection = create_peer_connection(&self.connection_type).map_err(js_error)?;
        for track in local_stream.get_tracks().iter() {
            let track = track.dyn_into::<MediaStreamTrack>().map_err(js_error)?;
            peer_connection.add_track(&track, local_stream, &Array::new());
        }

        Ok(RtcLink {
            _on_ice_candidate: set_peer_connection_on_ice_candidate(
                &peer_connection,
                events.clone(),
            ),
            _on_track: set_peer_connection_on_track(&peer_connection, events),
            _on_ice_connection_state_change: set_peer_connection_on_ice_connection_state_change(
                &peer_connection,
            ),
            peer_connection,
        })
    }
}
