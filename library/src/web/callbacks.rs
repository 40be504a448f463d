use js_sys::{ArrayBuffer, Uint8Array};
use log::{debug, error, info, warn};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_call_protocol::IceCandidate;
use web_sys::{
    CloseEvent, MediaStream, MessageEvent, RtcPeerConnection, RtcPeerConnectionIceEvent,
    RtcTrackEvent, WebSocket,
};

use crate::codec;
use crate::negotiation::LinkEvents;
use crate::web::WebDispatcher;

/// handle message sent by signaling server
pub fn set_websocket_on_message(websocket: &WebSocket, dispatcher: WebDispatcher) {
    let on_message_callback: Box<dyn FnMut(MessageEvent)> = Box::new(move |ev: MessageEvent| {
        let Ok(frame) = ev
            .data()
            .dyn_into::<ArrayBuffer>()
            .map(|buffer| Uint8Array::new(&buffer).to_vec())
        else {
            error!("failed to convert message to Uint8Array");
            return;
        };
        let message = match codec::decode(&frame) {
            Ok(message) => message,
            Err(err) => {
                error!("failed to deserialize message: {:#}", err);
                return;
            }
        };
        let dispatcher = dispatcher.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = dispatcher.handle_message(message).await {
                error!("error handling websocket message: {}", err);
            }
        });
    });
    let on_message_callback = Closure::wrap(on_message_callback);
    websocket.set_onmessage(Some(on_message_callback.as_ref().unchecked_ref()));
    on_message_callback.forget();
}

pub fn set_websocket_on_open(websocket: &WebSocket) {
    let on_open_callback: Box<dyn FnMut(JsValue)> = Box::new(move |_| {
        info!("connected to the signaling relay, waiting for an identity");
    });
    let on_open_callback = Closure::wrap(on_open_callback);
    websocket.set_onopen(Some(on_open_callback.as_ref().unchecked_ref()));
    on_open_callback.forget();
}

pub fn set_websocket_on_close(websocket: &WebSocket, dispatcher: WebDispatcher) {
    let on_close_callback: Box<dyn FnMut(CloseEvent)> = Box::new(move |ev: CloseEvent| {
        let reason = format!("websocket closed with code {}: {}", ev.code(), ev.reason());
        dispatcher.handle_transport_closed(&reason);
    });
    let on_close_callback = Closure::wrap(on_close_callback);
    websocket.set_onclose(Some(on_close_callback.as_ref().unchecked_ref()));
    on_close_callback.forget();
}

// a close event always follows, that is where the call gets cleaned up
pub fn set_websocket_on_error(websocket: &WebSocket) {
    let on_error: Box<dyn FnMut(JsValue)> = Box::new(move |websocket_error| {
        error!("websocket error: {:?}", websocket_error);
    });
    let on_error = Closure::wrap(on_error);
    websocket.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    on_error.forget();
}

/// Relay every locally gathered candidate to the link's owner.
///
/// The returned closure must outlive the peer connection's use of it.
pub fn set_peer_connection_on_ice_candidate(
    peer_connection: &RtcPeerConnection,
    events: LinkEvents<MediaStream>,
) -> Closure<dyn FnMut(RtcPeerConnectionIceEvent)> {
    let on_ice_candidate: Box<dyn FnMut(RtcPeerConnectionIceEvent)> =
        Box::new(move |ev: RtcPeerConnectionIceEvent| {
            let Some(candidate) = ev.candidate() else {
                debug!("ICE candidate gathering finished");
                return;
            };
            let candidate = IceCandidate {
                candidate: candidate.candidate(),
                sdp_mid: candidate.sdp_mid(),
                sdp_m_line_index: candidate.sdp_m_line_index(),
            };
            if candidate.candidate.is_empty() {
                return;
            }
            debug!("gathered local ICE candidate: {:?}", candidate);
            events.local_candidate(candidate);
        });
    let on_ice_candidate = Closure::wrap(on_ice_candidate);
    peer_connection.set_onicecandidate(Some(on_ice_candidate.as_ref().unchecked_ref()));
    on_ice_candidate
}

pub fn set_peer_connection_on_track(
    peer_connection: &RtcPeerConnection,
    events: LinkEvents<MediaStream>,
) -> Closure<dyn FnMut(RtcTrackEvent)> {
    let on_track: Box<dyn FnMut(RtcTrackEvent)> = Box::new(move |ev: RtcTrackEvent| {
        match ev.streams().get(0).dyn_into::<MediaStream>() {
            Ok(stream) => events.remote_stream(stream),
            Err(value) => warn!("remote track arrived without a stream: {:?}", value),
        }
    });
    let on_track = Closure::wrap(on_track);
    peer_connection.set_ontrack(Some(on_track.as_ref().unchecked_ref()));
    on_track
}

pub fn set_peer_connection_on_ice_connection_state_change(
    peer_connection: &RtcPeerConnection,
) -> Closure<dyn FnMut()> {
    let peer_connection_clone = peer_connection.clone();
    let on_ice_connection_state_change: Box<dyn FnMut()> = Box::new(move || {
        debug!(
            "connection state change: {:?}",
            peer_connection_clone.ice_connection_state()
        );
    });
    let on_ice_connection_state_change = Closure::wrap(on_ice_connection_state_change);
    peer_connection.set_oniceconnectionstatechange(Some(
        on_ice_connection_state_change.as_ref().unchecked_ref(),
    ));
    on_ice_connection_state_change
}
