//! Test suite for the Web and headless browsers.

#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use wasm_call::web::{self, RtcLinkFactory, WebSocketTransport};
use wasm_call::{
    CallConfig, ClientMessage, ConnectionType, Error, LinkEvents, MediaConstraints,
    NegotiationEngine, PeerId, PeerLinkFactory, SignalingTransport,
};
use web_sys::{MediaStream, RtcSignalingState};

wasm_bindgen_test_configure!(run_in_browser);

fn local_link(peer: &str) -> NegotiationEngine<web::RtcLink> {
    let factory = RtcLinkFactory::new(ConnectionType::Local);
    let stream = MediaStream::new().unwrap();
    let link = factory
        .create(&stream, LinkEvents::new(|_| {}))
        .expect("creating peer connection failed!");
    NegotiationEngine::new(PeerId::from(peer), link)
}

#[wasm_bindgen_test]
async fn offer_and_answer_complete_between_two_links() {
    let caller = local_link("callee");
    let callee = local_link("caller");

    let offer = caller.create_offer().await.unwrap();
    let answer = callee.accept_offer(&offer).await.unwrap();
    caller.apply_answer(&answer).await.unwrap();

    assert!(!answer.sdp.is_empty());
    assert_eq!(
        callee.link().peer_connection().signaling_state(),
        RtcSignalingState::Stable
    );
    assert_eq!(
        caller.link().peer_connection().signaling_state(),
        RtcSignalingState::Stable
    );
}

#[wasm_bindgen_test]
async fn closed_link_refuses_to_negotiate() {
    let caller = local_link("callee");
    caller.close();

    assert!(matches!(
        caller.create_offer().await,
        Err(Error::NegotiationFailed(_))
    ));
}

#[wasm_bindgen_test]
fn sending_before_socket_opens_fails() {
    let transport = WebSocketTransport::open("ws://127.0.0.1:9/call").unwrap();

    let result = transport.send(&ClientMessage::EndCall {
        to: PeerId::from("peer-7"),
    });

    assert!(result.is_err());
}

#[wasm_bindgen_test]
fn invalid_config_is_rejected_before_connecting() {
    let config = CallConfig {
        media: MediaConstraints {
            audio: false,
            video: false,
        },
        ..CallConfig::default()
    };

    assert!(matches!(web::connect(config), Err(Error::InvalidConfig(_))));
}
