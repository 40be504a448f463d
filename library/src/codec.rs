//! MessagePack framing of signaling messages, one message per WebSocket frame.

use wasm_call_protocol::{ClientMessage, ServerMessage};

/// # Errors
/// Fails if the message cannot be serialized.
pub fn encode(message: &ClientMessage) -> anyhow::Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(message)?)
}

/// # Errors
/// Fails on frames that are not a well-formed [`ServerMessage`].
pub fn decode(frame: &[u8]) -> anyhow::Result<ServerMessage> {
    Ok(rmp_serde::from_slice(frame)?)
}

#[cfg(test)]
mod test {
    use serde::Serialize;
    use wasm_call_protocol::{PeerId, SessionDescription};

    use super::decode;
    use crate::ServerMessage;

    fn frame<T: Serialize>(message: &T) -> Vec<u8> {
        rmp_serde::to_vec_named(message).unwrap()
    }

    #[test]
    fn relay_frame_is_decoded() {
        let sent = ServerMessage::CallMade {
            from: PeerId::from("peer-9"),
            offer: SessionDescription::offer("v=0".to_owned()),
        };
        assert_eq!(decode(&frame(&sent)).unwrap(), sent);
    }

    #[test]
    fn garbage_frame_is_an_error() {
        assert!(decode(&[0xc1, 0x00, 0x13]).is_err());
        assert!(decode(&frame(&"call-made")).is_err());
    }
}
