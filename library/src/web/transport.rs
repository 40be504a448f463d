use anyhow::anyhow;
use wasm_call_protocol::ClientMessage;
use web_sys::{BinaryType, WebSocket};

use crate::codec;
use crate::transport::SignalingTransport;

/// Relay connection over a browser `WebSocket`, one MessagePack frame per message.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    websocket: WebSocket,
}

impl WebSocketTransport {
    /// # Errors
    /// This function errs if the browser refuses to open a `WebSocket` to `url`.
    pub fn open(url: &str) -> anyhow::Result<Self> {
        let websocket = WebSocket::new(url)
            .map_err(|err| anyhow!("failed to open a websocket to {}: {:?}", url, err))?;
        websocket.set_binary_type(BinaryType::Arraybuffer);
        Ok(Self { websocket })
    }

    #[must_use]
    pub const fn websocket(&self) -> &WebSocket {
        &self.websocket
    }
}

impl SignalingTransport for WebSocketTransport {
    fn send(&self, message: &ClientMessage) -> anyhow::Result<()> {
        if self.websocket.ready_state() != WebSocket::OPEN {
            return Err(anyhow!(
                "websocket is not open (ready state {})",
                self.websocket.ready_state()
            ));
        }
        let frame = codec::encode(message)?;
        self.websocket
            .send_with_u8_array(&frame)
            .map_err(|err| anyhow!("failed to send message across the websocket: {:?}", err))
    }
}
