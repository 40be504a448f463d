use wasm_call_protocol::ClientMessage;

/// Outbound half of the connection to the signaling relay.
///
/// Inbound traffic is pushed into [`handle_message`] by whoever owns the connection.
///
/// [`handle_message`]: crate::CallDispatcher::handle_message
pub trait SignalingTransport {
    /// # Errors
    /// The relay is unreachable or the message could not be framed.
    fn send(&self, message: &ClientMessage) -> anyhow::Result<()>;
}
