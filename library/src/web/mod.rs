/*!
Browser implementations of the call seams: `WebSocket` relay connection,
`getUserMedia` capture and `RtcPeerConnection` links.

# Example

```ignore
use wasm_call::web::{self, WebCall};
use wasm_call::{CallConfig, CallUpdate, PeerId};

web::init_logging(log::Level::Info);
let call: WebCall = web::connect(CallConfig::default())?;
call.set_local_video(local_video_element);
call.set_remote_video(remote_video_element);
call.dispatcher().set_observer(move |update| {
    if let CallUpdate::Busy { .. } = update {
        alert("You have existing call! End it to make another!");
    }
});

call.place_call(PeerId::from("peer-7"));
// ...
call.end_call();
```
*/

use log::{debug, error};
use wasm_call_protocol::PeerId;
use web_sys::HtmlVideoElement;

use crate::config::CallConfig;
use crate::dispatcher::CallDispatcher;
use crate::error::{Error, Result};

mod callbacks;
mod link;
mod media;
mod transport;

pub use link::{RtcLink, RtcLinkFactory};
pub use media::BrowserMedia;
pub use transport::WebSocketTransport;

pub type WebDispatcher = CallDispatcher<WebSocketTransport, BrowserMedia, RtcLinkFactory>;

/// Route `log` records to the browser console and panics to `console.error`.
/// Call once, before [`connect`].
pub fn init_logging(level: log::Level) {
    // When the `console_error_panic_hook` feature is enabled panics are reported
    // with their message instead of a bare `unreachable` trap.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(level));
}

/// Open the relay connection and wire it to a fresh [`WebDispatcher`].
///
/// # Errors
/// [`Error::InvalidConfig`] for an unusable `config`, [`Error::TransportUnavailable`] if
/// the `WebSocket` cannot be opened.
pub fn connect(config: CallConfig) -> Result<WebCall> {
    config.validate()?;
    let transport = WebSocketTransport::open(&config.signaling_server_url)
        .map_err(|err| Error::TransportUnavailable(format!("{err:#}")))?;
    let websocket = transport.websocket().clone();
    let dispatcher = CallDispatcher::new(
        transport,
        BrowserMedia,
        RtcLinkFactory::new(config.connection_type),
        config.media,
    );

    callbacks::set_websocket_on_open(&websocket);
    callbacks::set_websocket_on_message(&websocket, dispatcher.clone());
    callbacks::set_websocket_on_close(&websocket, dispatcher.clone());
    callbacks::set_websocket_on_error(&websocket);
    debug!("connecting to {}", config.signaling_server_url);

    Ok(WebCall { dispatcher })
}

/// Browser call handle, what a page's buttons are wired to.
///
/// Can be cloned freely.
#[derive(Clone)]
pub struct WebCall {
    dispatcher: WebDispatcher,
}

impl WebCall {
    #[must_use]
    pub const fn dispatcher(&self) -> &WebDispatcher {
        &self.dispatcher
    }

    /// Local preview; muted so the user does not hear themselves.
    pub fn set_local_video(&self, video: HtmlVideoElement) {
        video.set_muted(true);
        self.dispatcher.set_local_sink(video);
    }

    pub fn set_remote_video(&self, video: HtmlVideoElement) {
        self.dispatcher.set_remote_sink(video);
    }

    /// Start calling `peer` in the background. Failures reach the observer.
    pub fn place_call(&self, peer: PeerId) {
        let dispatcher = self.dispatcher.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = dispatcher.place_call(peer).await {
                if !err.is_silent() {
                    error!("call failed: {}", err);
                }
            }
        });
    }

    pub fn end_call(&self) {
        self.dispatcher.end_call(None);
    }
}
