use anyhow::anyhow;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use crate::config::MediaConstraints;
use crate::media::MediaDevices;

/// Camera and microphone through `navigator.mediaDevices`, rendered into `<video>` elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserMedia;

impl MediaDevices for BrowserMedia {
    type Stream = MediaStream;
    type Sink = HtmlVideoElement;

    async fn acquire(&self, constraints: MediaConstraints) -> anyhow::Result<MediaStream> {
        let window = web_sys::window().ok_or_else(|| anyhow!("no global window exists"))?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|err| anyhow!("media devices are not available: {:?}", err))?;

        let mut request = MediaStreamConstraints::new();
        request.audio(&JsValue::from_bool(constraints.audio));
        request.video(&JsValue::from_bool(constraints.video));
        let promise = devices
            .get_user_media_with_constraints(&request)
            .map_err(|err| anyhow!("failed to request user media: {:?}", err))?;
        let stream = JsFuture::from(promise)
            .await
            .map_err(|err| anyhow!("user media request was rejected: {:?}", err))?;
        stream
            .dyn_into::<MediaStream>()
            .map_err(|value| anyhow!("user media request returned {:?}", value))
    }

    fn bind(&self, stream: Option<&MediaStream>, sink: &HtmlVideoElement) {
        sink.set_src_object(stream);
    }

    fn release(&self, stream: &MediaStream) {
        for track in stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
    }
}
