use crate::config::MediaConstraints;

/// Local capture devices and playback sinks.
#[allow(async_fn_in_trait)]
pub trait MediaDevices {
    /// Cheap handle to a live media stream.
    type Stream: Clone + 'static;
    /// Where a stream gets rendered, e.g. a `<video>` element.
    type Sink: 'static;

    /// # Errors
    /// Capture device denied or absent.
    async fn acquire(&self, constraints: MediaConstraints) -> anyhow::Result<Self::Stream>;

    /// Show `stream` on `sink`, or blank the sink when `stream` is `None`.
    fn bind(&self, stream: Option<&Self::Stream>, sink: &Self::Sink);

    /// Stop every track of `stream`. Releasing twice is harmless.
    fn release(&self, stream: &Self::Stream);
}
