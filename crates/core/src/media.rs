//! Inbound media types and the playback surface they are attached to.

use futures::Stream;
use std::fmt;
use std::pin::Pin;

/// PCM layout a sink can render without resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u32,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 1,
        }
    }
}

/// A block of interleaved PCM16 samples from the remote party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Audio frames as they arrive from the far end.
pub type FrameStream = Pin<Box<dyn Stream<Item = AudioFrame> + Send>>;

/// A media stream the remote party started sending.
pub struct InboundStream {
    track_id: String,
    frames: FrameStream,
}

impl InboundStream {
    pub fn new(track_id: impl Into<String>, frames: FrameStream) -> Self {
        Self {
            track_id: track_id.into(),
            frames,
        }
    }

    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn into_frames(self) -> FrameStream {
        self.frames
    }
}

impl fmt::Debug for InboundStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboundStream")
            .field("track_id", &self.track_id)
            .finish_non_exhaustive()
    }
}

/// The local audio-output surface.
///
/// A sink outlives any single session. Attaching a stream replaces whatever
/// source was playing before and must start rendering immediately.
pub trait MediaSink: Send + Sync {
    /// Layout the sink wants frames delivered in.
    fn format(&self) -> AudioFormat {
        AudioFormat::default()
    }

    fn attach(&self, stream: InboundStream);
}
