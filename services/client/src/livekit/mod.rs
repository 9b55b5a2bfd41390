//! WebRTC transport to the agent through a LiveKit room.
//!
//! The conversation token issued by the backend is a room access token: joining
//! the room starts the conversation, the agent's voice arrives as a subscribed
//! remote audio track, and the user's voice is published from the default
//! microphone.

mod microphone;
mod speaker;

pub use microphone::Microphone;
pub use speaker::SpeakerSink;

use async_trait::async_trait;
use futures::StreamExt;
use livekit::prelude::{RemoteTrack, Room, RoomEvent, RoomOptions};
use livekit::webrtc::audio_stream::native::NativeAudioStream;
use mozart_core::{
    AudioFrame, ConnectionType, Conversation, ConversationSdk, InboundStream, SessionError,
    SessionOptions, TrackListener,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A `ConversationSdk` that joins LiveKit rooms at a fixed signalling URL.
pub struct LiveKitSdk {
    url: String,
}

impl LiveKitSdk {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ConversationSdk for LiveKitSdk {
    async fn start_session(
        &self,
        options: SessionOptions,
        on_track: TrackListener,
    ) -> Result<Box<dyn Conversation>, SessionError> {
        if options.connection_type != ConnectionType::WebRtc {
            return Err(SessionError::Start(format!(
                "{:?} sessions are not supported by the LiveKit transport",
                options.connection_type
            )));
        }

        let (room, mut events) = Room::connect(&self.url, &options.token, RoomOptions::default())
            .await
            .map_err(|e| SessionError::Start(e.to_string()))?;
        info!(room = %room.name(), agent_id = %options.agent_id, "Joined conversation room");

        let microphone = match Microphone::publish(&room).await {
            Ok(microphone) => microphone,
            Err(e) => {
                let _ = room.close().await;
                return Err(e);
            }
        };

        let format = options.output_format;
        let events_task = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    RoomEvent::TrackSubscribed {
                        track: RemoteTrack::Audio(track),
                        ..
                    } => {
                        let track_id = track.sid().to_string();
                        debug!(%track_id, "Remote audio track subscribed");
                        let frames = NativeAudioStream::new(
                            track.rtc_track(),
                            format.sample_rate as i32,
                            format.channels as i32,
                        )
                        .map(|frame| AudioFrame {
                            samples: frame.data.to_vec(),
                            sample_rate: frame.sample_rate,
                            channels: frame.num_channels,
                        });
                        on_track(InboundStream::new(track_id, Box::pin(frames)));
                    }
                    // Far-end drops are not surfaced to the controller.
                    RoomEvent::Disconnected { .. } => {
                        warn!("Conversation room disconnected");
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Box::new(LiveKitConversation {
            room,
            events_task,
            microphone,
        }))
    }
}

struct LiveKitConversation {
    room: Room,
    events_task: JoinHandle<()>,
    microphone: Microphone,
}

#[async_trait]
impl Conversation for LiveKitConversation {
    fn id(&self) -> String {
        self.room.name()
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.microphone.stop();
        self.events_task.abort();
        self.room
            .close()
            .await
            .map_err(|e| SessionError::Close(e.to_string()))
    }
}

impl Drop for LiveKitConversation {
    fn drop(&mut self) {
        self.microphone.stop();
        self.events_task.abort();
    }
}
