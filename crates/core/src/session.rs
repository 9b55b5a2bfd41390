//! Session Adapter
//!
//! Wraps the external conversational SDK behind the [`ConversationSdk`] seam.
//! The SDK owns negotiation, transport and the agent protocol; this module
//! only wires the inbound-media callback to the [`MediaSink`] and hands out an
//! opaque [`ActiveSession`].

use crate::{
    error::SessionError,
    media::{AudioFormat, InboundStream, MediaSink},
};
use async_trait::async_trait;
use std::{fmt, sync::Arc, time::Instant};
use tracing::{debug, info};

/// Transport requested from the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    WebRtc,
    WebSocket,
}

/// Everything the SDK needs to open one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub agent_id: String,
    pub token: String,
    pub connection_type: ConnectionType,
    /// Layout inbound audio should be delivered in.
    pub output_format: AudioFormat,
}

/// Invoked once for every media stream the remote party starts sending.
pub type TrackListener = Box<dyn Fn(InboundStream) + Send + Sync>;

/// A live conversation as returned by the SDK.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Conversation: Send + Sync {
    /// SDK-assigned identifier, used for logging only.
    fn id(&self) -> String;

    /// Requests graceful termination.
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// The external real-time SDK.
#[async_trait]
pub trait ConversationSdk: Send + Sync {
    /// Negotiates a session and resolves once it is established.
    ///
    /// `on_track` stays registered for the lifetime of the returned
    /// conversation.
    async fn start_session(
        &self,
        options: SessionOptions,
        on_track: TrackListener,
    ) -> Result<Box<dyn Conversation>, SessionError>;
}

/// Opaque handle to an open session. Closing consumes it.
pub struct ActiveSession {
    conversation: Box<dyn Conversation>,
    agent_id: String,
    opened_at: Instant,
}

impl ActiveSession {
    pub fn id(&self) -> String {
        self.conversation.id()
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn opened_at(&self) -> Instant {
        self.opened_at
    }
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("id", &self.id())
            .field("agent_id", &self.agent_id)
            .finish_non_exhaustive()
    }
}

/// Creates and closes sessions, routing inbound audio to a shared sink.
#[derive(Clone)]
pub struct SessionAdapter {
    sdk: Arc<dyn ConversationSdk>,
    sink: Arc<dyn MediaSink>,
}

impl SessionAdapter {
    pub fn new(sdk: Arc<dyn ConversationSdk>, sink: Arc<dyn MediaSink>) -> Self {
        Self { sdk, sink }
    }

    /// Opens a WebRTC session with `agent_id`, authorized by `token`.
    pub async fn create(
        &self,
        agent_id: &str,
        token: String,
    ) -> Result<ActiveSession, SessionError> {
        let options = SessionOptions {
            agent_id: agent_id.to_string(),
            token,
            connection_type: ConnectionType::WebRtc,
            output_format: self.sink.format(),
        };

        let sink = self.sink.clone();
        let on_track: TrackListener = Box::new(move |stream: InboundStream| {
            debug!(track_id = stream.track_id(), "Attaching inbound stream to sink");
            sink.attach(stream);
        });

        let conversation = self.sdk.start_session(options, on_track).await?;
        info!(session_id = %conversation.id(), "Session established");

        Ok(ActiveSession {
            conversation,
            agent_id: agent_id.to_string(),
            opened_at: Instant::now(),
        })
    }

    /// Ends `session`. The handle is gone either way.
    pub async fn close(&self, mut session: ActiveSession) -> Result<(), SessionError> {
        let result = session.conversation.close().await;
        debug!(
            session_id = %session.id(),
            elapsed_ms = session.opened_at.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Session close requested"
        );
        result
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by the adapter and controller tests.

    use super::*;
    use crate::media::AudioFrame;
    use futures::stream;
    use std::sync::Mutex;

    /// Records every stream attached to it, in order.
    #[derive(Default)]
    pub struct RecordingSink {
        pub attached: Mutex<Vec<String>>,
    }

    impl MediaSink for RecordingSink {
        fn attach(&self, stream: InboundStream) {
            self.attached
                .lock()
                .unwrap()
                .push(stream.track_id().to_string());
        }
    }

    pub fn silent_stream(track_id: &str) -> InboundStream {
        let frame = AudioFrame {
            samples: vec![0; 480],
            sample_rate: 48_000,
            channels: 1,
        };
        InboundStream::new(track_id, Box::pin(stream::iter(vec![frame])))
    }

    /// What the fake SDK should do on the next `start_session`.
    pub enum Outcome {
        Open,
        OpenWithFailingClose(String),
        Reject(String),
    }

    /// A scripted SDK that keeps the last listener so tests can fire tracks.
    pub struct FakeSdk {
        outcome: Mutex<Outcome>,
        pub calls: Mutex<Vec<SessionOptions>>,
        listener: Mutex<Option<TrackListener>>,
    }

    impl FakeSdk {
        pub fn new(outcome: Outcome) -> Self {
            Self {
                outcome: Mutex::new(outcome),
                calls: Mutex::new(Vec::new()),
                listener: Mutex::new(None),
            }
        }

        pub fn set_outcome(&self, outcome: Outcome) {
            *self.outcome.lock().unwrap() = outcome;
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Simulates the remote party starting to send media.
        pub fn fire_track(&self, track_id: &str) {
            let listener = self.listener.lock().unwrap();
            let listener = listener.as_ref().expect("no session was started");
            listener(silent_stream(track_id));
        }
    }

    #[async_trait]
    impl ConversationSdk for FakeSdk {
        async fn start_session(
            &self,
            options: SessionOptions,
            on_track: TrackListener,
        ) -> Result<Box<dyn Conversation>, SessionError> {
            self.calls.lock().unwrap().push(options);
            let close_result = match &*self.outcome.lock().unwrap() {
                Outcome::Reject(message) => return Err(SessionError::Start(message.clone())),
                Outcome::Open => Ok(()),
                Outcome::OpenWithFailingClose(message) => Err(SessionError::Close(message.clone())),
            };
            *self.listener.lock().unwrap() = Some(on_track);

            let mut conversation = MockConversation::new();
            conversation.expect_id().return_const("conv-1".to_string());
            conversation
                .expect_close()
                .returning(move || close_result.clone());
            Ok(Box::new(conversation))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    fn adapter(sdk: &Arc<FakeSdk>, sink: &Arc<RecordingSink>) -> SessionAdapter {
        SessionAdapter::new(sdk.clone(), sink.clone())
    }

    #[tokio::test]
    async fn test_create_forwards_agent_and_token() {
        let sdk = Arc::new(FakeSdk::new(Outcome::Open));
        let sink = Arc::new(RecordingSink::default());

        let session = adapter(&sdk, &sink)
            .create("agent-1", "abc123".into())
            .await
            .unwrap();

        assert_eq!(session.agent_id(), "agent-1");
        assert_eq!(session.id(), "conv-1");
        let calls = sdk.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            SessionOptions {
                agent_id: "agent-1".into(),
                token: "abc123".into(),
                connection_type: ConnectionType::WebRtc,
                output_format: AudioFormat::default(),
            }
        );
        drop(calls);

        adapter(&sdk, &sink).close(session).await.unwrap();
    }

    #[tokio::test]
    async fn test_inbound_tracks_reach_the_sink() {
        let sdk = Arc::new(FakeSdk::new(Outcome::Open));
        let sink = Arc::new(RecordingSink::default());
        let adapter = adapter(&sdk, &sink);

        let session = adapter.create("agent-1", "abc123".into()).await.unwrap();
        assert!(sink.attached.lock().unwrap().is_empty());

        sdk.fire_track("TR_remote");
        assert_eq!(*sink.attached.lock().unwrap(), vec!["TR_remote".to_string()]);

        adapter.close(session).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_start_is_a_start_error() {
        let sdk = Arc::new(FakeSdk::new(Outcome::Reject("invalid token".into())));
        let sink = Arc::new(RecordingSink::default());

        let err = adapter(&sdk, &sink)
            .create("agent-1", "bad".into())
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Start("invalid token".into()));
    }

    #[tokio::test]
    async fn test_close_failure_is_reported() {
        let sdk = Arc::new(FakeSdk::new(Outcome::OpenWithFailingClose("gone".into())));
        let sink = Arc::new(RecordingSink::default());
        let adapter = adapter(&sdk, &sink);

        let session = adapter.create("agent-1", "abc123".into()).await.unwrap();
        let err = adapter.close(session).await.unwrap_err();
        assert_eq!(err, SessionError::Close("gone".into()));
    }
}
