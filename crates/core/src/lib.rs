//! Mozart Core
//!
//! The orchestration layer of a voice call with a conversational agent: a
//! Token Client, a Session Adapter over the external real-time SDK, and the
//! controller that owns the call state. Front-ends depend only on this crate
//! and supply their own SDK and playback implementations.

pub mod controller;
pub mod error;
pub mod media;
pub mod session;
pub mod state;
pub mod token;
pub mod view;

pub use controller::CallController;
pub use error::{CallError, SessionError, TokenError};
pub use media::{AudioFormat, AudioFrame, InboundStream, MediaSink};
pub use session::{
    ActiveSession, ConnectionType, Conversation, ConversationSdk, SessionAdapter, SessionOptions,
    TrackListener,
};
pub use state::SessionState;
pub use token::{HttpTokenClient, TokenClient, TokenResponse};
pub use view::ViewModel;
