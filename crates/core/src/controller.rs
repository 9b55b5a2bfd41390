//! View/Controller
//!
//! `CallController` owns the call state and is the only thing that changes
//! it. Front-ends drive it through [`CallController::request_start`] and
//! [`CallController::request_stop`] and re-render from [`CallController::subscribe`].

use crate::{
    error::CallError,
    session::{ActiveSession, SessionAdapter},
    state::{CallState, SessionState},
    token::TokenClient,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

pub struct CallController {
    agent_id: String,
    tokens: Arc<dyn TokenClient>,
    sessions: SessionAdapter,
    state: CallState,
    updates: watch::Sender<SessionState>,
}

impl CallController {
    pub fn new(
        agent_id: impl Into<String>,
        tokens: Arc<dyn TokenClient>,
        sessions: SessionAdapter,
    ) -> Self {
        let (updates, _) = watch::channel(SessionState::Idle);
        Self {
            agent_id: agent_id.into(),
            tokens,
            sessions,
            state: CallState::default(),
            updates,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn state(&self) -> &SessionState {
        self.state.status()
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.state.session()
    }

    pub fn is_active(&self) -> bool {
        self.state.session().is_some()
    }

    /// Returns a receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.updates.subscribe()
    }

    /// Fetches a token and opens a session.
    ///
    /// Ignored unless the controller is resting (`Idle`, or `Error` from a
    /// previous attempt). Any failure lands in `SessionState::Error`; nothing
    /// is retried.
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn request_start(&mut self) {
        if !self.state.status().accepts_start() {
            debug!(state = ?self.state.status(), "Start ignored");
            return;
        }

        self.state.begin_connecting();
        self.publish();

        match self.open_session().await {
            Ok(session) => {
                info!(session_id = %session.id(), "Conversation connected");
                self.state.connected(session);
            }
            Err(e) => {
                error!(error = %e, "Failed to start conversation");
                self.state.failed(e.to_string());
            }
        }
        self.publish();
    }

    /// Ends the active session, if any.
    ///
    /// Local state returns to `Idle` whatever the SDK reports; a close
    /// failure is only logged.
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn request_stop(&mut self) {
        let Some(session) = self.state.take_session() else {
            debug!("Stop ignored, no active session");
            return;
        };
        self.publish();

        match self.sessions.close(session).await {
            Ok(()) => info!("Conversation ended by the user"),
            Err(e) => warn!(error = %e, "Failed to close conversation cleanly"),
        }
    }

    async fn open_session(&self) -> Result<ActiveSession, CallError> {
        let response = self.tokens.fetch_token(&self.agent_id).await?;
        debug!("Conversation token received");
        let session = self.sessions.create(&self.agent_id, response.token).await?;
        Ok(session)
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.status().clone());
    }
}
