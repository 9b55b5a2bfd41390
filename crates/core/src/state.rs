//! Session state owned by the controller.

use crate::session::ActiveSession;

/// The single user-visible state of the call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    /// A start attempt failed; the message is shown to the user as-is.
    Error(String),
}

impl SessionState {
    /// Whether a new start may be requested from this state.
    ///
    /// `Error` counts as resting: a failed start is retried by pressing
    /// start again, which also clears the banner.
    pub fn accepts_start(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Error(_))
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// The controller's process state: the status plus the open session, if any.
///
/// Fields are private so the two can only change together. `status` is
/// `Connected` exactly when `session` is `Some`.
#[derive(Debug, Default)]
pub struct CallState {
    status: SessionState,
    session: Option<ActiveSession>,
}

impl CallState {
    pub fn status(&self) -> &SessionState {
        &self.status
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub(crate) fn begin_connecting(&mut self) {
        debug_assert!(self.session.is_none());
        self.status = SessionState::Connecting;
    }

    pub(crate) fn connected(&mut self, session: ActiveSession) {
        self.session = Some(session);
        self.status = SessionState::Connected;
    }

    pub(crate) fn failed(&mut self, message: String) {
        self.session = None;
        self.status = SessionState::Error(message);
    }

    /// Clears the session and returns to `Idle`, handing back the session
    /// so the caller can close it.
    pub(crate) fn take_session(&mut self) -> Option<ActiveSession> {
        let session = self.session.take();
        if session.is_some() {
            self.status = SessionState::Idle;
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle_without_session() {
        let state = CallState::default();
        assert_eq!(state.status(), &SessionState::Idle);
        assert!(state.session().is_none());
    }

    #[test]
    fn test_accepts_start() {
        assert!(SessionState::Idle.accepts_start());
        assert!(SessionState::Error("boom".into()).accepts_start());
        assert!(!SessionState::Connecting.accepts_start());
        assert!(!SessionState::Connected.accepts_start());
    }

    #[test]
    fn test_take_session_without_session_keeps_status() {
        let mut state = CallState::default();
        state.failed("nope".into());
        assert!(state.take_session().is_none());
        assert_eq!(state.status(), &SessionState::Error("nope".into()));
    }
}
