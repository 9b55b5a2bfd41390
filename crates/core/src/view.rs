//! Presentation of `SessionState`, independent of any UI toolkit.

use crate::state::SessionState;

pub const START_LABEL: &str = "Start conversation";
pub const CONNECTING_LABEL: &str = "Connecting…";
pub const STOP_LABEL: &str = "End call";
pub const IDLE_STATUS: &str = "Ready";

/// What a front-end shows for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub status: String,
    pub start_label: &'static str,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// Visible only in the error state; cleared by the next start attempt.
    pub error_banner: Option<String>,
}

impl ViewModel {
    pub fn from_state(state: &SessionState, agent_name: &str) -> Self {
        let status = match state {
            SessionState::Idle | SessionState::Error(_) => IDLE_STATUS.to_string(),
            SessionState::Connecting => CONNECTING_LABEL.to_string(),
            SessionState::Connected => format!("Connected with {agent_name}"),
        };
        let start_label = match state {
            SessionState::Connecting => CONNECTING_LABEL,
            _ => START_LABEL,
        };

        Self {
            status,
            start_label,
            start_enabled: state.accepts_start(),
            stop_enabled: state.is_connected(),
            error_banner: state.error_message().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_offers_start_only() {
        let view = ViewModel::from_state(&SessionState::Idle, "Mozart");
        assert_eq!(view.status, "Ready");
        assert_eq!(view.start_label, START_LABEL);
        assert!(view.start_enabled);
        assert!(!view.stop_enabled);
        assert_eq!(view.error_banner, None);
    }

    #[test]
    fn test_connecting_disables_both_controls() {
        let view = ViewModel::from_state(&SessionState::Connecting, "Mozart");
        assert_eq!(view.start_label, CONNECTING_LABEL);
        assert!(!view.start_enabled);
        assert!(!view.stop_enabled);
    }

    #[test]
    fn test_connected_offers_stop_only() {
        let view = ViewModel::from_state(&SessionState::Connected, "Mozart");
        assert_eq!(view.status, "Connected with Mozart");
        assert!(!view.start_enabled);
        assert!(view.stop_enabled);
    }

    #[test]
    fn test_error_shows_banner_and_allows_retry() {
        let state = SessionState::Error("server overloaded".into());
        let view = ViewModel::from_state(&state, "Mozart");
        assert_eq!(view.error_banner.as_deref(), Some("server overloaded"));
        assert!(view.start_enabled);
        assert!(!view.stop_enabled);
    }
}
