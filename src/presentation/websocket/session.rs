//! WebSocket Session Management

use std::time::{Duration, Instant};

use crate::domain::ConnectionId;

/// Per-socket state owned by the connection task.
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    /// Set by the latest `join`
    pub profile_id: Option<String>,
    pub room_id: Option<String>,
    pub last_activity: Instant,
    pub frames_received: u64,
    pub frames_rejected: u64,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId) -> Self {
        Self {
            connection_id,
            profile_id: None,
            room_id: None,
            last_activity: Instant::now(),
            frames_received: 0,
            frames_rejected: 0,
        }
    }

    /// Any inbound traffic, including pongs, counts as liveness.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn joined(&mut self, profile_id: &str, room_id: Option<&str>) {
        self.profile_id = Some(profile_id.to_string());
        self.room_id = room_id.map(String::from);
    }

    pub fn is_joined(&self) -> bool {
        self.profile_id.is_some()
    }

    pub fn is_alive(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() < timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_updates_identity() {
        let mut session = SessionState::new(ConnectionId::new());
        assert!(!session.is_joined());

        session.joined("a", Some("r1"));
        session.joined("a", None);

        assert!(session.is_joined());
        assert_eq!(session.profile_id.as_deref(), Some("a"));
        assert!(session.room_id.is_none());
    }

    #[test]
    fn test_liveness_window() {
        let mut session = SessionState::new(ConnectionId::new());
        session.last_activity = Instant::now() - Duration::from_secs(5);

        assert!(!session.is_alive(Duration::from_secs(1)));
        session.touch();
        assert!(session.is_alive(Duration::from_secs(1)));
    }
}
