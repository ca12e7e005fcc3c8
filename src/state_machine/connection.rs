use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::StateMachine;

/// How long a live stream may stay silent before it is reported as degraded.
pub const DEGRADED_AFTER_MS: u64 = 15_000;

/// Health of the location stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Live,
    Degraded,
    Error,
    Paused,
}

impl ConnectionStatus {
    /// Label shown on the status chip.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Idle => "Idle",
            ConnectionStatus::Connecting => "Connecting",
            ConnectionStatus::Live => "Live",
            ConnectionStatus::Degraded => "Degraded",
            ConnectionStatus::Error => "Error",
            ConnectionStatus::Paused => "Paused",
        }
    }
}

/// The whole connection record. Transitions always build a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_tick_at: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connect,
    Open { now: u64 },
    Tick { now: u64 },
    Heartbeat { now: u64 },
    /// Periodic staleness probe.
    Timeout { now: u64 },
    Error { message: String },
    Pause,
    Resume,
    Close,
}

impl ConnectionState {
    pub fn idle() -> Self {
        Self::default()
    }

    fn with_status(status: ConnectionStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    fn live_at(now: u64) -> Self {
        Self {
            status: ConnectionStatus::Live,
            last_tick_at: Some(now),
            error: None,
        }
    }

    /// Compute the state that follows `self` after `event`.
    pub fn transition(&self, event: ConnectionEvent) -> ConnectionState {
        match event {
            ConnectionEvent::Connect => Self::with_status(ConnectionStatus::Connecting),

            ConnectionEvent::Open { now }
            | ConnectionEvent::Tick { now }
            | ConnectionEvent::Heartbeat { now } => Self::live_at(now),

            ConnectionEvent::Timeout { now } => {
                let last = self.last_tick_at.unwrap_or(0);
                if self.status == ConnectionStatus::Live
                    && now.saturating_sub(last) >= DEGRADED_AFTER_MS
                {
                    Self {
                        status: ConnectionStatus::Degraded,
                        ..self.clone()
                    }
                } else {
                    self.clone()
                }
            }

            ConnectionEvent::Error { message } => Self {
                status: ConnectionStatus::Error,
                last_tick_at: self.last_tick_at,
                error: Some(message),
            },

            ConnectionEvent::Pause => Self {
                status: ConnectionStatus::Paused,
                ..self.clone()
            },

            ConnectionEvent::Resume => Self {
                status: ConnectionStatus::Connecting,
                ..self.clone()
            },

            ConnectionEvent::Close => Self::idle(),
        }
    }
}

/// [`StateMachine`] wrapper around [`ConnectionState::transition`] that records status changes
/// for the caller to drain.
#[derive(Debug, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
    changes: VecDeque<ConnectionOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOutput {
    StatusChanged {
        from: ConnectionStatus,
        to: ConnectionStatus,
    },
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status
    }

    fn apply(&mut self, event: ConnectionEvent) {
        let next = self.state.transition(event);
        if next.status != self.state.status {
            self.changes.push_back(ConnectionOutput::StatusChanged {
                from: self.state.status,
                to: next.status,
            });
        }
        self.state = next;
    }
}

impl StateMachine for ConnectionMachine {
    type Input = ConnectionEvent;
    type Output = ConnectionOutput;

    fn process_input(&mut self, input: Self::Input) {
        self.apply(input);
    }

    fn poll_output(&mut self) -> Option<Self::Output> {
        self.changes.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    fn every_state() -> Vec<ConnectionState> {
        vec![
            ConnectionState::idle(),
            ConnectionState::with_status(ConnectionStatus::Connecting),
            ConnectionState::live_at(T0),
            ConnectionState {
                status: ConnectionStatus::Degraded,
                last_tick_at: Some(T0),
                error: None,
            },
            ConnectionState {
                status: ConnectionStatus::Error,
                last_tick_at: Some(T0),
                error: Some("boom".to_string()),
            },
            ConnectionState {
                status: ConnectionStatus::Paused,
                last_tick_at: Some(T0),
                error: None,
            },
        ]
    }

    #[test]
    fn test_close_resets_every_state() {
        for state in every_state() {
            let next = state.transition(ConnectionEvent::Close);
            assert_eq!(next, ConnectionState::idle());
            assert_eq!(next.last_tick_at, None);
            assert_eq!(next.error, None);
        }
    }

    #[test]
    fn test_tick_and_heartbeat_go_live_from_every_state() {
        for state in every_state() {
            let now = T0 + 500;
            assert_eq!(
                state.transition(ConnectionEvent::Tick { now }),
                ConnectionState::live_at(now)
            );
            assert_eq!(
                state.transition(ConnectionEvent::Heartbeat { now }),
                ConnectionState::live_at(now)
            );
        }
    }

    #[test]
    fn test_timeout_only_degrades_stale_live() {
        let late = T0 + DEGRADED_AFTER_MS;
        for state in every_state() {
            let next = state.transition(ConnectionEvent::Timeout { now: late });
            if state.status == ConnectionStatus::Live {
                assert_eq!(next.status, ConnectionStatus::Degraded);
                assert_eq!(next.last_tick_at, Some(T0));
            } else {
                assert_eq!(next, state);
            }
        }
    }

    #[test]
    fn test_timeout_just_under_threshold_is_noop() {
        let live = ConnectionState::live_at(T0);
        let next = live.transition(ConnectionEvent::Timeout {
            now: T0 + DEGRADED_AFTER_MS - 1,
        });
        assert_eq!(next, live);
    }

    #[test]
    fn test_timeout_before_last_tick_does_not_degrade() {
        let live = ConnectionState::live_at(T0);
        let next = live.transition(ConnectionEvent::Timeout { now: T0 - 60_000 });
        assert_eq!(next, live);
    }

    #[test]
    fn test_connect_open_then_degrade() {
        let state = ConnectionState::idle();

        let state = state.transition(ConnectionEvent::Connect);
        assert_eq!(state.status, ConnectionStatus::Connecting);

        let state = state.transition(ConnectionEvent::Open { now: T0 });
        assert_eq!(state, ConnectionState::live_at(T0));

        let state = state.transition(ConnectionEvent::Timeout { now: T0 + 20_000 });
        assert_eq!(
            state,
            ConnectionState {
                status: ConnectionStatus::Degraded,
                last_tick_at: Some(T0),
                error: None,
            }
        );
    }

    #[test]
    fn test_recent_tick_keeps_live() {
        let state = ConnectionState::live_at(T0).transition(ConnectionEvent::Tick { now: T0 + 1_000 });
        assert_eq!(state, ConnectionState::live_at(T0 + 1_000));

        let after = state.transition(ConnectionEvent::Timeout { now: T0 + 5_000 });
        assert_eq!(after, state);
    }

    #[test]
    fn test_connect_drops_last_tick() {
        let state = ConnectionState::live_at(T0).transition(ConnectionEvent::Connect);
        assert_eq!(state.last_tick_at, None);
    }

    #[test]
    fn test_error_keeps_last_tick() {
        let state = ConnectionState::live_at(T0).transition(ConnectionEvent::Error {
            message: "bad frame".to_string(),
        });
        assert_eq!(state.status, ConnectionStatus::Error);
        assert_eq!(state.error.as_deref(), Some("bad frame"));
        assert_eq!(state.last_tick_at, Some(T0));

        // A later tick recovers.
        let state = state.transition(ConnectionEvent::Tick { now: T0 + 2_000 });
        assert_eq!(state, ConnectionState::live_at(T0 + 2_000));
    }

    #[test]
    fn test_pause_and_resume_keep_fields() {
        let paused = ConnectionState::live_at(T0).transition(ConnectionEvent::Pause);
        assert_eq!(paused.status, ConnectionStatus::Paused);
        assert_eq!(paused.last_tick_at, Some(T0));

        let resumed = paused.transition(ConnectionEvent::Resume);
        assert_eq!(resumed.status, ConnectionStatus::Connecting);
        assert_eq!(resumed.last_tick_at, Some(T0));
    }

    #[test]
    fn test_machine_reports_status_changes() {
        let mut machine = ConnectionMachine::new();
        assert_eq!(machine.status(), ConnectionStatus::Idle);

        machine.process_input(ConnectionEvent::Connect);
        machine.process_input(ConnectionEvent::Open { now: T0 });
        // Same status, no change reported
        machine.process_input(ConnectionEvent::Tick { now: T0 + 1 });

        assert_eq!(
            machine.poll_output(),
            Some(ConnectionOutput::StatusChanged {
                from: ConnectionStatus::Idle,
                to: ConnectionStatus::Connecting,
            })
        );
        assert_eq!(
            machine.poll_output(),
            Some(ConnectionOutput::StatusChanged {
                from: ConnectionStatus::Connecting,
                to: ConnectionStatus::Live,
            })
        );
        assert!(machine.poll_output().is_none());
        assert_eq!(machine.state().last_tick_at, Some(T0 + 1));
    }
}
