//! Connection + activity state machine.
//!
//! Pure and synchronous: every input is a method call, every output is the
//! resulting transition (or `None` for a no-op). The owning actor turns
//! transitions into timer changes and runtime emissions. Keeping I/O out of
//! here is what makes the join-barrier and staleness rules unit-testable.

use convo_agent_interface::{AgentActivity, LinkChangeReason, LinkState, OfflineReason};

use crate::events::CompositeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    /// Transport dropped mid-call; reversible back to `Connected`.
    ConnectedInterrupted,
    Error,
}

/// Which required remote party a transport participant id maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Agent,
    Avatar,
    Other,
}

pub struct StateMachine {
    connection: ConnectionState,
    activity: AgentActivity,
    avatar_enabled: bool,
    agent_joined: bool,
    avatar_joined: bool,
    /// Once an authoritative activity event has been seen, volume
    /// heuristics stop applying.
    explicit_activity_seen: bool,
    last_activity_turn: i64,
    last_activity_ts: i64,
}

impl StateMachine {
    pub fn new(avatar_enabled: bool) -> Self {
        Self {
            connection: ConnectionState::Idle,
            activity: AgentActivity::Silent,
            avatar_enabled,
            agent_joined: false,
            avatar_joined: false,
            explicit_activity_seen: false,
            last_activity_turn: 0,
            last_activity_ts: 0,
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn activity(&self) -> AgentActivity {
        self.activity
    }

    pub fn composite(&self) -> CompositeState {
        CompositeState {
            connection: self.connection,
            activity: self.activity,
        }
    }

    /// User-initiated start. Guarded: anything but `Idle` is a no-op.
    pub fn begin_connecting(&mut self) -> bool {
        if self.connection != ConnectionState::Idle {
            return false;
        }
        self.connection = ConnectionState::Connecting;
        true
    }

    /// Conjunctive join barrier: `Connected` fires only once every required
    /// party is present — agent and avatar for avatar sessions, agent alone
    /// otherwise. Partial joins stay `Connecting`.
    pub fn participant_joined(&mut self, role: ParticipantRole) -> Option<ConnectionState> {
        match role {
            ParticipantRole::Agent => self.agent_joined = true,
            ParticipantRole::Avatar => self.avatar_joined = true,
            ParticipantRole::Other => return None,
        }
        if self.connection == ConnectionState::Connecting && self.join_barrier_met() {
            self.connection = ConnectionState::Connected;
            return Some(self.connection);
        }
        None
    }

    /// The join rule applied in reverse: only when every required party has
    /// left does the session settle — to `Idle` on a normal quit, `Error`
    /// otherwise.
    pub fn participant_offline(
        &mut self,
        role: ParticipantRole,
        reason: OfflineReason,
    ) -> Option<ConnectionState> {
        match role {
            ParticipantRole::Agent => self.agent_joined = false,
            ParticipantRole::Avatar => self.avatar_joined = false,
            ParticipantRole::Other => return None,
        }
        if self.connection == ConnectionState::Idle || !self.all_required_offline() {
            return None;
        }
        self.connection = match reason {
            OfflineReason::Quit => ConnectionState::Idle,
            OfflineReason::Dropped => ConnectionState::Error,
        };
        self.activity = AgentActivity::Silent;
        Some(self.connection)
    }

    pub fn link_changed(
        &mut self,
        state: LinkState,
        reason: LinkChangeReason,
    ) -> Option<ConnectionState> {
        match (state, reason) {
            (LinkState::Reconnecting, LinkChangeReason::Interrupted)
                if self.connection == ConnectionState::Connected =>
            {
                self.connection = ConnectionState::ConnectedInterrupted;
                Some(self.connection)
            }
            // Idempotent: a rejoin while already connected changes nothing.
            (LinkState::Connected, LinkChangeReason::RejoinSuccess)
                if self.connection == ConnectionState::ConnectedInterrupted =>
            {
                self.connection = ConnectionState::Connected;
                Some(self.connection)
            }
            (LinkState::Disconnected, LinkChangeReason::LeaveChannel)
                if self.connection != ConnectionState::Idle =>
            {
                self.connection = ConnectionState::Idle;
                self.activity = AgentActivity::Silent;
                Some(self.connection)
            }
            (LinkState::Failed, LinkChangeReason::JoinFailed) => {
                self.connection = ConnectionState::Error;
                self.activity = AgentActivity::Silent;
                Some(self.connection)
            }
            _ => None,
        }
    }

    /// Explicit stop. No-op when already idle.
    pub fn user_stop(&mut self) -> Option<ConnectionState> {
        if self.connection == ConnectionState::Idle {
            return None;
        }
        self.reset();
        Some(self.connection)
    }

    /// Authoritative activity change from the message channel. Events that
    /// regress the `(turn_id, ts)` watermark are stale echoes and dropped.
    pub fn activity_event(
        &mut self,
        activity: AgentActivity,
        turn_id: i64,
        ts: i64,
    ) -> Option<AgentActivity> {
        if activity == AgentActivity::Unknown {
            return None;
        }
        if !self.is_live() {
            return None;
        }
        if turn_id < self.last_activity_turn || ts <= self.last_activity_ts {
            tracing::debug!(turn_id, ts, "dropping_stale_activity_event");
            return None;
        }
        self.last_activity_turn = turn_id;
        self.last_activity_ts = ts;
        self.explicit_activity_seen = true;
        if activity == self.activity {
            return None;
        }
        self.activity = activity;
        Some(activity)
    }

    /// Fallback heuristic from playback volume, used only until the first
    /// explicit activity event arrives: audible agent ⇒ speaking, else
    /// listening.
    pub fn volume_hint(&mut self, role: ParticipantRole, volume: u16) -> Option<AgentActivity> {
        if role != ParticipantRole::Agent
            || self.explicit_activity_seen
            || self.connection != ConnectionState::Connected
        {
            return None;
        }
        let inferred = if volume > 0 {
            AgentActivity::Speaking
        } else {
            AgentActivity::Listening
        };
        if inferred == self.activity {
            return None;
        }
        self.activity = inferred;
        Some(inferred)
    }

    pub fn reset(&mut self) {
        self.connection = ConnectionState::Idle;
        self.activity = AgentActivity::Silent;
        self.agent_joined = false;
        self.avatar_joined = false;
        self.explicit_activity_seen = false;
        self.last_activity_turn = 0;
        self.last_activity_ts = 0;
    }

    fn is_live(&self) -> bool {
        matches!(
            self.connection,
            ConnectionState::Connected | ConnectionState::ConnectedInterrupted
        )
    }

    fn join_barrier_met(&self) -> bool {
        self.agent_joined && (!self.avatar_enabled || self.avatar_joined)
    }

    fn all_required_offline(&self) -> bool {
        if self.avatar_enabled {
            !self.agent_joined && !self.avatar_joined
        } else {
            !self.agent_joined
        }
    }
}
