//! Transport-boundary events.
//!
//! The RTC transport is out of scope; its SDK callbacks are represented as
//! one tagged union so the session core consumes a single event stream
//! instead of a delegate surface. The embedding layer converts its SDK's
//! callbacks into these values and forwards them — already marshaled onto
//! the session mailbox, never calling into core state directly.

/// Connection-level state reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Reconnecting,
    Failed,
}

/// Why the transport connection state changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum LinkChangeReason {
    RejoinSuccess,
    Interrupted,
    LeaveChannel,
    JoinFailed,
    Other,
}

/// Why a remote participant left the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub enum OfflineReason {
    /// Normal, user-initiated leave.
    Quit,
    /// Connection lost or any other abnormal cause.
    Dropped,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "specta", derive(specta::Type))]
#[serde(tag = "type")]
pub enum TransportEvent {
    #[serde(rename = "participantJoined")]
    ParticipantJoined { participant: String },

    #[serde(rename = "participantOffline")]
    ParticipantOffline {
        participant: String,
        reason: OfflineReason,
    },

    #[serde(rename = "connectionChanged")]
    ConnectionChanged {
        state: LinkState,
        reason: LinkChangeReason,
    },

    /// Playback volume indication for one participant, 0-255.
    #[serde(rename = "audioVolume")]
    AudioVolume { participant: String, volume: u16 },
}
