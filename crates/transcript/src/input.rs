use convo_agent_interface::{ChannelMessage, Speaker, TranscriptFragment, TurnStatus};

/// Convert a data-channel message into a [`TranscriptFragment`].
///
/// Returns `None` for non-transcription messages (state, metrics, errors)
/// and for assistant messages carrying an undefined `turn_status` — those
/// are dropped, matching the wire contract. Keeping the conversion here
/// leaves the reconciler free of wire-format dependencies; tests and
/// non-channel sources construct fragments directly.
pub fn fragment_from_message(message: &ChannelMessage) -> Option<TranscriptFragment> {
    match message {
        ChannelMessage::AssistantTranscription {
            turn_id,
            text,
            turn_status,
            send_ts,
            ..
        } => {
            let status = TurnStatus::from_wire(*turn_status);
            if status == TurnStatus::Unknown {
                tracing::debug!(
                    turn_id = *turn_id,
                    turn_status = *turn_status,
                    "dropping_undefined_turn_status"
                );
                return None;
            }
            Some(TranscriptFragment {
                turn_id: *turn_id,
                speaker: Speaker::Agent,
                text: text.clone(),
                is_final: status != TurnStatus::InProgress,
                is_interrupted: status == TurnStatus::Interrupted,
                timestamp_ms: *send_ts,
            })
        }

        ChannelMessage::UserTranscription {
            turn_id,
            text,
            is_final,
            send_ts,
            ..
        } => Some(TranscriptFragment {
            turn_id: *turn_id,
            speaker: Speaker::User,
            text: text.clone(),
            is_final: *is_final,
            is_interrupted: false,
            timestamp_ms: *send_ts,
        }),

        ChannelMessage::Interrupt { turn_id, start_ms } => Some(TranscriptFragment {
            turn_id: *turn_id,
            speaker: Speaker::Agent,
            text: String::new(),
            is_final: true,
            is_interrupted: true,
            timestamp_ms: *start_ms,
        }),

        ChannelMessage::State { .. }
        | ChannelMessage::ModuleError { .. }
        | ChannelMessage::Metric { .. } => None,
    }
}
