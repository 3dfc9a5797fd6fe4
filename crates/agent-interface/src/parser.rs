//! Chunked stream-message reassembly.
//!
//! Data-channel packets have a fixed maximum size, so the backend splits
//! each JSON payload into base64 chunks framed as
//! `message_id|part_index|part_total|chunk` with a 1-based part index.
//! Parts of one message may arrive out of order, and parts of different
//! messages may interleave. The parser buffers per message id and yields
//! the decoded [`ChannelMessage`] once every part is present.

use std::collections::{BTreeMap, HashMap};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::message::ChannelMessage;

/// Partial messages untouched for this long are evicted on the next feed.
const STALE_MESSAGE_MAX_AGE_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("packet must have 4 '|'-separated fields, got {0}")]
    FieldCount(usize),

    #[error("part index or total is not a number")]
    PartNumber,

    #[error("part index {index} out of range 1..={total}")]
    PartOutOfRange { index: u32, total: u32 },

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Stateful reassembler for chunked data-channel packets.
///
/// The caller supplies `now_ms` so eviction is deterministic and testable;
/// any monotonic-enough wall clock works.
#[derive(Default)]
pub struct MessageParser {
    parts: HashMap<String, BTreeMap<u32, String>>,
    totals: HashMap<String, u32>,
    last_access_ms: HashMap<String, i64>,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw packet. Returns the decoded message when this packet
    /// completes it, `Ok(None)` while parts are still outstanding.
    pub fn feed(&mut self, packet: &str, now_ms: i64) -> Result<Option<ChannelMessage>, ParseError> {
        self.evict_stale(now_ms);

        let fields: Vec<&str> = packet.splitn(4, '|').collect();
        if fields.len() != 4 {
            return Err(ParseError::FieldCount(fields.len()));
        }

        let message_id = fields[0].to_string();
        let index: u32 = fields[1].parse().map_err(|_| ParseError::PartNumber)?;
        let total: u32 = fields[2].parse().map_err(|_| ParseError::PartNumber)?;
        if index < 1 || index > total {
            return Err(ParseError::PartOutOfRange { index, total });
        }

        self.last_access_ms.insert(message_id.clone(), now_ms);
        self.totals.insert(message_id.clone(), total);

        let parts = self.parts.entry(message_id.clone()).or_default();
        parts.insert(index, fields[3].to_string());

        // Indexes are validated in range and deduplicated by the map, so
        // `len == total` means exactly parts 1..=total are present.
        if parts.len() as u32 != total {
            return Ok(None);
        }

        let joined: String = parts.values().map(String::as_str).collect();
        self.parts.remove(&message_id);
        self.totals.remove(&message_id);
        self.last_access_ms.remove(&message_id);

        let decoded = BASE64.decode(joined.as_bytes())?;
        let json = String::from_utf8(decoded)?;
        let message: ChannelMessage = serde_json::from_str(&json)?;
        Ok(Some(message))
    }

    /// Number of messages with outstanding parts.
    pub fn pending(&self) -> usize {
        self.parts.len()
    }

    pub fn clear(&mut self) {
        self.parts.clear();
        self.totals.clear();
        self.last_access_ms.clear();
    }

    fn evict_stale(&mut self, now_ms: i64) {
        let expired: Vec<String> = self
            .last_access_ms
            .iter()
            .filter(|(_, last)| now_ms - **last > STALE_MESSAGE_MAX_AGE_MS)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            self.parts.remove(&id);
            self.totals.remove(&id);
            self.last_access_ms.remove(&id);
        }
    }
}
