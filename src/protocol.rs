//! Wire conventions shared by the server and the client
//!
//! There is no framing: a message is whatever bytes a single read returns.
//! Large payloads that arrive in several segments are therefore handled as
//! several messages, each acknowledged on its own.

use crate::{AckError, Result};

/// Prefix of every acknowledgment the server writes back
pub const ACK_PREFIX: &str = "Server received: ";

/// Maximum number of acknowledgment bytes the client reads per send cycle
pub const ACK_READ_SIZE: usize = 1024;

/// Client-side label for a liveness check. The server echoes it like any other message.
pub const CONNECTION_TEST: &str = "CONNECTION_TEST";

/// Client-side label for an info request. The server echoes it like any other message.
pub const GET_SERVER_INFO: &str = "GET_SERVER_INFO";

/// Builds the acknowledgment for a decoded message
pub fn acknowledgment(message: &str) -> String {
    format!("{ACK_PREFIX}{message}")
}

/// Returns true when a payload carries no visible content
pub fn is_blank(payload: &str) -> bool {
    payload.trim().is_empty()
}

/// Rejects blank payloads before any connection is opened
pub fn validate_payload(payload: &str) -> Result<&str> {
    if is_blank(payload) {
        return Err(AckError::EmptyPayload);
    }
    Ok(payload)
}
