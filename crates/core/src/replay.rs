use log::{debug, warn};
use thiserror::Error;

use emberline_wire::framing::MessageHeader;
use emberline_wire::{CAPTURE_MAGIC, DispatchError, Dispatcher, FramingError, HEADER_SIZE};

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("not a capture file (bad magic)")]
    BadMagic,
    #[error("corrupt capture framing: {0}")]
    Framing(#[from] FramingError),
    #[error("handler rejected message: {0}")]
    Malformed(DispatchError),
}

/// What a replay pass consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub messages: usize,
    /// The capture ended mid-message. Expected for logs cut off while being
    /// written; the preceding messages all applied.
    pub truncated: bool,
}

/// Replay a capture file through the same dispatcher a live connection
/// feeds, so stored and live traffic take the identical decode path.
///
/// The buffer is the 8-byte magic followed by concatenated wire messages.
/// A truncated final message (or a final payload whose decode runs off the
/// end) terminates the replay cleanly rather than failing it.
pub fn replay_capture<S>(
    bytes: &[u8],
    dispatcher: &mut Dispatcher<S>,
    state: &mut S,
) -> Result<ReplayStats, ReplayError> {
    if bytes.len() < CAPTURE_MAGIC.len() || &bytes[..CAPTURE_MAGIC.len()] != CAPTURE_MAGIC {
        return Err(ReplayError::BadMagic);
    }

    let mut stats = ReplayStats {
        messages: 0,
        truncated: false,
    };
    let mut offset = CAPTURE_MAGIC.len();

    while bytes.len() - offset >= HEADER_SIZE {
        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&bytes[offset..offset + HEADER_SIZE]);
        let header = MessageHeader::decode(&header_bytes)?;

        let end = offset + header.length as usize;
        if end > bytes.len() {
            stats.truncated = true;
            break;
        }

        let payload = &bytes[offset + HEADER_SIZE..end];
        match dispatcher.dispatch(state, header.tag, payload) {
            Ok(()) => stats.messages += 1,
            Err(DispatchError::Truncated(err)) => {
                warn!("capture ends mid-record ({err}), stopping replay");
                stats.truncated = true;
                break;
            }
            Err(err) => return Err(ReplayError::Malformed(err)),
        }
        offset = end;
    }

    if offset < bytes.len() && !stats.truncated {
        stats.truncated = true;
    }
    debug!(
        "replayed {} messages{}",
        stats.messages,
        if stats.truncated { " (truncated)" } else { "" }
    );
    Ok(stats)
}
