use thiserror::Error;

/// Size of the on-wire message header: 4-byte ASCII tag + u32-LE total length.
pub const HEADER_SIZE: usize = 8;

/// Upper bound on a single framed message, header included. Anything larger is
/// treated as a corrupt stream rather than an allocation request.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Magic prefix of a capture file: raw wire messages concatenated after it.
pub const CAPTURE_MAGIC: &[u8; 8] = b"RMTBLOGF";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    #[error("declared message length {0} is shorter than the {HEADER_SIZE}-byte header")]
    LengthTooShort(u32),
    #[error("declared message length {0} exceeds the {MAX_MESSAGE_SIZE}-byte cap")]
    LengthTooLong(u32),
}

/// Four-byte ASCII message type tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    /// Full sample tree for one thread.
    pub const SAMPLE_TREE: Tag = Tag(*b"SMPL");
    /// Sample name hash resolution pushed by the peer.
    pub const SAMPLE_NAME: Tag = Tag(*b"SSMP");
    /// Thread name hash resolution pushed by the peer.
    pub const THREAD_NAME: Tag = Tag(*b"THRN");
    /// Per-processor thread occupancy snapshot.
    pub const PROCESSOR_THREADS: Tag = Tag(*b"PRTH");
    /// Property value snapshot.
    pub const PROPERTY_SNAPSHOT: Tag = Tag(*b"PSNP");
    /// Heartbeat, no payload.
    pub const HEARTBEAT: Tag = Tag(*b"PING");

    /// Synthetic tag delivered to listeners when a connection opens.
    /// Never appears on the wire.
    pub const CONNECT: Tag = Tag(*b"+CON");
    /// Synthetic tag delivered to listeners when a connection closes.
    pub const DISCONNECT: Tag = Tag(*b"-CON");
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

/// Decoded message header. `length` is the total on-wire size including the
/// header itself, so the payload is `length - HEADER_SIZE` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub tag: Tag,
    pub length: u32,
}

impl MessageHeader {
    pub fn decode(bytes: &[u8; HEADER_SIZE]) -> Result<Self, FramingError> {
        let tag = Tag([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let length = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if (length as usize) < HEADER_SIZE {
            return Err(FramingError::LengthTooShort(length));
        }
        if (length as usize) > MAX_MESSAGE_SIZE {
            return Err(FramingError::LengthTooLong(length));
        }
        Ok(Self { tag, length })
    }

    pub fn payload_len(&self) -> usize {
        self.length as usize - HEADER_SIZE
    }
}

/// Frame a payload into on-wire bytes.
pub fn encode_message(tag: Tag, payload: &[u8]) -> Vec<u8> {
    let total = HEADER_SIZE + payload.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&tag.0);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Reassembles framed messages from an arbitrary byte stream.
///
/// Transports deliver reads at whatever boundaries they like; this buffers
/// partial data and yields one complete `(tag, payload)` at a time.
#[derive(Debug, Default)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Discard buffered bytes, e.g. after a connection drops mid-message.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete message, if one has fully arrived.
    pub fn next_message(&mut self) -> Result<Option<(Tag, Vec<u8>)>, FramingError> {
        if self.buf.len() < HEADER_SIZE {
            return Ok(None);
        }
        let mut header_bytes = [0u8; HEADER_SIZE];
        header_bytes.copy_from_slice(&self.buf[..HEADER_SIZE]);
        let header = MessageHeader::decode(&header_bytes)?;
        let total = header.length as usize;
        if self.buf.len() < total {
            return Ok(None);
        }
        let payload = self.buf[HEADER_SIZE..total].to_vec();
        self.buf.drain(..total);
        Ok(Some((header.tag, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_reassemble() {
        let msg = encode_message(Tag::SAMPLE_NAME, b"abc");
        assert_eq!(msg.len(), 11);
        assert_eq!(&msg[..4], b"SSMP");
        assert_eq!(u32::from_le_bytes([msg[4], msg[5], msg[6], msg[7]]), 11);

        let mut acc = FrameAccumulator::new();
        acc.feed(&msg);
        let (tag, payload) = acc.next_message().unwrap().unwrap();
        assert_eq!(tag, Tag::SAMPLE_NAME);
        assert_eq!(payload, b"abc");
        assert!(acc.next_message().unwrap().is_none());
    }

    #[test]
    fn partial_delivery_across_boundaries() {
        let msg = encode_message(Tag::HEARTBEAT, &[]);
        let mut acc = FrameAccumulator::new();
        acc.feed(&msg[..3]);
        assert!(acc.next_message().unwrap().is_none());
        acc.feed(&msg[3..7]);
        assert!(acc.next_message().unwrap().is_none());
        acc.feed(&msg[7..]);
        let (tag, payload) = acc.next_message().unwrap().unwrap();
        assert_eq!(tag, Tag::HEARTBEAT);
        assert!(payload.is_empty());
    }

    #[test]
    fn two_messages_in_one_read() {
        let mut bytes = encode_message(Tag::SAMPLE_TREE, &[1, 2]);
        bytes.extend_from_slice(&encode_message(Tag::PROCESSOR_THREADS, &[3]));
        let mut acc = FrameAccumulator::new();
        acc.feed(&bytes);
        assert_eq!(
            acc.next_message().unwrap().unwrap(),
            (Tag::SAMPLE_TREE, vec![1, 2])
        );
        assert_eq!(
            acc.next_message().unwrap().unwrap(),
            (Tag::PROCESSOR_THREADS, vec![3])
        );
    }

    #[test]
    fn undersized_length_is_an_error() {
        let mut acc = FrameAccumulator::new();
        let mut bad = Vec::from(*b"SMPL");
        bad.extend_from_slice(&4u32.to_le_bytes());
        acc.feed(&bad);
        assert_eq!(
            acc.next_message().unwrap_err(),
            FramingError::LengthTooShort(4)
        );
    }
}
