/// One message received from the client transport
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Text frame, expected to carry a JSON control message
    Text(String),
    /// Binary frame, one JPEG-encoded image
    Binary(Vec<u8>),
}

/// A received image plus the sequence number the session assigned on receipt
#[derive(Debug, Clone)]
pub struct Frame {
    /// 1-based frame number within the session
    pub sequence: u64,
    pub data: Vec<u8>,
}
