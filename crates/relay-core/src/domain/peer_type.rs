//! Role tag exchanged once per connection.

use std::fmt;

use super::HandshakeError;

/// Role of the far end of a connection.
///
/// Sent as a single byte by the connecting side immediately after connect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum PeerType {
    /// The relay in the middle.
    Proxy = 0,
    /// Generates the sequence and collects what comes back.
    Initiator = 1,
    /// Sends every received value straight back.
    Echo = 2,
}

impl PeerType {
    /// All known roles, in wire-code order.
    pub const ALL: [PeerType; 3] = [PeerType::Proxy, PeerType::Initiator, PeerType::Echo];

    /// Wire code of this role.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Short lowercase name, used in logs and worker names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PeerType::Proxy => "proxy",
            PeerType::Initiator => "initiator",
            PeerType::Echo => "echo",
        }
    }
}

impl TryFrom<u8> for PeerType {
    type Error = HandshakeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(PeerType::Proxy),
            1 => Ok(PeerType::Initiator),
            2 => Ok(PeerType::Echo),
            other => Err(HandshakeError::UnknownPeerType(other)),
        }
    }
}

impl fmt::Display for PeerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
