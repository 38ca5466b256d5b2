//! Wire format.
//!
//! The connecting side writes one [`PeerType`] byte, then both sides stream
//! raw little-endian `i64` values with no further framing.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::domain::{HandshakeError, NumericValue, PeerType};

/// Read exactly one value.
///
/// A clean EOF before the first byte surfaces as
/// [`io::ErrorKind::UnexpectedEof`].
pub async fn read_value<R>(reader: &mut R) -> io::Result<NumericValue>
where
    R: AsyncRead + Unpin,
{
    reader.read_i64_le().await
}

/// Write one value and flush it.
pub async fn write_value<W>(writer: &mut W, value: NumericValue) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_i64_le(value).await?;
    writer.flush().await
}

/// Announce the local role to the accepting side.
pub async fn write_peer_type<W>(writer: &mut W, peer_type: PeerType) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_u8(peer_type.code()).await?;
    writer.flush().await
}

/// Read the role byte sent by the connecting side.
pub async fn read_peer_type<R>(reader: &mut R) -> Result<PeerType, HandshakeError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_u8().await {
        Ok(code) => PeerType::try_from(code),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(HandshakeError::Closed),
        Err(e) => Err(HandshakeError::Io(e)),
    }
}
