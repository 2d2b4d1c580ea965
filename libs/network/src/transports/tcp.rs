//! TCP Transport Implementation
//!
//! Opens one connection per exchange, writes the framed request under the
//! write deadline and reads the framed reply under the read deadline. The
//! reply length prefix is trusted: the reader takes exactly the declared
//! number of body bytes instead of waiting for the collector to close.

use crate::address::CollectorAddress;
use crate::error::{IoPhase, SenderError};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use zbx_codec::{
    decode_response_body, encode_packet, FrameHeader, Packet, ProtocolError, Response,
    FRAME_PREFIX_SIZE,
};
use zbx_config::{defaults, SenderSettings};

/// TCP transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpTransportConfig {
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Deadline for writing the request frame
    pub write_timeout: Duration,
    /// Deadline for reading the response frame
    pub read_timeout: Duration,
    /// Maximum accepted response body size
    pub max_response_size: usize,
}

impl Default for TcpTransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: defaults::CONNECT_TIMEOUT,
            write_timeout: defaults::WRITE_TIMEOUT,
            read_timeout: defaults::READ_TIMEOUT,
            max_response_size: defaults::MAX_RESPONSE_SIZE,
        }
    }
}

impl From<&SenderSettings> for TcpTransportConfig {
    fn from(settings: &SenderSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout(),
            write_timeout: settings.write_timeout(),
            read_timeout: settings.read_timeout(),
            max_response_size: settings.max_response_size,
        }
    }
}

/// Production transport: one TCP connection per exchange
#[derive(Debug, Clone, Default)]
pub struct TcpTransport {
    config: TcpTransportConfig,
}

impl TcpTransport {
    pub fn new(config: TcpTransportConfig) -> Self {
        Self { config }
    }

    /// Transport with explicit connect/read/write timeouts
    pub fn with_timeouts(connect: Duration, read: Duration, write: Duration) -> Self {
        Self::new(TcpTransportConfig {
            connect_timeout: connect,
            read_timeout: read,
            write_timeout: write,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &TcpTransportConfig {
        &self.config
    }

    async fn connect(&self, address: &CollectorAddress) -> Result<TcpStream> {
        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect((address.host(), address.port())),
        )
        .await
        .map_err(|_| SenderError::connect_timeout(address, millis(self.config.connect_timeout)))?
        .map_err(|e| SenderError::connect(address, e))?;

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY for {}: {}", address, e);
        }

        Ok(stream)
    }
}

fn millis(timeout: Duration) -> u64 {
    timeout.as_millis() as u64
}

/// Fill `buf` until it is full or the peer closes; returns bytes read
async fn read_until_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one response frame from `reader`
///
/// Short reads are protocol errors, not I/O errors: a peer that closes after
/// three bytes sent a malformed frame.
pub async fn read_response_frame<R>(
    reader: &mut R,
    address: &CollectorAddress,
    max_response_size: usize,
) -> Result<Response>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; FRAME_PREFIX_SIZE];
    let got = read_until_full(reader, &mut prefix)
        .await
        .map_err(|e| SenderError::io(IoPhase::Read, address, e))?;

    let header = FrameHeader::parse(&prefix[..got])
        .map_err(|e| SenderError::protocol(address, e))?;
    let body_len = header
        .check_limit(max_response_size)
        .map_err(|e| SenderError::protocol(address, e))?;

    let mut body = vec![0u8; body_len];
    let got = read_until_full(reader, &mut body)
        .await
        .map_err(|e| SenderError::io(IoPhase::Read, address, e))?;
    if got < body_len {
        return Err(SenderError::protocol(
            address,
            ProtocolError::Truncated {
                declared: header.body_len,
                got,
            },
        ));
    }

    decode_response_body(&body).map_err(|e| SenderError::protocol(address, e))
}

#[async_trait]
impl super::Transport for TcpTransport {
    async fn exchange(&self, address: &CollectorAddress, packet: &Packet) -> Result<Response> {
        let frame = encode_packet(packet)?;
        let started = Instant::now();

        // Dropped (and closed) on every return path below
        let mut stream = self.connect(address).await?;

        tokio::time::timeout(self.config.write_timeout, async {
            stream.write_all(&frame).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| {
            SenderError::io_timeout(IoPhase::Write, address, millis(self.config.write_timeout))
        })?
        .map_err(|e| SenderError::io(IoPhase::Write, address, e))?;

        debug!(
            peer = %address,
            request = %packet.request,
            metrics = packet.len(),
            bytes = frame.len(),
            "Sent request frame"
        );

        let response = tokio::time::timeout(
            self.config.read_timeout,
            read_response_frame(&mut stream, address, self.config.max_response_size),
        )
        .await
        .map_err(|_| {
            SenderError::io_timeout(IoPhase::Read, address, millis(self.config.read_timeout))
        })??;

        debug!(
            peer = %address,
            status = %response.status,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Received response frame"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::Transport;
    use tokio::net::TcpListener;
    use zbx_codec::{encode_response, DeliveryMode, Metric};

    fn addr() -> CollectorAddress {
        CollectorAddress::new("127.0.0.1", 10051)
    }

    #[tokio::test]
    async fn test_read_frame_from_bytes() {
        let frame = encode_response(&Response::success("ok")).unwrap();
        let mut reader: &[u8] = &frame;

        let response = read_response_frame(&mut reader, &addr(), 1024).await.unwrap();
        assert_eq!(response, Response::success("ok"));
    }

    #[tokio::test]
    async fn test_short_frame_is_protocol_error() {
        let mut reader: &[u8] = b"ZBX";

        let err = read_response_frame(&mut reader, &addr(), 1024).await.unwrap_err();
        assert!(matches!(
            err,
            SenderError::Protocol {
                source: ProtocolError::MessageTooSmall { got: 3, .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_truncated_body() {
        let frame = encode_response(&Response::success("ok")).unwrap();
        let mut reader: &[u8] = &frame[..frame.len() - 2];

        let err = read_response_frame(&mut reader, &addr(), 1024).await.unwrap_err();
        assert!(matches!(
            err,
            SenderError::Protocol {
                source: ProtocolError::Truncated { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected_before_reading() {
        let mut frame = b"ZBXD\x01".to_vec();
        frame.extend_from_slice(&(1u64 << 40).to_le_bytes());
        let mut reader: &[u8] = &frame;

        let err = read_response_frame(&mut reader, &addr(), 1024).await.unwrap_err();
        assert!(matches!(
            err,
            SenderError::Protocol {
                source: ProtocolError::MessageTooLarge { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = TcpTransport::default();
        let packet = Packet::data(DeliveryMode::Trapper, vec![Metric::trapper("h", "k", "v")])
            .unwrap();

        let err = transport
            .exchange(&CollectorAddress::new("127.0.0.1", port), &packet)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(IoPhase::Establish));
    }

    #[tokio::test]
    async fn test_write_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept but never read, so socket buffers fill up
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(3)).await;
            drop(stream);
        });

        let transport = TcpTransport::with_timeouts(
            Duration::from_secs(1),
            Duration::from_secs(1),
            Duration::from_millis(200),
        );
        // Far more than loopback send + receive buffers hold
        let value = "x".repeat(32 * 1024 * 1024);
        let packet = Packet::data(
            DeliveryMode::Trapper,
            vec![Metric::trapper("web-01", "bulk.payload", value)],
        )
        .unwrap();

        let err = transport
            .exchange(&CollectorAddress::new("127.0.0.1", port), &packet)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(IoPhase::Write));
        assert!(err.to_string().contains("failed to write"));
        assert!(err.to_string().contains("timed out after 200ms"));

        server.abort();
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and hold the connection open without answering
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            drop(stream);
        });

        let transport = TcpTransport::with_timeouts(
            Duration::from_secs(1),
            Duration::from_millis(100),
            Duration::from_secs(1),
        );
        let packet = Packet::registration("web-01", "");

        let err = transport
            .exchange(&CollectorAddress::new("127.0.0.1", port), &packet)
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(IoPhase::Read));
        assert!(err.to_string().contains("timed out after 100ms"));

        server.await.unwrap();
    }
}
