//! TCP attendance protocol client

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use contracts::{Branch, DeviceSettings, PunchRecord};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::packet::{
    self, Packet, ATTENDANCE_REQUEST, CMD_ACK_OK, CMD_ACK_UNAUTH, CMD_CONNECT, CMD_DATA,
    CMD_DATA_RDY, CMD_DATA_WRRQ, CMD_EXIT, CMD_FREE_DATA, CMD_PREPARE_DATA, MAX_BUFFER_LEN,
    MAX_CHUNK, PREFIX_LEN,
};
use super::record::decode_records;
use crate::client::{DeviceClient, DeviceConnector};
use crate::error::{DeviceError, Result};

/// Protocol session over any byte stream
///
/// Tracks the session id handed out by the terminal and the rolling reply id.
pub struct ZkTransport<S> {
    stream: S,
    session_id: u16,
    reply_id: u16,
    reply_timeout: Duration,
}

impl<S> ZkTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, reply_timeout: Duration) -> Self {
        Self {
            stream,
            session_id: 0,
            reply_id: 0,
            reply_timeout,
        }
    }

    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    /// Perform the CONNECT handshake and adopt the session id from the reply
    pub async fn handshake(&mut self) -> Result<()> {
        let reply = self.execute(CMD_CONNECT, &[]).await?;
        match reply.command {
            CMD_ACK_OK => {
                self.session_id = reply.session_id;
                Ok(())
            }
            CMD_ACK_UNAUTH => Err(DeviceError::protocol(
                "terminal requires a comm key, which is not supported",
            )),
            other => Err(DeviceError::protocol(format!(
                "unexpected reply {other} to CONNECT"
            ))),
        }
    }

    /// Send a command and wait for its reply
    pub async fn execute(&mut self, command: u16, data: &[u8]) -> Result<Packet> {
        if command == CMD_CONNECT {
            self.session_id = 0;
            self.reply_id = 0;
        } else {
            self.reply_id = packet::next_reply_id(self.reply_id);
        }
        self.send(command, data).await?;
        self.read_packet().await
    }

    /// Send a command that must be acknowledged with ACK_OK
    pub async fn execute_acked(&mut self, command: u16, data: &[u8]) -> Result<()> {
        let reply = self.execute(command, data).await?;
        if reply.command == CMD_ACK_OK {
            Ok(())
        } else {
            Err(DeviceError::protocol(format!(
                "command {command} answered with {} instead of ACK_OK",
                reply.command
            )))
        }
    }

    /// Read a whole data table with the buffered-read request
    ///
    /// Small tables come back inline in a DATA reply; larger ones are
    /// announced with their size and pulled in chunks.
    pub async fn read_buffer(&mut self, request: &[u8]) -> Result<Bytes> {
        let reply = self.execute(CMD_DATA_WRRQ, request).await?;
        match reply.command {
            CMD_DATA => Ok(reply.data),
            CMD_ACK_OK | CMD_PREPARE_DATA => {
                if reply.data.len() < 5 {
                    return Err(DeviceError::protocol(format!(
                        "buffered read announcement too short: {} bytes",
                        reply.data.len()
                    )));
                }
                let size = u32::from_le_bytes([
                    reply.data[1],
                    reply.data[2],
                    reply.data[3],
                    reply.data[4],
                ]);
                debug!(size, "Buffered read announced");
                if size > MAX_BUFFER_LEN {
                    return Err(DeviceError::protocol(format!(
                        "buffered read of {size} bytes exceeds limit of {MAX_BUFFER_LEN}"
                    )));
                }

                let mut buffer = BytesMut::with_capacity(size as usize);
                let mut start = 0u32;
                while start < size {
                    let chunk = MAX_CHUNK.min(size - start);
                    self.read_chunk(start, chunk, &mut buffer).await?;
                    start += chunk;
                }
                Ok(buffer.freeze())
            }
            other => Err(DeviceError::protocol(format!(
                "unexpected reply {other} to DATA_WRRQ"
            ))),
        }
    }

    /// Pull one chunk: PREPARE_DATA / DATA packets terminated by ACK_OK
    async fn read_chunk(&mut self, start: u32, size: u32, buffer: &mut BytesMut) -> Result<()> {
        let mut request = [0u8; 8];
        request[..4].copy_from_slice(&start.to_le_bytes());
        request[4..].copy_from_slice(&size.to_le_bytes());

        self.reply_id = packet::next_reply_id(self.reply_id);
        self.send(CMD_DATA_RDY, &request).await?;

        let target = buffer.len() + size as usize;
        loop {
            let packet = self.read_packet().await?;
            match packet.command {
                CMD_PREPARE_DATA => continue,
                CMD_DATA => buffer.extend_from_slice(&packet.data),
                CMD_ACK_OK if buffer.len() >= target => return Ok(()),
                CMD_ACK_OK => {
                    return Err(DeviceError::protocol(format!(
                        "chunk at {start} acknowledged after {} of {size} bytes",
                        size as usize - (target - buffer.len())
                    )))
                }
                other => {
                    return Err(DeviceError::protocol(format!(
                        "unexpected packet {other} while reading chunk at {start}"
                    )))
                }
            }
        }
    }

    /// Flush and close the underlying stream
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn send(&mut self, command: u16, data: &[u8]) -> Result<()> {
        let frame = packet::encode(command, self.session_id, self.reply_id, data);
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_packet(&mut self) -> Result<Packet> {
        let reply_timeout = self.reply_timeout;
        timeout(reply_timeout, read_frame(&mut self.stream))
            .await
            .map_err(|_| DeviceError::Timeout {
                operation: "device reply",
                after_ms: reply_timeout.as_millis() as u64,
            })?
    }
}

async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Packet> {
    let mut prefix = [0u8; PREFIX_LEN];
    stream.read_exact(&mut prefix).await?;
    let len = packet::parse_prefix(&prefix)?;

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    Packet::parse(Bytes::from(body))
}

/// Attendance terminal client over TCP
///
/// One instance serves one fetch cycle.
pub struct ZkClient {
    address: String,
    settings: DeviceSettings,
    transport: Option<ZkTransport<TcpStream>>,
}

impl ZkClient {
    pub fn new(address: impl Into<String>, settings: DeviceSettings) -> Self {
        Self {
            address: address.into(),
            settings,
            transport: None,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    async fn open(&self) -> Result<ZkTransport<TcpStream>> {
        let stream = TcpStream::connect((self.address.as_str(), self.settings.port)).await?;
        stream.set_nodelay(true)?;

        let mut transport = ZkTransport::new(stream, self.settings.reply_timeout());
        transport.handshake().await?;
        Ok(transport)
    }

    async fn read_attendance(
        transport: &mut ZkTransport<TcpStream>,
        ip: &str,
    ) -> Result<Vec<PunchRecord>> {
        transport.execute_acked(CMD_FREE_DATA, &[]).await?;
        let buffer = transport.read_buffer(&ATTENDANCE_REQUEST).await?;
        if let Err(e) = transport.execute_acked(CMD_FREE_DATA, &[]).await {
            warn!(ip = %ip, error = %e, "Failed to release device buffer");
        }
        Ok(decode_records(&buffer, ip))
    }
}

impl DeviceClient for ZkClient {
    #[instrument(
        name = "zk_connect",
        skip(self),
        fields(address = %self.address, port = self.settings.port)
    )]
    async fn connect(&mut self) -> Result<()> {
        let connect_timeout = self.settings.connect_timeout();
        let transport = timeout(connect_timeout, self.open())
            .await
            .map_err(|_| {
                DeviceError::connection(
                    &self.address,
                    format!("timed out after {}ms", connect_timeout.as_millis()),
                )
            })?
            .map_err(|e| DeviceError::connection(&self.address, e.to_string()))?;

        debug!(session_id = transport.session_id(), "Terminal session opened");
        self.transport = Some(transport);
        Ok(())
    }

    #[instrument(name = "zk_fetch_records", skip(self), fields(address = %self.address))]
    async fn fetch_records(&mut self) -> Result<Vec<PunchRecord>> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| DeviceError::retrieval(&self.address, "not connected"))?;

        let records = Self::read_attendance(transport, &self.address)
            .await
            .map_err(|e| DeviceError::retrieval(&self.address, e.to_string()))?;

        debug!(records = records.len(), "Attendance records read");
        Ok(records)
    }

    #[instrument(name = "zk_disconnect", skip(self), fields(address = %self.address))]
    async fn disconnect(&mut self) -> Result<()> {
        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        let exit = transport.execute(CMD_EXIT, &[]).await;
        let closed = transport.shutdown().await;

        exit.map_err(|e| DeviceError::disconnection(&self.address, e.to_string()))?;
        closed.map_err(|e| DeviceError::disconnection(&self.address, e.to_string()))?;
        Ok(())
    }
}

/// Builds a `ZkClient` per branch using shared device settings
#[derive(Debug, Clone, Default)]
pub struct ZkConnector {
    settings: DeviceSettings,
}

impl ZkConnector {
    pub fn new(settings: DeviceSettings) -> Self {
        Self { settings }
    }
}

impl DeviceConnector for ZkConnector {
    type Client = ZkClient;

    fn client_for(&self, branch: &Branch) -> ZkClient {
        ZkClient::new(&branch.address, self.settings.clone())
    }
}
