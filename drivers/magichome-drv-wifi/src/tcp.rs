// A `Transport` that talks to a MagicHome controller over TCP. The
// connection is opened on first use and kept open. Any I/O error
// drops it so the next request reconnects.

use crate::wire;
use async_trait::async_trait;
use magichome_api::{DeviceState, Error, Result, Transport};
use std::net::SocketAddrV4;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{self, Duration},
};
use tracing::{debug, info};

const WRITE_TIMEOUT: Duration = Duration::from_millis(500);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

pub struct TcpTransport {
    addr: SocketAddrV4,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub fn new(addr: SocketAddrV4) -> Self {
        TcpTransport { addr, stream: None }
    }

    // Connects to the address. Sets a timeout of 1 second for the
    // connection.

    async fn connect(addr: &SocketAddrV4) -> Result<TcpStream> {
        match time::timeout(CONNECT_TIMEOUT, TcpStream::connect(*addr)).await
        {
            Ok(Ok(s)) => {
                s.set_nodelay(true)
                    .map_err(|e| Error::MissingPeer(e.to_string()))?;
                info!("connected to {}", addr);
                Ok(s)
            }
            Ok(Err(e)) => Err(Error::MissingPeer(e.to_string())),
            Err(_) => Err(Error::MissingPeer("timeout".into())),
        }
    }

    // Returns the open connection, opening one if needed.

    async fn stream(&mut self) -> Result<&mut TcpStream> {
        if self.stream.is_none() {
            self.stream = Some(TcpTransport::connect(&self.addr).await?);
        }
        self.stream
            .as_mut()
            .ok_or_else(|| Error::MissingPeer(self.addr.to_string()))
    }

    // Writes one frame to the socket.

    async fn write_frame<S>(s: &mut S, buf: &[u8]) -> Result<()>
    where
        S: AsyncWriteExt + std::marker::Unpin,
    {
        const ERR_F: fn(std::io::Error) -> Error =
            |e| Error::MissingPeer(e.to_string());

        #[rustfmt::skip]
        tokio::select! {
            result = s.write_all(buf) => {
                match result {
                    Ok(_) => s.flush().await.map_err(ERR_F),
                    Err(e) => Err(ERR_F(e))
                }
            }
            _ = time::sleep(WRITE_TIMEOUT) => Err(Error::TimeoutError)
        }
    }

    // Reads a state reply. Replies have a fixed length so we know how
    // much data to read.

    async fn read_reply<R>(s: &mut R) -> Result<DeviceState>
    where
        R: AsyncReadExt + std::marker::Unpin,
    {
        let mut buf = [0u8; wire::REPLY_LEN];

        s.read_exact(&mut buf)
            .await
            .map_err(|e| Error::MissingPeer(e.to_string()))?;
        wire::decode_state(&buf)
    }

    async fn query(&mut self, timeout: Duration) -> Result<DeviceState> {
        let frame = wire::with_checksum(&wire::query_cmd());
        let s = self.stream().await?;

        TcpTransport::write_frame(s, &frame).await?;
        time::timeout(timeout, TcpTransport::read_reply(s))
            .await
            .map_err(|_| Error::TimeoutError)?
    }

    async fn transmit(&mut self, cmd: &[u8], use_checksum: bool) -> Result<()> {
        let frame = if use_checksum {
            wire::with_checksum(cmd)
        } else {
            cmd.to_vec()
        };

        debug!("sending {:02x?}", &frame);
        TcpTransport::write_frame(self.stream().await?, &frame).await
    }

    // A failed request leaves the connection in an unknown state, so
    // it's closed.

    fn check<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.stream = None;
        }
        result
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn get_state(&mut self, timeout: Duration) -> Result<DeviceState> {
        let result = self.query(timeout).await;

        self.check(result)
    }

    async fn send(&mut self, cmd: &[u8], use_checksum: bool) -> Result<()> {
        let result = self.transmit(cmd, use_checksum).await;

        self.check(result)
    }
}
