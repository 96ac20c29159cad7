//! TCP transport: every worker process holds one connection to the coordinator.
//!
//! # Framing
//!
//! Each frame is a one-byte kind, a little-endian `u32` body length and the
//! body. A reader task per connection sorts incoming frames into a data
//! mailbox and a barrier mailbox, so `receive` and `barrier` never compete
//! for the socket.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs, lookup_host};
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::mailbox::Mailbox;
use crate::{COORDINATOR, Error, Exchange, Rank, check_route};

const MAX_RETRIES: usize = 5;
const HELLO_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Hello = 1,
    Data = 2,
    BarrierEnter = 3,
    BarrierRelease = 4,
}

impl TryFrom<u8> for FrameKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            1 => Ok(FrameKind::Hello),
            2 => Ok(FrameKind::Data),
            3 => Ok(FrameKind::BarrierEnter),
            4 => Ok(FrameKind::BarrierRelease),
            other => Err(Error::UnexpectedFrame(other)),
        }
    }
}

async fn write_frame<W>(writer: &mut W, kind: FrameKind, body: &[u8]) -> Result<(), Error>
where
    W: AsyncWrite + Unpin,
{
    let len = frame_len(body.len())?;

    let mut header = [0u8; 5];
    header[0] = kind as u8;
    header[1..].copy_from_slice(&len.to_le_bytes());

    writer.write_all(&header).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Body lengths travel as `u32`, so a frame body tops out just under 4 GiB.
fn frame_len(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::FrameTooLarge(len))
}

/// Reads one frame; `None` means the peer closed the connection between frames.
async fn read_frame<R>(reader: &mut R) -> Result<Option<(FrameKind, Vec<u8>)>, Error>
where
    R: AsyncRead + Unpin,
{
    let kind = match reader.read_u8().await {
        Ok(kind) => FrameKind::try_from(kind)?,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let len = reader.read_u32_le().await? as usize;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some((kind, body)))
}

fn encode_hello(rank: Rank, size: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HELLO_LEN);
    buf.extend_from_slice(&(rank as u64).to_le_bytes());
    buf.extend_from_slice(&(size as u64).to_le_bytes());
    buf
}

fn decode_hello(body: &[u8]) -> Result<(Rank, usize), Error> {
    if body.len() != HELLO_LEN {
        return Err(Error::MalformedHello);
    }
    let (rank, size) = body.split_at(8);
    let rank = u64::from_le_bytes(rank.try_into().map_err(|_| Error::MalformedHello)?);
    let size = u64::from_le_bytes(size.try_into().map_err(|_| Error::MalformedHello)?);
    Ok((rank as Rank, size as usize))
}

/// Coordinator-side listener that gathers the worker connections.
pub struct TcpHub {
    listener: TcpListener,
}

impl TcpHub {
    /// Binds the coordinator's listening socket.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "coordinator listening");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Waits for workers `1..size` to connect and returns the rank 0 endpoint.
    ///
    /// Every connection must open with a hello frame naming a distinct
    /// worker rank and the same group size.
    pub async fn accept(self, size: usize) -> Result<TcpExchange, Error> {
        if size == 0 {
            return Err(Error::EmptyGroup);
        }

        let mut peers: HashMap<Rank, TcpStream> = HashMap::new();
        while peers.len() < size - 1 {
            let (mut stream, peer_addr) = self.listener.accept().await?;
            stream.set_nodelay(true)?;

            let (rank, announced) = match read_frame(&mut stream).await? {
                Some((FrameKind::Hello, body)) => decode_hello(&body)?,
                Some((kind, _)) => return Err(Error::UnexpectedFrame(kind as u8)),
                None => return Err(Error::MalformedHello),
            };

            if announced != size {
                return Err(Error::SizeMismatch {
                    expected: size,
                    found: announced,
                });
            }
            if rank == COORDINATOR || rank >= size {
                return Err(Error::UnknownRole(rank));
            }
            if peers.contains_key(&rank) {
                return Err(Error::DuplicateRole(rank));
            }

            info!(rank, peer = %peer_addr, "worker connected");
            peers.insert(rank, stream);
        }

        Ok(TcpExchange::assemble(COORDINATOR, size, peers))
    }
}

/// An exchange endpoint whose peers are reached over TCP.
pub struct TcpExchange {
    rank: Rank,
    size: usize,
    writers: HashMap<Rank, Mutex<OwnedWriteHalf>>,
    mailbox: Mailbox,
    barriers: Mailbox,
    readers: Vec<JoinHandle<()>>,
}

impl TcpExchange {
    /// Connects worker `rank` to the coordinator at `addr`.
    ///
    /// The connect is retried with exponential backoff (100ms starting,
    /// doubling each attempt) before giving up after 5 attempts.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        rank: Rank,
        size: usize,
    ) -> Result<Self, Error> {
        if rank == COORDINATOR || rank >= size {
            return Err(Error::UnknownRole(rank));
        }

        let addr: SocketAddr = lookup_host(addr).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "coordinator address did not resolve")
        })?;
        let mut retries = 0;
        let mut delay = Duration::from_millis(100);

        let mut stream = loop {
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(e) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(Error::Unreachable {
                            addr: addr.to_string(),
                            retries,
                        });
                    }
                    warn!(%addr, attempt = retries, error = %e, "coordinator not reachable yet");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        };
        stream.set_nodelay(true)?;
        write_frame(&mut stream, FrameKind::Hello, &encode_hello(rank, size)).await?;
        info!(rank, %addr, "connected to coordinator");

        let peers = HashMap::from([(COORDINATOR, stream)]);
        Ok(Self::assemble(rank, size, peers))
    }

    fn assemble(rank: Rank, size: usize, peers: HashMap<Rank, TcpStream>) -> Self {
        let mut writers = HashMap::new();
        let mut mailbox = Mailbox::new();
        let mut barriers = Mailbox::new();
        let mut readers = Vec::new();

        for (peer, stream) in peers {
            let (read_half, write_half) = stream.into_split();
            writers.insert(peer, Mutex::new(write_half));

            let task = ReaderTask {
                peer,
                reader: read_half,
                data: mailbox.register(peer),
                barrier: barriers.register(peer),
            };
            readers.push(tokio::spawn(task.run()));
        }

        Self {
            rank,
            size,
            writers,
            mailbox,
            barriers,
            readers,
        }
    }

    async fn write_to(&self, to: Rank, kind: FrameKind, body: &[u8]) -> Result<(), Error> {
        let writer = self.writers.get(&to).ok_or(Error::UnknownRole(to))?;
        let mut writer = writer.lock().await;
        write_frame(&mut *writer, kind, body)
            .await
            .map_err(|e| match e {
                Error::Io(_) => Error::Disconnected(to),
                other => other,
            })
    }
}

#[async_trait]
impl Exchange for TcpExchange {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    async fn send(&self, to: Rank, payload: Vec<u8>) -> Result<(), Error> {
        check_route(self.rank, to, self.size)?;
        self.write_to(to, FrameKind::Data, &payload).await
    }

    async fn receive(&self, from: Rank) -> Result<Vec<u8>, Error> {
        check_route(from, self.rank, self.size)?;
        self.mailbox.take(from).await
    }

    async fn barrier(&self) -> Result<(), Error> {
        if self.rank == COORDINATOR {
            for worker in 1..self.size {
                self.barriers.take(worker).await?;
            }
            for worker in 1..self.size {
                self.write_to(worker, FrameKind::BarrierRelease, &[]).await?;
            }
        } else {
            self.write_to(COORDINATOR, FrameKind::BarrierEnter, &[]).await?;
            self.barriers.take(COORDINATOR).await?;
        }
        debug!(rank = self.rank, "barrier passed");
        Ok(())
    }
}

impl Drop for TcpExchange {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

/// Background task that drains one connection into the mailboxes.
struct ReaderTask {
    peer: Rank,
    reader: OwnedReadHalf,
    data: UnboundedSender<Vec<u8>>,
    barrier: UnboundedSender<Vec<u8>>,
}

impl ReaderTask {
    async fn run(mut self) {
        loop {
            match read_frame(&mut self.reader).await {
                Ok(Some((FrameKind::Data, body))) => {
                    if self.data.send(body).is_err() {
                        return;
                    }
                }
                Ok(Some((FrameKind::BarrierEnter | FrameKind::BarrierRelease, _))) => {
                    if self.barrier.send(Vec::new()).is_err() {
                        return;
                    }
                }
                Ok(Some((FrameKind::Hello, _))) => {
                    warn!(peer = self.peer, "unexpected hello after handshake");
                    return;
                }
                Ok(None) => {
                    debug!(peer = self.peer, "connection closed");
                    return;
                }
                Err(e) => {
                    warn!(peer = self.peer, error = %e, "connection failed");
                    return;
                }
            }
        }
    }
}
