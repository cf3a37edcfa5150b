//! Byte pumps between the caller's standard streams and the child's pipes.
//!
//! Every relay is a plain future; the launcher decides how they are scheduled. Content
//! is copied verbatim in fixed-size chunks with no line handling of any kind.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// Copies `source` into `sink` until EOF, appending every chunk to `tee` as well, then
/// flushes `sink`. Returns the number of bytes moved.
pub async fn pump<R, W>(
    source: &mut R,
    sink: &mut W,
    mut tee: Option<&mut Vec<u8>>,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = match source.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        sink.write_all(&chunk[..read]).await?;
        if let Some(tee) = tee.as_deref_mut() {
            tee.extend_from_slice(&chunk[..read]);
        }
        total += read as u64;
    }
    sink.flush().await?;
    Ok(total)
}

/// What a finished [`ReaderRelay`] hands back.
#[derive(Debug)]
pub struct RelayOutput<W> {
    pub sink: W,
    pub bytes: u64,
    /// Copy of everything forwarded, present only for teed relays.
    pub tee: Option<Vec<u8>>,
}

/// Drains one child output stream into a sink.
pub struct ReaderRelay<R, W> {
    source: R,
    sink: W,
    tee: Option<Vec<u8>>,
}

impl<R> ReaderRelay<R, Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    /// Collects the stream into memory for the caller to place later.
    pub fn buffered(source: R) -> Self {
        Self::new(source, Vec::new())
    }
}

impl<R, W> ReaderRelay<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(source: R, sink: W) -> Self {
        Self {
            source,
            sink,
            tee: None,
        }
    }

    /// Keeps a copy of everything forwarded so it can be replayed elsewhere afterwards.
    pub fn with_tee(mut self) -> Self {
        self.tee = Some(Vec::new());
        self
    }

    pub async fn run(mut self) -> io::Result<RelayOutput<W>> {
        let bytes = pump(&mut self.source, &mut self.sink, self.tee.as_mut()).await?;
        Ok(RelayOutput {
            sink: self.sink,
            bytes,
            tee: self.tee,
        })
    }
}

/// Feeds caller input into the child's stdin.
///
/// The sink is shut down and dropped once the source ends, which is how the child
/// learns that its input is over.
pub struct WriterRelay<R, W> {
    source: R,
    sink: W,
}

impl<R, W> WriterRelay<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(source: R, sink: W) -> Self {
        Self { source, sink }
    }

    /// A child that stops reading early is not an error: the bytes it never asked for
    /// are dropped and the relay ends.
    pub async fn run(mut self) -> io::Result<u64> {
        let copied = match pump(&mut self.source, &mut self.sink, None).await {
            Ok(copied) => copied,
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(0),
            Err(err) => return Err(err),
        };
        match self.sink.shutdown().await {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err),
            _ => Ok(copied),
        }
    }
}
