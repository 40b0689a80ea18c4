//! # Duplex channel endpoint.
//!
//! [`Endpoint`] is one side of the bidirectional, ordered pipe between the
//! supervisor and its worker. Each [`Signal`] travels as one newline-terminated
//! line framed by [`LinesCodec`].
//!
//! ## Wiring
//! ```text
//!   supervisor                                  worker process
//!   Endpoint<ChildStdout, ChildStdin>           Endpoint<Stdin, Stdout>
//!        send ──────► child stdin  ───────────────► receive
//!     receive ◄────── child stdout ◄─────────────── send
//! ```
//!
//! ## Rules
//! - Per-direction FIFO; no duplication, no drop while both ends live.
//! - `send` flushes before returning; it never waits for a reply.
//! - `receive` blocks the calling task until one line arrives.
//! - Lines are capped at [`MAX_LINE`] bytes: the channel carries control
//!   signals only, never payloads.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::error::RuntimeError;
use crate::signals::Signal;

/// Maximum accepted line length in bytes.
pub const MAX_LINE: usize = 1024;

/// One end of the duplex channel.
pub struct Endpoint<R, W> {
    reader: FramedRead<R, LinesCodec>,
    writer: FramedWrite<W, LinesCodec>,
}

impl<R, W> Endpoint<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps a read half and a write half.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE)),
            writer: FramedWrite::new(writer, LinesCodec::new_with_max_length(MAX_LINE)),
        }
    }

    /// Sends one signal and flushes it to the peer.
    pub async fn send(&mut self, signal: impl Into<Signal>) -> Result<(), RuntimeError> {
        let signal = signal.into();
        self.writer
            .send(signal.as_str())
            .await
            .map_err(map_codec)
    }

    /// Waits for the next signal from the peer.
    ///
    /// Returns [`RuntimeError::ChannelClosed`] once the peer's write half is gone.
    pub async fn receive(&mut self) -> Result<Signal, RuntimeError> {
        match self.reader.next().await {
            Some(Ok(line)) => Signal::parse(line.trim_end_matches('\r')),
            Some(Err(e)) => Err(map_codec(e)),
            None => Err(RuntimeError::ChannelClosed),
        }
    }
}

fn map_codec(e: LinesCodecError) -> RuntimeError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            RuntimeError::Channel(format!("line longer than {MAX_LINE} bytes"))
        }
        LinesCodecError::Io(io) if io.kind() == std::io::ErrorKind::BrokenPipe => {
            RuntimeError::ChannelClosed
        }
        LinesCodecError::Io(io) => RuntimeError::Channel(io.to_string()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::signals::{Control, DomainSignal};
    use tokio::io::{DuplexStream, ReadHalf, WriteHalf};

    pub(crate) type MemEndpoint = Endpoint<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    /// Two connected in-memory endpoints.
    pub(crate) fn pair() -> (MemEndpoint, MemEndpoint) {
        let (a, b) = tokio::io::duplex(4096);
        let (ar, aw) = tokio::io::split(a);
        let (br, bw) = tokio::io::split(b);
        (Endpoint::new(ar, aw), Endpoint::new(br, bw))
    }

    #[tokio::test]
    async fn preserves_order_per_direction() {
        let (mut left, mut right) = pair();
        left.send(Control::Start).await.unwrap();
        left.send(DomainSignal::new("a").unwrap()).await.unwrap();
        left.send(DomainSignal::new("b").unwrap()).await.unwrap();
        right.send(Control::Started).await.unwrap();

        assert_eq!(right.receive().await.unwrap(), Signal::Control(Control::Start));
        assert_eq!(right.receive().await.unwrap().as_str(), "a");
        assert_eq!(right.receive().await.unwrap().as_str(), "b");
        assert_eq!(left.receive().await.unwrap(), Signal::Control(Control::Started));
    }

    #[tokio::test]
    async fn dropped_peer_reports_closed() {
        let (mut left, right) = pair();
        drop(right);
        assert!(matches!(left.receive().await, Err(RuntimeError::ChannelClosed)));
    }

    #[tokio::test]
    async fn oversized_line_is_a_channel_error() {
        use tokio::io::AsyncWriteExt;

        let (a, b) = tokio::io::duplex(8192);
        let (br, bw) = tokio::io::split(b);
        let mut right = Endpoint::new(br, bw);
        let (_ar, mut aw) = tokio::io::split(a);
        let long = "x".repeat(MAX_LINE + 10);
        aw.write_all(long.as_bytes()).await.unwrap();
        aw.write_all(b"\n").await.unwrap();

        assert!(matches!(right.receive().await, Err(RuntimeError::Channel(_))));
    }
}
