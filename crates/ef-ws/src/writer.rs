//! Serialized frame writer
//!
//! Both the session's emit loop and the liveness prober write to the same
//! connection. All writes go through one `FrameWriter`, which holds the
//! write half behind a mutex so frames are sent whole and one at a time.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tokio::sync::Mutex;
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::{Result, WsError};

/// Write half of a connection shared by the tasks of one session
pub struct FrameWriter<S> {
    sink: Mutex<S>,
    /// No further frames are accepted
    closed: AtomicBool,
    /// `close()` has run
    shut: AtomicBool,
    write_wait: Duration,
    frames_sent: AtomicU64,
}

impl<S> FrameWriter<S>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    /// Wrap a sink; every send must complete within `write_wait`
    pub fn new(sink: S, write_wait: Duration) -> Self {
        Self {
            sink: Mutex::new(sink),
            closed: AtomicBool::new(false),
            shut: AtomicBool::new(false),
            write_wait,
            frames_sent: AtomicU64::new(0),
        }
    }

    /// Send one frame. A failure leaves the writer open.
    ///
    /// The write deadline is set before waiting for the lock, so time spent
    /// behind another writer counts against it.
    pub async fn send(&self, message: Message) -> Result<()> {
        self.write(message, false).await
    }

    /// Send a payload text frame.
    ///
    /// A failure closes the writer while the lock is still held, so nothing
    /// queued behind this frame is written afterwards.
    pub async fn send_text(&self, text: String) -> Result<()> {
        self.write(Message::Text(text.into()), true).await
    }

    /// Send an empty ping control frame
    pub async fn send_ping(&self) -> Result<()> {
        self.send(Message::Ping(Bytes::new())).await
    }

    async fn write(&self, message: Message, fatal: bool) -> Result<()> {
        if self.is_closed() {
            return Err(WsError::Closed);
        }

        let deadline = Instant::now() + self.write_wait;
        let Ok(mut sink) = timeout_at(deadline, self.sink.lock()).await else {
            if fatal {
                self.mark_closed();
            }
            return Err(WsError::WriteTimeout(self.write_wait));
        };

        // closed while we were queued behind another writer
        if self.is_closed() {
            return Err(WsError::Closed);
        }

        let result = match timeout_at(deadline, sink.send(message)).await {
            Ok(Ok(())) => {
                self.frames_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Ok(Err(e)) => Err(WsError::WebSocket(e.to_string())),
            Err(_) => Err(WsError::WriteTimeout(self.write_wait)),
        };

        if fatal && result.is_err() {
            self.mark_closed();
        }
        drop(sink);

        result
    }

    /// Refuse every later send without touching the sink
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Close the writer.
    ///
    /// Every later `send` fails with [`WsError::Closed`]. A close frame is
    /// sent best-effort within the write deadline, also after a failed
    /// payload send. Calling this twice is a no-op.
    pub async fn close(&self) {
        if self.shut.swap(true, Ordering::SeqCst) {
            return;
        }
        self.mark_closed();

        let deadline = Instant::now() + self.write_wait;
        let result = timeout_at(deadline, async {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!("Close frame not sent: {}", e);
            }
            if let Err(e) = sink.close().await {
                debug!("Sink close failed: {}", e);
            }
        })
        .await;

        if result.is_err() {
            debug!("Close did not finish within {:?}", self.write_wait);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of frames written successfully, control frames included
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use futures::channel::mpsc;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Sink that never accepts a frame
    struct StalledSink;

    impl Sink<Message> for StalledSink {
        type Error = std::io::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> std::io::Result<()> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Pending
        }
    }

    #[tokio::test]
    async fn test_send_text_and_ping() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        writer.send_text("hello".to_string()).await.unwrap();
        writer.send_ping().await.unwrap();

        assert_eq!(rx.next().await, Some(Message::Text("hello".into())));
        assert_eq!(rx.next().await, Some(Message::Ping(Bytes::new())));
        assert_eq!(writer.frames_sent(), 2);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        writer.close().await;
        assert!(writer.is_closed());
        assert!(matches!(
            writer.send_text("late".to_string()).await,
            Err(WsError::Closed)
        ));

        assert_eq!(rx.next().await, Some(Message::Close(None)));
        assert_eq!(rx.next().await, None);
        assert_eq!(writer.frames_sent(), 0);

        // second close is a no-op
        writer.close().await;
    }

    #[tokio::test]
    async fn test_transport_error() {
        let (tx, rx) = mpsc::unbounded::<Message>();
        drop(rx);
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        let err = writer.send_text("lost".to_string()).await.unwrap_err();
        assert!(matches!(err, WsError::WebSocket(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_deadline() {
        let writer = FrameWriter::new(StalledSink, Duration::from_secs(10));

        let started = Instant::now();
        let err = writer.send_text("stuck".to_string()).await.unwrap_err();

        assert!(matches!(err, WsError::WriteTimeout(d) if d == Duration::from_secs(10)));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_failed_ping_leaves_writer_open() {
        let (tx, rx) = mpsc::unbounded::<Message>();
        drop(rx);
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        assert!(matches!(writer.send_ping().await, Err(WsError::WebSocket(_))));
        assert!(!writer.is_closed());
    }

    #[tokio::test]
    async fn test_failed_text_closes_writer() {
        let (tx, rx) = mpsc::unbounded::<Message>();
        drop(rx);
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        assert!(matches!(
            writer.send_text("lost".to_string()).await,
            Err(WsError::WebSocket(_))
        ));
        assert!(writer.is_closed());
        assert!(matches!(writer.send_ping().await, Err(WsError::Closed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_timeout_closes_writer() {
        let writer = FrameWriter::new(StalledSink, Duration::from_secs(10));

        assert!(matches!(
            writer.send_text("stuck".to_string()).await,
            Err(WsError::WriteTimeout(_))
        ));
        assert!(writer.is_closed());
    }

    #[tokio::test]
    async fn test_close_after_failed_text_still_sends_close_frame() {
        let (tx, mut rx) = mpsc::unbounded::<Message>();
        let writer = FrameWriter::new(tx, Duration::from_secs(10));

        writer.mark_closed();
        writer.close().await;

        assert_eq!(rx.next().await, Some(Message::Close(None)));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_on_stalled_sink_is_bounded() {
        let writer = FrameWriter::new(StalledSink, Duration::from_secs(10));
        writer.close().await;
        assert!(writer.is_closed());
    }
}
